use std::time::Instant;

use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use spinner_core::{
    derive_hash_hex, sign_init_data, InitData, OptionList, RandDraws, SeededDraws, SpinDraws,
    SpinOutcome, Wheel, ANIMATION_DURATION,
};
use spinner_shared::{CreateInvoiceRequest, CreateInvoiceResponse, ErrorBody};

#[derive(Parser)]
#[command(name = "spinner-cli", about = "Operator CLI for the Decision Spinner")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Spin a wheel locally and print the winner
    Spin {
        /// Wheel option, repeat for each segment (defaults to the stock four)
        #[arg(short, long = "option")]
        options: Vec<String>,
        /// Number of consecutive spins
        #[arg(long, default_value_t = 1)]
        times: u32,
        /// Use provably fair draws from this server seed
        #[arg(long, requires = "client_seed")]
        server_seed: Option<String>,
        #[arg(long, requires = "server_seed")]
        client_seed: Option<String>,
        /// Nonce of the first seeded spin, incremented per spin
        #[arg(long, default_value_t = 0)]
        nonce: u64,
        /// Print the result immediately instead of waiting for the reveal
        #[arg(long)]
        no_wait: bool,
    },
    /// Produce signed init-data for local testing of the relay
    Sign {
        #[arg(long, env = "BOT_TOKEN", hide_env_values = true)]
        bot_token: String,
        #[arg(long)]
        user_id: i64,
        #[arg(long)]
        first_name: Option<String>,
        /// Defaults to now
        #[arg(long)]
        auth_date: Option<i64>,
    },
    /// Check init-data against a bot token
    Verify {
        #[arg(long, env = "BOT_TOKEN", hide_env_values = true)]
        bot_token: String,
        init_data: String,
    },
    /// Ask a running relay for a Stars invoice link
    Invoice {
        #[arg(long, env = "BOT_SERVER_URL", default_value = "http://127.0.0.1:3000")]
        server: String,
        #[arg(long)]
        amount: u64,
        #[arg(long)]
        init_data: String,
    },
}

/// Init-data for `user_id`, signed with `bot_token`. `auth_date` defaults to now.
fn signed_init_data(
    bot_token: &str,
    user_id: i64,
    first_name: Option<String>,
    auth_date: Option<i64>,
) -> String {
    let mut user = serde_json::json!({ "id": user_id });
    if let Some(name) = first_name {
        user["first_name"] = name.into();
    }
    let auth_date = auth_date.unwrap_or_else(|| Utc::now().timestamp());
    sign_init_data(
        &[
            ("auth_date", auth_date.to_string()),
            ("user", user.to_string()),
        ],
        bot_token,
    )
}

fn report(outcome: Option<SpinOutcome>) {
    if let Some(outcome) = outcome {
        println!("  winner: [{}] {}", outcome.winner_index, outcome.winner);
    }
}

async fn run_spins(
    wheel: &mut Wheel,
    draws: &mut dyn SpinDraws,
    times: u32,
    no_wait: bool,
) -> anyhow::Result<()> {
    for n in 1..=times {
        let started = Instant::now();
        let plan = wheel.spin(&mut *draws, started)?.clone();
        println!(
            "spin #{n}: {} turns + {:.2}deg -> rotation {:.2} (stop {:.2})",
            plan.spins, plan.offset_degrees, plan.target_rotation, plan.stop_angle
        );

        if no_wait {
            // jump the clock past the animation
            report(wheel.advance(started + ANIMATION_DURATION));
            continue;
        }
        if let Some(wait) = wheel.until_reveal(Instant::now()) {
            tokio::time::sleep(wait).await;
        }
        report(wheel.advance(Instant::now()));
        let settle = (started + ANIMATION_DURATION).saturating_duration_since(Instant::now());
        tokio::time::sleep(settle).await;
        wheel.advance(Instant::now());
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Spin {
            options,
            times,
            server_seed,
            client_seed,
            nonce,
            no_wait,
        } => {
            let options = if options.is_empty() {
                OptionList::default()
            } else {
                OptionList::from_labels(&options)?
            };
            let mut wheel = Wheel::new(options);
            match (server_seed, client_seed) {
                (Some(server_seed), Some(client_seed)) => {
                    println!("server seed hash: {}", derive_hash_hex(server_seed.as_bytes()));
                    // one draw stream per spin so each nonce can be replayed on its own
                    for i in 0..u64::from(times) {
                        let mut draws = SeededDraws::new(&server_seed, &client_seed, nonce + i);
                        println!("nonce {}", draws.nonce);
                        run_spins(&mut wheel, &mut draws, 1, no_wait).await?;
                    }
                }
                _ => {
                    let mut draws = RandDraws::new(rand::thread_rng());
                    run_spins(&mut wheel, &mut draws, times, no_wait).await?;
                }
            }
        }
        Commands::Sign {
            bot_token,
            user_id,
            first_name,
            auth_date,
        } => {
            println!(
                "{}",
                signed_init_data(&bot_token, user_id, first_name, auth_date)
            );
        }
        Commands::Verify {
            bot_token,
            init_data,
        } => {
            let data = InitData::parse(&init_data);
            if !data.is_signed_by(&bot_token) {
                anyhow::bail!("init data is NOT signed by this token");
            }
            println!("init data is valid");
            match data.user() {
                Ok(user) => println!("user id: {}", user.id),
                Err(e) => println!("no usable user: {e}"),
            }
        }
        Commands::Invoice {
            server,
            amount,
            init_data,
        } => {
            let req = CreateInvoiceRequest {
                amount: Some(amount.into()),
                init_data: Some(init_data),
            };
            tracing::debug!(%server, amount, "requesting invoice");
            let resp = reqwest::Client::new()
                .post(format!("{}/create-invoice", server.trim_end_matches('/')))
                .json(&req)
                .send()
                .await?;
            let status = resp.status();
            if status.is_success() {
                let body: CreateInvoiceResponse = resp.json().await?;
                println!("{}", body.invoice_url);
            } else {
                let body: ErrorBody = resp.json().await?;
                let extra = body.details.or(body.message).unwrap_or_default();
                anyhow::bail!("relay answered {status}: {} {extra}", body.error);
            }
        }
    }

    Ok(())
}
