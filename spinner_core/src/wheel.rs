use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::options::{OptionError, OptionList};
use crate::rng::{SeededDraws, SpinDraws};

pub const MIN_SPINS: u32 = 8;
pub const MAX_SPINS: u32 = 12;
/// Where the pointer sits, measured like the canvas does (0 = three o'clock).
pub const POINTER_OFFSET_DEGREES: f64 = 270.0;
/// The result is revealed slightly before the animation settles.
pub const REVEAL_DELAY: Duration = Duration::from_millis(4400);
pub const ANIMATION_DURATION: Duration = Duration::from_millis(4500);

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WheelError {
    #[error("a spin needs at least 2 options, wheel has {0}")]
    NotEnoughOptions(usize),
    #[error("a spin is already in flight")]
    SpinInFlight,
    #[error(transparent)]
    Options(#[from] OptionError),
}

/// Pure angle-to-index mapping for a wheel at rest.
///
/// `stop_angle` is the wheel's rotation modulo 360. Segment `i` is drawn from
/// `i * arc` to `(i + 1) * arc` clockwise, and the pointer sits at the top.
///
/// # Panics
///
/// Panics if `option_count` is zero. [`Wheel::spin`] never calls it with
/// fewer than two options.
pub fn winner_index(stop_angle: f64, option_count: usize) -> usize {
    assert!(option_count > 0, "winner_index on an empty wheel");
    let arc = 360.0 / option_count as f64;
    let winning_angle = (360.0 - stop_angle + POINTER_OFFSET_DEGREES).rem_euclid(360.0);
    let index = (winning_angle / arc).floor();
    if index.is_nan() || index < 0.0 {
        return 0;
    }
    (index as usize).min(option_count - 1)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpinPlan {
    pub spins: u32,
    pub offset_degrees: f64,
    /// Cumulative rotation the wheel animates towards.
    pub target_rotation: f64,
    pub stop_angle: f64,
    pub winner_index: usize,
    pub winner: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpinOutcome {
    pub winner_index: usize,
    pub winner: String,
    pub rotation: f64,
}

#[derive(Debug, Clone)]
struct InFlight {
    plan: SpinPlan,
    started: Instant,
    revealed: bool,
}

/// Wheel state across spins.
///
/// Rotation accumulates so a renderer can animate from where the previous
/// spin stopped instead of snapping back to zero.
#[derive(Debug, Clone, Default)]
pub struct Wheel {
    options: OptionList,
    cumulative_rotation: f64,
    in_flight: Option<InFlight>,
    result: Option<SpinOutcome>,
}

impl Wheel {
    pub fn new(options: OptionList) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    pub fn options(&self) -> &OptionList {
        &self.options
    }

    pub fn cumulative_rotation(&self) -> f64 {
        self.cumulative_rotation
    }

    pub fn is_spinning(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Last committed result. Cleared when a new spin starts.
    pub fn result(&self) -> Option<&SpinOutcome> {
        self.result.as_ref()
    }

    pub fn add_option(&mut self, text: &str) -> Result<(), WheelError> {
        self.ensure_idle()?;
        self.options.add(text)?;
        Ok(())
    }

    pub fn remove_option(&mut self, index: usize) -> Result<String, WheelError> {
        self.ensure_idle()?;
        Ok(self.options.remove(index)?)
    }

    /// Start a spin. The winner is fixed now but only committed by
    /// [`Wheel::advance`] once [`REVEAL_DELAY`] has passed.
    pub fn spin<D: SpinDraws + ?Sized>(
        &mut self,
        draws: &mut D,
        now: Instant,
    ) -> Result<&SpinPlan, WheelError> {
        self.ensure_idle()?;
        let count = self.options.len();
        if count < 2 {
            return Err(WheelError::NotEnoughOptions(count));
        }

        let spins = draws.spin_count();
        let offset_degrees = draws.offset_degrees();
        let target_rotation = self.cumulative_rotation + f64::from(spins) * 360.0 + offset_degrees;
        let stop_angle = target_rotation % 360.0;
        let index = winner_index(stop_angle, count);
        let winner = self.options.as_slice()[index].clone();

        debug!(spins, offset_degrees, target_rotation, index, "spin started");

        self.cumulative_rotation = target_rotation;
        self.result = None;
        let flight = self.in_flight.insert(InFlight {
            plan: SpinPlan {
                spins,
                offset_degrees,
                target_rotation,
                stop_angle,
                winner_index: index,
                winner,
            },
            started: now,
            revealed: false,
        });
        Ok(&flight.plan)
    }

    /// Move the in-flight spin along the clock. Returns the outcome exactly
    /// once, on the first call at or after the reveal deadline.
    pub fn advance(&mut self, now: Instant) -> Option<SpinOutcome> {
        let flight = self.in_flight.as_mut()?;
        let elapsed = now.saturating_duration_since(flight.started);

        let mut outcome = None;
        if !flight.revealed && elapsed >= REVEAL_DELAY {
            flight.revealed = true;
            let committed = SpinOutcome {
                winner_index: flight.plan.winner_index,
                winner: flight.plan.winner.clone(),
                rotation: flight.plan.target_rotation,
            };
            self.result = Some(committed.clone());
            outcome = Some(committed);
        }
        if elapsed >= ANIMATION_DURATION {
            self.in_flight = None;
        }
        outcome
    }

    /// Time left until the in-flight spin reveals, if one is pending.
    pub fn until_reveal(&self, now: Instant) -> Option<Duration> {
        let flight = self.in_flight.as_ref().filter(|f| !f.revealed)?;
        Some(REVEAL_DELAY.saturating_sub(now.saturating_duration_since(flight.started)))
    }

    fn ensure_idle(&self) -> Result<(), WheelError> {
        if self.in_flight.is_some() {
            return Err(WheelError::SpinInFlight);
        }
        Ok(())
    }
}

/// Recompute a seeded spin from its revealed inputs, starting from the
/// rotation the wheel had before that spin.
pub fn replay_seeded(
    server_seed: &str,
    client_seed: &str,
    nonce: u64,
    options: &OptionList,
    prior_rotation: f64,
) -> Result<SpinPlan, WheelError> {
    let mut wheel = Wheel {
        options: options.clone(),
        cumulative_rotation: prior_rotation,
        ..Wheel::default()
    };
    let mut draws = SeededDraws::new(server_seed, client_seed, nonce);
    wheel.spin(&mut draws, Instant::now()).cloned()
}
