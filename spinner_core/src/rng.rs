use hmac::{Hmac, Mac};
use rand::Rng;
use sha2::{Digest, Sha256};

use crate::wheel::{MAX_SPINS, MIN_SPINS};

pub type HmacSha256 = Hmac<Sha256>;

/// One-shot HMAC-SHA256.
pub fn hmac_sha256(key: &[u8], msg: &[u8]) -> [u8; 32] {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC takes any key size");
    mac.update(msg);
    let mut out = [0u8; 32];
    out.copy_from_slice(&mac.finalize().into_bytes());
    out
}

/// Source of the two uniform draws a spin needs.
pub trait SpinDraws {
    /// Full turns, uniform over `MIN_SPINS..=MAX_SPINS`.
    fn spin_count(&mut self) -> u32;
    /// Extra rotation in degrees, uniform over `[0, 360)`.
    fn offset_degrees(&mut self) -> f64;
}

pub fn derive_hash_hex(input: &[u8]) -> String {
    hex::encode(Sha256::digest(input))
}

/// Unit floats read as big-endian words from `seed_bytes`. When a block is
/// used up it is replaced by its own SHA-256 digest.
pub fn derive_floats(seed_bytes: &[u8], count: usize) -> Vec<f64> {
    const WORD_RANGE: f64 = 4_294_967_296.0;
    let mut out = Vec::with_capacity(count);
    let mut block = seed_bytes.to_vec();
    while out.len() < count {
        let missing = count - out.len();
        out.extend(
            block
                .chunks_exact(4)
                .take(missing)
                .map(|w| f64::from(u32::from_be_bytes([w[0], w[1], w[2], w[3]])) / WORD_RANGE),
        );
        block = Sha256::digest(&block).to_vec();
    }
    out
}

fn spins_from_unit(f: f64) -> u32 {
    let span = MAX_SPINS - MIN_SPINS + 1;
    MIN_SPINS + ((f * f64::from(span)).floor() as u32).min(span - 1)
}

/// Ordinary randomness, e.g. `RandDraws::new(rand::thread_rng())`.
pub struct RandDraws<R: Rng>(R);

impl<R: Rng> RandDraws<R> {
    pub fn new(rng: R) -> Self {
        Self(rng)
    }
}

impl<R: Rng> SpinDraws for RandDraws<R> {
    fn spin_count(&mut self) -> u32 {
        self.0.gen_range(MIN_SPINS..=MAX_SPINS)
    }

    fn offset_degrees(&mut self) -> f64 {
        self.0.gen_range(0.0..360.0)
    }
}

/// Deterministic draws that can be replayed once the server seed is revealed.
#[derive(Debug, Clone)]
pub struct SeededDraws {
    /// Kept secret until the spin is audited.
    pub server_seed: String,
    pub client_seed: String,
    pub nonce: u64,
    floats: Vec<f64>,
    cursor: usize,
}

impl SeededDraws {
    pub fn new(server_seed: impl Into<String>, client_seed: impl Into<String>, nonce: u64) -> Self {
        Self {
            server_seed: server_seed.into(),
            client_seed: client_seed.into(),
            nonce,
            floats: Vec::new(),
            cursor: 0,
        }
    }

    /// Commitment that can be published before the seed itself.
    pub fn server_seed_hash_hex(&self) -> String {
        derive_hash_hex(self.server_seed.as_bytes())
    }

    /// `HMAC_SHA256(server_seed, "client_seed:nonce")`, the root of the draw stream.
    pub fn hmac_bytes(&self) -> [u8; 32] {
        let msg = format!("{}:{}", self.client_seed, self.nonce);
        hmac_sha256(self.server_seed.as_bytes(), msg.as_bytes())
    }

    fn next_float(&mut self) -> f64 {
        if self.cursor >= self.floats.len() {
            // prefixes of the stream never change, so growing it is safe
            let want = (self.floats.len() * 2).max(8);
            self.floats = derive_floats(&self.hmac_bytes(), want);
        }
        let f = self.floats[self.cursor];
        self.cursor += 1;
        f
    }
}

impl SpinDraws for SeededDraws {
    fn spin_count(&mut self) -> u32 {
        spins_from_unit(self.next_float())
    }

    fn offset_degrees(&mut self) -> f64 {
        self.next_float() * 360.0
    }
}
