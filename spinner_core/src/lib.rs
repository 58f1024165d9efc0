pub mod init_data;
pub mod options;
pub mod rng;
pub mod wheel;

pub use crate::init_data::{sign_init_data, validate, InitData, InitDataError, WebAppUser};
pub use crate::options::{OptionError, OptionList};
pub use crate::rng::{derive_floats, derive_hash_hex, RandDraws, SeededDraws, SpinDraws};
pub use crate::wheel::{
    replay_seeded, winner_index, SpinOutcome, SpinPlan, Wheel, WheelError, ANIMATION_DURATION,
    REVEAL_DELAY,
};
