//! hp-profiles: monthly and daily bound profiles for network entities.
//!
//! Every bounded attribute of every entity (demand curves, reservoir volume
//! envelopes, inflow series, aquifer recharge) is held here as a named
//! profile, so the assembler and the result extractor can look the same
//! series up independently instead of sharing references.

pub mod profile;
pub mod store;

pub use profile::{DailyProfile, MonthlyProfile, DAILY_SLOTS, MONTHS};
pub use store::{profile_name, Granularity, Profile, ProfileRole, ProfileStore};

use thiserror::Error;

pub type ProfilesResult<T> = Result<T, ProfilesError>;

#[derive(Error, Debug)]
pub enum ProfilesError {
    #[error("Profile {name} has wrong length (expected {expected}, got {got})")]
    InvalidLength {
        name: String,
        expected: usize,
        got: usize,
    },

    #[error("Profile {name} contains a non-finite value at slot {slot}")]
    NonFinite { name: String, slot: usize },

    #[error("Profile not found: {name}")]
    NotFound { name: String },
}
