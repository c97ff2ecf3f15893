//! Base-36 fractional index algebra.
//!
//! An index is a non-empty lowercase base-36 string (`0..9a..z`). Order is
//! plain byte-wise comparison, which coincides with binary collation in every
//! store we project into, so no custom collator is needed downstream.
//!
//! The core operation is [`between`]: given two indices `a < b` (either bound
//! may be open), synthesize a third index strictly inside the interval. New
//! documents start from the canonical midpoint `"m"` and grow outward;
//! between-insertions bisect the remaining alphabet at the first divergent
//! position. Growth is bounded: appending at the tail adds roughly one
//! character per 25 insertions.
//!
//! Two deliberate properties fall out of the representation:
//!
//! - No normalization. `"0"`, `"00"` and `"000"` are distinct valid indices.
//! - No global uniqueness. Two writers can mint the same index for the same
//!   gap; the orderer breaks ties on cell id. The optional jitter extension
//!   ([`between_jittered`]) makes such collisions unlikely by appending one
//!   random character, driven by an injected [`JitterSource`] so tests stay
//!   deterministic.
//!
//! Truly adjacent bounds (for example `"m"` and `"m0"`) admit no index at
//! all; [`between`] reports [`IndexError::EmptyInterval`] and the caller is
//! expected to rebalance the surrounding cells.

mod error;
mod fractional;
mod jitter;

pub use error::IndexError;
pub use fractional::{
    after, before, between, between_jittered, generate, is_valid, validate_order, ALPHABET,
    BASE,
};
pub use jitter::{JitterSource, NoJitter, RngJitter, JITTER_PROBABILITY, MAX_JITTERED_LEN};

/// Result type for index algebra operations.
pub type Result<T> = std::result::Result<T, IndexError>;
