//! Basic types

mod primitives;
pub use primitives::{AccountId, Balance, ParseAccountIdError};
