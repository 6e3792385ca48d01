//! Question banks for Quizforge.
//!
//! - [`Question`] / [`Bank`]: validated, immutable question lists.
//! - [`BankProvider`]: the async lookup a room performs once at creation.
//! - [`StaticBankProvider`]: in-memory provider, optionally loaded from JSON.

#![allow(async_fn_in_trait)]

mod bank;
mod error;
mod provider;

pub use bank::{Bank, BankId, Question};
pub use error::BankError;
pub use provider::{BankProvider, StaticBankProvider};
