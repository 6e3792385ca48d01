//! The provider boundary the room engine loads banks through.
//!
//! Rooms ask for their bank exactly once, at creation. Where banks live
//! (a file, a database, a CMS) is the provider's business; the engine only
//! sees [`BankProvider::get_bank`].

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use serde::Deserialize;

use crate::{Bank, BankError, BankId};

/// Looks up question banks by id.
///
/// `Send + Sync + 'static` because one provider is shared by every host
/// connection task for the life of the server.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use quizforge_bank::{Bank, BankError, BankId, BankProvider};
///
/// /// Serves the built-in bank under every id.
/// struct AlwaysExample;
///
/// impl BankProvider for AlwaysExample {
///     async fn get_bank(&self, _id: BankId) -> Result<Arc<Bank>, BankError> {
///         Ok(Arc::new(Bank::example()))
///     }
/// }
/// ```
pub trait BankProvider: Send + Sync + 'static {
    /// Returns the bank stored under `id`.
    ///
    /// # Errors
    /// [`BankError::NotFound`] if there is no such bank. Other variants
    /// are provider-specific load failures.
    fn get_bank(
        &self,
        id: BankId,
    ) -> impl Future<Output = Result<Arc<Bank>, BankError>> + Send;
}

/// An in-memory provider with a fixed set of banks.
///
/// The default provider serves [`Bank::example`] under `BankId(0)`.
#[derive(Debug, Clone)]
pub struct StaticBankProvider {
    banks: HashMap<BankId, Arc<Bank>>,
}

impl Default for StaticBankProvider {
    fn default() -> Self {
        Self::with_example()
    }
}

#[derive(Deserialize)]
struct BankDocument {
    banks: Vec<BankEntry>,
}

#[derive(Deserialize)]
struct BankEntry {
    id: BankId,
    questions: Bank,
}

impl StaticBankProvider {
    /// A provider with no banks at all.
    pub fn empty() -> Self {
        Self {
            banks: HashMap::new(),
        }
    }

    /// A provider serving [`Bank::example`] under `BankId(0)`.
    pub fn with_example() -> Self {
        Self::empty().with_bank(BankId(0), Bank::example())
    }

    /// Adds (or replaces) a bank.
    pub fn with_bank(mut self, id: BankId, bank: Bank) -> Self {
        self.banks.insert(id, Arc::new(bank));
        self
    }

    /// Loads banks from a JSON document of the form
    ///
    /// ```json
    /// { "banks": [
    ///     { "id": 0, "questions": [
    ///         { "prompt": "What is 2 + 2?", "answers": ["3", "4"], "correctAnswer": "4" }
    ///     ] }
    /// ] }
    /// ```
    ///
    /// Every bank is validated as by [`Bank::new`].
    pub fn from_json(json: &str) -> Result<Self, BankError> {
        let document: BankDocument = serde_json::from_str(json)?;
        let mut banks = HashMap::with_capacity(document.banks.len());
        for entry in document.banks {
            if banks.insert(entry.id, Arc::new(entry.questions)).is_some() {
                return Err(BankError::DuplicateId(entry.id));
            }
        }
        tracing::debug!(banks = banks.len(), "question banks loaded");
        Ok(Self { banks })
    }

    pub fn len(&self) -> usize {
        self.banks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.banks.is_empty()
    }
}

impl BankProvider for StaticBankProvider {
    async fn get_bank(&self, id: BankId) -> Result<Arc<Bank>, BankError> {
        self.banks.get(&id).cloned().ok_or(BankError::NotFound(id))
    }
}
