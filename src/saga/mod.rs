//! Completion saga: turns anchoring confirmations into completed claims.

mod completion;

pub use completion::{CompletionOutcome, CompletionSaga};
