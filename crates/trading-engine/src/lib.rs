//! One evaluation cycle per symbol.
//!
//! A [`SymbolEvaluator`] owns a symbol's regime classifier and shares the
//! strategy set and the account-wide risk manager with every other symbol.
//! Each call to [`SymbolEvaluator::evaluate`] returns a [`CycleOutcome`]
//! describing what the caller should do; nothing here places orders.

mod cycle;
mod position;

pub use cycle::{AccountFacts, CycleOutcome, SymbolEvaluator};
pub use position::OpenPosition;
