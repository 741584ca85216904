//! The ledger engine: every piece of derived financial state lives
//! here, behind plain async functions over a [`sea_orm`] connection.
//! Handlers stay thin; the semantics (balances, installment plans,
//! the payment state machine, budgets, the dashboard) are all in this
//! crate so they can be tested against an in-memory database.

pub mod balance;
pub mod bills;
pub mod budget;
pub mod dashboard;
pub mod error;
pub mod installments;
pub mod payments;
pub mod transfers;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{LedgerError, Result};
