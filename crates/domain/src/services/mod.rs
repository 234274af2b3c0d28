//! Domain services for Stockroom.
//!
//! Services run the stock bookkeeping inside a store transaction supplied by
//! the persistence layer.

pub mod loan;
pub mod stock;
pub mod store;

#[cfg(test)]
pub(crate) mod memory;

pub use loan::{
    CreateLoanOutcome, LoanError, LoanItemFailure, LoanLine, LoanService, ReturnOutcome,
};
pub use stock::{StockChange, StockChangeError, StockLevel, StockPolicy, StockService};
pub use store::{InventoryStore, InventoryTransaction, StoreError};
