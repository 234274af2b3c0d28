//! Repository implementations for database operations.

pub mod item;
pub mod loan;
pub mod location;
pub mod notification;
pub mod user;

pub use item::{ItemRepository, StockReportRows, AUTOCOMPLETE_LIMIT};
pub use loan::LoanRepository;
pub use location::{LocationLevel, LocationRepository};
pub use notification::NotificationRepository;
pub use user::UserRepository;
