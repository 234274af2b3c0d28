//! Domain models for Stockroom.

pub mod item;
pub mod loan;
pub mod location;
pub mod notification;
pub mod user;

pub use item::{Item, ItemView, Placement, StockError};
pub use loan::{Loan, LoanView, NewLoan};
pub use location::{Drawer, Furniture, Zone};
pub use notification::{NewNotification, Notification, NotificationKind};
pub use user::{Actor, Role, User};
