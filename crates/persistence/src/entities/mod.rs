//! Database row mappings.

pub mod item;
pub mod loan;
pub mod location;
pub mod notification;
pub mod user;

pub use item::{ItemEntity, ItemRefEntity, ItemViewEntity};
pub use loan::{LoanEntity, LoanViewEntity};
pub use location::{DrawerEntity, FurnitureEntity, ZoneEntity};
pub use notification::NotificationEntity;
pub use user::{UserEntity, UserSummaryEntity};
