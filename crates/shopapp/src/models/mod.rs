//! Domain models for the shop.

pub mod group;
pub mod order;
pub mod product;
pub mod session;
pub mod user;

pub use group::{Group, GroupWithPermissions, Permission};
pub use order::{NewOrder, Order, OrderWithRelations};
pub use product::{Product, ProductInput, ProductScope};
pub use session::{CurrentUser, keys as session_keys};
pub use user::User;
