pub mod manager;
pub mod models;
pub mod repository;

pub use manager::{DatabaseError, DatabaseManager};
pub use models::{Organization, Profile, Role, SetLog, SubscriptionStatus};
pub use repository::{OrganizationStore, PgStore, ProfileStore, SetLogStore};
