pub mod connection;
pub mod fixtures;
pub mod migrations;
pub mod repositories;

pub use connection::{connect, connect_with_settings, DbPool};
pub use fixtures::{SeedCatalog, SeedResult, VerificationResult};
pub use repositories::{
    BundleSlot, CartRepository, CatalogRepository, OrderRepository, RepositoryError,
    SqlCartRepository, SqlCatalogRepository, SqlOrderRepository,
};
