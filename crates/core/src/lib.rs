pub mod config;
pub mod domain;
pub mod embedding;
pub mod errors;
pub mod pricing;
pub mod resolver;

pub use chrono;

pub use config::{ConfigError, ConfigOverrides, EngineConfig, LoadOptions};
pub use domain::cart::{BundleGroupId, CartLine, CartLineId, CartSummary, LineKind, SessionId};
pub use domain::modification::{Modification, ModificationKind};
pub use domain::order::{FulfillmentType, Order, OrderId, OrderLine, OrderLineId, OrderStatus};
pub use domain::product::{BundleComponent, Product, ProductId, ProductKind};
pub use embedding::{Embedder, EmbeddingError, StaticEmbedder};
pub use errors::EngineError;
pub use resolver::{Resolution, ResolverConfig, ScoredProduct};
