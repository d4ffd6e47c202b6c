use std::sync::Arc;

use burgeria_core::domain::product::ProductKind;
use burgeria_core::embedding::Embedder;
use burgeria_core::errors::EngineError;
use burgeria_core::resolver::{self, Resolution, ResolverConfig};
use burgeria_db::CatalogRepository;

/// Free-text product lookup: embed the query, score it against every in-stock
/// product, and either commit to one match or hand the near-ties back to the
/// caller. Embedding failures surface as a distinct error status; they are
/// never reported as NOT_FOUND.
pub struct ProductSearch {
    catalog: Arc<dyn CatalogRepository>,
    embedder: Arc<dyn Embedder>,
    config: ResolverConfig,
}

impl ProductSearch {
    pub fn new(
        catalog: Arc<dyn CatalogRepository>,
        embedder: Arc<dyn Embedder>,
        config: ResolverConfig,
    ) -> Self {
        Self { catalog, embedder, config }
    }

    pub async fn find_product(
        &self,
        query: &str,
        category: Option<ProductKind>,
        limit: Option<usize>,
    ) -> Result<Resolution, EngineError> {
        let query_embedding = self
            .embedder
            .embed(query)
            .await
            .map_err(|error| EngineError::EmbeddingUnavailable(error.to_string()))?;

        let candidates = self.catalog.list_in_stock(category).await?;

        let config = match limit {
            Some(limit) if limit > 0 => ResolverConfig { limit, ..self.config },
            _ => self.config,
        };
        let resolution = resolver::resolve(&query_embedding, &candidates, &config);

        tracing::debug!(
            event_name = "resolver.query_resolved",
            query,
            candidate_count = candidates.len(),
            outcome = match &resolution {
                Resolution::Found { .. } => "found",
                Resolution::Ambiguous { .. } => "ambiguous",
                Resolution::NotFound => "not_found",
            },
        );

        Ok(resolution)
    }
}
