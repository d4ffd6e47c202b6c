use sqlx::Executor;

use crate::connection::DbPool;
use crate::repositories::RepositoryError;

/// Contract for the deterministic seed catalog: one row per seeded product.
const SEED_PRODUCTS: &[SeedProductContract] = &[
    SeedProductContract {
        product_id: "A00001",
        name: "한우불고기버거",
        kind: "burger",
        price: 9000,
        has_embedding: true,
    },
    SeedProductContract {
        product_id: "A00002",
        name: "치즈버거",
        kind: "burger",
        price: 6500,
        has_embedding: true,
    },
    SeedProductContract {
        product_id: "B00001",
        name: "포테이토",
        kind: "sides",
        price: 2000,
        has_embedding: true,
    },
    SeedProductContract {
        product_id: "B00002",
        name: "양념감자",
        kind: "sides",
        price: 2600,
        has_embedding: true,
    },
    SeedProductContract {
        product_id: "C00001",
        name: "콜라",
        kind: "beverage",
        price: 2000,
        has_embedding: true,
    },
    SeedProductContract {
        product_id: "C00002",
        name: "제로콜라",
        kind: "beverage",
        price: 2000,
        has_embedding: true,
    },
    SeedProductContract {
        product_id: "C00003",
        name: "체리콜라",
        kind: "beverage",
        price: 2000,
        has_embedding: true,
    },
    SeedProductContract {
        product_id: "C00004",
        name: "사이다",
        kind: "beverage",
        price: 2000,
        has_embedding: true,
    },
    SeedProductContract {
        product_id: "D00001",
        name: "아이스크림콘",
        kind: "dessert",
        price: 800,
        has_embedding: false,
    },
    SeedProductContract {
        product_id: "SET00001",
        name: "한우불고기버거 세트",
        kind: "bundle",
        price: 10200,
        has_embedding: true,
    },
];

const SEED_BUNDLE_ID: &str = "SET00001";
const SEED_BUNDLE_DEFAULTS: &[&str] = &["A00001", "B00001", "C00001"];

/// Deterministic catalog fixtures backing the repository and engine tests:
/// two burgers, two sides, four beverages (three near-identical colas), a
/// dessert without an embedding, and one bundle with three default slots.
pub struct SeedCatalog;

impl SeedCatalog {
    /// SQL fixture content for the seed catalog.
    pub const SQL: &str = include_str!("../../../config/fixtures/seed_catalog.sql");

    /// Load the seed catalog into the database. Re-loading is idempotent.
    pub async fn load(pool: &DbPool) -> Result<SeedResult, RepositoryError> {
        let mut tx = pool.begin().await?;

        tx.execute(sqlx::query(Self::SQL)).await?;
        tx.commit().await?;

        let products_seeded = SEED_PRODUCTS
            .iter()
            .map(|product| ProductSeedInfo {
                product_id: product.product_id,
                name: product.name,
                kind: product.kind,
            })
            .collect::<Vec<_>>();

        Ok(SeedResult { products_seeded })
    }

    /// Verify that the seed catalog exists and matches the contract.
    pub async fn verify(pool: &DbPool) -> Result<VerificationResult, RepositoryError> {
        let mut checks = Vec::new();

        for product in SEED_PRODUCTS {
            let row_ok: i64 = sqlx::query_scalar(
                "SELECT EXISTS(
                    SELECT 1 FROM product
                    WHERE id = ?1 AND name = ?2 AND kind = ?3 AND price = ?4
                      AND stock_quantity > 0
                      AND (embedding IS NOT NULL) = ?5
                 )",
            )
            .bind(product.product_id)
            .bind(product.name)
            .bind(product.kind)
            .bind(product.price)
            .bind(product.has_embedding)
            .fetch_one(pool)
            .await?;
            checks.push((product.product_id, row_ok == 1));
        }

        let default_count: i64 = sqlx::query_scalar(
            "SELECT COUNT(1) FROM bundle_component WHERE bundle_id = ?1 AND is_default = 1",
        )
        .bind(SEED_BUNDLE_ID)
        .fetch_one(pool)
        .await?;
        checks.push(("bundle-default-count", default_count == SEED_BUNDLE_DEFAULTS.len() as i64));

        for component_id in SEED_BUNDLE_DEFAULTS {
            let slot_ok: i64 = sqlx::query_scalar(
                "SELECT EXISTS(
                    SELECT 1 FROM bundle_component
                    WHERE bundle_id = ?1 AND product_id = ?2 AND quantity = 1 AND is_default = 1
                 )",
            )
            .bind(SEED_BUNDLE_ID)
            .bind(component_id)
            .fetch_one(pool)
            .await?;
            checks.push((*component_id, slot_ok == 1));
        }

        let all_present = checks.iter().all(|(_, exists)| *exists);
        Ok(VerificationResult { all_present, checks })
    }

    /// Clean up seeded fixtures from a test database.
    pub async fn clean(pool: &DbPool) -> Result<(), RepositoryError> {
        let mut tx = pool.begin().await?;

        sqlx::query("DELETE FROM bundle_component WHERE bundle_id = ?1")
            .bind(SEED_BUNDLE_ID)
            .execute(&mut *tx)
            .await?;

        let quoted = SEED_PRODUCTS
            .iter()
            .map(|product| format!("'{}'", product.product_id))
            .collect::<Vec<_>>()
            .join(",");
        sqlx::query(&format!("DELETE FROM product WHERE id IN ({quoted})"))
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
struct SeedProductContract {
    product_id: &'static str,
    name: &'static str,
    kind: &'static str,
    price: i64,
    has_embedding: bool,
}

#[derive(Debug)]
pub struct SeedResult {
    pub products_seeded: Vec<ProductSeedInfo>,
}

#[derive(Debug)]
pub struct ProductSeedInfo {
    pub product_id: &'static str,
    pub name: &'static str,
    pub kind: &'static str,
}

#[derive(Debug)]
pub struct VerificationResult {
    pub all_present: bool,
    pub checks: Vec<(&'static str, bool)>,
}
