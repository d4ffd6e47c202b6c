use std::sync::Arc;

use burgeria_core::config::EngineConfig;
use burgeria_core::domain::cart::SessionId;
use burgeria_core::domain::order::FulfillmentType;
use burgeria_core::domain::product::{ProductId, ProductKind};
use burgeria_core::embedding::{StaticEmbedder, UnavailableEmbedder};
use burgeria_core::errors::EngineError;
use burgeria_core::resolver::Resolution;
use burgeria_db::fixtures::SeedCatalog;
use burgeria_db::{connect_with_settings, migrations, DbPool};
use burgeria_engine::{
    ClearTarget, CustomerInfo, Engine, ModificationRequest, ReplaceOutcome, UpdateOutcome,
};

async fn seeded_pool() -> DbPool {
    let pool = connect_with_settings("sqlite::memory:", 1, 30)
        .await
        .expect("connect test pool");
    migrations::run_pending(&pool).await.expect("run migrations");
    SeedCatalog::load(&pool).await.expect("load seed catalog");
    pool
}

fn test_embedder() -> StaticEmbedder {
    StaticEmbedder::new(4)
        .with_entry("한우불고기버거", vec![1.0, 0.0, 0.0, 0.0])
        .with_entry("콜라", vec![0.0, 0.0, 1.0, 0.1])
}

async fn engine() -> (Engine, DbPool) {
    let pool = seeded_pool().await;
    let engine = Engine::new(pool.clone(), &EngineConfig::default(), Arc::new(test_embedder()));
    (engine, pool)
}

fn session(name: &str) -> SessionId {
    SessionId(name.to_string())
}

fn pid(id: &str) -> ProductId {
    ProductId(id.to_string())
}

#[tokio::test]
async fn find_product_commits_to_a_clear_winner() {
    let (engine, pool) = engine().await;

    let resolution =
        engine.find_product("한우불고기버거", None, None).await.expect("resolve");
    match resolution {
        Resolution::Found { product, score } => {
            assert_eq!(product.id, pid("A00001"));
            assert!(score > 0.99);
        }
        other => panic!("expected FOUND, got {other:?}"),
    }

    pool.close().await;
}

#[tokio::test]
async fn near_equal_colas_come_back_ambiguous_with_no_auto_pick() {
    let (engine, pool) = engine().await;

    let resolution = engine
        .find_product("콜라", Some(ProductKind::Beverage), None)
        .await
        .expect("resolve");
    match resolution {
        Resolution::Ambiguous { candidates } => {
            let ids: Vec<&str> =
                candidates.iter().map(|scored| scored.product.id.0.as_str()).collect();
            assert_eq!(ids.len(), 3, "all three cola variants must be offered");
            assert!(ids.contains(&"C00001"));
            assert!(ids.contains(&"C00002"));
            assert!(ids.contains(&"C00003"));
            assert!(candidates[0].score - candidates[1].score <= 0.08);
        }
        other => panic!("expected AMBIGUOUS, got {other:?}"),
    }

    pool.close().await;
}

#[tokio::test]
async fn unknown_query_resolves_to_not_found() {
    let (engine, pool) = engine().await;

    let resolution = engine.find_product("우주선", None, None).await.expect("resolve");
    assert_eq!(resolution, Resolution::NotFound);

    pool.close().await;
}

#[tokio::test]
async fn embedder_failure_is_a_distinct_error_status() {
    let pool = seeded_pool().await;
    let engine =
        Engine::new(pool.clone(), &EngineConfig::default(), Arc::new(UnavailableEmbedder));

    let error = engine.find_product("콜라", None, None).await.expect_err("embedding down");
    assert!(matches!(error, EngineError::EmbeddingUnavailable(_)));

    pool.close().await;
}

#[tokio::test]
async fn bundle_add_explodes_into_component_lines_with_component_sum_pricing() {
    let (engine, pool) = engine().await;
    let session = session("bundle-add");

    let receipt = engine
        .add_to_cart(&session, &pid("SET00001"), 1, true, &[], None)
        .await
        .expect("add bundle");

    assert_eq!(receipt.lines.len(), 3);
    let group = receipt.bundle_group_id.clone().expect("bundle group id");
    assert!(receipt.lines.iter().all(|line| line.bundle_group_id.as_ref() == Some(&group)));
    // Sum of the default components' own prices, not the bundle's listed
    // price (10200).
    assert_eq!(receipt.amount_added, 13000);

    let cart = engine.get_cart(&session).await.expect("get cart");
    assert_eq!(cart.summary.line_count, 3);
    assert_eq!(cart.summary.amount, 13000);

    pool.close().await;
}

#[tokio::test]
async fn adding_a_non_bundle_with_the_bundle_flag_is_rejected() {
    let (engine, pool) = engine().await;

    let error = engine
        .add_to_cart(&session("flag-mismatch"), &pid("C00001"), 1, true, &[], None)
        .await
        .expect_err("not a bundle");
    assert_eq!(error, EngineError::NotABundle(pid("C00001")));

    pool.close().await;
}

#[tokio::test]
async fn out_of_stock_product_cannot_be_added() {
    let (engine, pool) = engine().await;
    sqlx::query("UPDATE product SET stock_quantity = 2 WHERE id = 'B00001'")
        .execute(&pool)
        .await
        .expect("shrink stock");

    let error = engine
        .add_to_cart(&session("stock"), &pid("B00001"), 3, false, &[], None)
        .await
        .expect_err("insufficient stock");
    assert_eq!(
        error,
        EngineError::OutOfStock {
            product_id: pid("B00001"),
            name: "포테이토".to_string(),
            requested: 3,
            available: 2,
        }
    );

    pool.close().await;
}

#[tokio::test]
async fn single_line_modifications_price_from_the_catalog() {
    let (engine, pool) = engine().await;
    let session = session("mods");

    let receipt = engine
        .add_to_cart(
            &session,
            &pid("B00001"),
            1,
            false,
            &[ModificationRequest::SizeUpgrade],
            Some("케첩 많이"),
        )
        .await
        .expect("add with size upgrade");

    let line = &receipt.lines[0];
    assert_eq!(line.unit_base_price, 2000);
    assert_eq!(line.line_total(), 2200);
    assert_eq!(line.notes, "케첩 많이");

    pool.close().await;
}

#[tokio::test]
async fn add_time_swap_binds_to_the_matching_slot() {
    let (engine, pool) = engine().await;
    let session = session("add-swap");

    let receipt = engine
        .add_to_cart(
            &session,
            &pid("SET00001"),
            1,
            true,
            &[ModificationRequest::ComponentSwap {
                from_product_id: pid("B00001"),
                to_product_id: pid("B00002"),
            }],
            None,
        )
        .await
        .expect("add bundle with swap");

    assert_eq!(receipt.lines.len(), 3);
    let swapped = receipt
        .lines
        .iter()
        .find(|line| line.product_id == pid("B00002"))
        .expect("swapped side line");
    assert_eq!(swapped.display_name, "양념감자");
    // Base price stays the slot default; the swap delta rides on the
    // modification.
    assert_eq!(swapped.unit_base_price, 2000);
    assert_eq!(swapped.line_total(), 2600);
    assert_eq!(receipt.amount_added, 13600);
    assert!(receipt
        .lines
        .iter()
        .filter(|line| line.product_id != pid("B00002"))
        .all(|line| line.modifications.is_empty()));

    // The delta scales with the purchase quantity.
    let doubled = engine
        .add_to_cart(
            &SessionId("add-swap-qty".to_string()),
            &pid("SET00001"),
            2,
            true,
            &[ModificationRequest::ComponentSwap {
                from_product_id: pid("B00001"),
                to_product_id: pid("B00002"),
            }],
            None,
        )
        .await
        .expect("add two bundles with swap");
    assert_eq!(doubled.amount_added, 2 * 13600);

    pool.close().await;
}

#[tokio::test]
async fn add_time_extras_attach_to_the_main_slot() {
    let (engine, pool) = engine().await;
    let session = session("add-extras");

    let receipt = engine
        .add_to_cart(
            &session,
            &pid("SET00001"),
            1,
            true,
            &[
                ModificationRequest::AddOn { product_id: pid("D00001") },
                ModificationRequest::SizeUpgrade,
            ],
            None,
        )
        .await
        .expect("add bundle with extras");

    // Slots come back in id order, so the burger is the main line.
    let burger = &receipt.lines[0];
    assert_eq!(burger.product_id, pid("A00001"));
    assert_eq!(burger.modifications.len(), 2);
    assert_eq!(burger.modification_delta(), 800 + 200);
    assert_eq!(burger.line_total(), 9000 + 1000);
    assert!(receipt.lines[1..].iter().all(|line| line.modifications.is_empty()));
    assert_eq!(receipt.amount_added, 13000 + 1000);

    pool.close().await;
}

#[tokio::test]
async fn replace_component_reprices_against_the_slot_default() {
    let (engine, pool) = engine().await;
    let session = session("replace");

    engine
        .add_to_cart(&session, &pid("SET00001"), 1, true, &[], None)
        .await
        .expect("add bundle");

    let outcome = engine
        .replace_component(&session, &pid("B00001"), &pid("B00002"), None)
        .await
        .expect("replace side");
    match outcome {
        ReplaceOutcome::Updated { line, price_delta } => {
            assert_eq!(price_delta, 600);
            assert_eq!(line.product_id, pid("B00002"));
            assert_eq!(line.display_name, "양념감자");
            // Base price stays the slot default; the delta lives on the
            // modification.
            assert_eq!(line.unit_base_price, 2000);
            assert_eq!(line.line_total(), 2600);
        }
        other => panic!("expected UPDATED, got {other:?}"),
    }

    let cart = engine.get_cart(&session).await.expect("get cart");
    assert_eq!(cart.summary.amount, 13600);

    pool.close().await;
}

#[tokio::test]
async fn swapping_back_and_forth_never_compounds() {
    let (engine, pool) = engine().await;
    let session = session("swap-twice");

    engine
        .add_to_cart(&session, &pid("SET00001"), 1, true, &[], None)
        .await
        .expect("add bundle");

    engine
        .replace_component(&session, &pid("B00001"), &pid("B00002"), None)
        .await
        .expect("swap up");
    let outcome = engine
        .replace_component(&session, &pid("B00002"), &pid("B00001"), None)
        .await
        .expect("swap back");

    match outcome {
        ReplaceOutcome::Updated { line, price_delta } => {
            assert_eq!(price_delta, 0);
            assert_eq!(line.line_total(), 2000);
        }
        other => panic!("expected UPDATED, got {other:?}"),
    }

    let cart = engine.get_cart(&session).await.expect("get cart");
    assert_eq!(cart.summary.amount, 13000);

    pool.close().await;
}

#[tokio::test]
async fn cross_category_swap_is_rejected() {
    let (engine, pool) = engine().await;
    let session = session("mismatch");

    engine
        .add_to_cart(&session, &pid("SET00001"), 1, true, &[], None)
        .await
        .expect("add bundle");

    let error = engine
        .replace_component(&session, &pid("B00001"), &pid("C00001"), None)
        .await
        .expect_err("side for beverage");
    assert_eq!(
        error,
        EngineError::CategoryMismatch {
            expected: ProductKind::Sides,
            found: ProductKind::Beverage,
        }
    );

    pool.close().await;
}

#[tokio::test]
async fn two_matching_groups_force_an_explicit_choice_without_mutating() {
    let (engine, pool) = engine().await;
    let session = session("two-groups");

    engine
        .add_to_cart(&session, &pid("SET00001"), 1, true, &[], None)
        .await
        .expect("first bundle");
    let second = engine
        .add_to_cart(&session, &pid("SET00001"), 1, true, &[], None)
        .await
        .expect("second bundle");

    let outcome = engine
        .replace_component(&session, &pid("B00001"), &pid("B00002"), None)
        .await
        .expect("ambiguous replace");
    let candidates = match outcome {
        ReplaceOutcome::MultipleGroups { candidates } => candidates,
        other => panic!("expected MULTIPLE_GROUPS, got {other:?}"),
    };
    assert_eq!(candidates.len(), 2);

    // No line was touched.
    let cart = engine.get_cart(&session).await.expect("get cart");
    assert_eq!(cart.summary.amount, 26000);
    assert!(cart.lines.iter().all(|line| line.modifications.is_empty()));

    // An explicit group id disambiguates.
    let target_group = second.bundle_group_id.expect("group id");
    let outcome = engine
        .replace_component(&session, &pid("B00001"), &pid("B00002"), Some(&target_group))
        .await
        .expect("explicit replace");
    assert!(matches!(outcome, ReplaceOutcome::Updated { price_delta: 600, .. }));

    let cart = engine.get_cart(&session).await.expect("get cart");
    assert_eq!(cart.summary.amount, 26600);

    pool.close().await;
}

#[tokio::test]
async fn update_quantity_zero_removes_only_that_line() {
    let (engine, pool) = engine().await;
    let session = session("update-zero");

    let cola = engine
        .add_to_cart(&session, &pid("C00001"), 2, false, &[], None)
        .await
        .expect("add cola");
    engine
        .add_to_cart(&session, &pid("B00001"), 1, false, &[], None)
        .await
        .expect("add potato");

    let outcome = engine
        .update_cart_line(&session, &cola.lines[0].id, 0)
        .await
        .expect("remove via zero quantity");
    assert!(matches!(outcome, UpdateOutcome::Removed { .. }));

    let cart = engine.get_cart(&session).await.expect("get cart");
    assert_eq!(cart.summary.line_count, 1);
    assert_eq!(cart.summary.amount, 2000);

    pool.close().await;
}

#[tokio::test]
async fn update_quantity_recomputes_without_re_resolving() {
    let (engine, pool) = engine().await;
    let session = session("update-qty");

    let receipt = engine
        .add_to_cart(
            &session,
            &pid("B00001"),
            1,
            false,
            &[ModificationRequest::SizeUpgrade],
            None,
        )
        .await
        .expect("add line");

    let outcome = engine
        .update_cart_line(&session, &receipt.lines[0].id, 3)
        .await
        .expect("bump quantity");
    match outcome {
        UpdateOutcome::Updated { line } => {
            assert_eq!(line.quantity, 3);
            assert_eq!(line.line_total(), (2000 + 200) * 3);
        }
        other => panic!("expected UPDATED, got {other:?}"),
    }

    pool.close().await;
}

#[tokio::test]
async fn updating_an_unknown_line_is_not_found() {
    let (engine, pool) = engine().await;

    let error = engine
        .update_cart_line(
            &session("nobody"),
            &burgeria_core::domain::cart::CartLineId("missing".to_string()),
            2,
        )
        .await
        .expect_err("unknown line");
    assert!(matches!(error, EngineError::LineNotFound(_)));

    pool.close().await;
}

#[tokio::test]
async fn clear_reports_removed_and_remaining_counts() {
    let (engine, pool) = engine().await;
    let session = session("clear");

    let cola = engine
        .add_to_cart(&session, &pid("C00001"), 1, false, &[], None)
        .await
        .expect("add cola");
    engine
        .add_to_cart(&session, &pid("SET00001"), 1, true, &[], None)
        .await
        .expect("add bundle");

    let receipt = engine
        .clear_cart(&session, ClearTarget::Line(cola.lines[0].id.clone()))
        .await
        .expect("clear one line");
    assert_eq!(receipt.removed, 1);
    assert_eq!(receipt.remaining, 3);

    let receipt = engine.clear_cart(&session, ClearTarget::All).await.expect("clear everything");
    assert_eq!(receipt.removed, 3);
    assert_eq!(receipt.remaining, 0);

    pool.close().await;
}

#[tokio::test]
async fn get_bundle_options_lists_defaults_and_swap_candidates() {
    let (engine, pool) = engine().await;

    let options = engine.get_bundle_options(&pid("SET00001")).await.expect("options");
    assert_eq!(options.bundle_name, "한우불고기버거 세트");
    assert_eq!(options.components.len(), 3);

    let sides = options
        .swap_candidates
        .iter()
        .find(|entry| entry.category == ProductKind::Sides)
        .expect("sides candidates");
    assert!(sides.options.iter().any(|option| option.product_id == pid("B00002")));
    // Cheapest first.
    assert!(sides.options.windows(2).all(|pair| pair[0].price <= pair[1].price));

    let error = engine.get_bundle_options(&pid("C00001")).await.expect_err("not a bundle");
    assert_eq!(error, EngineError::NotABundle(pid("C00001")));

    pool.close().await;
}

#[tokio::test]
async fn finalize_snapshots_the_cart_and_empties_it() {
    let (engine, pool) = engine().await;
    let session = session("finalize");

    engine
        .add_to_cart(&session, &pid("SET00001"), 1, true, &[], None)
        .await
        .expect("add bundle");

    let receipt = engine
        .finalize_order(
            &session,
            CustomerInfo { name: Some("김철수".to_string()), phone: None },
            FulfillmentType::Takeout,
        )
        .await
        .expect("finalize");

    assert_eq!(receipt.sequence_number, 1);
    assert_eq!(receipt.total_amount, 13000);
    assert_eq!(receipt.line_count, 3);
    assert_eq!(receipt.estimated_minutes, 10 + 3 * 3);
    assert!(receipt.order_id.0.starts_with("ORD-"));

    let cart = engine.get_cart(&session).await.expect("get cart");
    assert!(cart.lines.is_empty());

    let (order, lines) = engine.get_order(&receipt.order_id).await.expect("read back order");
    assert_eq!(order.total_amount, 13000);
    assert_eq!(lines.len(), 3);
    let group = lines[0].bundle_group_id.clone().expect("group survives finalize");
    assert!(lines.iter().all(|line| line.bundle_group_id.as_ref() == Some(&group)));

    pool.close().await;
}

#[tokio::test]
async fn finalizing_an_empty_cart_fails_and_creates_nothing() {
    let (engine, pool) = engine().await;
    let session = session("empty-finalize");

    let error = engine
        .finalize_order(&session, CustomerInfo::default(), FulfillmentType::DineIn)
        .await
        .expect_err("empty cart");
    assert_eq!(error, EngineError::EmptyCart(session.clone()));

    let orders: i64 = sqlx::query_scalar("SELECT COUNT(1) FROM orders")
        .fetch_one(&pool)
        .await
        .expect("count orders");
    assert_eq!(orders, 0);

    pool.close().await;
}

#[tokio::test]
async fn same_day_sequence_numbers_increment() {
    let (engine, pool) = engine().await;

    for expected_sequence in 1..=2u32 {
        let session = session(&format!("seq-{expected_sequence}"));
        engine
            .add_to_cart(&session, &pid("C00001"), 1, false, &[], None)
            .await
            .expect("add cola");
        let receipt = engine
            .finalize_order(&session, CustomerInfo::default(), FulfillmentType::Takeout)
            .await
            .expect("finalize");
        assert_eq!(receipt.sequence_number, expected_sequence);
    }

    pool.close().await;
}
