//! End-to-end cart scenarios through the shared provider.

use std::sync::Arc;

use rust_decimal::Decimal;
use till_cart::{CartError, CartScope, MemoryStore, NotifyKind};
use till_core::{ProductId, TaxRate};
use till_integration_tests::{product, provider};

fn quantities(lines: &[till_cart::CartLine]) -> Vec<(String, u32)> {
    lines
        .iter()
        .map(|line| (line.product_id().to_string(), line.quantity))
        .collect()
}

// =============================================================================
// Scenarios
// =============================================================================

#[test]
fn test_add_two_to_empty_cart() {
    let (cart, notifier) = provider(Arc::new(MemoryStore::new()), TaxRate::ZERO);

    cart.add_item(&product("p1", 10_000, 5), 2)
        .expect("add within stock");

    assert_eq!(quantities(&cart.lines()), [("p1".to_string(), 2)]);
    let summary = cart.summary();
    assert_eq!(summary.subtotal, Decimal::from(20_000));
    assert_eq!(summary.item_count, 2);
    assert_eq!(summary.unique_item_count, 1);
    assert_eq!(
        notifier.last().map(|n| n.kind),
        Some(NotifyKind::Success)
    );
}

#[test]
fn test_add_beyond_stock_rejected() {
    let (cart, notifier) = provider(Arc::new(MemoryStore::new()), TaxRate::ZERO);
    let p1 = product("p1", 10_000, 5);
    cart.add_item(&p1, 2).expect("add within stock");

    let err = cart.add_item(&p1, 10).expect_err("over stock");

    assert!(matches!(err, CartError::InsufficientStock { available: 3, .. }));
    assert_eq!(quantities(&cart.lines()), [("p1".to_string(), 2)]);
    let last = notifier.last().expect("rejection notified");
    assert_eq!(last.kind, NotifyKind::Error);
    assert!(last.message.contains('3'));
}

#[test]
fn test_update_to_zero_rejected() {
    let (cart, _) = provider(Arc::new(MemoryStore::new()), TaxRate::ZERO);
    cart.add_item(&product("p1", 10_000, 5), 3)
        .expect("add within stock");

    let err = cart
        .update_item_quantity(&ProductId::new("p1"), 0)
        .expect_err("zero quantity");

    assert_eq!(err, CartError::InvalidQuantity);
    assert_eq!(quantities(&cart.lines()), [("p1".to_string(), 3)]);
}

#[test]
fn test_clear_two_lines() {
    let (cart, _) = provider(Arc::new(MemoryStore::new()), TaxRate::ZERO);
    cart.add_item(&product("p1", 10_000, 5), 1)
        .expect("add p1");
    cart.add_item(&product("p2", 3_000, 5), 4)
        .expect("add p2");

    cart.clear_cart();

    assert!(cart.lines().is_empty());
    let summary = cart.summary();
    assert_eq!(summary.subtotal, Decimal::ZERO);
    assert_eq!(summary.total, Decimal::ZERO);
    assert_eq!(summary.item_count, 0);
    assert_eq!(summary.unique_item_count, 0);
}

// =============================================================================
// Properties
// =============================================================================

#[test]
fn test_two_single_adds_equal_one_double_add() {
    let p1 = product("p1", 10_000, 5);

    let (twice, _) = provider(Arc::new(MemoryStore::new()), TaxRate::ZERO);
    twice.add_item(&p1, 1).expect("first add");
    twice.add_item(&p1, 1).expect("second add");

    let (once, _) = provider(Arc::new(MemoryStore::new()), TaxRate::ZERO);
    once.add_item(&p1, 2).expect("double add");

    assert_eq!(twice.snapshot(), once.snapshot());
}

#[test]
fn test_remove_absent_leaves_cart_alone() {
    let (cart, _) = provider(Arc::new(MemoryStore::new()), TaxRate::ZERO);
    cart.add_item(&product("p1", 10_000, 5), 1)
        .expect("add within stock");
    let before = cart.lines();

    assert!(!cart.remove_item(&ProductId::new("nope")));
    assert_eq!(cart.lines(), before);
}

#[test]
fn test_summary_tracks_every_mutation() {
    let (cart, _) = provider(Arc::new(MemoryStore::new()), TaxRate::ZERO);
    let check = || {
        let lines = cart.lines();
        let summary = cart.summary();
        let subtotal: Decimal = lines
            .iter()
            .map(|l| l.product.price.amount() * Decimal::from(l.quantity))
            .sum();
        let count: u64 = lines.iter().map(|l| u64::from(l.quantity)).sum();
        assert_eq!(summary.subtotal, subtotal);
        assert_eq!(summary.item_count, count);
        assert_eq!(summary.unique_item_count, lines.len());
    };

    cart.add_item(&product("p1", 1_250, 9), 3)
        .expect("add p1");
    check();
    cart.add_item(&product("p2", 7_000, 2), 2)
        .expect("add p2");
    check();
    cart.update_item_quantity(&ProductId::new("p1"), 9)
        .expect("update p1");
    check();
    cart.remove_item(&ProductId::new("p2"));
    check();
    cart.clear_cart();
    check();
}

#[test]
fn test_tax_rate_flows_into_total() {
    let rate: TaxRate = "0.11".parse().expect("valid rate");
    let (cart, _) = provider(Arc::new(MemoryStore::new()), rate);
    cart.add_item(&product("p1", 10_000, 5), 2)
        .expect("add within stock");

    let summary = cart.summary();
    assert_eq!(summary.tax, Decimal::from(2_200));
    assert_eq!(summary.total, Decimal::from(22_200));
}

// =============================================================================
// Scope
// =============================================================================

#[test]
fn test_scope_shares_single_cart() {
    let (cart, _) = provider(Arc::new(MemoryStore::new()), TaxRate::ZERO);
    let register = CartScope::with_provider(cart.clone());
    let checkout = CartScope::with_provider(cart);

    register
        .use_cart()
        .expect("provided")
        .add_item(&product("p1", 10_000, 5), 2)
        .expect("add within stock");

    let draft = checkout
        .use_cart()
        .expect("provided")
        .order_draft()
        .expect("non-empty cart");
    assert_eq!(draft.item_count(), 2);
    assert_eq!(draft.total, Decimal::from(20_000));
}

#[test]
fn test_scope_without_provider_is_a_wiring_error() {
    let scope = CartScope::empty();
    assert!(matches!(scope.use_cart(), Err(CartError::ContextMissing)));
}
