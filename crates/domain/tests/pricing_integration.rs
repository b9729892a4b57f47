//! Integration tests for pricing whole orders.
//!
//! These tests exercise the public API the workflow relies on: pricing each
//! line once, building totals, and freezing those prices into order rows.

use chrono::Utc;
use common::{AddressId, OrderId, PaymentMethodId, ProductId, UserId};
use domain::{
    DiscountPercent, Money, NewOrder, OrderItem, OrderLine, OrderStatus, PlaceOrder,
    PricingEngine, Product, SHIPPING_FEE,
};

fn product(id: i64, base_minor: i64, discount: i64) -> Product {
    Product {
        id: ProductId::new(id),
        name: format!("Product {id}"),
        base_price: Money::from_minor(base_minor),
        discount_percent: DiscountPercent::new(discount).unwrap(),
    }
}

fn command(lines: Vec<OrderLine>) -> PlaceOrder {
    PlaceOrder::new(
        UserId::new(1),
        AddressId::new(1),
        PaymentMethodId::new(1),
        lines,
    )
}

#[test]
fn ten_percent_scenario() {
    let engine = PricingEngine::default();
    let p = product(1, 10_000, 10);
    let cmd = command(vec![OrderLine::new(p.id, "M", "red", 3)]);
    cmd.validate().unwrap();

    let priced: Vec<_> = cmd
        .lines
        .iter()
        .cloned()
        .map(|line| engine.price_line(&p, line))
        .collect();
    let totals = engine.totals(&priced).unwrap();

    assert_eq!(priced[0].unit_price, Money::from_minor(9_000));
    assert_eq!(totals.subtotal, Money::from_minor(27_000));
    assert_eq!(totals.shipping_fee, SHIPPING_FEE);
    assert_eq!(totals.discount_amount, Money::zero());
    assert_eq!(totals.total, Money::from_minor(57_000));
}

#[test]
fn persisted_rows_reproduce_subtotal() {
    let engine = PricingEngine::default();
    let catalog = [product(1, 19_999, 33), product(2, 4_550, 5), product(3, 1, 50)];
    let cmd = command(vec![
        OrderLine::new(ProductId::new(1), "38", "white", 2),
        OrderLine::new(ProductId::new(2), "L", "navy", 5),
        OrderLine::new(ProductId::new(3), "S", "red", 7),
    ]);

    let priced: Vec<_> = cmd
        .lines
        .iter()
        .zip(catalog.iter())
        .map(|(line, p)| engine.price_line(p, line.clone()))
        .collect();
    let totals = engine.totals(&priced).unwrap();

    let order = NewOrder::confirmed(&cmd, totals, Utc::now()).with_id(OrderId::new(99));
    let items: Vec<_> = priced
        .iter()
        .map(|p| OrderItem::from_priced(order.id, p))
        .collect();

    let recomputed: Money = items.iter().map(OrderItem::line_total).sum();
    assert_eq!(recomputed, order.subtotal);
    assert_eq!(
        order.total_amount,
        order.subtotal + order.shipping_fee - order.discount_amount
    );
    assert_eq!(order.status, OrderStatus::Confirmed);
    assert!(items.iter().all(|i| i.order_id == OrderId::new(99)));
}

#[test]
fn repricing_after_catalog_change_does_not_touch_frozen_items() {
    let engine = PricingEngine::default();
    let before = product(1, 10_000, 10);
    let line = OrderLine::new(before.id, "M", "red", 1);
    let item = OrderItem::from_priced(OrderId::new(1), &engine.price_line(&before, line.clone()));

    let after = product(1, 12_000, 0);
    let repriced = engine.price_line(&after, line);

    assert_eq!(item.price_at_time, Money::from_minor(9_000));
    assert_eq!(repriced.unit_price, Money::from_minor(12_000));
}
