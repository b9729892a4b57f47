use common::ProductId;
use criterion::{Criterion, criterion_group, criterion_main};
use domain::{DiscountPercent, Money, OrderLine, PricingEngine, Product, unit_price};
use std::hint::black_box;

fn make_product(id: i64, base_minor: i64, discount: i64) -> Product {
    Product {
        id: ProductId::new(id),
        name: format!("Bench Product {id}"),
        base_price: Money::from_minor(base_minor),
        discount_percent: DiscountPercent::new(discount).unwrap(),
    }
}

fn bench_unit_price(c: &mut Criterion) {
    let discount = DiscountPercent::new(15).unwrap();

    c.bench_function("pricing/unit_price", |b| {
        b.iter(|| unit_price(black_box(Money::from_minor(123_457)), black_box(discount)));
    });
}

fn bench_price_cart(c: &mut Criterion) {
    let engine = PricingEngine::default();
    let products: Vec<Product> = (1..=20)
        .map(|i| make_product(i, 1_000 * i, i % 50))
        .collect();

    c.bench_function("pricing/price_20_line_cart", |b| {
        b.iter(|| {
            let lines: Vec<_> = products
                .iter()
                .map(|p| engine.price_line(p, OrderLine::new(p.id, "M", "red", 2)))
                .collect();
            black_box(engine.totals(&lines).unwrap())
        });
    });
}

criterion_group!(benches, bench_unit_price, bench_price_cart);
criterion_main!(benches);
