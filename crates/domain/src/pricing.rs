//! Pricing engine: discounted unit prices and order totals.
//!
//! Everything here is a pure function of its inputs. The workflow prices each
//! line once per transaction and persists exactly the price it summed, so the
//! frozen `price_at_time` always matches the subtotal.

use serde::{Deserialize, Serialize};

use crate::catalog::Product;
use crate::error::DomainError;
use crate::order::OrderLine;
use crate::value_objects::{DiscountPercent, Money};

/// Flat shipping fee charged on every order, in minor units.
pub const SHIPPING_FEE: Money = Money::from_minor(30_000);

/// Applies a percentage discount to a base price.
///
/// Computes `base * (100 - pct) / 100` in integer minor units and rounds the
/// remainder half-to-even, so repeated pricing of the same inputs can never
/// drift by a minor unit.
pub fn unit_price(base_price: Money, discount: DiscountPercent) -> Money {
    let numerator = i128::from(base_price.minor()) * i128::from(100 - i64::from(discount.get()));
    let quotient = numerator.div_euclid(100);
    let remainder = numerator.rem_euclid(100);

    let rounded = match (remainder * 2).cmp(&100) {
        std::cmp::Ordering::Greater => quotient + 1,
        std::cmp::Ordering::Equal if quotient % 2 != 0 => quotient + 1,
        _ => quotient,
    };

    // |rounded| <= |base_price|, so this always fits back into i64.
    Money::from_minor(rounded as i64)
}

/// A requested line together with the unit price frozen for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricedLine {
    pub line: OrderLine,
    pub unit_price: Money,
}

impl PricedLine {
    /// Returns `unit_price * quantity`, or `None` if it overflows.
    pub fn line_total(&self) -> Option<Money> {
        self.unit_price.checked_multiply(self.line.quantity)
    }
}

/// Monetary summary of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderTotals {
    pub subtotal: Money,
    pub shipping_fee: Money,
    /// Reserved for promotions; always zero today but never folded into the subtotal.
    pub discount_amount: Money,
    pub total: Money,
}

impl OrderTotals {
    /// Builds totals, deriving `total = subtotal + shipping_fee - discount_amount`.
    pub fn new(subtotal: Money, shipping_fee: Money, discount_amount: Money) -> Self {
        Self {
            subtotal,
            shipping_fee,
            discount_amount,
            total: subtotal + shipping_fee - discount_amount,
        }
    }
}

/// Prices order lines against catalog data.
#[derive(Debug, Clone, Copy)]
pub struct PricingEngine {
    shipping_fee: Money,
}

impl PricingEngine {
    /// Creates an engine charging the given flat shipping fee.
    pub fn new(shipping_fee: Money) -> Self {
        Self { shipping_fee }
    }

    /// Returns the flat shipping fee.
    pub fn shipping_fee(&self) -> Money {
        self.shipping_fee
    }

    /// Freezes the discounted unit price of `product` onto `line`.
    pub fn price_line(&self, product: &Product, line: OrderLine) -> PricedLine {
        PricedLine {
            unit_price: unit_price(product.base_price, product.discount_percent),
            line,
        }
    }

    /// Sums priced lines into order totals.
    ///
    /// Fails with [`DomainError::AmountOverflow`] when a line total, the
    /// subtotal or the grand total does not fit in [`Money`].
    pub fn totals(&self, lines: &[PricedLine]) -> Result<OrderTotals, DomainError> {
        let mut subtotal = Money::zero();
        for line in lines {
            subtotal = line
                .line_total()
                .and_then(|total| subtotal.checked_add(total))
                .ok_or_else(|| {
                    DomainError::AmountOverflow(format!(
                        "{} x {} is too large",
                        line.line.variant(),
                        line.line.quantity
                    ))
                })?;
        }
        subtotal.checked_add(self.shipping_fee).ok_or_else(|| {
            DomainError::AmountOverflow("order total is too large".to_string())
        })?;

        Ok(OrderTotals::new(subtotal, self.shipping_fee, Money::zero()))
    }
}

impl Default for PricingEngine {
    fn default() -> Self {
        Self::new(SHIPPING_FEE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::ProductId;

    fn pct(p: i64) -> DiscountPercent {
        DiscountPercent::new(p).unwrap()
    }

    fn product(id: i64, base_minor: i64, discount: i64) -> Product {
        Product {
            id: ProductId::new(id),
            name: format!("Product {id}"),
            base_price: Money::from_minor(base_minor),
            discount_percent: pct(discount),
        }
    }

    #[test]
    fn test_ten_percent_off_hundred() {
        assert_eq!(unit_price(Money::from_minor(10_000), pct(10)).minor(), 9_000);
    }

    #[test]
    fn test_no_discount_and_full_discount() {
        assert_eq!(unit_price(Money::from_minor(1_999), pct(0)).minor(), 1_999);
        assert_eq!(unit_price(Money::from_minor(1_999), pct(100)).minor(), 0);
    }

    #[test]
    fn test_rounds_half_to_even() {
        // 5 * 0.9 = 4.5 -> 4 (even)
        assert_eq!(unit_price(Money::from_minor(5), pct(10)).minor(), 4);
        // 15 * 0.9 = 13.5 -> 14 (even)
        assert_eq!(unit_price(Money::from_minor(15), pct(10)).minor(), 14);
        // 7 * 0.5 = 3.5 -> 4
        assert_eq!(unit_price(Money::from_minor(7), pct(50)).minor(), 4);
        // 9 * 0.5 = 4.5 -> 4
        assert_eq!(unit_price(Money::from_minor(9), pct(50)).minor(), 4);
    }

    #[test]
    fn test_rounds_non_halves_to_nearest() {
        // 333 * 0.67 = 223.11 -> 223
        assert_eq!(unit_price(Money::from_minor(333), pct(33)).minor(), 223);
        // 999 * 0.85 = 849.15 -> 849
        assert_eq!(unit_price(Money::from_minor(999), pct(15)).minor(), 849);
        // 1001 * 0.75 = 750.75 -> 751
        assert_eq!(unit_price(Money::from_minor(1_001), pct(25)).minor(), 751);
    }

    #[test]
    fn test_pricing_is_deterministic() {
        let base = Money::from_minor(123_457);
        let first = unit_price(base, pct(17));
        for _ in 0..10 {
            assert_eq!(unit_price(base, pct(17)), first);
        }
    }

    #[test]
    fn test_totals_identity() {
        let engine = PricingEngine::default();
        let lines = vec![
            engine.price_line(
                &product(1, 10_000, 10),
                OrderLine::new(ProductId::new(1), "M", "red", 3),
            ),
            engine.price_line(
                &product(2, 2_550, 0),
                OrderLine::new(ProductId::new(2), "40", "black", 2),
            ),
        ];

        let totals = engine.totals(&lines).unwrap();
        assert_eq!(totals.subtotal.minor(), 27_000 + 5_100);
        assert_eq!(totals.shipping_fee, SHIPPING_FEE);
        assert!(totals.discount_amount.is_zero());
        assert_eq!(
            totals.total,
            totals.subtotal + totals.shipping_fee - totals.discount_amount
        );
        assert_eq!(
            totals.subtotal,
            lines
                .iter()
                .map(|l| l.unit_price.multiply(l.line.quantity))
                .sum::<Money>()
        );
    }

    #[test]
    fn test_totals_overflow_is_rejected() {
        let engine = PricingEngine::default();
        let line = engine.price_line(
            &product(7, 3_000_000_000, 0),
            OrderLine::new(ProductId::new(7), "M", "red", 4_000_000_000),
        );
        assert!(line.line_total().is_none());

        let err = engine.totals(&[line]).unwrap_err();
        assert!(matches!(err, DomainError::AmountOverflow(_)));

        // Each line fits but the subtotal does not.
        let big = engine.price_line(
            &product(8, i64::MAX / 2, 0),
            OrderLine::new(ProductId::new(8), "M", "red", 1),
        );
        let err = engine.totals(&[big.clone(), big.clone(), big]).unwrap_err();
        assert!(matches!(err, DomainError::AmountOverflow(_)));
    }

    #[test]
    fn test_shipping_fee_overflow_is_rejected() {
        let engine = PricingEngine::default();
        let line = engine.price_line(
            &product(9, i64::MAX - 1, 0),
            OrderLine::new(ProductId::new(9), "M", "red", 1),
        );
        assert!(matches!(
            engine.totals(&[line]),
            Err(DomainError::AmountOverflow(_))
        ));
    }

    #[test]
    fn test_custom_shipping_fee() {
        let engine = PricingEngine::new(Money::from_minor(500));
        let totals = engine.totals(&[]).unwrap();
        assert!(totals.subtotal.is_zero());
        assert_eq!(totals.total.minor(), 500);
    }
}
