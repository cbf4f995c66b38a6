//! Order pricing.

use crate::error::{CoreError, Result};
use crate::id::ProductId;
use crate::money::Money;

/// A checkout line priced from the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricedLine {
    pub product_id: ProductId,
    pub quantity: i32,
    pub unit_price: Money,
}

/// Sum of `unit_price * quantity` over all lines.
pub fn order_total(lines: &[PricedLine]) -> Result<Money> {
    lines.iter().try_fold(Money::ZERO, |total, line| {
        line.unit_price
            .checked_mul(line.quantity)
            .and_then(|subtotal| total.checked_add(subtotal))
            .ok_or(CoreError::AmountOverflow("order total"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(product_id: ProductId, quantity: i32, price: &str) -> PricedLine {
        PricedLine {
            product_id,
            quantity,
            unit_price: price.parse().unwrap(),
        }
    }

    #[test]
    fn totals_price_times_quantity() {
        let total = order_total(&[line(1, 2, "799"), line(2, 1, "129.50")]).unwrap();
        assert_eq!(total.to_string(), "1727.50");
    }

    #[test]
    fn empty_order_totals_zero() {
        assert_eq!(order_total(&[]).unwrap(), Money::ZERO);
    }

    #[test]
    fn overflow_is_reported() {
        let lines = [PricedLine {
            product_id: 1,
            quantity: i32::MAX,
            unit_price: Money::MAX,
        }];
        assert!(matches!(
            order_total(&lines),
            Err(CoreError::AmountOverflow(_))
        ));
    }
}
