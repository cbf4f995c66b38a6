//! Cart quantity merging.
//!
//! A cart holds at most one row per product. Adding a product that is
//! already present bumps the existing row, and reconciling a guest cart
//! with a stored cart is the same operation applied to a whole list.

use crate::id::ProductId;

/// Merge `incoming` into `existing`, summing quantities per product.
///
/// Products keep the position of their first appearance. Entries with a
/// non-positive quantity are dropped, and sums saturate at `i32::MAX`.
pub fn merge_quantities(
    existing: &[(ProductId, i32)],
    incoming: &[(ProductId, i32)],
) -> Vec<(ProductId, i32)> {
    let mut merged: Vec<(ProductId, i32)> = Vec::with_capacity(existing.len() + incoming.len());
    for &(product_id, quantity) in existing.iter().chain(incoming) {
        if quantity <= 0 {
            continue;
        }
        match merged.iter_mut().find(|(id, _)| *id == product_id) {
            Some((_, total)) => *total = total.saturating_add(quantity),
            None => merged.push((product_id, quantity)),
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sums_quantities_of_shared_products() {
        let merged = merge_quantities(&[(1, 2), (3, 1)], &[(3, 4), (5, 1)]);
        assert_eq!(merged, vec![(1, 2), (3, 5), (5, 1)]);
    }

    #[test]
    fn collapses_duplicates_within_one_side() {
        let merged = merge_quantities(&[], &[(2, 1), (2, 1), (2, 3)]);
        assert_eq!(merged, vec![(2, 5)]);
    }

    #[test]
    fn drops_non_positive_quantities() {
        let merged = merge_quantities(&[(1, 1)], &[(1, 0), (2, -3)]);
        assert_eq!(merged, vec![(1, 1)]);
    }

    #[test]
    fn saturates_instead_of_overflowing() {
        let merged = merge_quantities(&[(1, i32::MAX)], &[(1, 10)]);
        assert_eq!(merged, vec![(1, i32::MAX)]);
    }
}
