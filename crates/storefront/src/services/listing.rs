//! Per-viewer product visibility.
//!
//! The catalog query joins each product to its active claim; this module
//! decides what a given viewer may see. A claimed product is visible only
//! to the customer holding the claim, so the first customer to add a piece
//! to their cart locks it for everyone else.

use curio_core::{CustomerId, Price};

use crate::models::{ListedProduct, Product};

/// A product as shown to a specific viewer.
#[derive(Debug, Clone)]
pub struct VisibleProduct {
    pub product: Product,
    /// The viewer holds an unpaid reservation on this product.
    pub in_cart: bool,
    /// The viewer already purchased this product.
    pub purchased: bool,
}

/// Filter the joined catalog rows down to what `viewer` may see.
///
/// Anonymous viewers see only unclaimed products. An authenticated viewer
/// additionally sees products they claimed themselves: unpaid holds are
/// flagged `in_cart`, completed purchases `purchased`. Products claimed by
/// anyone else are dropped. Row order is preserved.
#[must_use]
pub fn visible_products(
    viewer: Option<CustomerId>,
    rows: Vec<ListedProduct>,
) -> Vec<VisibleProduct> {
    rows.into_iter()
        .filter_map(|row| match row.claim {
            None => Some(VisibleProduct {
                product: row.product,
                in_cart: false,
                purchased: false,
            }),
            Some(claim) if viewer == Some(claim.customer_id) => Some(VisibleProduct {
                product: row.product,
                in_cart: !claim.paid,
                purchased: claim.paid,
            }),
            Some(_) => None,
        })
        .collect()
}

/// Sum of the cart's product prices. Empty cart totals zero.
#[must_use]
pub fn cart_total(products: &[Product]) -> Price {
    products.iter().map(|p| p.price).sum()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use curio_core::ProductId;
    use rust_decimal::Decimal;

    use super::*;
    use crate::models::Claim;

    fn product(id: i32, pence: i64) -> Product {
        Product {
            id: ProductId::new(id),
            title: format!("Piece {id}"),
            description: "A one-of-a-kind piece".to_owned(),
            price: Price::new(Decimal::new(pence, 2)).unwrap(),
            image_url: format!("https://img.example/{id}.jpg"),
            created_at: Utc::now(),
        }
    }

    fn listed(id: i32, pence: i64, claim: Option<Claim>) -> ListedProduct {
        ListedProduct {
            product: product(id, pence),
            claim,
        }
    }

    fn claim(customer: i32, paid: bool) -> Option<Claim> {
        Some(Claim {
            customer_id: CustomerId::new(customer),
            paid,
        })
    }

    #[test]
    fn test_anonymous_never_sees_claimed_products() {
        let rows = vec![
            listed(1, 999, None),
            listed(2, 500, claim(7, false)),
            listed(3, 350, claim(7, true)),
        ];

        let visible = visible_products(None, rows);
        let ids: Vec<i32> = visible.iter().map(|v| v.product.id.as_i32()).collect();
        assert_eq!(ids, vec![1]);
    }

    #[test]
    fn test_viewer_keeps_own_claims_but_not_others() {
        let alice = CustomerId::new(1);
        let rows = vec![
            listed(1, 999, claim(1, false)),
            listed(2, 500, claim(2, false)),
            listed(3, 350, None),
            listed(4, 1200, claim(1, true)),
        ];

        let visible = visible_products(Some(alice), rows);
        let ids: Vec<i32> = visible.iter().map(|v| v.product.id.as_i32()).collect();
        assert_eq!(ids, vec![1, 3, 4]);

        assert!(visible[0].in_cart);
        assert!(!visible[0].purchased);
        assert!(!visible[1].in_cart);
        assert!(visible[2].purchased);
        assert!(!visible[2].in_cart);
    }

    #[test]
    fn test_reserved_product_flagged_in_cart_for_holder() {
        // Customer A reserves P1 (9.99): A sees it in-cart, B does not see it.
        let rows = vec![listed(1, 999, claim(1, false))];

        let for_a = visible_products(Some(CustomerId::new(1)), rows.clone());
        assert_eq!(for_a.len(), 1);
        assert!(for_a[0].in_cart);

        let for_b = visible_products(Some(CustomerId::new(2)), rows);
        assert!(for_b.is_empty());
    }

    #[test]
    fn test_row_order_preserved() {
        let rows = vec![listed(3, 100, None), listed(1, 100, None), listed(2, 100, None)];
        let visible = visible_products(None, rows);
        let ids: Vec<i32> = visible.iter().map(|v| v.product.id.as_i32()).collect();
        assert_eq!(ids, vec![3, 1, 2]);
    }

    #[test]
    fn test_cart_total_sums_prices() {
        let cart = vec![product(1, 500), product(2, 350)];
        assert_eq!(cart_total(&cart).minor_units(), 850);
    }

    #[test]
    fn test_empty_cart_totals_zero() {
        assert_eq!(cart_total(&[]), Price::zero());
    }
}
