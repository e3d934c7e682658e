//! Storefront GraphQL wire types and their conversion into [`tiercart_core::Cart`].
//!
//! ## Observed response shapes
//!
//! ### Money
//! `MoneyV2.amount` is a decimal **string** (`"34.99"`), never a float.
//!
//! ### Missing carts
//! `cart(id:)` returns `null` for an unknown or expired id. Mutations on
//! such an id return `cart: null` with a user error on field `["cartId"]`,
//! e.g. `"The specified cart does not exist."`.
//!
//! ### Merchandise
//! `merchandise` is a union that today only has `ProductVariant`. Any other
//! `__typename` is tolerated and the line is skipped with a warning.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use tiercart_core::{
    Cart, CartCost, CartLine, Merchandise, Money, PriceAdjustment, ProductRef,
    SellingPlanAllocation,
};

use crate::error::GatewayError;
use crate::gateway::{CartLineInput, CartLineUpdate};

// ---------------------------------------------------------------------------
// Request side
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub(crate) struct GraphqlRequest<'a, V: Serialize> {
    pub query: &'a str,
    pub variables: V,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireLineInput<'a> {
    pub merchandise_id: &'a str,
    pub quantity: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selling_plan_id: Option<&'a str>,
}

impl<'a> From<&'a CartLineInput> for WireLineInput<'a> {
    fn from(line: &'a CartLineInput) -> Self {
        Self {
            merchandise_id: &line.variant_id,
            quantity: line.quantity,
            selling_plan_id: line.selling_plan_id.as_deref(),
        }
    }
}

/// `CartLineUpdateInput`. A variant swap always sends `sellingPlanId`,
/// as `null` for one-time lines, so no stale plan survives the swap.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub(crate) enum WireLineUpdate<'a> {
    Quantity {
        id: &'a str,
        quantity: u32,
    },
    Merchandise {
        id: &'a str,
        #[serde(rename = "merchandiseId")]
        merchandise_id: &'a str,
        #[serde(rename = "sellingPlanId")]
        selling_plan_id: Option<&'a str>,
    },
}

impl<'a> From<&'a CartLineUpdate> for WireLineUpdate<'a> {
    fn from(update: &'a CartLineUpdate) -> Self {
        match update {
            CartLineUpdate::Quantity { line_id, quantity } => WireLineUpdate::Quantity {
                id: line_id,
                quantity: *quantity,
            },
            CartLineUpdate::Merchandise {
                line_id,
                variant_id,
                selling_plan_id,
            } => WireLineUpdate::Merchandise {
                id: line_id,
                merchandise_id: variant_id,
                selling_plan_id: selling_plan_id.as_deref(),
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Response side
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(crate) struct GraphqlResponse<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub errors: Vec<GraphqlErrorMessage>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GraphqlErrorMessage {
    pub message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CartCreateData {
    pub cart_create: CartMutationPayload,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CartLinesAddData {
    pub cart_lines_add: CartMutationPayload,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CartLinesUpdateData {
    pub cart_lines_update: CartMutationPayload,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CartLinesRemoveData {
    pub cart_lines_remove: CartMutationPayload,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CartQueryData {
    pub cart: Option<WireCart>,
}

/// Shared payload shape of every cart mutation.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CartMutationPayload {
    pub cart: Option<WireCart>,
    #[serde(default)]
    pub user_errors: Vec<CartUserError>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CartUserError {
    #[serde(default)]
    pub field: Option<Vec<String>>,
    pub message: String,
    #[serde(default)]
    pub code: Option<String>,
}

impl CartUserError {
    /// Whether this error reports that the referenced cart does not exist.
    fn is_missing_cart(&self) -> bool {
        let on_cart_id = self
            .field
            .as_ref()
            .is_some_and(|f| f.iter().any(|segment| segment == "cartId"));
        let message = self.message.to_lowercase();
        on_cart_id || (message.contains("cart") && message.contains("does not exist"))
    }
}

impl CartMutationPayload {
    /// Resolves a mutation payload into the resulting cart.
    ///
    /// # Errors
    ///
    /// - [`GatewayError::NotFound`] when a user error reports a missing cart.
    /// - [`GatewayError::UserErrors`] for any other rejection.
    /// - [`GatewayError::MissingCart`] when the payload carries neither.
    pub(crate) fn into_cart(
        self,
        operation: &'static str,
        cart_id: Option<&str>,
    ) -> Result<Cart, GatewayError> {
        if !self.user_errors.is_empty() {
            if let Some(cart_id) = cart_id {
                if self.user_errors.iter().any(CartUserError::is_missing_cart) {
                    return Err(GatewayError::NotFound {
                        cart_id: cart_id.to_owned(),
                    });
                }
            }
            let messages = self
                .user_errors
                .iter()
                .map(|e| match &e.code {
                    Some(code) => format!("{} ({code})", e.message),
                    None => e.message.clone(),
                })
                .collect::<Vec<_>>()
                .join("; ");
            tracing::warn!(operation, %messages, "storefront rejected cart mutation");
            return Err(GatewayError::UserErrors {
                operation,
                messages,
            });
        }

        self.cart
            .map(WireCart::into_cart)
            .ok_or(GatewayError::MissingCart { operation })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireCart {
    pub id: String,
    pub checkout_url: String,
    pub total_quantity: u32,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    pub cost: WireCartCost,
    pub lines: Connection<WireCartLine>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireCartCost {
    pub subtotal_amount: WireMoney,
    pub total_amount: WireMoney,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Connection<T> {
    pub nodes: Vec<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireMoney {
    pub amount: Decimal,
    pub currency_code: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireCartLine {
    pub id: String,
    pub quantity: u32,
    pub cost: WireLineCost,
    pub merchandise: WireMerchandise,
    #[serde(default)]
    pub selling_plan_allocation: Option<WireSellingPlanAllocation>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireLineCost {
    pub total_amount: WireMoney,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "__typename")]
pub(crate) enum WireMerchandise {
    ProductVariant(WireVariant),
    #[serde(other)]
    Unsupported,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireVariant {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub sku: Option<String>,
    pub price: WireMoney,
    #[serde(default)]
    pub compare_at_price: Option<WireMoney>,
    #[serde(default)]
    pub image: Option<WireImage>,
    pub product: WireProduct,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireProduct {
    pub id: String,
    pub handle: String,
    pub title: String,
    #[serde(default)]
    pub featured_image: Option<WireImage>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireImage {
    pub url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireSellingPlanAllocation {
    pub selling_plan: WireSellingPlan,
    #[serde(default)]
    pub price_adjustments: Vec<WirePriceAdjustment>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireSellingPlan {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WirePriceAdjustment {
    pub price: WireMoney,
    #[serde(default)]
    pub compare_at_price: Option<WireMoney>,
    #[serde(default)]
    pub per_delivery_price: Option<WireMoney>,
}

impl From<WireMoney> for Money {
    fn from(m: WireMoney) -> Self {
        Money::new(m.amount, m.currency_code)
    }
}

impl WireCart {
    /// Units the backend counts but the fetched line page does not carry.
    /// Non-zero when the cart has more lines than one page returns.
    pub(crate) fn unlisted_quantity(&self) -> u32 {
        let listed: u32 = self.lines.nodes.iter().map(|l| l.quantity).sum();
        self.total_quantity.saturating_sub(listed)
    }

    pub(crate) fn into_cart(self) -> Cart {
        let unlisted = self.unlisted_quantity();
        if unlisted > 0 {
            tracing::warn!(
                cart_id = %self.id,
                total_quantity = self.total_quantity,
                unlisted,
                "cart lines truncated; tier volume will be undercounted"
            );
        }
        let cart_id = self.id;
        let lines = self
            .lines
            .nodes
            .into_iter()
            .filter_map(|line| convert_line(line, &cart_id))
            .collect();

        Cart {
            id: cart_id,
            checkout_url: self.checkout_url,
            total_quantity: self.total_quantity,
            cost: CartCost {
                subtotal: self.cost.subtotal_amount.into(),
                total: self.cost.total_amount.into(),
            },
            lines,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

fn convert_line(line: WireCartLine, cart_id: &str) -> Option<CartLine> {
    let WireMerchandise::ProductVariant(variant) = line.merchandise else {
        tracing::warn!(
            cart_id,
            line_id = %line.id,
            "skipping cart line whose merchandise is not a product variant"
        );
        return None;
    };

    // Prefer the variant image; fall back to the product's featured image.
    let image_url = variant
        .image
        .or(variant.product.featured_image)
        .map(|i| i.url);

    Some(CartLine {
        id: line.id,
        quantity: line.quantity,
        cost: line.cost.total_amount.into(),
        merchandise: Merchandise {
            variant_id: variant.id,
            title: variant.title,
            sku: variant.sku.filter(|s| !s.is_empty()),
            product: ProductRef {
                id: variant.product.id,
                handle: variant.product.handle,
                title: variant.product.title,
                image_url,
            },
            price: variant.price.into(),
            compare_at_price: variant.compare_at_price.map(Into::into),
        },
        selling_plan_allocation: line
            .selling_plan_allocation
            .map(|a| SellingPlanAllocation {
                selling_plan_id: a.selling_plan.id,
                selling_plan_name: a.selling_plan.name,
                price_adjustments: a
                    .price_adjustments
                    .into_iter()
                    .map(|p| PriceAdjustment {
                        price: p.price.into(),
                        compare_at_price: p.compare_at_price.map(Into::into),
                        per_delivery_price: p.per_delivery_price.map(Into::into),
                    })
                    .collect(),
            }),
    })
}

#[cfg(test)]
#[path = "types_test.rs"]
mod tests;
