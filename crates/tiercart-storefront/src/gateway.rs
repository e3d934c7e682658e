//! The Remote Cart Gateway contract.
//!
//! Every operation returns the full resulting [`Cart`]. An unknown or expired
//! cart id surfaces as [`GatewayError::NotFound`], distinct from transport
//! and backend failures. Implementations never retry.

use std::future::Future;

use tiercart_core::Cart;

use crate::error::GatewayError;

/// A line to add to a cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartLineInput {
    pub variant_id: String,
    pub quantity: u32,
    pub selling_plan_id: Option<String>,
}

impl CartLineInput {
    #[must_use]
    pub fn new(variant_id: impl Into<String>, quantity: u32) -> Self {
        Self {
            variant_id: variant_id.into(),
            quantity,
            selling_plan_id: None,
        }
    }

    #[must_use]
    pub fn with_selling_plan(mut self, selling_plan_id: Option<String>) -> Self {
        self.selling_plan_id = selling_plan_id;
        self
    }
}

/// A change to an existing line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartLineUpdate {
    Quantity {
        line_id: String,
        quantity: u32,
    },
    /// Replace the line's variant. `selling_plan_id: None` makes the line a
    /// one-time purchase.
    Merchandise {
        line_id: String,
        variant_id: String,
        selling_plan_id: Option<String>,
    },
}

impl CartLineUpdate {
    #[must_use]
    pub fn line_id(&self) -> &str {
        match self {
            CartLineUpdate::Quantity { line_id, .. }
            | CartLineUpdate::Merchandise { line_id, .. } => line_id,
        }
    }
}

pub trait CartGateway {
    /// Creates a cart, optionally seeded with one line.
    fn create_cart(
        &self,
        line: Option<CartLineInput>,
    ) -> impl Future<Output = Result<Cart, GatewayError>> + Send;

    fn add_line(
        &self,
        cart_id: &str,
        line: CartLineInput,
    ) -> impl Future<Output = Result<Cart, GatewayError>> + Send;

    /// Applies all updates in one backend call.
    fn update_lines(
        &self,
        cart_id: &str,
        updates: &[CartLineUpdate],
    ) -> impl Future<Output = Result<Cart, GatewayError>> + Send;

    fn remove_lines(
        &self,
        cart_id: &str,
        line_ids: &[String],
    ) -> impl Future<Output = Result<Cart, GatewayError>> + Send;

    fn get_cart(&self, cart_id: &str) -> impl Future<Output = Result<Cart, GatewayError>> + Send;
}
