//! [`CartGateway`] implementation over the Storefront GraphQL API.

use serde_json::json;

use tiercart_core::Cart;

use super::StorefrontClient;
use crate::error::GatewayError;
use crate::gateway::{CartGateway, CartLineInput, CartLineUpdate};
use crate::queries;
use crate::types::{
    CartCreateData, CartLinesAddData, CartLinesRemoveData, CartLinesUpdateData, CartQueryData,
    WireLineInput, WireLineUpdate,
};

impl CartGateway for StorefrontClient {
    async fn create_cart(&self, line: Option<CartLineInput>) -> Result<Cart, GatewayError> {
        let lines: Vec<WireLineInput<'_>> = line.iter().map(WireLineInput::from).collect();
        let variables = json!({ "input": { "lines": lines } });

        let data: CartCreateData = self
            .execute("cartCreate", queries::CART_CREATE, variables, None)
            .await?;
        let cart = data.cart_create.into_cart("cartCreate", None)?;
        tracing::info!(cart_id = %cart.id, lines = cart.lines.len(), "cart created");
        Ok(cart)
    }

    async fn add_line(&self, cart_id: &str, line: CartLineInput) -> Result<Cart, GatewayError> {
        let variables = json!({
            "cartId": cart_id,
            "lines": [WireLineInput::from(&line)],
        });

        let data: CartLinesAddData = self
            .execute("cartLinesAdd", queries::CART_LINES_ADD, variables, Some(cart_id))
            .await?;
        data.cart_lines_add.into_cart("cartLinesAdd", Some(cart_id))
    }

    async fn update_lines(
        &self,
        cart_id: &str,
        updates: &[CartLineUpdate],
    ) -> Result<Cart, GatewayError> {
        let lines: Vec<WireLineUpdate<'_>> = updates.iter().map(WireLineUpdate::from).collect();
        let variables = json!({ "cartId": cart_id, "lines": lines });

        let data: CartLinesUpdateData = self
            .execute(
                "cartLinesUpdate",
                queries::CART_LINES_UPDATE,
                variables,
                Some(cart_id),
            )
            .await?;
        data.cart_lines_update
            .into_cart("cartLinesUpdate", Some(cart_id))
    }

    async fn remove_lines(&self, cart_id: &str, line_ids: &[String]) -> Result<Cart, GatewayError> {
        let variables = json!({ "cartId": cart_id, "lineIds": line_ids });

        let data: CartLinesRemoveData = self
            .execute(
                "cartLinesRemove",
                queries::CART_LINES_REMOVE,
                variables,
                Some(cart_id),
            )
            .await?;
        data.cart_lines_remove
            .into_cart("cartLinesRemove", Some(cart_id))
    }

    async fn get_cart(&self, cart_id: &str) -> Result<Cart, GatewayError> {
        let data: CartQueryData = self
            .execute(
                "cart",
                queries::CART_QUERY,
                json!({ "cartId": cart_id }),
                Some(cart_id),
            )
            .await?;
        data.cart
            .map(crate::types::WireCart::into_cart)
            .ok_or_else(|| GatewayError::NotFound {
                cart_id: cart_id.to_owned(),
            })
    }
}
