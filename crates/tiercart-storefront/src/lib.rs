//! Remote Cart Gateway for tiercart.
//!
//! [`CartGateway`] is the contract the cart store drives; [`StorefrontClient`]
//! implements it against the Shopify Storefront GraphQL API.

pub mod client;
pub mod error;
pub mod gateway;
mod queries;
mod types;

pub use client::{extract_store_origin, StorefrontClient};
pub use error::GatewayError;
pub use gateway::{CartGateway, CartLineInput, CartLineUpdate};
