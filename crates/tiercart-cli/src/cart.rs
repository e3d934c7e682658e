//! Cart command handlers.

use std::path::Path;

use anyhow::Context;
use tiercart_cart::{CartState, CartStore, FileCartRef, MutationOutcome, TracingAnalytics};
use tiercart_core::{AppConfig, Cart, ConfigError};
use tiercart_storefront::StorefrontClient;

pub(crate) type CliStore = CartStore<StorefrontClient, FileCartRef, TracingAnalytics>;

/// Builds the store from loaded configuration and the catalog at `catalog_path`.
///
/// # Errors
///
/// Returns an error if configuration is missing or invalid, the catalog does
/// not validate, or the HTTP client cannot be built.
pub(crate) fn build_store(
    config: Result<AppConfig, ConfigError>,
    catalog_path: &Path,
) -> anyhow::Result<CliStore> {
    let config = config.context("failed to load configuration")?;
    tracing::debug!(env = %config.env, store_url = %config.store_url, "configuration loaded");

    let table = tiercart_core::load_catalog(catalog_path)
        .with_context(|| format!("failed to load catalog {}", catalog_path.display()))?;
    let gateway =
        StorefrontClient::from_config(&config).context("failed to build storefront client")?;
    let cart_ref = FileCartRef::new(&config.cart_ref_path);

    Ok(CartStore::new(gateway, table, cart_ref, TracingAnalytics))
}

/// Prints the outcome of a mutation and the resulting state.
///
/// # Errors
///
/// Returns the primary failure so the process exits non-zero.
pub(crate) fn report(state: &CartState, outcome: MutationOutcome, json: bool) -> anyhow::Result<()> {
    match outcome {
        MutationOutcome::Ok { tier_change, .. } => {
            if let Some(tier) = tier_change {
                println!("tier changed to {tier}");
            }
            print_state(state, json)
        }
        MutationOutcome::OkWithWarning { reason, .. } => {
            println!("warning: {reason}");
            print_state(state, json)
        }
        MutationOutcome::PrimaryFailed(e) => Err(anyhow::Error::new(e).context("cart update failed")),
    }
}

/// # Errors
///
/// Returns an error if the state cannot be serialized as JSON.
pub(crate) fn print_state(state: &CartState, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(state)?);
        return Ok(());
    }

    match &state.cart {
        Some(cart) => print!("{}", render_cart(cart)),
        None => println!("cart is empty"),
    }
    if let Some(notice) = &state.normalization_notice {
        println!("notice: {notice}");
    }
    if let Some(error) = &state.error {
        println!("error: {error}");
    }
    Ok(())
}

pub(crate) fn render_cart(cart: &Cart) -> String {
    let mut out = format!("cart {}\n", cart.id);
    for line in &cart.lines {
        let plan = line
            .selling_plan_allocation
            .as_ref()
            .map(|a| format!(" [{}]", a.selling_plan_name))
            .unwrap_or_default();
        out.push_str(&format!(
            "  {:>3} x {} ({}){plan}  {}  line={}\n",
            line.quantity,
            line.merchandise.product.title,
            line.merchandise.title,
            line.cost,
            line.id,
        ));
    }
    out.push_str(&format!(
        "items: {}  subtotal: {}  total: {}\ncheckout: {}\n",
        cart.total_quantity, cart.cost.subtotal, cart.cost.total, cart.checkout_url
    ));
    out
}
