//! Offline catalog commands. These never touch the storefront.

use std::path::Path;

use anyhow::Context;
use tiercart_core::VariantTable;

fn load(catalog_path: &Path) -> anyhow::Result<VariantTable> {
    tiercart_core::load_catalog(catalog_path)
        .with_context(|| format!("failed to load catalog {}", catalog_path.display()))
}

/// Prints the tier `volume` earns.
///
/// # Errors
///
/// Returns an error if the catalog cannot be loaded.
pub(crate) fn run_tier(catalog_path: &Path, volume: u32) -> anyhow::Result<()> {
    let table = load(catalog_path)?;
    let tier = table.policy().tier_for(volume);
    let min_volume = table.policy().min_volume(tier).unwrap_or_default();
    println!("volume {volume} -> {tier} (from {min_volume})");
    Ok(())
}

/// Validates the catalog and prints a summary.
///
/// # Errors
///
/// Returns an error if the catalog cannot be loaded or does not validate.
pub(crate) fn run_catalog(catalog_path: &Path) -> anyhow::Result<()> {
    let table = load(catalog_path)?;
    print!("{}", summarize(&table));
    Ok(())
}

pub(crate) fn summarize(table: &VariantTable) -> String {
    let mut out = String::from("tiers:\n");
    for tier in table.policy().tiers() {
        let min_volume = table.policy().min_volume(tier).unwrap_or_default();
        out.push_str(&format!("  {tier}: >= {min_volume}\n"));
    }
    out.push_str(&format!(
        "products: {}\nvariants: {}\n",
        table.product_count(),
        table.len()
    ));
    out
}
