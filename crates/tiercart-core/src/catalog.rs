//! Variant Resolution Table: the static mapping between
//! `(family, product, tier)` and purchasable variants.
//!
//! The table is loaded from a YAML catalog file and validated once at
//! startup. Validation fails loudly on duplicate or missing entries unless
//! the catalog explicitly opts into partial tier coverage.

use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::tier::{Tier, TierPolicy, TierThreshold};
use crate::ConfigError;

/// The purchasable identity for one `(family, product, tier)` slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantTarget {
    pub variant_id: String,
    /// Subscription plan to attach when the line being swapped is a
    /// subscription. One-time lines never receive a plan.
    #[serde(default)]
    pub selling_plan_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductConfig {
    pub id: String,
    /// Keyed by tier name.
    pub tiers: BTreeMap<String, VariantTarget>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FamilyConfig {
    pub name: String,
    /// Volume contributed by one purchased unit. Bundles that pack two base
    /// units into one purchasable unit use 2.
    #[serde(default = "default_volume_units")]
    pub volume_units: u32,
    pub products: Vec<ProductConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogFile {
    /// Tier thresholds, lowest first.
    pub tiers: Vec<TierThreshold>,
    /// When `true`, products may omit targets for some tiers. Each gap is
    /// logged at build time and those lines are left alone at run time.
    #[serde(default)]
    pub allow_partial_tiers: bool,
    pub families: Vec<FamilyConfig>,
}

fn default_volume_units() -> u32 {
    1
}

/// Reverse-table entry for an eligible variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantEntry {
    pub family: String,
    pub product_id: String,
    /// Lowest tier whose target is this variant.
    pub tier: Tier,
    pub volume_units: u32,
}

/// Forward and reverse variant lookups plus the tier policy they are keyed by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantTable {
    policy: TierPolicy,
    /// family → product → targets indexed by tier rank.
    forward: HashMap<String, HashMap<String, Vec<Option<VariantTarget>>>>,
    reverse: HashMap<String, VariantEntry>,
}

impl VariantTable {
    /// Validates `catalog` and builds both lookup directions.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] when the tier policy is invalid, a
    /// family or product is misconfigured, a tier key is unknown, a variant
    /// id is reused by a different product, or a tier target is missing and
    /// `allow_partial_tiers` is off.
    pub fn build(catalog: &CatalogFile) -> Result<Self, ConfigError> {
        let policy = TierPolicy::new(catalog.tiers.clone())?;
        let tier_count = policy.tiers().count();

        let mut forward: HashMap<String, HashMap<String, Vec<Option<VariantTarget>>>> =
            HashMap::new();
        let mut reverse: HashMap<String, VariantEntry> = HashMap::new();
        let mut seen_families = HashSet::new();

        for family in &catalog.families {
            if family.name.trim().is_empty() {
                return Err(ConfigError::Validation(
                    "family name must be non-empty".to_string(),
                ));
            }
            if !seen_families.insert(family.name.to_lowercase()) {
                return Err(ConfigError::Validation(format!(
                    "duplicate family name: '{}'",
                    family.name
                )));
            }
            if family.volume_units == 0 {
                return Err(ConfigError::Validation(format!(
                    "family '{}' has volume_units 0; must be at least 1",
                    family.name
                )));
            }

            let products = forward.entry(family.name.clone()).or_default();

            for product in &family.products {
                if product.id.trim().is_empty() {
                    return Err(ConfigError::Validation(format!(
                        "family '{}' has a product with an empty id",
                        family.name
                    )));
                }
                if products.contains_key(&product.id) {
                    return Err(ConfigError::Validation(format!(
                        "duplicate product '{}' in family '{}'",
                        product.id, family.name
                    )));
                }
                if product.tiers.is_empty() {
                    return Err(ConfigError::Validation(format!(
                        "product '{}' in family '{}' has no tier targets",
                        product.id, family.name
                    )));
                }

                let mut slots: Vec<Option<VariantTarget>> = vec![None; tier_count];
                for (tier_name, target) in &product.tiers {
                    let tier = policy.get(tier_name).ok_or_else(|| {
                        ConfigError::Validation(format!(
                            "product '{}' in family '{}' references unknown tier '{tier_name}'",
                            product.id, family.name
                        ))
                    })?;
                    if target.variant_id.trim().is_empty() {
                        return Err(ConfigError::Validation(format!(
                            "product '{}' tier '{tier_name}' has an empty variant_id",
                            product.id
                        )));
                    }
                    if slots[tier.rank].replace(target.clone()).is_some() {
                        return Err(ConfigError::Validation(format!(
                            "product '{}' lists tier '{}' more than once",
                            product.id, tier.name
                        )));
                    }
                }

                for (tier, slot) in policy.tiers().zip(&slots) {
                    let Some(target) = slot else {
                        if !catalog.allow_partial_tiers {
                            return Err(ConfigError::Validation(format!(
                                "product '{}' in family '{}' is missing a target for tier '{}'",
                                product.id, family.name, tier.name
                            )));
                        }
                        tracing::warn!(
                            family = %family.name,
                            product = %product.id,
                            tier = %tier.name,
                            "catalog gap: lines of this product will not be normalized at this tier"
                        );
                        continue;
                    };

                    match reverse.entry(target.variant_id.clone()) {
                        Entry::Vacant(slot) => {
                            slot.insert(VariantEntry {
                                family: family.name.clone(),
                                product_id: product.id.clone(),
                                tier: tier.clone(),
                                volume_units: family.volume_units,
                            });
                        }
                        Entry::Occupied(existing) => {
                            let existing = existing.get();
                            // The same variant may back several tiers of one
                            // product (plans differ); never two products.
                            if existing.family != family.name || existing.product_id != product.id
                            {
                                return Err(ConfigError::Validation(format!(
                                    "variant '{}' is mapped by both {}/{} and {}/{}",
                                    target.variant_id,
                                    existing.family,
                                    existing.product_id,
                                    family.name,
                                    product.id
                                )));
                            }
                        }
                    }
                }

                products.insert(product.id.clone(), slots);
            }
        }

        Ok(Self {
            policy,
            forward,
            reverse,
        })
    }

    #[must_use]
    pub fn policy(&self) -> &TierPolicy {
        &self.policy
    }

    /// Reverse lookup. `None` means the variant is a retail variant.
    #[must_use]
    pub fn resolve(&self, variant_id: &str) -> Option<&VariantEntry> {
        self.reverse.get(variant_id)
    }

    /// Forward lookup. `None` is a configuration gap.
    #[must_use]
    pub fn target(&self, family: &str, product_id: &str, tier: &Tier) -> Option<&VariantTarget> {
        self.forward
            .get(family)?
            .get(product_id)?
            .get(tier.rank)?
            .as_ref()
    }

    /// Number of distinct eligible variants.
    #[must_use]
    pub fn len(&self) -> usize {
        self.reverse.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.reverse.is_empty()
    }

    /// Number of configured `(family, product)` pairs.
    #[must_use]
    pub fn product_count(&self) -> usize {
        self.forward.values().map(HashMap::len).sum()
    }
}

/// Parse catalog YAML without validating it.
///
/// # Errors
///
/// Returns [`ConfigError::CatalogFileParse`] if the YAML does not match
/// [`CatalogFile`].
pub fn parse_catalog(content: &str) -> Result<CatalogFile, ConfigError> {
    serde_yaml::from_str(content).map_err(ConfigError::CatalogFileParse)
}

/// Load the catalog file and build the validated [`VariantTable`].
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_catalog(path: &Path) -> Result<VariantTable, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::CatalogFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let catalog = parse_catalog(&content)?;
    VariantTable::build(&catalog)
}

#[cfg(test)]
#[path = "catalog_test.rs"]
mod tests;
