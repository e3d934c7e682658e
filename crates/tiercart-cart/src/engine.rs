//! Volume-tier normalization.
//!
//! A pass runs in two phases. [`plan_normalization`] is pure: it sums the
//! volume of every eligible line, picks the one global tier for that volume
//! and lists the variant swaps needed to put every eligible line on it.
//! [`normalize`] submits those swaps as a single batched gateway call.
//!
//! Lines whose variant is absent from the [`VariantTable`] are retail lines
//! and are never touched. Running a pass over its own output plans nothing.

use serde::Serialize;

use tiercart_core::{Cart, CartLine, Tier, VariantEntry, VariantTable};
use tiercart_storefront::{CartGateway, CartLineUpdate};

/// Advisory message shown when the batched tier update fails.
pub const NORMALIZATION_FAILED: &str = "volume pricing could not be updated";

/// The pure result of planning a pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizationPlan {
    pub total_volume: u32,
    /// `None` when the cart has no eligible lines.
    pub tier: Option<Tier>,
    pub updates: Vec<CartLineUpdate>,
}

impl NormalizationPlan {
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.updates.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum NormalizationOutcome {
    /// The batched update succeeded; `cart` is the new truth.
    Applied { cart: Cart, tier: Tier },
    /// Nothing to change. `tier` is `None` for carts without eligible lines.
    NoOp { tier: Option<Tier> },
    /// The batched update failed; the caller keeps its prior cart.
    Failed { reason: String },
}

/// Plans the swaps that put every eligible line on the tier for the cart's
/// total volume.
///
/// Subscription lines move to the target's selling plan; one-time lines stay
/// one-time. Lines whose (family, product, tier) target is not configured
/// are skipped.
#[must_use]
pub fn plan_normalization(table: &VariantTable, lines: &[CartLine]) -> NormalizationPlan {
    let eligible: Vec<(&CartLine, &VariantEntry)> = lines
        .iter()
        .filter_map(|line| {
            table
                .resolve(&line.merchandise.variant_id)
                .map(|entry| (line, entry))
        })
        .collect();

    let total_volume = eligible
        .iter()
        .map(|(line, entry)| line.quantity.saturating_mul(entry.volume_units))
        .fold(0_u32, u32::saturating_add);

    if total_volume == 0 {
        return NormalizationPlan {
            total_volume,
            tier: None,
            updates: Vec::new(),
        };
    }

    let tier = table.policy().tier_for(total_volume).clone();

    let updates = eligible
        .into_iter()
        .filter_map(|(line, entry)| {
            let Some(target) = table.target(&entry.family, &entry.product_id, &tier) else {
                tracing::debug!(
                    line_id = %line.id,
                    family = %entry.family,
                    product_id = %entry.product_id,
                    tier = %tier,
                    "no configured target for line, skipping"
                );
                return None;
            };

            let desired_plan = if line.is_subscription() {
                target.selling_plan_id.as_deref()
            } else {
                None
            };

            if line.merchandise.variant_id == target.variant_id
                && line.selling_plan_id() == desired_plan
            {
                return None;
            }

            Some(CartLineUpdate::Merchandise {
                line_id: line.id.clone(),
                variant_id: target.variant_id.clone(),
                selling_plan_id: desired_plan.map(str::to_owned),
            })
        })
        .collect();

    NormalizationPlan {
        total_volume,
        tier: Some(tier),
        updates,
    }
}

/// Runs one normalization pass against `cart`.
///
/// Never retries. A failed update leaves the remote cart as it was and is
/// reported as [`NormalizationOutcome::Failed`].
pub async fn normalize<G: CartGateway>(
    gateway: &G,
    table: &VariantTable,
    cart: &Cart,
) -> NormalizationOutcome {
    let plan = plan_normalization(table, &cart.lines);

    let Some(tier) = plan.tier else {
        tracing::debug!(cart_id = %cart.id, "no eligible lines, normalization skipped");
        return NormalizationOutcome::NoOp { tier: None };
    };

    if plan.updates.is_empty() {
        tracing::debug!(
            cart_id = %cart.id,
            tier = %tier,
            total_volume = plan.total_volume,
            "cart already at tier"
        );
        return NormalizationOutcome::NoOp { tier: Some(tier) };
    }

    tracing::info!(
        cart_id = %cart.id,
        tier = %tier,
        total_volume = plan.total_volume,
        updates = plan.updates.len(),
        "applying volume tier"
    );

    match gateway.update_lines(&cart.id, &plan.updates).await {
        Ok(cart) => NormalizationOutcome::Applied { cart, tier },
        Err(e) => {
            tracing::warn!(
                cart_id = %cart.id,
                tier = %tier,
                error = %e,
                "batched tier update failed"
            );
            NormalizationOutcome::Failed {
                reason: NORMALIZATION_FAILED.to_owned(),
            }
        }
    }
}

#[cfg(test)]
#[path = "engine_test.rs"]
mod tests;
