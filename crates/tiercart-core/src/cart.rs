//! Cart model as reported by the remote commerce backend.
//!
//! Every quantity and cost in these types is computed by the backend. The
//! client never derives or edits them; a mutation always produces a fresh
//! [`Cart`] from the backend's response.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A monetary amount exactly as the backend reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    /// Decimal amount, e.g. `"34.99"` on the wire.
    pub amount: Decimal,
    /// ISO 4217 currency code (e.g., `"USD"`).
    pub currency_code: String,
}

impl Money {
    #[must_use]
    pub fn new(amount: Decimal, currency_code: impl Into<String>) -> Self {
        Self {
            amount,
            currency_code: currency_code.into(),
        }
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.amount, self.currency_code)
    }
}

/// Cart-level cost summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartCost {
    pub subtotal: Money,
    pub total: Money,
}

/// A remote cart snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    /// Opaque backend identifier, e.g. `"gid://shopify/Cart/c1-abc?key=..."`.
    pub id: String,
    /// Hosted checkout URL. Checkout itself is handled entirely by the backend.
    pub checkout_url: String,
    /// Sum of all line quantities.
    pub total_quantity: u32,
    pub cost: CartCost,
    /// Lines in the order the backend returns them.
    pub lines: Vec<CartLine>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Cart {
    /// Returns the line with the given id, if present.
    #[must_use]
    pub fn line(&self, line_id: &str) -> Option<&CartLine> {
        self.lines.iter().find(|l| l.id == line_id)
    }

    /// Returns the first line whose merchandise is `variant_id`.
    #[must_use]
    pub fn line_for_variant(&self, variant_id: &str) -> Option<&CartLine> {
        self.lines
            .iter()
            .find(|l| l.merchandise.variant_id == variant_id)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// One line of a [`Cart`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub id: String,
    pub quantity: u32,
    /// Total cost of the line (all units, after backend-side adjustments).
    pub cost: Money,
    pub merchandise: Merchandise,
    /// Present when the line is a subscription purchase.
    #[serde(default)]
    pub selling_plan_allocation: Option<SellingPlanAllocation>,
}

impl CartLine {
    /// `true` when the line carries a subscription allocation.
    #[must_use]
    pub fn is_subscription(&self) -> bool {
        self.selling_plan_allocation.is_some()
    }

    /// Id of the attached selling plan, if the line is a subscription.
    #[must_use]
    pub fn selling_plan_id(&self) -> Option<&str> {
        self.selling_plan_allocation
            .as_ref()
            .map(|a| a.selling_plan_id.as_str())
    }

    #[must_use]
    pub fn purchase_type(&self) -> PurchaseType {
        if self.is_subscription() {
            PurchaseType::Subscription
        } else {
            PurchaseType::OneTime
        }
    }
}

/// The purchasable variant a line refers to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Merchandise {
    pub variant_id: String,
    /// Variant display title, e.g. `"12 Pack"`.
    pub title: String,
    #[serde(default)]
    pub sku: Option<String>,
    pub product: ProductRef,
    /// Unit price of the variant.
    pub price: Money,
    #[serde(default)]
    pub compare_at_price: Option<Money>,
}

/// Parent product of a [`Merchandise`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRef {
    pub id: String,
    pub handle: String,
    pub title: String,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// Subscription details attached to a line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SellingPlanAllocation {
    pub selling_plan_id: String,
    pub selling_plan_name: String,
    #[serde(default)]
    pub price_adjustments: Vec<PriceAdjustment>,
}

/// One price adjustment applied by a selling plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceAdjustment {
    pub price: Money,
    #[serde(default)]
    pub compare_at_price: Option<Money>,
    #[serde(default)]
    pub per_delivery_price: Option<Money>,
}

/// One-time purchase vs. subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PurchaseType {
    OneTime,
    Subscription,
}

impl std::fmt::Display for PurchaseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PurchaseType::OneTime => write!(f, "one_time"),
            PurchaseType::Subscription => write!(f, "subscription"),
        }
    }
}
