//! Fire-and-forget analytics notifications emitted after a successful add.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use tiercart_core::{Money, PurchaseType};

/// Where an add-to-cart came from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Attribution {
    pub source: Option<String>,
    pub campaign: Option<String>,
}

impl Attribution {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.source.is_none() && self.campaign.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemAddedEvent {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub variant_id: String,
    pub quantity: u32,
    pub cart_id: String,
}

/// Funnel event. Family, product and tier are absent for retail variants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FunnelEvent {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub family: Option<String>,
    pub product_id: Option<String>,
    pub tier: Option<String>,
    pub purchase_type: PurchaseType,
    pub unit_price: Option<Money>,
    pub attribution: Option<Attribution>,
}

/// Receives analytics notifications. Implementations must not block or fail.
pub trait AnalyticsSink {
    fn item_added(&self, event: &ItemAddedEvent);

    fn funnel(&self, event: &FunnelEvent);
}

/// Emits events as structured logs on the `tiercart::analytics` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAnalytics;

impl AnalyticsSink for TracingAnalytics {
    fn item_added(&self, event: &ItemAddedEvent) {
        tracing::info!(
            target: "tiercart::analytics",
            event = "item_added",
            event_id = %event.event_id,
            occurred_at = %event.occurred_at,
            variant_id = %event.variant_id,
            quantity = event.quantity,
            cart_id = %event.cart_id,
            "analytics event"
        );
    }

    fn funnel(&self, event: &FunnelEvent) {
        let attribution = event.attribution.as_ref();
        let unit_price = event.unit_price.as_ref().map(ToString::to_string);
        tracing::info!(
            target: "tiercart::analytics",
            event = "funnel",
            event_id = %event.event_id,
            occurred_at = %event.occurred_at,
            family = event.family.as_deref(),
            product_id = event.product_id.as_deref(),
            tier = event.tier.as_deref(),
            purchase_type = %event.purchase_type,
            unit_price = unit_price.as_deref(),
            source = attribution.and_then(|a| a.source.as_deref()),
            campaign = attribution.and_then(|a| a.campaign.as_deref()),
            "analytics event"
        );
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopAnalytics;

impl AnalyticsSink for NoopAnalytics {
    fn item_added(&self, _event: &ItemAddedEvent) {}

    fn funnel(&self, _event: &FunnelEvent) {}
}
