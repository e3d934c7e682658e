//! Cart consistency for tiercart.
//!
//! [`CartStore`] owns the visible cart state and drives the remote gateway.
//! After every successful mutation it runs one volume-tier normalization
//! pass ([`engine`]) so all eligible lines sit on the tier their combined
//! volume earns.

pub mod analytics;
pub mod cart_ref;
pub mod engine;
pub mod error;
pub mod store;

pub use analytics::{
    AnalyticsSink, Attribution, FunnelEvent, ItemAddedEvent, NoopAnalytics, TracingAnalytics,
};
pub use cart_ref::{CartRefStore, FileCartRef, MemoryCartRef};
pub use engine::{
    normalize, plan_normalization, NormalizationOutcome, NormalizationPlan, NORMALIZATION_FAILED,
};
pub use error::{CartRefError, StoreError};
pub use store::{CartState, CartStore, MutationOutcome, TierNotice, CART_EXPIRED};
