//! The cart store: the single writer of cart state.
//!
//! Every mutation is a primary gateway call followed by one normalization
//! pass. Subscribers see the primary result as soon as it lands, then the
//! normalized cart. A failed normalization never reverses a successful
//! primary mutation.

use chrono::Utc;
use serde::Serialize;
use tokio::sync::watch;
use uuid::Uuid;

use tiercart_core::{Cart, CartLine, Money, PurchaseType, Tier, VariantTable};
use tiercart_storefront::{CartGateway, CartLineInput, CartLineUpdate, GatewayError};

use crate::analytics::{AnalyticsSink, Attribution, FunnelEvent, ItemAddedEvent};
use crate::cart_ref::CartRefStore;
use crate::engine::{self, NormalizationOutcome};
use crate::error::StoreError;

/// Error recorded when the backend no longer knows the stored cart.
pub const CART_EXPIRED: &str = "cart expired";

/// Last tier the store moved the cart to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TierNotice {
    pub tier: Tier,
    pub message: String,
}

impl TierNotice {
    fn new(tier: Tier) -> Self {
        let message = format!("tier changed to {tier}");
        Self { tier, message }
    }
}

/// Everything a view needs to render the cart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CartState {
    pub cart: Option<Cart>,
    /// Advisory; set while a mutation is in flight.
    pub loading: bool,
    pub error: Option<String>,
    pub is_open: bool,
    pub tier_notice: Option<TierNotice>,
    pub normalization_notice: Option<String>,
}

/// Result of a cart mutation.
#[derive(Debug)]
pub enum MutationOutcome {
    /// `tier_change` is set when normalization moved the cart to a tier.
    Ok { cart: Cart, tier_change: Option<Tier> },
    /// The primary mutation succeeded but normalization failed.
    OkWithWarning { cart: Cart, reason: String },
    PrimaryFailed(StoreError),
}

impl MutationOutcome {
    #[must_use]
    pub fn is_ok(&self) -> bool {
        !matches!(self, MutationOutcome::PrimaryFailed(_))
    }

    #[must_use]
    pub fn cart(&self) -> Option<&Cart> {
        match self {
            MutationOutcome::Ok { cart, .. } | MutationOutcome::OkWithWarning { cart, .. } => {
                Some(cart)
            }
            MutationOutcome::PrimaryFailed(_) => None,
        }
    }

    #[must_use]
    pub fn error(&self) -> Option<&StoreError> {
        match self {
            MutationOutcome::PrimaryFailed(e) => Some(e),
            _ => None,
        }
    }
}

pub struct CartStore<G, R, A> {
    gateway: G,
    table: VariantTable,
    cart_ref: R,
    analytics: A,
    state: watch::Sender<CartState>,
}

impl<G, R, A> CartStore<G, R, A>
where
    G: CartGateway,
    R: CartRefStore,
    A: AnalyticsSink,
{
    #[must_use]
    pub fn new(gateway: G, table: VariantTable, cart_ref: R, analytics: A) -> Self {
        let (state, _) = watch::channel(CartState::default());
        Self {
            gateway,
            table,
            cart_ref,
            analytics,
            state,
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> CartState {
        self.state.borrow().clone()
    }

    /// A receiver that observes every state change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<CartState> {
        self.state.subscribe()
    }

    #[must_use]
    pub fn table(&self) -> &VariantTable {
        &self.table
    }

    #[must_use]
    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    #[must_use]
    pub fn cart_ref(&self) -> &R {
        &self.cart_ref
    }

    #[must_use]
    pub fn analytics(&self) -> &A {
        &self.analytics
    }

    pub fn open(&self) {
        self.state.send_modify(|s| s.is_open = true);
    }

    pub fn close(&self) {
        self.state.send_modify(|s| s.is_open = false);
    }

    pub fn dismiss_notices(&self) {
        self.state.send_modify(|s| {
            s.tier_notice = None;
            s.normalization_notice = None;
        });
    }

    /// Loads the cart named by the stored reference.
    ///
    /// Yields to the runtime first so already-queued work runs before the
    /// fetch. A cart the backend no longer knows clears the reference; any
    /// other failure is logged and leaves the reference in place.
    pub async fn hydrate(&mut self) {
        tokio::task::yield_now().await;

        let cart_id = match self.cart_ref.load() {
            Ok(Some(cart_id)) => cart_id,
            Ok(None) => {
                tracing::debug!("no stored cart reference");
                return;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to read cart reference");
                return;
            }
        };

        self.state.send_modify(|s| s.loading = true);
        match self.gateway.get_cart(&cart_id).await {
            Ok(cart) => {
                tracing::info!(cart_id = %cart.id, lines = cart.lines.len(), "cart hydrated");
                self.state.send_modify(|s| {
                    s.cart = Some(cart);
                    s.loading = false;
                });
            }
            Err(e) if e.is_not_found() => {
                tracing::info!(%cart_id, "stored cart no longer exists, clearing reference");
                self.clear_ref();
                self.state.send_modify(|s| {
                    s.cart = None;
                    s.loading = false;
                });
            }
            Err(e) => {
                tracing::warn!(%cart_id, error = %e, "failed to hydrate cart");
                self.state.send_modify(|s| s.loading = false);
            }
        }
    }

    /// Adds `quantity` of `variant_id`, creating a cart when none exists or
    /// the stored one has expired.
    pub async fn add_to_cart(
        &mut self,
        variant_id: &str,
        quantity: u32,
        selling_plan_id: Option<String>,
        metadata: Option<Attribution>,
    ) -> MutationOutcome {
        let variant_id = variant_id.trim();
        if variant_id.is_empty() {
            return self.reject("variant id must not be empty");
        }
        if quantity < 1 {
            return self.reject("quantity must be at least 1");
        }
        let selling_plan_id = selling_plan_id.filter(|p| !p.trim().is_empty());

        self.begin();
        let line =
            CartLineInput::new(variant_id, quantity).with_selling_plan(selling_plan_id.clone());

        let primary = match self.current_cart_id() {
            Some(cart_id) => match self.gateway.add_line(&cart_id, line.clone()).await {
                Err(e) if e.is_not_found() => {
                    tracing::warn!(%cart_id, "stored cart expired, creating a new one");
                    self.clear_ref();
                    self.state.send_modify(|s| s.cart = None);
                    self.create_cart(line).await
                }
                other => other,
            },
            None => self.create_cart(line).await,
        };

        let cart = match primary {
            Ok(cart) => cart,
            Err(e) => return self.fail(e.into()),
        };

        let (outcome, tier) = self.normalize_and_publish(cart).await;
        if let Some(cart) = outcome.cart() {
            self.emit_added(
                cart,
                variant_id,
                quantity,
                selling_plan_id.is_some(),
                tier,
                metadata,
            );
        }
        self.open();
        outcome
    }

    /// Sets a line's quantity. Quantities below 1 remove the line.
    pub async fn update_quantity(&mut self, line_id: &str, quantity: u32) -> MutationOutcome {
        if quantity < 1 {
            return self.remove_item(line_id).await;
        }
        let line_id = line_id.trim();
        if line_id.is_empty() {
            return self.reject("line id must not be empty");
        }
        let Some(cart_id) = self.current_cart_id() else {
            return self.fail(StoreError::NoActiveCart);
        };

        self.begin();
        let updates = [CartLineUpdate::Quantity {
            line_id: line_id.to_owned(),
            quantity,
        }];
        match self.gateway.update_lines(&cart_id, &updates).await {
            Ok(cart) => self.normalize_and_publish(cart).await.0,
            Err(e) => self.fail_existing(&cart_id, e),
        }
    }

    pub async fn remove_item(&mut self, line_id: &str) -> MutationOutcome {
        let line_id = line_id.trim();
        if line_id.is_empty() {
            return self.reject("line id must not be empty");
        }
        let Some(cart_id) = self.current_cart_id() else {
            return self.fail(StoreError::NoActiveCart);
        };

        self.begin();
        match self
            .gateway
            .remove_lines(&cart_id, &[line_id.to_owned()])
            .await
        {
            Ok(cart) => self.normalize_and_publish(cart).await.0,
            Err(e) => self.fail_existing(&cart_id, e),
        }
    }

    /// Forgets the current cart locally. The remote cart is left to expire.
    pub fn clear_cart(&mut self) {
        self.clear_ref();
        self.state.send_modify(|s| *s = CartState::default());
        tracing::info!("cart cleared");
    }

    // -- internals ----------------------------------------------------------

    /// The in-memory cart wins; the stored reference covers a store that has
    /// not been hydrated yet.
    fn current_cart_id(&self) -> Option<String> {
        if let Some(cart) = &self.state.borrow().cart {
            return Some(cart.id.clone());
        }
        match self.cart_ref.load() {
            Ok(cart_id) => cart_id,
            Err(e) => {
                tracing::warn!(error = %e, "failed to read cart reference");
                None
            }
        }
    }

    async fn create_cart(&self, line: CartLineInput) -> Result<Cart, GatewayError> {
        let cart = self.gateway.create_cart(Some(line)).await?;
        if let Err(e) = self.cart_ref.save(&cart.id) {
            tracing::warn!(cart_id = %cart.id, error = %e, "failed to persist cart reference");
        }
        Ok(cart)
    }

    fn clear_ref(&self) {
        if let Err(e) = self.cart_ref.clear() {
            tracing::warn!(error = %e, "failed to clear cart reference");
        }
    }

    fn begin(&self) {
        self.state.send_modify(|s| {
            s.loading = true;
            s.error = None;
        });
    }

    fn reject(&self, reason: &str) -> MutationOutcome {
        tracing::debug!(reason, "cart mutation rejected");
        self.fail(StoreError::Validation(reason.to_owned()))
    }

    fn fail(&self, error: StoreError) -> MutationOutcome {
        tracing::warn!(error = %error, "cart mutation failed");
        let message = error.to_string();
        self.state.send_modify(|s| {
            s.loading = false;
            s.error = Some(message);
        });
        MutationOutcome::PrimaryFailed(error)
    }

    /// Failure of a mutation on an existing cart. A missing cart drops the
    /// reference and the local copy.
    fn fail_existing(&self, cart_id: &str, error: GatewayError) -> MutationOutcome {
        if !error.is_not_found() {
            return self.fail(error.into());
        }
        tracing::warn!(cart_id, "cart expired during mutation, clearing reference");
        self.clear_ref();
        self.state.send_modify(|s| {
            s.cart = None;
            s.loading = false;
            s.error = Some(CART_EXPIRED.to_owned());
        });
        MutationOutcome::PrimaryFailed(error.into())
    }

    /// Publishes the primary result, then runs and applies one normalization pass.
    /// Also returns the tier the pass settled on; `None` when the pass failed
    /// or the cart holds no eligible lines.
    async fn normalize_and_publish(&self, cart: Cart) -> (MutationOutcome, Option<Tier>) {
        let primary = cart.clone();
        self.state.send_modify(|s| s.cart = Some(primary));

        match engine::normalize(&self.gateway, &self.table, &cart).await {
            NormalizationOutcome::Applied { cart, tier } => {
                let notice = TierNotice::new(tier.clone());
                let published = cart.clone();
                self.state.send_modify(|s| {
                    s.cart = Some(published);
                    s.loading = false;
                    s.tier_notice = Some(notice);
                    s.normalization_notice = None;
                });
                let outcome = MutationOutcome::Ok {
                    cart,
                    tier_change: Some(tier.clone()),
                };
                (outcome, Some(tier))
            }
            NormalizationOutcome::NoOp { tier } => {
                self.state.send_modify(|s| {
                    s.loading = false;
                    s.normalization_notice = None;
                });
                let outcome = MutationOutcome::Ok {
                    cart,
                    tier_change: None,
                };
                (outcome, tier)
            }
            NormalizationOutcome::Failed { reason } => {
                let notice = reason.clone();
                self.state.send_modify(|s| {
                    s.loading = false;
                    s.normalization_notice = Some(notice);
                });
                (MutationOutcome::OkWithWarning { cart, reason }, None)
            }
        }
    }

    fn emit_added(
        &self,
        cart: &Cart,
        variant_id: &str,
        quantity: u32,
        requested_subscription: bool,
        settled_tier: Option<Tier>,
        metadata: Option<Attribution>,
    ) {
        let now = Utc::now();
        self.analytics.item_added(&ItemAddedEvent {
            event_id: Uuid::new_v4(),
            occurred_at: now,
            variant_id: variant_id.to_owned(),
            quantity,
            cart_id: cart.id.clone(),
        });

        let purchase_type = if requested_subscription {
            PurchaseType::Subscription
        } else {
            PurchaseType::OneTime
        };
        let entry = self.table.resolve(variant_id);
        // Normalization may have swapped the added variant; find the line of
        // the same product and purchase type.
        let line: Option<&CartLine> = cart.lines.iter().find(|l| {
            if l.purchase_type() != purchase_type {
                return false;
            }
            match entry {
                Some(entry) => self
                    .table
                    .resolve(&l.merchandise.variant_id)
                    .is_some_and(|e| e.family == entry.family && e.product_id == entry.product_id),
                None => l.merchandise.variant_id == variant_id,
            }
        });
        // A failed pass leaves the line where it was.
        let tier = entry.and_then(|_| {
            settled_tier.or_else(|| {
                line.and_then(|l| self.table.resolve(&l.merchandise.variant_id))
                    .or(entry)
                    .map(|e| e.tier.clone())
            })
        });

        self.analytics.funnel(&FunnelEvent {
            event_id: Uuid::new_v4(),
            occurred_at: now,
            family: entry.map(|e| e.family.clone()),
            product_id: entry.map(|e| e.product_id.clone()),
            tier: tier.map(|t| t.name),
            purchase_type,
            unit_price: line.map(unit_price),
            attribution: metadata.filter(|a| !a.is_empty()),
        });
    }
}

/// Per-unit price of a line, honouring a subscription discount.
fn unit_price(line: &CartLine) -> Money {
    line.selling_plan_allocation
        .as_ref()
        .and_then(|a| a.price_adjustments.first())
        .map_or_else(|| line.merchandise.price.clone(), |p| p.price.clone())
}
