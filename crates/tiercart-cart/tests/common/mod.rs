//! Shared fixtures for cart store tests: an in-memory gateway with call
//! recording and failure injection, a recording analytics sink, and a small
//! tiered catalog.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;

use rust_decimal::Decimal;

use tiercart_cart::{
    AnalyticsSink, CartStore, FunnelEvent, ItemAddedEvent, MemoryCartRef,
};
use tiercart_core::{
    parse_catalog, Cart, CartCost, CartLine, Merchandise, Money, PriceAdjustment, ProductRef,
    SellingPlanAllocation, VariantTable,
};
use tiercart_storefront::{CartGateway, CartLineInput, CartLineUpdate, GatewayError};

pub type TestStore = CartStore<FakeGateway, MemoryCartRef, RecordingAnalytics>;

/// Catalog with tiers t0/t1/t2 at 0/`t1`/`t2`.
///
/// - family `alpha` (1 unit each): products `a1` (with selling plans), `a2`
/// - family `beta` (1 unit each): product `b1`
/// - family `bundle` (2 units each): product `d1`
pub fn table_with(t1: u32, t2: u32) -> VariantTable {
    let yaml = format!(
        r"
tiers:
  - {{ name: t0, min_volume: 0 }}
  - {{ name: t1, min_volume: {t1} }}
  - {{ name: t2, min_volume: {t2} }}
families:
  - name: alpha
    products:
      - id: a1
        tiers:
          t0: {{ variant_id: a1-t0, selling_plan_id: plan-a1-t0 }}
          t1: {{ variant_id: a1-t1, selling_plan_id: plan-a1-t1 }}
          t2: {{ variant_id: a1-t2, selling_plan_id: plan-a1-t2 }}
      - id: a2
        tiers:
          t0: {{ variant_id: a2-t0 }}
          t1: {{ variant_id: a2-t1 }}
          t2: {{ variant_id: a2-t2 }}
  - name: beta
    products:
      - id: b1
        tiers:
          t0: {{ variant_id: b1-t0 }}
          t1: {{ variant_id: b1-t1 }}
          t2: {{ variant_id: b1-t2 }}
  - name: bundle
    volume_units: 2
    products:
      - id: d1
        tiers:
          t0: {{ variant_id: d1-t0 }}
          t1: {{ variant_id: d1-t1 }}
          t2: {{ variant_id: d1-t2 }}
"
    );
    VariantTable::build(&parse_catalog(&yaml).expect("fixture catalog parses"))
        .expect("fixture catalog is valid")
}

/// Thresholds {t0: 0, t1: 5, t2: 10}.
pub fn table() -> VariantTable {
    table_with(5, 10)
}

pub fn store() -> TestStore {
    store_with(FakeGateway::new(), MemoryCartRef::new(), table())
}

pub fn store_with(gateway: FakeGateway, cart_ref: MemoryCartRef, table: VariantTable) -> TestStore {
    CartStore::new(gateway, table, cart_ref, RecordingAnalytics::default())
}

// ---------------------------------------------------------------------------
// Fake gateway
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Create,
    AddLine { cart_id: String },
    UpdateLines { cart_id: String, updates: Vec<CartLineUpdate> },
    RemoveLines { cart_id: String },
    GetCart { cart_id: String },
}

#[derive(Default)]
struct FakeState {
    carts: HashMap<String, Cart>,
    next_id: u32,
    calls: Vec<Call>,
    fail_merchandise_updates: bool,
    fail_creates: bool,
    unavailable: bool,
}

impl FakeState {
    fn next(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}-{}", self.next_id)
    }
}

/// In-memory Remote Cart Gateway. Lines are merged by (variant, plan) like
/// the real backend. Every call is recorded.
#[derive(Default)]
pub struct FakeGateway {
    state: Mutex<FakeState>,
}

impl FakeGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a cart that already exists remotely.
    pub fn with_cart(self, cart_id: &str, lines: &[(&str, u32, Option<&str>)]) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            let mut cart = empty_cart(cart_id);
            for (variant_id, quantity, plan) in lines {
                let line_id = state.next("line");
                cart.lines.push(line(&line_id, variant_id, *quantity, *plan));
            }
            recompute(&mut cart);
            state.carts.insert(cart_id.to_owned(), cart);
        }
        self
    }

    /// Makes the cart unknown to the backend.
    pub fn expire(&self, cart_id: &str) {
        self.state.lock().unwrap().carts.remove(cart_id);
    }

    /// Fails every variant-swap batch (the normalization call).
    pub fn fail_merchandise_updates(&self, fail: bool) {
        self.state.lock().unwrap().fail_merchandise_updates = fail;
    }

    /// Fails every `cartCreate` with a 503.
    pub fn fail_creates(&self, fail: bool) {
        self.state.lock().unwrap().fail_creates = fail;
    }

    /// Fails every call with a 503.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.state.lock().unwrap().unavailable = unavailable;
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn create_calls(&self) -> usize {
        self.calls().iter().filter(|c| **c == Call::Create).count()
    }

    pub fn update_batches(&self) -> Vec<Vec<CartLineUpdate>> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::UpdateLines { updates, .. } => Some(updates),
                _ => None,
            })
            .collect()
    }

    pub fn remote_cart(&self, cart_id: &str) -> Option<Cart> {
        self.state.lock().unwrap().carts.get(cart_id).cloned()
    }

    fn record(&self, call: Call) -> Result<std::sync::MutexGuard<'_, FakeState>, GatewayError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(call);
        if state.unavailable {
            return Err(unavailable());
        }
        Ok(state)
    }
}

fn unavailable() -> GatewayError {
    GatewayError::UnexpectedStatus {
        status: 503,
        url: "fake://storefront".to_owned(),
    }
}

fn not_found(cart_id: &str) -> GatewayError {
    GatewayError::NotFound {
        cart_id: cart_id.to_owned(),
    }
}

fn add_to(state: &mut FakeState, cart: &mut Cart, input: &CartLineInput) {
    let existing = cart.lines.iter_mut().find(|l| {
        l.merchandise.variant_id == input.variant_id
            && l.selling_plan_id() == input.selling_plan_id.as_deref()
    });
    match existing {
        Some(l) => l.quantity += input.quantity,
        None => {
            let line_id = state.next("line");
            cart.lines.push(line(
                &line_id,
                &input.variant_id,
                input.quantity,
                input.selling_plan_id.as_deref(),
            ));
        }
    }
    recompute(cart);
}

impl CartGateway for FakeGateway {
    async fn create_cart(&self, line: Option<CartLineInput>) -> Result<Cart, GatewayError> {
        let mut state = self.record(Call::Create)?;
        if state.fail_creates {
            return Err(unavailable());
        }
        let cart_id = state.next("gid://shopify/Cart/c");
        let mut cart = empty_cart(&cart_id);
        if let Some(input) = &line {
            add_to(&mut state, &mut cart, input);
        }
        state.carts.insert(cart_id, cart.clone());
        Ok(cart)
    }

    async fn add_line(&self, cart_id: &str, line: CartLineInput) -> Result<Cart, GatewayError> {
        let mut state = self.record(Call::AddLine {
            cart_id: cart_id.to_owned(),
        })?;
        let mut cart = state.carts.get(cart_id).cloned().ok_or_else(|| not_found(cart_id))?;
        add_to(&mut state, &mut cart, &line);
        state.carts.insert(cart_id.to_owned(), cart.clone());
        Ok(cart)
    }

    async fn update_lines(
        &self,
        cart_id: &str,
        updates: &[CartLineUpdate],
    ) -> Result<Cart, GatewayError> {
        let mut state = self.record(Call::UpdateLines {
            cart_id: cart_id.to_owned(),
            updates: updates.to_vec(),
        })?;
        let is_swap = updates
            .iter()
            .any(|u| matches!(u, CartLineUpdate::Merchandise { .. }));
        if is_swap && state.fail_merchandise_updates {
            return Err(unavailable());
        }
        let mut cart = state.carts.get(cart_id).cloned().ok_or_else(|| not_found(cart_id))?;
        for update in updates {
            match update {
                CartLineUpdate::Quantity { line_id, quantity } => {
                    if *quantity == 0 {
                        cart.lines.retain(|l| &l.id != line_id);
                    } else if let Some(l) = cart.lines.iter_mut().find(|l| &l.id == line_id) {
                        l.quantity = *quantity;
                    }
                }
                CartLineUpdate::Merchandise {
                    line_id,
                    variant_id,
                    selling_plan_id,
                } => {
                    if let Some(l) = cart.lines.iter_mut().find(|l| &l.id == line_id) {
                        *l = line(line_id, variant_id, l.quantity, selling_plan_id.as_deref());
                    }
                }
            }
        }
        recompute(&mut cart);
        state.carts.insert(cart_id.to_owned(), cart.clone());
        Ok(cart)
    }

    async fn remove_lines(&self, cart_id: &str, line_ids: &[String]) -> Result<Cart, GatewayError> {
        let mut state = self.record(Call::RemoveLines {
            cart_id: cart_id.to_owned(),
        })?;
        let mut cart = state.carts.get(cart_id).cloned().ok_or_else(|| not_found(cart_id))?;
        cart.lines.retain(|l| !line_ids.contains(&l.id));
        recompute(&mut cart);
        state.carts.insert(cart_id.to_owned(), cart.clone());
        Ok(cart)
    }

    async fn get_cart(&self, cart_id: &str) -> Result<Cart, GatewayError> {
        let state = self.record(Call::GetCart {
            cart_id: cart_id.to_owned(),
        })?;
        state.carts.get(cart_id).cloned().ok_or_else(|| not_found(cart_id))
    }
}

fn usd(cents: i64) -> Money {
    Money::new(Decimal::new(cents, 2), "USD")
}

fn empty_cart(cart_id: &str) -> Cart {
    Cart {
        id: cart_id.to_owned(),
        checkout_url: format!("https://shop.example.com/checkout/{cart_id}"),
        total_quantity: 0,
        cost: CartCost {
            subtotal: usd(0),
            total: usd(0),
        },
        lines: Vec::new(),
        created_at: None,
        updated_at: None,
    }
}

fn line(line_id: &str, variant_id: &str, quantity: u32, plan: Option<&str>) -> CartLine {
    CartLine {
        id: line_id.to_owned(),
        quantity,
        cost: usd(1000 * i64::from(quantity)),
        merchandise: Merchandise {
            variant_id: variant_id.to_owned(),
            title: variant_id.to_owned(),
            sku: None,
            product: ProductRef {
                id: format!("gid://shopify/Product/{variant_id}"),
                handle: variant_id.to_owned(),
                title: variant_id.to_owned(),
                image_url: None,
            },
            price: usd(1000),
            compare_at_price: None,
        },
        selling_plan_allocation: plan.map(|p| SellingPlanAllocation {
            selling_plan_id: p.to_owned(),
            selling_plan_name: "Every 30 days".to_owned(),
            price_adjustments: vec![PriceAdjustment {
                price: usd(900),
                compare_at_price: Some(usd(1000)),
                per_delivery_price: None,
            }],
        }),
    }
}

fn recompute(cart: &mut Cart) {
    cart.total_quantity = cart.lines.iter().map(|l| l.quantity).sum();
    let total: Decimal = cart.lines.iter().map(|l| l.cost.amount).sum();
    cart.cost.subtotal = Money::new(total, "USD");
    cart.cost.total = Money::new(total, "USD");
}

// ---------------------------------------------------------------------------
// Recording analytics
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct RecordingAnalytics {
    pub items: Mutex<Vec<ItemAddedEvent>>,
    pub funnels: Mutex<Vec<FunnelEvent>>,
}

impl AnalyticsSink for RecordingAnalytics {
    fn item_added(&self, event: &ItemAddedEvent) {
        self.items.lock().unwrap().push(event.clone());
    }

    fn funnel(&self, event: &FunnelEvent) {
        self.funnels.lock().unwrap().push(event.clone());
    }
}

// ---------------------------------------------------------------------------
// Cart helpers
// ---------------------------------------------------------------------------

pub fn variant_of(cart: &Cart, line_id: &str) -> String {
    cart.line(line_id)
        .map(|l| l.merchandise.variant_id.clone())
        .unwrap_or_default()
}

pub fn variants(cart: &Cart) -> Vec<String> {
    let mut v: Vec<String> = cart
        .lines
        .iter()
        .map(|l| l.merchandise.variant_id.clone())
        .collect();
    v.sort();
    v
}
