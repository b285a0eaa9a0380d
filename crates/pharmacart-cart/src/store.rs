//! The session's shopping cart.
//!
//! [`CartStore`] is the only mutation surface for cart lines. It is created
//! when a session starts ([`CartStore::open`]), shared by reference or `Arc`
//! with whatever needs it, and closed at logout ([`CartStore::close`]). Every
//! change is written through to a [`KeyValueStore`] and announced to
//! subscribers.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use pharmacart_core::{CartLineItem, Product, ProductId};
use rust_decimal::Decimal;

use crate::error::PricingError;
use crate::pricing;
use crate::storage::{self, KeyValueStore};

/// Storage key for an anonymous session's cart.
pub const CART_KEY: &str = "pharmacy-cart";

/// Storage key for the cart of `user`, or the anonymous key.
#[must_use]
pub fn cart_key(user: Option<&str>) -> String {
    match user.map(str::trim).filter(|u| !u.is_empty()) {
        Some(user) => format!("{CART_KEY}:{user}"),
        None => CART_KEY.to_owned(),
    }
}

/// Point-in-time copy of the cart handed to subscribers.
#[derive(Debug, Clone, PartialEq)]
pub struct CartSnapshot {
    pub lines: Vec<CartLineItem>,
    pub item_count: u64,
}

impl CartSnapshot {
    fn from_lines(lines: &[CartLineItem]) -> Self {
        Self {
            lines: lines.to_vec(),
            item_count: item_count(lines),
        }
    }

    /// # Errors
    ///
    /// See [`pricing::subtotal`].
    pub fn subtotal(&self) -> Result<Decimal, PricingError> {
        pricing::subtotal(&self.lines)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Arc<dyn Fn(&CartSnapshot) + Send + Sync>;

#[derive(Default)]
struct CartState {
    lines: Vec<CartLineItem>,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
}

pub struct CartStore {
    storage: Arc<dyn KeyValueStore>,
    key: String,
    state: Mutex<CartState>,
}

impl std::fmt::Debug for CartStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("CartStore")
            .field("key", &self.key)
            .field("lines", &state.lines.len())
            .field("listeners", &state.listeners.len())
            .finish_non_exhaustive()
    }
}

impl CartStore {
    /// Opens the cart persisted under `key`.
    ///
    /// Missing data yields an empty cart. Corrupted data (bad JSON, a zero
    /// quantity, a product listed twice) is logged, wiped, and also yields an
    /// empty cart.
    pub fn open(storage: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        let key = key.into();
        let lines = storage::read_json::<Vec<CartLineItem>>(storage.as_ref(), &key)
            .map(|lines| {
                if lines_are_consistent(&lines) {
                    lines
                } else {
                    tracing::warn!(key = %key, "persisted cart violates line invariants; resetting");
                    storage::discard(storage.as_ref(), &key);
                    Vec::new()
                }
            })
            .unwrap_or_default();

        tracing::debug!(key = %key, lines = lines.len(), "cart opened");

        Self {
            storage,
            key,
            state: Mutex::new(CartState {
                lines,
                ..CartState::default()
            }),
        }
    }

    /// Ends the session: writes the final state and drops every subscriber.
    pub fn close(&self) {
        let mut state = self.lock();
        self.persist(&state.lines);
        state.listeners.clear();
        tracing::debug!(key = %self.key, "cart closed");
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Adds one unit of `product`.
    pub fn add_to_cart(&self, product: Product) {
        self.add_quantity(product, 1);
    }

    /// Adds `quantity` units of `product`, merging into an existing line.
    ///
    /// A `quantity` of zero changes nothing.
    pub fn add_quantity(&self, product: Product, quantity: u32) {
        if quantity == 0 {
            return;
        }
        self.mutate("add", |lines| {
            if let Some(line) = lines.iter_mut().find(|l| l.product.id == product.id) {
                line.quantity = line.quantity.saturating_add(quantity);
            } else {
                lines.push(CartLineItem { product, quantity });
            }
            true
        });
    }

    /// Sets the quantity of a line exactly; zero or less removes it.
    ///
    /// Unknown product ids are ignored.
    pub fn update_quantity(&self, product_id: ProductId, new_quantity: i64) {
        if new_quantity <= 0 {
            self.remove_from_cart(product_id);
            return;
        }
        let quantity = u32::try_from(new_quantity).unwrap_or(u32::MAX);
        self.mutate("update", |lines| {
            match lines.iter_mut().find(|l| l.product.id == product_id) {
                Some(line) if line.quantity != quantity => {
                    line.quantity = quantity;
                    true
                }
                _ => false,
            }
        });
    }

    pub fn remove_from_cart(&self, product_id: ProductId) {
        self.mutate("remove", |lines| {
            let before = lines.len();
            lines.retain(|l| l.product.id != product_id);
            lines.len() != before
        });
    }

    pub fn clear_cart(&self) {
        self.mutate("clear", |lines| {
            lines.clear();
            true
        });
    }

    /// Replaces the stored product data of matching lines with `catalog`'s.
    ///
    /// Keeps cart totals in step with catalogue price changes.
    pub fn refresh_products(&self, catalog: &[Product]) {
        self.mutate("refresh", |lines| {
            let mut changed = false;
            for line in lines.iter_mut() {
                if let Some(fresh) = catalog.iter().find(|p| p.id == line.product.id) {
                    if *fresh != line.product {
                        line.product = fresh.clone();
                        changed = true;
                    }
                }
            }
            changed
        });
    }

    /// Sum of `price × quantity` over all lines, from current prices.
    ///
    /// # Errors
    ///
    /// See [`pricing::subtotal`].
    pub fn cart_total(&self) -> Result<Decimal, PricingError> {
        pricing::subtotal(&self.lock().lines)
    }

    #[must_use]
    pub fn cart_item_count(&self) -> u64 {
        item_count(&self.lock().lines)
    }

    #[must_use]
    pub fn is_in_cart(&self, product_id: ProductId) -> bool {
        self.lock().lines.iter().any(|l| l.product.id == product_id)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().lines.is_empty()
    }

    #[must_use]
    pub fn lines(&self) -> Vec<CartLineItem> {
        self.lock().lines.clone()
    }

    #[must_use]
    pub fn snapshot(&self) -> CartSnapshot {
        CartSnapshot::from_lines(&self.lock().lines)
    }

    /// Registers `listener` to be called with a snapshot after every change.
    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&CartSnapshot) + Send + Sync + 'static,
    {
        let mut state = self.lock();
        let id = SubscriptionId(state.next_subscription);
        state.next_subscription += 1;
        state.listeners.push((id, Arc::new(listener)));
        id
    }

    /// Returns `true` if `id` was subscribed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut state = self.lock();
        let before = state.listeners.len();
        state.listeners.retain(|(sid, _)| *sid != id);
        state.listeners.len() != before
    }

    fn lock(&self) -> MutexGuard<'_, CartState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Applies `op` to the lines; when it reports a change, persists and then
    /// notifies subscribers outside the lock so they may read the store.
    fn mutate<F>(&self, op: &'static str, op_fn: F)
    where
        F: FnOnce(&mut Vec<CartLineItem>) -> bool,
    {
        let (snapshot, listeners) = {
            let mut state = self.lock();
            if !op_fn(&mut state.lines) {
                return;
            }
            self.persist(&state.lines);
            let listeners: Vec<Listener> =
                state.listeners.iter().map(|(_, l)| Arc::clone(l)).collect();
            (CartSnapshot::from_lines(&state.lines), listeners)
        };

        tracing::debug!(
            key = %self.key,
            op,
            lines = snapshot.lines.len(),
            items = snapshot.item_count,
            "cart updated"
        );

        for listener in listeners {
            listener(&snapshot);
        }
    }

    fn persist(&self, lines: &[CartLineItem]) {
        if let Err(e) = storage::write_json(self.storage.as_ref(), &self.key, lines) {
            tracing::warn!(key = %self.key, error = %e, "failed to persist cart");
        }
    }
}

fn item_count(lines: &[CartLineItem]) -> u64 {
    lines.iter().map(|l| u64::from(l.quantity)).sum()
}

fn lines_are_consistent(lines: &[CartLineItem]) -> bool {
    let mut seen = HashSet::new();
    lines
        .iter()
        .all(|l| l.quantity >= 1 && seen.insert(l.product.id))
}

#[cfg(test)]
#[path = "store_test.rs"]
mod tests;
