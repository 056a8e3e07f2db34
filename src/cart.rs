use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::{self, StorefrontResult};
use crate::events::{CartUpdated, EventBus};
use crate::session::StorageHandle;

/// One line in the shopping cart
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub product_id: String,
    pub name: String,
    pub unit_price_cents: u64,
    pub quantity: u32,
}

impl CartItem {
    /// Price of the whole line; `None` when it does not fit in a `u64`
    pub fn line_total_cents(&self) -> Option<u64> {
        self.unit_price_cents.checked_mul(u64::from(self.quantity))
    }
}

/// Shopping cart persisted in shared storage, so every tab sees the same cart
pub struct CartService {
    storage: StorageHandle,
    event_bus: Arc<EventBus>,
    cart_key: String,
}

impl CartService {
    pub fn new(storage: StorageHandle, event_bus: Arc<EventBus>, cart_key: impl Into<String>) -> Self {
        Self {
            storage,
            event_bus,
            cart_key: cart_key.into(),
        }
    }

    /// Current cart contents. Unreadable cart data counts as an empty cart.
    pub fn items(&self) -> Vec<CartItem> {
        let Some(raw) = self.storage.get(&self.cart_key) else {
            return Vec::new();
        };
        match serde_json::from_str(&raw) {
            Ok(items) => items,
            Err(e) => {
                warn!(error = %e, "Stored cart is unreadable, treating as empty");
                Vec::new()
            }
        }
    }

    /// Add an item, merging with an existing line for the same product
    pub async fn add_item(&self, item: CartItem) -> StorefrontResult<()> {
        if item.product_id.is_empty() {
            return Err(error::cart_item_invalid("", "product id is empty"));
        }
        if item.quantity == 0 {
            return Err(error::cart_item_invalid(&item.product_id, "quantity must be positive"));
        }

        let product_id = item.product_id.clone();
        let mut items = self.items();
        match items.iter_mut().find(|i| i.product_id == item.product_id) {
            Some(existing) => {
                existing.quantity = existing
                    .quantity
                    .checked_add(item.quantity)
                    .ok_or_else(|| error::cart_item_invalid(&product_id, "quantity overflows"))?;
                existing.unit_price_cents = item.unit_price_cents;
                existing.name = item.name;
            }
            None => items.push(item),
        }
        self.write(items, &product_id).await
    }

    /// Set the quantity of a line; zero removes it
    pub async fn update_quantity(&self, product_id: &str, quantity: u32) -> StorefrontResult<()> {
        let mut items = self.items();
        let Some(position) = items.iter().position(|i| i.product_id == product_id) else {
            return Err(error::cart_item_invalid(product_id, "not in cart"));
        };
        if quantity == 0 {
            items.remove(position);
        } else {
            items[position].quantity = quantity;
        }
        self.write(items, product_id).await
    }

    /// Remove a line; removing an absent product does nothing
    pub async fn remove_item(&self, product_id: &str) -> StorefrontResult<()> {
        let mut items = self.items();
        let before = items.len();
        items.retain(|i| i.product_id != product_id);
        if items.len() == before {
            return Ok(());
        }
        self.write(items, product_id).await
    }

    pub async fn clear(&self) {
        if self.storage.get(&self.cart_key).is_none() {
            return;
        }
        self.storage.remove(&self.cart_key);
        self.publish(CartUpdated {
            item_count: 0,
            total_cents: 0,
        })
        .await;
    }

    /// Total number of units across all lines
    pub fn item_count(&self) -> u32 {
        count(&self.items())
    }

    /// Cart total; saturates for carts written elsewhere that do not fit
    pub fn total_cents(&self) -> u64 {
        self.items().iter().fold(0u64, |acc, i| {
            acc.saturating_add(i.unit_price_cents.saturating_mul(u64::from(i.quantity)))
        })
    }

    /// Store `items` unless their totals overflow; `product_id` names the
    /// line being changed in the error
    async fn write(&self, items: Vec<CartItem>, product_id: &str) -> StorefrontResult<()> {
        let update = CartUpdated {
            item_count: checked_count(&items)
                .ok_or_else(|| error::cart_item_invalid(product_id, "item count overflows"))?,
            total_cents: checked_total(&items)
                .ok_or_else(|| error::cart_item_invalid(product_id, "cart total overflows"))?,
        };
        let body = serde_json::to_string(&items)?;
        self.storage.set(&self.cart_key, body);
        self.publish(update).await;
        Ok(())
    }

    async fn publish(&self, update: CartUpdated) {
        debug!(items = update.item_count, total_cents = update.total_cents, "Cart updated");
        self.event_bus.publish(update.to_event()).await;
    }
}

fn count(items: &[CartItem]) -> u32 {
    items.iter().fold(0u32, |acc, i| acc.saturating_add(i.quantity))
}

fn checked_count(items: &[CartItem]) -> Option<u32> {
    items.iter().try_fold(0u32, |acc, i| acc.checked_add(i.quantity))
}

fn checked_total(items: &[CartItem]) -> Option<u64> {
    items
        .iter()
        .try_fold(0u64, |acc, i| acc.checked_add(i.line_total_cents()?))
}
