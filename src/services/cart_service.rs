use std::collections::HashSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
    error::StorageError,
    models::{Product, ProductId},
    storage::KeyValueStore,
};

pub const CART_STORAGE_KEY: &str = "hazeCart";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    pub id: ProductId,
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub stock: u32,
    pub quantity: u32,
}

impl CartLine {
    pub fn subtotal(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

/// What the shopper saw when pressing "add": the product as last fetched.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductSnapshot {
    pub id: ProductId,
    pub name: String,
    pub price: Decimal,
    pub stock: u32,
}

impl From<&Product> for ProductSnapshot {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id,
            name: product.name.clone(),
            price: product.price,
            stock: product.stock,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Added,
    Incremented { quantity: u32 },
    AtStockLimit { quantity: u32 },
    OutOfStock,
}

/// The shopper's cart, mirrored to a [`KeyValueStore`] after every mutation.
///
/// The in-memory lines are authoritative; a failed mirror write is logged and
/// otherwise ignored.
#[derive(Debug)]
pub struct CartStore<S> {
    store: S,
    lines: Vec<CartLine>,
}

impl<S: KeyValueStore> CartStore<S> {
    /// Restores the cart from the mirror. Anything missing, unreadable or
    /// inconsistent yields an empty cart.
    pub fn load(store: S) -> Self {
        let lines = match store.get(CART_STORAGE_KEY) {
            Ok(Some(raw)) => parse_lines(&raw),
            Ok(None) => Vec::new(),
            Err(err) => {
                tracing::warn!(error = %err, "cart mirror unreadable, starting empty");
                Vec::new()
            }
        };
        tracing::debug!(lines = lines.len(), "cart loaded");
        Self { store, lines }
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn line(&self, id: ProductId) -> Option<&CartLine> {
        self.lines.iter().find(|line| line.id == id)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    pub fn add_item(&mut self, product: ProductSnapshot) -> AddOutcome {
        let outcome = if product.stock == 0 {
            AddOutcome::OutOfStock
        } else if let Some(line) = self.lines.iter_mut().find(|line| line.id == product.id) {
            let current = line.quantity;
            line.name = product.name;
            line.price = product.price;
            line.stock = product.stock;
            line.quantity = current.saturating_add(1).min(line.stock);
            if line.quantity > current {
                AddOutcome::Incremented {
                    quantity: line.quantity,
                }
            } else {
                AddOutcome::AtStockLimit {
                    quantity: line.quantity,
                }
            }
        } else {
            self.lines.push(CartLine {
                id: product.id,
                name: product.name,
                price: product.price,
                stock: product.stock,
                quantity: 1,
            });
            AddOutcome::Added
        };

        tracing::debug!(product_id = %product.id, outcome = ?outcome, "cart add");
        self.sync();
        outcome
    }

    pub fn remove_item(&mut self, id: ProductId) -> bool {
        let before = self.lines.len();
        self.lines.retain(|line| line.id != id);
        let removed = self.lines.len() != before;
        self.sync();
        removed
    }

    /// Applies `delta` unless the result would leave `1..=stock`; returns
    /// whether the quantity changed.
    pub fn adjust_quantity(&mut self, id: ProductId, delta: i64) -> bool {
        let mut applied = false;
        if let Some(line) = self.lines.iter_mut().find(|line| line.id == id) {
            let next = i64::from(line.quantity)
                .checked_add(delta)
                .filter(|next| *next > 0 && *next <= i64::from(line.stock))
                .and_then(|next| u32::try_from(next).ok());
            if let Some(next) = next {
                line.quantity = next;
                applied = true;
            }
        }
        self.sync();
        applied
    }

    pub fn total(&self) -> Decimal {
        self.lines.iter().map(CartLine::subtotal).sum()
    }

    pub fn clear(&mut self) {
        self.lines.clear();
        if let Err(err) = self.store.remove(CART_STORAGE_KEY) {
            tracing::warn!(error = %err, "cart mirror erase failed");
        }
    }

    fn sync(&mut self) {
        if let Err(err) = self.write_mirror() {
            tracing::warn!(error = %err, "cart mirror write failed");
        }
    }

    fn write_mirror(&mut self) -> Result<(), StorageError> {
        let raw = serde_json::to_string(&self.lines)?;
        self.store.set(CART_STORAGE_KEY, &raw)
    }
}

fn parse_lines(raw: &str) -> Vec<CartLine> {
    let lines: Vec<CartLine> = match serde_json::from_str(raw) {
        Ok(lines) => lines,
        Err(err) => {
            tracing::warn!(error = %err, "cart mirror malformed, starting empty");
            return Vec::new();
        }
    };

    let mut seen = HashSet::new();
    let consistent = lines
        .iter()
        .all(|line| line.quantity >= 1 && line.quantity <= line.stock && seen.insert(line.id));
    if !consistent {
        tracing::warn!("cart mirror violates line invariants, starting empty");
        return Vec::new();
    }
    lines
}
