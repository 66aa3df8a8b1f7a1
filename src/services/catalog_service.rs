use rust_decimal::Decimal;
use tokio::sync::broadcast;

use crate::{
    api::CatalogApi,
    dto::{
        categories::{CategoryUpdate, NewCategory},
        products::{NewProduct, ProductUpdate},
    },
    error::ApiResult,
    models::{Category, CategoryId, Product, ProductId},
};

const EVENT_CAPACITY: usize = 32;

/// Published after every successful catalog write so list views can refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogEvent {
    CategoryCreated(CategoryId),
    CategoryUpdated(CategoryId),
    CategoryDeleted(CategoryId),
    ProductCreated(ProductId),
    ProductUpdated(ProductId),
    ProductDeleted(ProductId),
}

pub const LOW_STOCK_THRESHOLD: u32 = 5;
pub const OVERVIEW_CATEGORIES: usize = 4;
pub const OVERVIEW_NEW_ARRIVALS: usize = 6;

#[derive(Debug, Clone, PartialEq)]
pub struct StoreAnalytics {
    pub product_count: usize,
    /// Products with fewer than [`LOW_STOCK_THRESHOLD`] units left, sold out included.
    pub low_stock: Vec<Product>,
    /// Sum of `price × stock` over every product.
    pub inventory_value: Decimal,
}

impl StoreAnalytics {
    pub fn from_products(products: Vec<Product>) -> Self {
        let inventory_value = products
            .iter()
            .map(|product| product.price * Decimal::from(product.stock))
            .sum();
        let product_count = products.len();
        let low_stock = products
            .into_iter()
            .filter(|product| product.stock < LOW_STOCK_THRESHOLD)
            .collect();
        Self {
            product_count,
            low_stock,
            inventory_value,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoreOverview {
    pub category_count: usize,
    pub featured_categories: Vec<Category>,
    /// The last products in listing order, which the API returns oldest first.
    pub new_arrivals: Vec<Product>,
}

impl StoreOverview {
    pub fn new(mut categories: Vec<Category>, products: Vec<Product>) -> Self {
        let category_count = categories.len();
        categories.truncate(OVERVIEW_CATEGORIES);
        let skip = products.len().saturating_sub(OVERVIEW_NEW_ARRIVALS);
        Self {
            category_count,
            featured_categories: categories,
            new_arrivals: products.into_iter().skip(skip).collect(),
        }
    }
}

/// Category and product browsing plus admin writes.
///
/// Reads never fail: an API error is logged and shows up as an empty list
/// (or `None`). Writes return the error to the caller untouched.
#[derive(Debug)]
pub struct Catalog<A> {
    api: A,
    events: broadcast::Sender<CatalogEvent>,
}

impl<A: CatalogApi> Catalog<A> {
    pub fn new(api: A) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self { api, events }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CatalogEvent> {
        self.events.subscribe()
    }

    pub async fn categories(&self) -> Vec<Category> {
        self.api.list_categories().await.unwrap_or_else(|err| {
            tracing::error!(error = %err, "failed to list categories");
            Vec::new()
        })
    }

    pub async fn category(&self, id: CategoryId) -> Option<Category> {
        self.api
            .get_category(id)
            .await
            .inspect_err(|err| {
                tracing::error!(error = %err, category_id = %id, "failed to fetch category");
            })
            .ok()
    }

    pub async fn category_products(&self, id: CategoryId) -> Vec<Product> {
        self.api.list_category_products(id).await.unwrap_or_else(|err| {
            tracing::error!(error = %err, category_id = %id, "failed to list category products");
            Vec::new()
        })
    }

    pub async fn products(&self) -> Vec<Product> {
        self.api.list_products().await.unwrap_or_else(|err| {
            tracing::error!(error = %err, "failed to list products");
            Vec::new()
        })
    }

    /// Products a shopper can put in the cart right now.
    pub async fn available_products(&self) -> Vec<Product> {
        self.products()
            .await
            .into_iter()
            .filter(Product::in_stock)
            .collect()
    }

    pub async fn product(&self, id: ProductId) -> Option<Product> {
        self.api
            .get_product(id)
            .await
            .inspect_err(|err| {
                tracing::error!(error = %err, product_id = %id, "failed to fetch product");
            })
            .ok()
    }

    /// Stock summary for store managers. Built from the product listing, so
    /// an unreachable API yields an empty summary.
    pub async fn analytics(&self) -> StoreAnalytics {
        StoreAnalytics::from_products(self.products().await)
    }

    /// Landing-page view: the first few categories and the latest arrivals.
    pub async fn overview(&self) -> StoreOverview {
        let (categories, products) = tokio::join!(self.categories(), self.products());
        StoreOverview::new(categories, products)
    }

    pub async fn create_category(&self, category: NewCategory) -> ApiResult<CategoryId> {
        let created = self.api.create_category(category).await?;
        tracing::info!(
            category_id = %created.category_id,
            server_message = created.message.as_deref().unwrap_or_default(),
            "category created"
        );
        self.publish(CatalogEvent::CategoryCreated(created.category_id));
        Ok(created.category_id)
    }

    pub async fn update_category(&self, id: CategoryId, update: CategoryUpdate) -> ApiResult<()> {
        let updated = self.api.update_category(id, update).await?;
        tracing::info!(
            category_id = %updated.category_id,
            server_message = updated.message.as_deref().unwrap_or_default(),
            "category updated"
        );
        self.publish(CatalogEvent::CategoryUpdated(updated.category_id));
        Ok(())
    }

    pub async fn delete_category(&self, id: CategoryId) -> ApiResult<()> {
        let ack = self.api.delete_category(id).await?;
        tracing::info!(
            category_id = %id,
            server_message = ack.message.as_deref().unwrap_or_default(),
            "category deleted"
        );
        self.publish(CatalogEvent::CategoryDeleted(id));
        Ok(())
    }

    pub async fn create_product(&self, product: NewProduct) -> ApiResult<ProductId> {
        let created = self.api.create_product(product).await?;
        tracing::info!(
            product_id = %created.product_id,
            server_message = created.message.as_deref().unwrap_or_default(),
            "product created"
        );
        self.publish(CatalogEvent::ProductCreated(created.product_id));
        Ok(created.product_id)
    }

    pub async fn update_product(&self, id: ProductId, update: ProductUpdate) -> ApiResult<()> {
        let updated = self.api.update_product(id, update).await?;
        tracing::info!(
            product_id = %updated.product_id,
            server_message = updated.message.as_deref().unwrap_or_default(),
            "product updated"
        );
        self.publish(CatalogEvent::ProductUpdated(updated.product_id));
        Ok(())
    }

    pub async fn delete_product(&self, id: ProductId) -> ApiResult<()> {
        let ack = self.api.delete_product(id).await?;
        tracing::info!(
            product_id = %id,
            server_message = ack.message.as_deref().unwrap_or_default(),
            "product deleted"
        );
        self.publish(CatalogEvent::ProductDeleted(id));
        Ok(())
    }

    fn publish(&self, event: CatalogEvent) {
        // no subscribers is fine
        if self.events.send(event).is_err() {
            tracing::debug!(event = ?event, "catalog change had no listeners");
        }
    }
}
