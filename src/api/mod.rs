use std::time::Instant;

use async_trait::async_trait;
use mockall::automock;
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use tracing::Instrument;
use uuid::Uuid;

use crate::{
    dto::{
        Acknowledged, FormPayload,
        categories::{CategoryCreated, CategoryUpdate, CategoryUpdated, NewCategory},
        orders::{NewOrder, NewOrderItem, OrderCreated, OrderItemCreated},
        products::{NewProduct, ProductCreated, ProductUpdate, ProductUpdated},
    },
    error::{ApiError, ApiResult},
    models::{Category, CategoryId, Product, ProductId},
};

pub mod form;

use form::FormFields;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// HTTP client for the storefront REST API.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    http: Client,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    pub fn with_client(base_url: impl Into<String>, http: Client) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { base_url, http }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        self.send(Method::GET, path, None).await
    }

    async fn post_form<T: DeserializeOwned>(&self, path: &str, form: FormFields) -> ApiResult<T> {
        self.send(Method::POST, path, Some(form)).await
    }

    async fn patch_form<T: DeserializeOwned>(&self, path: &str, form: FormFields) -> ApiResult<T> {
        self.send(Method::PATCH, path, Some(form)).await
    }

    async fn delete<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        self.send(Method::DELETE, path, None).await
    }

    async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        form: Option<FormFields>,
    ) -> ApiResult<T> {
        let request_id = Uuid::new_v4();
        let span = tracing::info_span!(
            "api_request",
            method = %method,
            path = %path,
            request_id = %request_id
        );
        self.execute(method, path, form, request_id)
            .instrument(span)
            .await
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        form: Option<FormFields>,
        request_id: Uuid,
    ) -> ApiResult<T> {
        tracing::debug!("request started");
        let started = Instant::now();

        let mut request = self
            .http
            .request(method, self.url(path))
            .header(REQUEST_ID_HEADER, request_id.to_string());
        if let Some(form) = form {
            request = request.multipart(form.into_multipart());
        }

        let response = request.send().await.inspect_err(|err| {
            tracing::error!(error = %err, "request failed");
        })?;
        let status = response.status();
        let body = response.bytes().await?;

        tracing::info!(
            status = %status,
            ms = %started.elapsed().as_millis(),
            "request finished"
        );

        if !status.is_success() {
            let message = error_message(status, &body);
            tracing::warn!(status = %status, message = %message, "api rejected request");
            return Err(ApiError::Status { status, message });
        }

        serde_json::from_slice(&body).map_err(|err| {
            tracing::warn!(error = %err, "malformed response body");
            ApiError::Decode(err.to_string())
        })
    }
}

// FastAPI reports failures as `{"detail": "..."}`; other servers use `message`.
fn error_message(status: StatusCode, body: &[u8]) -> String {
    let parsed: Option<serde_json::Value> = serde_json::from_slice(body).ok();
    parsed
        .as_ref()
        .and_then(|value| {
            ["detail", "message"]
                .iter()
                .find_map(|key| value.get(*key).and_then(|v| v.as_str()))
        })
        .filter(|message| !message.trim().is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("request failed with status {status}"))
}

#[automock]
#[async_trait]
pub trait OrderApi: Send + Sync {
    async fn create_order(&self, order: NewOrder) -> ApiResult<OrderCreated>;

    async fn create_order_item(&self, item: NewOrderItem) -> ApiResult<OrderItemCreated>;
}

#[automock]
#[async_trait]
pub trait CatalogApi: Send + Sync {
    async fn list_categories(&self) -> ApiResult<Vec<Category>>;

    async fn get_category(&self, id: CategoryId) -> ApiResult<Category>;

    async fn list_category_products(&self, id: CategoryId) -> ApiResult<Vec<Product>>;

    async fn create_category(&self, category: NewCategory) -> ApiResult<CategoryCreated>;

    async fn update_category(
        &self,
        id: CategoryId,
        update: CategoryUpdate,
    ) -> ApiResult<CategoryUpdated>;

    async fn delete_category(&self, id: CategoryId) -> ApiResult<Acknowledged>;

    async fn list_products(&self) -> ApiResult<Vec<Product>>;

    async fn get_product(&self, id: ProductId) -> ApiResult<Product>;

    async fn create_product(&self, product: NewProduct) -> ApiResult<ProductCreated>;

    async fn update_product(
        &self,
        id: ProductId,
        update: ProductUpdate,
    ) -> ApiResult<ProductUpdated>;

    async fn delete_product(&self, id: ProductId) -> ApiResult<Acknowledged>;
}

#[async_trait]
impl OrderApi for ApiClient {
    async fn create_order(&self, order: NewOrder) -> ApiResult<OrderCreated> {
        self.post_form("/orders", order.to_form()).await
    }

    async fn create_order_item(&self, item: NewOrderItem) -> ApiResult<OrderItemCreated> {
        self.post_form("/order_items", item.to_form()).await
    }
}

#[async_trait]
impl CatalogApi for ApiClient {
    async fn list_categories(&self) -> ApiResult<Vec<Category>> {
        self.get_json("/categories").await
    }

    async fn get_category(&self, id: CategoryId) -> ApiResult<Category> {
        self.get_json(&format!("/categories/{id}")).await
    }

    async fn list_category_products(&self, id: CategoryId) -> ApiResult<Vec<Product>> {
        self.get_json(&format!("/categories/{id}/products")).await
    }

    async fn create_category(&self, category: NewCategory) -> ApiResult<CategoryCreated> {
        self.post_form("/categories", category.to_form()).await
    }

    async fn update_category(
        &self,
        id: CategoryId,
        update: CategoryUpdate,
    ) -> ApiResult<CategoryUpdated> {
        self.patch_form(&format!("/categories/{id}"), update.to_form()).await
    }

    async fn delete_category(&self, id: CategoryId) -> ApiResult<Acknowledged> {
        self.delete(&format!("/categories/{id}")).await
    }

    async fn list_products(&self) -> ApiResult<Vec<Product>> {
        self.get_json("/products").await
    }

    async fn get_product(&self, id: ProductId) -> ApiResult<Product> {
        self.get_json(&format!("/products/{id}")).await
    }

    async fn create_product(&self, product: NewProduct) -> ApiResult<ProductCreated> {
        self.post_form("/products", product.to_form()).await
    }

    async fn update_product(
        &self,
        id: ProductId,
        update: ProductUpdate,
    ) -> ApiResult<ProductUpdated> {
        self.patch_form(&format!("/products/{id}"), update.to_form()).await
    }

    async fn delete_product(&self, id: ProductId) -> ApiResult<Acknowledged> {
        self.delete(&format!("/products/{id}")).await
    }
}
