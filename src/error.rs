use reqwest::StatusCode;
use thiserror::Error;

use crate::models::{OrderId, ProductId};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("{message}")]
    Status { status: StatusCode, message: String },

    #[error("unexpected response: {0}")]
    Decode(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage io error")]
    Io(#[from] std::io::Error),

    #[error("storage encoding error")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("failed to create order: {0}")]
    OrderCreation(#[source] ApiError),

    #[error("failed to add product {product_id} (line {index}) to order {order_id}: {source}")]
    OrderItem {
        index: usize,
        product_id: ProductId,
        order_id: OrderId,
        #[source]
        source: ApiError,
    },
}

impl CheckoutError {
    /// Index of the cart line whose order item was rejected, if any.
    pub fn failed_index(&self) -> Option<usize> {
        match self {
            CheckoutError::OrderCreation(_) => None,
            CheckoutError::OrderItem { index, .. } => Some(*index),
        }
    }
}
