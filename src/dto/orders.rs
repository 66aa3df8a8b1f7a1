use serde::Deserialize;

use crate::{
    api::form::FormFields,
    dto::FormPayload,
    models::{OrderId, OrderItemId, ProductId},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub customer_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrderItem {
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub quantity: u32,
}

impl FormPayload for NewOrder {
    fn to_form(&self) -> FormFields {
        FormFields::new().text("customer_name", &self.customer_name)
    }
}

impl FormPayload for NewOrderItem {
    fn to_form(&self) -> FormFields {
        FormFields::new()
            .value("order_id", self.order_id)
            .value("product_id", self.product_id)
            .value("quantity", self.quantity)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct OrderCreated {
    #[serde(default)]
    pub message: Option<String>,
    pub order_id: OrderId,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OrderItemCreated {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub order_item_id: Option<OrderItemId>,
}
