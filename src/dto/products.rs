use rust_decimal::Decimal;
use serde::Deserialize;

use crate::{
    api::form::FormFields,
    dto::FormPayload,
    models::{CategoryId, ProductId},
};

#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    pub name: String,
    pub price: Decimal,
    pub category_id: CategoryId,
    pub description: Option<String>,
    pub stock: u32,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub price: Option<Decimal>,
    pub stock: Option<u32>,
    pub description: Option<String>,
    pub image_url: Option<String>,
}

impl ProductUpdate {
    pub fn is_empty(&self) -> bool {
        self.to_form().is_empty()
    }
}

impl FormPayload for NewProduct {
    fn to_form(&self) -> FormFields {
        FormFields::new()
            .text("name", &self.name)
            .value("price", self.price)
            .value("category_id", self.category_id)
            .opt("description", self.description.as_deref())
            .value("stock", self.stock)
            .opt("image_url", self.image_url.as_deref())
    }
}

impl FormPayload for ProductUpdate {
    fn to_form(&self) -> FormFields {
        FormFields::new()
            .opt("name", self.name.as_deref())
            .opt("price", self.price)
            .opt("stock", self.stock)
            .opt("description", self.description.as_deref())
            .opt("image_url", self.image_url.as_deref())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProductCreated {
    #[serde(default)]
    pub message: Option<String>,
    pub product_id: ProductId,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProductUpdated {
    #[serde(default)]
    pub message: Option<String>,
    pub product_id: ProductId,
}
