use serde::Deserialize;

use crate::api::form::FormFields;

pub mod categories;
pub mod orders;
pub mod products;

// Write payloads travel as multipart form fields.
pub trait FormPayload {
    fn to_form(&self) -> FormFields;
}

// DELETE responses carry only a message.
#[derive(Debug, Clone, Deserialize)]
pub struct Acknowledged {
    #[serde(default)]
    pub message: Option<String>,
}
