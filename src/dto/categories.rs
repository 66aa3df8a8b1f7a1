use serde::Deserialize;

use crate::{api::form::FormFields, dto::FormPayload, models::CategoryId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCategory {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
}

impl CategoryUpdate {
    pub fn is_empty(&self) -> bool {
        self.to_form().is_empty()
    }
}

impl FormPayload for NewCategory {
    fn to_form(&self) -> FormFields {
        FormFields::new()
            .text("name", &self.name)
            .opt("description", self.description.as_deref())
    }
}

impl FormPayload for CategoryUpdate {
    fn to_form(&self) -> FormFields {
        FormFields::new()
            .opt("name", self.name.as_deref())
            .opt("description", self.description.as_deref())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CategoryCreated {
    #[serde(default)]
    pub message: Option<String>,
    pub category_id: CategoryId,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CategoryUpdated {
    #[serde(default)]
    pub message: Option<String>,
    pub category_id: CategoryId,
}
