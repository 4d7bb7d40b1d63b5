//! Request shapes for record-level operations.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Sort and paging options for a find.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FindOptions {
    #[serde(default)]
    pub limit: Option<u64>,
    #[serde(default)]
    pub offset: Option<u64>,
    /// Sort expression, e.g. `"-CreatedDate Name"` (leading `-` is descending).
    #[serde(default)]
    pub sort: Option<String>,
}

/// A find against one entity.
#[derive(Debug, Clone, PartialEq)]
pub struct FindQuery {
    pub entity: String,
    /// Condition object, `{ "Field": value }` or `{ "Field": { "$op": value } }`.
    pub conditions: Option<Value>,
    /// Fields to select. `None` selects `Id`.
    pub fields: Option<Vec<String>>,
    pub options: FindOptions,
}

impl FindQuery {
    pub fn new(entity: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            conditions: None,
            fields: None,
            options: FindOptions::default(),
        }
    }

    pub fn with_conditions(mut self, conditions: Value) -> Self {
        self.conditions = Some(conditions);
        self
    }

    pub fn with_fields(mut self, fields: Vec<String>) -> Self {
        self.fields = Some(fields);
        self
    }

    pub fn with_options(mut self, options: FindOptions) -> Self {
        self.options = options;
        self
    }
}

/// One identity claim about the end user on whose behalf a call is made.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserClaim {
    #[serde(rename = "type")]
    pub claim_type: String,
    pub value: String,
}

/// Caller metadata attached to an operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserMetadata {
    #[serde(default, alias = "userClaims")]
    pub user_claims: Option<Vec<UserClaim>>,
}

impl UserMetadata {
    /// Value of the first claim of the given type.
    pub fn claim(&self, claim_type: &str) -> Option<&str> {
        self.user_claims
            .as_ref()?
            .iter()
            .find(|c| c.claim_type == claim_type)
            .map(|c| c.value.as_str())
    }
}
