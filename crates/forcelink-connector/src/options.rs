//! Per-operation options.
//!
//! Field names follow the connector's wire format; the capitalised and
//! camelCase spellings (`Entity`, `SOSQL`, `objectClass`, `_kidozen`, ...)
//! are accepted as aliases when deserializing.

use forcelink_config::Credentials;
use forcelink_types::{FindOptions, FindQuery, UserMetadata};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::{ConnectorError, Result};
use crate::session::AuthToken;

/// Options accepted by every connector operation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OperationOptions {
    /// Token returned by `authenticate`.
    pub auth: Option<AuthToken>,
    /// Per-call credentials, used when no token is given.
    pub credentials: Option<Credentials>,
    #[serde(alias = "useOAuthJwtFlow")]
    pub use_oauth_jwt_flow: Option<bool>,
    #[serde(alias = "Entity")]
    pub entity: Option<String>,
    #[serde(alias = "Fields", deserialize_with = "field_list")]
    pub fields: Option<Vec<String>>,
    #[serde(alias = "Conditions")]
    pub conditions: Option<Value>,
    #[serde(alias = "Options")]
    pub options: Option<FindOptions>,
    #[serde(alias = "Details")]
    pub details: Option<Value>,
    #[serde(alias = "ExternalIdName")]
    pub external_id_name: Option<String>,
    #[serde(alias = "SOSQL", alias = "SOQL")]
    pub soql: Option<String>,
    #[serde(alias = "objectClass")]
    pub object_class: Option<String>,
    #[serde(alias = "_kidozen")]
    pub metadata: Option<UserMetadata>,
}

impl OperationOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_auth(mut self, auth: impl Into<AuthToken>) -> Self {
        self.auth = Some(auth.into());
        self
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn with_jwt_flow(mut self, enabled: bool) -> Self {
        self.use_oauth_jwt_flow = Some(enabled);
        self
    }

    pub fn with_entity(mut self, entity: impl Into<String>) -> Self {
        self.entity = Some(entity.into());
        self
    }

    pub fn with_fields(mut self, fields: Vec<String>) -> Self {
        self.fields = Some(fields);
        self
    }

    pub fn with_conditions(mut self, conditions: Value) -> Self {
        self.conditions = Some(conditions);
        self
    }

    pub fn with_find_options(mut self, options: FindOptions) -> Self {
        self.options = Some(options);
        self
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn with_external_id_name(mut self, name: impl Into<String>) -> Self {
        self.external_id_name = Some(name.into());
        self
    }

    pub fn with_soql(mut self, soql: impl Into<String>) -> Self {
        self.soql = Some(soql.into());
        self
    }

    pub fn with_object_class(mut self, object_class: impl Into<String>) -> Self {
        self.object_class = Some(object_class.into());
        self
    }

    pub fn with_metadata(mut self, metadata: UserMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Per-call credentials with the operation-level JWT flag folded in.
    pub(crate) fn call_credentials(&self) -> Credentials {
        let mut credentials = self.credentials.clone().unwrap_or_default();
        if self.use_oauth_jwt_flow == Some(true) {
            credentials.use_oauth_jwt_flow = Some(true);
        }
        credentials
    }

    pub(crate) fn require_entity(&self) -> Result<&str> {
        required(self.entity.as_deref(), "entity")
    }

    pub(crate) fn require_details(&self) -> Result<&Value> {
        self.details
            .as_ref()
            .filter(|d| !d.is_null())
            .ok_or_else(|| missing("details"))
    }

    pub(crate) fn require_external_id_name(&self) -> Result<&str> {
        required(self.external_id_name.as_deref(), "externalIdName")
    }

    pub(crate) fn require_object_class(&self) -> Result<&str> {
        required(self.object_class.as_deref(), "objectClass")
    }

    /// Find request for a condition-object query.
    pub(crate) fn find_query(&self) -> Result<FindQuery> {
        let mut query = FindQuery::new(self.require_entity()?);
        query.conditions = self.conditions.clone();
        query.fields = self.fields.clone();
        query.options = self.options.clone().unwrap_or_default();
        Ok(query)
    }
}

fn required<'a>(value: Option<&'a str>, name: &str) -> Result<&'a str> {
    value.filter(|v| !v.is_empty()).ok_or_else(|| missing(name))
}

fn missing(name: &str) -> ConnectorError {
    ConnectorError::Validation(format!("'{}' property is missing or invalid.", name))
}

/// Fields arrive either as a list or as a comma-separated string.
fn field_list<'de, D>(deserializer: D) -> std::result::Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Fields {
        List(Vec<String>),
        Joined(String),
    }

    Ok(Option::<Fields>::deserialize(deserializer)?.map(|fields| match fields {
        Fields::List(list) => list,
        Fields::Joined(joined) => joined
            .split(',')
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .map(str::to_string)
            .collect(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_accepts_wire_spellings() {
        let options: OperationOptions = serde_json::from_value(json!({
            "auth": "tok",
            "Entity": "Account",
            "Fields": "Id, Name",
            "Conditions": { "Name": "Acme" },
            "Options": { "limit": 5 },
            "useOAuthJwtFlow": true,
            "_kidozen": { "userClaims": [{ "type": "upn", "value": "u@x.com" }] }
        }))
        .unwrap();

        assert_eq!(options.auth, Some(AuthToken::from("tok")));
        assert_eq!(options.entity.as_deref(), Some("Account"));
        assert_eq!(
            options.fields,
            Some(vec!["Id".to_string(), "Name".to_string()])
        );
        assert_eq!(options.options.as_ref().unwrap().limit, Some(5));
        assert_eq!(options.use_oauth_jwt_flow, Some(true));
        assert_eq!(
            options.metadata.as_ref().unwrap().claim("upn"),
            Some("u@x.com")
        );
    }

    #[test]
    fn test_sosql_and_object_class_aliases() {
        let options: OperationOptions = serde_json::from_value(json!({
            "SOSQL": "SELECT Id FROM Account",
            "objectClass": "Contact",
            "ExternalIdName": "Ext__c",
            "Details": { "Ext__c": "1" }
        }))
        .unwrap();
        assert_eq!(options.soql.as_deref(), Some("SELECT Id FROM Account"));
        assert_eq!(options.require_object_class().unwrap(), "Contact");
        assert_eq!(options.require_external_id_name().unwrap(), "Ext__c");
        assert!(options.require_details().is_ok());
    }

    #[test]
    fn test_missing_fields_are_validation_errors() {
        let options = OperationOptions::new();
        let err = options.require_entity().unwrap_err();
        assert!(err.is_validation());
        assert_eq!(err.to_string(), "'entity' property is missing or invalid.");

        let null_details = OperationOptions::new().with_details(Value::Null);
        assert!(null_details.require_details().is_err());
    }

    #[test]
    fn test_call_credentials_folds_jwt_flag() {
        let options = OperationOptions::new().with_jwt_flow(true);
        assert_eq!(options.call_credentials().use_oauth_jwt_flow, Some(true));

        let options = OperationOptions::new()
            .with_credentials(Credentials::password_login("a@x.com", "p1"));
        let credentials = options.call_credentials();
        assert_eq!(credentials.username.as_deref(), Some("a@x.com"));
        assert_eq!(credentials.use_oauth_jwt_flow, None);
    }

    #[test]
    fn test_find_query_carries_options() {
        let query = OperationOptions::new()
            .with_entity("Lead")
            .with_fields(vec!["Id".into()])
            .with_conditions(json!({ "Status": "Open" }))
            .with_find_options(FindOptions {
                limit: Some(1),
                ..FindOptions::default()
            })
            .find_query()
            .unwrap();
        assert_eq!(query.entity, "Lead");
        assert_eq!(query.options.limit, Some(1));
    }
}
