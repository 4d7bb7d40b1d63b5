//! Mapping of transport failures and error payloads onto [`ConnectionError`].

use forcelink_types::ConnectionError;
use serde::Deserialize;

/// One entry of the error array the REST API answers failures with.
#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorItem {
    #[serde(rename = "errorCode")]
    pub error_code: String,
    pub message: String,
}

/// Error body of the OAuth2 token endpoint.
#[derive(Debug, Deserialize)]
pub(crate) struct OAuthErrorBody {
    pub error: String,
    #[serde(default)]
    pub error_description: Option<String>,
}

pub(crate) fn http_error(e: reqwest::Error) -> ConnectionError {
    ConnectionError::Http(e.to_string())
}

/// Extract an error from a failed REST response.
pub(crate) async fn extract_error(response: reqwest::Response) -> ConnectionError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    parse_error_body(status, &body)
}

pub(crate) fn parse_error_body(status: u16, body: &str) -> ConnectionError {
    match serde_json::from_str::<Vec<ApiErrorItem>>(body) {
        Ok(items) if !items.is_empty() => {
            let first = &items[0];
            ConnectionError::Api {
                status,
                code: first.error_code.clone(),
                message: first.message.clone(),
            }
        }
        _ => ConnectionError::Api {
            status,
            code: "UNKNOWN".to_string(),
            message: if body.is_empty() {
                format!("HTTP {}", status)
            } else {
                body.to_string()
            },
        },
    }
}
