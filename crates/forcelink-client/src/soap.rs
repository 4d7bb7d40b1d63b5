//! Partner SOAP `login` call.
//!
//! Only the handful of elements the login response carries are needed, so the
//! envelope is built from a template and the response is scanned for the
//! known tags instead of going through a general XML parser.

use forcelink_types::{ConnectionError, Result};
use url::Url;

/// Session established by a SOAP login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoapSession {
    pub session_id: String,
    /// Scheme and host of the org's instance, e.g. `https://na1.salesforce.com`.
    pub instance_url: String,
}

/// Endpoint path of the partner login call.
pub fn login_path(api_version: &str) -> String {
    format!("/services/Soap/u/{}", api_version)
}

/// Request envelope for a username/password login.
pub fn login_envelope(username: &str, password: &str) -> String {
    format!(
        concat!(
            r#"<?xml version="1.0" encoding="utf-8" ?>"#,
            r#"<se:Envelope xmlns:se="http://schemas.xmlsoap.org/soap/envelope/">"#,
            r#"<se:Header/>"#,
            r#"<se:Body>"#,
            r#"<login xmlns="urn:partner.soap.sforce.com">"#,
            r#"<username>{}</username>"#,
            r#"<password>{}</password>"#,
            r#"</login>"#,
            r#"</se:Body>"#,
            r#"</se:Envelope>"#,
        ),
        escape(username),
        escape(password)
    )
}

/// Interpret a login response body.
///
/// A SOAP fault becomes [`ConnectionError::Auth`] carrying the fault string,
/// e.g. `INVALID_LOGIN: Invalid username, password, security token; or user
/// locked out.`
pub fn parse_login_response(body: &str) -> Result<SoapSession> {
    if let Some(fault) = element_text(body, "faultstring") {
        return Err(ConnectionError::Auth(fault));
    }

    let session_id = element_text(body, "sessionId")
        .ok_or_else(|| ConnectionError::Http("login response has no sessionId".to_string()))?;
    let server_url = element_text(body, "serverUrl")
        .ok_or_else(|| ConnectionError::Http("login response has no serverUrl".to_string()))?;

    Ok(SoapSession {
        session_id,
        instance_url: instance_origin(&server_url)?,
    })
}

/// `https://na1.salesforce.com/services/Soap/u/42.0/00D...` → `https://na1.salesforce.com`.
fn instance_origin(server_url: &str) -> Result<String> {
    let url = Url::parse(server_url)
        .map_err(|e| ConnectionError::Http(format!("invalid serverUrl '{}': {}", server_url, e)))?;
    Ok(url.origin().ascii_serialization())
}

/// Text of the first `<tag>` element, with or without a namespace prefix.
fn element_text(xml: &str, tag: &str) -> Option<String> {
    let mut rest = xml;
    while let Some(open) = rest.find('<') {
        rest = &rest[open + 1..];
        let end = rest.find('>')?;
        let head = &rest[..end];
        let name = head.split_whitespace().next().unwrap_or("");
        let local = name.rsplit(':').next().unwrap_or(name);
        if local == tag && !head.ends_with('/') {
            let content = &rest[end + 1..];
            let close = content.find("</")?;
            return Some(unescape(&content[..close]));
        }
        rest = &rest[end + 1..];
    }
    None
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

fn unescape(s: &str) -> String {
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
