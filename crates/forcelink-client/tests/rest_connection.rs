//! HTTP-level tests for logins and REST data calls.

use forcelink_client::RestConnectionFactory;
use forcelink_types::{
    Connection, ConnectionError, ConnectionFactory, FindQuery, LoginOptions, OAuth2Client,
    SharedConnection,
};
use serde_json::json;
use wiremock::matchers::{body_json, body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SESSION_ID: &str = "00D000000000001!AQ4AQ.session";

fn login_options(server: &MockServer) -> LoginOptions {
    let mut options = LoginOptions::for_environment(false);
    options.login_url = server.uri();
    options
}

fn soap_login_ok(server: &MockServer) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<soapenv:Envelope xmlns:soapenv="http://schemas.xmlsoap.org/soap/envelope/" xmlns="urn:partner.soap.sforce.com">
<soapenv:Body><loginResponse><result>
<serverUrl>{}/services/Soap/u/42.0/00D000000000001</serverUrl>
<sessionId>{}</sessionId>
</result></loginResponse></soapenv:Body></soapenv:Envelope>"#,
        server.uri(),
        SESSION_ID
    )
}

fn factory() -> RestConnectionFactory {
    RestConnectionFactory::builder().build().unwrap()
}

fn connection(server: &MockServer) -> SharedConnection {
    factory().from_access_token(&server.uri(), SESSION_ID, "42.0")
}

#[tokio::test]
async fn test_soap_login_then_query() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/services/Soap/u/42.0"))
        .and(header("SOAPAction", "login"))
        .and(body_string_contains("<username>a@x.com</username>"))
        .respond_with(ResponseTemplate::new(200).set_body_string(soap_login_ok(&server)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/services/data/v42.0/query"))
        .and(query_param("q", "SELECT Id FROM Account"))
        .and(header("authorization", format!("Bearer {}", SESSION_ID).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "totalSize": 1,
            "done": true,
            "records": [{ "Id": "001000000000001AAA" }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let conn = factory()
        .login(&login_options(&server), "a@x.com", "p1")
        .await
        .unwrap();
    assert_eq!(conn.instance_url(), server.uri());

    let result = conn.query("SELECT Id FROM Account").await.unwrap();
    assert_eq!(result["totalSize"], 1);
}

#[tokio::test]
async fn test_soap_login_fault_is_auth_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/services/Soap/u/42.0"))
        .respond_with(ResponseTemplate::new(500).set_body_string(
            r#"<soapenv:Envelope xmlns:soapenv="http://schemas.xmlsoap.org/soap/envelope/"><soapenv:Body><soapenv:Fault>
<faultcode>sf:INVALID_LOGIN</faultcode>
<faultstring>INVALID_LOGIN: Invalid username, password, security token; or user locked out.</faultstring>
</soapenv:Fault></soapenv:Body></soapenv:Envelope>"#,
        ))
        .mount(&server)
        .await;

    let err = factory()
        .login(&login_options(&server), "a@x.com", "wrong")
        .await
        .unwrap_err();
    assert!(matches!(err, ConnectionError::Auth(ref m) if m.starts_with("INVALID_LOGIN")));
}

#[tokio::test]
async fn test_oauth2_password_grant() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/services/oauth2/token"))
        .and(body_string_contains("grant_type=password"))
        .and(body_string_contains("client_secret=s3cret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": SESSION_ID,
            "instance_url": server.uri(),
            "token_type": "Bearer"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let options = login_options(&server).with_oauth2(Some(OAuth2Client {
        client_id: Some("cid".into()),
        client_secret: Some("s3cret".into()),
        redirect_uri: None,
    }));
    let conn = factory().login(&options, "a@x.com", "p1").await.unwrap();
    assert_eq!(conn.instance_url(), server.uri());
}

#[tokio::test]
async fn test_oauth2_password_grant_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/services/oauth2/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant",
            "error_description": "authentication failure"
        })))
        .mount(&server)
        .await;

    let options = login_options(&server).with_oauth2(Some(OAuth2Client {
        client_id: Some("cid".into()),
        client_secret: Some("s3cret".into()),
        redirect_uri: None,
    }));
    let err = factory().login(&options, "a@x.com", "bad").await.unwrap_err();
    assert_eq!(err.to_string(), "authentication failure");
}

#[tokio::test]
async fn test_find_builds_soql() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/services/data/v42.0/query"))
        .and(query_param(
            "q",
            "SELECT Id, Name FROM Account WHERE Name = 'Acme' LIMIT 1",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "records": [] })))
        .expect(1)
        .mount(&server)
        .await;

    let mut query = FindQuery::new("Account")
        .with_fields(vec!["Id".into(), "Name".into()])
        .with_conditions(json!({ "Name": "Acme" }));
    query.options.limit = Some(1);

    connection(&server).find(&query).await.unwrap();
}

#[tokio::test]
async fn test_describe_and_describe_global() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/services/data/v42.0/sobjects/Account/describe"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "name": "Account" })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/services/data/v42.0/sobjects"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "sobjects": [] })))
        .mount(&server)
        .await;

    let conn = connection(&server);
    assert_eq!(conn.describe("Account").await.unwrap()["name"], "Account");
    assert!(conn.describe_global().await.unwrap()["sobjects"].is_array());
}

#[tokio::test]
async fn test_create_single_and_collection() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/services/data/v42.0/sobjects/Contact"))
        .and(body_json(json!({ "LastName": "Doe" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "003000000000001AAA", "success": true, "errors": []
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/services/data/v42.0/composite/sobjects"))
        .and(body_json(json!({
            "allOrNone": false,
            "records": [
                { "LastName": "A", "attributes": { "type": "Contact" } },
                { "LastName": "B", "attributes": { "type": "Contact" } }
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": "003A", "success": true, "errors": [] },
            { "id": "003B", "success": true, "errors": [] }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let conn = connection(&server);
    let one = conn
        .create("Contact", &json!({ "LastName": "Doe" }))
        .await
        .unwrap();
    assert_eq!(one["id"], "003000000000001AAA");

    let many = conn
        .create("Contact", &json!([{ "LastName": "A" }, { "LastName": "B" }]))
        .await
        .unwrap();
    assert_eq!(many.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_update_single_record() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/services/data/v42.0/sobjects/Account/001A"))
        .and(body_json(json!({ "Name": "Renamed" })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let result = connection(&server)
        .update("Account", &json!({ "Id": "001A", "Name": "Renamed" }))
        .await
        .unwrap();
    assert_eq!(result, json!({ "id": "001A", "success": true, "errors": [] }));
}

#[tokio::test]
async fn test_update_requires_id() {
    let server = MockServer::start().await;
    let err = connection(&server)
        .update("Account", &json!({ "Name": "No Id" }))
        .await
        .unwrap_err();
    assert!(matches!(err, ConnectionError::InvalidRequest(_)));
}

#[tokio::test]
async fn test_upsert_by_external_id() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/services/data/v42.0/sobjects/Account/Ext_Id__c/X-1"))
        .and(body_json(json!({ "Name": "Acme" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "001X", "success": true, "errors": [], "created": true
        })))
        .expect(1)
        .mount(&server)
        .await;

    let result = connection(&server)
        .upsert(
            "Account",
            &json!({ "Ext_Id__c": "X-1", "Name": "Acme" }),
            "Ext_Id__c",
        )
        .await
        .unwrap();
    assert_eq!(result["created"], true);
}

#[tokio::test]
async fn test_destroy_many() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/services/data/v42.0/composite/sobjects"))
        .and(query_param("ids", "001A,001B"))
        .and(query_param("allOrNone", "false"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": "001A", "success": true, "errors": [] },
            { "id": "001B", "success": true, "errors": [] }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let result = connection(&server)
        .destroy("Account", &json!(["001A", { "Id": "001B" }]))
        .await
        .unwrap();
    assert_eq!(result.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_api_error_passes_through() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/services/data/v42.0/query"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!([{
            "message": "unexpected token: FORM",
            "errorCode": "MALFORMED_QUERY"
        }])))
        .mount(&server)
        .await;

    let err = connection(&server)
        .query("SELECT Id FORM Account")
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "MALFORMED_QUERY: unexpected token: FORM");
}

#[tokio::test]
async fn test_logout_revokes_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/services/oauth2/revoke"))
        .and(body_string_contains("token=00D000000000001%21AQ4AQ.session"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    connection(&server).logout().await.unwrap();
}
