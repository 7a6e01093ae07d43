//! Client for the external account store
//!
//! The store contract is four JSON requests:
//!
//! | Operation | Method | Path        | Body                        |
//! |-----------|--------|-------------|-----------------------------|
//! | List      | POST   | `/data`     | none                        |
//! | Create    | POST   | `/accounts` | `{name, url, password}`     |
//! | Update    | PUT    | `/accounts` | `{id, name, url, password}` |
//! | Delete    | DELETE | `/accounts` | `{id}`                      |
//!
//! [`Transport`] is the seam between that contract and the wire; [`HttpTransport`]
//! speaks it over HTTP with reqwest.

use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, COOKIE};
use reqwest::{Client, Method};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use vaultweb_config::StoreConfig;

use crate::error::{CoreError, CoreResult};
use crate::models::{parse_account_list, Account, AccountDraft, AccountKey, AccountUpdate};

/// The four store operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    List,
    Create,
    Update,
    Delete,
}

impl Operation {
    pub fn method(&self) -> Method {
        match self {
            Operation::List | Operation::Create => Method::POST,
            Operation::Update => Method::PUT,
            Operation::Delete => Method::DELETE,
        }
    }

    pub fn path(&self) -> &'static str {
        match self {
            Operation::List => "/data",
            Operation::Create | Operation::Update | Operation::Delete => "/accounts",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operation::List => write!(f, "list"),
            Operation::Create => write!(f, "create"),
            Operation::Update => write!(f, "update"),
            Operation::Delete => write!(f, "delete"),
        }
    }
}

/// A single request to the store
#[derive(Debug, Clone, PartialEq)]
pub struct StoreRequest {
    pub operation: Operation,
    pub body: Option<Value>,
}

impl StoreRequest {
    pub fn new(operation: Operation) -> Self {
        Self { operation, body: None }
    }

    pub fn with_body<T: Serialize>(operation: Operation, body: &T) -> CoreResult<Self> {
        let body = serde_json::to_value(body)
            .map_err(|e| CoreError::request_failed(operation, e.to_string()))?;
        Ok(Self {
            operation,
            body: Some(body),
        })
    }
}

/// Sends store requests; `Ok(None)` means the store answered with an empty body
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: StoreRequest) -> CoreResult<Option<Value>>;
}

/// Transport reference type
pub type TransportRef = Arc<dyn Transport>;

/// Store transport over HTTP
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
    cookie: Option<String>,
}

impl HttpTransport {
    /// Requests that get no complete answer within `timeout` fail
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> CoreResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CoreError::request_failed(Operation::List, e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            cookie: None,
        })
    }

    pub fn from_config(config: &StoreConfig) -> CoreResult<Self> {
        let transport = Self::new(config.base_url.as_str(), config.timeout())?;
        Ok(match &config.cookie {
            Some(cookie) => transport.with_cookie(cookie.as_str()),
            None => transport,
        })
    }

    /// Send `cookie` as the `Cookie` header of every request
    pub fn with_cookie(mut self, cookie: impl Into<String>) -> Self {
        self.cookie = Some(cookie.into());
        self
    }

    pub fn url_for(&self, operation: Operation) -> String {
        format!("{}{}", self.base_url, operation.path())
    }
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("base_url", &self.base_url)
            .field("cookie", &self.cookie.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: StoreRequest) -> CoreResult<Option<Value>> {
        let operation = request.operation;
        let url = self.url_for(operation);
        log::debug!("store request: {} {}", operation.method(), url);

        let mut builder = self
            .client
            .request(operation.method(), &url)
            .header(CONTENT_TYPE, "application/json");
        if let Some(cookie) = &self.cookie {
            builder = builder.header(COOKIE, cookie.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| CoreError::request_failed(operation, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CoreError::request_failed(operation, format!("HTTP {}", status)));
        }

        let text = response
            .text()
            .await
            .map_err(|e| CoreError::request_failed(operation, e.to_string()))?;
        if text.trim().is_empty() {
            return Ok(None);
        }

        serde_json::from_str(&text)
            .map(Some)
            .map_err(|e| CoreError::request_failed(operation, format!("invalid JSON: {}", e)))
    }
}

/// Typed operations over a [`Transport`]
#[derive(Clone)]
pub struct Store {
    transport: TransportRef,
}

impl Store {
    pub fn new(transport: TransportRef) -> Self {
        Self { transport }
    }

    /// Fetch every account, in the order the store returns them
    pub async fn list(&self) -> CoreResult<Vec<Account>> {
        let body = self.transport.send(StoreRequest::new(Operation::List)).await?;
        let body = body.ok_or_else(|| {
            CoreError::request_failed(Operation::List, "empty listing response")
        })?;
        parse_account_list(body)
    }

    pub async fn create(&self, draft: &AccountDraft) -> CoreResult<()> {
        self.send_expecting_json(StoreRequest::with_body(Operation::Create, draft)?)
            .await
    }

    pub async fn update(&self, update: &AccountUpdate) -> CoreResult<()> {
        self.send_expecting_json(StoreRequest::with_body(Operation::Update, update)?)
            .await
    }

    /// The store may answer a deletion with an empty body
    pub async fn delete(&self, id: &str) -> CoreResult<()> {
        let key = AccountKey { id: id.to_string() };
        self.transport
            .send(StoreRequest::with_body(Operation::Delete, &key)?)
            .await?;
        Ok(())
    }

    async fn send_expecting_json(&self, request: StoreRequest) -> CoreResult<()> {
        let operation = request.operation;
        match self.transport.send(request).await? {
            Some(_) => Ok(()),
            None => Err(CoreError::request_failed(operation, "empty response")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryTransport;
    use axum::extract::State;
    use axum::http::{HeaderMap, StatusCode, Uri};
    use serde_json::json;
    use std::sync::Mutex;

    #[test]
    fn test_operation_routes() {
        assert_eq!(Operation::List.method(), Method::POST);
        assert_eq!(Operation::List.path(), "/data");
        assert_eq!(Operation::Create.method(), Method::POST);
        assert_eq!(Operation::Update.method(), Method::PUT);
        assert_eq!(Operation::Delete.method(), Method::DELETE);
        assert_eq!(Operation::Delete.path(), "/accounts");
    }

    #[test]
    fn test_http_transport_urls() {
        let transport = HttpTransport::new("http://127.0.0.1:5000/", Duration::from_secs(1)).unwrap();
        assert_eq!(transport.url_for(Operation::List), "http://127.0.0.1:5000/data");
        assert_eq!(transport.url_for(Operation::Update), "http://127.0.0.1:5000/accounts");
    }

    #[tokio::test]
    async fn test_list_in_store_order() {
        let transport = Arc::new(MemoryTransport::with_listing(json!({
            "b": {"name": "B", "url": "b.io", "password": "x"},
            "a": {"name": "A", "url": "a.io", "password": "y"}
        })));
        let store = Store::new(transport.clone());

        let accounts = store.list().await.unwrap();
        assert_eq!(accounts.len(), 2);
        assert_eq!(accounts[0].id, "b");
        assert_eq!(accounts[1].name, "A");
        assert_eq!(transport.calls(), vec![StoreRequest::new(Operation::List)]);
    }

    #[tokio::test]
    async fn test_create_sends_exact_body() {
        let transport = Arc::new(MemoryTransport::new());
        let store = Store::new(transport.clone());

        store.create(&AccountDraft::new("X", "x.com", "pw")).await.unwrap();

        let calls = transport.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].operation, Operation::Create);
        assert_eq!(calls[0].body, Some(json!({"name": "X", "url": "x.com", "password": "pw"})));
    }

    #[tokio::test]
    async fn test_update_sends_id() {
        let transport = Arc::new(MemoryTransport::with_listing(json!({
            "1": {"name": "Bank", "url": "bank.com", "password": "old"}
        })));
        let store = Store::new(transport.clone());

        let update = AccountUpdate {
            id: "1".to_string(),
            name: "Bank".to_string(),
            url: "bank.com".to_string(),
            password: "new".to_string(),
        };
        store.update(&update).await.unwrap();

        assert_eq!(
            transport.calls()[0].body,
            Some(json!({"id": "1", "name": "Bank", "url": "bank.com", "password": "new"}))
        );
        assert_eq!(store.list().await.unwrap()[0].password, "new");
    }

    #[tokio::test]
    async fn test_delete_accepts_empty_response() {
        let transport = Arc::new(MemoryTransport::new());
        transport.answer_empty(Operation::Delete);
        let store = Store::new(transport.clone());

        store.delete("7").await.unwrap();
        assert_eq!(transport.calls()[0].body, Some(json!({"id": "7"})));
    }

    #[tokio::test]
    async fn test_create_rejects_empty_response() {
        let transport = Arc::new(MemoryTransport::new());
        transport.answer_empty(Operation::Create);
        let store = Store::new(transport);

        let err = store.create(&AccountDraft::new("X", "x.com", "pw")).await.unwrap_err();
        assert_eq!(err.operation(), Operation::Create);
    }

    #[tokio::test]
    async fn test_failure_is_request_failed() {
        let transport = Arc::new(MemoryTransport::new());
        transport.fail(Operation::List);
        let store = Store::new(transport);

        let err = store.list().await.unwrap_err();
        assert!(matches!(err, CoreError::RequestFailed { operation: Operation::List, .. }));
    }

    // ==================== HttpTransport against a local stub store ====================

    #[derive(Debug, Clone, PartialEq)]
    struct Received {
        method: String,
        path: String,
        content_type: Option<String>,
        cookie: Option<String>,
        body: String,
    }

    impl Received {
        fn json(&self) -> Value {
            serde_json::from_str(&self.body).unwrap()
        }
    }

    /// Answers every request with the same status and body, after `delay`
    #[derive(Clone)]
    struct StubStore {
        status: StatusCode,
        reply: &'static str,
        delay: Duration,
        received: Arc<Mutex<Vec<Received>>>,
    }

    impl StubStore {
        fn answering(status: StatusCode, reply: &'static str) -> Self {
            Self {
                status,
                reply,
                delay: Duration::ZERO,
                received: Arc::new(Mutex::new(Vec::new())),
            }
        }

        fn received(&self) -> Vec<Received> {
            self.received.lock().unwrap().clone()
        }

        /// Serve on an ephemeral port and return the base URL
        async fn serve(&self) -> String {
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            let addr = listener.local_addr().unwrap();
            let router = axum::Router::new().fallback(stub_reply).with_state(self.clone());
            tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });
            format!("http://{}", addr)
        }
    }

    async fn stub_reply(
        State(stub): State<StubStore>,
        method: Method,
        uri: Uri,
        headers: HeaderMap,
        body: String,
    ) -> (StatusCode, &'static str) {
        let header = |name: reqwest::header::HeaderName| {
            headers
                .get(name)
                .and_then(|value| value.to_str().ok())
                .map(str::to_string)
        };
        stub.received.lock().unwrap().push(Received {
            method: method.to_string(),
            path: uri.path().to_string(),
            content_type: header(CONTENT_TYPE),
            cookie: header(COOKIE),
            body,
        });

        if !stub.delay.is_zero() {
            tokio::time::sleep(stub.delay).await;
        }
        (stub.status, stub.reply)
    }

    async fn http_store(stub: &StubStore) -> Store {
        let transport = HttpTransport::new(stub.serve().await, Duration::from_secs(5)).unwrap();
        Store::new(Arc::new(transport))
    }

    #[tokio::test]
    async fn test_http_list_posts_to_data_without_body() {
        let stub = StubStore::answering(
            StatusCode::OK,
            r#"{"b": {"name": "B", "url": "b.io", "password": "x"}, "a": {"name": "A", "url": "a.io", "password": "y"}}"#,
        );
        let store = http_store(&stub).await;

        let accounts = store.list().await.unwrap();
        let ids: Vec<&str> = accounts.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);

        assert_eq!(
            stub.received(),
            vec![Received {
                method: "POST".to_string(),
                path: "/data".to_string(),
                content_type: Some("application/json".to_string()),
                cookie: None,
                body: String::new(),
            }]
        );
    }

    #[tokio::test]
    async fn test_http_mutations_send_json_bodies() {
        let stub = StubStore::answering(StatusCode::OK, r#"{"status": "success"}"#);
        let store = http_store(&stub).await;

        store.create(&AccountDraft::new("X", "x.com", "pw")).await.unwrap();
        let update = AccountUpdate {
            id: "1".to_string(),
            name: "Bank".to_string(),
            url: "bank.com".to_string(),
            password: "n3w".to_string(),
        };
        store.update(&update).await.unwrap();
        store.delete("1").await.unwrap();

        let received = stub.received();
        let routes: Vec<(&str, &str)> = received
            .iter()
            .map(|r| (r.method.as_str(), r.path.as_str()))
            .collect();
        assert_eq!(
            routes,
            vec![("POST", "/accounts"), ("PUT", "/accounts"), ("DELETE", "/accounts")]
        );
        assert!(received
            .iter()
            .all(|r| r.content_type.as_deref() == Some("application/json")));
        assert_eq!(received[0].json(), json!({"name": "X", "url": "x.com", "password": "pw"}));
        assert_eq!(
            received[1].json(),
            json!({"id": "1", "name": "Bank", "url": "bank.com", "password": "n3w"})
        );
        assert_eq!(received[2].json(), json!({"id": "1"}));
    }

    #[tokio::test]
    async fn test_http_error_status_fails() {
        let stub = StubStore::answering(StatusCode::INTERNAL_SERVER_ERROR, r#"{"error": "boom"}"#);
        let store = http_store(&stub).await;

        let err = store.list().await.unwrap_err();
        match err {
            CoreError::RequestFailed { operation, reason } => {
                assert_eq!(operation, Operation::List);
                assert!(reason.contains("500"), "unexpected reason: {}", reason);
            }
        }
        assert!(store.delete("1").await.is_err());
    }

    #[tokio::test]
    async fn test_http_empty_body_only_accepted_for_delete() {
        let stub = StubStore::answering(StatusCode::OK, "");
        let store = http_store(&stub).await;

        assert!(store.delete("1").await.is_ok());
        assert_eq!(
            store.create(&AccountDraft::new("X", "x.com", "pw")).await.unwrap_err().operation(),
            Operation::Create
        );
        assert_eq!(store.list().await.unwrap_err().operation(), Operation::List);
    }

    #[tokio::test]
    async fn test_http_non_json_body_fails() {
        let stub = StubStore::answering(StatusCode::OK, "<html>please log in</html>");
        let store = http_store(&stub).await;

        let err = store.list().await.unwrap_err();
        assert!(err.to_string().contains("invalid JSON"));
        assert!(store.update(&AccountUpdate {
            id: "1".to_string(),
            name: "n".to_string(),
            url: "u".to_string(),
            password: "p".to_string(),
        })
        .await
        .is_err());
    }

    #[tokio::test]
    async fn test_http_slow_store_times_out() {
        let mut stub = StubStore::answering(StatusCode::OK, "{}");
        stub.delay = Duration::from_secs(5);
        let transport = HttpTransport::new(stub.serve().await, Duration::from_millis(100)).unwrap();
        let store = Store::new(Arc::new(transport));

        let err = store.list().await.unwrap_err();
        assert_eq!(err.operation(), Operation::List);
        assert_eq!(stub.received().len(), 1);
    }

    #[tokio::test]
    async fn test_http_configured_cookie_is_sent() {
        let stub = StubStore::answering(StatusCode::OK, "{}");
        let config = StoreConfig {
            base_url: format!("{}/", stub.serve().await),
            timeout_secs: 5,
            cookie: Some("session=abc123".to_string()),
        };
        let transport = HttpTransport::from_config(&config).unwrap();
        assert!(!format!("{:?}", transport).contains("abc123"));

        Store::new(Arc::new(transport)).list().await.unwrap();

        let received = stub.received();
        assert_eq!(received[0].path, "/data");
        assert_eq!(received[0].cookie.as_deref(), Some("session=abc123"));
    }
}
