// # INWX Registrar
//
// Registrar implementation for the INWX DomRobot JSON-RPC API.
//
// ## Behavior
//
// - One HTTP request per registrar call; no retries, no background tasks
// - The session lives in the `domrobot` cookie set by `account.login`
// - Result codes 1000-1999 are successes; anything else becomes an error
//   carrying the code (2302 "object exists", 2303 "object does not exist")
// - Record names are returned relative to their zone, empty for the apex
//
// ## Security Requirements
//
// - The password NEVER appears in logs or Debug output
// - Credentials come from configuration only
//
// ## API Reference
//
// - Endpoint: POST `https://api.domrobot.com/jsonrpc/` (OT&E: `api.ote.domrobot.com`)
// - Body: `{"method": "nameserver.info", "params": {...}}`
// - Reply: `{"code": 1000, "msg": "...", "resData": {...}}`

use async_trait::async_trait;
use recsync_core::config::RegistrarConfig;
use recsync_core::traits::{
    RecordId, RecordRequest, Registrar, RegistrarFactory, RemoteRecord, SessionInfo,
};
use recsync_core::{Error, RegistrarRegistry, Result};
use serde::Deserialize;
use serde_json::{Value, json};
use std::time::Duration;

/// Live API endpoint
pub const INWX_API_LIVE: &str = "https://api.domrobot.com/jsonrpc/";

/// OT&E sandbox endpoint
pub const INWX_API_SANDBOX: &str = "https://api.ote.domrobot.com/jsonrpc/";

/// Default HTTP timeout for API requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Zones requested per `nameserver.list` page
const PAGE_LIMIT: usize = 100;

/// Failure of a single JSON-RPC call
#[derive(Debug, thiserror::Error)]
enum RpcError {
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected HTTP status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to parse response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("{method} failed: {msg}{}", .reason.as_ref().map(|r| format!(" ({r})")).unwrap_or_default())]
    Result {
        method: String,
        code: u32,
        msg: String,
        reason: Option<String>,
    },
}

impl From<RpcError> for Error {
    fn from(err: RpcError) -> Self {
        match &err {
            RpcError::Result { code, .. } => Error::registrar_code(*code, err.to_string()),
            _ => Error::http(err.to_string()),
        }
    }
}

/// Envelope of every DomRobot reply
#[derive(Debug, Deserialize)]
struct RpcResponse {
    code: u32,
    #[serde(default)]
    msg: String,
    #[serde(default)]
    reason: Option<String>,
    #[serde(rename = "resData", default)]
    res_data: Value,
}

impl RpcResponse {
    fn into_result(self, method: &str) -> std::result::Result<Value, RpcError> {
        if (1000..2000).contains(&self.code) {
            Ok(self.res_data)
        } else {
            Err(RpcError::Result {
                method: method.to_string(),
                code: self.code,
                msg: self.msg,
                reason: self.reason,
            })
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginData {
    customer_id: Option<u64>,
    account_id: Option<u64>,
}

/// Account details from an `account.login` reply
///
/// The login has already succeeded at this point, so an unreadable payload
/// only loses the informational ids.
fn session_info(data: Value) -> SessionInfo {
    let login = if data.is_null() {
        LoginData::default()
    } else {
        serde_json::from_value(data).unwrap_or_else(|e| {
            tracing::warn!("Ignoring malformed INWX login payload: {}", e);
            LoginData::default()
        })
    };
    SessionInfo {
        customer_id: login.customer_id,
        account_id: login.account_id,
        version: None,
    }
}

#[derive(Debug, Default, Deserialize)]
struct ZonePage {
    #[serde(default)]
    count: usize,
    #[serde(default)]
    domains: Vec<ZoneEntry>,
}

#[derive(Debug, Deserialize)]
struct ZoneEntry {
    domain: String,
}

#[derive(Debug, Default, Deserialize)]
struct ZoneInfo {
    #[serde(default)]
    record: Vec<InwxRecord>,
}

/// Record identifiers come back as numbers from the JSON-RPC endpoint
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawId {
    Number(u64),
    Text(String),
}

#[derive(Debug, Deserialize)]
struct InwxRecord {
    id: RawId,
    name: String,
    #[serde(rename = "type")]
    record_type: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    ttl: u32,
    #[serde(default)]
    prio: u32,
}

impl InwxRecord {
    fn into_remote(self, zone: &str) -> RemoteRecord {
        let id = match self.id {
            RawId::Number(n) => RecordId::from(n),
            RawId::Text(s) => RecordId::from(s),
        };
        RemoteRecord {
            id,
            name: relative_name(&self.name, zone),
            record_type: self.record_type,
            content: self.content,
            ttl: self.ttl,
            priority: self.prio,
        }
    }
}

/// Zone-relative form of a name returned by the API
///
/// INWX reports fully-qualified names; the apex becomes the empty string.
fn relative_name(name: &str, zone: &str) -> String {
    let name = name.trim_end_matches('.');
    if name.eq_ignore_ascii_case(zone) {
        return String::new();
    }
    match name.len().checked_sub(zone.len() + 1) {
        Some(split)
            if name.as_bytes()[split] == b'.' && name[split + 1..].eq_ignore_ascii_case(zone) =>
        {
            name[..split].to_string()
        }
        _ => name.to_string(),
    }
}

/// Identifier parameter as the API expects it (numeric where possible)
fn id_param(id: &RecordId) -> Value {
    id.as_str()
        .parse::<u64>()
        .map(Value::from)
        .unwrap_or_else(|_| Value::from(id.as_str()))
}

fn record_params(request: &RecordRequest) -> Value {
    json!({
        "name": request.name,
        "type": request.record_type,
        "content": request.content,
        "ttl": request.ttl,
        "prio": request.priority,
    })
}

/// INWX registrar
///
/// # Security
///
/// The Debug implementation does NOT expose the password.
pub struct InwxRegistrar {
    /// Account user name
    username: String,

    /// Account password
    /// ⚠️ NEVER log this value
    password: String,

    /// JSON-RPC endpoint
    endpoint: String,

    /// HTTP client keeping the session cookie
    client: reqwest::Client,
}

// Custom Debug implementation that hides the password
impl std::fmt::Debug for InwxRegistrar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InwxRegistrar")
            .field("username", &self.username)
            .field("password", &"<REDACTED>")
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

impl InwxRegistrar {
    /// Create a registrar talking to `endpoint`
    ///
    /// # Parameters
    ///
    /// - `username`, `password`: Account credentials (must not be empty)
    /// - `endpoint`: JSON-RPC URL, usually [`INWX_API_LIVE`] or [`INWX_API_SANDBOX`]
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        endpoint: impl Into<String>,
    ) -> Result<Self> {
        let username = username.into();
        let password = password.into();
        if username.is_empty() || password.is_empty() {
            return Err(Error::config("INWX username and password are required"));
        }

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .cookie_store(true)
            .build()
            .map_err(|e| Error::http(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            username,
            password,
            endpoint: endpoint.into(),
            client,
        })
    }

    /// Create a registrar for the live API
    pub fn live(username: impl Into<String>, password: impl Into<String>) -> Result<Self> {
        Self::new(username, password, INWX_API_LIVE)
    }

    /// Create a registrar for the OT&E sandbox
    pub fn sandbox(username: impl Into<String>, password: impl Into<String>) -> Result<Self> {
        Self::new(username, password, INWX_API_SANDBOX)
    }

    /// The JSON-RPC endpoint in use
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Perform one JSON-RPC call and return its `resData`
    async fn call(&self, method: &str, params: Value) -> std::result::Result<Value, RpcError> {
        tracing::debug!("INWX call: {}", method);

        let response = self
            .client
            .post(&self.endpoint)
            .json(&json!({ "method": method, "params": params }))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(RpcError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let reply: RpcResponse = serde_json::from_str(&body)?;
        reply.into_result(method)
    }

    async fn zone_page(&self, page: usize) -> Result<ZonePage> {
        let data = self
            .call("nameserver.list", json!({ "page": page, "pagelimit": PAGE_LIMIT }))
            .await?;
        Ok(serde_json::from_value(data)?)
    }
}

#[async_trait]
impl Registrar for InwxRegistrar {
    async fn login(&self) -> Result<SessionInfo> {
        let params = json!({
            "user": self.username,
            "pass": self.password,
            "lang": "en",
        });
        let data = self.call("account.login", params).await.map_err(|e| {
            if let RpcError::Result { code, .. } = &e {
                Error::auth(format!("INWX login rejected (code {}): {}", code, e))
            } else {
                Error::from(e)
            }
        })?;

        tracing::debug!("INWX login as {} succeeded", self.username);
        Ok(session_info(data))
    }

    async fn logout(&self) -> Result<()> {
        self.call("account.logout", json!({})).await?;
        Ok(())
    }

    async fn zones(&self) -> Result<Vec<String>> {
        let mut zones = Vec::new();
        let mut page = 1;
        loop {
            let batch = self.zone_page(page).await?;
            let received = batch.domains.len();
            zones.extend(batch.domains.into_iter().map(|d| d.domain));
            if received == 0 || zones.len() >= batch.count {
                break;
            }
            page += 1;
        }
        Ok(zones)
    }

    async fn records(&self, zone: &str) -> Result<Vec<RemoteRecord>> {
        let data = self.call("nameserver.info", json!({ "domain": zone })).await?;
        let info: ZoneInfo = serde_json::from_value(data)?;
        Ok(info
            .record
            .into_iter()
            .map(|r| r.into_remote(zone))
            .collect())
    }

    async fn create_record(&self, request: &RecordRequest) -> Result<()> {
        let mut params = record_params(request);
        params["domain"] = Value::from(request.zone.as_str());
        self.call("nameserver.createRecord", params).await?;
        tracing::info!(
            "INWX record created: {:?} {} {} in {}",
            request.name,
            request.record_type,
            request.content,
            request.zone
        );
        Ok(())
    }

    async fn update_record(&self, id: &RecordId, request: &RecordRequest) -> Result<()> {
        let mut params = record_params(request);
        params["id"] = id_param(id);
        self.call("nameserver.updateRecord", params).await?;
        tracing::info!(
            "INWX record {} updated: {:?} {} {}",
            id,
            request.name,
            request.record_type,
            request.content
        );
        Ok(())
    }

    async fn delete_record(&self, id: &RecordId) -> Result<()> {
        self.call("nameserver.deleteRecord", json!({ "id": id_param(id) }))
            .await?;
        tracing::info!("INWX record {} deleted", id);
        Ok(())
    }

    fn registrar_name(&self) -> &'static str {
        "inwx"
    }
}

/// Factory for creating INWX registrars
pub struct InwxFactory;

impl RegistrarFactory for InwxFactory {
    fn create(&self, config: &RegistrarConfig) -> Result<Box<dyn Registrar>> {
        match config {
            RegistrarConfig::Inwx {
                username,
                password,
                sandbox,
            } => {
                let registrar = if *sandbox {
                    tracing::info!("INWX registrar using the OT&E sandbox");
                    InwxRegistrar::sandbox(username.clone(), password.clone())?
                } else {
                    InwxRegistrar::live(username.clone(), password.clone())?
                };
                Ok(Box::new(registrar))
            }
            _ => Err(Error::config("Invalid config for INWX registrar")),
        }
    }
}

/// Register the INWX registrar with a registry
///
/// # Example
///
/// ```rust
/// use recsync_core::RegistrarRegistry;
///
/// let registry = RegistrarRegistry::new();
/// recsync_registrar_inwx::register(&registry);
/// assert!(registry.has_registrar("inwx"));
/// ```
pub fn register(registry: &RegistrarRegistry) {
    registry.register_registrar("inwx", Box::new(InwxFactory));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inwx_config(sandbox: bool) -> RegistrarConfig {
        RegistrarConfig::Inwx {
            username: "user".to_string(),
            password: "secret_password_12345".to_string(),
            sandbox,
        }
    }

    #[test]
    fn factory_selects_endpoint() {
        let registrar = InwxRegistrar::sandbox("user", "pw").unwrap();
        assert_eq!(registrar.endpoint(), INWX_API_SANDBOX);
        let registrar = InwxRegistrar::live("user", "pw").unwrap();
        assert_eq!(registrar.endpoint(), INWX_API_LIVE);

        let created = InwxFactory.create(&inwx_config(true)).unwrap();
        assert_eq!(created.registrar_name(), "inwx");
    }

    #[test]
    fn factory_rejects_other_configs() {
        let config = RegistrarConfig::Memory { zones: vec![] };
        assert!(InwxFactory.create(&config).is_err());
    }

    #[test]
    fn empty_credentials_are_rejected() {
        assert!(matches!(
            InwxRegistrar::live("", "pw"),
            Err(Error::Config(_))
        ));
        assert!(InwxRegistrar::live("user", "").is_err());
    }

    #[test]
    fn password_not_exposed_in_debug() {
        let registrar = InwxRegistrar::live("user", "secret_password_12345").unwrap();
        let debug_str = format!("{:?}", registrar);
        assert!(!debug_str.contains("secret_password"));
        assert!(debug_str.contains("InwxRegistrar"));
        assert!(debug_str.contains("<REDACTED>"));
    }

    #[test]
    fn register_adds_factory() {
        let registry = RegistrarRegistry::new();
        register(&registry);
        assert!(registry.has_registrar("inwx"));
        assert!(registry.create_registrar(&inwx_config(false)).is_ok());
    }

    #[test]
    fn success_codes_yield_res_data() {
        let reply: RpcResponse = serde_json::from_value(json!({
            "code": 1000,
            "msg": "Command completed successfully",
            "resData": {"customerId": 42, "accountId": 7}
        }))
        .unwrap();
        let data = reply.into_result("account.login").unwrap();
        let login: LoginData = serde_json::from_value(data).unwrap();
        assert_eq!(login.customer_id, Some(42));
        assert_eq!(login.account_id, Some(7));

        let reply: RpcResponse = serde_json::from_value(json!({"code": 1500, "msg": "ok"})).unwrap();
        assert!(reply.into_result("account.logout").is_ok());
    }

    #[test]
    fn malformed_login_payload_keeps_session() {
        let info = session_info(json!({"customerId": "abc", "accountId": 7}));
        assert_eq!(info.customer_id, None);
        assert_eq!(info.account_id, None);

        let info = session_info(json!({"customerId": 42}));
        assert_eq!(info.customer_id, Some(42));
        assert_eq!(info.account_id, None);

        let info = session_info(Value::Null);
        assert_eq!(info.customer_id, None);
    }

    #[test]
    fn failure_codes_keep_registrar_code() {
        let reply: RpcResponse = serde_json::from_value(json!({
            "code": 2302,
            "msg": "Object exists",
            "reason": "Record already exists"
        }))
        .unwrap();
        let err: Error = reply.into_result("nameserver.createRecord").unwrap_err().into();

        assert!(err.is_object_exists());
        let message = err.to_string();
        assert!(message.contains("nameserver.createRecord failed: Object exists"));
        assert!(message.contains("Record already exists"));

        let reply: RpcResponse =
            serde_json::from_value(json!({"code": 2303, "msg": "Object does not exist"})).unwrap();
        let err: Error = reply.into_result("nameserver.deleteRecord").unwrap_err().into();
        assert!(err.is_object_missing());
    }

    #[test]
    fn transport_failures_are_http_errors() {
        let err: Error = RpcError::Status {
            status: 502,
            body: "bad gateway".to_string(),
        }
        .into();
        assert!(matches!(err, Error::Http(_)));
    }

    #[test]
    fn zone_info_parses_records() {
        let info: ZoneInfo = serde_json::from_value(json!({
            "domain": "example.com",
            "record": [
                {"id": 10, "name": "example.com", "type": "SOA", "content": "ns.inwx.de", "ttl": 86400, "prio": 0},
                {"id": 11, "name": "www.example.com", "type": "A", "content": "1.2.3.4", "ttl": 300, "prio": 0},
                {"id": "12", "name": "example.com", "type": "MX", "content": "mail.example.com", "ttl": 3600, "prio": 10}
            ]
        }))
        .unwrap();

        let records: Vec<RemoteRecord> = info
            .record
            .into_iter()
            .map(|r| r.into_remote("example.com"))
            .collect();

        assert_eq!(records.len(), 3);
        assert_eq!(records[0].name, "");
        assert_eq!(records[1].id, RecordId::from(11u64));
        assert_eq!(records[1].name, "www");
        assert_eq!(records[1].ttl, 300);
        assert_eq!(records[2].id, RecordId::from("12"));
        assert_eq!(records[2].priority, 10);
    }

    #[test]
    fn zone_page_defaults_when_empty() {
        let page: ZonePage = serde_json::from_value(json!({})).unwrap();
        assert_eq!(page.count, 0);
        assert!(page.domains.is_empty());

        let page: ZonePage = serde_json::from_value(json!({
            "count": 2,
            "domains": [{"domain": "example.com"}, {"domain": "example.org"}]
        }))
        .unwrap();
        assert_eq!(page.domains[1].domain, "example.org");
    }

    #[test]
    fn relative_names() {
        assert_eq!(relative_name("example.com", "example.com"), "");
        assert_eq!(relative_name("example.com.", "example.com"), "");
        assert_eq!(relative_name("www.example.com", "example.com"), "www");
        assert_eq!(relative_name("a.b.Example.com", "example.com"), "a.b");
        assert_eq!(relative_name("wwwexample.com", "example.com"), "wwwexample.com");
        assert_eq!(relative_name("www", "example.com"), "www");
    }

    #[test]
    fn numeric_ids_are_sent_as_numbers() {
        assert_eq!(id_param(&RecordId::from(17u64)), json!(17));
        assert_eq!(id_param(&RecordId::new("abc")), json!("abc"));
    }

    #[test]
    fn record_params_carry_all_fields() {
        let params = record_params(&RecordRequest {
            zone: "example.com".to_string(),
            name: "www".to_string(),
            record_type: "A".to_string(),
            ttl: 300,
            content: "1.2.3.4".to_string(),
            priority: 0,
        });
        assert_eq!(
            params,
            json!({"name": "www", "type": "A", "content": "1.2.3.4", "ttl": 300, "prio": 0})
        );
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_http_error() {
        let registrar = InwxRegistrar::new("user", "pw", "http://127.0.0.1:9/jsonrpc/").unwrap();
        let err = registrar.login().await.unwrap_err();
        assert!(matches!(err, Error::Http(_)));
    }
}
