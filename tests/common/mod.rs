#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use account_connector::store::{
    Account, AccountQuery, Application, CustomData, LoginAttempt, MemoryAccountStore, NewAccount, StoreError,
};
use account_connector::store::AccountStore;
use account_connector::{AccountConnector, ConnectorConfig, Record};
use anyhow::{Context, Result};
use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use base64::Engine;
use serde_json::{json, Map, Value};

pub const BASE_URL: &str = "https://accounts.test/v1";
pub const API_KEY_ID: &str = "test-key";
pub const API_KEY_SECRET: &str = "test-secret";

pub fn config_for(application_href: &str) -> ConnectorConfig {
    ConnectorConfig {
        api_key_id: API_KEY_ID.to_string(),
        api_key_secret: API_KEY_SECRET.to_string(),
        application_href: application_href.to_string(),
        ..Default::default()
    }
}

pub fn memory_store() -> Arc<MemoryAccountStore> {
    Arc::new(MemoryAccountStore::new(BASE_URL, "test"))
}

/// Connector over a fresh in-memory store
pub fn memory_connector() -> (AccountConnector, Arc<MemoryAccountStore>) {
    memory_connector_with(|_| {})
}

pub fn memory_connector_with(adjust: impl FnOnce(&mut ConnectorConfig)) -> (AccountConnector, Arc<MemoryAccountStore>) {
    let store = memory_store();
    let mut config = config_for(store.application_href());
    adjust(&mut config);
    let connector = AccountConnector::with_store(config, store.clone()).expect("valid test config");
    (connector, store)
}

pub fn record(value: Value) -> Record {
    Record::from_json(value).expect("record json")
}

pub fn person(given_name: &str, surname: &str, email: &str) -> Record {
    record(json!({
        "givenName": given_name,
        "surname": surname,
        "email": email,
        "password": "Changeme1!"
    }))
}

/// Identity service stand-in: an axum router over a [`MemoryAccountStore`]
pub struct FakeRemote {
    pub port: u16,
    pub base_url: String,
    pub store: Arc<MemoryAccountStore>,
}

#[derive(Clone)]
struct RemoteState {
    store: Arc<MemoryAccountStore>,
    authorization: String,
}

struct RemoteError(StoreError);

impl From<StoreError> for RemoteError {
    fn from(err: StoreError) -> Self {
        RemoteError(err)
    }
}

impl IntoResponse for RemoteError {
    fn into_response(self) -> Response {
        let status = self.0.status_code().unwrap_or(502);
        let message = match &self.0 {
            StoreError::NotFound(_) => "The requested resource does not exist.".to_string(),
            StoreError::Client { message, .. } | StoreError::Server { message, .. } => message.clone(),
            other => other.to_string(),
        };
        let body = json!({
            "status": status,
            "code": status,
            "message": message,
            "developerMessage": message
        });
        let status = StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY);
        (status, Json(body)).into_response()
    }
}

type RemoteResult<T> = std::result::Result<T, RemoteError>;

impl RemoteState {
    fn authorize(&self, headers: &HeaderMap) -> RemoteResult<()> {
        let presented = headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok());
        if presented == Some(self.authorization.as_str()) {
            Ok(())
        } else {
            Err(RemoteError(StoreError::Client { status: 401, message: "Authentication required.".into() }))
        }
    }

    fn application(&self, name: &str) -> RemoteResult<Application> {
        let application = self.store.application();
        if application.name == name {
            Ok(application.clone())
        } else {
            Err(RemoteError(StoreError::NotFound(name.to_string())))
        }
    }

    fn account_href(&self, id: &str) -> String {
        format!("{}/accounts/{}", self.store.base_url(), id)
    }
}

impl FakeRemote {
    pub async fn spawn() -> Result<Self> {
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}/v1", port);
        let store = Arc::new(MemoryAccountStore::new(&base_url, "test"));

        let credentials = base64::engine::general_purpose::STANDARD.encode(format!("{}:{}", API_KEY_ID, API_KEY_SECRET));
        let state = RemoteState { store: store.clone(), authorization: format!("Basic {}", credentials) };

        let app = Router::new()
            .route("/v1/applications/:app", get(get_application))
            .route("/v1/applications/:app/accounts", get(search_accounts).post(create_account))
            .route("/v1/applications/:app/loginAttempts", post(login_attempt))
            .route("/v1/accounts/:id", get(get_account).post(save_account).delete(delete_account))
            .route("/v1/accounts/:id/customData", post(save_custom_data))
            .with_state(state);

        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
            .await
            .context("failed to bind fake remote")?;
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Ok(Self { port, base_url, store })
    }

    pub fn application_href(&self) -> String {
        self.store.application_href().to_string()
    }

    pub fn config(&self) -> ConnectorConfig {
        config_for(self.store.application_href())
    }

    /// Connector speaking HTTP to this fake
    pub fn connector(&self) -> Result<AccountConnector> {
        Ok(AccountConnector::initialize(self.config())?)
    }
}

fn expanded(params: &HashMap<String, String>) -> bool {
    params.get("expand").map(|v| v.split(',').any(|e| e == "customData")).unwrap_or(false)
}

async fn get_application(
    State(state): State<RemoteState>,
    headers: HeaderMap,
    Path(app): Path<String>,
) -> RemoteResult<Json<Application>> {
    state.authorize(&headers)?;
    let href = format!("{}/applications/{}", state.store.base_url(), app);
    Ok(Json(state.store.get_application(&href).await?))
}

async fn search_accounts(
    State(state): State<RemoteState>,
    headers: HeaderMap,
    Path(app): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> RemoteResult<Json<Value>> {
    state.authorize(&headers)?;
    let application = state.application(&app)?;

    let offset = params.get("offset").and_then(|v| v.parse().ok()).unwrap_or(0);
    let limit = params.get("limit").and_then(|v| v.parse().ok()).unwrap_or(25);
    let mut query = AccountQuery::new();
    for (key, value) in &params {
        if !matches!(key.as_str(), "offset" | "limit" | "expand") {
            query = query.with_filter(key.clone(), value.clone());
        }
    }
    if expanded(&params) {
        query = query.expanded();
    }

    let page = state.store.search_accounts(&application, &query, offset, limit).await?;
    Ok(Json(serde_json::to_value(page).map_err(|e| RemoteError(StoreError::Decode(e.to_string())))?))
}

async fn create_account(
    State(state): State<RemoteState>,
    headers: HeaderMap,
    Path(app): Path<String>,
    Json(new): Json<NewAccount>,
) -> RemoteResult<(StatusCode, Json<Account>)> {
    state.authorize(&headers)?;
    let application = state.application(&app)?;
    let account = state.store.create_account(&application, &new).await?;
    Ok((StatusCode::CREATED, Json(account)))
}

async fn login_attempt(
    State(state): State<RemoteState>,
    headers: HeaderMap,
    Path(app): Path<String>,
    Json(body): Json<Value>,
) -> RemoteResult<Json<Value>> {
    state.authorize(&headers)?;
    let application = state.application(&app)?;

    let malformed = || RemoteError(StoreError::Client { status: 400, message: "Malformed login attempt.".into() });
    let encoded = body.get("value").and_then(Value::as_str).ok_or_else(malformed)?;
    let decoded = base64::engine::general_purpose::STANDARD.decode(encoded).map_err(|_| malformed())?;
    let decoded = String::from_utf8(decoded).map_err(|_| malformed())?;
    let (login, password) = decoded.split_once(':').ok_or_else(malformed)?;

    let attempt = LoginAttempt { login: login.to_string(), password: password.to_string() };
    let href = state.store.authenticate_account(&application, &attempt).await?;
    Ok(Json(json!({ "account": { "href": href } })))
}

async fn get_account(
    State(state): State<RemoteState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> RemoteResult<Json<Account>> {
    state.authorize(&headers)?;
    let mut account = state.store.get_account(&state.account_href(&id), expanded(&params)).await?;
    if account.custom_data.is_none() {
        // Unexpanded responses carry only a link
        account.custom_data = Some(CustomData::new(format!("{}/customData", account.href)));
    }
    Ok(Json(account))
}

async fn save_account(
    State(state): State<RemoteState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(mut body): Json<Map<String, Value>>,
) -> RemoteResult<Json<Account>> {
    state.authorize(&headers)?;
    body.insert("href".into(), json!(state.account_href(&id)));
    let account: Account = serde_json::from_value(Value::Object(body))
        .map_err(|e| RemoteError(StoreError::Client { status: 400, message: e.to_string() }))?;
    state.store.save_account(&account).await?;
    Ok(Json(state.store.get_account(&account.href, false).await?))
}

async fn delete_account(
    State(state): State<RemoteState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> RemoteResult<StatusCode> {
    state.authorize(&headers)?;
    state.store.delete_account(&state.account_href(&id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn save_custom_data(
    State(state): State<RemoteState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(fields): Json<Map<String, Value>>,
) -> RemoteResult<Json<Value>> {
    state.authorize(&headers)?;
    let href = state.account_href(&id);
    let account = Account {
        href: href.clone(),
        custom_data: Some(CustomData { href: Some(format!("{}/customData", href)), fields }),
        ..Default::default()
    };
    state.store.save_custom_data(&account).await?;
    let saved = state.store.get_account(&href, true).await?;
    Ok(Json(serde_json::to_value(saved.custom_data).unwrap_or(Value::Null)))
}
