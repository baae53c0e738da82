use async_trait::async_trait;
use base64::Engine;
use reqwest::{header, Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use tracing::debug;

use super::error::StoreError;
use super::models::{
    Account, AccountQuery, AccountStatus, Application, LoginAttempt, NewAccount, Page, ResourceRef,
};
use super::AccountStore;
use crate::config::ConnectorConfig;
use crate::filter::Expansion;

/// Error document returned by the identity service on non-2xx responses
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RemoteErrorBody {
    #[serde(default)]
    code: Option<i64>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    developer_message: Option<String>,
}

impl RemoteErrorBody {
    fn describe(&self, fallback: &str) -> String {
        let message = self
            .developer_message
            .as_deref()
            .or(self.message.as_deref())
            .unwrap_or(fallback);
        match self.code {
            Some(code) => format!("{} (code {})", message, code),
            None => message.to_string(),
        }
    }
}

/// Standard-field payload for account updates; custom data is saved separately
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AccountUpdate<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    username: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    email: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    given_name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    middle_name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    surname: Option<&'a str>,
    status: AccountStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    password: Option<&'a str>,
}

impl<'a> From<&'a Account> for AccountUpdate<'a> {
    fn from(account: &'a Account) -> Self {
        Self {
            username: account.username.as_deref(),
            email: account.email.as_deref(),
            given_name: account.given_name.as_deref(),
            middle_name: account.middle_name.as_deref(),
            surname: account.surname.as_deref(),
            status: account.status,
            password: account.password.as_deref(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct LoginResult {
    account: ResourceRef,
}

/// Value of a `basic` login attempt: base64 of `login:password`
pub fn encode_login_attempt(attempt: &LoginAttempt) -> String {
    base64::engine::general_purpose::STANDARD.encode(format!("{}:{}", attempt.login, attempt.password))
}

/// Account store backed by the identity service's REST API.
///
/// Requests authenticate with HTTP basic auth using the API key pair. Resources are
/// addressed by the `href` values the service hands out, so no URL templates are
/// needed beyond the configured application href.
#[derive(Debug, Clone)]
pub struct HttpAccountStore {
    http_client: Client,
    api_key_id: String,
    api_key_secret: String,
    debug: bool,
}

impl HttpAccountStore {
    pub fn new(config: &ConnectorConfig) -> Result<Self, StoreError> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent(concat!("account-connector/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| StoreError::InvalidConfig(format!("Failed to build HTTP client: {e}")))?;
        Self::with_http_client(config, http_client)
    }

    /// Create a store with a pre-built `reqwest::Client`
    pub fn with_http_client(config: &ConnectorConfig, http_client: Client) -> Result<Self, StoreError> {
        if config.api_key_id.trim().is_empty() || config.api_key_secret.trim().is_empty() {
            return Err(StoreError::InvalidConfig("API key id and secret are required".to_string()));
        }
        Ok(Self {
            http_client,
            api_key_id: config.api_key_id.clone(),
            api_key_secret: config.api_key_secret.clone(),
            debug: config.debug,
        })
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        if self.debug {
            debug!("{} {}", method, url);
        }
        self.http_client
            .request(method, url)
            .basic_auth(&self.api_key_id, Some(&self.api_key_secret))
            .header(header::ACCEPT, "application/json")
    }

    async fn handle_response<T: DeserializeOwned>(&self, response: Response) -> Result<T, StoreError> {
        let response = Self::check_status(response).await?;
        response.json::<T>().await.map_err(|e| StoreError::Decode(e.to_string()))
    }

    async fn handle_empty(&self, response: Response) -> Result<(), StoreError> {
        Self::check_status(response).await.map(|_| ())
    }

    async fn check_status(response: Response) -> Result<Response, StoreError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let fallback = status.canonical_reason().unwrap_or("request failed").to_string();
        let body = response.json::<RemoteErrorBody>().await.unwrap_or_default();
        Err(StoreError::from_status(status.as_u16(), body.describe(&fallback)))
    }

    /// Drop the link-only custom data object the service returns when not expanded
    fn collapse(mut account: Account, expand_custom_data: bool) -> Account {
        if !expand_custom_data {
            account.custom_data = None;
        }
        account
    }
}

#[async_trait]
impl AccountStore for HttpAccountStore {
    async fn get_application(&self, href: &str) -> Result<Application, StoreError> {
        let response = self.request(Method::GET, href).send().await?;
        self.handle_response(response).await
    }

    async fn create_account(
        &self,
        application: &Application,
        account: &NewAccount,
    ) -> Result<Account, StoreError> {
        let response = self
            .request(Method::POST, &application.accounts.href)
            .json(account)
            .send()
            .await?;
        let created: Account = self.handle_response(response).await?;
        Ok(Self::collapse(created, false))
    }

    async fn get_account(&self, href: &str, expand_custom_data: bool) -> Result<Account, StoreError> {
        let mut builder = self.request(Method::GET, href);
        if expand_custom_data {
            builder = builder.query(&[("expand", Expansion::CustomData.as_str())]);
        }
        let account: Account = self.handle_response(builder.send().await?).await?;
        Ok(Self::collapse(account, expand_custom_data))
    }

    async fn search_accounts(
        &self,
        application: &Application,
        query: &AccountQuery,
        offset: usize,
        limit: usize,
    ) -> Result<Page<Account>, StoreError> {
        let response = self
            .request(Method::GET, &application.accounts.href)
            .query(&query.to_params(offset, limit))
            .send()
            .await?;
        let mut page: Page<Account> = self.handle_response(response).await?;
        page.items = page
            .items
            .into_iter()
            .map(|account| Self::collapse(account, query.expand_custom_data))
            .collect();
        Ok(page)
    }

    async fn save_account(&self, account: &Account) -> Result<(), StoreError> {
        let response = self
            .request(Method::POST, &account.href)
            .json(&AccountUpdate::from(account))
            .send()
            .await?;
        self.handle_empty(response).await
    }

    async fn save_custom_data(&self, account: &Account) -> Result<(), StoreError> {
        let fields = account.custom_data.as_ref().map(|c| c.fields.clone()).unwrap_or_default();
        let response = self
            .request(Method::POST, &account.custom_data_href())
            .json(&fields)
            .send()
            .await?;
        self.handle_empty(response).await
    }

    async fn delete_account(&self, href: &str) -> Result<(), StoreError> {
        let response = self.request(Method::DELETE, href).send().await?;
        self.handle_empty(response).await
    }

    async fn authenticate_account(
        &self,
        application: &Application,
        attempt: &LoginAttempt,
    ) -> Result<String, StoreError> {
        let url = format!("{}/loginAttempts", application.href.trim_end_matches('/'));
        let body = json!({ "type": "basic", "value": encode_login_attempt(attempt) });
        let response = self.request(Method::POST, &url).json(&body).send().await?;
        let result: LoginResult = self.handle_response(response).await?;
        Ok(result.account.href)
    }
}
