use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::error::StoreError;
use super::models::{
    Account, AccountQuery, AccountStatus, Application, CustomData, LoginAttempt, NewAccount, Page,
    ResourceRef,
};
use super::AccountStore;

const MAX_PAGE_SIZE: usize = 100;

/// Store operation a fault can be attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaultPoint {
    GetApplication,
    CreateAccount,
    GetAccount,
    SearchAccounts,
    SaveAccount,
    SaveCustomData,
    DeleteAccount,
    Authenticate,
}

#[derive(Debug, Clone)]
struct Fault {
    point: FaultPoint,
    email: Option<String>,
    error: StoreError,
}

#[derive(Debug, Clone)]
struct StoredAccount {
    application: String,
    account: Account,
    custom_data: Map<String, Value>,
    password_hash: Option<String>,
}

impl StoredAccount {
    fn view(&self, expand_custom_data: bool) -> Account {
        let mut account = self.account.clone();
        account.password = None;
        account.custom_data = if expand_custom_data {
            Some(CustomData {
                href: Some(format!("{}/customData", account.href)),
                fields: self.custom_data.clone(),
            })
        } else {
            None
        };
        account
    }

    fn field(&self, name: &str) -> Result<Option<&str>, StoreError> {
        let value = match name {
            "givenName" => self.account.given_name.as_deref(),
            "middleName" => self.account.middle_name.as_deref(),
            "surname" => self.account.surname.as_deref(),
            "username" => self.account.username.as_deref(),
            "email" => self.account.email.as_deref(),
            other => {
                return Err(StoreError::Client {
                    status: 400,
                    message: format!("Unsupported search attribute: {}", other),
                })
            }
        };
        Ok(value)
    }

    fn email(&self) -> Option<&str> {
        self.account.email.as_deref()
    }
}

/// In-process account store with the same observable behavior as the remote service.
///
/// Searches are case-insensitive equality matches, emails are unique per application,
/// passwords are kept as SHA-256 digests. Faults can be injected per operation (and
/// optionally per account email) to exercise partial-failure paths.
pub struct MemoryAccountStore {
    base_url: String,
    application: Application,
    accounts: RwLock<Vec<StoredAccount>>,
    faults: Mutex<Vec<Fault>>,
    application_lookups: AtomicUsize,
}

impl MemoryAccountStore {
    pub fn new(base_url: impl Into<String>, application_name: &str) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let href = format!("{}/applications/{}", base_url, application_name);
        let application = Application {
            accounts: ResourceRef { href: format!("{}/accounts", href) },
            href,
            name: application_name.to_string(),
            status: Some("ENABLED".to_string()),
        };

        Self {
            base_url,
            application,
            accounts: RwLock::new(Vec::new()),
            faults: Mutex::new(Vec::new()),
            application_lookups: AtomicUsize::new(0),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn application_href(&self) -> &str {
        &self.application.href
    }

    /// The application scope, without counting as a lookup
    pub fn application(&self) -> &Application {
        &self.application
    }

    /// Number of times the application scope was resolved
    pub fn application_lookups(&self) -> usize {
        self.application_lookups.load(Ordering::SeqCst)
    }

    pub async fn len(&self) -> usize {
        self.accounts.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Fail every call at `point` with `error`
    pub fn fail(&self, point: FaultPoint, error: StoreError) {
        self.push_fault(Fault { point, email: None, error });
    }

    /// Fail calls at `point` that touch the account with `email`
    pub fn fail_for_email(&self, point: FaultPoint, email: &str, error: StoreError) {
        self.push_fault(Fault { point, email: Some(email.to_lowercase()), error });
    }

    pub fn clear_faults(&self) {
        self.faults.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }

    fn push_fault(&self, fault: Fault) {
        self.faults.lock().unwrap_or_else(|e| e.into_inner()).push(fault);
    }

    fn check_fault(&self, point: FaultPoint, email: Option<&str>) -> Result<(), StoreError> {
        let faults = self.faults.lock().unwrap_or_else(|e| e.into_inner());
        let email = email.map(str::to_lowercase);
        let hit = faults.iter().find(|fault| {
            fault.point == point
                && match &fault.email {
                    None => true,
                    Some(target) => email.as_deref() == Some(target.as_str()),
                }
        });
        match hit {
            Some(fault) => Err(fault.error.clone()),
            None => Ok(()),
        }
    }

    fn ensure_application(&self, application: &Application) -> Result<(), StoreError> {
        if application.href != self.application.href {
            return Err(StoreError::NotFound(application.href.clone()));
        }
        Ok(())
    }

    fn email_taken(accounts: &[StoredAccount], email: &str, except_href: Option<&str>) -> bool {
        accounts.iter().any(|stored| {
            Some(stored.account.href.as_str()) != except_href
                && stored.email().map(|e| e.eq_ignore_ascii_case(email)).unwrap_or(false)
        })
    }
}

fn hash_password(password: &str) -> String {
    format!("{:x}", Sha256::digest(password.as_bytes()))
}

fn required<'a>(value: &'a Option<String>, field: &str) -> Result<&'a str, StoreError> {
    match value.as_deref() {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(StoreError::Client { status: 400, message: format!("Account {} is required.", field) }),
    }
}

fn duplicate_email() -> StoreError {
    StoreError::Client {
        status: 409,
        message: "Account with that email already exists.".to_string(),
    }
}

#[async_trait]
impl AccountStore for MemoryAccountStore {
    async fn get_application(&self, href: &str) -> Result<Application, StoreError> {
        self.application_lookups.fetch_add(1, Ordering::SeqCst);
        self.check_fault(FaultPoint::GetApplication, None)?;
        if href.trim_end_matches('/') == self.application.href {
            Ok(self.application.clone())
        } else {
            Err(StoreError::NotFound(href.to_string()))
        }
    }

    async fn create_account(
        &self,
        application: &Application,
        new: &NewAccount,
    ) -> Result<Account, StoreError> {
        self.check_fault(FaultPoint::CreateAccount, new.email.as_deref())?;
        self.ensure_application(application)?;

        let email = required(&new.email, "email")?;
        required(&new.given_name, "givenName")?;
        required(&new.surname, "surname")?;

        let mut accounts = self.accounts.write().await;
        if Self::email_taken(&accounts, email, None) {
            return Err(duplicate_email());
        }

        let now = Utc::now();
        let href = format!("{}/accounts/{}", self.base_url, Uuid::new_v4().simple());
        let account = Account {
            href,
            username: new.username.clone().or_else(|| Some(email.to_string())),
            email: Some(email.to_string()),
            given_name: new.given_name.clone(),
            middle_name: new.middle_name.clone(),
            surname: new.surname.clone(),
            status: AccountStatus::Enabled,
            password: None,
            custom_data: None,
            created_at: Some(now),
            modified_at: Some(now),
        };

        let stored = StoredAccount {
            application: application.href.clone(),
            account,
            custom_data: new.custom_data.clone(),
            password_hash: new.password.as_deref().map(hash_password),
        };
        let view = stored.view(false);
        accounts.push(stored);
        Ok(view)
    }

    async fn get_account(&self, href: &str, expand_custom_data: bool) -> Result<Account, StoreError> {
        let accounts = self.accounts.read().await;
        let found = accounts.iter().find(|stored| stored.account.href == href);
        self.check_fault(FaultPoint::GetAccount, found.and_then(|s| s.email()))?;
        found
            .map(|stored| stored.view(expand_custom_data))
            .ok_or_else(|| StoreError::NotFound(href.to_string()))
    }

    async fn search_accounts(
        &self,
        application: &Application,
        query: &AccountQuery,
        offset: usize,
        limit: usize,
    ) -> Result<Page<Account>, StoreError> {
        self.check_fault(FaultPoint::SearchAccounts, None)?;
        self.ensure_application(application)?;

        let limit = limit.clamp(1, MAX_PAGE_SIZE);
        let accounts = self.accounts.read().await;
        let mut matches = Vec::new();
        for stored in accounts.iter().filter(|s| s.application == application.href) {
            let mut matched = true;
            for (field, expected) in &query.filters {
                let actual = stored.field(field)?;
                if !actual.map(|a| a.eq_ignore_ascii_case(expected)).unwrap_or(false) {
                    matched = false;
                    break;
                }
            }
            if matched {
                matches.push(stored);
            }
        }

        Ok(Page {
            href: Some(application.accounts.href.clone()),
            offset,
            limit,
            size: matches.len(),
            items: matches
                .into_iter()
                .skip(offset)
                .take(limit)
                .map(|stored| stored.view(query.expand_custom_data))
                .collect(),
        })
    }

    async fn save_account(&self, account: &Account) -> Result<(), StoreError> {
        let mut accounts = self.accounts.write().await;
        let index = accounts
            .iter()
            .position(|stored| stored.account.href == account.href)
            .ok_or_else(|| StoreError::NotFound(account.href.clone()))?;
        self.check_fault(FaultPoint::SaveAccount, accounts[index].email())?;

        if let Some(email) = account.email.as_deref() {
            if Self::email_taken(&accounts, email, Some(&account.href)) {
                return Err(duplicate_email());
            }
        }

        let stored = &mut accounts[index];
        let current = &mut stored.account;
        current.given_name = account.given_name.clone();
        current.middle_name = account.middle_name.clone();
        current.surname = account.surname.clone();
        current.status = account.status;
        if account.email.is_some() {
            current.email = account.email.clone();
        }
        if account.username.is_some() {
            current.username = account.username.clone();
        }
        current.modified_at = Some(Utc::now());
        if let Some(password) = account.password.as_deref() {
            stored.password_hash = Some(hash_password(password));
        }
        Ok(())
    }

    async fn save_custom_data(&self, account: &Account) -> Result<(), StoreError> {
        let mut accounts = self.accounts.write().await;
        let stored = accounts
            .iter_mut()
            .find(|stored| stored.account.href == account.href)
            .ok_or_else(|| StoreError::NotFound(account.custom_data_href()))?;
        self.check_fault(FaultPoint::SaveCustomData, stored.email())?;

        if let Some(data) = &account.custom_data {
            for (key, value) in &data.fields {
                stored.custom_data.insert(key.clone(), value.clone());
            }
        }
        Ok(())
    }

    async fn delete_account(&self, href: &str) -> Result<(), StoreError> {
        let mut accounts = self.accounts.write().await;
        let index = accounts
            .iter()
            .position(|stored| stored.account.href == href)
            .ok_or_else(|| StoreError::NotFound(href.to_string()))?;
        self.check_fault(FaultPoint::DeleteAccount, accounts[index].email())?;
        accounts.remove(index);
        Ok(())
    }

    async fn authenticate_account(
        &self,
        application: &Application,
        attempt: &LoginAttempt,
    ) -> Result<String, StoreError> {
        self.check_fault(FaultPoint::Authenticate, Some(&attempt.login))?;
        self.ensure_application(application)?;

        let rejected = || StoreError::Client {
            status: 400,
            message: "Invalid username or password.".to_string(),
        };

        let accounts = self.accounts.read().await;
        let stored = accounts
            .iter()
            .filter(|s| s.application == application.href)
            .find(|s| {
                let login = attempt.login.as_str();
                s.account.username.as_deref().map(|u| u.eq_ignore_ascii_case(login)).unwrap_or(false)
                    || s.email().map(|e| e.eq_ignore_ascii_case(login)).unwrap_or(false)
            })
            .ok_or_else(rejected)?;

        let presented = hash_password(&attempt.password);
        if stored.password_hash.as_deref() != Some(presented.as_str()) {
            return Err(rejected());
        }
        if stored.account.status != AccountStatus::Enabled {
            return Err(StoreError::Client {
                status: 400,
                message: "Login attempt failed because the Account is not enabled.".to_string(),
            });
        }
        Ok(stored.account.href.clone())
    }
}
