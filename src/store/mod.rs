//! Remote account store: the collaborator every connector operation talks to.
//!
//! [`HttpAccountStore`] speaks the identity service's REST dialect;
//! [`MemoryAccountStore`] keeps everything in process for tests and demos.

pub mod error;
pub mod http;
pub mod memory;
pub mod models;

use async_trait::async_trait;

pub use error::StoreError;
pub use http::HttpAccountStore;
pub use memory::{FaultPoint, MemoryAccountStore};
pub use models::{
    Account, AccountQuery, AccountStatus, Application, CustomData, LoginAttempt, NewAccount, Page,
    ResourceRef,
};

#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Resolve the application scope by href
    async fn get_application(&self, href: &str) -> Result<Application, StoreError>;

    async fn create_account(
        &self,
        application: &Application,
        account: &NewAccount,
    ) -> Result<Account, StoreError>;

    /// Fetch one account; custom data is only materialized when `expand_custom_data` is set
    async fn get_account(&self, href: &str, expand_custom_data: bool) -> Result<Account, StoreError>;

    async fn search_accounts(
        &self,
        application: &Application,
        query: &AccountQuery,
        offset: usize,
        limit: usize,
    ) -> Result<Page<Account>, StoreError>;

    /// Persist the standard fields (and password, when set)
    async fn save_account(&self, account: &Account) -> Result<(), StoreError>;

    /// Persist the account's custom data fields
    async fn save_custom_data(&self, account: &Account) -> Result<(), StoreError>;

    async fn delete_account(&self, href: &str) -> Result<(), StoreError>;

    /// Check credentials; returns the href of the authenticated account
    async fn authenticate_account(
        &self,
        application: &Application,
        attempt: &LoginAttempt,
    ) -> Result<String, StoreError>;
}
