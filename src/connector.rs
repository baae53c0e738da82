//! The connector verbs: create, find, exists, save, updateOrCreate, all, count,
//! destroyAll, updateAll and authenticate, expressed against an [`AccountStore`].
//!
//! Fan-out verbs run at most `max_concurrency` remote calls at a time. None of them
//! roll back: a failure part way through leaves the calls already made in effect.

use futures::stream::{self, StreamExt, TryStreamExt};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::config::ConnectorConfig;
use crate::connection::{ConnectionHandle, ConnectionManager};
use crate::error::ConnectorError;
use crate::filter::{Expansion, Filter, FilterData};
use crate::locator::{locator_to_id, record_to_remote_id};
use crate::record::Record;
use crate::store::{Account, AccountQuery, AccountStore, CustomData, LoginAttempt, StoreError};
use crate::translate::{account_to_record, emails_match, merge_record_into_account, new_account_from_record};

pub struct AccountConnector {
    config: Arc<ConnectorConfig>,
    base_url: String,
    connection: ConnectionManager,
}

impl AccountConnector {
    /// Validate `config` and prepare a lazily-connecting HTTP connector. No network traffic.
    pub fn initialize(config: ConnectorConfig) -> Result<Self, ConnectorError> {
        config.validate()?;
        let base_url = config.base_url()?;
        let config = Arc::new(config);
        Ok(Self {
            connection: ConnectionManager::new(config.clone()),
            config,
            base_url,
        })
    }

    /// Same as [`initialize`](Self::initialize), over an injected store
    pub fn with_store(config: ConnectorConfig, store: Arc<dyn AccountStore>) -> Result<Self, ConnectorError> {
        config.validate()?;
        let base_url = config.base_url()?;
        let config = Arc::new(config);
        Ok(Self {
            connection: ConnectionManager::with_store(config.clone(), store),
            config,
            base_url,
        })
    }

    pub fn config(&self) -> &ConnectorConfig {
        &self.config
    }

    pub async fn connect(&self) -> Result<Arc<ConnectionHandle>, ConnectorError> {
        self.connection.connect().await
    }

    /// Create one account; returns its id
    pub async fn create(&self, record: Record) -> Result<String, ConnectorError> {
        let handle = self.connect().await?;
        self.trace(format_args!("create {:?}", record.normalized_email()));
        create_in(&handle, &record).await
    }

    /// Create every record; ids come back in input order.
    ///
    /// The first failure fails the whole batch. Creations already issued stay in place.
    pub async fn create_many(&self, records: Vec<Record>) -> Result<Vec<String>, ConnectorError> {
        let handle = self.connect().await?;
        self.trace(format_args!("create {} records", records.len()));
        let handle = handle.as_ref();

        let result: Result<Vec<String>, ConnectorError> = stream::iter(records.iter())
            .map(|record| async move { create_in(handle, record).await })
            .buffered(self.config.max_concurrency)
            .try_collect()
            .await;

        if let Err(e) = &result {
            warn!("Batch create of {} records failed: {}", records.len(), e);
        }
        result
    }

    pub async fn find(&self, id: &str) -> Result<Record, ConnectorError> {
        self.find_with(id, &[]).await
    }

    /// Find with expansions, e.g. `["customData"]`
    pub async fn find_with(&self, id: &str, include: &[String]) -> Result<Record, ConnectorError> {
        let href = record_to_remote_id(&self.base_url, id)?;
        let mut filter = Filter::new();
        filter.include(include);

        let handle = self.connect().await?;
        self.trace(format_args!("find {}", href));
        let account = handle
            .store()
            .get_account(&href, filter.expands(Expansion::CustomData))
            .await?;
        account_to_record(&account)
    }

    /// False for a missing or rejected lookup; server and transport failures propagate
    pub async fn exists(&self, id: &str) -> Result<bool, ConnectorError> {
        match self.find(id).await {
            Ok(_) => Ok(true),
            Err(
                e @ (ConnectorError::NotFound(_)
                | ConnectorError::RemoteClient { .. }
                | ConnectorError::Validation(_)
                | ConnectorError::MalformedLocator(_)),
            ) => {
                debug!("Account {} treated as absent: {}", id, e);
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    /// Write the record's fields onto the live account it identifies
    pub async fn save(&self, record: Record) -> Result<bool, ConnectorError> {
        let id = record
            .id()
            .ok_or_else(|| ConnectorError::validation("save requires an id"))?;
        let href = record_to_remote_id(&self.base_url, id)?;

        let handle = self.connect().await?;
        self.trace(format_args!("save {}", href));

        let mut account = handle.store().get_account(&href, true).await?;
        merge_record_into_account(&mut account, &record);
        persist(handle.store(), &account).await?;
        Ok(true)
    }

    /// Merge into the account identified by `id`, else by `email`, creating it when absent.
    ///
    /// The account write and the custom data write are independent: one can succeed
    /// while the other fails.
    pub async fn update_or_create(&self, record: Record) -> Result<Record, ConnectorError> {
        let handle = self.connect().await?;
        let store = handle.store();

        let existing = if let Some(id) = record.id() {
            let href = record_to_remote_id(&self.base_url, id)?;
            self.trace(format_args!("updateOrCreate by id {}", href));
            match store.get_account(&href, true).await {
                Ok(account) => Some(account),
                Err(StoreError::NotFound(_)) => None,
                Err(e) => return Err(e.into()),
            }
        } else if let Some(email) = record.normalized_email() {
            self.trace(format_args!("updateOrCreate by email {}", email));
            self.find_by_email(&handle, &email).await?
        } else {
            return Err(ConnectorError::validation("updateOrCreate requires an id or an email"));
        };

        match existing {
            Some(mut account) => {
                merge_record_into_account(&mut account, &record);
                persist(store, &account).await?;
                account_to_record(&account)
            }
            None => {
                let new = new_account_from_record(&record);
                let mut account = store.create_account(handle.application(), &new).await?;
                let href = account.custom_data_href();
                account.custom_data = Some(CustomData { href: Some(href), fields: new.custom_data });
                account_to_record(&account)
            }
        }
    }

    /// Every account matching `filter.where`, truncated to `filter.limit`
    pub async fn all(&self, filter: FilterData) -> Result<Vec<Record>, ConnectorError> {
        let filter = Filter::from_data(filter)?;
        let query = filter.to_query()?;
        let handle = self.connect().await?;
        self.trace(format_args!("all {:?}", query));

        let accounts = self.collect_accounts(&handle, &query).await?;
        let mut records = accounts.iter().map(account_to_record).collect::<Result<Vec<_>, _>>()?;
        if let Some(limit) = filter.limit_value() {
            records.truncate(limit);
        }
        Ok(records)
    }

    pub async fn count(&self, filter: FilterData) -> Result<usize, ConnectorError> {
        let query = Filter::from_data(filter)?.to_count_query()?;
        let handle = self.connect().await?;
        self.trace(format_args!("count {:?}", query));

        let page = handle
            .store()
            .search_accounts(handle.application(), &query, 0, 1)
            .await?;
        Ok(page.size)
    }

    /// Delete every matching account; returns how many were enumerated for deletion
    pub async fn destroy_all(&self, filter: FilterData) -> Result<usize, ConnectorError> {
        let query = Filter::from_data(filter)?.to_count_query()?;
        let handle = self.connect().await?;
        let hrefs: Vec<String> = self
            .collect_accounts(&handle, &query)
            .await?
            .into_iter()
            .map(|account| account.href)
            .collect();
        let total = hrefs.len();
        self.trace(format_args!("destroyAll {} accounts", total));

        let store = handle.store();
        let mut deletes = stream::iter(hrefs.iter())
            .map(|href| store.delete_account(href))
            .buffer_unordered(self.config.max_concurrency);

        let mut deleted = 0;
        while let Some(result) = deletes.next().await {
            if let Err(e) = result {
                warn!("destroyAll stopped after {} of {} deletions: {}", deleted, total, e);
                return Err(e.into());
            }
            deleted += 1;
        }
        Ok(total)
    }

    /// Overlay `fields` onto every matching account; returns how many were saved
    pub async fn update_all(&self, filter: FilterData, fields: Map<String, Value>) -> Result<usize, ConnectorError> {
        let patch = Record::from_json(Value::Object(fields))?;
        let query = Filter::from_data(filter)?.to_count_query()?;
        let handle = self.connect().await?;
        let accounts = self.collect_accounts(&handle, &query).await?;
        let total = accounts.len();
        self.trace(format_args!("updateAll {} accounts", total));

        let store = handle.store();
        let patch = &patch;
        let mut saves = stream::iter(accounts)
            .map(|mut account| async move {
                merge_record_into_account(&mut account, patch);
                persist(store, &account).await
            })
            .buffer_unordered(self.config.max_concurrency);

        let mut saved = 0;
        while let Some(result) = saves.next().await {
            if let Err(e) = result {
                warn!("updateAll stopped after {} of {} saves: {}", saved, total, e);
                return Err(e);
            }
            saved += 1;
        }
        Ok(saved)
    }

    /// Check credentials and return the matching account
    pub async fn authenticate(&self, login: &str, password: &str) -> Result<Record, ConnectorError> {
        let handle = self.connect().await?;
        self.trace(format_args!("authenticate {}", login));

        let attempt = LoginAttempt { login: login.to_string(), password: password.to_string() };
        let href = handle
            .store()
            .authenticate_account(handle.application(), &attempt)
            .await?;
        let account = handle.store().get_account(&href, false).await?;
        account_to_record(&account)
    }

    async fn find_by_email(
        &self,
        handle: &ConnectionHandle,
        email: &str,
    ) -> Result<Option<Account>, ConnectorError> {
        let query = AccountQuery::new().with_filter("email", email).expanded();
        let accounts = self.collect_accounts(handle, &query).await?;
        Ok(accounts.into_iter().find(|account| emails_match(account, email)))
    }

    /// Walk every page of a search
    async fn collect_accounts(
        &self,
        handle: &ConnectionHandle,
        query: &AccountQuery,
    ) -> Result<Vec<Account>, ConnectorError> {
        let mut accounts = Vec::new();
        let mut offset = 0;
        loop {
            let page = handle
                .store()
                .search_accounts(handle.application(), query, offset, self.config.page_size)
                .await?;
            let received = page.items.len();
            accounts.extend(page.items);
            offset += received;
            if received == 0 || offset >= page.size {
                break;
            }
        }
        Ok(accounts)
    }

    fn trace(&self, message: fmt::Arguments<'_>) {
        if self.config.debug {
            debug!("{}", message);
        }
    }
}

async fn create_in(handle: &ConnectionHandle, record: &Record) -> Result<String, ConnectorError> {
    let new = new_account_from_record(record);
    let account = handle
        .store()
        .create_account(handle.application(), &new)
        .await?;
    locator_to_id(&account.href)
}

/// Save standard fields, and custom data alongside when there is any
async fn persist(store: &dyn AccountStore, account: &Account) -> Result<(), ConnectorError> {
    if account.has_custom_fields() {
        futures::try_join!(store.save_account(account), store.save_custom_data(account))?;
    } else {
        store.save_account(account).await?;
    }
    Ok(())
}
