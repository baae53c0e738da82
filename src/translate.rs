//! Shape conversion between caller records and remote accounts.

use crate::error::ConnectorError;
use crate::locator::locator_to_id;
use crate::record::{normalize_email, Record};
use crate::store::{Account, CustomData, NewAccount};

/// Project an account onto the flat record shape.
///
/// `customData` is only present when the account was fetched with it expanded.
pub fn account_to_record(account: &Account) -> Result<Record, ConnectorError> {
    Ok(Record {
        id: Some(locator_to_id(&account.href)?),
        given_name: account.given_name.clone(),
        surname: account.surname.clone(),
        middle_name: account.middle_name.clone(),
        email: account.email.clone(),
        password: None,
        custom_data: account.custom_data.as_ref().map(|data| data.fields.clone()),
        extra: Default::default(),
    })
}

/// Overlay a record onto an existing account.
///
/// Standard fields are copied only when the incoming value is present and non-blank;
/// the account keeps its value otherwise. Every non-reserved key goes into custom data.
pub fn merge_record_into_account(account: &mut Account, record: &Record) {
    overlay(&mut account.given_name, &record.given_name);
    overlay(&mut account.surname, &record.surname);
    overlay(&mut account.middle_name, &record.middle_name);
    if let Some(email) = record.normalized_email() {
        account.email = Some(email);
    }
    if let Some(password) = record.password.as_deref().filter(|p| !p.is_empty()) {
        account.password = Some(password.to_string());
    }

    let fields = record.custom_fields();
    if !fields.is_empty() {
        let data: &mut CustomData = account.custom_data_mut();
        data.fields.extend(fields);
    }
}

fn overlay(target: &mut Option<String>, incoming: &Option<String>) {
    if let Some(value) = incoming.as_deref().filter(|v| !v.trim().is_empty()) {
        *target = Some(value.to_string());
    }
}

/// Creation payload for a record; email is stored normalized
pub fn new_account_from_record(record: &Record) -> NewAccount {
    NewAccount {
        username: None,
        email: record.normalized_email(),
        given_name: record.given_name.clone(),
        middle_name: record.middle_name.clone(),
        surname: record.surname.clone(),
        password: record.password.clone(),
        custom_data: record.custom_fields(),
    }
}

pub fn emails_match(account: &Account, normalized: &str) -> bool {
    account.email.as_deref().map(normalize_email).as_deref() == Some(normalized)
}
