mod common;

use account_connector::filter::FilterData;
use account_connector::store::{FaultPoint, StoreError};
use account_connector::ConnectorError;
use anyhow::Result;
use serde_json::json;

#[tokio::test]
async fn partial_update_keeps_existing_fields_and_custom_data() -> Result<()> {
    let (connector, _) = common::memory_connector();
    let id = connector
        .create(common::record(json!({
            "givenName": "Randall",
            "middleName": "M",
            "surname": "Degges",
            "email": "randall@example.com",
            "team": "red",
            "level": 3
        })))
        .await?;

    let merged = connector
        .update_or_create(common::record(json!({ "id": id, "email": "rdegges@example.com" })))
        .await?;
    assert_eq!(merged.email.as_deref(), Some("rdegges@example.com"));

    let found = connector.find_with(&id, &["customData".to_string()]).await?;
    assert_eq!(found.given_name.as_deref(), Some("Randall"));
    assert_eq!(found.middle_name.as_deref(), Some("M"));
    assert_eq!(found.surname.as_deref(), Some("Degges"));
    assert_eq!(found.email.as_deref(), Some("rdegges@example.com"));
    let custom_data = found.custom_data.unwrap();
    assert_eq!(custom_data["team"], json!("red"));
    assert_eq!(custom_data["level"], json!(3));
    Ok(())
}

#[tokio::test]
async fn email_lookup_is_case_insensitive() -> Result<()> {
    let (connector, _) = common::memory_connector();
    let id = connector.create(common::person("Foo", "Bar", "Foo@Bar.com")).await?;

    let merged = connector
        .update_or_create(common::record(json!({ "email": "foo@bar.com", "givenName": "Fooey" })))
        .await?;

    assert_eq!(merged.id.as_deref(), Some(id.as_str()));
    assert_eq!(connector.count(FilterData::default()).await?, 1);
    assert_eq!(connector.find(&id).await?.given_name.as_deref(), Some("Fooey"));
    Ok(())
}

#[tokio::test]
async fn creates_when_no_match() -> Result<()> {
    let (connector, _) = common::memory_connector();

    let created = connector
        .update_or_create(common::record(json!({
            "givenName": "New",
            "surname": "Person",
            "email": "New.Person@Example.com",
            "nickname": "np"
        })))
        .await?;

    let id = created.id.clone().expect("created record has an id");
    assert_eq!(created.email.as_deref(), Some("new.person@example.com"));
    assert_eq!(created.custom_data.unwrap()["nickname"], json!("np"));

    let found = connector.find_with(&id, &["customData".to_string()]).await?;
    assert_eq!(found.custom_data.unwrap()["nickname"], json!("np"));
    Ok(())
}

#[tokio::test]
async fn unknown_id_falls_back_to_create() -> Result<()> {
    let (connector, _) = common::memory_connector();

    let created = connector
        .update_or_create(common::record(json!({
            "id": "gone",
            "givenName": "Re",
            "surname": "Born",
            "email": "reborn@example.com"
        })))
        .await?;

    assert_ne!(created.id.as_deref(), Some("gone"));
    assert_eq!(connector.count(FilterData::default()).await?, 1);
    Ok(())
}

#[tokio::test]
async fn requires_id_or_email() {
    let (connector, _) = common::memory_connector();
    let err = connector
        .update_or_create(common::record(json!({ "givenName": "Nobody" })))
        .await
        .unwrap_err();
    assert!(matches!(err, ConnectorError::Validation(_)), "unexpected error: {err:?}");
}

#[tokio::test]
async fn account_and_custom_data_writes_are_not_atomic() -> Result<()> {
    let (connector, store) = common::memory_connector();
    let id = connector
        .create(common::record(json!({
            "givenName": "Ann",
            "surname": "Lee",
            "email": "ann@example.com",
            "team": "red"
        })))
        .await?;

    store.fail_for_email(FaultPoint::SaveCustomData, "ann@example.com", StoreError::from_status(500, "boom"));

    let err = connector
        .update_or_create(common::record(json!({ "id": id, "surname": "Park", "team": "blue" })))
        .await
        .unwrap_err();
    assert!(matches!(err, ConnectorError::RemoteServer { status: 500, .. }), "unexpected error: {err:?}");

    store.clear_faults();
    let found = connector.find_with(&id, &["customData".to_string()]).await?;
    assert_eq!(found.surname.as_deref(), Some("Park"), "standard fields were written");
    assert_eq!(found.custom_data.unwrap()["team"], json!("red"), "custom data write failed");
    Ok(())
}

#[tokio::test]
async fn server_error_on_lookup_is_not_treated_as_absent() -> Result<()> {
    let (connector, store) = common::memory_connector();
    let id = connector.create(common::person("Ann", "Lee", "ann@example.com")).await?;
    store.fail(FaultPoint::GetAccount, StoreError::from_status(502, "bad gateway"));

    let err = connector
        .update_or_create(common::record(json!({ "id": id, "surname": "Park" })))
        .await
        .unwrap_err();
    assert!(err.is_server_error());

    store.clear_faults();
    assert_eq!(connector.count(FilterData::default()).await?, 1);
    Ok(())
}
