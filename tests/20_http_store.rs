mod common;

use account_connector::filter::FilterData;
use account_connector::store::{FaultPoint, StoreError};
use account_connector::ConnectorError;
use anyhow::Result;
use serde_json::json;

#[tokio::test]
async fn crud_over_http() -> Result<()> {
    let remote = common::FakeRemote::spawn().await?;
    let connector = remote.connector()?;

    let id = connector
        .create(common::record(json!({
            "givenName": "Randall",
            "surname": "Degges",
            "email": "Randall@Example.com",
            "password": "Changeme1!",
            "favoriteColor": "blue"
        })))
        .await?;

    let found = connector.find(&id).await?;
    assert_eq!(found.id.as_deref(), Some(id.as_str()));
    assert_eq!(found.email.as_deref(), Some("randall@example.com"));
    assert!(found.custom_data.is_none(), "custom data must be absent when not expanded");

    let expanded = connector.find_with(&id, &["customData".to_string()]).await?;
    assert_eq!(expanded.custom_data.unwrap()["favoriteColor"], json!("blue"));

    assert!(connector.save(common::record(json!({ "id": id, "surname": "D", "level": 2 }))).await?);
    let saved = connector.find_with(&id, &["customData".to_string()]).await?;
    assert_eq!(saved.surname.as_deref(), Some("D"));
    assert_eq!(saved.given_name.as_deref(), Some("Randall"));
    let custom_data = saved.custom_data.unwrap();
    assert_eq!(custom_data["level"], json!(2));
    assert_eq!(custom_data["favoriteColor"], json!("blue"));

    assert_eq!(connector.count(FilterData::default()).await?, 1);
    assert_eq!(connector.destroy_all(FilterData::default()).await?, 1);
    assert!(!connector.exists(&id).await?);
    Ok(())
}

#[tokio::test]
async fn query_pages_through_http_collection() -> Result<()> {
    let remote = common::FakeRemote::spawn().await?;
    let mut config = remote.config();
    config.page_size = 3;
    let connector = account_connector::AccountConnector::initialize(config)?;

    let records = (0..7)
        .map(|i| common::person("Page", &format!("Member{}", i), &format!("member{}@example.com", i)))
        .collect();
    connector.create_many(records).await?;

    let all = connector.all(FilterData::default()).await?;
    assert_eq!(all.len(), 7);

    let filter: FilterData = serde_json::from_value(json!({ "where": { "surname": "Member4" } }))?;
    let matched = connector.all(filter).await?;
    assert_eq!(matched.len(), 1);
    assert_eq!(matched[0].email.as_deref(), Some("member4@example.com"));
    Ok(())
}

#[tokio::test]
async fn authenticate_over_http() -> Result<()> {
    let remote = common::FakeRemote::spawn().await?;
    let connector = remote.connector()?;
    let id = connector.create(common::person("Ann", "Lee", "ann@example.com")).await?;

    let record = connector.authenticate("ann@example.com", "Changeme1!").await?;
    assert_eq!(record.id.as_deref(), Some(id.as_str()));

    let err = connector.authenticate("ann@example.com", "wrong").await.unwrap_err();
    assert!(matches!(err, ConnectorError::RemoteClient { status: 400, .. }), "unexpected error: {err:?}");
    Ok(())
}

#[tokio::test]
async fn remote_statuses_map_to_error_kinds() -> Result<()> {
    let remote = common::FakeRemote::spawn().await?;
    let connector = remote.connector()?;

    assert!(connector.find("does-not-exist").await.unwrap_err().is_not_found());

    connector.create(common::person("Ann", "Lee", "ann@example.com")).await?;
    let duplicate = connector.create(common::person("Ann", "Lee", "ANN@example.com")).await.unwrap_err();
    assert!(matches!(duplicate, ConnectorError::RemoteClient { status: 409, .. }), "unexpected error: {duplicate:?}");

    remote.store.fail(FaultPoint::GetAccount, StoreError::from_status(500, "boom"));
    let err = connector.exists("anything").await.unwrap_err();
    assert!(matches!(err, ConnectorError::RemoteServer { status: 500, .. }), "unexpected error: {err:?}");
    Ok(())
}

#[tokio::test]
async fn ids_outside_the_accounts_collection_are_rejected() -> Result<()> {
    let remote = common::FakeRemote::spawn().await?;
    let connector = remote.connector()?;
    connector.create(common::person("Ann", "Lee", "ann@example.com")).await?;

    for id in ["../applications/test", "..", "x%2F..%2Fapplications%2Ftest", "x?expand=customData"] {
        let err = connector.find(id).await.unwrap_err();
        assert!(matches!(err, ConnectorError::Validation(_)), "unexpected error for {id}: {err:?}");
        assert!(!connector.exists(id).await?, "{id} must not resolve to a resource");
    }

    let escaped = json!({ "id": "../applications/test", "givenName": "Mallory", "email": "mallory@example.com" });
    let err = connector.save(common::record(escaped.clone())).await.unwrap_err();
    assert!(matches!(err, ConnectorError::Validation(_)), "unexpected error: {err:?}");
    let err = connector.update_or_create(common::record(escaped)).await.unwrap_err();
    assert!(matches!(err, ConnectorError::Validation(_)), "unexpected error: {err:?}");

    assert_eq!(connector.count(FilterData::default()).await?, 1);
    Ok(())
}

#[tokio::test]
async fn wrong_credentials_fail_to_connect() -> Result<()> {
    let remote = common::FakeRemote::spawn().await?;
    let mut config = remote.config();
    config.api_key_secret = "not-the-secret".into();
    let connector = account_connector::AccountConnector::initialize(config)?;

    let err = connector.count(FilterData::default()).await.unwrap_err();
    assert!(matches!(err, ConnectorError::Connection(_)), "unexpected error: {err:?}");
    Ok(())
}
