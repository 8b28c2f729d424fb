//! `PostgreSQL` store tests.
//!
//! These run only when `DSC_DATABASE_URL` (or `DATABASE_URL`) points at a
//! disposable database; otherwise each test returns immediately. Store-level
//! tests work inside a transaction that is never committed. The HTTP test
//! commits, so it uses fresh logins and only asserts on rows it created.
//!
//! Run with: `DSC_DATABASE_URL=postgres://localhost/dsc_test cargo test -p dsc-integration-tests`

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use axum::http::{Method, StatusCode};
use serde_json::json;

use dsc_api::db::{AddressStore, Database, ProfileStore, RepositoryError};
use dsc_api::models::{Address, NewProfile};
use dsc_core::{AddressId, Login};
use dsc_integration_tests::{TestContext, postgres_database, unique_login};

fn address(street: &str) -> Address {
    Address {
        street_address: street.to_owned(),
        postal_code: Some("75001".to_owned()),
        city: "Paris".to_owned(),
        country: Some("France".to_owned()),
        ..Address::default()
    }
}

fn new_profile(prefix: &str) -> NewProfile {
    NewProfile {
        user_login: Login::parse(&unique_login(prefix)).unwrap(),
        display_name: None,
    }
}

#[tokio::test]
async fn test_pg_linked_profile_is_reported_on_address() {
    let Some(db) = postgres_database().await else {
        return;
    };
    let mut tx = db.begin().await.unwrap();

    let saved = tx.save_address(address("1 Rue de Rivoli")).await.unwrap();
    assert_eq!(saved.profile_id, None);

    let mut profile = tx.insert_profile(new_profile("alice")).await.unwrap();
    profile.address_id = saved.id;
    tx.save_profile(&profile).await.unwrap();

    let found = tx.find_address(saved.id.unwrap()).await.unwrap().unwrap();
    assert_eq!(found.profile_id, Some(profile.id));
    assert_eq!(found.street_address, "1 Rue de Rivoli");
}

#[tokio::test]
async fn test_pg_save_with_id_replaces_every_field() {
    let Some(db) = postgres_database().await else {
        return;
    };
    let mut tx = db.begin().await.unwrap();

    let saved = tx.save_address(address("1 Rue de Rivoli")).await.unwrap();
    let replaced = tx
        .save_address(Address {
            id: saved.id,
            street_address: "2 Quai d'Orsay".to_owned(),
            city: "Lyon".to_owned(),
            ..Address::default()
        })
        .await
        .unwrap();

    assert_eq!(replaced.id, saved.id);
    assert_eq!(replaced.street_address, "2 Quai d'Orsay");
    assert_eq!(replaced.city, "Lyon");
    assert_eq!(replaced.postal_code, None);
    assert_eq!(replaced.country, None);
}

#[tokio::test]
async fn test_pg_save_with_unknown_id_inserts_and_advances_sequence() {
    let Some(db) = postgres_database().await else {
        return;
    };
    let mut tx = db.begin().await.unwrap();

    let base = tx.save_address(address("1 Main St")).await.unwrap();
    let chosen = AddressId::new(base.id.unwrap().as_i64() + 1_000_000);

    let upserted = tx
        .save_address(Address {
            id: Some(chosen),
            ..address("Chosen St")
        })
        .await
        .unwrap();
    let next = tx.save_address(address("Next St")).await.unwrap();

    assert_eq!(upserted.id, Some(chosen));
    assert!(next.id.unwrap() > chosen);
}

#[tokio::test]
async fn test_pg_delete_clears_profile_link() {
    let Some(db) = postgres_database().await else {
        return;
    };
    let mut tx = db.begin().await.unwrap();

    let saved = tx.save_address(address("1 Main St")).await.unwrap();
    let mut profile = tx.insert_profile(new_profile("alice")).await.unwrap();
    profile.address_id = saved.id;
    tx.save_profile(&profile).await.unwrap();

    assert!(tx.delete_address(saved.id.unwrap()).await.unwrap());
    assert!(!tx.delete_address(saved.id.unwrap()).await.unwrap());

    let profiles = tx.profiles_by_login(&profile.user_login).await.unwrap();
    assert_eq!(profiles.len(), 1);
    assert_eq!(profiles.first().unwrap().address_id, None);
}

#[tokio::test]
async fn test_pg_address_cannot_have_two_owners() {
    let Some(db) = postgres_database().await else {
        return;
    };
    let mut tx = db.begin().await.unwrap();

    let saved = tx.save_address(address("1 Main St")).await.unwrap();
    let mut alice = tx.insert_profile(new_profile("alice")).await.unwrap();
    let mut bob = tx.insert_profile(new_profile("bob")).await.unwrap();

    alice.address_id = saved.id;
    tx.save_profile(&alice).await.unwrap();

    bob.address_id = saved.id;
    let result = tx.save_profile(&bob).await;
    assert!(matches!(result, Err(RepositoryError::Conflict(_))));
}

#[tokio::test]
async fn test_pg_http_create_link_and_unlinked_filter() {
    let Some(db) = postgres_database().await else {
        return;
    };
    let ctx = TestContext::with_database(Arc::new(db));
    let login = unique_login("carol");
    ctx.seed_profile(&login).await;
    let user = ctx.login_user(&login).await;
    let admin = ctx.login_admin(&unique_login("admin")).await;

    let body = |street: &str| json!({ "streetAddress": street, "city": "Paris" });
    let first = ctx
        .send(Method::POST, "/api/addresses", Some(&user), Some(body("1 Main St")))
        .await;
    let second = ctx
        .send(Method::POST, "/api/addresses", Some(&user), Some(body("2 Main St")))
        .await;
    assert_eq!(first.status, StatusCode::CREATED);
    assert_eq!(second.status, StatusCode::CREATED);
    let first_id = first.body["id"].as_i64().unwrap();
    let second_id = second.body["id"].as_i64().unwrap();

    let unlinked = ctx
        .send(
            Method::GET,
            "/api/addresses?filter=profile-is-null",
            Some(&admin),
            None,
        )
        .await;
    let unlinked_ids: Vec<i64> = unlinked
        .body
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["id"].as_i64().unwrap())
        .collect();
    assert!(unlinked_ids.contains(&first_id));
    assert!(!unlinked_ids.contains(&second_id));

    let own = ctx
        .send(Method::GET, "/api/addresses", Some(&user), None)
        .await;
    assert_eq!(own.body, json!([second.body]));

    let deleted = ctx
        .send(
            Method::DELETE,
            &format!("/api/addresses/{second_id}"),
            Some(&admin),
            None,
        )
        .await;
    assert_eq!(deleted.status, StatusCode::NO_CONTENT);
    assert_eq!(ctx.profiles_of(&login).await[0].address_id, None);
}
