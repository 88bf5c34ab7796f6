//! Storage adapter against a real Postgres.
//!
//! Needs `DATABASE_URL` pointing at a server where the test user may create
//! databases. Run with `cargo test -- --ignored`.

use std::path::Path;

use sqlx::PgPool;
use tracing::Span;
use uuid::Uuid;

use users_api::context::Context;
use users_api::models::User;
use users_api::storage::migrations::run_migrations;
use users_api::storage::{PgUsersStorage, StorageError, UsersStorage};

fn storage(pool: PgPool) -> PgUsersStorage {
    PgUsersStorage::new(pool, Span::none())
}

fn user(login: &str) -> User {
    User {
        id: Uuid::new_v4(),
        login: login.to_owned(),
        password: "p".to_owned(),
    }
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn insert_then_read_back(pool: PgPool) {
    let store = storage(pool);
    let ctx = Context::background();
    let alice = user("alice");

    assert_eq!(store.insert_user(&ctx, alice.clone()).await.unwrap(), alice);
    assert_eq!(store.get_user_by_id(&ctx, alice.id).await.unwrap(), alice);
    assert_eq!(store.get_users(&ctx).await.unwrap(), vec![alice]);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn uniqueness_violations_are_already_exists(pool: PgPool) {
    let store = storage(pool);
    let ctx = Context::background();
    let alice = user("alice");
    store.insert_user(&ctx, alice.clone()).await.unwrap();

    let same_login = user("alice");
    assert!(matches!(
        store.insert_user(&ctx, same_login).await,
        Err(StorageError::AlreadyExists)
    ));

    let same_id = User {
        login: "bob".to_owned(),
        ..alice
    };
    assert!(matches!(
        store.insert_user(&ctx, same_id).await,
        Err(StorageError::AlreadyExists)
    ));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn missing_ids_are_not_found(pool: PgPool) {
    let store = storage(pool);
    let ctx = Context::background();
    let id = Uuid::new_v4();

    assert!(matches!(
        store.get_user_by_id(&ctx, id).await,
        Err(StorageError::NotFound)
    ));
    assert!(matches!(
        store.update_user(&ctx, id, user("ghost")).await,
        Err(StorageError::NotFound)
    ));
    assert!(matches!(
        store.delete_user(&ctx, id).await,
        Err(StorageError::NotFound)
    ));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn update_replaces_and_delete_returns_prior_row(pool: PgPool) {
    let store = storage(pool);
    let ctx = Context::background();
    let alice = user("alice");
    store.insert_user(&ctx, alice.clone()).await.unwrap();

    let replacement = User {
        id: alice.id,
        login: "alice2".to_owned(),
        password: "new".to_owned(),
    };
    let updated = store
        .update_user(&ctx, alice.id, replacement.clone())
        .await
        .unwrap();
    assert_eq!(updated, replacement);
    assert_eq!(
        store.get_user_by_id(&ctx, alice.id).await.unwrap(),
        replacement
    );

    assert_eq!(store.delete_user(&ctx, alice.id).await.unwrap(), replacement);
    assert!(matches!(
        store.get_user_by_id(&ctx, alice.id).await,
        Err(StorageError::NotFound)
    ));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn cancelled_context_never_reaches_the_database(pool: PgPool) {
    let store = storage(pool);
    let (ctx, handle) = Context::new();
    handle.cancel();

    assert!(matches!(
        store.insert_user(&ctx, user("alice")).await,
        Err(StorageError::Cancelled)
    ));
    let users = store.get_users(&Context::background()).await.unwrap();
    assert!(users.is_empty());
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn undecodable_rows_are_left_out_of_the_listing(pool: PgPool) {
    sqlx::query("ALTER TABLE users ALTER COLUMN password DROP NOT NULL")
        .execute(&pool)
        .await
        .unwrap();
    let store = storage(pool.clone());
    let ctx = Context::background();
    let good = user("alice");
    store.insert_user(&ctx, good.clone()).await.unwrap();

    sqlx::query("INSERT INTO users (id, login, password) VALUES ($1, $2, NULL)")
        .bind(Uuid::new_v4())
        .bind("broken")
        .execute(&pool)
        .await
        .unwrap();

    assert_eq!(store.get_users(&ctx).await.unwrap(), vec![good]);
}

#[sqlx::test(migrations = false)]
#[ignore = "requires DATABASE_URL"]
async fn migrations_are_idempotent(pool: PgPool) {
    let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("migrations");

    run_migrations(&pool, &dir).await.unwrap();
    run_migrations(&pool, &dir).await.unwrap();

    let applied: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(applied, 1);
}
