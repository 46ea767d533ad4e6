//! Shared test infrastructure.
//!
//! - `setup_test_db()` - in-memory SQLite with all migrations applied
//! - `test_state()` - `AppState` over a fresh database with the log mailer
//! - `test_app!` - actix test service wired like `main`

#![allow(dead_code)]

use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

use propdesk::auth::password;
use propdesk::config::AppConfig;
use propdesk::mail::Mailer;
use propdesk::models::proposal::{self, NewProposal};
use propdesk::models::user::{self, NewUser};
use propdesk::models::workspace;
use propdesk::state::AppState;

// ============================================================================
// TEST CONSTANTS
// ============================================================================

pub const TEST_PASSWORD: &str = "password123";
pub const SESSION_KEY: &str =
    "test-session-key-test-session-key-test-session-key-test-session-key";

// ============================================================================
// DATABASE SETUP
// ============================================================================

pub struct TestDb {
    pool: SqlitePool,
}

impl TestDb {
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

/// Fresh in-memory database. A single connection that never expires keeps
/// the database alive for the whole test.
pub async fn setup_test_db() -> TestDb {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .expect("Invalid sqlite url")
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .expect("Failed to open in-memory database");
    propdesk::db::run_migrations(&pool)
        .await
        .expect("Failed to run migrations");
    TestDb { pool }
}

/// Defaults plus the given overrides, without touching the process env.
pub fn test_config(overrides: &[(&str, &str)]) -> AppConfig {
    let overrides: Vec<(String, String)> = overrides
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    AppConfig::from_lookup(move |key| {
        overrides
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
            .or_else(|| match key {
                "NODE_ENV" => Some("test".to_string()),
                "APP_URL" => Some("https://app.example".to_string()),
                _ => None,
            })
    })
    .expect("Invalid test config")
}

pub async fn test_state() -> AppState {
    let db = setup_test_db().await;
    let config = test_config(&[]);
    let mailer = Mailer::from_config(&config.mail, config.server.env).expect("Failed to build mailer");
    AppState::new(db.pool().clone(), config, mailer)
}

// ============================================================================
// FIXTURES
// ============================================================================

/// Create a user with a personal workspace. Returns (user id, workspace id).
pub async fn create_test_user(pool: &SqlitePool, email: &str, name: &str) -> (i64, i64) {
    let hash = password::hash_password(TEST_PASSWORD).expect("Failed to hash password");
    let user_id = user::create(
        pool,
        &NewUser {
            email: email.to_string(),
            name: name.to_string(),
            company: None,
            password_hash: hash,
        },
    )
    .await
    .expect("Failed to create user");
    let workspace_id = workspace::create(pool, &workspace::personal_workspace_name(name), user_id)
        .await
        .expect("Failed to create workspace");
    (user_id, workspace_id)
}

pub fn new_proposal(workspace_id: i64, owner_id: i64, title: &str) -> NewProposal {
    NewProposal {
        workspace_id,
        owner_id,
        template_id: None,
        title: title.to_string(),
        content: "Scope of work".to_string(),
        client_name: "Bea Client".to_string(),
        client_email: "bea@client.example".to_string(),
        amount_cents: Some(150_000),
        currency: "EUR".to_string(),
        valid_until: Some("2030-01-31".to_string()),
    }
}

pub async fn create_test_proposal(pool: &SqlitePool, workspace_id: i64, owner_id: i64, title: &str) -> i64 {
    proposal::create(pool, &new_proposal(workspace_id, owner_id, title))
        .await
        .expect("Failed to create proposal")
}

// ============================================================================
// HTTP
// ============================================================================

/// Build an actix test service the way `main` wires the real server.
#[macro_export]
macro_rules! test_app {
    ($state:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .wrap(actix_web::middleware::from_fn(propdesk::auth::middleware::cors))
                .wrap(propdesk::session_middleware(
                    actix_web::cookie::Key::from($crate::common::SESSION_KEY.as_bytes()),
                    false,
                ))
                .app_data($state.clone())
                .configure(propdesk::handlers::configure),
        )
        .await
    };
}

/// The session cookie set by a response, if any.
pub fn session_cookie<B>(resp: &actix_web::dev::ServiceResponse<B>) -> Option<actix_web::cookie::Cookie<'static>> {
    resp.response()
        .cookies()
        .find(|c| c.name() == "propdesk_session")
        .map(|c| c.into_owned())
}
