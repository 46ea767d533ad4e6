pub mod auth;
pub mod cache;
pub mod config;
pub mod db;
pub mod dto;
pub mod errors;
pub mod handlers;
pub mod mail;
pub mod models;
pub mod notifications;
pub mod state;

use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::Key;

/// Session key from SESSION_KEY, or a random one when unset or too short.
pub fn session_key(configured: Option<&str>) -> Key {
    match configured {
        Some(val) if val.len() >= 64 => {
            log::info!("Using SESSION_KEY from environment");
            Key::from(val.as_bytes())
        }
        Some(val) => {
            log::warn!("SESSION_KEY too short ({} bytes, need 64+), generating random key", val.len());
            Key::generate()
        }
        None => {
            log::warn!("No SESSION_KEY set, generating random key (sessions lost on restart)");
            Key::generate()
        }
    }
}

/// Cookie session middleware. Secure cookies are required in production.
pub fn session_middleware(key: Key, secure: bool) -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), key)
        .cookie_name("propdesk_session".to_string())
        .cookie_secure(secure)
        .cookie_http_only(true)
        .build()
}
