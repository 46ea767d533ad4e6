use crate::auth::rate_limit::RateLimiter;
use crate::cache::TtlCache;
use crate::config::AppConfig;
use crate::db::DbPool;
use crate::mail::Mailer;
use crate::models::template::Template;
use crate::models::user::User;
use crate::notifications::NotificationHub;

/// Shared application state, registered once as `web::Data<AppState>`.
pub struct AppState {
    pub pool: DbPool,
    pub config: AppConfig,
    pub mailer: Mailer,
    /// user id -> profile, read by `AuthContext` on every request.
    pub identities: TtlCache<i64, User>,
    /// user id -> template list.
    pub templates: TtlCache<i64, Vec<Template>>,
    pub rate_limiter: RateLimiter,
    pub hub: NotificationHub,
}

impl AppState {
    pub fn new(pool: DbPool, config: AppConfig, mailer: Mailer) -> Self {
        let ttl = config.cache.ttl;
        AppState {
            pool,
            config,
            mailer,
            identities: TtlCache::new(ttl),
            templates: TtlCache::new(ttl),
            rate_limiter: RateLimiter::new(),
            hub: NotificationHub::new(),
        }
    }

    /// Public recipient link for a proposal token.
    pub fn public_link(&self, access_token: &str) -> String {
        format!("{}/p/{access_token}", self.config.server.app_url)
    }

    /// Link to a proposal inside the app.
    pub fn proposal_link(&self, proposal_id: i64) -> String {
        format!("{}/proposals/{proposal_id}", self.config.server.app_url)
    }
}
