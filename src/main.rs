use actix_web::{App, HttpServer, middleware, web};

use propdesk::auth::middleware::cors;
use propdesk::config::AppConfig;
use propdesk::mail::Mailer;
use propdesk::notifications::scheduler;
use propdesk::state::AppState;
use propdesk::{db, handlers, session_key, session_middleware};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = AppConfig::from_env().map_err(|e| {
        log::error!("Configuration error: {e}");
        std::io::Error::other(e.to_string())
    })?;

    db::ensure_data_dir(&config.database_url)?;
    let pool = db::init_pool(&config.database_url)
        .await
        .map_err(|e| std::io::Error::other(format!("Failed to open database: {e}")))?;
    db::run_migrations(&pool)
        .await
        .map_err(|e| std::io::Error::other(format!("Failed to run migrations: {e}")))?;

    let mailer = Mailer::from_config(&config.mail, config.server.env)
        .map_err(|e| std::io::Error::other(e.to_string()))?;
    log::info!("Mail provider: {}", mailer.provider());

    let secret_key = session_key(config.server.session_key.as_deref());
    let secure_cookies = config.server.env.is_production();
    let bind_addr = config.bind_addr();

    let state = web::Data::new(AppState::new(pool, config, mailer));
    scheduler::spawn_scheduler(state.clone());

    log::info!("Starting server at http://{}:{}", bind_addr.0, bind_addr.1);

    HttpServer::new(move || {
        App::new()
            .wrap(middleware::from_fn(cors))
            .wrap(session_middleware(secret_key.clone(), secure_cookies))
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(handlers::configure)
            .default_service(web::to(|| async {
                actix_web::HttpResponse::NotFound().json(propdesk::errors::ApiErrorResponse {
                    error: "Not found".to_string(),
                    details: None,
                })
            }))
    })
    .bind(bind_addr)?
    .run()
    .await
}
