use actix_web::{App, HttpServer, middleware, web};

use polls::auth::{rate_limit::RateLimiter, session};
use polls::config::Config;
use polls::db;
use polls::handlers;
use polls::store::{MemoryStore, PgStore, PollStore};

fn io_error(e: impl std::fmt::Display) -> std::io::Error {
    std::io::Error::other(e.to_string())
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();

    let config = Config::from_env();

    match config.database_url.as_deref() {
        Some(url) => {
            let pool = db::init_pool(url, config.max_connections)
                .await
                .map_err(io_error)?;
            db::run_migrations(&pool).await.map_err(io_error)?;
            serve(PgStore::new(pool), config).await
        }
        None => {
            log::warn!("DATABASE_URL not set, using the in-memory store (data is lost on exit)");
            serve(MemoryStore::new(), config).await
        }
    }
}

async fn serve<S>(store: S, config: Config) -> std::io::Result<()>
where
    S: PollStore + Clone + Send + 'static,
{
    if let Some(admin) = &config.admin {
        db::seed_admin(&store, admin).await.map_err(io_error)?;
    }
    if config.seed_demo {
        db::seed_demo(&store).await.map_err(io_error)?;
    }

    let limiter = RateLimiter::default();
    let settings = config.poll_settings();
    let secret_key = config.session_key.clone();
    let cookie_secure = config.cookie_secure;

    log::info!("Starting server at http://{}", config.bind_addr);

    HttpServer::new(move || {
        App::new()
            .wrap(session::middleware(secret_key.clone(), cookie_secure))
            .wrap(middleware::Logger::default())
            .app_data(web::Data::new(store.clone()))
            .app_data(web::Data::new(limiter.clone()))
            .app_data(web::Data::new(settings))
            .service(actix_files::Files::new("/static", "./static"))
            .configure(handlers::routes::<S>)
            // Default 404 handler (must be registered last)
            .default_service(web::to(handlers::not_found))
    })
    .bind(&config.bind_addr)?
    .run()
    .await
}
