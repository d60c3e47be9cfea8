use actix_web::{App, HttpServer, web};
use anyhow::Result;
use sqlx::postgres::PgPoolOptions;

use bcv_rates::config::Config;
use bcv_rates::handlers::{self, AppState};
use bcv_rates::notify::MailApiNotifier;
use bcv_rates::source::BcvSource;
use bcv_rates::store::PgRateStore;

#[actix_web::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();

    let config = Config::from_env()?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    let state = web::Data::new(AppState {
        store: PgRateStore::new(pool),
        source: BcvSource::new(&config.bcv_url),
        notifier: MailApiNotifier::new(config.mail.clone()).map_err(|e| anyhow::anyhow!("{e}"))?,
        admin_email: config.admin_email.clone(),
        public_base_url: config.public_base_url.clone(),
    });

    log::info!("listening on {}", config.bind_addr);

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .service(handlers::cron_bcv)
            .service(handlers::cron_update_active_rate)
            .service(handlers::health)
    })
    .bind(&config.bind_addr)?
    .run()
    .await?;

    Ok(())
}
