use actix_web::{HttpResponse, Responder, get, web};
use chrono::Utc;
use serde_json::json;

use crate::notify::MailApiNotifier;
use crate::source::BcvSource;
use crate::store::PgRateStore;
use crate::{ingest, publish};

/// Shared state behind the cron endpoints.
pub struct AppState {
    pub store: PgRateStore,
    pub source: BcvSource,
    pub notifier: MailApiNotifier,
    pub admin_email: String,
    pub public_base_url: String,
}

/// Scrapes the BCV page and upserts the day's rate interval.
#[get("/api/cron/bcv")]
pub async fn cron_bcv(state: web::Data<AppState>) -> impl Responder {
    let today = Utc::now().date_naive();

    match ingest::run(&state.source, &state.store, today).await {
        Ok(outcome) => HttpResponse::Ok().json(json!({
            "message": "Scraping completado y guardado en TasaBcv",
            "tasa_bcv": outcome.rate.to_string(),
            "fecha_valor": outcome.effective_date.to_string(),
        })),
        Err(error) => {
            log::error!("BCV ingestion failed: {error}");
            HttpResponse::InternalServerError().json(json!({
                "message": "Error interno del servidor",
                "error": error.to_string(),
            }))
        }
    }
}

/// Publishes the rate active today as the `tasa_bcv` parameter.
#[get("/api/cron/update-active-rate")]
pub async fn cron_update_active_rate(state: web::Data<AppState>) -> impl Responder {
    let today = publish::caracas_today();

    match publish::run(
        &state.store,
        &state.notifier,
        &state.admin_email,
        &state.public_base_url,
        today,
    )
    .await
    {
        Ok(success) => HttpResponse::Ok().json(json!({
            "message": "Parámetro de tasa_bcv actualizado con éxito.",
            "tasa_activa": success.formatted_rate,
            "email_preview_url": success.confirmation,
        })),
        Err(failure) => match failure.notification {
            Ok(confirmation) => HttpResponse::InternalServerError().json(json!({
                "message": "Error interno del servidor. Se envió correo de notificación.",
                "error": failure.error.to_string(),
                "email_preview_url": confirmation,
            })),
            Err(_) => HttpResponse::InternalServerError().json(json!({
                "message": "Error interno del servidor. Falló también el envío de correo de notificación.",
                "error": failure.error.to_string(),
            })),
        },
    }
}

#[get("/health")]
pub async fn health() -> impl Responder {
    HttpResponse::Ok().json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
