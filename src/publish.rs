use chrono::{NaiveDate, Utc};
use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::RateError;
use crate::model::ACTIVE_RATE_KEY;
use crate::notify::{self, Notifier};
use crate::store::{ParameterStore, RateStore};

const SUCCESS_SUBJECT: &str = "Tasa de BCV Actualizada";
const FAILURE_SUBJECT: &str = "Error al Actualizar Tasa de BCV";

/// Outcome of a successful publication run.
#[derive(Debug)]
pub struct PublishSuccess {
    pub formatted_rate: String,
    pub confirmation: String,
}

/// A failed run, together with the outcome of the failure notification
/// that was attempted afterwards. A `notification` error is the distinct
/// double-fault case.
#[derive(Debug)]
pub struct PublishFailure {
    pub error: RateError,
    pub notification: Result<String, RateError>,
}

/// The current calendar date in the fixed civil timezone the rate applies
/// to. Venezuela does not observe DST, but the conversion still has to go
/// through the timezone before the date is taken.
pub fn caracas_today() -> NaiveDate {
    Utc::now()
        .with_timezone(&chrono_tz::America::Caracas)
        .date_naive()
}

/// Publishes the interval covering `today` as the `tasa_bcv` parameter and
/// notifies the operator. Every failure is caught here; the operator is
/// notified on the failure path too, and a failed notification is reported
/// separately from the primary error rather than crashing the job.
pub async fn run<R, N>(
    store: &R,
    notifier: &N,
    admin_email: &str,
    base_url: &str,
    today: NaiveDate,
) -> Result<PublishSuccess, PublishFailure>
where
    R: RateStore + ParameterStore,
    N: Notifier,
{
    match publish_active(store, notifier, admin_email, base_url, today).await {
        Ok(success) => Ok(success),
        Err(error) => {
            log::error!("active-rate publication failed: {error}");

            let html = notify::failure_email(base_url, &error.to_string());
            let notification = notifier.send(admin_email, FAILURE_SUBJECT, &html).await;
            if let Err(notify_error) = &notification {
                log::error!("failure notification also failed: {notify_error}");
            }

            Err(PublishFailure {
                error,
                notification,
            })
        }
    }
}

async fn publish_active<R, N>(
    store: &R,
    notifier: &N,
    admin_email: &str,
    base_url: &str,
    today: NaiveDate,
) -> Result<PublishSuccess, RateError>
where
    R: RateStore + ParameterStore,
    N: Notifier,
{
    let active = store
        .find_active(today)
        .await?
        .ok_or(RateError::NoActiveRate(today))?;

    let formatted_rate = format_rate(active.rate);
    store
        .upsert_parameter(ACTIVE_RATE_KEY, &formatted_rate)
        .await?;
    log::info!("active BCV rate published as {ACTIVE_RATE_KEY}: {formatted_rate}");

    let html = notify::success_email(
        base_url,
        &formatted_rate,
        &active.valid_from.to_string(),
        &active.valid_to.to_string(),
    );
    let confirmation = notifier.send(admin_email, SUCCESS_SUBJECT, &html).await?;

    Ok(PublishSuccess {
        formatted_rate,
        confirmation,
    })
}

/// Formats a rate with exactly four decimal digits and thousands grouping.
pub fn format_rate(rate: Decimal) -> String {
    let rounded = rate.round_dp_with_strategy(4, RoundingStrategy::MidpointAwayFromZero);
    let plain = format!("{rounded:.4}");
    let (int_part, frac_part) = plain.split_once('.').unwrap_or((plain.as_str(), "0000"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    format!("{grouped}.{frac_part}")
}
