use chrono::NaiveDate;

use crate::error::RateError;
use crate::model::ScrapedRate;
use crate::source::RateSource;
use crate::store::RateStore;
use crate::window;

/// Runs one ingestion cycle: scrape, resolve the validity window against
/// the latest stored interval, upsert.
///
/// `today` is the UTC calendar date of this run. Errors are propagated
/// untouched; the scheduler retries by simply invoking the job again on
/// its next tick. Re-running on the same day converges on a single
/// interval per effective date, with only the rate refreshed.
pub async fn run<S, R>(source: &S, store: &R, today: NaiveDate) -> Result<ScrapedRate, RateError>
where
    S: RateSource,
    R: RateStore,
{
    let scraped = source.fetch().await?;
    log::info!(
        "scraped BCV rate {} effective {}",
        scraped.rate,
        scraped.effective_date
    );

    let prior_end = store.find_latest().await?.map(|latest| latest.valid_to);
    let window = window::resolve(prior_end, scraped.effective_date, today);
    log::debug!(
        "resolved validity window {}..{} (prior end {:?})",
        window.valid_from,
        window.valid_to,
        prior_end
    );

    let saved = store
        .upsert(
            scraped.effective_date,
            scraped.rate,
            window.valid_from,
            window.valid_to,
        )
        .await?;
    log::info!(
        "stored BCV rate {} for {} valid {}..{}",
        saved.rate,
        saved.effective_date,
        saved.valid_from,
        saved.valid_to
    );

    Ok(ScrapedRate {
        rate: saved.rate,
        effective_date: saved.effective_date,
    })
}
