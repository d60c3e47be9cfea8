use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::FromRow;
use uuid::Uuid;

/// Parameter key under which the publisher exposes the active rate.
pub const ACTIVE_RATE_KEY: &str = "tasa_bcv";

/// A stored daily rate together with its inclusive validity window.
///
/// `valid_to` always equals `effective_date`; `valid_from` is fixed at
/// creation and never rewritten by later ingestions of the same day.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct RateInterval {
    pub id: Uuid,
    pub effective_date: NaiveDate,
    pub rate: Decimal,
    pub valid_from: NaiveDate,
    pub valid_to: NaiveDate,
}

/// The (rate, effective date) pair scraped from the BCV page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrapedRate {
    pub rate: Decimal,
    pub effective_date: NaiveDate,
}
