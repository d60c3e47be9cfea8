use chrono::NaiveDate;
use thiserror::Error;

/// Errors that can occur while ingesting or publishing the BCV rate.
#[derive(Error, Debug)]
pub enum RateError {
    /// Network/transport failure reaching the rate source.
    #[error("fetch error: {0}")]
    Fetch(String),

    /// The rate or its effective date could not be extracted from the page.
    #[error("parse error: {0}")]
    Parse(String),

    /// No stored interval covers the given date at publish time.
    #[error("no active BCV rate found for {0}")]
    NoActiveRate(NaiveDate),

    /// The underlying store rejected a read or write.
    #[error("persist error: {0}")]
    Persist(#[from] sqlx::Error),

    /// The notification transport failed.
    #[error("notify error: {0}")]
    Notify(String),
}
