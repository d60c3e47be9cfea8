use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use scraper::{Html, Selector};

use crate::error::RateError;
use crate::model::ScrapedRate;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

// The BCV site rejects requests without a browser user agent.
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/109.0.0.0 Safari/537.36";

const RATE_SELECTOR: &str = "#dolar strong";
const DATE_SELECTOR: &str = ".pull-right span.date-display-single";

// Zero-based, as the source writes month names.
const MONTHS: [&str; 12] = [
    "enero",
    "febrero",
    "marzo",
    "abril",
    "mayo",
    "junio",
    "julio",
    "agosto",
    "septiembre",
    "octubre",
    "noviembre",
    "diciembre",
];

/// Source of the daily official (rate, effective date) pair.
#[async_trait]
pub trait RateSource: Send + Sync {
    async fn fetch(&self) -> Result<ScrapedRate, RateError>;
}

/// Scrapes the rate published on the BCV home page.
#[derive(Debug, Clone)]
pub struct BcvSource {
    url: String,
}

impl BcvSource {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

#[async_trait]
impl RateSource for BcvSource {
    async fn fetch(&self) -> Result<ScrapedRate, RateError> {
        // The BCV endpoint serves a certificate chain reqwest does not
        // accept, so verification is relaxed for this one client. The
        // client lives only for this call; nothing else in the process
        // ever sees the relaxed setting.
        let client = reqwest::Client::builder()
            .danger_accept_invalid_certs(true)
            .timeout(REQUEST_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| RateError::Fetch(e.to_string()))?;

        let resp = client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| RateError::Fetch(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(RateError::Fetch(format!(
                "{} returned status {}",
                self.url,
                resp.status()
            )));
        }

        let body = resp
            .text()
            .await
            .map_err(|e| RateError::Fetch(e.to_string()))?;

        parse_page(&body)
    }
}

/// Extracts the rate and its effective date from the page HTML.
pub fn parse_page(html: &str) -> Result<ScrapedRate, RateError> {
    let document = Html::parse_document(html);

    let rate = parse_rate(&document)?;
    let effective_date = parse_effective_date(&document)?;

    Ok(ScrapedRate {
        rate,
        effective_date,
    })
}

fn selector(css: &str) -> Result<Selector, RateError> {
    Selector::parse(css).map_err(|e| RateError::Parse(format!("bad selector {css}: {e}")))
}

fn parse_rate(document: &Html) -> Result<Decimal, RateError> {
    let sel = selector(RATE_SELECTOR)?;
    let raw: String = document
        .select(&sel)
        .next()
        .ok_or_else(|| RateError::Parse("could not find the dollar rate on the page".into()))?
        .text()
        .collect();

    let normalized = normalize_decimal_string(raw.trim());
    let rate = Decimal::from_str(&normalized)
        .map_err(|_| RateError::Parse(format!("rate {:?} is not a number", raw.trim())))?;

    if rate <= Decimal::ZERO {
        return Err(RateError::Parse(format!("rate {rate} is not positive")));
    }

    Ok(rate)
}

fn normalize_decimal_string(s: &str) -> String {
    s.replace(',', ".")
}

/// Parses the long-form Spanish date the page displays, e.g.
/// "Jueves 17 Abril 2025", into a calendar date.
fn parse_effective_date(document: &Html) -> Result<NaiveDate, RateError> {
    let sel = selector(DATE_SELECTOR)?;
    let raw: String = document
        .select(&sel)
        .next()
        .ok_or_else(|| RateError::Parse("could not find the value date on the page".into()))?
        .text()
        .collect();

    parse_spanish_date(raw.trim())
}

fn parse_spanish_date(text: &str) -> Result<NaiveDate, RateError> {
    let bad = || RateError::Parse(format!("could not parse date from {text:?}"));

    // Tokens are "<weekday> <day> <month> <year>"; the weekday is ignored.
    let mut tokens = text.split_whitespace();
    let _weekday = tokens.next().ok_or_else(bad)?;
    let day: u32 = tokens.next().ok_or_else(bad)?.parse().map_err(|_| bad())?;
    let month_name = tokens.next().ok_or_else(bad)?.to_lowercase();
    let year: i32 = tokens.next().ok_or_else(bad)?.parse().map_err(|_| bad())?;

    let month0 = MONTHS
        .iter()
        .position(|m| *m == month_name)
        .ok_or_else(|| RateError::Parse(format!("unknown month name {month_name:?}")))?;

    NaiveDate::from_ymd_opt(year, month0 as u32 + 1, day).ok_or_else(bad)
}
