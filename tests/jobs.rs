//! End-to-end job tests against in-memory doubles for the store, the rate
//! source and the notifier.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{Days, NaiveDate};
use rust_decimal::Decimal;
use uuid::Uuid;

use bcv_rates::error::RateError;
use bcv_rates::model::{ACTIVE_RATE_KEY, RateInterval, ScrapedRate};
use bcv_rates::source::RateSource;
use bcv_rates::store::{ParameterStore, RateStore};
use bcv_rates::notify::Notifier;
use bcv_rates::{ingest, publish};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

#[derive(Default)]
struct MemStore {
    intervals: Mutex<Vec<RateInterval>>,
    parameters: Mutex<HashMap<String, String>>,
}

impl MemStore {
    fn seed(&self, effective: NaiveDate, rate: Decimal, from: NaiveDate, to: NaiveDate) {
        self.intervals.lock().unwrap().push(RateInterval {
            id: Uuid::new_v4(),
            effective_date: effective,
            rate,
            valid_from: from,
            valid_to: to,
        });
    }

    fn intervals(&self) -> Vec<RateInterval> {
        self.intervals.lock().unwrap().clone()
    }

    fn parameter(&self, key: &str) -> Option<String> {
        self.parameters.lock().unwrap().get(key).cloned()
    }
}

#[async_trait]
impl RateStore for MemStore {
    async fn find_latest(&self) -> Result<Option<RateInterval>, RateError> {
        let intervals = self.intervals.lock().unwrap();
        Ok(intervals.iter().max_by_key(|i| i.valid_to).cloned())
    }

    async fn find_active(&self, on: NaiveDate) -> Result<Option<RateInterval>, RateError> {
        let intervals = self.intervals.lock().unwrap();
        Ok(intervals
            .iter()
            .filter(|i| i.valid_from <= on && on <= i.valid_to)
            .max_by_key(|i| i.effective_date)
            .cloned())
    }

    async fn upsert(
        &self,
        effective_date: NaiveDate,
        rate: Decimal,
        valid_from: NaiveDate,
        valid_to: NaiveDate,
    ) -> Result<RateInterval, RateError> {
        let mut intervals = self.intervals.lock().unwrap();
        if let Some(existing) = intervals
            .iter_mut()
            .find(|i| i.effective_date == effective_date)
        {
            // Mirrors ON CONFLICT DO UPDATE: only the rate moves.
            existing.rate = rate;
            return Ok(existing.clone());
        }

        let interval = RateInterval {
            id: Uuid::new_v4(),
            effective_date,
            rate,
            valid_from,
            valid_to,
        };
        intervals.push(interval.clone());
        Ok(interval)
    }
}

#[async_trait]
impl ParameterStore for MemStore {
    async fn upsert_parameter(&self, key: &str, value: &str) -> Result<(), RateError> {
        self.parameters
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

struct StubSource {
    result: Mutex<Result<ScrapedRate, String>>,
}

impl StubSource {
    fn returning(rate: Decimal, effective_date: NaiveDate) -> Self {
        Self {
            result: Mutex::new(Ok(ScrapedRate {
                rate,
                effective_date,
            })),
        }
    }

    fn failing(message: &str) -> Self {
        Self {
            result: Mutex::new(Err(message.to_string())),
        }
    }

    fn set(&self, rate: Decimal, effective_date: NaiveDate) {
        *self.result.lock().unwrap() = Ok(ScrapedRate {
            rate,
            effective_date,
        });
    }
}

#[async_trait]
impl RateSource for StubSource {
    async fn fetch(&self) -> Result<ScrapedRate, RateError> {
        match &*self.result.lock().unwrap() {
            Ok(scraped) => Ok(*scraped),
            Err(message) => Err(RateError::Fetch(message.clone())),
        }
    }
}

#[derive(Default)]
struct RecordingNotifier {
    fail: bool,
    sent: Mutex<Vec<(String, String, String)>>,
}

impl RecordingNotifier {
    fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    fn sent(&self) -> Vec<(String, String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, to: &str, subject: &str, html: &str) -> Result<String, RateError> {
        if self.fail {
            return Err(RateError::Notify("mail API unreachable".into()));
        }
        self.sent
            .lock()
            .unwrap()
            .push((to.to_string(), subject.to_string(), html.to_string()));
        Ok(format!("preview-url-for-{to}"))
    }
}

#[tokio::test]
async fn first_ever_ingestion_creates_self_contained_interval() {
    let store = MemStore::default();
    let source = StubSource::returning(dec("36.0001"), date(2025, 4, 14));

    let outcome = ingest::run(&source, &store, date(2025, 4, 14)).await.unwrap();

    assert_eq!(outcome.rate, dec("36.0001"));
    assert_eq!(outcome.effective_date, date(2025, 4, 14));

    let intervals = store.intervals();
    assert_eq!(intervals.len(), 1);
    assert_eq!(intervals[0].valid_from, date(2025, 4, 14));
    assert_eq!(intervals[0].valid_to, date(2025, 4, 14));
}

#[tokio::test]
async fn reingestion_updates_rate_but_never_the_window() {
    let store = MemStore::default();
    // Friday's interval already stored; Monday's rate shows up during the
    // Friday run.
    store.seed(date(2025, 4, 18), dec("36.40"), date(2025, 4, 18), date(2025, 4, 18));

    let source = StubSource::returning(dec("36.4567"), date(2025, 4, 21));
    ingest::run(&source, &store, date(2025, 4, 18)).await.unwrap();

    let monday = store.find_active(date(2025, 4, 21)).await.unwrap().unwrap();
    assert_eq!(monday.valid_from, date(2025, 4, 19));
    assert_eq!(monday.valid_to, date(2025, 4, 21));

    // A later re-run the same day scrapes a corrected figure.
    source.set(dec("36.4568"), date(2025, 4, 21));
    ingest::run(&source, &store, date(2025, 4, 18)).await.unwrap();

    let intervals = store.intervals();
    assert_eq!(intervals.len(), 2, "re-run must not create a second interval");

    let monday_after = store.find_active(date(2025, 4, 21)).await.unwrap().unwrap();
    assert_eq!(monday_after.rate, dec("36.4568"));
    assert_eq!(monday_after.valid_from, monday.valid_from);
    assert_eq!(monday_after.valid_to, monday.valid_to);
    assert_eq!(monday_after.id, monday.id);
}

#[tokio::test]
async fn fetch_failure_aborts_the_run_without_writes() {
    let store = MemStore::default();
    let source = StubSource::failing("connection reset by peer");

    let err = ingest::run(&source, &store, date(2025, 4, 14)).await.unwrap_err();

    assert!(matches!(err, RateError::Fetch(_)));
    assert!(store.intervals().is_empty());
}

#[tokio::test]
async fn simulated_schedule_produces_contiguous_history() {
    let store = MemStore::default();
    let source = StubSource::returning(dec("36.00"), date(2025, 4, 14));

    // (run date, effective date, rate) as a daily scheduler would observe
    // them across normal days, a holiday block and a weekend. Weekend
    // re-runs see the same effective date again.
    let runs = [
        (date(2025, 4, 14), date(2025, 4, 14), "36.00"),
        (date(2025, 4, 15), date(2025, 4, 15), "36.05"),
        (date(2025, 4, 16), date(2025, 4, 16), "36.10"),
        // Monday's rate published ahead of Semana Santa
        (date(2025, 4, 16), date(2025, 4, 21), "36.20"),
        // idle re-runs during the holiday, same effective date
        (date(2025, 4, 17), date(2025, 4, 21), "36.20"),
        (date(2025, 4, 19), date(2025, 4, 21), "36.21"),
        (date(2025, 4, 22), date(2025, 4, 22), "36.25"),
        (date(2025, 4, 23), date(2025, 4, 23), "36.30"),
        (date(2025, 4, 24), date(2025, 4, 24), "36.35"),
        // regular weekend bridge
        (date(2025, 4, 24), date(2025, 4, 28), "36.40"),
        (date(2025, 4, 26), date(2025, 4, 28), "36.40"),
        (date(2025, 4, 29), date(2025, 4, 29), "36.45"),
    ];

    for (today, effective, rate) in runs {
        source.set(dec(rate), effective);
        ingest::run(&source, &store, today).await.unwrap();
    }

    let mut intervals = store.intervals();
    intervals.sort_by_key(|i| i.valid_from);

    for pair in intervals.windows(2) {
        let expected_next = pair[0].valid_to.checked_add_days(Days::new(1)).unwrap();
        assert_eq!(
            pair[1].valid_from, expected_next,
            "gap or overlap between {} and {}",
            pair[0].effective_date, pair[1].effective_date
        );
    }

    // Every calendar day from the first effective date to the last is
    // covered by exactly one interval.
    let mut day = date(2025, 4, 14);
    while day <= date(2025, 4, 29) {
        let covering = intervals
            .iter()
            .filter(|i| i.valid_from <= day && day <= i.valid_to)
            .count();
        assert_eq!(covering, 1, "{day} covered by {covering} intervals");
        day = day.checked_add_days(Days::new(1)).unwrap();
    }
}

#[tokio::test]
async fn publisher_writes_parameter_and_notifies_once() {
    let store = MemStore::default();
    store.seed(date(2025, 12, 17), dec("36.5"), date(2025, 12, 17), date(2025, 12, 17));
    let notifier = RecordingNotifier::default();

    let success = publish::run(
        &store,
        &notifier,
        "admin@example.com",
        "http://localhost:3000",
        date(2025, 12, 17),
    )
    .await
    .unwrap();

    assert_eq!(success.formatted_rate, "36.5000");
    assert_eq!(store.parameter(ACTIVE_RATE_KEY).as_deref(), Some("36.5000"));

    let sent = notifier.sent();
    assert_eq!(sent.len(), 1);
    let (to, subject, html) = &sent[0];
    assert_eq!(to, "admin@example.com");
    assert_eq!(subject, "Tasa de BCV Actualizada");
    assert!(html.contains("36.5000"));
    assert!(html.contains("2025-12-17"));
}

#[tokio::test]
async fn publisher_picks_the_interval_covering_today() {
    let store = MemStore::default();
    store.seed(date(2025, 4, 16), dec("36.10"), date(2025, 4, 16), date(2025, 4, 16));
    store.seed(date(2025, 4, 21), dec("36.20"), date(2025, 4, 17), date(2025, 4, 21));
    let notifier = RecordingNotifier::default();

    // A holiday Saturday: covered by the bridged Monday interval.
    let success = publish::run(
        &store,
        &notifier,
        "admin@example.com",
        "http://localhost:3000",
        date(2025, 4, 19),
    )
    .await
    .unwrap();

    assert_eq!(success.formatted_rate, "36.2000");
}

#[tokio::test]
async fn missing_active_rate_notifies_and_reports_single_fault() {
    let store = MemStore::default();
    let notifier = RecordingNotifier::default();

    let failure = publish::run(
        &store,
        &notifier,
        "admin@example.com",
        "http://localhost:3000",
        date(2025, 4, 19),
    )
    .await
    .unwrap_err();

    assert!(matches!(failure.error, RateError::NoActiveRate(_)));
    assert!(failure.error.to_string().contains("2025-04-19"));
    assert!(failure.notification.is_ok());

    assert!(store.parameter(ACTIVE_RATE_KEY).is_none());

    let sent = notifier.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].1, "Error al Actualizar Tasa de BCV");
    assert!(sent[0].2.contains("no active BCV rate"));
}

#[tokio::test]
async fn failed_notification_is_reported_as_a_distinct_double_fault() {
    let store = MemStore::default();
    let notifier = RecordingNotifier::failing();

    let failure = publish::run(
        &store,
        &notifier,
        "admin@example.com",
        "http://localhost:3000",
        date(2025, 4, 19),
    )
    .await
    .unwrap_err();

    assert!(matches!(failure.error, RateError::NoActiveRate(_)));
    assert!(matches!(failure.notification, Err(RateError::Notify(_))));
    assert!(store.parameter(ACTIVE_RATE_KEY).is_none());
}
