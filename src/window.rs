use chrono::{Days, NaiveDate};

/// Inclusive date bounds during which a scraped rate is considered active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidityWindow {
    pub valid_from: NaiveDate,
    pub valid_to: NaiveDate,
}

/// Computes the validity window for a newly scraped rate.
///
/// `valid_to` is always the effective date. `valid_from` starts on the
/// effective date itself when this is the first interval ever recorded or
/// when the job runs on the effective date. Otherwise the run date precedes
/// the effective date (the source published ahead across a weekend or
/// holiday block) and the window opens on `today + 1`: the new rate is
/// retroactively assumed constant over the unreported gap, attributed to
/// the day after the last job execution.
///
/// The gap start deliberately keys off `today`, not `prior_end + 1`. Both
/// candidates coincide under a daily schedule, but the `today` rule is the
/// contract; see the regression test below before changing it.
pub fn resolve(
    prior_end: Option<NaiveDate>,
    effective_date: NaiveDate,
    today: NaiveDate,
) -> ValidityWindow {
    let valid_from = if prior_end.is_none() || today == effective_date {
        effective_date
    } else {
        // today < effective_date here, so the successor cannot overflow
        today
            .checked_add_days(Days::new(1))
            .unwrap_or(effective_date)
    };

    ValidityWindow {
        valid_from,
        valid_to: effective_date,
    }
}
