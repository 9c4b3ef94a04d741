//! Expansion of recurrence patterns into calendar dates.
//!
//! Everything here is pure and works on [`NaiveDate`]: there is no
//! time-of-day and no time zone, only the local calendar date.

use std::collections::BTreeSet;

use chrono::{Datelike, Days, NaiveDate};

use crate::{Error, Result, supplier::Pattern};

/// Weekday number of `date`, 0 = Sunday … 6 = Saturday.
pub fn weekday_index(date: NaiveDate) -> u8 {
  // Always in 0..7.
  date.weekday().num_days_from_sunday() as u8
}

fn offset(date: NaiveDate, days: u64) -> Option<NaiveDate> {
  date.checked_add_days(Days::new(days))
}

/// Every date from `start` through `start + horizon_days`, inclusive.
pub fn expand_daily(start: NaiveDate, horizon_days: u32) -> Vec<NaiveDate> {
  (0..=u64::from(horizon_days))
    .map_while(|i| offset(start, i))
    .collect()
}

/// `start`, `start + n`, `start + 2n`, … up to `start + horizon_days`.
pub fn expand_every_n(
  start: NaiveDate,
  n: u32,
  horizon_days: u32,
) -> Result<Vec<NaiveDate>> {
  if n < 2 {
    return Err(Error::InvalidPattern(format!("n must be >= 2, got {n}")));
  }
  Ok(step_from(start, u64::from(n), horizon_days))
}

fn step_from(start: NaiveDate, step: u64, horizon_days: u32) -> Vec<NaiveDate> {
  (0..=u64::from(horizon_days))
    .step_by(step as usize)
    .map_while(|i| offset(start, i))
    .collect()
}

/// Dates falling on any of `days` within `[start, start + horizon_days]`,
/// repeating every `week_step` weeks.
///
/// The week blocks are anchored on the first selected weekday on or after
/// `start`, not on the calendar epoch, so a two-week rhythm starts counting
/// from the supplier's start date.
pub fn expand_weekly(
  days: &BTreeSet<u8>,
  start: NaiveDate,
  horizon_days: u32,
  week_step: u32,
) -> Vec<NaiveDate> {
  let step = 7 * u64::from(week_step.max(1));
  let reference = (0..7)
    .filter_map(|i| offset(start, i))
    .find(|d| days.contains(&weekday_index(*d)))
    .unwrap_or(start);

  let mut dates = BTreeSet::new();
  for block in (0..=u64::from(horizon_days)).step_by(step as usize) {
    let Some(base) = offset(reference, block) else { break };
    let base_dow = weekday_index(base);
    for &dow in days {
      let diff = (u64::from(dow) + 7 - u64::from(base_dow)) % 7;
      let Some(date) = offset(base, diff) else { continue };
      let distance = (date - start).num_days();
      if (0..=i64::from(horizon_days)).contains(&distance) {
        dates.insert(date);
      }
    }
  }
  dates.into_iter().collect()
}

/// Every-N-days dates anchored on `anchor` that fall within
/// `[start, start + horizon_days]`.
///
/// The first date is the first aligned one on or after the later of `start`
/// and `anchor`.
pub fn expand_every_n_within(
  anchor: NaiveDate,
  n: u32,
  start: NaiveDate,
  horizon_days: u32,
) -> Result<Vec<NaiveDate>> {
  if n < 2 {
    return Err(Error::InvalidPattern(format!("n must be >= 2, got {n}")));
  }
  let from = start.max(anchor);
  let step = u64::from(n);
  let lag = (from - anchor).num_days().unsigned_abs() % step;
  let Some(first) = offset(from, (step - lag) % step) else {
    return Ok(Vec::new());
  };
  match u32::try_from((first - start).num_days()) {
    Ok(skipped) if skipped <= horizon_days => {
      expand_every_n(first, n, horizon_days - skipped)
    }
    _ => Ok(Vec::new()),
  }
}

/// Expand `pattern` over `[start, start + horizon_days]`.
///
/// Every-N-days patterns keep their own anchor date for alignment but are
/// still clipped to the window.
pub fn expand(
  pattern: &Pattern,
  start: NaiveDate,
  horizon_days: u32,
) -> Result<Vec<NaiveDate>> {
  match pattern {
    Pattern::Daily => Ok(expand_daily(start, horizon_days)),
    Pattern::Weekly { days } => Ok(expand_weekly(days, start, horizon_days, 1)),
    Pattern::EveryNDays { n, start_date } => {
      expand_every_n_within(*start_date, *n, start, horizon_days)
    }
  }
}

/// Whether `candidate` is one of the dates `pattern` produces, computed
/// directly instead of by expansion.
pub fn matches_date(pattern: &Pattern, candidate: NaiveDate) -> bool {
  match pattern {
    Pattern::Daily => true,
    Pattern::Weekly { days } => days.contains(&weekday_index(candidate)),
    Pattern::EveryNDays { n, start_date } => {
      let diff = (candidate - *start_date).num_days();
      *n > 0 && diff >= 0 && diff % i64::from(*n) == 0
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn d(s: &str) -> NaiveDate { s.parse().unwrap() }

  fn iso(dates: &[NaiveDate]) -> Vec<String> {
    dates.iter().map(|d| d.format("%Y-%m-%d").to_string()).collect()
  }

  #[test]
  fn daily_is_inclusive_of_horizon() {
    let dates = expand_daily(d("2024-02-27"), 3);
    assert_eq!(iso(&dates), ["2024-02-27", "2024-02-28", "2024-02-29", "2024-03-01"]);
    assert_eq!(expand_daily(d("2024-02-27"), 0).len(), 1);
  }

  #[test]
  fn every_n_steps_from_start() {
    let dates = expand_every_n(d("2024-01-01"), 3, 10).unwrap();
    assert_eq!(
      iso(&dates),
      ["2024-01-01", "2024-01-04", "2024-01-07", "2024-01-10"]
    );
  }

  #[test]
  fn every_n_rejects_small_n() {
    assert!(matches!(
      expand_every_n(d("2024-01-01"), 1, 10),
      Err(Error::InvalidPattern(_))
    ));
    assert!(expand_every_n(d("2024-01-01"), 0, 10).is_err());
  }

  #[test]
  fn weekly_anchors_on_start() {
    let dates = expand_weekly(&BTreeSet::from([1, 3]), d("2024-01-01"), 14, 1);
    assert_eq!(
      iso(&dates),
      ["2024-01-01", "2024-01-03", "2024-01-08", "2024-01-10", "2024-01-15"]
    );
  }

  #[test]
  fn weekly_starting_mid_week() {
    // 2024-01-03 is a Wednesday; Monday and Saturday are selected.
    let dates = expand_weekly(&BTreeSet::from([1, 6]), d("2024-01-03"), 10, 1);
    assert_eq!(iso(&dates), ["2024-01-06", "2024-01-08", "2024-01-13"]);
  }

  #[test]
  fn weekly_every_other_week() {
    let dates = expand_weekly(&BTreeSet::from([1]), d("2024-01-01"), 28, 2);
    assert_eq!(iso(&dates), ["2024-01-01", "2024-01-15", "2024-01-29"]);
  }

  #[test]
  fn weekly_without_days_is_empty() {
    assert!(expand_weekly(&BTreeSet::new(), d("2024-01-01"), 30, 1).is_empty());
  }

  #[test]
  fn every_n_window_aligns_on_old_anchor() {
    let p = Pattern::EveryNDays { n: 3, start_date: d("2024-01-01") };
    let dates = expand(&p, d("2024-01-06"), 10).unwrap();
    assert_eq!(
      iso(&dates),
      ["2024-01-07", "2024-01-10", "2024-01-13", "2024-01-16"]
    );
  }

  #[test]
  fn every_n_window_waits_for_future_anchor() {
    let p = Pattern::EveryNDays { n: 4, start_date: d("2024-01-10") };
    let dates = expand(&p, d("2024-01-01"), 14).unwrap();
    assert_eq!(iso(&dates), ["2024-01-10", "2024-01-14"]);

    let late = Pattern::EveryNDays { n: 4, start_date: d("2024-02-01") };
    assert!(expand(&late, d("2024-01-01"), 10).unwrap().is_empty());
  }

  #[test]
  fn every_n_window_rejects_small_n() {
    let p = Pattern::EveryNDays { n: 1, start_date: d("2030-01-01") };
    assert!(matches!(
      expand(&p, d("2024-01-01"), 5),
      Err(Error::InvalidPattern(_))
    ));
  }

  #[test]
  fn every_n_membership() {
    let p = Pattern::EveryNDays { n: 3, start_date: d("2024-01-01") };
    assert!(matches_date(&p, d("2024-01-07")));
    assert!(!matches_date(&p, d("2024-01-08")));
    assert!(matches_date(&p, d("2024-01-01")));
    assert!(!matches_date(&p, d("2023-12-29")));
  }

  #[test]
  fn weekly_and_daily_membership() {
    let p = Pattern::Weekly { days: BTreeSet::from([0]) };
    assert!(matches_date(&p, d("2024-01-07")));
    assert!(!matches_date(&p, d("2024-01-08")));
    assert!(matches_date(&Pattern::Daily, d("1999-12-31")));
  }

  #[test]
  fn membership_agrees_with_expansion() {
    let start = d("2024-01-01");
    let patterns = [
      Pattern::Daily,
      Pattern::Weekly { days: BTreeSet::from([2, 5]) },
      Pattern::EveryNDays { n: 4, start_date: start },
      Pattern::EveryNDays { n: 5, start_date: d("2023-11-17") },
    ];
    for pattern in &patterns {
      let expanded = expand(pattern, start, 30).unwrap();
      for candidate in expand_daily(start, 30) {
        assert_eq!(
          expanded.contains(&candidate),
          matches_date(pattern, candidate),
          "{pattern:?} on {candidate}"
        );
      }
    }
  }
}
