//! Calendar helpers used to derive display-only fields.

use chrono::{Datelike, NaiveDate, Utc};

/// Completed years of age on `on` for someone born on `birth`.
///
/// Year difference, minus one when the reference month/day falls before the
/// birth month/day. Returns `None` when `birth` is after `on`.
pub fn age_on(birth: NaiveDate, on: NaiveDate) -> Option<u32> {
  if birth > on {
    return None;
  }
  let mut years = on.year() - birth.year();
  if (on.month(), on.day()) < (birth.month(), birth.day()) {
    years -= 1;
  }
  u32::try_from(years).ok()
}

/// Today's date in UTC, the reference date for derived ages.
pub fn today() -> NaiveDate { Utc::now().date_naive() }

/// [`age_on`] against [`today`].
pub fn age_today(birth: NaiveDate) -> Option<u32> { age_on(birth, today()) }
