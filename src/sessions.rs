//! FX session labelling using real local-clock windows in three timezones.
//!
//! A bar timestamp (naive, reference zone) is converted into London and
//! New York local time before checking each window, so daylight-saving
//! shifts in either zone are absorbed without manual calendar adjustment.
//!
//! The evaluation order (Asia, then London, then New York, then PostNY)
//! is first-match-wins. The four windows are not provably disjoint across
//! every DST state, so the priority chain is part of the contract, not an
//! oversight.

use chrono::{DateTime, Duration, NaiveDateTime, TimeZone, Timelike};
use chrono_tz::America::Mexico_City;
use chrono_tz::America::New_York;
use chrono_tz::Europe::London;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// Reference timezone for naive bar timestamps.
pub const REFERENCE_TZ: Tz = Mexico_City;

/// Canonical FX session labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Session {
    Asia,
    London,
    NewYork,
    PostNewYork,
}

impl std::fmt::Display for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Session::Asia => write!(f, "Asia"),
            Session::London => write!(f, "London"),
            Session::NewYork => write!(f, "NY"),
            Session::PostNewYork => write!(f, "Post-NY"),
        }
    }
}

/// Resolve a naive reference-zone timestamp to a concrete instant.
/// A fall-back fold resolves to the earliest valid instant; a
/// spring-forward hole resolves one hour ahead.
fn localize(ts: NaiveDateTime) -> DateTime<Tz> {
    match REFERENCE_TZ.from_local_datetime(&ts).earliest() {
        Some(local) => local,
        None => REFERENCE_TZ
            .from_local_datetime(&(ts + Duration::hours(1)))
            .earliest()
            .unwrap_or_else(|| REFERENCE_TZ.from_utc_datetime(&ts)),
    }
}

/// Classify the FX session of a reference-zone timestamp.
///
/// Priority chain: Asia on reference-zone hour 17:00-00:59, London on
/// London hour 08:00-13:59, New York on New York hour 08:00-15:59,
/// anything else is PostNY.
pub fn session_label(ts: NaiveDateTime) -> Session {
    let local = localize(ts);
    let hour_ref = local.hour();
    let hour_london = local.with_timezone(&London).hour();
    let hour_ny = local.with_timezone(&New_York).hour();

    if hour_ref >= 17 || hour_ref < 1 {
        return Session::Asia;
    }
    if (8..14).contains(&hour_london) {
        return Session::London;
    }
    if (8..16).contains(&hour_ny) {
        return Session::NewYork;
    }
    Session::PostNewYork
}
