//! Conversions between CDF epoch encodings and calendar time (UTC).
//!
//! * `CDF_EPOCH`: milliseconds since 0000-01-01T00:00:00.
//! * `CDF_EPOCH16`: seconds since 0000-01-01 plus picoseconds.
//! * `TIME_TT2000`: SI nanoseconds since 2000-01-01T12:00:00 TT, which
//!   counts leap seconds. Instants inside a leap second come back as
//!   `23:59:60.x` (chrono's leap-second representation).

use chrono::{NaiveDate, NaiveDateTime, TimeDelta, Timelike};

/// TAI-UTC offsets, effective from 00:00 UTC of the given date.
const LEAP_SECONDS: [(i32, u32, u32, i64); 28] = [
    (1972, 1, 1, 10),
    (1972, 7, 1, 11),
    (1973, 1, 1, 12),
    (1974, 1, 1, 13),
    (1975, 1, 1, 14),
    (1976, 1, 1, 15),
    (1977, 1, 1, 16),
    (1978, 1, 1, 17),
    (1979, 1, 1, 18),
    (1980, 1, 1, 19),
    (1981, 7, 1, 20),
    (1982, 7, 1, 21),
    (1983, 7, 1, 22),
    (1985, 7, 1, 23),
    (1988, 1, 1, 24),
    (1990, 1, 1, 25),
    (1991, 1, 1, 26),
    (1992, 7, 1, 27),
    (1993, 7, 1, 28),
    (1994, 7, 1, 29),
    (1996, 1, 1, 30),
    (1997, 7, 1, 31),
    (1999, 1, 1, 32),
    (2006, 1, 1, 33),
    (2009, 1, 1, 34),
    (2012, 7, 1, 35),
    (2015, 7, 1, 36),
    (2017, 1, 1, 37),
];

/// Offset applied before the first table entry. The pre-1972 rubber-second
/// era is approximated by the 1972 value.
const PRE_1972_OFFSET: i64 = 10;

const NANOS_PER_SECOND: i64 = 1_000_000_000;

fn year_zero() -> Option<NaiveDateTime> {
    NaiveDate::from_ymd_opt(0, 1, 1)?.and_hms_opt(0, 0, 0)
}

/// 2000-01-01T12:00:00 TT expressed on a continuous TAI scale.
fn j2000_tai() -> Option<NaiveDateTime> {
    NaiveDate::from_ymd_opt(2000, 1, 1)?.and_hms_milli_opt(11, 59, 27, 816)
}

fn leap_start(index: usize) -> Option<(NaiveDateTime, i64)> {
    let (y, m, d, offset) = LEAP_SECONDS[index];
    Some((NaiveDate::from_ymd_opt(y, m, d)?.and_hms_opt(0, 0, 0)?, offset))
}

/// TAI-UTC in effect at a (non leap-second) UTC instant.
fn tai_minus_utc(utc: NaiveDateTime) -> i64 {
    (0..LEAP_SECONDS.len())
        .rev()
        .filter_map(leap_start)
        .find(|(start, _)| utc >= *start)
        .map(|(_, offset)| offset)
        .unwrap_or(PRE_1972_OFFSET)
}

// ---------------------------------------------------------------------------
// CDF_EPOCH
// ---------------------------------------------------------------------------

pub fn epoch_to_datetime(millis: f64) -> Option<NaiveDateTime> {
    if !millis.is_finite() {
        return None;
    }
    let whole = millis.floor();
    let frac_nanos = ((millis - whole) * 1e6).round() as i64;
    year_zero()?
        .checked_add_signed(TimeDelta::try_milliseconds(whole as i64)?)?
        .checked_add_signed(TimeDelta::nanoseconds(frac_nanos))
}

pub fn datetime_to_epoch(dt: NaiveDateTime) -> Option<f64> {
    let delta = dt.signed_duration_since(year_zero()?);
    let millis = delta.num_milliseconds() as f64;
    let sub_milli = (delta - TimeDelta::milliseconds(delta.num_milliseconds()))
        .num_nanoseconds()? as f64
        / 1e6;
    Some(millis + sub_milli)
}

// ---------------------------------------------------------------------------
// CDF_EPOCH16
// ---------------------------------------------------------------------------

pub fn epoch16_to_datetime(value: [f64; 2]) -> Option<NaiveDateTime> {
    let [seconds, picos] = value;
    if !seconds.is_finite() || !picos.is_finite() {
        return None;
    }
    year_zero()?
        .checked_add_signed(TimeDelta::try_seconds(seconds as i64)?)?
        .checked_add_signed(TimeDelta::nanoseconds((picos / 1000.0) as i64))
}

// ---------------------------------------------------------------------------
// TIME_TT2000
// ---------------------------------------------------------------------------

pub fn tt2000_to_datetime(nanos: i64) -> Option<NaiveDateTime> {
    let tai = j2000_tai()?.checked_add_signed(TimeDelta::nanoseconds(nanos))?;

    for index in (0..LEAP_SECONDS.len()).rev() {
        let (start, offset) = leap_start(index)?;
        let start_tai = start + TimeDelta::seconds(offset);
        if tai >= start_tai {
            return tai.checked_sub_signed(TimeDelta::seconds(offset));
        }
        // Each table step inserts one second; the second before `start_tai`
        // is the leap second itself.
        if index > 0 && tai >= start_tai - TimeDelta::seconds(1) {
            let into = (tai - (start_tai - TimeDelta::seconds(1))).num_nanoseconds()?;
            let last_day = (start - TimeDelta::seconds(1)).date();
            return last_day.and_hms_nano_opt(23, 59, 59, (NANOS_PER_SECOND + into) as u32);
        }
    }
    tai.checked_sub_signed(TimeDelta::seconds(PRE_1972_OFFSET))
}

pub fn datetime_to_tt2000(utc: NaiveDateTime) -> Option<i64> {
    let nanos = utc.nanosecond() as i64;
    let tai = if nanos >= NANOS_PER_SECOND {
        // 23:59:60.x: count it under the offset still in effect, one second on.
        let normal = utc.with_nanosecond((nanos - NANOS_PER_SECOND) as u32)?;
        normal + TimeDelta::seconds(1) + TimeDelta::seconds(tai_minus_utc(normal))
    } else {
        utc + TimeDelta::seconds(tai_minus_utc(utc))
    };
    tai.signed_duration_since(j2000_tai()?).num_nanoseconds()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dt(y: i32, m: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, mi, s)
            .unwrap()
    }

    #[test]
    fn tt2000_zero_is_j2000_in_utc() {
        let expected = NaiveDate::from_ymd_opt(2000, 1, 1)
            .unwrap()
            .and_hms_milli_opt(11, 58, 55, 816)
            .unwrap();
        assert_eq!(tt2000_to_datetime(0), Some(expected));
        assert_eq!(datetime_to_tt2000(expected), Some(0));
    }

    #[test]
    fn tt2000_matches_published_value_for_2017() {
        let utc = dt(2017, 1, 1, 0, 0, 0);
        assert_eq!(datetime_to_tt2000(utc), Some(536_500_869_184_000_000));
        assert_eq!(tt2000_to_datetime(536_500_869_184_000_000), Some(utc));
    }

    #[test]
    fn tt2000_inside_leap_second() {
        let t = tt2000_to_datetime(536_500_869_184_000_000 - 500_000_000).unwrap();
        assert_eq!(t.date(), NaiveDate::from_ymd_opt(2016, 12, 31).unwrap());
        assert_eq!((t.hour(), t.minute(), t.second()), (23, 59, 59));
        assert_eq!(t.nanosecond(), 1_500_000_000);
        assert_eq!(datetime_to_tt2000(t), Some(536_500_869_184_000_000 - 500_000_000));
    }

    #[test]
    fn tt2000_round_trips_across_recent_days() {
        let start = dt(2025, 5, 22, 0, 0, 0);
        for minutes in [0, 5, 1439, 2880] {
            let t = start + TimeDelta::minutes(minutes);
            let ns = datetime_to_tt2000(t).unwrap();
            assert_eq!(tt2000_to_datetime(ns), Some(t));
        }
    }

    #[test]
    fn epoch_of_year_2000() {
        let t = dt(2000, 1, 1, 0, 0, 0);
        assert_eq!(epoch_to_datetime(63_113_904_000_000.0), Some(t));
        assert_eq!(datetime_to_epoch(t), Some(63_113_904_000_000.0));
        assert_eq!(epoch_to_datetime(f64::NAN), None);
    }

    #[test]
    fn epoch16_adds_picoseconds() {
        let t = epoch16_to_datetime([63_113_904_000.0, 250_000_000.0]).unwrap();
        assert_eq!(t.date(), NaiveDate::from_ymd_opt(2000, 1, 1).unwrap());
        assert_eq!(t.nanosecond(), 250_000);
    }
}
