use super::model::{TimeSeries, Timestamp};

// ---------------------------------------------------------------------------
// Aligner: drop missing samples together with their timestamps
// ---------------------------------------------------------------------------

/// Keep only the positions whose value is not NaN, preserving order.
///
/// Each quantity is filtered on its own, so two quantities read from the
/// same files may come back with different lengths and time axes. Inputs
/// of unequal length are paired up to the shorter one.
pub fn filter_valid(times: &[Timestamp], values: &[f64]) -> TimeSeries {
    let (times, values) = times
        .iter()
        .zip(values)
        .filter(|(_, v)| !v.is_nan())
        .map(|(t, &v)| (*t, v))
        .unzip();
    TimeSeries { times, values }
}

/// Number of samples [`filter_valid`] would keep.
pub fn valid_count(values: &[f64]) -> usize {
    values.iter().filter(|v| !v.is_nan()).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeDelta};

    fn times(n: usize) -> Vec<Timestamp> {
        let start = NaiveDate::from_ymd_opt(2025, 5, 22)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        (0..n).map(|i| start + TimeDelta::minutes(i as i64)).collect()
    }

    #[test]
    fn drops_missing_positions_in_order() {
        let t = times(5);
        let out = filter_valid(&t, &[1.0, f64::NAN, 3.0, f64::NAN, 5.0]);
        assert_eq!(out.values, vec![1.0, 3.0, 5.0]);
        assert_eq!(out.times, vec![t[0], t[2], t[4]]);
    }

    #[test]
    fn lengths_match_valid_count() {
        let t = times(6);
        let v = [f64::NAN, 2.0, 2.0, f64::NAN, f64::NAN, -1.0];
        let out = filter_valid(&t, &v);
        assert_eq!(out.times.len(), out.values.len());
        assert_eq!(out.len(), valid_count(&v));
    }

    #[test]
    fn quantities_are_filtered_independently() {
        let t = times(4);
        let density = filter_valid(&t, &[1.0, f64::NAN, 3.0, 4.0]);
        let speed = filter_valid(&t, &[400.0, 410.0, f64::NAN, f64::NAN]);
        assert_eq!(density.times, vec![t[0], t[2], t[3]]);
        assert_eq!(speed.times, vec![t[0], t[1]]);
    }

    #[test]
    fn non_monotonic_times_pass_through() {
        let mut t = times(3);
        t.reverse();
        let out = filter_valid(&t, &[1.0, 2.0, 3.0]);
        assert_eq!(out.times, t);
    }

    #[test]
    fn all_missing_gives_empty_series() {
        let out = filter_valid(&times(2), &[f64::NAN, f64::NAN]);
        assert!(out.is_empty());
        assert!(out.times.is_empty());
    }
}
