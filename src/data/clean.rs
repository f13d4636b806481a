use super::model::Grid;

/// Magnitude above which a sample is the file format's fill sentinel.
pub const FILL_THRESHOLD: f64 = 1e30;

/// Whether `x` is a fill value. The comparison is strict: `±threshold`
/// itself is a valid sample.
#[inline]
pub fn is_fill(x: f64, threshold: f64) -> bool {
    x.abs() > threshold
}

/// Replace fill values with NaN, leaving every other sample untouched.
pub fn clean(values: &[f64], threshold: f64) -> Vec<f64> {
    values
        .iter()
        .map(|&x| if is_fill(x, threshold) { f64::NAN } else { x })
        .collect()
}

pub fn clean_in_place(values: &mut [f64], threshold: f64) {
    for x in values.iter_mut().filter(|x| is_fill(**x, threshold)) {
        *x = f64::NAN;
    }
}

pub fn clean_grid(grid: &Grid, threshold: f64) -> Grid {
    Grid {
        rows: grid.rows,
        cols: grid.cols,
        values: clean(&grid.values, threshold),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fill_values_become_nan() {
        let out = clean(&[1.0, 1e31, -1e31, -4.5, 0.0], FILL_THRESHOLD);
        assert_eq!(out[0], 1.0);
        assert!(out[1].is_nan());
        assert!(out[2].is_nan());
        assert_eq!(out[3], -4.5);
        assert_eq!(out[4], 0.0);
    }

    #[test]
    fn threshold_comparison_is_strict() {
        let out = clean(&[1e30, -1e30, 1.0000001e30, -1.0000001e30], FILL_THRESHOLD);
        assert_eq!(out[0], 1e30);
        assert_eq!(out[1], -1e30);
        assert!(out[2].is_nan());
        assert!(out[3].is_nan());
    }

    #[test]
    fn cleaning_is_idempotent() {
        let input = [3.0, f64::NAN, 2e30, f64::INFINITY, -7.0];
        let once = clean(&input, FILL_THRESHOLD);
        let twice = clean(&once, FILL_THRESHOLD);
        assert_eq!(once.len(), twice.len());
        for (a, b) in once.iter().zip(&twice) {
            assert!(a == b || (a.is_nan() && b.is_nan()));
        }
    }

    #[test]
    fn in_place_matches_copying_version() {
        let input = vec![5.0, 1e31, 6.0];
        let mut values = input.clone();
        clean_in_place(&mut values, FILL_THRESHOLD);
        assert_eq!(values[0], 5.0);
        assert!(values[1].is_nan());
        assert_eq!(values[2], 6.0);
    }

    #[test]
    fn custom_threshold() {
        let out = clean(&[-9999.5, -9999.0, 12.0], 9999.0);
        assert!(out[0].is_nan());
        assert_eq!(&out[1..], &[-9999.0, 12.0]);
    }
}
