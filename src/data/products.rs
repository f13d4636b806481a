use std::path::Path;

use chrono::NaiveDate;

use super::clean::clean_grid;
use super::model::{Grid, Spectrogram, Timestamp};

/// Offset added before taking log10 so zero flux stays finite.
pub const LOG_FLOOR: f64 = 1e-10;

// ---------------------------------------------------------------------------
// Integrated flux
// ---------------------------------------------------------------------------

/// Sum each row across the energy dimension, skipping NaN cells.
///
/// A row with no valid cell is itself missing (NaN).
pub fn integrate_rows(grid: &Grid) -> Vec<f64> {
    (0..grid.rows)
        .map(|r| {
            let (sum, n) = grid
                .row(r)
                .iter()
                .filter(|v| !v.is_nan())
                .fold((0.0, 0usize), |(s, n), &v| (s + v, n + 1));
            if n == 0 { f64::NAN } else { sum }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Spectrogram
// ---------------------------------------------------------------------------

/// Build an energy × time spectrogram from one file's variables.
///
/// * `energy` – energy-bin centres; only the first record is used.
/// * `flux`   – flux per record; transposed when its first dimension matches
///   the number of timestamps.
///
/// Fill values are dropped before `log10(flux + LOG_FLOOR)`.
pub fn build_spectrogram(
    times: &[Timestamp],
    energy: &Grid,
    flux: &Grid,
    threshold: f64,
) -> Option<Spectrogram> {
    if energy.rows == 0 || flux.is_empty() {
        return None;
    }
    let energies = energy.row(0).to_vec();

    let cleaned = clean_grid(flux, threshold);
    let mut grid = if cleaned.rows == times.len() { cleaned.transpose() } else { cleaned };
    for v in grid.values.iter_mut() {
        *v = (*v + LOG_FLOOR).log10();
    }

    if grid.rows != energies.len() {
        log::warn!(
            "flux has {} energy bins but {} energy centres",
            grid.rows,
            energies.len()
        );
    }
    Some(Spectrogram { times: times.to_vec(), energies, grid })
}

// ---------------------------------------------------------------------------
// Dates
// ---------------------------------------------------------------------------

/// Observation date encoded in a SWIS file name.
///
/// The fifth `_`-separated token starts with `YYYYMMDD`, e.g.
/// `AL1_ASW91_L2_TH2_20250522_UNP_9999_999999_V02.cdf`.
pub fn observation_date_from_filename(path: &Path) -> Option<NaiveDate> {
    let name = path.file_name()?.to_str()?;
    let token = name.split('_').nth(4)?;
    let digits = token.get(..8)?;
    NaiveDate::parse_from_str(digits, "%Y%m%d").ok()
}

/// First and last calendar day covered by `times` (min/max, not first/last).
pub fn observation_period(times: &[Timestamp]) -> Option<(NaiveDate, NaiveDate)> {
    let start = times.iter().min()?;
    let end = times.iter().max()?;
    Some((start.date(), end.date()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    fn times(n: usize) -> Vec<Timestamp> {
        let start = NaiveDate::from_ymd_opt(2025, 5, 22)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        (0..n).map(|i| start + TimeDelta::hours(i as i64)).collect()
    }

    #[test]
    fn integrate_skips_nan_cells() {
        let cells = vec![1.0, 2.0, 3.0, f64::NAN, 4.0, 5.0, f64::NAN, f64::NAN, f64::NAN];
        let g = Grid::new(3, 3, cells).unwrap();
        let sums = integrate_rows(&g);
        assert_eq!(&sums[..2], &[6.0, 9.0]);
        assert!(sums[2].is_nan());
    }

    #[test]
    fn spectrogram_is_energy_major() {
        let t = times(3);
        let energy = Grid::new(3, 2, vec![1.0, 2.0, 1.0, 2.0, 1.0, 2.0]).unwrap();
        // time-major: 3 records × 2 bins
        let flux = Grid::new(3, 2, vec![1.0, 10.0, 100.0, 1000.0, 0.0, 1e31]).unwrap();
        let s = build_spectrogram(&t, &energy, &flux, 1e30).unwrap();

        assert_eq!(s.energies, vec![1.0, 2.0]);
        assert_eq!((s.grid.rows, s.grid.cols), (2, 3));
        assert!((s.grid.get(0, 1) - 2.0).abs() < 1e-9);
        assert!((s.grid.get(1, 1) - 3.0).abs() < 1e-9);
        assert!((s.grid.get(0, 2) - -10.0).abs() < 1e-9);
        assert!(s.grid.get(1, 2).is_nan());
    }

    #[test]
    fn spectrogram_already_energy_major_is_kept() {
        let t = times(3);
        let energy = Grid::new(1, 2, vec![5.0, 6.0]).unwrap();
        let flux = Grid::new(2, 3, vec![1.0; 6]).unwrap();
        let s = build_spectrogram(&t, &energy, &flux, 1e30).unwrap();
        assert_eq!((s.grid.rows, s.grid.cols), (2, 3));
    }

    #[test]
    fn spectrogram_needs_energies_and_flux() {
        let t = times(1);
        let flux = Grid::new(1, 2, vec![1.0, 1.0]).unwrap();
        assert!(build_spectrogram(&t, &Grid::empty(2), &flux, 1e30).is_none());
    }

    #[test]
    fn date_from_filename() {
        let p = Path::new("/data/AL1_ASW91_L2_TH2_20250522_UNP_9999_999999_V02.cdf");
        assert_eq!(observation_date_from_filename(p), NaiveDate::from_ymd_opt(2025, 5, 22));
        assert_eq!(observation_date_from_filename(Path::new("flux.cdf")), None);
        assert_eq!(observation_date_from_filename(Path::new("a_b_c_d_2025.cdf")), None);
    }

    #[test]
    fn period_uses_min_and_max() {
        let mut t = times(30);
        t.swap(0, 29);
        let (start, end) = observation_period(&t).unwrap();
        assert_eq!(start, NaiveDate::from_ymd_opt(2025, 5, 22).unwrap());
        assert_eq!(end, NaiveDate::from_ymd_opt(2025, 5, 23).unwrap());
        assert_eq!(observation_period(&[]), None);
    }
}
