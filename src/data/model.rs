use chrono::{DateTime, NaiveDateTime, Timelike};

// ---------------------------------------------------------------------------
// Timestamp – calendar time of one sample
// ---------------------------------------------------------------------------

/// A UTC instant. Leap seconds use chrono's `23:59:60` representation.
pub type Timestamp = NaiveDateTime;

/// Seconds since the Unix epoch, the x coordinate used by the plots.
pub fn plot_seconds(ts: &Timestamp) -> f64 {
    let utc = ts.and_utc();
    utc.timestamp() as f64 + utc.nanosecond() as f64 * 1e-9
}

/// Inverse of [`plot_seconds`], for axis labels.
pub fn from_plot_seconds(seconds: f64) -> Option<Timestamp> {
    if !seconds.is_finite() {
        return None;
    }
    let whole = seconds.floor();
    let nanos = ((seconds - whole) * 1e9).round().min(999_999_999.0) as u32;
    DateTime::from_timestamp(whole as i64, nanos).map(|dt| dt.naive_utc())
}

// ---------------------------------------------------------------------------
// Grid – one 2-D variable (records × values per record)
// ---------------------------------------------------------------------------

/// Row-major 2-D array of samples; one row per record.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    pub rows: usize,
    pub cols: usize,
    pub values: Vec<f64>,
}

impl Grid {
    pub fn new(rows: usize, cols: usize, values: Vec<f64>) -> Option<Self> {
        (rows.checked_mul(cols)? == values.len()).then_some(Grid { rows, cols, values })
    }

    pub fn empty(cols: usize) -> Self {
        Grid { rows: 0, cols, values: Vec::new() }
    }

    pub fn row(&self, i: usize) -> &[f64] {
        &self.values[i * self.cols..(i + 1) * self.cols]
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.values[row * self.cols + col]
    }

    pub fn transpose(&self) -> Grid {
        let mut values = Vec::with_capacity(self.values.len());
        for c in 0..self.cols {
            for r in 0..self.rows {
                values.push(self.get(r, c));
            }
        }
        Grid { rows: self.cols, cols: self.rows, values }
    }

    /// Whether `other`'s rows can be appended below this grid's.
    pub fn can_append(&self, other: &Grid) -> bool {
        self.rows == 0 || other.rows == 0 || self.cols == other.cols
    }

    /// Append `other`'s rows. Callers check [`Grid::can_append`] first.
    pub fn append(&mut self, other: Grid) {
        if self.rows == 0 {
            *self = other;
        } else if other.rows > 0 {
            self.rows += other.rows;
            self.values.extend(other.values);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

// ---------------------------------------------------------------------------
// TimeSeries – one quantity after cleaning and filtering
// ---------------------------------------------------------------------------

/// Parallel time/value sequences for one quantity, ready to draw.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimeSeries {
    pub times: Vec<Timestamp>,
    pub values: Vec<f64>,
}

impl TimeSeries {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// `[seconds, value]` pairs for the plot.
    pub fn plot_points(&self) -> Vec<[f64; 2]> {
        self.times
            .iter()
            .zip(&self.values)
            .map(|(t, &v)| [plot_seconds(t), v])
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Spectrogram – energy × time image
// ---------------------------------------------------------------------------

/// Log-scaled flux laid out energy-major: `grid.rows` energy bins by
/// `grid.cols` timestamps. Non-finite cells are missing.
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrogram {
    pub times: Vec<Timestamp>,
    pub energies: Vec<f64>,
    pub grid: Grid,
}

impl Spectrogram {
    /// Min and max over finite cells, if any.
    pub fn value_range(&self) -> Option<(f64, f64)> {
        self.grid
            .values
            .iter()
            .filter(|v| v.is_finite())
            .fold(None, |acc, &v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn plot_seconds_round_trip() {
        let t = NaiveDate::from_ymd_opt(2025, 5, 22)
            .unwrap()
            .and_hms_milli_opt(6, 30, 0, 250)
            .unwrap();
        let s = plot_seconds(&t);
        assert_eq!(s, 1_747_895_400.25);
        assert_eq!(from_plot_seconds(s), Some(t));
    }

    #[test]
    fn grid_transpose_and_append() {
        let mut g = Grid::new(2, 3, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        let t = g.transpose();
        assert_eq!((t.rows, t.cols), (3, 2));
        assert_eq!(t.values, vec![1.0, 4.0, 2.0, 5.0, 3.0, 6.0]);

        let more = Grid::new(1, 3, vec![7.0, 8.0, 9.0]).unwrap();
        assert!(g.can_append(&more));
        g.append(more);
        assert_eq!(g.rows, 3);
        assert_eq!(g.row(2), &[7.0, 8.0, 9.0]);
        assert!(!g.can_append(&Grid::new(1, 2, vec![0.0, 0.0]).unwrap()));
        assert!(Grid::new(2, 2, vec![0.0]).is_none());
    }

    #[test]
    fn value_range_skips_missing_cells() {
        let s = Spectrogram {
            times: Vec::new(),
            energies: Vec::new(),
            grid: Grid::new(1, 4, vec![f64::NAN, -2.0, 5.0, f64::NEG_INFINITY]).unwrap(),
        };
        assert_eq!(s.value_range(), Some((-2.0, 5.0)));
    }
}
