use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveDateTime, TimeDelta};

use swis_plot::config::{sample_path, VariableNames};
use swis_plot::data::cdf::epoch::datetime_to_tt2000;
use swis_plot::data::cdf::{CdfWriter, WriterCompression};

const DAYS: [&str; 3] = ["20250522", "20250523", "20250524"];
const CADENCE_MINUTES: i64 = 5;
const ENERGY_BINS: usize = 50;
const FILL: f64 = 1e31;
/// Chance that any one sample is written as a fill value.
const FILL_RATE: f64 = 0.02;

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }

    /// `value`, or ±1e31 with probability [`FILL_RATE`].
    fn maybe_fill(&mut self, value: f64) -> f64 {
        if self.next_f64() < FILL_RATE {
            if self.next_f64() < 0.5 { FILL } else { -FILL }
        } else {
            value
        }
    }
}

fn day_times(day: &str) -> Result<Vec<NaiveDateTime>> {
    let start = NaiveDate::parse_from_str(day, "%Y%m%d")
        .with_context(|| format!("bad day {day}"))?
        .and_hms_opt(0, 0, 0)
        .context("midnight")?;
    let n = 24 * 60 / CADENCE_MINUTES;
    Ok((0..n).map(|i| start + TimeDelta::minutes(i * CADENCE_MINUTES)).collect())
}

fn tt2000(times: &[NaiveDateTime]) -> Result<Vec<i64>> {
    times
        .iter()
        .map(|t| datetime_to_tt2000(*t).with_context(|| format!("{t} out of TT2000 range")))
        .collect()
}

/// Slow daily swing in `[-1, 1]` for sample `i` of `n`.
fn diurnal(i: usize, n: usize, phase: f64) -> f64 {
    (2.0 * std::f64::consts::PI * i as f64 / n as f64 + phase).sin()
}

fn write_blk(day: &str, vars: &VariableNames, rng: &mut SimpleRng) -> Result<usize> {
    let times = day_times(day)?;
    let n = times.len();

    let mut density = Vec::with_capacity(n);
    let mut temperature = Vec::with_capacity(n);
    let mut velocity = Vec::with_capacity(n);
    for i in 0..n {
        let d = 5.0 + 1.5 * diurnal(i, n, 0.0) + rng.gauss(0.0, 0.3);
        let t = 12.0 + 4.0 * diurnal(i, n, 1.0) + rng.gauss(0.0, 0.8);
        let v = 420.0 + 60.0 * diurnal(i, n, 2.0) + rng.gauss(0.0, 10.0);
        density.push(rng.maybe_fill(d.max(0.1)));
        temperature.push(rng.maybe_fill(t.max(0.5)));
        velocity.push(rng.maybe_fill(v));
    }

    let mut writer = CdfWriter::new();
    writer
        .add_tt2000(&vars.time, &tt2000(&times)?)?
        .add_real8(&vars.density, &[], &density)?
        .add_real8(&vars.temperature, &[], &temperature)?
        .add_real8(&vars.velocity, &[], &velocity)?;

    let path = sample_path("BLK", day);
    writer.write_to(&path).with_context(|| format!("writing {}", path.display()))?;
    Ok(n)
}

fn write_th2(day: &str, vars: &VariableNames, rng: &mut SimpleRng) -> Result<usize> {
    let times = day_times(day)?;
    let n = times.len();

    // Log-spaced bin centres, 0.1 to 20 keV.
    let energies: Vec<f64> = (0..ENERGY_BINS)
        .map(|k| 0.1 * (200f64).powf(k as f64 / (ENERGY_BINS - 1) as f64))
        .collect();

    let mut energy = Vec::with_capacity(n * ENERGY_BINS);
    let mut flux = Vec::with_capacity(n * ENERGY_BINS);
    for i in 0..n {
        // Proton peak drifts with the bulk speed.
        let peak = 0.9 + 0.3 * diurnal(i, n, 2.0);
        let scale = 4e7 * (1.0 + 0.2 * diurnal(i, n, 0.5));
        energy.extend_from_slice(&energies);
        for &e in &energies {
            let x = (e.ln() - peak.ln()) / 0.35;
            let f = scale * (-0.5 * x * x).exp() * (1.0 + rng.gauss(0.0, 0.05)).max(0.0);
            flux.push(rng.maybe_fill(f));
        }
    }

    let mut writer = CdfWriter::new().compression(WriterCompression::Variables);
    writer
        .add_tt2000(&vars.time, &tt2000(&times)?)?
        .add_real8(&vars.energy, &[ENERGY_BINS], &energy)?
        .add_real8(&vars.flux, &[ENERGY_BINS], &flux)?;

    let path = sample_path("TH2", day);
    writer.write_to(&path).with_context(|| format!("writing {}", path.display()))?;
    Ok(n)
}

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);
    let vars = VariableNames::default();

    std::fs::create_dir_all("data").context("creating data/")?;

    for day in DAYS {
        let n = write_blk(day, &vars, &mut rng)?;
        println!("Wrote {} ({n} records)", sample_path("BLK", day).display());
        let n = write_th2(day, &vars, &mut rng)?;
        println!(
            "Wrote {} ({n} records × {ENERGY_BINS} energy bins)",
            sample_path("TH2", day).display()
        );
    }
    Ok(())
}
