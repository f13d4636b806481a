/// Data layer: file formats, loading, cleaning and alignment.
///
/// Architecture:
/// ```text
///  .cdf / .parquet  (file list, read in order)
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  open each source → concatenated times + variables
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  clean    │  |x| > threshold → NaN
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  drop NaN samples per quantity → TimeSeries
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ pipeline  │  one prepared result per view
///   └──────────┘
/// ```

pub mod cdf;
pub mod clean;
pub mod filter;
pub mod loader;
pub mod model;
pub mod pipeline;
pub mod products;
pub mod source;
