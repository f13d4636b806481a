//! Viewer for Aditya-L1 SWIS plasma data.
//!
//! Reads BLK and TH2 CDF files, drops fill values and draws the plasma
//! parameters, integrated flux and an energy spectrogram.

pub mod app;
pub mod color;
pub mod config;
pub mod data;
pub mod state;
pub mod ui;
