//! Electric-vehicle market dashboard engine.
//!
//! Load a dataset, narrow it with year/region/mode filters, and derive the
//! grouped sums, insights and chart descriptions the dashboard draws. The
//! egui front end lives in the `ev-dashboard` binary; everything here is
//! usable (and tested) without a window.

pub mod chart;
pub mod color;
pub mod config;
pub mod data;
pub mod export;
pub mod insights;
pub mod state;
