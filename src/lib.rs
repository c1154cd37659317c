//! Self-collaboration score panel: dropdown options, filter reset and
//! Plotly figure rendering over a meeting turn dataset.

pub mod chart;
pub mod dataset;
pub mod db;
pub mod models;
pub mod panel;
pub mod report;
pub mod stats;
