//! Occurrence report generation.
//!
//! Fetches absence/occurrence records for a contract and a set of monthly
//! periods from a remote document store, aggregates them by period, type,
//! company and unit, renders a bar chart and a pie chart, and assembles a
//! fixed-layout PDF report.
//!
//! The pipeline is a synchronous, run-to-completion batch: see
//! [`pipeline::run`] for the entry point and [`config::ReportConfig`] /
//! [`config::FirestoreConfig`] for the knobs.

pub mod aggregate;
pub mod chart;
pub mod config;
pub mod elements;
pub mod error;
pub mod fonts;
pub mod model;
pub mod pipeline;
pub mod report;
pub mod store;
