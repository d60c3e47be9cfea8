//! Ingestion and publication of the daily official BCV exchange rate.
//!
//! Two externally scheduled jobs: [`ingest`] scrapes the (rate, effective
//! date) pair from the BCV page and reconciles it into a contiguous
//! history of validity intervals; [`publish`] re-exposes the interval
//! active today as the `tasa_bcv` parameter, mailing the operator on both
//! outcomes.

pub mod config;
pub mod error;
pub mod handlers;
pub mod ingest;
pub mod model;
pub mod notify;
pub mod publish;
pub mod source;
pub mod store;
pub mod window;
