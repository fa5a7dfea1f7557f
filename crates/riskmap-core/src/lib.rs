//! Core types, feature engine and classifier for riskmap.
//!
//! No HTTP or database dependencies live here. Storage backends implement the
//! traits in [`store`]; everything else is pure computation over the records
//! in [`region`] and [`series`].

pub mod classify;
pub mod config;
pub mod delta;
pub mod error;
pub mod frame;
pub mod pipeline;
pub mod project;
pub mod region;
pub mod rolling;
pub mod series;
pub mod store;

pub use error::{Error, Result};
