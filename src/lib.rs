//! stockpile — daily stock-price importer with derived indicators.
//!
//! Hexagonal architecture: pure domain logic in [`domain`], port traits in
//! [`ports`], concrete store and config implementations in [`adapters`].

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod cli;
