//! Agronomy knowledge used to turn a diagnostic description into retrieval signals.
//!
//! Every table here is an ordered list of tagged predicates evaluated uniformly.

pub mod crop;
pub mod disease;
pub mod soil;
pub mod visual;
