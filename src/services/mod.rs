//! Core services: attribute encoding, backends, descriptor limits and the walker

#[cfg(unix)]
pub mod attrs;
pub mod encode;
pub mod limits;
pub mod position;
#[cfg(unix)]
pub mod traverse;
