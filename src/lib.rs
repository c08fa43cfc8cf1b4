//! apkhd - hyperdimensional malware classification for Android packages
//!
//! Pipeline: [`extract`] turns a package into an ordered method -> opcodes
//! map, [`encoder`] binds and bundles it into one bipolar hypervector using
//! the [`hdc`] primitives, and [`classifier`] builds class vectors from
//! labeled applications or scores a sample against them. [`store`] persists
//! class vectors as `.npy` files and JSON interchange documents.

pub mod classifier;
pub mod config;
pub mod encoder;
pub mod error;
pub mod extract;
pub mod hdc;
pub mod samples;
pub mod store;
pub mod telemetry;

pub use error::{HdcError, HdcResult};
