//! Neutron Config
//!
//! This crate contains the simulation parameter types for Neutron and the
//! installation root every other path is anchored to.
//!
//! A [`ParameterRecord`] is what the presentation layer hands over: run
//! settings, material coefficients and the geometry selection. It serializes
//! to the nested JSON layout the simulation executable reads:
//!
//! ```json
//! {
//!   "run": { "run_name": "test1", "simulations": 1000 },
//!   "material": { "lambda": 0.5, "pabs": 0.3, "k": 1.0 },
//!   "geometry": { "shape": "sphere" }
//! }
//! ```
//!
//! Validation here is structural only. Whether a combination of parameters
//! makes physical sense is for the executable to decide.

mod error;
mod record;
mod root;

pub use error::{PathError, ValidationError};
pub use record::{GeometryParams, MaterialParams, ParameterRecord, RunParams, Shape};
pub use root::InstallRoot;
