//! VM options assembly for Qodana linter launches.
//!
//! Merges a fixed baseline, product-derived defaults, the project's
//! `qodana.yaml` properties and command-line overrides into one sorted list
//! of JVM options, and writes it where the IDE launcher will find it.
//!
//! Inputs are plain values; the crate has no knowledge of how the linter was
//! installed or how the usage token was obtained.

pub mod assemble;
pub mod context;
pub mod device;
pub mod layer;
pub mod rules;
pub mod write;

pub use assemble::{AssembledConfiguration, Baseline, assemble};
pub use context::{DotNetSettings, IdePaths, ProductContext};
pub use device::DeviceIdentity;
pub use layer::{ConfigurationLayer, normalise_key};
pub use write::{ConfigurationError, vm_options_path, write_vm_options};
