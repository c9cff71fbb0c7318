//! Qodana linter distribution acquisition.
//!
//! Resolves the newest published release of a supported product for the
//! host, downloads and verifies it, and installs it into a destination
//! directory atomically.
//!
//! # Modules
//!
//! - [`acquire`] - Acquisition orchestration and the installed-tool record
//! - [`app_info`] - Product manifest parsing
//! - [`checksum`] - SHA-256 verification of downloads
//! - [`command`] - External command execution
//! - [`download`] - HTTP retrieval of feeds and artefacts
//! - [`error`] - Acquisition errors carrying product and destination
//! - [`extraction`] - Unpacking of tarballs, zips, installers and disk images
//! - [`platform`] - Host detection and download-kind selection
//! - [`product`] - Supported products and release channels
//! - [`release`] - Release feed parsing and selection

pub mod acquire;
pub mod app_info;
pub mod checksum;
pub mod command;
pub mod download;
pub mod error;
pub mod extraction;
pub mod platform;
pub mod product;
pub mod release;

#[cfg(any(test, feature = "test-support"))]
pub mod test_utils;

pub use acquire::{InstalledTool, ToolAcquirer};
pub use app_info::ProductInfo;
pub use error::{AcquisitionError, AcquisitionFailure};
pub use product::{Channel, ProductCode, ProductRequest};
