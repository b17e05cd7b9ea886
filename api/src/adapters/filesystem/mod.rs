//! Filesystem adapters
//!
//! Image files live below a configurable root directory.

pub mod image_store;

pub use image_store::FsImageStore;
