//! Infrastructure: the local scan engine implementation

pub mod engine;

pub use engine::local::LocalScanEngine;
