//! Core domain models and interfaces

pub mod scan;
