//! HTTP presentation layer: request/response models, auth extractor,
//! controllers and router assembly

pub mod controllers;
pub mod extractors;
pub mod models;
pub mod routes;

#[cfg(test)]
mod tests;

pub use controllers::AppState;
pub use routes::create_router;
