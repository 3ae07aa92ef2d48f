pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod form;
pub mod notify;
pub mod relations;
pub mod schema;

pub use client::HttpRelationService;
pub use config::Config;
pub use error::{RelkitError, Result};
