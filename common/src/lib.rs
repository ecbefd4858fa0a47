pub mod args;
pub mod config;
pub mod error;
pub mod gcloud;
pub mod keys;
pub mod metadata;

pub use error::Error;
