pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod evaluate;
pub mod features;
pub mod identity;
pub mod knn;
pub mod loader;
pub mod matrix;
pub mod searcher;
pub mod shift;
pub mod utils;

pub use config::Opts;
pub use error::Error;
pub use features::FeatureSet;
