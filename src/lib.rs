pub mod config;
pub mod dashboard;
pub mod error;
pub mod explainer;
pub mod loader;
pub mod observation;
pub mod output;
pub mod selector;
pub mod stats;
