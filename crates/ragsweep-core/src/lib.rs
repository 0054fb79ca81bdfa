pub mod config;
pub mod context;
pub mod dataset;
pub mod engine;
pub mod errors;
pub mod invoker;
pub mod model;
pub mod prompt;
pub mod providers;
pub mod report;
pub mod sweep;
pub mod vcr;
