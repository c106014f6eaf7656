pub mod board;
pub mod config;
pub mod dashboard;
pub mod debounce;
pub mod engine;
pub mod errors;
pub mod fetch;
pub mod filters;
pub mod format;
pub mod panel;
