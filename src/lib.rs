pub mod api;
pub mod cli;
pub mod config;

pub use api::{Client, CrmError, RequestOutcome, ResponseFormat, ResponseMode};
