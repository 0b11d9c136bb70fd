//! Zoho CRM API Module
//!
//! Request dispatch for the CRM's record-oriented API: module/method
//! validation, layered URL parameters, transparent pagination over index
//! windows, and shaping of the results.

pub mod client;
pub mod constants;
pub mod error;
pub mod modules;
pub mod paginator;
pub mod params;
pub mod parser;
pub mod request;
pub mod response;
pub mod transport;

pub use client::{Client, ClientBuilder, ClientPreferences, RequestOutcome};
pub use error::{CrmError, Result};
pub use modules::{ModuleCatalog, ModuleDescriptor, ModuleRegistry, DEFAULT_MODULES};
pub use paginator::{PaginationState, Paginator};
pub use params::{DefaultParameters, DefaultParametersBuilder, ParamValue, UrlParameters};
pub use parser::{ResponseParser, ZohoResponseParser};
pub use request::{Request, ResponseFormat};
pub use response::{Entity, Output, PageResult, Record, Response, ResponseMode};
pub use transport::{HttpTransport, Transport};
