//! API Constants and Configuration for the Zoho CRM API

/// Default API host
pub const DEFAULT_BASE_URL: &str = "https://crm.zoho.com";

/// Base API path, followed by `/{format}/{Module}/{method}`
pub const API_BASE_PATH: &str = "/crm/private";

/// Request timeout in seconds when none is configured
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Name of the parameter carrying the auth token
pub const AUTH_TOKEN_PARAM: &str = "authtoken";

/// Lowest record index the server accepts
pub const MIN_INDEX: u32 = 1;

/// Maximum number of records the server returns per call
pub const PAGE_MAX_SIZE: u32 = 200;

/// Server code for an empty result set
pub const NO_DATA_CODE: &str = "4422";

/// Well-known parameter names
pub mod params {
    pub const SCOPE: &str = "scope";
    pub const NEW_FORMAT: &str = "newFormat";
    pub const VERSION: &str = "version";
    pub const FROM_INDEX: &str = "fromIndex";
    pub const TO_INDEX: &str = "toIndex";
}

/// Default values for the well-known parameters
pub mod defaults {
    pub const SCOPE: &str = "crmapi";
    pub const NEW_FORMAT: i64 = 1;
    pub const VERSION: i64 = 2;
}

/// Build the endpoint URL for a module method
pub fn method_endpoint(base_url: &str, format: &str, module: &str, method: &str) -> String {
    format!(
        "{}{}/{}/{}/{}",
        base_url.trim_end_matches('/'),
        API_BASE_PATH,
        format,
        module,
        method
    )
}
