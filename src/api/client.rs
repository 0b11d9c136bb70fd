//! Zoho CRM client and request dispatch
//!
//! [`Client::request`] validates the module/method pair, layers the request
//! parameters (server defaults, auth token, caller values), then either fires a
//! single call or hands the request to a [`Paginator`]. The result is shaped
//! according to the response mode before it is returned.
//!
//! Configuration lives behind an [`ArcSwap`] and is snapshotted once per
//! call, so setters may run concurrently with in-flight requests.

use super::constants::AUTH_TOKEN_PARAM;
use super::error::{CrmError, Result};
use super::modules::{ModuleCatalog, ModuleDescriptor, ModuleRegistry, DEFAULT_MODULES};
use super::paginator::{fetch_page, Paginator};
use super::params::{DefaultParameters, ParamValue, UrlParameters};
use super::parser::{ResponseParser, ZohoResponseParser};
use super::request::{Request, ResponseFormat};
use super::response::{Output, Response, ResponseMode};
use super::transport::{HttpTransport, Transport};
use arc_swap::ArcSwap;
use log::debug;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Client-wide behavior preferences
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientPreferences {
    pub response_mode: ResponseMode,
    pub auto_fetch_paginated_requests: bool,
}

impl Default for ClientPreferences {
    fn default() -> Self {
        Self {
            response_mode: ResponseMode::Full,
            auto_fetch_paginated_requests: true,
        }
    }
}

#[derive(Debug, Clone)]
struct Settings {
    auth_token: String,
    default_parameters: UrlParameters,
    preferences: ClientPreferences,
}

/// Result of [`Client::request`]
#[derive(Debug)]
pub enum RequestOutcome {
    /// The call completed and was shaped by the response mode
    Completed(Output),
    /// Pagination was requested without auto-fetch; drive it manually
    Paginator(Paginator),
    /// Auto-fetch stopped on a failed page; `partial` holds the pages before it
    Incomplete { partial: Output, error: CrmError },
}

impl RequestOutcome {
    /// Output of a completed call
    pub fn into_output(self) -> Option<Output> {
        match self {
            RequestOutcome::Completed(output) => Some(output),
            _ => None,
        }
    }

    pub fn into_paginator(self) -> Option<Paginator> {
        match self {
            RequestOutcome::Paginator(paginator) => Some(paginator),
            _ => None,
        }
    }

    pub fn into_partial(self) -> Option<(Output, CrmError)> {
        match self {
            RequestOutcome::Incomplete { partial, error } => Some((partial, error)),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&CrmError> {
        match self {
            RequestOutcome::Incomplete { error, .. } => Some(error),
            _ => None,
        }
    }
}

pub struct Client {
    registry: ModuleRegistry,
    transport: Arc<dyn Transport>,
    parser: Arc<dyn ResponseParser>,
    settings: ArcSwap<Settings>,
}

impl Client {
    /// Client with the default modules, defaults and HTTP transport
    pub fn new(auth_token: impl Into<String>) -> Result<Self> {
        Self::builder().auth_token(auth_token).build()
    }

    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    pub fn supported_modules(&self) -> &[String] {
        self.registry.module_names()
    }

    pub fn supports(&self, module: &str) -> bool {
        self.registry.contains(module)
    }

    pub fn module(&self, module: &str) -> Option<&ModuleDescriptor> {
        self.registry.get(module)
    }

    pub fn auth_token(&self) -> String {
        self.settings.load().auth_token.clone()
    }

    /// Replace the auth token; an empty token is rejected and the old one kept
    pub fn set_auth_token(&self, auth_token: impl Into<String>) -> Result<()> {
        let auth_token = auth_token.into();
        if auth_token.is_empty() {
            return Err(CrmError::EmptyAuthToken);
        }
        self.settings.rcu(|current| Settings {
            auth_token: auth_token.clone(),
            ..Settings::clone(current)
        });
        Ok(())
    }

    pub fn default_parameters(&self) -> UrlParameters {
        self.settings.load().default_parameters.clone()
    }

    pub fn set_default_parameters(&self, parameters: impl Into<UrlParameters>) {
        let parameters = parameters.into();
        self.settings.rcu(|current| Settings {
            default_parameters: parameters.clone(),
            ..Settings::clone(current)
        });
    }

    pub fn set_default_parameter(&self, key: &str, value: impl Into<ParamValue>) {
        let value = value.into();
        self.settings.rcu(|current| {
            let mut next = Settings::clone(current);
            next.default_parameters.set(key, value.clone());
            next
        });
    }

    pub fn unset_default_parameter(&self, key: &str) {
        self.settings.rcu(|current| {
            let mut next = Settings::clone(current);
            next.default_parameters.unset(key);
            next
        });
    }

    pub fn preferences(&self) -> ClientPreferences {
        self.settings.load().preferences
    }

    pub fn set_preferences(&self, preferences: ClientPreferences) {
        self.settings.rcu(|current| Settings {
            preferences,
            ..Settings::clone(current)
        });
    }

    pub fn set_response_mode(&self, response_mode: ResponseMode) {
        self.settings.rcu(|current| {
            let mut next = Settings::clone(current);
            next.preferences.response_mode = response_mode;
            next
        });
    }

    pub fn set_auto_fetch_paginated_requests(&self, enabled: bool) {
        self.settings.rcu(|current| {
            let mut next = Settings::clone(current);
            next.preferences.auto_fetch_paginated_requests = enabled;
            next
        });
    }

    /// Dispatch a call, shaping the result with the client's response mode
    pub async fn request(
        &self,
        module: &str,
        method: &str,
        params: UrlParameters,
        paginate: bool,
        format: ResponseFormat,
    ) -> Result<RequestOutcome> {
        self.dispatch(None, module, method, params, paginate, format).await
    }

    /// Dispatch a call, shaping the result with an explicit response mode
    pub async fn request_as(
        &self,
        mode: ResponseMode,
        module: &str,
        method: &str,
        params: UrlParameters,
        paginate: bool,
        format: ResponseFormat,
    ) -> Result<RequestOutcome> {
        self.dispatch(Some(mode), module, method, params, paginate, format).await
    }

    /// Validate and build the request descriptor without sending anything
    pub fn prepare(
        &self,
        module: &str,
        method: &str,
        params: UrlParameters,
        format: ResponseFormat,
    ) -> Result<Request> {
        let settings = self.settings.load_full();
        self.build_request(&settings, module, method, params, format)
    }

    async fn dispatch(
        &self,
        mode: Option<ResponseMode>,
        module: &str,
        method: &str,
        params: UrlParameters,
        paginate: bool,
        format: ResponseFormat,
    ) -> Result<RequestOutcome> {
        let settings = self.settings.load_full();
        let request = self.build_request(&settings, module, method, params, format)?;
        let mode = mode.unwrap_or(settings.preferences.response_mode);
        debug!("Dispatching {} (paginate: {}, mode: {})", request, paginate, mode);

        let response = if paginate {
            let mut paginator = Paginator::new(request, self.transport.clone(), self.parser.clone());
            if !settings.preferences.auto_fetch_paginated_requests {
                return Ok(RequestOutcome::Paginator(paginator));
            }
            if let Err(error) = paginator.fetch_all().await {
                let partial = paginator.into_aggregated_response()?;
                return Ok(RequestOutcome::Incomplete {
                    partial: partial.transform(mode),
                    error,
                });
            }
            paginator.into_aggregated_response()?
        } else {
            let (raw, page) = fetch_page(self.transport.as_ref(), self.parser.as_ref(), &request).await?;
            Response::new(request, raw, page.records)
        };

        Ok(RequestOutcome::Completed(response.transform(mode)))
    }

    fn build_request(
        &self,
        settings: &Settings,
        module: &str,
        method: &str,
        params: UrlParameters,
        format: ResponseFormat,
    ) -> Result<Request> {
        if !self.registry.contains(module) {
            return Err(CrmError::UnsupportedModule(module.to_string()));
        }
        if !self.registry.supports(module, method) {
            return Err(CrmError::UnsupportedMethod {
                module: module.to_string(),
                method: method.to_string(),
            });
        }

        let parameters = settings
            .default_parameters
            .extend([(AUTH_TOKEN_PARAM, settings.auth_token.as_str())])
            .extend(params);

        Ok(Request::new(format, module, method, parameters))
    }
}

/// Builder for [`Client`]
pub struct ClientBuilder {
    auth_token: Option<String>,
    modules: Vec<String>,
    catalog: ModuleCatalog,
    default_parameters: UrlParameters,
    preferences: ClientPreferences,
    transport: Option<Arc<dyn Transport>>,
    parser: Option<Arc<dyn ResponseParser>>,
}

impl ClientBuilder {
    pub fn new() -> Self {
        Self {
            auth_token: None,
            modules: DEFAULT_MODULES.iter().map(|m| m.to_string()).collect(),
            catalog: ModuleCatalog::default(),
            default_parameters: DefaultParameters::default().into(),
            preferences: ClientPreferences::default(),
            transport: None,
            parser: None,
        }
    }

    pub fn auth_token(mut self, auth_token: impl Into<String>) -> Self {
        self.auth_token = Some(auth_token.into());
        self
    }

    /// Modules the client accepts; each must exist in the catalog
    pub fn modules<I, S>(mut self, modules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.modules = modules.into_iter().map(Into::into).collect();
        self
    }

    pub fn catalog(mut self, catalog: ModuleCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn default_parameters(mut self, parameters: impl Into<UrlParameters>) -> Self {
        self.default_parameters = parameters.into();
        self
    }

    pub fn preferences(mut self, preferences: ClientPreferences) -> Self {
        self.preferences = preferences;
        self
    }

    pub fn response_mode(mut self, response_mode: ResponseMode) -> Self {
        self.preferences.response_mode = response_mode;
        self
    }

    pub fn auto_fetch_paginated_requests(mut self, enabled: bool) -> Self {
        self.preferences.auto_fetch_paginated_requests = enabled;
        self
    }

    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn parser(mut self, parser: Arc<dyn ResponseParser>) -> Self {
        self.parser = Some(parser);
        self
    }

    pub fn build(self) -> Result<Client> {
        let auth_token = self
            .auth_token
            .filter(|token| !token.is_empty())
            .ok_or(CrmError::EmptyAuthToken)?;

        let registry = ModuleRegistry::build(&self.modules, &self.catalog)?;

        let transport = match self.transport {
            Some(transport) => transport,
            None => Arc::new(HttpTransport::with_defaults()?),
        };
        let parser = self.parser.unwrap_or_else(|| Arc::new(ZohoResponseParser));

        Ok(Client {
            registry,
            transport,
            parser,
            settings: ArcSwap::from_pointee(Settings {
                auth_token,
                default_parameters: self.default_parameters,
                preferences: self.preferences,
            }),
        })
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
