//! Endpoint modules, one per weeb.sh resource group.
//!
//! # Design
//! Every module wraps the same `Interface`: a `SharedConfig` handle plus a
//! `Transport`. Building a request reads the config at call time, so a token
//! or URL change made through any handle applies to the next request of
//! every module. Each call is one round trip: build, execute, translate,
//! normalize.

pub mod auto_image;
pub mod images;
pub mod reputation;
pub mod settings;

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tracing::debug;
use url::Url;

use crate::config::{Advisory, ClientConfig, SharedConfig};
use crate::error::{ApiError, Result};
use crate::http::{HttpMethod, HttpRequest, HttpResponse, Transport, UreqTransport};
use crate::id::IdRef;
use crate::multipart::Form;
use crate::response::{self, Payload};

pub use auto_image::{AutoImage, GenerateOptions, GeneratedImage, License};
pub use images::{
    ImageQuery, ImageTypes, Images, ListQuery, Nsfw, TypesQuery, Upload, UploadOptions,
};
pub use reputation::{Party, Reputation, ReputationBot, Transfer};
pub use settings::Settings;

/// Configuration and transport shared by the endpoint modules.
#[derive(Clone)]
pub struct Interface {
    config: SharedConfig,
    transport: Arc<dyn Transport>,
}

impl fmt::Debug for Interface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let config = self.config.read();
        f.debug_struct("Interface")
            .field("api_url", &config.api_url)
            .field("user_agent", &config.user_agent)
            .finish_non_exhaustive()
    }
}

impl Interface {
    /// Validate `config` and bind it to the default `ureq` transport.
    pub fn new(config: ClientConfig, component: &str) -> Result<Self> {
        Self::with_transport(config, Arc::new(UreqTransport::new()), component)
    }

    /// Validate `config` and bind it to a caller-supplied transport.
    ///
    /// Fails with `BadCredentials` on an empty token before any request is
    /// made. User agent problems are logged as advisories.
    pub fn with_transport(
        config: ClientConfig,
        transport: Arc<dyn Transport>,
        component: &str,
    ) -> Result<Self> {
        config.validate(component)?;
        Ok(Self {
            config: SharedConfig::new(config),
            transport,
        })
    }

    pub fn config(&self) -> &SharedConfig {
        &self.config
    }

    /// Advisories for the user agent currently configured.
    pub fn advisories(&self) -> Vec<Advisory> {
        self.config.advisories()
    }

    /// Absolute URL for `segments` under the configured API URL.
    ///
    /// Segments are percent-escaped, but `""`, `.` and `..` would still
    /// collapse into another endpoint, so they are refused.
    fn url(&self, segments: &[&str], query: &Query) -> Result<String> {
        if let Some(bad) = segments.iter().find(|s| matches!(**s, "" | "." | "..")) {
            return Err(ApiError::InvalidId((*bad).to_string()));
        }
        let base = self.config.read().api_url.clone();
        let mut url = Url::parse(&base)
            .map_err(|e| ApiError::Config(format!("invalid api url '{base}': {e}")))?;
        url.path_segments_mut()
            .map_err(|_| ApiError::Config(format!("api url '{base}' cannot have a path")))?
            .pop_if_empty()
            .extend(segments);
        if !query.0.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(query.0.iter().map(|(k, v)| (*k, v.as_str())));
        }
        Ok(url.into())
    }

    fn headers(&self, content_type: Option<String>) -> Vec<(String, String)> {
        let config = self.config.read();
        let mut headers = vec![("Authorization".to_string(), config.token.clone())];
        if let Some(ua) = &config.user_agent {
            headers.push(("User-Agent".to_string(), ua.clone()));
        }
        if let Some(content_type) = content_type {
            headers.push(("Content-Type".to_string(), content_type));
        }
        headers
    }

    pub(crate) fn build_get(&self, segments: &[&str], query: &Query) -> Result<HttpRequest> {
        Ok(HttpRequest {
            method: HttpMethod::Get,
            path: self.url(segments, query)?,
            headers: self.headers(None),
            body: None,
        })
    }

    pub(crate) fn build_json<T: Serialize + ?Sized>(
        &self,
        method: HttpMethod,
        segments: &[&str],
        body: &T,
    ) -> Result<HttpRequest> {
        let body = serde_json::to_vec(body).map_err(ApiError::serialization)?;
        Ok(HttpRequest {
            method,
            path: self.url(segments, &Query::new())?,
            headers: self.headers(Some("application/json".to_string())),
            body: Some(body),
        })
    }

    pub(crate) fn build_delete(&self, segments: &[&str]) -> Result<HttpRequest> {
        Ok(HttpRequest {
            method: HttpMethod::Delete,
            path: self.url(segments, &Query::new())?,
            headers: self.headers(None),
            body: None,
        })
    }

    pub(crate) fn build_form(&self, segments: &[&str], form: Form) -> Result<HttpRequest> {
        let content_type = form.content_type();
        Ok(HttpRequest {
            method: HttpMethod::Post,
            path: self.url(segments, &Query::new())?,
            headers: self.headers(Some(content_type)),
            body: Some(form.finish()),
        })
    }

    /// Execute `request` and translate any non-2xx status.
    pub(crate) fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        debug!(method = %request.method, path = %request.path, "sending request");
        let response = self.transport.execute(request).map_err(ApiError::Transport)?;
        response::translate(response)
    }

    /// Execute `request`, translate errors and normalize the body.
    pub(crate) fn call(&self, request: HttpRequest) -> Result<Payload> {
        let response = self.send(request)?;
        Ok(response::normalize(response.body))
    }
}

/// Ordered query-string parameters. `None` values are left out.
#[derive(Debug, Clone, Default)]
pub(crate) struct Query(Vec<(&'static str, String)>);

impl Query {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(mut self, key: &'static str, value: impl ToString) -> Self {
        self.0.push((key, value.to_string()));
        self
    }

    pub(crate) fn push_opt(self, key: &'static str, value: Option<impl ToString>) -> Self {
        match value {
            Some(value) => self.push(key, value),
            None => self,
        }
    }

    /// Comma-joined list; left out when empty.
    pub(crate) fn push_list(self, key: &'static str, values: &[String]) -> Self {
        if values.is_empty() {
            self
        } else {
            self.push(key, values.join(","))
        }
    }
}

/// Resolve every item to its id.
pub(crate) fn resolve_all<'a, I, T>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = T>,
    T: Into<IdRef<'a>>,
{
    items
        .into_iter()
        .map(|item| item.into().as_str().to_string())
        .collect()
}
