//! Client configuration and the handle shared by every endpoint module.
//!
//! # Design
//! `ClientConfig` is plain serde data so it can be built in code or layered
//! from the environment through figment. Once a client exists, the config
//! lives behind a `SharedConfig` handle; the facade and each of its endpoint
//! modules hold clones of the same handle, so a write through any of them is
//! seen by all subsequent requests.

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard};

use figment::providers::{Env, Serialized};
use figment::Figment;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ApiError, Result};

pub const DEFAULT_API_URL: &str = "https://api.weeb.sh";

/// Token, user agent and API URL used for every request.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClientConfig {
    #[serde(default, deserialize_with = "text::required")]
    pub token: String,
    #[serde(default, deserialize_with = "text::optional")]
    pub user_agent: Option<String>,
    #[serde(default = "default_api_url")]
    pub api_url: String,
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            user_agent: None,
            api_url: default_api_url(),
        }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("token", &"<redacted>")
            .field("user_agent", &self.user_agent)
            .field("api_url", &self.api_url)
            .finish()
    }
}

impl ClientConfig {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            ..Self::default()
        }
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    /// Load from `WEEBSH_TOKEN`, `WEEBSH_USER_AGENT` and `WEEBSH_API_URL`,
    /// falling back to the defaults for anything unset.
    pub fn from_env() -> Result<Self> {
        Figment::new()
            .merge(Serialized::defaults(ClientConfig::default()))
            .merge(Env::prefixed("WEEBSH_"))
            .extract()
            .map_err(|e| ApiError::Config(e.to_string()))
    }

    /// Fail on an empty token; report user agent problems as advisories.
    pub(crate) fn validate(&self, component: &str) -> Result<Vec<Advisory>> {
        if self.token.is_empty() {
            return Err(ApiError::BadCredentials("authorization is empty".to_string()));
        }
        let advisories = Advisory::check(self.user_agent.as_deref());
        for advisory in &advisories {
            warn!(component, advisory = %advisory, "user agent advisory");
        }
        Ok(advisories)
    }
}

/// Scalars read back as text. Environment providers type `12345` as a
/// number even when the field is a token.
mod text {
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Scalar {
        Text(String),
        Unsigned(u64),
        Signed(i64),
        Float(f64),
        Bool(bool),
    }

    impl From<Scalar> for String {
        fn from(scalar: Scalar) -> Self {
            match scalar {
                Scalar::Text(s) => s,
                Scalar::Unsigned(n) => n.to_string(),
                Scalar::Signed(n) => n.to_string(),
                Scalar::Float(n) => n.to_string(),
                Scalar::Bool(b) => b.to_string(),
            }
        }
    }

    pub(super) fn required<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
        Scalar::deserialize(d).map(String::from)
    }

    pub(super) fn optional<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        Ok(Option::<Scalar>::deserialize(d)?.map(String::from))
    }
}

/// Non-fatal construction-time findings about the configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advisory {
    /// No user agent was configured.
    MissingUserAgent,
    /// The user agent does not look like `name/version`.
    MalformedUserAgent,
}

impl Advisory {
    pub fn check(user_agent: Option<&str>) -> Vec<Advisory> {
        match user_agent {
            None => vec![Advisory::MissingUserAgent],
            Some(ua) if ua.split('/').count() < 2 => vec![Advisory::MalformedUserAgent],
            Some(_) => Vec::new(),
        }
    }
}

impl fmt::Display for Advisory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Advisory::MissingUserAgent => f.write_str(
                "user agent is empty; consider adding one to help identify issues",
            ),
            Advisory::MalformedUserAgent => f.write_str(
                "user agent is not of the form name/version[/env]; consider fixing it",
            ),
        }
    }
}

/// Builds a `name/version[/env]` user agent string from its parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserAgent {
    pub name: String,
    pub version: String,
    pub env: Option<String>,
}

impl UserAgent {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            env: None,
        }
    }

    pub fn env(mut self, env: impl Into<String>) -> Self {
        self.env = Some(env.into());
        self
    }
}

impl fmt::Display for UserAgent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.name, self.version)?;
        if let Some(env) = &self.env {
            write!(f, "/{env}")?;
        }
        Ok(())
    }
}

impl From<UserAgent> for String {
    fn from(ua: UserAgent) -> Self {
        ua.to_string()
    }
}

/// Shared, mutable view of a `ClientConfig`.
///
/// Cloning yields another handle to the same configuration. Writes are not
/// ordered against requests already in flight on other threads.
#[derive(Debug, Clone)]
pub struct SharedConfig {
    inner: Arc<RwLock<ClientConfig>>,
}

impl SharedConfig {
    pub fn new(mut config: ClientConfig) -> Self {
        config.api_url = normalize_url(&config.api_url);
        config.user_agent = config.user_agent.filter(|ua| !ua.is_empty());
        Self {
            inner: Arc::new(RwLock::new(config)),
        }
    }

    pub fn read(&self) -> RwLockReadGuard<'_, ClientConfig> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn snapshot(&self) -> ClientConfig {
        self.read().clone()
    }

    pub fn set_token(&self, token: impl Into<String>) {
        self.update(|c| c.token = token.into());
    }

    /// Replace the user agent; a missing or malformed one is logged.
    pub fn set_user_agent(&self, user_agent: Option<String>) {
        let user_agent = user_agent.filter(|ua| !ua.is_empty());
        for advisory in Advisory::check(user_agent.as_deref()) {
            warn!(advisory = %advisory, "user agent advisory");
        }
        self.update(|c| c.user_agent = user_agent);
    }

    pub fn advisories(&self) -> Vec<Advisory> {
        Advisory::check(self.read().user_agent.as_deref())
    }

    pub fn set_api_url(&self, api_url: &str) {
        let url = normalize_url(api_url);
        self.update(|c| c.api_url = url);
    }

    fn update(&self, f: impl FnOnce(&mut ClientConfig)) {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard);
    }
}

fn normalize_url(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_token_is_rejected() {
        let err = ClientConfig::default().validate("test").unwrap_err();
        assert!(matches!(err, ApiError::BadCredentials(_)));
    }

    #[test]
    fn missing_user_agent_is_advisory_only() {
        let advisories = ClientConfig::new("token").validate("test").unwrap();
        assert_eq!(advisories, vec![Advisory::MissingUserAgent]);
    }

    #[test]
    fn user_agent_without_version_is_malformed() {
        let config = ClientConfig::new("token").with_user_agent("mybot");
        assert_eq!(config.validate("test").unwrap(), vec![Advisory::MalformedUserAgent]);

        let config = ClientConfig::new("token").with_user_agent("mybot/1.0.0");
        assert!(config.validate("test").unwrap().is_empty());
    }

    #[test]
    fn user_agent_from_parts() {
        assert_eq!(UserAgent::new("mybot", "1.2.0").to_string(), "mybot/1.2.0");
        assert_eq!(
            UserAgent::new("mybot", "1.2.0").env("dev").to_string(),
            "mybot/1.2.0/dev"
        );
    }

    #[test]
    fn debug_redacts_token() {
        let rendered = format!("{:?}", ClientConfig::new("Wolke secret"));
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains(DEFAULT_API_URL));
    }

    #[test]
    fn shared_handles_see_each_others_writes() {
        let a = SharedConfig::new(ClientConfig::new("old"));
        let b = a.clone();
        a.set_token("new");
        b.set_api_url("http://localhost:8080/");
        assert_eq!(b.read().token, "new");
        assert_eq!(a.read().api_url, "http://localhost:8080");
    }

    #[test]
    fn empty_user_agent_is_treated_as_missing() {
        let shared = SharedConfig::new(ClientConfig::new("t").with_user_agent(""));
        assert_eq!(shared.read().user_agent, None);
    }

    #[test]
    fn from_env_layers_over_defaults() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("WEEBSH_TOKEN", "Wolke abc");
            jail.set_env("WEEBSH_USER_AGENT", "mybot/1.0.0");

            let config = ClientConfig::from_env().expect("config loads");
            assert_eq!(config.token, "Wolke abc");
            assert_eq!(config.user_agent.as_deref(), Some("mybot/1.0.0"));
            assert_eq!(config.api_url, DEFAULT_API_URL);
            Ok(())
        });
    }

    #[test]
    fn from_env_accepts_numeric_values() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("WEEBSH_TOKEN", "12345");
            jail.set_env("WEEBSH_USER_AGENT", "42");

            let config = ClientConfig::from_env().expect("config loads");
            assert_eq!(config.token, "12345");
            assert_eq!(config.user_agent.as_deref(), Some("42"));
            Ok(())
        });
    }

    #[test]
    fn deserializes_from_plain_json() {
        let config: ClientConfig =
            serde_json::from_str(r#"{"token": "Wolke abc", "user_agent": null}"#).unwrap();
        assert_eq!(config.token, "Wolke abc");
        assert_eq!(config.user_agent, None);
        assert_eq!(config.api_url, DEFAULT_API_URL);
    }

    #[test]
    fn from_env_overrides_api_url() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("WEEBSH_TOKEN", "t");
            jail.set_env("WEEBSH_API_URL", "http://127.0.0.1:3000");

            let config = ClientConfig::from_env().expect("config loads");
            assert_eq!(config.api_url, "http://127.0.0.1:3000");
            Ok(())
        });
    }
}
