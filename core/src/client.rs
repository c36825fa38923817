//! The `Client` facade over all weeb.sh resource groups.
//!
//! # Design
//! `Client` validates the configuration once and hands clones of the same
//! `Interface` to each endpoint module. Setters write through the shared
//! config handle, so every module (and every entity they produced) uses
//! the new value on its next request.

use std::sync::Arc;

use crate::api::{AutoImage, Images, Interface, Reputation, Settings};
use crate::config::{Advisory, ClientConfig};
use crate::error::Result;
use crate::http::Transport;

/// Entry point aggregating one client per resource group.
#[derive(Debug, Clone)]
pub struct Client {
    interface: Interface,
    images: Images,
    auto_image: AutoImage,
    reputation: Reputation,
    settings: Settings,
}

impl Client {
    /// Build a client using the default blocking transport.
    ///
    /// Fails with `ApiError::BadCredentials` if the token is empty.
    pub fn new(config: ClientConfig) -> Result<Self> {
        Ok(Self::from_interface(Interface::new(config, "Client")?))
    }

    pub fn with_transport(config: ClientConfig, transport: Arc<dyn Transport>) -> Result<Self> {
        Ok(Self::from_interface(Interface::with_transport(
            config, transport, "Client",
        )?))
    }

    /// Build a client from `WEEBSH_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::new(ClientConfig::from_env()?)
    }

    fn from_interface(interface: Interface) -> Self {
        Self {
            images: Images::from_interface(interface.clone()),
            auto_image: AutoImage::from_interface(interface.clone()),
            reputation: Reputation::from_interface(interface.clone()),
            settings: Settings::from_interface(interface.clone()),
            interface,
        }
    }

    pub fn images(&self) -> &Images {
        &self.images
    }

    pub fn auto_image(&self) -> &AutoImage {
        &self.auto_image
    }

    pub fn reputation(&self) -> &Reputation {
        &self.reputation
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Advisories for the current user agent, including one set after
    /// construction.
    pub fn advisories(&self) -> Vec<Advisory> {
        self.interface.advisories()
    }

    pub fn token(&self) -> String {
        self.interface.config().read().token.clone()
    }

    pub fn user_agent(&self) -> Option<String> {
        self.interface.config().read().user_agent.clone()
    }

    pub fn api_url(&self) -> String {
        self.interface.config().read().api_url.clone()
    }

    pub fn set_token(&self, token: impl Into<String>) {
        self.interface.config().set_token(token);
    }

    pub fn set_user_agent(&self, user_agent: impl Into<String>) {
        self.interface.config().set_user_agent(Some(user_agent.into()));
    }

    pub fn set_api_url(&self, api_url: &str) {
        self.interface.config().set_api_url(api_url);
    }
}
