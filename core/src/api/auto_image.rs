//! Auto-image generation endpoints under `/auto-image`.
//!
//! These endpoints answer with image bytes rather than JSON, so responses
//! are returned as `GeneratedImage` after status translation.

use serde::Serialize;
use serde_json::json;

use super::{Interface, Query};
use crate::config::ClientConfig;
use crate::error::Result;
use crate::http::{HttpMethod, HttpRequest};

const BASE: &str = "auto-image";

/// Raw image data produced by the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedImage {
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

/// Optional appearance parameters for `generate`.
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    pub face: Option<String>,
    pub hair: Option<String>,
}

/// Body of a license image request.
#[derive(Debug, Clone, Default, Serialize)]
pub struct License {
    pub title: String,
    pub avatar: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub badges: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub widgets: Vec<String>,
}

/// Client for image generation (`/auto-image`).
#[derive(Debug, Clone)]
pub struct AutoImage {
    interface: Interface,
}

impl AutoImage {
    /// Standalone client; validates `config`.
    pub fn new(config: ClientConfig) -> Result<Self> {
        Ok(Self::from_interface(Interface::new(config, "AutoImage")?))
    }

    pub fn from_interface(interface: Interface) -> Self {
        Self { interface }
    }

    pub fn interface(&self) -> &Interface {
        &self.interface
    }

    /// Discord status badge over `avatar`, e.g. status `online`.
    pub fn discord_status(&self, status: &str, avatar: &str) -> Result<GeneratedImage> {
        let q = Query::new().push("status", status).push("avatar", avatar);
        let request = self.interface.build_get(&[BASE, "discord-status"], &q)?;
        self.fetch(request)
    }

    /// Simple generated image of a `kind`, e.g. `awooo` or `eyes`.
    pub fn generate(&self, kind: &str, options: &GenerateOptions) -> Result<GeneratedImage> {
        let q = Query::new()
            .push("type", kind)
            .push_opt("face", options.face.as_deref())
            .push_opt("hair", options.hair.as_deref());
        let request = self.interface.build_get(&[BASE, "generate"], &q)?;
        self.fetch(request)
    }

    pub fn license(&self, license: &License) -> Result<GeneratedImage> {
        let request = self
            .interface
            .build_json(HttpMethod::Post, &[BASE, "license"], license)?;
        self.fetch(request)
    }

    pub fn waifu_insult(&self, avatar: &str) -> Result<GeneratedImage> {
        let body = json!({ "avatar": avatar });
        let request = self
            .interface
            .build_json(HttpMethod::Post, &[BASE, "waifu-insult"], &body)?;
        self.fetch(request)
    }

    /// Ship image of two avatars.
    pub fn love_ship(&self, target_one: &str, target_two: &str) -> Result<GeneratedImage> {
        let body = json!({ "targetOne": target_one, "targetTwo": target_two });
        let request = self
            .interface
            .build_json(HttpMethod::Post, &[BASE, "love-ship"], &body)?;
        self.fetch(request)
    }

    fn fetch(&self, request: HttpRequest) -> Result<GeneratedImage> {
        let response = self.interface.send(request)?;
        Ok(GeneratedImage {
            content_type: response.header("content-type").map(str::to_string),
            data: response.body,
        })
    }
}
