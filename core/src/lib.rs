//! Synchronous client for the weeb.sh image and reputation API.
//!
//! # Overview
//! `Client` bundles one client per resource group: the image catalog
//! (`/images`), image generation (`/auto-image`), reputation
//! (`/reputation`) and bot settings (`/settings`). Each call is a single
//! blocking round trip whose JSON answer is turned into an entity such as
//! `Image` or `User`.
//!
//! # Design
//! - Requests and responses are plain data (`HttpRequest`/`HttpResponse`);
//!   the network sits behind the `Transport` trait, `ureq` by default.
//! - Status codes and server messages are translated into `ApiError` in one
//!   place (`response::translate`); unknown failures stay untranslated.
//! - Configuration lives in one shared handle, so credential changes made
//!   on `Client` reach every module and entity.
//! - Entities compare by id and call back into their module to mutate.
//! - Logging goes through `tracing`; the crate never installs a subscriber.

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod id;
pub mod multipart;
pub mod response;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use api::{
    AutoImage, GenerateOptions, GeneratedImage, ImageQuery, ImageTypes, Images, Interface, License,
    ListQuery, Nsfw, Party, Reputation, ReputationBot, Settings, Transfer, TypesQuery, Upload,
    UploadOptions,
};
pub use client::Client;
pub use config::{Advisory, ClientConfig, SharedConfig, UserAgent, DEFAULT_API_URL};
pub use error::{ApiError, FileAccessReason, Result};
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport, UreqTransport};
pub use id::{IdRef, Identifiable};
pub use response::Payload;
pub use types::{
    Image, ImageRecord, PreviewImage, ReputationSettings, Setting, SettingRecord, SettingsRecord,
    Tag, User, UserRecord,
};
