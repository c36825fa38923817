//! Domain entities built from weeb.sh responses.
//!
//! # Design
//! Each entity pairs a serde `*Record` (the server's JSON shape) with a
//! handle to the endpoint module that produced it. Entities never talk to
//! the transport; their mutating methods call back into that module and
//! swap in the record from the response. Equality and hashing are by id.

mod image;
mod reputation;
mod setting;

pub use image::{Image, ImageRecord, PreviewImage, Tag};
pub use reputation::{ReputationSettings, SettingsRecord, User, UserRecord};
pub use setting::{Setting, SettingRecord};
