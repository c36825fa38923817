//! Image catalog entities.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::api::Images;
use crate::error::Result;
use crate::id::{identity_by_id, IdRef, Identifiable};

/// Lightweight image listing entry, as returned by `types` with previews.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewImage {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub file_type: String,
    pub url: String,
}

impl Identifiable for PreviewImage {
    fn id(&self) -> &str {
        &self.id
    }
}

identity_by_id!(PreviewImage);

/// A tag attached to an image. Tags are identified by name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
    #[serde(default)]
    pub hidden: bool,
    /// Account id of the tag's creator.
    #[serde(default, alias = "user")]
    pub account: String,
}

impl Identifiable for Tag {
    fn id(&self) -> &str {
        &self.name
    }
}

identity_by_id!(Tag);

/// Server-side image record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageRecord {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub file_type: String,
    #[serde(default)]
    pub mime_type: String,
    pub url: String,
    #[serde(default)]
    pub nsfw: bool,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub source: Option<String>,
    /// Account id of the uploader.
    #[serde(default)]
    pub account: String,
    #[serde(default)]
    pub tags: Vec<Tag>,
}

/// An image in the catalog, bound to the `Images` module that fetched it.
///
/// Mutating methods go through that module and replace the local state with
/// the record the server sends back.
#[derive(Clone)]
pub struct Image {
    record: ImageRecord,
    client: Images,
}

impl Image {
    pub(crate) fn new(record: ImageRecord, client: Images) -> Self {
        Self { record, client }
    }

    pub fn record(&self) -> &ImageRecord {
        &self.record
    }

    pub fn into_record(self) -> ImageRecord {
        self.record
    }

    pub fn kind(&self) -> &str {
        &self.record.kind
    }

    pub fn file_type(&self) -> &str {
        &self.record.file_type
    }

    pub fn mime_type(&self) -> &str {
        &self.record.mime_type
    }

    pub fn url(&self) -> &str {
        &self.record.url
    }

    pub fn is_nsfw(&self) -> bool {
        self.record.nsfw
    }

    pub fn is_hidden(&self) -> bool {
        self.record.hidden
    }

    pub fn source(&self) -> Option<&str> {
        self.record.source.as_deref()
    }

    /// Account id of the uploader.
    pub fn account(&self) -> &str {
        &self.record.account
    }

    pub fn tags(&self) -> &[Tag] {
        &self.record.tags
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.record.tags.iter().any(|t| t == tag)
    }

    pub fn add_tags<'a, I, T>(&mut self, tags: I) -> Result<()>
    where
        I: IntoIterator<Item = T>,
        T: Into<IdRef<'a>>,
    {
        let updated = self.client.add_tags(&*self, tags)?;
        self.record = updated.record;
        Ok(())
    }

    pub fn remove_tags<'a, I, T>(&mut self, tags: I) -> Result<()>
    where
        I: IntoIterator<Item = T>,
        T: Into<IdRef<'a>>,
    {
        let updated = self.client.remove_tags(&*self, tags)?;
        self.record = updated.record;
        Ok(())
    }

    pub fn add_tag<'a>(&mut self, tag: impl Into<IdRef<'a>>) -> Result<()> {
        self.add_tags([tag])
    }

    pub fn remove_tag<'a>(&mut self, tag: impl Into<IdRef<'a>>) -> Result<()> {
        self.remove_tags([tag])
    }

    /// Delete the image on the server. Local state becomes the record the
    /// server reported as deleted.
    pub fn delete(&mut self) -> Result<()> {
        let deleted = self.client.delete_image(&*self)?;
        self.record = deleted.record;
        Ok(())
    }

    /// Re-fetch the record from the server.
    pub fn refresh(&mut self) -> Result<()> {
        let fresh = self.client.image(&*self)?;
        self.record = fresh.record;
        Ok(())
    }
}

impl Identifiable for Image {
    fn id(&self) -> &str {
        &self.record.id
    }
}

identity_by_id!(Image);

impl fmt::Debug for Image {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Image")
            .field("id", &self.record.id)
            .field("type", &self.record.kind)
            .field("url", &self.record.url)
            .field("nsfw", &self.record.nsfw)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn tag_accepts_user_as_creator() {
        let tag: Tag = serde_json::from_value(json!({"name": "cute", "hidden": false, "user": "42"})).unwrap();
        assert_eq!(tag.account, "42");
        assert!(tag == "cute");
    }

    #[test]
    fn preview_equality_is_by_id() {
        let a: PreviewImage =
            serde_json::from_value(json!({"id": "x1", "type": "hug", "fileType": "gif", "url": "u1"})).unwrap();
        let b: PreviewImage =
            serde_json::from_value(json!({"id": "x1", "type": "pat", "fileType": "png", "url": "u2"})).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn image_record_defaults_optional_fields() {
        let record: ImageRecord = serde_json::from_value(json!({
            "id": "rJk2",
            "type": "hug",
            "baseType": "hug",
            "url": "https://cdn.weeb.sh/images/rJk2.gif"
        }))
        .unwrap();
        assert!(!record.nsfw);
        assert!(record.tags.is_empty());
        assert_eq!(record.source, None);
    }
}
