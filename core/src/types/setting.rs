//! Bot settings entities.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::api::Settings;
use crate::error::Result;
use crate::id::Identifiable;

/// Server-side settings record. Sub-settings carry `sub_type`/`sub_id`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SettingRecord {
    #[serde(rename = "type")]
    pub kind: String,
    pub id: String,
    #[serde(default)]
    pub sub_type: Option<String>,
    #[serde(default)]
    pub sub_id: Option<String>,
    #[serde(default)]
    pub data: Value,
    #[serde(default)]
    pub account_id: String,
}

/// A setting (or sub-setting) stored for a bot, holding arbitrary JSON.
#[derive(Clone)]
pub struct Setting {
    record: SettingRecord,
    client: Settings,
}

impl Setting {
    pub(crate) fn new(record: SettingRecord, client: Settings) -> Self {
        Self { record, client }
    }

    pub fn record(&self) -> &SettingRecord {
        &self.record
    }

    pub fn kind(&self) -> &str {
        &self.record.kind
    }

    /// Id of the top-level setting, also for sub-settings.
    pub fn parent_id(&self) -> &str {
        &self.record.id
    }

    pub fn sub_type(&self) -> Option<&str> {
        self.record.sub_type.as_deref()
    }

    pub fn is_subsetting(&self) -> bool {
        self.record.sub_type.is_some() && self.record.sub_id.is_some()
    }

    pub fn data(&self) -> &Value {
        &self.record.data
    }

    /// Replace the local data. Call `save` to store it.
    pub fn set_data(&mut self, data: Value) {
        self.record.data = data;
    }

    pub fn account_id(&self) -> &str {
        &self.record.account_id
    }

    pub fn save(&mut self) -> Result<()> {
        let r = &self.record;
        let saved = match (&r.sub_type, &r.sub_id) {
            (Some(sub_type), Some(sub_id)) => {
                self.client
                    .set_subsetting(&r.kind, &r.id, sub_type, sub_id.as_str(), &r.data)?
            }
            _ => self.client.set(&r.kind, r.id.as_str(), &r.data)?,
        };
        self.record = saved.record;
        Ok(())
    }

    /// Delete on the server; local state becomes the deleted record.
    pub fn delete(&mut self) -> Result<()> {
        let r = &self.record;
        let deleted = match (&r.sub_type, &r.sub_id) {
            (Some(sub_type), Some(sub_id)) => {
                self.client
                    .delete_subsetting(&r.kind, &r.id, sub_type, sub_id.as_str())?
            }
            _ => self.client.delete(&r.kind, r.id.as_str())?,
        };
        self.record = deleted.record;
        Ok(())
    }
}

impl Identifiable for Setting {
    fn id(&self) -> &str {
        self.record.sub_id.as_deref().unwrap_or(&self.record.id)
    }
}

impl Setting {
    /// Full address of the record. A sub-setting's `sub_id` alone can
    /// collide with an unrelated top-level id.
    fn key(&self) -> (&str, &str, Option<&str>, Option<&str>) {
        let r = &self.record;
        (&r.kind, &r.id, r.sub_type.as_deref(), r.sub_id.as_deref())
    }
}

impl PartialEq for Setting {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Setting {}

impl std::hash::Hash for Setting {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl fmt::Debug for Setting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Setting").field(&self.record).finish()
    }
}
