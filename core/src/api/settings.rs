//! Bot settings endpoints under `/settings`.
//!
//! Settings are free-form JSON documents keyed by a type and an id, e.g.
//! `guilds/300407204987666432`. Each may own sub-settings keyed by a
//! sub-type and sub-id.

use serde_json::Value;

use super::{Interface, Query};
use crate::config::ClientConfig;
use crate::error::Result;
use crate::http::{HttpMethod, HttpRequest};
use crate::id::IdRef;
use crate::types::{Setting, SettingRecord};

const BASE: &str = "settings";
const SUB: &str = "subsettings";

/// Client for bot settings (`/settings`).
#[derive(Debug, Clone)]
pub struct Settings {
    interface: Interface,
}

impl Settings {
    /// Standalone client; validates `config`.
    pub fn new(config: ClientConfig) -> Result<Self> {
        Ok(Self::from_interface(Interface::new(config, "Settings")?))
    }

    pub fn from_interface(interface: Interface) -> Self {
        Self { interface }
    }

    pub fn interface(&self) -> &Interface {
        &self.interface
    }

    pub fn get<'a>(&self, kind: &str, id: impl Into<IdRef<'a>>) -> Result<Setting> {
        let id = id.into();
        let request = self
            .interface
            .build_get(&[BASE, kind, id.as_str()], &Query::new())?;
        self.setting_from(request)
    }

    /// Create or replace a setting with `data`.
    pub fn set<'a>(&self, kind: &str, id: impl Into<IdRef<'a>>, data: &Value) -> Result<Setting> {
        let id = id.into();
        let request = self
            .interface
            .build_json(HttpMethod::Post, &[BASE, kind, id.as_str()], data)?;
        self.setting_from(request)
    }

    pub fn delete<'a>(&self, kind: &str, id: impl Into<IdRef<'a>>) -> Result<Setting> {
        let id = id.into();
        let request = self.interface.build_delete(&[BASE, kind, id.as_str()])?;
        self.setting_from(request)
    }

    /// All sub-settings of one sub-type below a setting.
    pub fn subsettings<'a>(
        &self,
        kind: &str,
        id: impl Into<IdRef<'a>>,
        sub_type: &str,
    ) -> Result<Vec<Setting>> {
        let id = id.into();
        let request = self
            .interface
            .build_get(&[BASE, kind, id.as_str(), SUB, sub_type], &Query::new())?;
        let records: Vec<SettingRecord> = self.interface.call(request)?.field("subsettings")?;
        Ok(records
            .into_iter()
            .map(|record| Setting::new(record, self.clone()))
            .collect())
    }

    pub fn subsetting<'a, 'b>(
        &self,
        kind: &str,
        id: impl Into<IdRef<'a>>,
        sub_type: &str,
        sub_id: impl Into<IdRef<'b>>,
    ) -> Result<Setting> {
        let (id, sub_id) = (id.into(), sub_id.into());
        let request = self.interface.build_get(
            &[BASE, kind, id.as_str(), SUB, sub_type, sub_id.as_str()],
            &Query::new(),
        )?;
        self.subsetting_from(request)
    }

    pub fn set_subsetting<'a, 'b>(
        &self,
        kind: &str,
        id: impl Into<IdRef<'a>>,
        sub_type: &str,
        sub_id: impl Into<IdRef<'b>>,
        data: &Value,
    ) -> Result<Setting> {
        let (id, sub_id) = (id.into(), sub_id.into());
        let request = self.interface.build_json(
            HttpMethod::Post,
            &[BASE, kind, id.as_str(), SUB, sub_type, sub_id.as_str()],
            data,
        )?;
        self.subsetting_from(request)
    }

    pub fn delete_subsetting<'a, 'b>(
        &self,
        kind: &str,
        id: impl Into<IdRef<'a>>,
        sub_type: &str,
        sub_id: impl Into<IdRef<'b>>,
    ) -> Result<Setting> {
        let (id, sub_id) = (id.into(), sub_id.into());
        let request = self.interface.build_delete(&[
            BASE,
            kind,
            id.as_str(),
            SUB,
            sub_type,
            sub_id.as_str(),
        ])?;
        self.subsetting_from(request)
    }

    fn setting_from(&self, request: HttpRequest) -> Result<Setting> {
        let record: SettingRecord = self.interface.call(request)?.field("setting")?;
        Ok(Setting::new(record, self.clone()))
    }

    fn subsetting_from(&self, request: HttpRequest) -> Result<Setting> {
        let record: SettingRecord = self.interface.call(request)?.field("subsetting")?;
        Ok(Setting::new(record, self.clone()))
    }
}
