//! Reputation entities: users and the account-wide settings.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::{Party, Reputation};
use crate::error::Result;
use crate::id::{identity_by_id, Identifiable};

/// Server-side reputation record of one user of one bot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    #[serde(rename = "userId")]
    pub id: String,
    #[serde(rename = "botId")]
    pub bot: String,
    #[serde(default)]
    pub reputation: i64,
    #[serde(default)]
    pub account_id: String,
    /// When this user last gave reputation, oldest first.
    #[serde(default)]
    pub cooldown: Vec<DateTime<Utc>>,
    /// When this user last received reputation, oldest first.
    #[serde(default)]
    pub given_reputation: Vec<DateTime<Utc>>,
    #[serde(default)]
    pub available_reputations: Option<u32>,
    /// Milliseconds until each spent reputation becomes available again.
    #[serde(default)]
    pub next_available_reputations: Option<Vec<u64>>,
}

/// A user in the reputation system.
///
/// Every reputation operation replaces the whole record with the one the
/// server returns; nothing is computed locally.
#[derive(Clone)]
pub struct User {
    record: UserRecord,
    client: Reputation,
}

impl User {
    pub(crate) fn new(record: UserRecord, client: Reputation) -> Self {
        Self { record, client }
    }

    pub(crate) fn patch(&mut self, record: UserRecord) {
        self.record = record;
    }

    pub fn record(&self) -> &UserRecord {
        &self.record
    }

    pub fn bot(&self) -> &str {
        &self.record.bot
    }

    pub fn reputation(&self) -> i64 {
        self.record.reputation
    }

    pub fn account_id(&self) -> &str {
        &self.record.account_id
    }

    pub fn cooldown(&self) -> &[DateTime<Utc>] {
        &self.record.cooldown
    }

    pub fn given_reputation(&self) -> &[DateTime<Utc>] {
        &self.record.given_reputation
    }

    pub fn available_reputations(&self) -> Option<u32> {
        self.record.available_reputations
    }

    pub fn next_available_reputations(&self) -> Option<&[u64]> {
        self.record.next_available_reputations.as_deref()
    }

    /// Give one reputation point from this user to `target`.
    ///
    /// Both this user and, when passed as `&mut User`, the target are
    /// updated from the server's answer.
    pub fn give<'a>(&mut self, target: impl Into<Party<'a>>) -> Result<()> {
        let client = self.client.clone();
        let bot = self.record.bot.clone();
        client.give(&bot, &mut *self, target)?;
        Ok(())
    }

    /// Receive one reputation point from `source`.
    pub fn receive<'a>(&mut self, source: impl Into<Party<'a>>) -> Result<()> {
        let client = self.client.clone();
        let bot = self.record.bot.clone();
        client.give(&bot, source, &mut *self)?;
        Ok(())
    }

    pub fn increase(&mut self, amount: u32) -> Result<()> {
        let client = self.client.clone();
        let bot = self.record.bot.clone();
        client.increase(&bot, &mut *self, amount)?;
        Ok(())
    }

    pub fn decrease(&mut self, amount: u32) -> Result<()> {
        let client = self.client.clone();
        let bot = self.record.bot.clone();
        client.decrease(&bot, &mut *self, amount)?;
        Ok(())
    }

    /// Reset reputation to zero, optionally clearing cooldowns too.
    pub fn reset(&mut self, reset_cooldown: bool) -> Result<()> {
        let client = self.client.clone();
        let bot = self.record.bot.clone();
        client.reset(&bot, &mut *self, reset_cooldown)?;
        Ok(())
    }

    pub fn refresh(&mut self) -> Result<()> {
        let client = self.client.clone();
        let bot = self.record.bot.clone();
        client.user(&bot, &mut *self)?;
        Ok(())
    }
}

impl Identifiable for User {
    fn id(&self) -> &str {
        &self.record.id
    }
}

identity_by_id!(User);

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("id", &self.record.id)
            .field("bot", &self.record.bot)
            .field("reputation", &self.record.reputation)
            .finish()
    }
}

/// Account-wide reputation tunables.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SettingsRecord {
    /// Reputation a user may give per day.
    pub reputation_per_day: u32,
    pub maximum_reputation: u32,
    pub maximum_reputation_received_day: u32,
    /// Seconds between two gives by the same user.
    pub reputation_cooldown: u64,
    #[serde(default, skip_serializing)]
    pub account_id: String,
}

/// Reputation settings of the account, with save-back.
#[derive(Clone)]
pub struct ReputationSettings {
    record: SettingsRecord,
    client: Reputation,
}

impl ReputationSettings {
    pub(crate) fn new(record: SettingsRecord, client: Reputation) -> Self {
        Self { record, client }
    }

    pub fn record(&self) -> &SettingsRecord {
        &self.record
    }

    pub fn account_id(&self) -> &str {
        &self.record.account_id
    }

    pub fn reputation_per_day(&self) -> u32 {
        self.record.reputation_per_day
    }

    pub fn set_reputation_per_day(&mut self, value: u32) {
        self.record.reputation_per_day = value;
    }

    pub fn maximum_reputation(&self) -> u32 {
        self.record.maximum_reputation
    }

    pub fn set_maximum_reputation(&mut self, value: u32) {
        self.record.maximum_reputation = value;
    }

    pub fn maximum_reputation_received_day(&self) -> u32 {
        self.record.maximum_reputation_received_day
    }

    pub fn set_maximum_reputation_received_day(&mut self, value: u32) {
        self.record.maximum_reputation_received_day = value;
    }

    pub fn reputation_cooldown(&self) -> u64 {
        self.record.reputation_cooldown
    }

    pub fn set_reputation_cooldown(&mut self, seconds: u64) {
        self.record.reputation_cooldown = seconds;
    }

    /// Push the local values to the server and adopt what it stored.
    pub fn save(&mut self) -> Result<()> {
        let saved = self.client.set_settings(&self.record)?;
        self.record = saved.record;
        Ok(())
    }
}

impl Identifiable for ReputationSettings {
    fn id(&self) -> &str {
        &self.record.account_id
    }
}

identity_by_id!(ReputationSettings);

impl fmt::Debug for ReputationSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ReputationSettings").field(&self.record).finish()
    }
}
