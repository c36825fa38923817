//! Reputation endpoints under `/reputation`.

use std::borrow::Cow;

use serde_json::json;

use super::{Interface, Query};
use crate::config::ClientConfig;
use crate::error::{ApiError, Result};
use crate::http::{HttpMethod, HttpRequest};
use crate::id::{IdRef, Identifiable};
use crate::types::{ReputationSettings, SettingsRecord, User, UserRecord};

const BASE: &str = "reputation";

/// A user taking part in a reputation operation.
///
/// Passing `&mut User` lets the operation write the server's answer back
/// into that object. A bare id has no local object; its update is dropped.
pub enum Party<'a> {
    Id(Cow<'a, str>),
    User(&'a mut User),
}

impl Party<'_> {
    pub fn id(&self) -> &str {
        match self {
            Party::Id(id) => id,
            Party::User(user) => user.id(),
        }
    }

    fn patch(&mut self, record: &UserRecord) {
        if let Party::User(user) = self {
            user.patch(record.clone());
        }
    }
}

impl<'a> From<&'a str> for Party<'a> {
    fn from(id: &'a str) -> Self {
        Party::Id(Cow::Borrowed(id))
    }
}

impl<'a> From<&'a String> for Party<'a> {
    fn from(id: &'a String) -> Self {
        Party::Id(Cow::Borrowed(id))
    }
}

impl From<String> for Party<'static> {
    fn from(id: String) -> Self {
        Party::Id(Cow::Owned(id))
    }
}

impl<'a> From<&'a User> for Party<'a> {
    fn from(user: &'a User) -> Self {
        Party::Id(Cow::Borrowed(user.id()))
    }
}

impl<'a> From<&'a mut User> for Party<'a> {
    fn from(user: &'a mut User) -> Self {
        Party::User(user)
    }
}

/// Fresh state of both sides of a reputation give.
#[derive(Debug, Clone)]
pub struct Transfer {
    pub source: User,
    pub target: User,
}

/// Client for the reputation system (`/reputation`).
#[derive(Debug, Clone)]
pub struct Reputation {
    interface: Interface,
}

impl Reputation {
    /// Standalone client; validates `config`.
    pub fn new(config: ClientConfig) -> Result<Self> {
        Ok(Self::from_interface(Interface::new(config, "Reputation")?))
    }

    pub fn from_interface(interface: Interface) -> Self {
        Self { interface }
    }

    pub fn interface(&self) -> &Interface {
        &self.interface
    }

    /// Scope subsequent lookups to one bot.
    pub fn bot(&self, bot: impl Into<String>) -> ReputationBot {
        ReputationBot {
            id: bot.into(),
            client: self.clone(),
        }
    }

    /// Fetch a user. A `&mut User` argument is refreshed in place as well.
    pub fn user<'a, 'b>(&self, bot: impl Into<IdRef<'a>>, user: impl Into<Party<'b>>) -> Result<User> {
        let bot = bot.into();
        let mut user = user.into();
        let request = self
            .interface
            .build_get(&[BASE, bot.as_str(), user.id()], &Query::new())?;
        self.sync_user(request, &mut user)
    }

    /// `source` gives one reputation point to `target`.
    ///
    /// Each side passed as `&mut User` is updated from the response.
    pub fn give<'a, 'b, 'c>(
        &self,
        bot: impl Into<IdRef<'a>>,
        source: impl Into<Party<'b>>,
        target: impl Into<Party<'c>>,
    ) -> Result<Transfer> {
        let bot = bot.into();
        let mut source = source.into();
        let mut target = target.into();
        let body = json!({ "source_user": source.id() });
        let request = self
            .interface
            .build_json(HttpMethod::Post, &[BASE, bot.as_str(), target.id()], &body)?;
        let payload = self.interface.call(request)?.into_json()?;

        let source_record: UserRecord = user_record(&payload, "sourceUser")?;
        let target_record: UserRecord = user_record(&payload, "targetUser")?;
        source.patch(&source_record);
        target.patch(&target_record);
        Ok(Transfer {
            source: User::new(source_record, self.clone()),
            target: User::new(target_record, self.clone()),
        })
    }

    /// Reset a user's reputation, and their cooldowns if `reset_cooldown`.
    pub fn reset<'a, 'b>(
        &self,
        bot: impl Into<IdRef<'a>>,
        user: impl Into<Party<'b>>,
        reset_cooldown: bool,
    ) -> Result<User> {
        self.post_user(bot.into(), user.into(), "reset", json!({ "cooldown": reset_cooldown }))
    }

    pub fn increase<'a, 'b>(
        &self,
        bot: impl Into<IdRef<'a>>,
        user: impl Into<Party<'b>>,
        amount: u32,
    ) -> Result<User> {
        self.post_user(bot.into(), user.into(), "increase", json!({ "increase": amount }))
    }

    pub fn decrease<'a, 'b>(
        &self,
        bot: impl Into<IdRef<'a>>,
        user: impl Into<Party<'b>>,
        amount: u32,
    ) -> Result<User> {
        self.post_user(bot.into(), user.into(), "decrease", json!({ "decrease": amount }))
    }

    pub fn settings(&self) -> Result<ReputationSettings> {
        let request = self.interface.build_get(&[BASE, "settings"], &Query::new())?;
        let record: SettingsRecord = self.interface.call(request)?.field("settings")?;
        Ok(ReputationSettings::new(record, self.clone()))
    }

    pub fn set_settings(&self, settings: &SettingsRecord) -> Result<ReputationSettings> {
        let request = self
            .interface
            .build_json(HttpMethod::Post, &[BASE, "settings"], settings)?;
        let record: SettingsRecord = self.interface.call(request)?.field("settings")?;
        Ok(ReputationSettings::new(record, self.clone()))
    }

    fn post_user(
        &self,
        bot: IdRef<'_>,
        mut user: Party<'_>,
        action: &str,
        body: serde_json::Value,
    ) -> Result<User> {
        let request = self.interface.build_json(
            HttpMethod::Post,
            &[BASE, bot.as_str(), user.id(), action],
            &body,
        )?;
        self.sync_user(request, &mut user)
    }

    fn sync_user(&self, request: HttpRequest, user: &mut Party<'_>) -> Result<User> {
        let record: UserRecord = self.interface.call(request)?.field("user")?;
        user.patch(&record);
        Ok(User::new(record, self.clone()))
    }
}

fn user_record(payload: &serde_json::Value, key: &str) -> Result<UserRecord> {
    let value = payload
        .get(key)
        .cloned()
        .ok_or_else(|| ApiError::Deserialization(format!("missing field `{key}`")))?;
    serde_json::from_value(value).map_err(ApiError::deserialization)
}

/// Reputation client bound to one bot id.
#[derive(Debug, Clone)]
pub struct ReputationBot {
    id: String,
    client: Reputation,
}

impl ReputationBot {
    pub fn user<'a>(&self, user: impl Into<Party<'a>>) -> Result<User> {
        self.client.user(self.id.as_str(), user)
    }

    pub fn give<'a, 'b>(&self, source: impl Into<Party<'a>>, target: impl Into<Party<'b>>) -> Result<Transfer> {
        self.client.give(self.id.as_str(), source, target)
    }
}

impl Identifiable for ReputationBot {
    fn id(&self) -> &str {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::Value;

    use super::*;
    use crate::testing::FakeTransport;

    fn reputation(fake: &Arc<FakeTransport>) -> Reputation {
        let config = ClientConfig::new("Wolke token").with_user_agent("tests/0.1.0");
        Reputation::from_interface(Interface::with_transport(config, fake.clone(), "test").unwrap())
    }

    fn user_json(id: &str, reputation: i64) -> Value {
        json!({
            "userId": id,
            "botId": "bot1",
            "reputation": reputation,
            "accountId": "acc",
            "cooldown": [],
            "givenReputation": [],
            "availableReputations": 2
        })
    }

    #[test]
    fn user_fetches_by_bot_and_id() {
        let fake = FakeTransport::shared();
        fake.respond_json(200, json!({"status": 200, "user": user_json("u1", 4)}));

        let user = reputation(&fake).user("bot1", "u1").unwrap();
        assert_eq!(fake.last_request().path, "https://api.weeb.sh/reputation/bot1/u1");
        assert_eq!(user.reputation(), 4);
        assert!(user == "u1");
    }

    #[test]
    fn give_updates_both_users() {
        let fake = FakeTransport::shared();
        fake.respond_json(200, json!({"status": 200, "user": user_json("alice", 0)}));
        fake.respond_json(200, json!({"status": 200, "user": user_json("bob", 0)}));
        let mut source_after = user_json("alice", 0);
        source_after["availableReputations"] = json!(1);
        fake.respond_json(
            200,
            json!({"status": 200, "sourceUser": source_after, "targetUser": user_json("bob", 1)}),
        );

        let client = reputation(&fake);
        let mut alice = client.user("bot1", "alice").unwrap();
        let mut bob = client.user("bot1", "bob").unwrap();

        alice.give(&mut bob).unwrap();

        let req = fake.last_request();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.path, "https://api.weeb.sh/reputation/bot1/bob");
        assert_eq!(req.json_body().unwrap(), json!({"source_user": "alice"}));
        assert_eq!(alice.available_reputations(), Some(1));
        assert_eq!(bob.reputation(), 1);
    }

    #[test]
    fn give_to_bare_id_only_updates_source() {
        let fake = FakeTransport::shared();
        fake.respond_json(
            200,
            json!({"status": 200, "sourceUser": user_json("alice", 7), "targetUser": user_json("bob", 1)}),
        );

        let transfer = reputation(&fake).bot("bot1").give("alice", "bob").unwrap();
        assert_eq!(transfer.source.reputation(), 7);
        assert_eq!(transfer.target.reputation(), 1);
    }

    #[test]
    fn receive_sends_counterpart_as_source() {
        let fake = FakeTransport::shared();
        fake.respond_json(200, json!({"status": 200, "user": user_json("bob", 0)}));
        fake.respond_json(
            200,
            json!({"status": 200, "sourceUser": user_json("alice", 0), "targetUser": user_json("bob", 1)}),
        );

        let client = reputation(&fake);
        let mut bob = client.user("bot1", "bob").unwrap();
        bob.receive("alice").unwrap();

        let req = fake.last_request();
        assert_eq!(req.path, "https://api.weeb.sh/reputation/bot1/bob");
        assert_eq!(req.json_body().unwrap()["source_user"], "alice");
        assert_eq!(bob.reputation(), 1);
    }

    #[test]
    fn increase_decrease_reset_resync_user() {
        let fake = FakeTransport::shared();
        fake.respond_json(200, json!({"status": 200, "user": user_json("u1", 0)}));
        fake.respond_json(200, json!({"status": 200, "user": user_json("u1", 5)}));
        fake.respond_json(200, json!({"status": 200, "user": user_json("u1", 3)}));
        fake.respond_json(200, json!({"status": 200, "user": user_json("u1", 0)}));

        let client = reputation(&fake);
        let mut user = client.user("bot1", "u1").unwrap();

        user.increase(5).unwrap();
        assert_eq!(user.reputation(), 5);
        assert_eq!(fake.last_request().json_body().unwrap(), json!({"increase": 5}));

        user.decrease(2).unwrap();
        assert_eq!(user.reputation(), 3);
        assert!(fake.last_request().path.ends_with("/reputation/bot1/u1/decrease"));

        user.reset(true).unwrap();
        assert_eq!(user.reputation(), 0);
        let req = fake.last_request();
        assert!(req.path.ends_with("/reputation/bot1/u1/reset"));
        assert_eq!(req.json_body().unwrap(), json!({"cooldown": true}));
    }

    #[test]
    fn settings_round_trip_through_save() {
        let fake = FakeTransport::shared();
        let settings = json!({
            "reputationPerDay": 2,
            "maximumReputation": 0,
            "maximumReputationReceivedDay": 0,
            "reputationCooldown": 86400,
            "accountId": "acc"
        });
        fake.respond_json(200, json!({"status": 200, "settings": settings}));
        let mut saved = settings.clone();
        saved["reputationPerDay"] = json!(5);
        fake.respond_json(200, json!({"status": 200, "settings": saved}));

        let mut settings = reputation(&fake).settings().unwrap();
        assert_eq!(settings.account_id(), "acc");
        settings.set_reputation_per_day(5);
        settings.save().unwrap();

        let req = fake.last_request();
        assert_eq!(req.path, "https://api.weeb.sh/reputation/settings");
        assert_eq!(req.json_body().unwrap()["reputationPerDay"], 5);
        assert_eq!(settings.reputation_per_day(), 5);
    }

    #[test]
    fn missing_sub_object_is_a_deserialization_error() {
        let fake = FakeTransport::shared();
        fake.respond_json(200, json!({"status": 200}));

        let err = reputation(&fake).give("bot1", "a", "b").unwrap_err();
        assert!(matches!(err, ApiError::Deserialization(_)));
    }
}
