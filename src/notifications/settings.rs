//! Runtime notification switches.
//!
//! Seeded from the `[notifications]` config section and changed at runtime
//! through the admin API. Runtime changes survive config reloads and are lost
//! on restart.

use arc_swap::ArcSwap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

use crate::config::NotificationConfig;
use crate::notifications::client::Channel;

/// Keys accepted by [`SettingsStore::update`].
pub const SETTING_KEYS: [&str; 4] = [
    "emailNotifications",
    "smsNotifications",
    "marketingEmails",
    "marketingSms",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelSwitches {
    pub email_notifications: bool,
    pub sms_notifications: bool,
    pub marketing_emails: bool,
    pub marketing_sms: bool,
}

impl ChannelSwitches {
    pub fn from_config(config: &NotificationConfig) -> Self {
        Self {
            email_notifications: config.email_enabled,
            sms_notifications: config.sms_enabled,
            marketing_emails: config.marketing_emails_enabled,
            marketing_sms: config.marketing_sms_enabled,
        }
    }

    fn slot(&mut self, key: &str) -> Option<&mut bool> {
        match key {
            "emailNotifications" => Some(&mut self.email_notifications),
            "smsNotifications" => Some(&mut self.sms_notifications),
            "marketingEmails" => Some(&mut self.marketing_emails),
            "marketingSms" => Some(&mut self.marketing_sms),
            _ => None,
        }
    }

    fn get(mut self, key: &str) -> Option<bool> {
        self.slot(key).map(|value| *value)
    }
}

/// Current switches plus who changed them last.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationSettings {
    #[serde(flatten)]
    pub switches: ChannelSwitches,
    /// Unix seconds.
    pub last_updated: u64,
    pub updated_by: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SettingChange {
    pub from: bool,
    pub to: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettingsError {
    #[error("Settings update must be a JSON object")]
    NotAnObject,

    #[error("Invalid settings keys: {}", .0.join(", "))]
    InvalidKeys(Vec<String>),

    #[error("Setting '{0}' must be a boolean value")]
    NotBoolean(String),
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Lock-free holder of the live [`NotificationSettings`].
#[derive(Debug)]
pub struct SettingsStore {
    current: ArcSwap<NotificationSettings>,
}

impl SettingsStore {
    pub fn new(initial: ChannelSwitches) -> Self {
        Self {
            current: ArcSwap::from_pointee(NotificationSettings {
                switches: initial,
                last_updated: unix_now(),
                updated_by: "system".to_string(),
            }),
        }
    }

    pub fn from_config(config: &NotificationConfig) -> Self {
        Self::new(ChannelSwitches::from_config(config))
    }

    pub fn snapshot(&self) -> Arc<NotificationSettings> {
        self.current.load_full()
    }

    pub fn is_enabled(&self, channel: Channel) -> bool {
        let switches = self.current.load().switches;
        match channel {
            Channel::Email => switches.email_notifications,
            Channel::Sms => switches.sms_notifications,
        }
    }

    pub fn marketing_sms_enabled(&self) -> bool {
        self.current.load().switches.marketing_sms
    }

    /// Apply a partial update such as `{"smsNotifications": false}`.
    ///
    /// Rejects the whole update if any key is unknown or any value is not a
    /// boolean. Returns the new settings and the switches that flipped.
    pub fn update(
        &self,
        patch: &Value,
        updated_by: &str,
    ) -> Result<(NotificationSettings, BTreeMap<String, SettingChange>), SettingsError> {
        let patch = patch.as_object().ok_or(SettingsError::NotAnObject)?;
        let values = validate(patch)?;

        let mut applied = None;
        let previous = self.current.rcu(|prev| {
            let mut next = NotificationSettings::clone(prev);
            for (key, value) in &values {
                if let Some(slot) = next.switches.slot(key) {
                    *slot = *value;
                }
            }
            next.last_updated = unix_now();
            next.updated_by = updated_by.to_string();
            applied = Some(next.clone());
            next
        });
        let current = applied.unwrap_or_else(|| NotificationSettings::clone(&previous));

        let changes: BTreeMap<String, SettingChange> = SETTING_KEYS
            .iter()
            .filter_map(|key| {
                let from = previous.switches.get(key)?;
                let to = current.switches.get(key)?;
                (from != to).then(|| (key.to_string(), SettingChange { from, to }))
            })
            .collect();

        tracing::info!(
            updated_by,
            changed = changes.len(),
            email = current.switches.email_notifications,
            sms = current.switches.sms_notifications,
            marketing_emails = current.switches.marketing_emails,
            marketing_sms = current.switches.marketing_sms,
            "Notification settings updated"
        );
        Ok((current, changes))
    }
}

fn validate(patch: &Map<String, Value>) -> Result<Vec<(String, bool)>, SettingsError> {
    let invalid: Vec<String> = patch
        .keys()
        .filter(|key| !SETTING_KEYS.contains(&key.as_str()))
        .cloned()
        .collect();
    if !invalid.is_empty() {
        return Err(SettingsError::InvalidKeys(invalid));
    }

    patch
        .iter()
        .map(|(key, value)| match value {
            Value::Bool(b) => Ok((key.clone(), *b)),
            _ => Err(SettingsError::NotBoolean(key.clone())),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn store() -> SettingsStore {
        SettingsStore::from_config(&NotificationConfig::default())
    }

    #[test]
    fn seeded_from_config() {
        let store = store();
        let settings = store.snapshot();
        assert!(settings.switches.email_notifications);
        assert!(settings.switches.sms_notifications);
        assert!(!settings.switches.marketing_sms);
        assert_eq!(settings.updated_by, "system");
        assert!(store.is_enabled(Channel::Sms));
    }

    #[test]
    fn partial_update_reports_only_flipped_switches() {
        let store = store();
        let (settings, changes) = store
            .update(&json!({ "smsNotifications": false, "emailNotifications": true }), "admin")
            .unwrap();

        assert!(!settings.switches.sms_notifications);
        assert!(settings.switches.email_notifications);
        assert_eq!(settings.updated_by, "admin");
        assert_eq!(changes.len(), 1);
        assert_eq!(changes["smsNotifications"], SettingChange { from: true, to: false });

        assert!(!store.is_enabled(Channel::Sms));
        assert!(store.is_enabled(Channel::Email));
    }

    #[test]
    fn unknown_keys_reject_the_whole_update() {
        let store = store();
        let err = store
            .update(&json!({ "smsNotifications": false, "pushNotifications": true }), "admin")
            .unwrap_err();

        assert_eq!(err, SettingsError::InvalidKeys(vec!["pushNotifications".into()]));
        assert_eq!(err.to_string(), "Invalid settings keys: pushNotifications");
        assert!(store.is_enabled(Channel::Sms));
    }

    #[test]
    fn non_boolean_values_are_rejected() {
        let store = store();
        let err = store.update(&json!({ "marketingSms": "yes" }), "admin").unwrap_err();
        assert_eq!(err.to_string(), "Setting 'marketingSms' must be a boolean value");
        assert!(!store.marketing_sms_enabled());

        let err = store.update(&json!(["marketingSms"]), "admin").unwrap_err();
        assert_eq!(err, SettingsError::NotAnObject);
    }

    #[test]
    fn settings_serialize_flat_in_camel_case() {
        let value = serde_json::to_value(&*store().snapshot()).unwrap();
        assert_eq!(value["smsNotifications"], true);
        assert_eq!(value["marketingEmails"], false);
        assert_eq!(value["updatedBy"], "system");
        assert!(value["lastUpdated"].is_u64());
    }
}
