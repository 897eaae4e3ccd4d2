//! SMS list membership keyed by normalized phone number.
//!
//! Transactional messages are always allowed; only marketing and service
//! updates are opt-in. Every STOP and START is appended to the record's
//! history.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Normalize a US number to `+1XXXXXXXXXX`. Separators are ignored.
pub fn normalize_phone(raw: &str) -> Option<String> {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    match digits.len() {
        10 => Some(format!("+1{digits}")),
        11 if digits.starts_with('1') => Some(format!("+{digits}")),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SmsPreferences {
    pub transactional: bool,
    pub marketing: bool,
    pub service_updates: bool,
}

impl SmsPreferences {
    pub const OPTED_IN: Self = Self {
        transactional: true,
        marketing: true,
        service_updates: true,
    };

    pub const OPTED_OUT: Self = Self {
        transactional: true,
        marketing: false,
        service_updates: false,
    };

    fn opt_in(marketing: bool, service_updates: bool) -> Self {
        Self {
            transactional: true,
            marketing,
            service_updates,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptAction {
    Stop,
    Start,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OptEvent {
    pub action: OptAction,
    /// Unix seconds.
    pub timestamp: u64,
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SmsSubscription {
    pub phone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    pub preferences: SmsPreferences,
    pub subscribed_at: u64,
    pub last_updated: u64,
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consent_timestamp: Option<u64>,
    pub opt_out_history: Vec<OptEvent>,
}

/// Who is asking and through which channel.
#[derive(Debug, Clone, Default)]
pub struct Subscriber {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub source: Option<String>,
}

impl Subscriber {
    fn source_or(&self, default: &str) -> String {
        self.source.clone().unwrap_or_else(|| default.to_string())
    }

    fn record(&self, phone: &str, preferences: SmsPreferences, source: String, now: u64) -> SmsSubscription {
        SmsSubscription {
            phone: phone.to_string(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            preferences,
            subscribed_at: now,
            last_updated: now,
            source,
            consent_timestamp: None,
            opt_out_history: Vec::new(),
        }
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// In-memory SMS subscription registry.
#[derive(Debug, Default)]
pub struct SubscriptionStore {
    subscriptions: DashMap<String, SmsSubscription>,
}

impl SubscriptionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, phone: &str) -> Option<SmsSubscription> {
        self.subscriptions.get(phone).map(|s| s.value().clone())
    }

    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }

    /// Join the list. A returning number keeps its original signup time and
    /// gets a START in its history.
    pub fn subscribe(
        &self,
        phone: &str,
        who: &Subscriber,
        preferences: Option<SmsPreferences>,
    ) -> SmsSubscription {
        let now = unix_now();
        let source = who.source_or("api");
        let preferences = preferences
            .map(|p| SmsPreferences::opt_in(p.marketing, p.service_updates))
            .unwrap_or(SmsPreferences::OPTED_IN);

        let record = match self.subscriptions.entry(phone.to_string()) {
            Entry::Occupied(mut entry) => {
                let existing = entry.get_mut();
                existing.first_name = who.first_name.clone();
                existing.last_name = who.last_name.clone();
                existing.preferences = preferences;
                existing.last_updated = now;
                existing.source = source.clone();
                existing.consent_timestamp = Some(now);
                existing.opt_out_history.push(OptEvent {
                    action: OptAction::Start,
                    timestamp: now,
                    source,
                });
                existing.clone()
            }
            Entry::Vacant(entry) => {
                let mut record = who.record(phone, preferences, source, now);
                record.consent_timestamp = Some(now);
                entry.insert(record).value().clone()
            }
        };

        tracing::info!(source = %record.source, "SMS subscription created or updated");
        record
    }

    /// STOP: drop marketing and service updates, keep transactional. Numbers
    /// never seen before get a record so the opt-out is remembered.
    pub fn unsubscribe(&self, phone: &str, who: &Subscriber) -> SmsSubscription {
        let now = unix_now();
        let source = who.source_or("stop_request");

        let mut entry = self
            .subscriptions
            .entry(phone.to_string())
            .or_insert_with(|| who.record(phone, SmsPreferences::OPTED_OUT, source.clone(), now));
        let record = entry.value_mut();
        record.preferences = SmsPreferences::OPTED_OUT;
        record.last_updated = now;
        record.opt_out_history.push(OptEvent {
            action: OptAction::Stop,
            timestamp: now,
            source,
        });

        tracing::info!("SMS number unsubscribed from marketing");
        record.clone()
    }

    /// START: re-enable marketing and service updates with fresh consent.
    pub fn resubscribe(&self, phone: &str, who: &Subscriber) -> SmsSubscription {
        let now = unix_now();
        let source = who.source_or("start_request");

        let mut entry = self
            .subscriptions
            .entry(phone.to_string())
            .or_insert_with(|| who.record(phone, SmsPreferences::OPTED_IN, source.clone(), now));
        let record = entry.value_mut();
        record.preferences = SmsPreferences::OPTED_IN;
        record.last_updated = now;
        record.consent_timestamp = Some(now);
        record.opt_out_history.push(OptEvent {
            action: OptAction::Start,
            timestamp: now,
            source,
        });

        tracing::info!("SMS number resubscribed");
        record.clone()
    }

    /// Set marketing and service-update flags. A marketing flip is logged in
    /// the history as START or STOP.
    pub fn update_preferences(
        &self,
        phone: &str,
        who: &Subscriber,
        marketing: bool,
        service_updates: bool,
    ) -> SmsSubscription {
        let now = unix_now();
        let source = who.source_or("preferences_update");
        let preferences = SmsPreferences::opt_in(marketing, service_updates);

        let record = match self.subscriptions.entry(phone.to_string()) {
            Entry::Occupied(mut entry) => {
                let existing = entry.get_mut();
                let was_marketing = existing.preferences.marketing;
                existing.preferences = preferences;
                existing.last_updated = now;

                if marketing != was_marketing {
                    if marketing {
                        existing.consent_timestamp = Some(now);
                    }
                    existing.opt_out_history.push(OptEvent {
                        action: if marketing { OptAction::Start } else { OptAction::Stop },
                        timestamp: now,
                        source,
                    });
                }
                if who.first_name.is_some() {
                    existing.first_name = who.first_name.clone();
                }
                if who.last_name.is_some() {
                    existing.last_name = who.last_name.clone();
                }
                existing.clone()
            }
            Entry::Vacant(entry) => {
                let mut record = who.record(phone, preferences, source, now);
                record.consent_timestamp = marketing.then_some(now);
                entry.insert(record).value().clone()
            }
        };

        tracing::info!(marketing, service_updates, "SMS preferences updated");
        record
    }
}
