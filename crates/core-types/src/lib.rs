use std::fmt;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;
use uuid::Uuid;

/// Shared error type for the chatbridge crates.
#[derive(Debug, Error, Clone)]
pub enum BridgeError {
    #[error("{message}")]
    Message { message: String },
}

impl BridgeError {
    pub fn new(message: impl Into<String>) -> Self {
        Self::Message {
            message: message.into(),
        }
    }
}

/// Identifier for one dispatch invocation, carried through logs and reports.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct TriggerId(pub String);

impl TriggerId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for TriggerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TriggerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Named readiness capabilities the vendor bus signals.
///
/// `SdkLoaded` is internal (the bus handle exists) and has no vendor event.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Capability {
    SdkLoaded,
    MessengerReady,
    JourneyReady,
    LauncherReady,
}

impl Capability {
    pub const ALL: [Capability; 4] = [
        Capability::SdkLoaded,
        Capability::MessengerReady,
        Capability::JourneyReady,
        Capability::LauncherReady,
    ];

    /// Vendor event name backing this capability, if any.
    pub fn event_name(self) -> Option<&'static str> {
        match self {
            Capability::SdkLoaded => None,
            Capability::MessengerReady => Some("Messenger.ready"),
            Capability::JourneyReady => Some("Journey.ready"),
            Capability::LauncherReady => Some("Launcher.ready"),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Capability::SdkLoaded => "sdk-loaded",
            Capability::MessengerReady => "messenger-ready",
            Capability::JourneyReady => "journey-ready",
            Capability::LauncherReady => "launcher-ready",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What fired an action.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum TriggerSource {
    ContactButton { index: usize },
    FormAssistance,
    Manual,
    Debug,
}

impl TriggerSource {
    pub fn label(&self) -> String {
        match self {
            TriggerSource::ContactButton { index } => format!("contact-button-{}", index + 1),
            TriggerSource::FormAssistance => "form-assistance".to_string(),
            TriggerSource::Manual => "manual".to_string(),
            TriggerSource::Debug => "debug-test".to_string(),
        }
    }
}

/// Scalar value carried inside an [`ActionContext`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContextValue {
    Text(String),
    Number(f64),
    Flag(bool),
}

impl From<&str> for ContextValue {
    fn from(value: &str) -> Self {
        ContextValue::Text(value.to_string())
    }
}

impl From<String> for ContextValue {
    fn from(value: String) -> Self {
        ContextValue::Text(value)
    }
}

impl From<f64> for ContextValue {
    fn from(value: f64) -> Self {
        ContextValue::Number(value)
    }
}

impl From<i64> for ContextValue {
    fn from(value: i64) -> Self {
        ContextValue::Number(value as f64)
    }
}

impl From<usize> for ContextValue {
    fn from(value: usize) -> Self {
        ContextValue::Number(value as f64)
    }
}

impl From<bool> for ContextValue {
    fn from(value: bool) -> Self {
        ContextValue::Flag(value)
    }
}

/// Ordered key-value mapping describing why/where an action was triggered.
///
/// Insertion order is preserved all the way to the serialized payload.
/// Inserting an existing key replaces the value in place; merging lets the
/// incoming side win on conflicts.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ActionContext {
    entries: Vec<(String, ContextValue)>,
}

impl ActionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ContextValue>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<ContextValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&ContextValue> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Merge `other` into `self`; `other`'s keys win on conflict.
    pub fn merge(&mut self, other: &ActionContext) {
        for (key, value) in other.iter() {
            self.insert(key.clone(), value.clone());
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &(String, ContextValue)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for ActionContext {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl<K, V> FromIterator<(K, V)> for ActionContext
where
    K: Into<String>,
    V: Into<ContextValue>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut ctx = ActionContext::new();
        for (key, value) in iter {
            ctx.insert(key, value);
        }
        ctx
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_replaces_in_place() {
        let mut ctx = ActionContext::new();
        ctx.insert("trigger", "manual");
        ctx.insert("page", "/contact");
        ctx.insert("trigger", "contact-button-1");

        assert_eq!(ctx.len(), 2);
        let keys: Vec<&str> = ctx.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["trigger", "page"]);
        assert_eq!(
            ctx.get("trigger"),
            Some(&ContextValue::Text("contact-button-1".into()))
        );
    }

    #[test]
    fn merge_lets_caller_win() {
        let mut base = ActionContext::new()
            .with("currentPage", "/home")
            .with("trigger", "manual");
        let caller = ActionContext::new().with("trigger", "form-assistance");

        base.merge(&caller);
        assert_eq!(
            base.get("trigger"),
            Some(&ContextValue::Text("form-assistance".into()))
        );
        assert_eq!(base.len(), 2);
    }

    #[test]
    fn serializes_in_insertion_order() {
        let ctx = ActionContext::new()
            .with("b", "second")
            .with("a", true)
            .with("c", 3i64);
        let json = serde_json::to_string(&ctx).unwrap();
        assert_eq!(json, r#"{"b":"second","a":true,"c":3.0}"#);
    }

    #[test]
    fn capability_event_names() {
        assert_eq!(
            Capability::MessengerReady.event_name(),
            Some("Messenger.ready")
        );
        assert_eq!(Capability::SdkLoaded.event_name(), None);
    }

    #[test]
    fn trigger_source_labels() {
        assert_eq!(
            TriggerSource::ContactButton { index: 0 }.label(),
            "contact-button-1"
        );
        assert_eq!(TriggerSource::Manual.label(), "manual");
    }
}
