//! The persisted settings record.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::common::types::{ChannelRef, UserId};

/// Process-wide relay settings.
///
/// Every field has a serde default so records written by older versions
/// (or edited by hand) with missing keys still load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub owner_id: UserId,
    #[serde(default)]
    pub admins: Vec<UserId>,
    #[serde(default, deserialize_with = "lenient_sources")]
    pub source_channels: Vec<ChannelRef>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub destination_channel: Option<ChannelRef>,
    #[serde(default)]
    pub working: bool,
}

impl Settings {
    /// A fresh record: no sources, no destination, stopped, owner as sole admin.
    pub fn new(owner_id: UserId) -> Self {
        Self {
            owner_id,
            admins: vec![owner_id],
            source_channels: Vec::new(),
            destination_channel: None,
            working: false,
        }
    }

    /// Whether a post from any of `origin` forms is watched.
    pub fn is_source(&self, origin: &[ChannelRef]) -> bool {
        origin.iter().any(|c| self.source_channels.contains(c))
    }

    /// Human-readable snapshot for the `list` command.
    pub fn describe(&self) -> String {
        let admins = self
            .admins
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        let sources = if self.source_channels.is_empty() {
            "None".to_string()
        } else {
            self.source_channels
                .iter()
                .map(|c| c.to_string())
                .collect::<Vec<_>>()
                .join("\n")
        };
        let destination = self
            .destination_channel
            .as_ref()
            .map(|c| c.to_string())
            .unwrap_or_else(|| "Not set".to_string());

        format!(
            "📋 Current Configuration:\n\n\
             👑 Owner (User ID): {}\n\
             👥 Admins (User IDs): {}\n\
             🟢 Working Status: {}\n\
             📂 Source Channels:\n{}\n\n\
             📢 Destination Channel:\n{}",
            self.owner_id,
            admins,
            if self.working { "ON" } else { "OFF" },
            sources,
            destination
        )
    }
}

/// Read one stored channel entry, or `None` if it cannot be used.
///
/// Older records hold whatever was typed after the command, so an entry such
/// as `"@https://t.me/foo"` is dropped with a warning instead of failing the
/// whole record.
fn stored_channel(value: &Value) -> Option<ChannelRef> {
    let parsed = match value {
        Value::String(raw) => ChannelRef::parse(raw).map_err(|e| e.to_string()),
        Value::Number(n) => n
            .as_i64()
            .map(ChannelRef::Id)
            .ok_or_else(|| format!("{} is not a channel id", n)),
        other => Err(format!("unexpected value {}", other)),
    };
    match parsed {
        Ok(channel) => Some(channel),
        Err(e) => {
            warn!("Dropping unusable stored channel {}: {}", value, e);
            None
        }
    }
}

/// Keep every usable source once, in first-seen order.
fn lenient_sources<'de, D>(deserializer: D) -> Result<Vec<ChannelRef>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Vec<Value>>::deserialize(deserializer)?.unwrap_or_default();
    let mut sources: Vec<ChannelRef> = Vec::with_capacity(raw.len());
    for channel in raw.iter().filter_map(stored_channel) {
        if sources.contains(&channel) {
            warn!("Dropping duplicate stored source {}", channel);
        } else {
            sources.push(channel);
        }
    }
    Ok(sources)
}

/// Treat `""` (how unset destinations used to be written) and `null` alike.
/// An unusable destination is dropped like an unusable source.
fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<ChannelRef>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(raw)) if raw.trim().is_empty() => Ok(None),
        Some(value) => Ok(stored_channel(&value)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_record_shape() {
        let settings = Settings::new(42);
        assert_eq!(settings.admins, vec![42]);
        assert!(settings.source_channels.is_empty());
        assert!(settings.destination_channel.is_none());
        assert!(!settings.working);
    }

    #[test]
    fn test_serialized_fields_are_exactly_five() {
        let json = serde_json::to_value(Settings::new(1)).unwrap();
        let object = json.as_object().unwrap();
        let mut keys: Vec<&str> = object.keys().map(|k| k.as_str()).collect();
        keys.sort_unstable();
        assert_eq!(
            keys,
            vec!["admins", "destination_channel", "owner_id", "source_channels", "working"]
        );
        assert!(object["destination_channel"].is_null());
    }

    #[test]
    fn test_legacy_record_loads() {
        let legacy = r#"{
            "owner_id": 7,
            "admins": [7],
            "source_channels": ["@news"],
            "destination_channel": "",
            "working": true
        }"#;
        let settings: Settings = serde_json::from_str(legacy).unwrap();
        assert!(settings.destination_channel.is_none());
        assert_eq!(settings.source_channels, vec![ChannelRef::Username("news".into())]);
        assert!(settings.working);
    }

    #[test]
    fn test_unusable_entries_dropped_rest_kept() {
        let legacy = r#"{
            "owner_id": 1,
            "admins": [1, 77],
            "source_channels": ["@https://t.me/foo", "@news", "@bad name", -100123],
            "destination_channel": "@mychan",
            "working": true
        }"#;
        let settings: Settings = serde_json::from_str(legacy).unwrap();

        assert_eq!(settings.admins, vec![1, 77]);
        assert_eq!(
            settings.source_channels,
            vec![ChannelRef::Username("news".into()), ChannelRef::Id(-100123)]
        );
        assert_eq!(
            settings.destination_channel,
            Some(ChannelRef::Username("mychan".into()))
        );
        assert!(settings.working);
    }

    #[test]
    fn test_unusable_destination_becomes_unset() {
        let settings: Settings = serde_json::from_str(
            r#"{"owner_id": 1, "destination_channel": "@https://t.me/mine", "working": true}"#,
        )
        .unwrap();
        assert!(settings.destination_channel.is_none());
        assert!(settings.working);
    }

    #[test]
    fn test_duplicate_sources_collapsed_in_order() {
        let settings: Settings = serde_json::from_str(
            r#"{"owner_id": 1, "source_channels": ["@News", "@other", "@news", "NEWS"]}"#,
        )
        .unwrap();
        assert_eq!(
            settings.source_channels,
            vec![
                ChannelRef::Username("news".into()),
                ChannelRef::Username("other".into())
            ]
        );
    }

    #[test]
    fn test_null_sources_default() {
        let settings: Settings =
            serde_json::from_str(r#"{"owner_id": 1, "source_channels": null}"#).unwrap();
        assert!(settings.source_channels.is_empty());
    }

    #[test]
    fn test_missing_keys_default() {
        let settings: Settings = serde_json::from_str(r#"{"owner_id": 3}"#).unwrap();
        assert!(settings.admins.is_empty());
        assert!(!settings.working);
    }

    #[test]
    fn test_is_source_matches_either_form() {
        let mut settings = Settings::new(1);
        settings.source_channels.push(ChannelRef::Id(-100777));

        let origin = vec![ChannelRef::Username("other".into()), ChannelRef::Id(-100777)];
        assert!(settings.is_source(&origin));
        assert!(!settings.is_source(&[ChannelRef::Username("other".into())]));
    }

    #[test]
    fn test_describe_lists_everything() {
        let mut settings = Settings::new(1);
        settings.admins.push(2);
        settings.source_channels.push(ChannelRef::Username("news".into()));
        settings.destination_channel = Some(ChannelRef::Username("mychan".into()));
        settings.working = true;

        let text = settings.describe();
        assert!(text.contains("1, 2"));
        assert!(text.contains("ON"));
        assert!(text.contains("@news"));
        assert!(text.contains("@mychan"));
    }

    #[test]
    fn test_describe_empty_record() {
        let text = Settings::new(1).describe();
        assert!(text.contains("OFF"));
        assert!(text.contains("None"));
        assert!(text.contains("Not set"));
    }
}
