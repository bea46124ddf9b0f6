// File: ./src/model/event.rs
// Event records, their classification enums and partial updates.
use chrono::{DateTime, Local, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use strum::{EnumIter, IntoEnumIterator};
use uuid::Uuid;

/// Tag color used for records that have no primary type yet.
pub const UNCLASSIFIED_COLOR: &str = "#848484";

/// Number of characters kept in a title derived from dialog text.
pub const TITLE_MAX_CHARS: usize = 20;

const DISPLAY_TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter)]
#[serde(rename_all = "camelCase")]
pub enum PrimaryType {
    Emotional,
    Cognitive,
    Interpersonal,
    Behavioral,
    Physiological,
    LifeEvent,
}

impl PrimaryType {
    /// Wire name, as stored in `primaryType`.
    pub fn as_str(&self) -> &'static str {
        match self {
            PrimaryType::Emotional => "emotional",
            PrimaryType::Cognitive => "cognitive",
            PrimaryType::Interpersonal => "interpersonal",
            PrimaryType::Behavioral => "behavioral",
            PrimaryType::Physiological => "physiological",
            PrimaryType::LifeEvent => "lifeEvent",
        }
    }

    /// Short label shown on event cards.
    pub fn label(&self) -> &'static str {
        match self {
            PrimaryType::Emotional => "Emotion",
            PrimaryType::Cognitive => "Cognition",
            PrimaryType::Interpersonal => "Interpersonal",
            PrimaryType::Behavioral => "Behavior",
            PrimaryType::Physiological => "Physiology",
            PrimaryType::LifeEvent => "Life",
        }
    }

    pub fn default_color(&self) -> &'static str {
        match self {
            PrimaryType::Emotional => "#4192FF",
            PrimaryType::Cognitive => "#9C27B0",
            PrimaryType::Interpersonal => "#4CAF50",
            PrimaryType::Behavioral => "#FF9800",
            PrimaryType::Physiological => "#F44336",
            PrimaryType::LifeEvent => "#FFC107",
        }
    }
}

impl fmt::Display for PrimaryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for PrimaryType {
    type Err = String;

    /// Accepts the wire name or the card label, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        PrimaryType::iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(needle) || t.label().eq_ignore_ascii_case(needle))
            .ok_or_else(|| {
                let known: Vec<&str> = PrimaryType::iter().map(|t| t.as_str()).collect();
                format!("Unknown event type '{}' (expected one of: {})", s, known.join(", "))
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, EnumIter)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    #[default]
    Pending,
    Confirmed,
    Rejected,
}

impl EventStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::Pending => "pending",
            EventStatus::Confirmed => "confirmed",
            EventStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for EventStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventStatus::iter()
            .find(|st| st.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                format!(
                    "Unknown status '{}' (expected pending, confirmed or rejected)",
                    s
                )
            })
    }
}

/// A journaled mood/behavior record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub primary_type: Option<PrimaryType>,
    #[serde(default)]
    pub sub_type: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub dialog_content: String,
    #[serde(default)]
    pub time: String,
    #[serde(default)]
    pub create_time: String,
    #[serde(default)]
    pub update_time: String,
    #[serde(default)]
    pub status: EventStatus,
    #[serde(default)]
    pub tag_color: String,
    #[serde(default)]
    pub source_dialog_id: String,
}

impl Event {
    /// Builds a pending, unclassified record from raw conversation text.
    pub fn from_dialog(text: &str, now: DateTime<Utc>) -> Self {
        let stamp = format_timestamp(now);
        Self {
            id: Uuid::new_v4().to_string(),
            primary_type: None,
            sub_type: String::new(),
            title: dialog_title(text),
            content: text.to_string(),
            dialog_content: text.to_string(),
            time: now.with_timezone(&Local).format(DISPLAY_TIME_FORMAT).to_string(),
            create_time: stamp.clone(),
            update_time: stamp,
            status: EventStatus::Pending,
            tag_color: UNCLASSIFIED_COLOR.to_string(),
            source_dialog_id: format!("dialog_{}", Uuid::new_v4().simple()),
        }
    }

    /// Refreshes `update_time`, never moving it before `create_time`.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        let now = match parse_timestamp(&self.create_time) {
            Some(created) if created > now => created,
            _ => now,
        };
        self.update_time = format_timestamp(now);
    }

    /// Merges the present patch fields and refreshes `update_time`.
    pub fn apply(&mut self, patch: &EventPatch, now: DateTime<Utc>) {
        macro_rules! merge_field {
            ($field:ident) => {
                if let Some(v) = &patch.$field {
                    self.$field = v.clone();
                }
            };
        }

        if let Some(t) = patch.primary_type {
            self.primary_type = Some(t);
        }
        if let Some(s) = patch.status {
            self.status = s;
        }
        merge_field!(sub_type);
        merge_field!(title);
        merge_field!(content);
        merge_field!(dialog_content);
        merge_field!(time);
        merge_field!(tag_color);
        merge_field!(source_dialog_id);
        self.touch(now);
    }

    pub fn type_label(&self) -> &'static str {
        self.primary_type.map(|t| t.label()).unwrap_or("Unclassified")
    }
}

/// Partial update of an event. Absent fields are left untouched and are
/// not serialized, so the JSON doubles as the body of a remote `PUT`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_type: Option<PrimaryType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dialog_content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<EventStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_dialog_id: Option<String>,
}

impl EventPatch {
    pub fn status(status: EventStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Title for a record extracted from dialog: the first characters of the
/// text, with an ellipsis when it had to be cut.
pub fn dialog_title(text: &str) -> String {
    let mut title: String = text.chars().take(TITLE_MAX_CHARS).collect();
    if text.chars().count() > TITLE_MAX_CHARS {
        title.push_str("...");
    }
    title
}

pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parses RFC 3339 timestamps as well as the `YYYY-MM-DD HH:MM[:SS]`
/// local-time strings found in seed and legacy records.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%d %H:%M:%S", DISPLAY_TIME_FORMAT]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .and_then(|naive| Local.from_local_datetime(&naive).earliest())
        .map(|dt| dt.with_timezone(&Utc))
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Int(i64),
        Uint(u64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(s) => s,
        RawId::Int(n) => n.to_string(),
        RawId::Uint(n) => n.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn title_is_cut_at_twenty_chars() {
        assert_eq!(
            dialog_title("A very long dialog text exceeding twenty chars"),
            "A very long dialog t..."
        );
        assert_eq!(dialog_title("short"), "short");
        assert_eq!(dialog_title("exactly twenty chars"), "exactly twenty chars");
    }

    #[test]
    fn title_counts_characters_not_bytes() {
        let text = "最近我经常感到莫名的焦虑，特别是晚上一个人的时候";
        let title = dialog_title(text);
        assert_eq!(title.chars().count(), TITLE_MAX_CHARS + 3);
        assert!(title.ends_with("..."));
    }

    #[test]
    fn numeric_ids_are_accepted() {
        let e: Event = serde_json::from_str(r#"{"id": 42, "title": "x"}"#).unwrap();
        assert_eq!(e.id, "42");
        assert_eq!(e.status, EventStatus::Pending);
        assert_eq!(e.primary_type, None);
    }

    #[test]
    fn wire_names_are_camel_case() {
        let mut e = Event::from_dialog("hello", Utc::now());
        e.primary_type = Some(PrimaryType::LifeEvent);
        let json = serde_json::to_value(&e).unwrap();
        assert_eq!(json["primaryType"], "lifeEvent");
        assert_eq!(json["status"], "pending");
        assert!(json.get("dialogContent").is_some());
        assert!(json.get("sourceDialogId").is_some());
    }

    #[test]
    fn patch_serializes_only_present_fields() {
        let patch = EventPatch {
            title: Some("x".into()),
            status: Some(EventStatus::Confirmed),
            ..Default::default()
        };
        let json = serde_json::to_string(&patch).unwrap();
        assert_eq!(json, r#"{"title":"x","status":"confirmed"}"#);
        assert!(EventPatch::default().is_empty());
    }

    #[test]
    fn apply_changes_only_patched_fields() {
        let now = Utc::now();
        let mut e = Event::from_dialog("some dialog", now - Duration::hours(1));
        let before = e.clone();
        e.apply(
            &EventPatch {
                title: Some("x".into()),
                ..Default::default()
            },
            now,
        );
        assert_eq!(e.title, "x");
        assert_ne!(e.update_time, before.update_time);
        assert_eq!(e.content, before.content);
        assert_eq!(e.status, before.status);
        assert_eq!(e.create_time, before.create_time);
        assert_eq!(e.id, before.id);
    }

    #[test]
    fn touch_never_precedes_creation() {
        let now = Utc::now();
        let mut e = Event::from_dialog("from the future", now + Duration::days(1));
        e.touch(now);
        assert_eq!(e.update_time, e.create_time);
        assert!(parse_timestamp(&e.update_time) >= parse_timestamp(&e.create_time));
    }

    #[test]
    fn legacy_timestamps_parse() {
        assert!(parse_timestamp("2024-04-05 10:30").is_some());
        assert!(parse_timestamp("2024-04-05T10:30:00.000Z").is_some());
        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn types_parse_from_wire_name_or_label() {
        assert_eq!("lifeEvent".parse::<PrimaryType>(), Ok(PrimaryType::LifeEvent));
        assert_eq!("EMOTION".parse::<PrimaryType>(), Ok(PrimaryType::Emotional));
        assert!("unknown".parse::<PrimaryType>().is_err());
        assert_eq!("Confirmed".parse::<EventStatus>(), Ok(EventStatus::Confirmed));
        assert!("done".parse::<EventStatus>().is_err());
    }
}
