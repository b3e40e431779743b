//! Incident event input model.
//!
//! [`Event`] is the read-only record a host hands to the layout engine. Field
//! names serialize in camelCase so timelines exported by existing incident
//! tooling (`parentId`, `lateralMovementTarget`, ...) load unchanged.
//!
//! Nothing here validates relationships between events: a `parent_id` or
//! `lateral_movement_target` may name an event that does not exist, and parent
//! links may form cycles. The layout engine tolerates all of these.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// MITRE ATT&CK tactic marking an attacker pivot to another host.
pub const LATERAL_MOVEMENT: &str = "Lateral Movement";

/// MITRE ATT&CK tactic marking the first foothold on a host.
pub const INITIAL_ACCESS: &str = "Initial Access";

/// Artifact name carrying the hostname a lateral movement lands on.
pub const DESTINATION_HOST: &str = "Destination Host";

const NAIVE_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"];

/// Kind of an [`Artifact`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    Hostname,
    Domain,
    File,
    Ip,
    Hash,
    User,
    Command,
    Custom,
}

/// A typed key/value datum attached to an event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    #[serde(rename = "type")]
    pub kind: ArtifactKind,
    pub name: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linked_value: Option<String>,
}

impl Artifact {
    /// Creates an artifact without a linked value.
    pub fn new(kind: ArtifactKind, name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            value: value.into(),
            linked_value: None,
        }
    }
}

/// A single recorded incident-response action or observation.
///
/// # Examples
///
/// ```
/// use trailmap_core::event::{Artifact, ArtifactKind, Event, LATERAL_MOVEMENT};
///
/// let pivot = Event::new("evt-2", "2024-12-03T12:10:00")
///     .with_parent("evt-1")
///     .with_tactic(LATERAL_MOVEMENT)
///     .with_artifact(Artifact::new(ArtifactKind::Hostname, "Destination Host", "SRV-02"));
///
/// assert!(pivot.is_lateral_movement());
/// assert_eq!(pivot.destination_host(), Some("SRV-02"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: String,
    pub timestamp: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tactic: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub technique: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub artifacts: Vec<Artifact>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lateral_movement_target: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
}

impl Event {
    /// Creates a root event with no classification or artifacts.
    pub fn new(id: impl Into<String>, timestamp: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            timestamp: timestamp.into(),
            title: String::new(),
            description: String::new(),
            tactic: None,
            technique: None,
            parent_id: None,
            artifacts: Vec::new(),
            lateral_movement_target: None,
            host: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    pub fn with_tactic(mut self, tactic: impl Into<String>) -> Self {
        self.tactic = Some(tactic.into());
        self
    }

    pub fn with_technique(mut self, technique: impl Into<String>) -> Self {
        self.technique = Some(technique.into());
        self
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn with_lateral_movement_target(mut self, target: impl Into<String>) -> Self {
        self.lateral_movement_target = Some(target.into());
        self
    }

    pub fn with_artifact(mut self, artifact: Artifact) -> Self {
        self.artifacts.push(artifact);
        self
    }

    /// Returns true when the tactic is exactly `name`.
    pub fn has_tactic(&self, name: &str) -> bool {
        self.tactic.as_deref() == Some(name)
    }

    pub fn is_lateral_movement(&self) -> bool {
        self.has_tactic(LATERAL_MOVEMENT)
    }

    pub fn is_initial_access(&self) -> bool {
        self.has_tactic(INITIAL_ACCESS)
    }

    /// Returns the value of the first hostname artifact named "Destination Host".
    pub fn destination_host(&self) -> Option<&str> {
        self.artifacts
            .iter()
            .find(|artifact| {
                artifact.kind == ArtifactKind::Hostname && artifact.name == DESTINATION_HOST
            })
            .map(|artifact| artifact.value.as_str())
    }

    /// Parses the timestamp.
    ///
    /// RFC 3339 strings keep their offset; datetimes without an offset are read
    /// as UTC. Returns `None` when the string matches no supported format.
    pub fn parsed_timestamp(&self) -> Option<DateTime<FixedOffset>> {
        let raw = self.timestamp.trim();
        if let Ok(datetime) = DateTime::parse_from_rfc3339(raw) {
            return Some(datetime);
        }

        NAIVE_FORMATS
            .iter()
            .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
            .or_else(|| {
                NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                    .ok()
                    .and_then(|date| date.and_hms_opt(0, 0, 0))
            })
            .map(|naive| naive.and_utc().fixed_offset())
    }
}

/// An incident envelope as exported by incident-tracking tools.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Incident {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub events: Vec<Event>,
}

/// Accepted top-level shapes of an event document.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum EventDocument {
    /// A bare array of events.
    Events(Vec<Event>),
    /// An incident object carrying an `events` array.
    Incident(Incident),
}

impl EventDocument {
    /// Consumes the document and returns its events in document order.
    pub fn into_events(self) -> Vec<Event> {
        match self {
            EventDocument::Events(events) => events,
            EventDocument::Incident(incident) => incident.events,
        }
    }
}
