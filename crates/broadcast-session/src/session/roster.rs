//! Roster projection.
//!
//! Every roster-changing event triggers a full [`project`] of the transport's
//! current participant list. Nothing is patched incrementally, so a missed or
//! duplicated join/leave event can at worst leave the roster stale until the
//! next event.

use crate::transport::ParticipantRecord;
use common::types::ParticipantId;
use std::collections::HashSet;

/// Display name used when the transport reports none.
pub const ANONYMOUS_NAME: &str = "Anonymous";

/// Display-ready participant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParticipantView {
    pub id: ParticipantId,
    pub display_name: String,
    pub audio_enabled: bool,
    pub video_enabled: bool,
}

/// Viewer-list status label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activity {
    /// Audio and video both off.
    Watching,
    /// Audio or video on.
    Active,
}

impl Activity {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Activity::Watching => "Watching",
            Activity::Active => "Active",
        }
    }
}

impl ParticipantView {
    /// Project one raw record. Only a missing or empty name becomes
    /// [`ANONYMOUS_NAME`]; other names are kept verbatim.
    #[must_use]
    pub fn from_record(record: &ParticipantRecord) -> Self {
        let display_name = match record.name.as_deref() {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => ANONYMOUS_NAME.to_string(),
        };

        Self {
            id: record.id.clone(),
            display_name,
            audio_enabled: record.audio_enabled.unwrap_or(false),
            video_enabled: record.video_enabled.unwrap_or(false),
        }
    }

    /// Avatar initials: first letters of the first two words, or the first
    /// two characters of a single-word name. `?` when there is no name.
    #[must_use]
    pub fn initials(&self) -> String {
        let mut words = self.display_name.split_whitespace();
        let initials: String = match (words.next(), words.next()) {
            (Some(first), Some(second)) => first
                .chars()
                .take(1)
                .chain(second.chars().take(1))
                .collect(),
            (Some(only), None) => only.chars().take(2).collect(),
            _ => return "?".to_string(),
        };
        initials.to_uppercase()
    }

    #[must_use]
    pub fn activity(&self) -> Activity {
        if self.audio_enabled || self.video_enabled {
            Activity::Active
        } else {
            Activity::Watching
        }
    }
}

/// Remote participants of the current session, excluding the local identity.
///
/// Keeps transport iteration order; ids are unique.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Roster {
    entries: Vec<ParticipantView>,
}

impl Roster {
    /// An empty roster.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ParticipantView> {
        self.entries.iter()
    }

    /// Look up a participant by id.
    #[must_use]
    pub fn get(&self, id: &ParticipantId) -> Option<&ParticipantView> {
        self.entries.iter().find(|p| &p.id == id)
    }

    /// Participants as a plain list (for the render surface and the UI).
    #[must_use]
    pub fn to_vec(&self) -> Vec<ParticipantView> {
        self.entries.clone()
    }
}

/// Rebuild the roster from the transport's current participant list.
///
/// Duplicate ids keep their first occurrence.
#[must_use]
pub fn project(raw: &[ParticipantRecord]) -> Roster {
    let mut seen = HashSet::with_capacity(raw.len());
    let entries = raw
        .iter()
        .filter(|record| seen.insert(record.id.clone()))
        .map(ParticipantView::from_record)
        .collect();

    Roster { entries }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn view(name: &str) -> ParticipantView {
        ParticipantView::from_record(&ParticipantRecord::new("p").with_name(name))
    }

    #[test]
    fn test_project_applies_defaults() {
        let roster = project(&[ParticipantRecord::new("v1").with_name("")]);

        assert_eq!(roster.len(), 1);
        assert_eq!(
            roster.to_vec()[0],
            ParticipantView {
                id: ParticipantId::from("v1"),
                display_name: "Anonymous".to_string(),
                audio_enabled: false,
                video_enabled: false,
            }
        );
    }

    #[test]
    fn test_project_missing_and_empty_names() {
        let roster = project(&[
            ParticipantRecord::new("a"),
            ParticipantRecord::new("b").with_name(""),
            ParticipantRecord::new("c").with_name("Grace Hopper"),
        ]);

        let names: Vec<_> = roster.iter().map(|p| p.display_name.as_str()).collect();
        assert_eq!(names, vec!["Anonymous", "Anonymous", "Grace Hopper"]);
    }

    #[test]
    fn test_project_keeps_names_verbatim() {
        let roster = project(&[
            ParticipantRecord::new("a").with_name("   "),
            ParticipantRecord::new("b").with_name(" Bob "),
        ]);

        let names: Vec<_> = roster.iter().map(|p| p.display_name.as_str()).collect();
        assert_eq!(names, vec!["   ", " Bob "]);
        assert_eq!(roster.get(&ParticipantId::from("a")).unwrap().initials(), "?");
    }

    #[test]
    fn test_project_keeps_flags_and_order() {
        let roster = project(&[
            ParticipantRecord::new("a").with_video(true),
            ParticipantRecord::new("b").with_audio(true),
        ]);

        let first = roster.get(&ParticipantId::from("a")).unwrap();
        assert!(first.video_enabled);
        assert!(!first.audio_enabled);

        let ids: Vec<_> = roster.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn test_project_drops_duplicate_ids() {
        let roster = project(&[
            ParticipantRecord::new("a").with_name("First"),
            ParticipantRecord::new("a").with_name("Second"),
        ]);

        assert_eq!(roster.len(), 1);
        assert_eq!(
            roster.get(&ParticipantId::from("a")).unwrap().display_name,
            "First"
        );
    }

    #[test]
    fn test_project_empty() {
        let roster = project(&[]);
        assert!(roster.is_empty());
        assert_eq!(roster, Roster::empty());
    }

    #[test]
    fn test_initials() {
        assert_eq!(view("grace hopper").initials(), "GH");
        assert_eq!(view("Ada Lovelace Byron").initials(), "AL");
        assert_eq!(view("linus").initials(), "LI");
        assert_eq!(view("Q").initials(), "Q");
        assert_eq!(view("").initials(), "AN"); // projected as "Anonymous"

        let unnamed = ParticipantView {
            id: ParticipantId::from("x"),
            display_name: String::new(),
            audio_enabled: false,
            video_enabled: false,
        };
        assert_eq!(unnamed.initials(), "?");
    }

    #[test]
    fn test_activity_label() {
        let mut p = view("viewer");
        assert_eq!(p.activity(), Activity::Watching);
        assert_eq!(p.activity().as_str(), "Watching");

        p.audio_enabled = true;
        assert_eq!(p.activity(), Activity::Active);
    }
}
