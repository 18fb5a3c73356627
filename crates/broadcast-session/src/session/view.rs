//! View composition: who goes on the primary video surface.

use super::role::Role;
use super::roster::{ParticipantView, Roster};

/// Participant selected for the primary video surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Featured {
    /// The local participant (host self-view).
    LocalSelf(ParticipantView),
    /// A remote participant (the broadcaster, from a viewer's side).
    Remote(ParticipantView),
}

impl Featured {
    /// The featured participant, wherever it came from.
    #[must_use]
    pub fn participant(&self) -> &ParticipantView {
        match self {
            Featured::LocalSelf(p) | Featured::Remote(p) => p,
        }
    }

    /// Participants to hand to the render surface.
    #[must_use]
    pub fn to_render_list(&self) -> Vec<ParticipantView> {
        vec![self.participant().clone()]
    }
}

/// Compose the featured participant.
///
/// Hosts always see only themselves. Viewers get the first roster entry with
/// video enabled, or `None` while nobody is broadcasting.
///
/// The viewer rule is a heuristic: the roster carries no host marker, so if
/// two remote participants enable video the pick follows roster order and
/// may change between recomputations.
#[must_use]
pub fn compose(role: Role, local: &ParticipantView, roster: &Roster) -> Option<Featured> {
    match role {
        Role::Host => Some(Featured::LocalSelf(local.clone())),
        Role::Viewer => roster
            .iter()
            .find(|p| p.video_enabled)
            .cloned()
            .map(Featured::Remote),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::session::roster::project;
    use crate::transport::ParticipantRecord;

    fn local() -> ParticipantView {
        ParticipantView::from_record(&ParticipantRecord::new("me").with_name("Me").with_video(true))
    }

    #[test]
    fn test_host_always_features_self() {
        let roster = project(
            &(1..=5)
                .map(|i| ParticipantRecord::new(format!("viewer-{i}")).with_video(true))
                .collect::<Vec<_>>(),
        );

        let featured = compose(Role::Host, &local(), &roster).unwrap();
        assert_eq!(featured, Featured::LocalSelf(local()));
        assert_eq!(featured.to_render_list().len(), 1);

        let featured = compose(Role::Host, &local(), &Roster::empty()).unwrap();
        assert_eq!(featured.participant().id.as_str(), "me");
    }

    #[test]
    fn test_viewer_features_first_video_enabled() {
        let roster = project(&[
            ParticipantRecord::new("A").with_video(false),
            ParticipantRecord::new("B").with_video(true),
            ParticipantRecord::new("C").with_video(true),
        ]);

        let featured = compose(Role::Viewer, &local(), &roster).unwrap();
        assert!(matches!(&featured, Featured::Remote(p) if p.id.as_str() == "B"));
    }

    #[test]
    fn test_viewer_waits_without_video() {
        let roster = project(&[
            ParticipantRecord::new("A").with_video(false),
            ParticipantRecord::new("B"),
        ]);

        assert!(compose(Role::Viewer, &local(), &roster).is_none());
        assert!(compose(Role::Viewer, &local(), &Roster::empty()).is_none());
    }

    #[test]
    fn test_viewer_rescans_after_roster_change() {
        let before = project(&[
            ParticipantRecord::new("A").with_video(true),
            ParticipantRecord::new("B").with_video(true),
        ]);
        let after = project(&[ParticipantRecord::new("B").with_video(true)]);

        let first = compose(Role::Viewer, &local(), &before).unwrap();
        let second = compose(Role::Viewer, &local(), &after).unwrap();
        assert_eq!(first.participant().id.as_str(), "A");
        assert_eq!(second.participant().id.as_str(), "B");
    }
}
