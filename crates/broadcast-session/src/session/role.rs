//! Role resolution.
//!
//! The role is decided once per session, from the command that started it.
//! It is never inferred from the roster: the roster excludes the local
//! identity, so a host would otherwise see a host-less room.

use crate::transport::MediaDefaults;
use tracing::warn;

/// Participant preset requested from the credential service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Preset {
    /// Broadcaster preset.
    Host,
    /// Audience preset.
    Viewer,
}

impl Preset {
    /// Preset name understood by the credential service.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Preset::Host => "host-preset",
            Preset::Viewer => "viewer-preset",
        }
    }
}

/// Role of the local participant for the lifetime of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Host,
    Viewer,
}

impl Role {
    /// Returns the role as a string for logs and metric labels.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Role::Host => "host",
            Role::Viewer => "viewer",
        }
    }

    /// Media state the transport is initialised with. Broadcasters start
    /// live, viewers start with camera and microphone off.
    #[must_use]
    pub const fn media_defaults(&self) -> MediaDefaults {
        match self {
            Role::Host => MediaDefaults {
                audio: true,
                video: true,
            },
            Role::Viewer => MediaDefaults {
                audio: false,
                video: false,
            },
        }
    }
}

/// Resolve the session role.
///
/// `is_creator` is true for the "start broadcast" command and decides the
/// role on its own. A disagreeing preset hint is logged, not obeyed.
#[must_use]
pub fn resolve_role(preset_hint: Preset, is_creator: bool) -> Role {
    let role = if is_creator { Role::Host } else { Role::Viewer };

    let hinted = match preset_hint {
        Preset::Host => Role::Host,
        Preset::Viewer => Role::Viewer,
    };
    if hinted != role {
        warn!(
            target: "broadcast.session.role",
            preset = preset_hint.as_str(),
            role = role.as_str(),
            "Credential preset disagrees with the session command, using command role"
        );
    }

    role
}
