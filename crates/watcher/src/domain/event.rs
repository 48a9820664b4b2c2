#![forbid(unsafe_code)]

use std::fmt;

/// Raw application lifecycle notification categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum WorkspaceEventKind {
    Hide,
    Deactivate,
    Activate,
    Unhide,
    Terminate,
}

impl WorkspaceEventKind {
    pub const ALL: [Self; 5] = [
        Self::Hide,
        Self::Deactivate,
        Self::Activate,
        Self::Unhide,
        Self::Terminate,
    ];
}

impl fmt::Display for WorkspaceEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Hide => "hide",
            Self::Deactivate => "deactivate",
            Self::Activate => "activate",
            Self::Unhide => "unhide",
            Self::Terminate => "terminate",
        };
        f.write_str(name)
    }
}

/// A lifecycle notification and the application it concerns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceEvent {
    pub kind: WorkspaceEventKind,
    pub bundle_id: String,
}

impl WorkspaceEvent {
    pub fn new(kind: WorkspaceEventKind, bundle_id: impl Into<String>) -> Self {
        Self {
            kind,
            bundle_id: bundle_id.into(),
        }
    }
}

/// Edge-triggered transitions of the target's background residency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationEdge {
    WentBackground,
    LeftBackgroundOrQuit,
}
