#![forbid(unsafe_code)]

mod event;
mod target;

pub use event::{ActivationEdge, WorkspaceEvent, WorkspaceEventKind};
pub use target::{AppStatus, TargetIdentity};
