#![forbid(unsafe_code)]

//! macOS implementations of the watcher's collaborators, built on
//! `osascript`, `open` and `launchctl`.

mod error;
pub mod launcher;
pub mod login_item;
pub mod notifier;
pub mod observer;
pub mod osascript;
pub mod presenter;
pub mod workspace;

pub use error::{Error, NOT_AUTHORIZED};
pub use launcher::{ChildHelper, ChildLauncher};
pub use login_item::LaunchAgentRegistry;
pub use notifier::AlertNotifier;
pub use observer::{SampledWorkspace, WorkspaceObserver};
pub use presenter::AlertPresenter;
pub use workspace::SystemWorkspace;
