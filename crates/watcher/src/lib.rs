#![forbid(unsafe_code)]

pub mod clock;
pub mod controller;
pub mod domain;
mod error;
mod event;
pub mod memory;
pub mod monitor;
pub mod notifier;
pub mod run_mode;
pub mod schedule;
pub mod timer;
pub mod tracker;
pub mod workspace;

pub use controller::WatchController;
pub use error::Error;
pub use event::ControlEvent;
pub use monitor::{BackgroundMonitor, MonitorState, QuitOutcome, Verdict};
pub use schedule::IntervalSchedule;
pub use tracker::ActivationTracker;
