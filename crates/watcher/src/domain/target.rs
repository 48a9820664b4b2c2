#![forbid(unsafe_code)]

use std::fmt;
use std::sync::Arc;

/// Identity of the watched application. Cheap to clone, never changes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TargetIdentity {
    bundle_id: Arc<str>,
    name: Arc<str>,
}

impl TargetIdentity {
    pub fn new(bundle_id: impl AsRef<str>, name: impl AsRef<str>) -> Self {
        Self {
            bundle_id: Arc::from(bundle_id.as_ref()),
            name: Arc::from(name.as_ref()),
        }
    }

    pub fn bundle_id(&self) -> &str {
        &self.bundle_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Exact bundle identifier match.
    pub fn matches(&self, bundle_id: &str) -> bool {
        &*self.bundle_id == bundle_id
    }
}

impl From<&config::Target> for TargetIdentity {
    fn from(target: &config::Target) -> Self {
        Self::new(&target.bundle_id, &target.name)
    }
}

impl fmt::Display for TargetIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.bundle_id)
    }
}

/// What the workspace knows about a running instance of the target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AppStatus {
    pub frontmost: bool,
    pub hidden: bool,
}

impl AppStatus {
    /// Running but not the active application.
    pub fn is_backgrounded(&self) -> bool {
        !self.frontmost
    }
}
