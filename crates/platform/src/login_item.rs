#![forbid(unsafe_code)]

use crate::error::Error;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info};
use watcher::run_mode::LoginItemRegistry;

const LAUNCHCTL: &str = "launchctl";

/// Registers the helper as a per-user LaunchAgent, started at login.
#[derive(Debug, Clone)]
pub struct LaunchAgentRegistry {
    label: String,
    program: Vec<String>,
    agents_dir: PathBuf,
    load_with_launchctl: bool,
}

impl LaunchAgentRegistry {
    pub fn new(label: impl Into<String>, program: Vec<String>, agents_dir: PathBuf) -> Self {
        Self {
            label: label.into(),
            program,
            agents_dir,
            load_with_launchctl: true,
        }
    }

    /// Only write and remove the plist, leave `launchctl` alone.
    pub fn without_launchctl(mut self) -> Self {
        self.load_with_launchctl = false;
        self
    }

    pub fn plist_path(&self) -> PathBuf {
        self.agents_dir.join(format!("{}.plist", self.label))
    }

    pub fn is_registered(&self) -> bool {
        self.plist_path().is_file()
    }

    fn register(&self) -> Result<(), Error> {
        let path = self.plist_path();
        fs::create_dir_all(&self.agents_dir)?;
        let plist = render_plist(&self.label, &self.program);
        if fs::read_to_string(&path).is_ok_and(|current| current == plist) {
            debug!(path = %path.display(), "launch agent up to date");
        } else {
            fs::write(&path, plist)?;
            info!(path = %path.display(), "launch agent written");
        }
        if self.load_with_launchctl {
            launchctl(&["load", "-w"], &path)?;
        }
        Ok(())
    }

    fn unregister(&self) -> Result<(), Error> {
        let path = self.plist_path();
        if !path.is_file() {
            debug!(path = %path.display(), "no launch agent to remove");
            return Ok(());
        }
        if self.load_with_launchctl {
            launchctl(&["unload", "-w"], &path)?;
        }
        fs::remove_file(&path)?;
        info!(path = %path.display(), "launch agent removed");
        Ok(())
    }
}

fn launchctl(args: &[&str], plist: &Path) -> Result<(), Error> {
    let output = Command::new(LAUNCHCTL)
        .args(args)
        .arg(plist)
        .output()
        .map_err(|source| Error::Spawn {
            program: LAUNCHCTL,
            source,
        })?;
    if output.status.success() {
        return Ok(());
    }
    Err(Error::Command {
        program: LAUNCHCTL,
        status: output.status,
        message: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
    })
}

/// A LaunchAgent property list that runs `program` once at login.
pub fn render_plist(label: &str, program: &[String]) -> String {
    let arguments: String = program
        .iter()
        .map(|arg| format!("        <string>{}</string>\n", escape_xml(arg)))
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd">
<plist version="1.0">
<dict>
    <key>Label</key>
    <string>{label}</string>
    <key>ProgramArguments</key>
    <array>
{arguments}    </array>
    <key>RunAtLoad</key>
    <true/>
    <key>ProcessType</key>
    <string>Interactive</string>
</dict>
</plist>
"#,
        label = escape_xml(label),
    )
}

fn escape_xml(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

impl LoginItemRegistry for LaunchAgentRegistry {
    fn set_enabled(&self, enabled: bool) -> Result<(), watcher::Error> {
        let result = if enabled {
            self.register()
        } else {
            self.unregister()
        };
        result.map_err(|err| watcher::Error::RegistrationFailed {
            enabled,
            reason: err.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn registry(dir: &Path) -> LaunchAgentRegistry {
        LaunchAgentRegistry::new(
            "io.github.consolewatch.helper",
            vec!["/Applications/Console Watch/consolewatch-helper".into()],
            dir.join("LaunchAgents"),
        )
        .without_launchctl()
    }

    #[test]
    fn plist_lists_program_arguments() {
        let plist = render_plist("a.b", &["/bin/x".into(), "-c".into(), "<conf>&".into()]);
        assert!(plist.contains("<string>a.b</string>"));
        assert!(plist.contains(
            "        <string>/bin/x</string>\n        <string>-c</string>\n        <string>&lt;conf&gt;&amp;</string>\n    </array>"
        ));
        assert!(plist.contains("<key>RunAtLoad</key>\n    <true/>"));
    }

    #[test]
    fn enable_then_disable() {
        let dir = tempfile::tempdir().unwrap();
        let registry = registry(dir.path());

        registry.set_enabled(true).unwrap();
        assert!(registry.is_registered());
        assert_eq!(
            registry.plist_path(),
            dir.path()
                .join("LaunchAgents")
                .join("io.github.consolewatch.helper.plist")
        );

        registry.set_enabled(false).unwrap();
        assert!(!registry.is_registered());
    }

    #[test]
    fn disabling_without_plist_is_fine() {
        let dir = tempfile::tempdir().unwrap();
        registry(dir.path()).set_enabled(false).unwrap();
    }

    #[test]
    fn unwritable_directory_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("LaunchAgents");
        fs::write(&blocker, "not a directory").unwrap();

        let err = registry(dir.path()).set_enabled(true).unwrap_err();
        assert!(matches!(
            err,
            watcher::Error::RegistrationFailed { enabled: true, .. }
        ));
    }
}
