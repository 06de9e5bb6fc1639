use std::fmt;
use std::fmt::Write as _;
use std::hash::{Hash, Hasher};

use chrono::NaiveDateTime;

/// A single process holding a lock (or an open handle) on a file.
///
/// Identity is the `(pid, start_time)` pair. PIDs are recycled by the OS,
/// so two records with the same pid but different start times are different
/// processes. Every descriptive field may be absent; discovery fills in
/// whatever the platform can determine and leaves the rest `None`.
#[derive(Debug, Clone)]
pub struct LockerRecord {
    pub pid: u32,
    /// Process start time in local time, at the resolution the platform
    /// reports. Records produced by one discovery pass all use the same
    /// resolution so identity comparisons stay consistent.
    pub start_time: NaiveDateTime,
    pub executable_name: Option<String>,
    pub application_name: Option<String>,
    pub owner: Option<String>,
    pub executable_full_path: Option<String>,
    pub session_id: Option<u32>,
    pub lock_type: Option<String>,
    pub lock_mode: Option<String>,
    pub lock_access: Option<String>,
}

/// How [`LockerRecord::render`] presents a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    /// `pid@start-time`, the stable diagnostic form.
    Default,
    /// Default form plus `/application-name`.
    WithApplicationName,
    /// Multi-line dump of every field, one `label: value` line each.
    Verbose,
}

impl RenderMode {
    /// Map a caller-supplied format specifier to a mode.
    ///
    /// `f` selects the application-name form, `a` the full dump. Anything
    /// else, including no specifier at all, falls back to the default form
    /// rather than erroring.
    pub fn from_spec(spec: Option<&str>) -> Self {
        match spec {
            Some("f") | Some("F") => RenderMode::WithApplicationName,
            Some("a") | Some("A") => RenderMode::Verbose,
            _ => RenderMode::Default,
        }
    }
}

impl LockerRecord {
    pub fn render(&self, mode: RenderMode) -> String {
        match mode {
            RenderMode::Default => self.to_string(),
            RenderMode::WithApplicationName => format!(
                "{}/{}",
                self,
                self.application_name.as_deref().unwrap_or("")
            ),
            RenderMode::Verbose => self.render_verbose(),
        }
    }

    /// One `label: value` line per field, in declaration order. Absent
    /// fields keep their line with an empty value.
    fn render_verbose(&self) -> String {
        fn opt(value: &Option<String>) -> &str {
            value.as_deref().unwrap_or("")
        }

        let mut out = String::new();
        let _ = writeln!(out, "pid: {}", self.pid);
        let _ = writeln!(
            out,
            "start_time: {}",
            self.start_time.format("%Y-%m-%d %H:%M:%S")
        );
        let _ = writeln!(out, "executable_name: {}", opt(&self.executable_name));
        let _ = writeln!(out, "application_name: {}", opt(&self.application_name));
        let _ = writeln!(out, "owner: {}", opt(&self.owner));
        let _ = writeln!(
            out,
            "executable_full_path: {}",
            opt(&self.executable_full_path)
        );
        let _ = writeln!(
            out,
            "session_id: {}",
            self.session_id.map(|s| s.to_string()).unwrap_or_default()
        );
        let _ = writeln!(out, "lock_type: {}", opt(&self.lock_type));
        let _ = writeln!(out, "lock_mode: {}", opt(&self.lock_mode));
        let _ = writeln!(out, "lock_access: {}", opt(&self.lock_access));
        out
    }
}

impl fmt::Display for LockerRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Sortable layout: identical timestamps always format identically.
        write!(
            f,
            "{}@{}",
            self.pid,
            self.start_time.format("%Y-%m-%dT%H:%M:%S")
        )
    }
}

impl PartialEq for LockerRecord {
    fn eq(&self, other: &Self) -> bool {
        self.pid == other.pid && self.start_time == other.start_time
    }
}

impl Eq for LockerRecord {}

impl Hash for LockerRecord {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.pid.hash(state);
        self.start_time.hash(state);
    }
}
