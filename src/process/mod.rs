//! Process lookup by executable name.

use crate::trace::trace_event;
use crate::util::{VisionError, VisionResult};
use std::path::PathBuf;

#[cfg(feature = "platform")]
mod system;

#[cfg(feature = "platform")]
pub use system::SystemProcesses;

/// A running process.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProcessInfo {
    pub pid: u32,
    /// Executable name as reported by the OS.
    pub name: String,
    /// Full path to the executable, if available.
    pub exe_path: Option<PathBuf>,
}

/// How a requested name is compared with process names.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MatchMode {
    /// Whole name, case-insensitive, with an optional `.exe` suffix on either side.
    #[default]
    Exact,
    /// Case-insensitive substring.
    Fuzzy,
}

/// Returns `true` if `process_name` satisfies `wanted` under `mode`.
pub fn name_matches(process_name: &str, wanted: &str, mode: MatchMode) -> bool {
    let have = process_name.to_lowercase();
    let want = wanted.to_lowercase();
    if want.is_empty() {
        return false;
    }
    match mode {
        MatchMode::Exact => have.trim_end_matches(".exe") == want.trim_end_matches(".exe"),
        MatchMode::Fuzzy => have.contains(&want),
    }
}

/// Source of running processes.
pub trait ProcessLocator {
    /// All visible processes, sorted by PID.
    fn list(&self) -> Vec<ProcessInfo>;

    /// Processes whose name matches, sorted by PID.
    fn find(&self, name: &str, mode: MatchMode) -> Vec<ProcessInfo> {
        self.list()
            .into_iter()
            .filter(|p| name_matches(&p.name, name, mode))
            .collect()
    }

    /// PID of the first matching process.
    fn first_pid(&self, name: &str, mode: MatchMode) -> VisionResult<u32> {
        let found = self.find(name, mode);
        trace_event!("process_lookup", matches = found.len());
        found
            .first()
            .map(|p| p.pid)
            .ok_or_else(|| VisionError::ProcessNotFound {
                name: name.to_string(),
            })
    }
}

impl ProcessLocator for [ProcessInfo] {
    fn list(&self) -> Vec<ProcessInfo> {
        let mut all = self.to_vec();
        all.sort_by_key(|p| p.pid);
        all
    }
}

impl ProcessLocator for Vec<ProcessInfo> {
    fn list(&self) -> Vec<ProcessInfo> {
        self.as_slice().list()
    }
}

#[cfg(test)]
mod tests {
    use super::{name_matches, MatchMode, ProcessInfo, ProcessLocator};
    use crate::util::VisionError;

    fn proc(pid: u32, name: &str) -> ProcessInfo {
        ProcessInfo {
            pid,
            name: name.to_string(),
            exe_path: None,
        }
    }

    #[test]
    fn exact_ignores_case_and_exe_suffix() {
        assert!(name_matches("NIKKE.exe", "nikke", MatchMode::Exact));
        assert!(name_matches("nikke", "Nikke.EXE", MatchMode::Exact));
        assert!(!name_matches("nikke_launcher.exe", "nikke", MatchMode::Exact));
        assert!(!name_matches("nikke", "", MatchMode::Fuzzy));
    }

    #[test]
    fn fuzzy_matches_substrings() {
        assert!(name_matches("nikke_launcher.exe", "LAUNCHER", MatchMode::Fuzzy));
    }

    #[test]
    fn first_pid_is_lowest_matching_pid() {
        let procs = vec![proc(900, "game.exe"), proc(12, "shell"), proc(40, "game.exe")];
        assert_eq!(procs.first_pid("game", MatchMode::Exact).unwrap(), 40);
        assert_eq!(
            procs.first_pid("editor", MatchMode::Fuzzy).unwrap_err(),
            VisionError::ProcessNotFound {
                name: "editor".into()
            }
        );
    }
}
