//! Process enumeration through `sysinfo`.

use crate::process::{ProcessInfo, ProcessLocator};
use sysinfo::{ProcessRefreshKind, RefreshKind, System};

/// Live view of the OS process table; each call takes a fresh snapshot.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemProcesses;

impl ProcessLocator for SystemProcesses {
    fn list(&self) -> Vec<ProcessInfo> {
        let mut sys = System::new_with_specifics(
            RefreshKind::new().with_processes(ProcessRefreshKind::new()),
        );
        sys.refresh_processes();
        let mut all: Vec<ProcessInfo> = sys
            .processes()
            .iter()
            .map(|(pid, process)| ProcessInfo {
                pid: pid.as_u32(),
                name: process.name().to_string(),
                exe_path: process.exe().map(|p| p.to_path_buf()),
            })
            .collect();
        all.sort_by_key(|p| p.pid);
        all
    }
}
