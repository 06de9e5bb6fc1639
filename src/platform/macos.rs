use super::{LockDiscovery, ProviderConfig};
use crate::error::{LockwhoError, Result};
use crate::model::LockerRecord;

use std::collections::HashSet;
use std::path::PathBuf;

use chrono::{DateTime, Local, NaiveDateTime};
use libproc::libproc::proc_pid::{listpidspath, ProcType};
use sysinfo::{Pid, System};
use tracing::{debug, warn};

/// Epoch seconds from the kernel, local wall time for the record. Whole
/// seconds is the resolution sysinfo reports, consistently for every pid.
fn start_time_from_secs(secs: u64) -> Option<NaiveDateTime> {
    DateTime::from_timestamp(secs as i64, 0).map(|utc| utc.with_timezone(&Local).naive_local())
}

pub struct MacosDiscovery {
    config: ProviderConfig,
}

impl MacosDiscovery {
    pub fn new(config: ProviderConfig) -> Self {
        Self { config }
    }
}

impl LockDiscovery for MacosDiscovery {
    fn find_lockers(&self, paths: &[PathBuf]) -> Result<Vec<LockerRecord>> {
        if self.config.locks_only {
            // proc_info only exposes which processes have the path open,
            // not the kernel lock table.
            warn!("lock-table details are not available on macOS; --locks-only matches nothing");
            return Ok(Vec::new());
        }

        let mut pids: Vec<u32> = Vec::new();
        for path in paths {
            let canonical = path.canonicalize().map_err(|e| LockwhoError::TargetAccess {
                path: path.clone(),
                source: e,
            })?;
            let holders = listpidspath(ProcType::ProcAllPIDS, &canonical.to_string_lossy())
                .map_err(|e| {
                    LockwhoError::Platform(format!(
                        "listpidspath failed for {}: {}",
                        canonical.display(),
                        e
                    ))
                })?;
            pids.extend(holders);
        }

        let sys = System::new_all();
        let mut lockers = Vec::new();
        let mut seen: HashSet<LockerRecord> = HashSet::new();

        for pid in pids {
            let Some(process) = sys.process(Pid::from_u32(pid)) else {
                debug!("pid {} exited before metadata lookup", pid);
                continue;
            };
            let Some(start_time) = start_time_from_secs(process.start_time()) else {
                continue;
            };

            let exe = process.exe().map(|p| p.to_path_buf());
            let executable_name = exe
                .as_ref()
                .and_then(|p| p.file_name())
                .map(|n| n.to_string_lossy().to_string());
            let name = process.name().to_string();
            let owner = process.user_id().map(|uid| {
                users::get_user_by_uid(**uid)
                    .map(|u| u.name().to_string_lossy().to_string())
                    .unwrap_or_else(|| (**uid).to_string())
            });

            let record = LockerRecord {
                pid,
                start_time,
                executable_name: executable_name.clone().or_else(|| Some(name.clone())),
                application_name: if name.is_empty() {
                    executable_name
                } else {
                    Some(name)
                },
                owner,
                executable_full_path: exe.map(|p| p.to_string_lossy().to_string()),
                session_id: process.session_id().map(|s| s.as_u32()),
                lock_type: None,
                lock_mode: None,
                lock_access: None,
            };

            // A path queried twice, or two targets open in one process,
            // still yields a single record per process.
            if seen.insert(record.clone()) {
                lockers.push(record);
            }
        }

        Ok(lockers)
    }
}
