use super::{LockDiscovery, ProviderConfig};
use crate::error::{LockwhoError, Result};
use crate::model::LockerRecord;

use std::collections::{HashMap, HashSet};
use std::fs;
use std::os::unix::fs::MetadataExt;
use std::path::PathBuf;

use chrono::{DateTime, Local, NaiveDateTime};
use tracing::{debug, warn};

// ---------------------------------------------------------------------------
// Helper types
// ---------------------------------------------------------------------------

/// A file identified by device and inode, the granularity at which both the
/// kernel lock table and fd symlink targets are matched.
type FileId = (u32, u32, u64);

/// One row of /proc/locks that names a holder process.
#[derive(Debug, Clone)]
struct LockTableRow {
    lock_type: String,
    lock_mode: String,
    lock_access: String,
    pid: u32,
    major: u32,
    minor: u32,
    inode: u64,
}

// ---------------------------------------------------------------------------
// Helper functions
// ---------------------------------------------------------------------------

/// Split a raw `st_dev` into (major, minor) using the Linux encoding.
fn split_device(dev: u64) -> (u32, u32) {
    let major = ((dev >> 8) & 0xfff) | ((dev >> 32) & !0xfff);
    let minor = (dev & 0xff) | ((dev >> 12) & !0xff);
    (major as u32, minor as u32)
}

/// Parse one /proc/locks line, e.g.
/// `1: POSIX  ADVISORY  WRITE 12345 08:02:49152 0 EOF`.
///
/// The device fields are hexadecimal, the inode decimal. Waiter rows
/// (second column `->`) and rows without a holder pid (OFD locks report -1)
/// yield `None`, as does anything malformed.
fn parse_lock_row(line: &str) -> Option<LockTableRow> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() < 6 || fields.get(1) == Some(&"->") {
        return None;
    }

    let pid: i64 = fields[4].parse().ok()?;
    if pid <= 0 {
        return None;
    }

    let mut dev = fields[5].split(':');
    let major = u32::from_str_radix(dev.next()?, 16).ok()?;
    let minor = u32::from_str_radix(dev.next()?, 16).ok()?;
    let inode: u64 = dev.next()?.parse().ok()?;

    Some(LockTableRow {
        lock_type: fields[1].to_string(),
        lock_mode: fields[2].to_string(),
        lock_access: fields[3].to_string(),
        pid: pid as u32,
        major,
        minor,
        inode,
    })
}

fn read_lock_table() -> Vec<LockTableRow> {
    match fs::read_to_string("/proc/locks") {
        Ok(content) => content.lines().filter_map(parse_lock_row).collect(),
        Err(e) => {
            warn!("cannot read /proc/locks: {}", e);
            Vec::new()
        }
    }
}

/// Convert the clock-tick start time from /proc/[pid]/stat into local wall
/// time. All records of a pass go through this same conversion, so identity
/// comparisons see a uniform millisecond resolution.
fn start_time_from_ticks(starttime: u64, boot_secs: u64, tps: u64) -> Option<NaiveDateTime> {
    let secs = boot_secs + starttime / tps;
    let millis = (starttime % tps) * 1000 / tps;
    DateTime::from_timestamp(secs as i64, (millis * 1_000_000) as u32)
        .map(|utc| utc.with_timezone(&Local).naive_local())
}

/// Whether any numbered fd of `process` resolves to one of the target files.
fn holds_open_fd(process: &procfs::process::Process, targets: &HashSet<FileId>) -> bool {
    let fds = match process.fd() {
        Ok(fds) => fds,
        Err(_) => return false, // Permission denied or gone
    };

    for fd_info in fds {
        let fd_info = match fd_info {
            Ok(fi) => fi,
            Err(_) => continue,
        };

        if let procfs::process::FDTarget::Path(ref path) = fd_info.target {
            if let Ok(meta) = fs::metadata(path) {
                let (major, minor) = split_device(meta.dev());
                if targets.contains(&(major, minor, meta.ino())) {
                    return true;
                }
            }
        }
    }

    false
}

/// Build the record for one matching process, pulling metadata from procfs
/// and the lock detail from the matching lock-table row, if any.
fn build_record(
    process: &procfs::process::Process,
    stat: &procfs::process::Stat,
    lock: Option<&LockTableRow>,
    boot_secs: u64,
    tps: u64,
) -> Option<LockerRecord> {
    let start_time = start_time_from_ticks(stat.starttime, boot_secs, tps)?;

    let owner = process.uid().ok().map(|uid| {
        users::get_user_by_uid(uid)
            .map(|u| u.name().to_string_lossy().to_string())
            .unwrap_or_else(|| uid.to_string())
    });

    let exe = process.exe().ok();
    let executable_name = exe
        .as_ref()
        .and_then(|p| p.file_name())
        .map(|n| n.to_string_lossy().to_string());
    // Fall back to the kernel's comm when the exe link is unreadable.
    let application_name = executable_name
        .clone()
        .or_else(|| Some(stat.comm.clone()));

    Some(LockerRecord {
        pid: stat.pid as u32,
        start_time,
        executable_name: executable_name.or_else(|| Some(stat.comm.clone())),
        application_name,
        owner,
        executable_full_path: exe.map(|p| p.to_string_lossy().to_string()),
        session_id: u32::try_from(stat.session).ok(),
        lock_type: lock.map(|l| l.lock_type.clone()),
        lock_mode: lock.map(|l| l.lock_mode.clone()),
        lock_access: lock.map(|l| l.lock_access.clone()),
    })
}

// ---------------------------------------------------------------------------
// LinuxDiscovery
// ---------------------------------------------------------------------------

pub struct LinuxDiscovery {
    config: ProviderConfig,
}

impl LinuxDiscovery {
    pub fn new(config: ProviderConfig) -> Self {
        Self { config }
    }
}

impl LockDiscovery for LinuxDiscovery {
    fn find_lockers(&self, paths: &[PathBuf]) -> Result<Vec<LockerRecord>> {
        // Resolve the targets to (major, minor, inode) once up front.
        let mut targets: HashSet<FileId> = HashSet::new();
        for path in paths {
            let meta = fs::metadata(path).map_err(|e| LockwhoError::TargetAccess {
                path: path.clone(),
                source: e,
            })?;
            let (major, minor) = split_device(meta.dev());
            targets.insert((major, minor, meta.ino()));
        }

        // Lock-table rows for the targets, keyed by holder pid. The first
        // row per pid wins.
        let mut lock_rows: HashMap<u32, LockTableRow> = HashMap::new();
        for row in read_lock_table() {
            if targets.contains(&(row.major, row.minor, row.inode)) {
                lock_rows.entry(row.pid).or_insert(row);
            }
        }

        let boot_secs =
            procfs::boot_time_secs().map_err(|e| LockwhoError::Platform(e.to_string()))?;
        let tps = procfs::ticks_per_second();

        let mut lockers = Vec::new();
        let mut seen: HashSet<LockerRecord> = HashSet::new();

        let all_procs = procfs::process::all_processes()
            .map_err(|e| LockwhoError::Platform(e.to_string()))?;

        for proc_result in all_procs {
            let process = match proc_result {
                Ok(p) => p,
                Err(_) => continue,
            };

            let stat = match process.stat() {
                Ok(s) => s,
                Err(_) => continue,
            };
            let pid = stat.pid as u32;

            let lock_row = lock_rows.get(&pid);
            let matches = lock_row.is_some()
                || (!self.config.locks_only && holds_open_fd(&process, &targets));
            if !matches {
                continue;
            }

            match build_record(&process, &stat, lock_row, boot_secs, tps) {
                Some(record) => {
                    // Identity dedup: a pid seen via both the lock table and
                    // the fd scan yields one record.
                    if seen.insert(record.clone()) {
                        lockers.push(record);
                    }
                }
                None => debug!("skipping pid {}: start time out of range", pid),
            }
        }

        Ok(lockers)
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
