use assert_cmd::Command;
use predicates::prelude::*;

// ---------------------------------------------------------------------------
// Error / no-op behavior
// ---------------------------------------------------------------------------

#[test]
fn test_missing_target_reports_error() {
    Command::cargo_bin("lockwho")
        .unwrap()
        .arg("/definitely/not/here.txt")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Cannot access"));
}

#[test]
fn test_requires_a_file_argument() {
    Command::cargo_bin("lockwho").unwrap().assert().failure();
}

#[test]
fn test_unheld_file_prints_nothing() {
    // Create the file, then drop the handle before querying.
    let path = {
        let file = tempfile::NamedTempFile::new().unwrap();
        file.into_temp_path()
    };

    Command::cargo_bin("lockwho")
        .unwrap()
        .arg(&*path)
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

// ---------------------------------------------------------------------------
// Discovery against this test process (Linux fd scan)
// ---------------------------------------------------------------------------

#[cfg(target_os = "linux")]
#[test]
fn test_finds_own_open_handle_terse() {
    // NamedTempFile keeps the file open, so this process is a holder.
    let held = tempfile::NamedTempFile::new().unwrap();
    let my_pid = std::process::id().to_string();

    let assert = Command::cargo_bin("lockwho")
        .unwrap()
        .arg("-t")
        .arg(held.path())
        .assert()
        .success();

    let stdout = String::from_utf8_lossy(&assert.get_output().stdout).to_string();
    assert!(
        stdout.lines().any(|line| line.trim() == my_pid),
        "Terse output should contain our PID {}. Got: {:?}",
        my_pid,
        stdout,
    );
}

#[cfg(target_os = "linux")]
#[test]
fn test_report_header_names_the_file() {
    let held = tempfile::NamedTempFile::new().unwrap();
    let name = held.path().to_string_lossy().into_owned();

    Command::cargo_bin("lockwho")
        .unwrap()
        .arg(held.path())
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("File {} locked by: ", name)))
        .stdout(predicate::str::contains(format!(
            "pid={}",
            std::process::id()
        )));
}

#[cfg(target_os = "linux")]
#[test]
fn test_verbose_dump_includes_flock_detail() {
    let held = tempfile::NamedTempFile::new().unwrap();
    let file = held.reopen().unwrap();
    let _lock = nix::fcntl::Flock::lock(file, nix::fcntl::FlockArg::LockExclusive)
        .map_err(|(_, errno)| errno)
        .unwrap();

    Command::cargo_bin("lockwho")
        .unwrap()
        .arg("-F")
        .arg("a")
        .arg(held.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("lock_type: FLOCK"))
        .stdout(predicate::str::contains("lock_mode: ADVISORY"))
        .stdout(predicate::str::contains(format!(
            "pid: {}",
            std::process::id()
        )));
}

#[cfg(target_os = "linux")]
#[test]
fn test_locks_only_excludes_plain_open_handles() {
    // Held open but never locked, so --locks-only must not report us.
    let held = tempfile::NamedTempFile::new().unwrap();
    let my_pid = std::process::id().to_string();

    let assert = Command::cargo_bin("lockwho")
        .unwrap()
        .arg("--locks-only")
        .arg("-t")
        .arg(held.path())
        .assert()
        .success();

    let stdout = String::from_utf8_lossy(&assert.get_output().stdout).to_string();
    assert!(
        !stdout.lines().any(|line| line.trim() == my_pid),
        "--locks-only should not list a plain open handle. Got: {:?}",
        stdout,
    );
}

#[cfg(target_os = "linux")]
#[test]
fn test_unknown_format_spec_falls_back_to_default_form() {
    let held = tempfile::NamedTempFile::new().unwrap();
    let my_pid = std::process::id();

    // "zzz" is not a recognized specifier; expect the pid@start-time form.
    Command::cargo_bin("lockwho")
        .unwrap()
        .arg("-F")
        .arg("zzz")
        .arg(held.path())
        .assert()
        .success()
        .stdout(predicate::str::is_match(format!(r"(?m)^{}@\d{{4}}-\d{{2}}-\d{{2}}T", my_pid)).unwrap());
}
