use std::fmt::Write as _;

use crate::model::LockerRecord;

/// Append a bounded summary of which processes lock which files to `out`.
///
/// An empty `lockers` collection appends nothing. Otherwise the report is a
/// header naming the files, one line per record up to `max` (all of them
/// when `max` is `None`), and a trailer counting anything left over. Records
/// appear in input order; callers wanting a particular order sort first.
///
/// Appending to a caller-supplied buffer lets the report be embedded in a
/// larger message, e.g. the text of an error.
pub fn write_report(
    out: &mut String,
    lockers: &[LockerRecord],
    file_names: &[String],
    max: Option<usize>,
) {
    if lockers.is_empty() {
        return;
    }

    let _ = writeln!(out, "File {} locked by: ", file_names.join(", "));

    let shown = max.unwrap_or(lockers.len());
    for locker in lockers.iter().take(shown) {
        let _ = writeln!(
            out,
            "[{}, pid={}, owner={}, started={}]",
            locker.application_name.as_deref().unwrap_or(""),
            locker.pid,
            locker.owner.as_deref().unwrap_or(""),
            locker.start_time.format("%Y-%m-%d %H:%M:%S%.3f"),
        );
    }

    // Strictly more than `max`: a cap equal to the record count lists
    // everything and no trailer appears.
    if let Some(max) = max {
        if lockers.len() > max {
            let _ = writeln!(out, "[{} more processes...]", lockers.len() - max);
        }
    }
}
