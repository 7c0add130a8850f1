//! Crontab management for scheduled issuance runs.
//!
//! Each installation owns exactly one crontab line, tagged with a marker
//! comment carrying the installation id. Install replaces the line for
//! its id; uninstall removes it; other crontab entries are preserved
//! byte-for-byte.

use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

use uuid::Uuid;

use crate::error::CliError;

/// Daily at local midnight.
const SCHEDULE: &str = "0 0 * * *";

// ── Crontab line construction ────────────────────────────────────────

fn marker(id: Uuid) -> String {
    format!("# wingman_job:{id}")
}

/// The full crontab line for one installation: a daily `issue` run with
/// output appended to the working directory's log.
pub fn entry_line(exe: &Path, dir: &Path, jitter_max: Option<u32>, id: Uuid) -> String {
    let jitter = match jitter_max {
        Some(minutes) if minutes > 0 => format!(" --jitter-max {minutes}"),
        _ => String::new(),
    };
    format!(
        "{SCHEDULE} {exe} issue {dir}{jitter} >> {log} 2>&1 {marker}",
        exe = exe.display(),
        dir = dir.display(),
        log = dir.join(wingman_config::LOG_FILE).display(),
        marker = marker(id),
    )
}

/// Remove any line tagged with `id`, then append `line`. Pure so it can
/// be tested without touching a real crontab.
fn upsert(existing: &str, id: Uuid, line: &str) -> String {
    let mut lines: Vec<&str> = without(existing, id).0;
    lines.push(line);
    lines.join("\n") + "\n"
}

/// Drop every line tagged with `id`. Returns the kept lines and how many
/// were removed.
fn without(existing: &str, id: Uuid) -> (Vec<&str>, usize) {
    let tag = marker(id);
    let mut removed = 0;
    let kept = existing
        .lines()
        .filter(|line| {
            if line.contains(&tag) {
                removed += 1;
                false
            } else {
                true
            }
        })
        .collect();
    (kept, removed)
}

// ── Crontab access ───────────────────────────────────────────────────

/// Read the current user's crontab. `crontab -l` exits non-zero when no
/// crontab exists yet, which reads as empty here.
fn read_crontab() -> Result<String, CliError> {
    let output = Command::new("crontab").arg("-l").output().map_err(|err| {
        CliError::Cron {
            message: format!("could not run `crontab -l`: {err}"),
        }
    })?;

    if output.status.success() {
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    } else {
        Ok(String::new())
    }
}

fn write_crontab(content: &str) -> Result<(), CliError> {
    let mut child = Command::new("crontab")
        .arg("-")
        .stdin(Stdio::piped())
        .spawn()
        .map_err(|err| CliError::Cron {
            message: format!("could not run `crontab -`: {err}"),
        })?;

    if let Some(stdin) = child.stdin.as_mut() {
        stdin
            .write_all(content.as_bytes())
            .map_err(|err| CliError::Cron {
                message: format!("could not write the new crontab: {err}"),
            })?;
    }

    let status = child.wait().map_err(|err| CliError::Cron {
        message: format!("crontab did not finish: {err}"),
    })?;
    if !status.success() {
        return Err(CliError::Cron {
            message: format!("crontab rejected the new table (exit {status})"),
        });
    }
    Ok(())
}

/// Install (or replace) this installation's scheduled run.
pub fn install_entry(exe: &Path, dir: &Path, jitter_max: Option<u32>, id: Uuid) -> Result<(), CliError> {
    let existing = read_crontab()?;
    let line = entry_line(exe, dir, jitter_max, id);
    write_crontab(&upsert(&existing, id, &line))
}

/// Remove this installation's scheduled run. Returns how many lines were
/// dropped so callers can tell the operator whether anything was there.
pub fn remove_entry(id: Uuid) -> Result<usize, CliError> {
    let existing = read_crontab()?;
    let (kept, removed) = without(&existing, id);
    if removed == 0 {
        return Ok(0);
    }

    let mut content = kept.join("\n");
    if !content.is_empty() {
        content.push('\n');
    }
    write_crontab(&content)?;
    Ok(removed)
}
