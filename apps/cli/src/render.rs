//! Terminal rendering of batch events and server reports.

use std::collections::HashMap;
use std::fmt::Write;
use std::time::Duration;

use casevault_notifications::{Notification, NotificationKind};
use casevault_protocol::{AuditReplayResult, ManifestVerification};
use casevault_transfer::SpeedCalculator;
use casevault_upload::{BatchEvent, TaskId, TaskStatus, UploadTask};

/// Formats a byte count with binary units.
pub fn format_bytes(bytes: f64) -> String {
    const UNITS: [&str; 4] = ["KiB", "MiB", "GiB", "TiB"];
    if bytes < 1024.0 {
        return format!("{bytes:.0} B");
    }
    let mut value = bytes / 1024.0;
    let mut unit = UNITS[0];
    for next in &UNITS[1..] {
        if value < 1024.0 {
            break;
        }
        value /= 1024.0;
        unit = next;
    }
    format!("{value:.1} {unit}")
}

pub fn format_eta(eta: Duration) -> String {
    let secs = eta.as_secs();
    match secs {
        0..60 => format!("{secs}s"),
        60..3600 => format!("{}m {:02}s", secs / 60, secs % 60),
        _ => format!("{}h {:02}m", secs / 3600, (secs % 3600) / 60),
    }
}

struct TaskLine {
    name: String,
    speed: SpeedCalculator,
    last_sent: u64,
}

/// Turns batch events into one status line each.
#[derive(Default)]
pub struct ProgressView {
    tasks: HashMap<TaskId, TaskLine>,
}

impl ProgressView {
    pub fn new() -> Self {
        Self::default()
    }

    fn name(&self, id: TaskId) -> &str {
        self.tasks.get(&id).map_or("?", |t| t.name.as_str())
    }

    /// Returns the line to print for `event`, if any.
    pub fn apply(&mut self, event: &BatchEvent) -> Option<String> {
        match event {
            BatchEvent::Admitted { task_id, name } => {
                self.tasks.insert(
                    *task_id,
                    TaskLine {
                        name: name.clone(),
                        speed: SpeedCalculator::new(None, None),
                        last_sent: 0,
                    },
                );
                Some(format!("{task_id} {name}: queued"))
            }
            BatchEvent::StatusChanged {
                task_id,
                status,
                progress,
            } => {
                // Terminal states are reported by Completed/Failed.
                if status.is_terminal() {
                    return None;
                }
                if *status == TaskStatus::Transferring
                    && let Some(line) = self.tasks.get_mut(task_id)
                {
                    line.speed.reset();
                    line.last_sent = 0;
                }
                Some(format!("{task_id} {}: {status} ({progress}%)", self.name(*task_id)))
            }
            BatchEvent::Progress {
                task_id,
                sent,
                total,
                progress,
            } => {
                let line = self.tasks.get_mut(task_id)?;
                line.speed.add_sample(sent.saturating_sub(line.last_sent));
                line.last_sent = *sent;

                let mut out = format!(
                    "{task_id} {}: {progress}% {}/{}",
                    line.name,
                    format_bytes(*sent as f64),
                    format_bytes(*total as f64)
                );
                let speed = line.speed.bytes_per_second();
                if speed > 0.0 {
                    let _ = write!(out, " {}/s", format_bytes(speed));
                }
                if let Some(eta) = line.speed.eta(total.saturating_sub(*sent)) {
                    let _ = write!(out, " ETA {}", format_eta(eta));
                }
                Some(out)
            }
            BatchEvent::Completed {
                task_id,
                evidence_id,
                digest,
            } => Some(format!(
                "{task_id} {}: done, evidence {evidence_id}, sha256 {}",
                self.name(*task_id),
                digest.as_deref().unwrap_or("-")
            )),
            BatchEvent::Failed { task_id, error } => {
                Some(format!("{task_id} {}: error: {error}", self.name(*task_id)))
            }
            BatchEvent::AllTerminal { done, failed } => {
                Some(format!("{done} uploaded, {failed} failed"))
            }
        }
    }
}

/// One line per task for the final report.
pub fn task_table(tasks: &[UploadTask]) -> String {
    let mut out = String::new();
    for task in tasks {
        let _ = write!(
            out,
            "{:<5} {:<12} {:>3}%  {}",
            task.id().to_string(),
            task.status().as_str(),
            task.progress(),
            task.display_name()
        );
        if let Some(digest) = task.local_digest() {
            let _ = write!(out, "  sha256:{digest}");
        }
        if let Some(error) = task.error_message() {
            let _ = write!(out, "  ({error})");
        }
        out.push('\n');
    }
    out
}

/// Renders notifications that stay until dismissed.
pub fn persistent_notices(notices: &[Notification]) -> Vec<String> {
    notices
        .iter()
        .filter(|n| n.is_persistent() && n.kind == NotificationKind::Warning)
        .map(|n| match &n.message {
            Some(message) => format!("warning: {}: {message}", n.title),
            None => format!("warning: {}", n.title),
        })
        .collect()
}

fn flag(valid: bool) -> &'static str {
    if valid { "valid" } else { "INVALID" }
}

pub fn verification_report(result: &ManifestVerification) -> String {
    let mut out = format!(
        "manifest sha256: {}\nmanifest hmac:   {}\n",
        flag(result.sha256_valid),
        flag(result.hmac_valid)
    );
    if let Some(detail) = &result.detail {
        let _ = writeln!(out, "detail: {detail}");
    }
    out
}

pub fn replay_report(result: &AuditReplayResult) -> String {
    let mut out = format!(
        "case {}: {} events, {} evidence records checked\n",
        result.case_id, result.events_checked, result.evidence_checked
    );
    if result.is_clean() {
        out.push_str("no mismatches\n");
        return out;
    }
    let _ = writeln!(out, "{} mismatch(es):", result.mismatches.len());
    for m in &result.mismatches {
        let _ = write!(
            out,
            "  {}: expected {} got {}",
            m.evidence_id, m.expected_sha256, m.actual_sha256
        );
        if let Some(detail) = &m.detail {
            let _ = write!(out, " ({detail})");
        }
        out.push('\n');
    }
    out
}
