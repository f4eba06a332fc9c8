#![forbid(unsafe_code)]

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

/// Best-effort session record for diagnosing transport issues without
/// logging request bodies. Rewritten on every update; losing it is fine.
#[derive(Clone, Debug)]
pub(crate) struct SessionLog {
    path: PathBuf,
    start_rfc3339: String,
    pid: u32,
    ops: u64,
    last_op: Option<String>,
    last_error: Option<String>,
    integrity_alert: Option<String>,
}

impl SessionLog {
    pub(crate) fn new(storage_dir: &Path) -> Self {
        Self {
            path: storage_dir.join("lotrace_api_last_session.txt"),
            start_rfc3339: super::ts_ms_to_rfc3339(super::now_ms_i64()),
            pid: std::process::id(),
            ops: 0,
            last_op: None,
            last_error: None,
            integrity_alert: None,
        }
    }

    pub(crate) fn record_op(&mut self, op: &str) {
        self.ops += 1;
        self.last_op = Some(op.to_string());
        self.write();
    }

    pub(crate) fn record_error(&mut self, code: &str, message: &str) {
        self.last_error = Some(format!("{code}: {message}"));
        self.write();
    }

    /// Depth-cap hits mean the no-cycle invariant broke upstream. They are
    /// kept in a dedicated slot so one later error cannot scroll them away.
    pub(crate) fn record_integrity_alert(&mut self, detail: &str) {
        self.integrity_alert = Some(detail.to_string());
        self.write();
    }

    fn write(&self) {
        let mut out = String::new();
        let _ = writeln!(out, "start={}", self.start_rfc3339);
        let _ = writeln!(out, "pid={}", self.pid);
        let _ = writeln!(out, "ops={}", self.ops);
        if let Some(last_op) = &self.last_op {
            let _ = writeln!(out, "last_op={last_op}");
        }
        if let Some(last_error) = &self.last_error {
            let _ = writeln!(out, "last_error={last_error}");
        }
        if let Some(alert) = &self.integrity_alert {
            let _ = writeln!(out, "integrity_alert={alert}");
        }
        let _ = std::fs::write(&self.path, out);
    }
}
