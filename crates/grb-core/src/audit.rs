use std::{
    fs::OpenOptions,
    io::Write,
    path::{Path, PathBuf},
};

use chrono::Utc;
use serde::Serialize;

use crate::{errors::Error, formatting::truncate_text, relay::forward::FanOut, Result};

const AUDIT_MAX_TEXT: usize = 500;

/// One line of relay activity: a fan-out, a dispatched reply, a control
/// activation, or an administrator command.
#[derive(Clone, Debug, Serialize)]
pub struct AuditEvent {
    pub timestamp: String,
    pub event: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub chat_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivered: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed: Option<usize>,
}

impl AuditEvent {
    fn base(event: &str) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            event: event.to_string(),
            chat_id: None,
            user_id: None,
            username: None,
            message_type: None,
            content: None,
            target: None,
            delivered: None,
            failed: None,
        }
    }

    /// A group message fanned out to the administrators.
    pub fn group_relay(chat_id: i64, sender: Option<i64>, kind: &str, report: FanOut) -> Self {
        let mut ev = Self::base("group_relay");
        ev.chat_id = Some(chat_id);
        ev.user_id = sender;
        ev.message_type = Some(kind.to_string());
        ev.delivered = Some(report.delivered);
        ev.failed = Some(report.failed);
        ev
    }

    /// A private message from an ordinary user fanned out to the administrators.
    pub fn private_relay(user_id: i64, username: &str, kind: &str, report: FanOut) -> Self {
        let mut ev = Self::base("private_relay");
        ev.user_id = Some(user_id);
        ev.username = Some(username.to_string());
        ev.message_type = Some(kind.to_string());
        ev.delivered = Some(report.delivered);
        ev.failed = Some(report.failed);
        ev
    }

    /// An administrator's reply consumed by the dispatcher.
    pub fn admin_reply(user_id: i64, kind: &str, target: &str) -> Self {
        let mut ev = Self::base("admin_reply");
        ev.user_id = Some(user_id);
        ev.message_type = Some(kind.to_string());
        ev.target = Some(target.to_string());
        ev
    }

    /// A control button activation (raw payload recorded as content).
    pub fn control(user_id: i64, payload: &str) -> Self {
        let mut ev = Self::base("control");
        ev.user_id = Some(user_id);
        ev.content = Some(payload.to_string());
        ev
    }

    /// An administrator command.
    pub fn command(user_id: i64, command: &str, args: &str) -> Self {
        let mut ev = Self::base("command");
        ev.user_id = Some(user_id);
        ev.message_type = Some(command.to_string());
        ev.content = Some(args.to_string());
        ev
    }
}

/// Append-only audit trail. Write failures are the caller's to log; they are
/// never fatal to the relay itself.
#[derive(Clone, Debug)]
pub struct AuditLogger {
    path: PathBuf,
    json: bool,
}

impl AuditLogger {
    pub fn new(path: impl Into<PathBuf>, json: bool) -> Self {
        Self {
            path: path.into(),
            json,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn write(&self, mut event: AuditEvent) -> Result<()> {
        if let Some(s) = &event.content {
            event.content = Some(truncate_text(s, AUDIT_MAX_TEXT));
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        if self.json {
            let line = serde_json::to_string(&event)?;
            writeln!(file, "{line}")?;
            return Ok(());
        }

        // Plain text format for readability.
        let mut out = String::new();
        out.push('\n');
        out.push_str(&"=".repeat(60));

        let value = serde_json::to_value(&event)?;
        let Some(obj) = value.as_object() else {
            return Err(Error::Transport(
                "audit event is not a JSON object".to_string(),
            ));
        };
        for (k, v) in obj {
            out.push('\n');
            out.push_str(k);
            out.push_str(": ");
            out.push_str(&json_value_to_display(v));
        }
        out.push('\n');

        file.write_all(out.as_bytes())?;
        Ok(())
    }
}

fn json_value_to_display(v: &serde_json::Value) -> String {
    match v {
        serde_json::Value::Null => "null".to_string(),
        serde_json::Value::Bool(b) => b.to_string(),
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::String(s) => s.to_string(),
        other => serde_json::to_string(other).unwrap_or_else(|_| "<unprintable>".to_string()),
    }
}
