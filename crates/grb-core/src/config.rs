use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{errors::Error, Result};

/// Typed startup configuration, read once from the environment.
#[derive(Clone, Debug)]
pub struct Config {
    pub telegram_bot_token: String,
    /// Initial administrator set. Required, non-empty.
    pub admin_ids: Vec<i64>,
    /// Optional allow-list of group chat ids. Empty means every group is
    /// admitted unless blocked.
    pub allowed_groups: Vec<i64>,
    /// Optional block-list of group chat ids.
    pub blocked_groups: Vec<i64>,
    /// How long an armed reply session stays valid. `None` means no expiry.
    pub pending_ttl: Option<Duration>,

    // Audit logging
    pub audit_log_path: PathBuf,
    pub audit_log_json: bool,
}

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));

        let telegram_bot_token = env_str("TELEGRAM_BOT_TOKEN").unwrap_or_default();
        if telegram_bot_token.trim().is_empty() {
            return Err(Error::Config(
                "TELEGRAM_BOT_TOKEN environment variable is required".to_string(),
            ));
        }

        let admin_ids = parse_csv_i64(env_str("ADMIN_IDS"));
        if admin_ids.is_empty() {
            return Err(Error::Config(
                "ADMIN_IDS environment variable is required (comma-separated user ids)"
                    .to_string(),
            ));
        }

        let allowed_groups = parse_csv_i64(env_str("ALLOWED_GROUPS"));
        let blocked_groups = parse_csv_i64(env_str("BLOCKED_GROUPS"));

        let pending_ttl = env_u64("PENDING_TTL_SECS").map(Duration::from_secs);

        let audit_log_path =
            PathBuf::from(env_str("AUDIT_LOG_PATH").unwrap_or("/tmp/grb-audit.log".to_string()));
        let audit_log_json = env_bool("AUDIT_LOG_JSON").unwrap_or(false);

        Ok(Self {
            telegram_bot_token,
            admin_ids,
            allowed_groups,
            blocked_groups,
            pending_ttl,
            audit_log_path,
            audit_log_json,
        })
    }
}

fn env_str(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn env_bool(key: &str) -> Option<bool> {
    env_str(key).map(|s| {
        matches!(
            s.trim().to_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        )
    })
}

fn env_u64(key: &str) -> Option<u64> {
    env_str(key).and_then(|s| s.trim().parse::<u64>().ok())
}

fn parse_csv_i64(v: Option<String>) -> Vec<i64> {
    v.unwrap_or_default()
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .filter_map(|s| s.parse::<i64>().ok())
        .collect()
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }
        if env::var_os(key).is_some() {
            continue; // do not override existing env
        }

        let mut val = v.trim().to_string();
        // Strip optional surrounding quotes.
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        env::set_var(key, val);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_parsing_skips_blanks_and_junk() {
        let ids = parse_csv_i64(Some("1, 2,,  -100500 ,abc,3".to_string()));
        assert_eq!(ids, vec![1, 2, -100500, 3]);
    }

    #[test]
    fn csv_parsing_handles_none() {
        assert!(parse_csv_i64(None).is_empty());
        assert!(parse_csv_i64(Some("".to_string())).is_empty());
    }
}
