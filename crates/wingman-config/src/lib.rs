//! Working-directory layout and settings for the coupon issuer.
//!
//! Every installation lives in one directory holding `config.toml`, the
//! coupon spreadsheet, the issued-coupon ledger, and the cron log. This
//! crate resolves those paths and loads/saves the settings file, with
//! `COUPANG_*` environment variables taking precedence over the file.

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Toml},
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;
use uuid::Uuid;

/// Name of the settings file inside a working directory.
pub const CONFIG_FILE: &str = "config.toml";
/// Name of the coupon spreadsheet the operator maintains.
pub const SHEET_FILE: &str = "coupons.xlsx";
/// Name of the issued-coupon ledger.
pub const LEDGER_FILE: &str = "issued_coupons.json";
/// Name of the log file scheduled runs append to.
pub const LOG_FILE: &str = "issuer.log";

/// Upper bound for the random start delay, in minutes (24 hours).
pub const MAX_JITTER_MINUTES: u32 = 1440;

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no settings found at {path} (run `wingman install` first)")]
    NotInstalled { path: PathBuf },

    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("failed to serialize settings: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("settings loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── Working directory ───────────────────────────────────────────────

/// One installation's directory. Purely path arithmetic; nothing here
/// touches the filesystem except [`WorkDir::ensure`].
#[derive(Debug, Clone)]
pub struct WorkDir {
    root: PathBuf,
}

impl WorkDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_file(&self) -> PathBuf {
        self.root.join(CONFIG_FILE)
    }

    pub fn sheet_file(&self) -> PathBuf {
        self.root.join(SHEET_FILE)
    }

    pub fn ledger_file(&self) -> PathBuf {
        self.root.join(LEDGER_FILE)
    }

    pub fn log_file(&self) -> PathBuf {
        self.root.join(LOG_FILE)
    }

    /// Create the directory (and parents) if it does not exist yet.
    pub fn ensure(&self) -> Result<(), ConfigError> {
        std::fs::create_dir_all(&self.root)?;
        Ok(())
    }
}

// ── Settings ────────────────────────────────────────────────────────

/// Contents of `config.toml`, plus `COUPANG_*` environment overrides.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    /// Open API access key, from the WING developer console.
    pub access_key: String,

    /// Open API secret key. Wrapped so it never leaks through Debug
    /// output; serialized in clear because the file is the secret store.
    #[serde(serialize_with = "expose")]
    pub secret_key: SecretString,

    /// WING login id, injected into marketplace payloads.
    pub user_id: String,

    /// Seller's vendor id (e.g. `A00012345`), baked into FMS paths.
    pub vendor_id: String,

    /// Gateway override, mainly for testing against a mock server.
    pub base_url: Option<String>,

    /// Identifies this installation's crontab entry so reinstalls and
    /// uninstalls only touch their own line.
    pub installation_id: Option<Uuid>,

    /// Upper bound for the random delay before a scheduled run, in
    /// minutes. Absent or zero means no delay.
    pub jitter_max_minutes: Option<u32>,
}

fn expose<S: Serializer>(secret: &SecretString, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(secret.expose_secret())
}

impl Settings {
    /// Load settings for a working directory: `config.toml` first, then
    /// `COUPANG_*` environment variables on top.
    pub fn load(dir: &WorkDir) -> Result<Self, ConfigError> {
        let path = dir.config_file();
        let has_env_overrides = Env::prefixed("COUPANG_").iter().next().is_some();
        if !path.exists() && !has_env_overrides {
            return Err(ConfigError::NotInstalled { path });
        }

        let settings: Self = Figment::new()
            .merge(Toml::file(&path))
            .merge(Env::prefixed("COUPANG_"))
            .extract()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Write `config.toml`, restricting it to the owner on Unix since it
    /// holds the API secret.
    pub fn save(&self, dir: &WorkDir) -> Result<(), ConfigError> {
        self.validate()?;
        dir.ensure()?;

        let path = dir.config_file();
        std::fs::write(&path, toml::to_string_pretty(self)?)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o600))?;
        }

        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("access_key", &self.access_key),
            ("user_id", &self.user_id),
            ("vendor_id", &self.vendor_id),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::Validation {
                    field: field.into(),
                    reason: "must not be empty".into(),
                });
            }
        }
        if self.secret_key.expose_secret().trim().is_empty() {
            return Err(ConfigError::Validation {
                field: "secret_key".into(),
                reason: "must not be empty".into(),
            });
        }
        if let Some(minutes) = self.jitter_max_minutes {
            validate_jitter(minutes)?;
        }
        Ok(())
    }
}

/// Shared bound check for the jitter flag and the stored setting.
pub fn validate_jitter(minutes: u32) -> Result<(), ConfigError> {
    if minutes > MAX_JITTER_MINUTES {
        return Err(ConfigError::Validation {
            field: "jitter_max_minutes".into(),
            reason: format!("must be between 0 and {MAX_JITTER_MINUTES}, got {minutes}"),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn settings() -> Settings {
        Settings {
            access_key: "ak".into(),
            secret_key: SecretString::from("sk"),
            user_id: "wing".into(),
            vendor_id: "A00012345".into(),
            base_url: None,
            installation_id: Some(Uuid::nil()),
            jitter_max_minutes: Some(30),
        }
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().expect("tempdir");
        let work = WorkDir::new(dir.path().join("coupons"));

        settings().save(&work).expect("save");
        let loaded = Settings::load(&work).expect("load");

        assert_eq!(loaded.access_key, "ak");
        assert_eq!(loaded.secret_key.expose_secret(), "sk");
        assert_eq!(loaded.vendor_id, "A00012345");
        assert_eq!(loaded.installation_id, Some(Uuid::nil()));
        assert_eq!(loaded.jitter_max_minutes, Some(30));
    }

    #[cfg(unix)]
    #[test]
    fn config_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().expect("tempdir");
        let work = WorkDir::new(dir.path());
        settings().save(&work).expect("save");

        let mode = std::fs::metadata(work.config_file())
            .expect("metadata")
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn missing_directory_reports_not_installed() {
        let dir = tempfile::tempdir().expect("tempdir");
        let work = WorkDir::new(dir.path().join("nowhere"));

        let err = Settings::load(&work).expect_err("should fail");
        assert!(matches!(err, ConfigError::NotInstalled { .. }));
    }

    #[test]
    fn out_of_range_jitter_is_rejected() {
        let mut bad = settings();
        bad.jitter_max_minutes = Some(MAX_JITTER_MINUTES + 1);
        assert!(matches!(
            bad.validate(),
            Err(ConfigError::Validation { field, .. }) if field == "jitter_max_minutes"
        ));
    }

    #[test]
    fn empty_credentials_are_rejected() {
        let mut bad = settings();
        bad.access_key = "  ".into();
        assert!(matches!(
            bad.validate(),
            Err(ConfigError::Validation { field, .. }) if field == "access_key"
        ));
    }

    #[test]
    fn work_dir_paths_hang_off_the_root() {
        let work = WorkDir::new("/tmp/coupons");
        assert_eq!(work.config_file(), PathBuf::from("/tmp/coupons/config.toml"));
        assert_eq!(work.sheet_file(), PathBuf::from("/tmp/coupons/coupons.xlsx"));
        assert_eq!(
            work.ledger_file(),
            PathBuf::from("/tmp/coupons/issued_coupons.json")
        );
        assert_eq!(work.log_file(), PathBuf::from("/tmp/coupons/issuer.log"));
    }
}
