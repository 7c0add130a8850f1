//! `wingman install` -- set up a working directory and schedule the
//! daily issuance run.
//!
//! Re-running install on an existing directory updates the stored
//! settings and replaces the crontab line in place; credentials already
//! on file are kept unless new ones are given.

use dialoguer::Input;
use owo_colors::OwoColorize;
use secrecy::{ExposeSecret, SecretString};
use uuid::Uuid;

use wingman_config::{SHEET_FILE, Settings, WorkDir, validate_jitter};

use crate::cli::{GlobalOpts, InstallArgs};
use crate::cron;
use crate::error::CliError;

pub fn handle(args: &InstallArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let work = WorkDir::new(&args.dir);
    work.ensure()?;

    let existing = if work.config_file().exists() {
        Settings::load(&work).ok()
    } else {
        None
    };

    let jitter_max = args
        .jitter_max
        .or(existing.as_ref().and_then(|s| s.jitter_max_minutes));
    if let Some(minutes) = jitter_max {
        validate_jitter(minutes)?;
    }

    let settings = Settings {
        access_key: resolve(
            args.access_key.clone(),
            existing.as_ref().map(|s| s.access_key.clone()),
            "access key",
            "access-key",
            global.yes,
        )?,
        secret_key: resolve_secret(args.secret_key.clone(), existing.as_ref(), global.yes)?,
        user_id: resolve(
            args.user_id.clone(),
            existing.as_ref().map(|s| s.user_id.clone()),
            "WING user id",
            "user-id",
            global.yes,
        )?,
        vendor_id: resolve(
            args.vendor_id.clone(),
            existing.as_ref().map(|s| s.vendor_id.clone()),
            "vendor id",
            "vendor-id",
            global.yes,
        )?,
        base_url: existing.as_ref().and_then(|s| s.base_url.clone()),
        // Fresh id per install; the previous id's crontab line is removed
        // below so reinstalls never leave two entries behind.
        installation_id: Some(Uuid::new_v4()),
        jitter_max_minutes: jitter_max,
    };
    settings.save(&work)?;

    if let Some(old_id) = existing.as_ref().and_then(|s| s.installation_id) {
        cron::remove_entry(old_id)?;
    }

    // The crontab line needs stable absolute paths; relative ones would
    // resolve against cron's working directory.
    let dir = std::fs::canonicalize(work.root())?;
    let exe = std::env::current_exe()?;
    let id = settings.installation_id.unwrap_or_else(Uuid::new_v4);
    cron::install_entry(&exe, &dir, jitter_max, id)?;

    if !global.quiet {
        println!(
            "{} daily issuance scheduled for {}",
            "ok:".green().bold(),
            dir.display()
        );
        println!("Put your coupon spreadsheet at {}", dir.join(SHEET_FILE).display());
        println!("Check it anytime with: wingman verify {}", dir.display());
    }
    Ok(())
}

/// Flag value, then the stored value, then a prompt. With --yes a missing
/// value is an error instead of a prompt.
fn resolve(
    flag_value: Option<String>,
    stored: Option<String>,
    field: &str,
    flag: &str,
    non_interactive: bool,
) -> Result<String, CliError> {
    if let Some(value) = flag_value.or(stored) {
        return Ok(value);
    }
    if non_interactive {
        return Err(CliError::NonInteractiveMissing {
            field: field.into(),
            flag: flag.into(),
        });
    }
    Ok(Input::<String>::new()
        .with_prompt(format!("Coupang {field}"))
        .interact_text()?)
}

/// Same chain as [`resolve`] but the prompt hides its input.
fn resolve_secret(
    flag_value: Option<String>,
    existing: Option<&Settings>,
    non_interactive: bool,
) -> Result<SecretString, CliError> {
    if let Some(value) = flag_value {
        return Ok(SecretString::from(value));
    }
    if let Some(settings) = existing {
        if !settings.secret_key.expose_secret().is_empty() {
            return Ok(settings.secret_key.clone());
        }
    }
    if non_interactive {
        return Err(CliError::NonInteractiveMissing {
            field: "secret key".into(),
            flag: "secret-key".into(),
        });
    }
    let secret = rpassword::prompt_password("Coupang secret key: ")?;
    Ok(SecretString::from(secret))
}
