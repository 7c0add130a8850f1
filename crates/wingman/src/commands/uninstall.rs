//! `wingman uninstall` -- remove this installation's scheduled run.
//!
//! Removes the crontab line and the credentials file. The spreadsheet,
//! ledger, and log stay so the operator can reinstall or audit past runs.

use owo_colors::OwoColorize;

use wingman_config::{Settings, WorkDir};

use crate::cli::{GlobalOpts, UninstallArgs};
use crate::cron;
use crate::error::CliError;

pub fn handle(args: &UninstallArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let work = WorkDir::new(&args.dir);

    let Ok(settings) = Settings::load(&work) else {
        if !global.quiet {
            println!(
                "{} no installation found at {}, nothing to remove",
                "warning:".yellow().bold(),
                work.root().display()
            );
        }
        return Ok(());
    };

    match settings.installation_id {
        Some(id) => {
            let removed = cron::remove_entry(id)?;
            if !global.quiet {
                if removed == 0 {
                    println!(
                        "{} no scheduled run was registered for this installation",
                        "warning:".yellow().bold()
                    );
                } else {
                    println!("{} scheduled run removed", "ok:".green().bold());
                }
            }
        }
        None => {
            if !global.quiet {
                println!(
                    "{} settings at {} have no installation id; the crontab was left alone",
                    "warning:".yellow().bold(),
                    work.root().display()
                );
            }
        }
    }

    if work.config_file().exists() {
        std::fs::remove_file(work.config_file())?;
    }
    if !global.quiet {
        println!(
            "Credentials removed; the spreadsheet and issued-coupon ledger were kept at {}",
            work.root().display()
        );
    }
    Ok(())
}
