//! `wingman issue` -- expire the previous batch and issue a fresh one.
//!
//! Per-coupon failures are reported but do not fail the process: a
//! scheduled run that issues eight of ten coupons should not look like a
//! crashed run to cron.

use owo_colors::OwoColorize;
use tabled::Tabled;

use wingman_api::{DEFAULT_BASE_URL, Keypair, OpenApiClient, TransportConfig};
use wingman_config::{Settings, WorkDir, validate_jitter};
use wingman_core::{CouponResult, Issuer, Ledger, PollPolicy, sheet};

use crate::cli::{GlobalOpts, IssueArgs, OutputFormat};
use crate::error::CliError;
use crate::{jitter, output};

use super::CouponRow;

// ── Result table row ─────────────────────────────────────────────────

#[derive(Tabled)]
struct ResultRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Detail")]
    detail: String,
}

impl From<&CouponResult> for ResultRow {
    fn from(result: &CouponResult) -> Self {
        Self {
            name: result.name.clone(),
            kind: result.kind.label().into(),
            status: if result.success { "issued" } else { "FAILED" }.into(),
            detail: result.message.clone(),
        }
    }
}

// ── Handler ──────────────────────────────────────────────────────────

pub async fn handle(args: &IssueArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let work = WorkDir::new(&args.dir);
    let settings = Settings::load(&work)?;

    // Flag beats stored setting; both share the same bound.
    let jitter_max = args
        .jitter_max
        .or(settings.jitter_max_minutes)
        .unwrap_or(0);
    validate_jitter(jitter_max)?;
    jitter::delay(jitter_max).await;

    let coupons = sheet::read_coupons(&work.sheet_file())?;

    if !global.quiet && global.output == OutputFormat::Table && !coupons.is_empty() {
        let preview =
            output::render_list(global.output, &coupons, |c| CouponRow::from(c), |c| {
                c.name.clone()
            });
        output::print_output(&preview, global.quiet);
    }

    // Runs even with an empty batch: the previous run's download coupons
    // must still be expired and the ledger cleared.
    let issuer = build_issuer(&settings, &work)?;
    let summary = issuer.issue_all(&coupons).await?;

    if coupons.is_empty() {
        output::print_output(
            "previous batch expired; the spreadsheet has no data rows to issue",
            global.quiet,
        );
        return Ok(());
    }

    let out = output::render_list(
        global.output,
        &summary.results,
        |r| ResultRow::from(r),
        |r| format!("{}\t{}", r.name, if r.success { "issued" } else { "failed" }),
    );
    output::print_output(&out, global.quiet);

    if !global.quiet {
        let failed = summary.failed();
        if failed == 0 {
            println!("{} all {} coupon(s) issued", "ok:".green().bold(), summary.succeeded());
        } else {
            println!(
                "{} {} issued, {} failed (see details above)",
                "warning:".yellow().bold(),
                summary.succeeded(),
                failed
            );
        }
    }
    Ok(())
}

fn build_issuer(settings: &Settings, work: &WorkDir) -> Result<Issuer, CliError> {
    let keypair = Keypair::new(settings.access_key.clone(), settings.secret_key.clone());
    let client = OpenApiClient::new(
        settings.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL),
        keypair,
        settings.vendor_id.clone(),
        settings.user_id.clone(),
        &TransportConfig::default(),
    )?;
    Ok(Issuer::new(
        client,
        Ledger::new(work.ledger_file()),
        PollPolicy::default(),
    ))
}
