//! `wingman verify` -- parse and validate the spreadsheet, issue nothing.

use owo_colors::OwoColorize;
use wingman_config::WorkDir;
use wingman_core::sheet;

use crate::cli::{GlobalOpts, VerifyArgs};
use crate::error::CliError;
use crate::output;

use super::CouponRow;

pub fn handle(args: &VerifyArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let work = WorkDir::new(&args.dir);
    let coupons = sheet::read_coupons(&work.sheet_file())?;

    let out = output::render_list(global.output, &coupons, |c| CouponRow::from(c), |c| {
        c.name.clone()
    });
    output::print_output(&out, global.quiet);

    if !global.quiet {
        println!(
            "{} {} coupon(s) ready to issue",
            "ok:".green().bold(),
            coupons.len()
        );
    }
    Ok(())
}
