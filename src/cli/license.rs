//! `license` subcommands.

use super::Context;
use super::args::LicenseCommand;
use crate::core::models::NewGlobalLicense;
use crate::error::Result;
use crate::render::human;

/// Execute a license subcommand.
///
/// # Errors
/// Propagates validation and backend errors. `status` only fails under the
/// throw policy.
pub async fn execute(ctx: &Context, cmd: LicenseCommand) -> Result<String> {
    let license = ctx.backend.license();
    let out = &ctx.output;

    match cmd {
        LicenseCommand::Status => {
            let info = license.check_global_license_status().await?;
            out.render("license status", &info, human::render_license_info)
        }
        LicenseCommand::Check => {
            let check = license.check_global_license().await?;
            out.render("license check", &check, human::render_license_check)
        }
        LicenseCommand::Active => {
            let active = license.get_active_global_license().await?;
            out.render("license active", &active, human::render_active_license)
        }
        LicenseCommand::Create { key, start, end } => {
            let created = license
                .create(&NewGlobalLicense {
                    license_key: key,
                    start_date: start,
                    end_date: end,
                })
                .await?;
            out.render("license create", &created, |_, color| {
                human::render_done("Globalna licenca je kreirana.", color)
            })
        }
        LicenseCommand::Extend { end } => {
            let extended = license.extend(end).await?;
            out.render("license extend", &extended, |_, color| {
                human::render_done("Globalna licenca je produžena.", color)
            })
        }
        LicenseCommand::DeactivateExpired => {
            let result = license.deactivate_expired().await?;
            out.render("license deactivate-expired", &result, |_, color| {
                human::render_done("Istekle licence su deaktivirane.", color)
            })
        }
    }
}
