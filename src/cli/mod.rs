//! CLI argument parsing and command dispatch.

pub mod admin;
pub mod args;
pub mod context;
pub mod license;
pub mod print;
pub mod records;
pub mod session;

pub use args::{Cli, Commands, OutputFormat};
pub use context::Context;

use crate::error::Result;
use crate::storage::ResolvedConfig;

/// Run one parsed command line and return what should be printed.
///
/// # Errors
/// Returns configuration, validation and backend errors.
pub async fn run(cli: Cli) -> Result<String> {
    let config = ResolvedConfig::resolve(&cli)?;
    execute(cli.command, config).await
}

/// Run `command` against an already resolved configuration.
///
/// # Errors
/// As [`run`].
pub async fn execute(command: Commands, config: ResolvedConfig) -> Result<String> {
    let ctx = Context::new(config)?;
    tracing::debug!(base_url = %ctx.config.base_url, "dispatching command");

    match command {
        Commands::Login(args) => session::login(&ctx, args.value),
        Commands::Logout => session::logout(&ctx),
        Commands::Config(args) => session::show_config(&ctx, &args),
        Commands::License(cmd) => license::execute(&ctx, cmd).await,
        Commands::Kategorije(cmd) => records::kategorije(&ctx, cmd).await,
        Commands::Predmeti(cmd) => records::predmeti(&ctx, cmd).await,
        Commands::Lica(cmd) => records::lica(&ctx, cmd).await,
        Commands::Users(cmd) => admin::users(&ctx, cmd).await,
        Commands::Routes(cmd) => admin::routes(&ctx, cmd).await,
        Commands::Print(args) => print::execute(&ctx, &args).await,
    }
}
