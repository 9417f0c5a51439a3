//! CLI argument definitions using clap.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::core::models::TemplateKind;
use crate::services::DocumentKind;

/// EUK console - cases, beneficiaries, users and document printing.
#[derive(Parser, Debug)]
#[command(name = "euk")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    // === Global flags ===
    /// Output format
    #[arg(long, value_enum, default_value = "human", global = true)]
    pub format: OutputFormat,

    /// Shorthand for --format json
    #[arg(long, global = true)]
    pub json: bool,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Bearer token (overrides EUK_TOKEN and the saved session)
    #[arg(long, value_name = "TOKEN", global = true)]
    pub token: Option<String>,

    /// Backend base URL (overrides EUK_API_URL and the config file)
    #[arg(long, value_name = "URL", global = true)]
    pub api_url: Option<String>,

    /// Backend environment
    #[arg(long = "env", value_enum, value_name = "ENV", global = true)]
    pub environment: Option<EnvironmentArg>,

    /// Request timeout in seconds
    #[arg(long, value_name = "SECONDS", global = true)]
    pub timeout: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Log format (human, json, compact)
    #[arg(long, value_name = "FORMAT", global = true)]
    pub log_format: Option<String>,

    /// Verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

impl Cli {
    /// Resolve the effective output format.
    #[must_use]
    pub fn effective_format(&self) -> OutputFormat {
        if self.json {
            OutputFormat::Json
        } else {
            self.format
        }
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Save a bearer token for later commands
    Login(LoginArgs),

    /// Remove the saved token
    Logout,

    /// Global license status and administration
    #[command(subcommand)]
    License(LicenseCommand),

    /// Case categories
    #[command(subcommand)]
    Kategorije(KategorijeCommand),

    /// Cases
    #[command(subcommand)]
    Predmeti(PredmetiCommand),

    /// Beneficiaries (T1/T2)
    #[command(subcommand)]
    Lica(LicaCommand),

    /// User administration
    #[command(subcommand)]
    Users(UsersCommand),

    /// Route catalog and per-user route grants
    #[command(subcommand)]
    Routes(RoutesCommand),

    /// Generate envelope or register PDFs
    Print(PrintArgs),

    /// Show the resolved configuration
    Config(ConfigArgs),
}

/// Arguments for the `login` command.
#[derive(Args, Debug)]
pub struct LoginArgs {
    /// Token to save (defaults to --token)
    #[arg(value_name = "TOKEN")]
    pub value: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum LicenseCommand {
    /// License status (falls back to a valid license when the backend is down)
    Status,
    /// Strict validity check
    Check,
    /// The active license record
    Active,
    /// Create the global license
    Create {
        #[arg(long)]
        key: String,
        /// RFC 3339 start date
        #[arg(long)]
        start: DateTime<Utc>,
        /// RFC 3339 end date
        #[arg(long)]
        end: DateTime<Utc>,
    },
    /// Move the end date of the active license
    Extend {
        /// RFC 3339 end date
        #[arg(long)]
        end: DateTime<Utc>,
    },
    /// Deactivate expired licenses
    DeactivateExpired,
}

#[derive(Subcommand, Debug)]
pub enum KategorijeCommand {
    List,
    Create {
        naziv: String,
    },
    Update {
        id: i64,
        naziv: String,
    },
    Delete {
        id: i64,
    },
}

#[derive(Subcommand, Debug)]
pub enum PredmetiCommand {
    List {
        #[arg(long, default_value_t = 0)]
        page: u32,
        #[arg(long, default_value_t = 20)]
        size: u32,
        #[arg(long)]
        status: Option<String>,
        #[arg(long)]
        prioritet: Option<String>,
        #[arg(long = "kategorija")]
        kategorija_id: Option<i64>,
        #[arg(long)]
        search: Option<String>,
    },
    Get {
        id: i64,
    },
    Delete {
        id: i64,
    },
}

#[derive(Subcommand, Debug)]
pub enum LicaCommand {
    List {
        #[arg(long, value_enum, default_value = "t1")]
        schema: SchemaArg,
        #[arg(long, default_value_t = 0)]
        page: u32,
        #[arg(long, default_value_t = 50)]
        size: u32,
    },
    Get {
        #[arg(long, value_enum, default_value = "t1")]
        schema: SchemaArg,
        id: i64,
    },
    Delete {
        #[arg(long, value_enum, default_value = "t1")]
        schema: SchemaArg,
        id: i64,
    },
    /// Filtered T1 search
    Search(SearchArgs),
    /// Number of T2 records
    Count,
}

#[derive(Args, Debug, Default)]
pub struct SearchArgs {
    #[arg(long)]
    pub ime: Option<String>,
    #[arg(long)]
    pub prezime: Option<String>,
    #[arg(long)]
    pub jmbg: Option<String>,
    #[arg(long)]
    pub grad_opstina: Option<String>,
    #[arg(long)]
    pub osnov_statusa: Option<String>,
    #[arg(long)]
    pub ed_broj: Option<String>,
    #[arg(long, default_value_t = 0)]
    pub page: u32,
    #[arg(long, default_value_t = 50)]
    pub size: u32,
}

#[derive(Subcommand, Debug)]
pub enum UsersCommand {
    List {
        #[arg(long, default_value_t = 0)]
        page: u32,
        #[arg(long, default_value_t = 20)]
        size: u32,
        #[arg(long)]
        role: Option<String>,
        #[arg(long)]
        active: Option<bool>,
        #[arg(long)]
        search: Option<String>,
    },
    Approve {
        id: i64,
    },
    Reject {
        id: i64,
    },
    Delete {
        id: i64,
    },
    SetRole {
        id: i64,
        role: String,
    },
    SetLevel {
        id: i64,
        #[arg(value_parser = clap::value_parser!(u8).range(1..=5))]
        level: u8,
    },
}

#[derive(Subcommand, Debug)]
pub enum RoutesCommand {
    /// The route catalog
    List,
    /// Assigned and available routes for a user
    Assignments {
        #[arg(long)]
        user: i64,
    },
    Assign {
        #[arg(long)]
        user: i64,
        #[arg(long)]
        route: i64,
        #[arg(long, default_value_t = crate::services::routes::DEFAULT_GRANT_LEVEL)]
        level: u8,
    },
    SetLevel {
        #[arg(long)]
        user: i64,
        #[arg(long)]
        route: i64,
        #[arg(long)]
        level: u8,
    },
    Revoke {
        #[arg(long)]
        user: i64,
        #[arg(long)]
        route: i64,
    },
    /// Whether a user may open a route
    Check {
        #[arg(long)]
        user: i64,
        #[arg(long)]
        route: i64,
    },
}

/// Arguments for the `print` command.
#[derive(Args, Debug)]
pub struct PrintArgs {
    #[arg(long, value_enum)]
    pub template: SchemaArg,

    #[arg(long, value_enum, default_value = "front")]
    pub kind: PrintKind,

    /// JSON file with an array of beneficiary records
    #[arg(long, value_name = "FILE")]
    pub input: PathBuf,

    /// Output directory
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub out: PathBuf,
}

/// Arguments for the `config` command.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Write a default config file if none exists
    #[arg(long)]
    pub init: bool,
}

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable tables
    #[default]
    Human,
    /// JSON output
    Json,
}

/// Backend environment selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EnvironmentArg {
    Development,
    Production,
}

/// Beneficiary schema selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SchemaArg {
    T1,
    T2,
}

impl From<SchemaArg> for TemplateKind {
    fn from(schema: SchemaArg) -> Self {
        match schema {
            SchemaArg::T1 => Self::T1,
            SchemaArg::T2 => Self::T2,
        }
    }
}

/// Which document `print` generates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PrintKind {
    /// Envelope front side
    Front,
    /// Envelope back side
    Back,
    /// Delivery register
    Register,
}

impl From<PrintKind> for DocumentKind {
    fn from(kind: PrintKind) -> Self {
        match kind {
            PrintKind::Front => Self::EnvelopeFront,
            PrintKind::Back => Self::EnvelopeBack,
            PrintKind::Register => Self::Register,
        }
    }
}
