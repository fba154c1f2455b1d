//! # leadflow CLI entry point
//!
//! Parses command-line arguments, loads the record set from the configured
//! backend, dispatches to a subcommand handler, and writes the record set
//! back when the command changed it.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use leadflow_cli::backend::{Access, Backend};
use leadflow_cli::case::{run_case, CaseArgs};
use leadflow_cli::comment::{run_comment, CommentArgs};
use leadflow_cli::employee::{run_employee, EmployeeArgs};
use leadflow_cli::lead::{run_lead, LeadArgs};
use leadflow_cli::report::{run_report, ReportArgs, ReportCommand};
use leadflow_cli::Session;
use leadflow_core::EmployeeId;
use leadflow_engine::{EngineConfig, LeadEngine, LeadStore};

/// Lead workflow engine for a loan CRM.
///
/// Takes loan leads from intake through assignment, the verification
/// stages, disbursement and closure, keeping a tamper-evident activity
/// timeline for every lead.
#[derive(Parser, Debug)]
#[command(name = "leadflow", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    log_json: bool,

    /// Snapshot file used when DATABASE_URL is not set.
    #[arg(long, global = true, env = "LEADFLOW_STATE", default_value = "leadflow.json")]
    state: PathBuf,

    /// Employee on whose behalf the command runs; the role comes from the
    /// employee directory.
    #[arg(long, global = true, env = "LEADFLOW_ACTOR")]
    actor: Option<EmployeeId>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Employee directory (add, deactivate, activate, list).
    Employee(EmployeeArgs),

    /// Lead intake and maintenance (add, import, list, show, edit, priority, purge).
    Lead(LeadArgs),

    /// Case workflow (assign, status, amounts, disbursements, close).
    Case(CaseArgs),

    /// Comment thread (add, delete, list).
    Comment(CommentArgs),

    /// Timelines, chain verification, progress, closed cases, workflow table.
    Report(ReportArgs),
}

impl Commands {
    fn mutates(&self) -> bool {
        match self {
            Self::Employee(args) => args.command.mutates(),
            Self::Lead(args) => args.command.mutates(),
            Self::Case(args) => args.command.mutates(),
            Self::Comment(args) => args.command.mutates(),
            Self::Report(_) => false,
        }
    }

    /// Commands that never touch stored records.
    fn is_offline(&self) -> bool {
        matches!(
            self,
            Self::Report(ReportArgs {
                command: ReportCommand::Workflow { .. }
            })
        )
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    if cli.log_json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    }

    tracing::debug!("leadflow CLI v{} starting", env!("CARGO_PKG_VERSION"));

    match run(cli).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            eprintln!("error: {e:#}");
            ExitCode::from(1)
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<u8> {
    let config = EngineConfig::from_env().context("invalid engine configuration")?;

    if cli.command.is_offline() {
        let engine = LeadEngine::new(LeadStore::new(), config);
        return dispatch(&cli.command, &Session::new(engine, cli.actor));
    }

    let access = if cli.command.mutates() {
        Access::Write
    } else {
        Access::Read
    };
    let mut backend = Backend::open(&cli.state, access).await?;
    tracing::debug!(%backend, ?access, "records backend opened");
    let loaded = backend.load().await?;
    let store = LeadStore::from_snapshot(loaded.clone()).context("stored records are inconsistent")?;
    let session = Session::new(LeadEngine::new(store, config), cli.actor);

    let code = dispatch(&cli.command, &session)?;

    if cli.command.mutates() {
        backend
            .save(&loaded, &session.engine().store().snapshot())
            .await?;
        tracing::debug!(%backend, "records saved");
    }
    backend.finish().await?;
    Ok(code)
}

fn dispatch(command: &Commands, session: &Session) -> anyhow::Result<u8> {
    match command {
        Commands::Employee(args) => run_employee(args, session),
        Commands::Lead(args) => run_lead(args, session),
        Commands::Case(args) => run_case(args, session),
        Commands::Comment(args) => run_comment(args, session),
        Commands::Report(args) => run_report(args, session),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parse_case_status() {
        let assignment = leadflow_core::AssignmentId::new();
        let cli = Cli::try_parse_from([
            "leadflow",
            "case",
            "status",
            "--assignment",
            &assignment.to_string(),
            "--to",
            "qualified",
        ])
        .unwrap();
        assert!(cli.command.mutates());
        assert_eq!(cli.verbose, 0);
    }

    #[test]
    fn cli_parse_global_flags_after_subcommand() {
        let actor = EmployeeId::new();
        let cli = Cli::try_parse_from([
            "leadflow",
            "lead",
            "list",
            "--status",
            "pd",
            "-vv",
            "--actor",
            &actor.to_string(),
            "--state",
            "/tmp/crm.json",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.actor, Some(actor));
        assert_eq!(cli.state, PathBuf::from("/tmp/crm.json"));
        assert!(!cli.command.mutates());
    }

    #[test]
    fn cli_rejects_unknown_status() {
        let result = Cli::try_parse_from([
            "leadflow",
            "case",
            "status",
            "--assignment",
            &leadflow_core::AssignmentId::new().to_string(),
            "--to",
            "archived",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn cli_parse_disburse_type() {
        let cli = Cli::try_parse_from([
            "leadflow",
            "case",
            "disburse",
            "--assignment",
            &leadflow_core::AssignmentId::new().to_string(),
            "--amount",
            "25000.50",
            "--type",
            "tranche",
            "--tranche",
            "2",
        ])
        .unwrap();
        assert!(cli.command.mutates());
    }

    #[test]
    fn workflow_report_is_offline() {
        let cli = Cli::try_parse_from(["leadflow", "report", "workflow"]).unwrap();
        assert!(cli.command.is_offline());
        assert!(!cli.command.mutates());
    }

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
