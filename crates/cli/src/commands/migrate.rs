use anyhow::Context;
use clap::Args;
use migrate_engine::{
    ConsoleReporter, Direction, MigrateArgs, MigrateError, MigrateResult, Migrator,
    PostgresDriver, StatusReport,
};

use super::{GlobalArgs, TimeoutArgs};

/// Arguments of `up` and `down`
#[derive(Args, Debug, Clone, Default)]
pub struct MigrateCommand {
    /// Number of migrations to apply (all when omitted)
    #[arg(value_name = "N")]
    pub n: Option<String>,

    /// Allow migrating up versions older than the newest applied one
    #[arg(long, env = "MIGRATE_NO_VERIFY")]
    pub no_verify: bool,

    #[command(flatten)]
    pub timeouts: TimeoutArgs,
}

/// Arguments of `status`
#[derive(Args, Debug, Clone, Default)]
pub struct StatusCommand {
    /// Print the status as JSON
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub timeouts: TimeoutArgs,
}

/// Turn parsed flags into the arguments of one run
pub fn build_args(
    global: &GlobalArgs,
    direction: Direction,
    command: &MigrateCommand,
) -> MigrateResult<MigrateArgs> {
    let path = global.require_path()?;
    let url = global.require_url()?;

    let steps = match command.n.as_deref() {
        Some(n) => n
            .trim()
            .parse::<usize>()
            .map_err(|_| MigrateError::invalid_flag("<n>", n))?,
        None => 0,
    };

    Ok(MigrateArgs::new(path, url, direction)
        .with_steps(steps)
        .with_no_verify(command.no_verify)
        .with_timeout(command.timeouts.run_timeout()?)
        .with_connect_timeout(command.timeouts.connect_timeout()?))
}

/// Migrate up or down
pub async fn run(
    global: &GlobalArgs,
    direction: Direction,
    command: &MigrateCommand,
) -> anyhow::Result<()> {
    let args = build_args(global, direction, command)?;

    let mut migrator = Migrator::new(PostgresDriver::new(), ConsoleReporter::new());
    migrator
        .migrate(&args)
        .await
        .with_context(|| format!("migrating {} failed", direction))?;

    Ok(())
}

/// Show applied and pending migrations
pub async fn status(global: &GlobalArgs, command: &StatusCommand) -> anyhow::Result<()> {
    let args = MigrateArgs::new(global.require_path()?, global.require_url()?, Direction::Up)
        .with_timeout(command.timeouts.run_timeout()?)
        .with_connect_timeout(command.timeouts.connect_timeout()?);

    let mut migrator = Migrator::new(PostgresDriver::new(), ConsoleReporter::new());
    let report = migrator
        .status(&args)
        .await
        .context("reading migration status failed")?;

    if command.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_status(&report);
    }

    Ok(())
}

fn print_status(report: &StatusReport) {
    println!("Migration Status:");
    println!("================");

    if report.migrations.is_empty() {
        println!("No migrations found");
    }

    for migration in &report.migrations {
        if migration.applied {
            println!("  {} {}", console::style("applied").green(), migration.base_name);
        } else {
            println!("  {} {}", console::style("pending").yellow(), migration.base_name);
        }
    }

    for version in &report.missing_files {
        println!(
            "  {} {} (no migration file)",
            console::style("missing").red(),
            version
        );
    }

    let pending = report.pending().count();
    println!();
    println!(
        "{} applied, {} pending",
        report.migrations.len() - pending,
        pending
    );
}
