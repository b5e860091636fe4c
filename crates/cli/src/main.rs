mod commands;

use clap::{Parser, Subcommand};
use commands::migrate::{MigrateCommand, StatusCommand};
use commands::GlobalArgs;
use migrate_engine::{init_logging, Direction, LoggingConfig};

#[derive(Parser, Debug)]
#[command(name = "migrate")]
#[command(about = "Command line tool for PostgreSQL migrations", version)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create a new migration
    Create {
        /// Migration name; spaces become underscores
        #[arg(value_name = "NAME")]
        name: Option<String>,
    },

    /// Apply -up- migrations
    Up(MigrateCommand),

    /// Apply -down- migrations
    Down(MigrateCommand),

    /// Show applied and pending migrations
    Status(StatusCommand),
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Create { name } => {
            commands::create::create(&cli.global, name.as_deref())?;
        }
        Commands::Up(command) => {
            commands::migrate::run(&cli.global, Direction::Up, &command).await?;
        }
        Commands::Down(command) => {
            commands::migrate::run(&cli.global, Direction::Down, &command).await?;
        }
        Commands::Status(command) => {
            commands::migrate::status(&cli.global, &command).await?;
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let logging = if cli.global.verbose {
        LoggingConfig::verbose()
    } else {
        LoggingConfig::default()
    };
    if let Err(e) = init_logging(logging.with_json(cli.global.log_json)) {
        eprintln!("Warning: initializing logging failed: {}", e);
    }

    if let Err(e) = run(cli).await {
        eprintln!("{:#}", e);
        std::process::exit(1);
    }
}
