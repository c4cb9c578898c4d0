use anyhow::Result;
use clap::{Parser, Subcommand};
use minibar_report::ReportFormat;

mod commands;

use commands::{db, repl, stock};

#[derive(Parser)]
#[command(name = "minibar")]
#[command(about = "Mini bar stock and operation ledger", long_about = None)]
struct Cli {
    /// Layered config paths in merge order (later files override earlier ones)
    #[arg(long = "config", global = true)]
    config_paths: Vec<String>,

    #[command(subcommand)]
    cmd: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Database commands
    Db {
        #[command(subcommand)]
        cmd: DbCmd,
    },

    /// Compute layered config hash + print canonical JSON
    ConfigHash {
        /// Paths in merge order
        #[arg(required = true)]
        paths: Vec<String>,
    },

    /// Print drinks with stock on hand
    Menu {
        /// text | html | json
        #[arg(long, default_value = "text")]
        format: ReportFormat,
    },

    /// Print every sale and supply in the order they happened
    Log {
        /// text | html | json
        #[arg(long, default_value = "text")]
        format: ReportFormat,
    },

    /// Sell a drink at its current price
    Sell {
        name: String,

        #[arg(long, default_value_t = 1)]
        amount: i64,
    },

    /// Receive stock; creates the drink on first supply
    Supply {
        name: String,
        amount: i64,
        /// Unit price, decimal (e.g. 40.9)
        price: String,
    },

    /// Interactive bar session (default when no command is given)
    Repl,
}

#[derive(Subcommand)]
enum DbCmd {
    Status,

    /// Apply schema migrations (embedded, or storage.schema_dir when configured)
    Migrate,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Silent if the file does not exist.
    let _ = dotenvy::from_filename(".env.local");

    init_tracing();

    let cli = Cli::parse();

    match cli.cmd.unwrap_or(Commands::Repl) {
        Commands::Db { cmd } => {
            let cfg = commands::load_config(&cli.config_paths)?;
            match cmd {
                DbCmd::Status => db::status(&cfg).await?,
                DbCmd::Migrate => db::migrate(&cfg).await?,
            }
        }

        Commands::ConfigHash { paths } => {
            let path_refs: Vec<&str> = paths.iter().map(|s| s.as_str()).collect();
            let loaded = minibar_config::load_layered_yaml(&path_refs)?;
            println!("config_hash={}", loaded.config_hash);
            println!("{}", loaded.canonical_json);
        }

        Commands::Menu { format } => {
            let cfg = commands::load_config(&cli.config_paths)?;
            let ledger = commands::open_ledger(&cfg).await?;
            stock::menu(&ledger, format).await?;
        }

        Commands::Log { format } => {
            let cfg = commands::load_config(&cli.config_paths)?;
            let ledger = commands::open_ledger(&cfg).await?;
            stock::log(&ledger, format).await?;
        }

        Commands::Sell { name, amount } => {
            let cfg = commands::load_config(&cli.config_paths)?;
            let ledger = commands::open_ledger(&cfg).await?;
            stock::sell(&ledger, &name, amount).await?;
        }

        Commands::Supply {
            name,
            amount,
            price,
        } => {
            let cfg = commands::load_config(&cli.config_paths)?;
            let ledger = commands::open_ledger(&cfg).await?;
            stock::supply(&ledger, &name, amount, &price).await?;
        }

        Commands::Repl => {
            let cfg = commands::load_config(&cli.config_paths)?;
            let ledger = commands::open_ledger(&cfg).await?;
            let stdin = std::io::stdin();
            let mut stdout = std::io::stdout();
            repl::run(&ledger, &cfg.bar.name, stdin.lock(), &mut stdout).await?;
        }
    }

    Ok(())
}

/// Logs go to stderr so report and REPL output on stdout stays clean.
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()),
        )
        .init();
}
