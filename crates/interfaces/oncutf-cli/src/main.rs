use clap::{Parser, Subcommand};
use oncutf_cli::commands;
use oncutf_config::Config;
use oncutf_services::CoreServices;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    #[arg(long, global = true, env = "ONCUTF_STORE_PATH")]
    store_path: Option<camino::Utf8PathBuf>,
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the module chain and validation over a file list, no filesystem changes.
    Preview {
        files: Vec<String>,
        #[arg(long)]
        modules: Option<String>,
        #[arg(long)]
        post_transform: Option<String>,
    },
    /// Preview, validate, and execute renames; records an undoable history entry.
    Rename {
        files: Vec<String>,
        #[arg(long)]
        modules: Option<String>,
        #[arg(long)]
        post_transform: Option<String>,
        #[arg(long)]
        dry_run: bool,
        #[arg(long, help = "Overwrite a conflicting existing file instead of skipping it")]
        overwrite: bool,
    },
    /// Reverses a prior rename operation.
    Undo {
        operation_id: Option<String>,
        #[arg(long, help = "Undo the most recent operation")]
        last: bool,
    },
    /// Lists recent rename operations.
    History {
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Prints store and cache statistics.
    Stats,
    #[command(subcommand)]
    Snapshot(SnapshotCommands),
    /// Removes store records for paths that no longer exist on disk.
    #[command(name = "cleanup-orphans")]
    CleanupOrphans,
}

#[derive(Subcommand)]
enum SnapshotCommands {
    Create {
        #[arg(long, default_value = "manual")]
        reason: String,
    },
    List,
    Rotate,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::WARN };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber).expect("default subscriber");

    let env: std::collections::HashMap<String, String> = std::env::vars().collect();
    let mut config = Config::load(None, &env)?;
    if let Some(store_path) = cli.store_path {
        config.store_path = store_path;
    }

    let services = CoreServices::bootstrap(config)?;

    match cli.command {
        Commands::Preview { files, modules, post_transform } => {
            commands::cmd_preview(&services, files, modules.as_deref(), post_transform.as_deref())?
        }
        Commands::Rename { files, modules, post_transform, dry_run, overwrite } => commands::cmd_rename(
            &services,
            files,
            modules.as_deref(),
            post_transform.as_deref(),
            dry_run,
            overwrite,
        )?,
        Commands::Undo { operation_id, last } => commands::cmd_undo(&services, operation_id, last)?,
        Commands::History { limit } => commands::cmd_history(&services, limit)?,
        Commands::Stats => commands::cmd_stats(&services)?,
        Commands::Snapshot(SnapshotCommands::Create { reason }) => commands::cmd_snapshot_create(&services, &reason)?,
        Commands::Snapshot(SnapshotCommands::List) => commands::cmd_snapshot_list(&services)?,
        Commands::Snapshot(SnapshotCommands::Rotate) => commands::cmd_snapshot_rotate(&services)?,
        Commands::CleanupOrphans => commands::cmd_cleanup_orphans(&services)?,
    }

    Ok(())
}
