mod cmd;
mod output;
mod workdir;

use clap::{Parser, Subcommand};
use cmd::config::ConfigSubcommand;
use std::path::PathBuf;
use std::sync::Mutex;

#[derive(Parser)]
#[command(
    name = "ticketflow",
    about = "Turn a requirements document into tracker tickets, feature branches and test cases",
    version,
    propagate_version = true
)]
struct Cli {
    /// Directory for intermediate files and the ticket registry (default: current directory)
    #[arg(long, global = true, env = "TICKETFLOW_DIR")]
    work_dir: Option<PathBuf>,

    /// Ticket registry file (default: <work-dir>/ticket_keys.json)
    #[arg(long, global = true)]
    registry: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    /// Append log output to this file instead of stderr
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Stage 1: extract tasks from a .txt, .pdf or .docx document and create tickets
    Tickets {
        /// Requirements document
        document: PathBuf,
    },

    /// Stage 2: mirror the ticket registry into the repository
    Mirror,

    /// Stage 3: generate test cases, comment them on tickets and commit them to branches
    Testcases {
        /// Don't post test cases as tracker comments
        #[arg(long)]
        no_comments: bool,

        /// Don't commit test case files to feature branches
        #[arg(long)]
        no_commit: bool,
    },

    /// Parse a saved model task file without contacting any service
    Parse {
        /// File in the `Task N:` / `Subtask N.M:` format
        file: PathBuf,
    },

    /// Show the task tree rebuilt from the ticket registry
    Tree,

    /// Inspect pipeline configuration
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

fn init_logging(log_file: Option<&std::path::Path>) -> anyhow::Result<()> {
    let filter =
        tracing_subscriber::EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());

    match log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| anyhow::anyhow!("cannot open log file {}: {e}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(false)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = init_logging(cli.log_file.as_deref()) {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }

    let work = workdir::resolve(cli.work_dir.as_deref(), cli.registry.as_deref());
    workdir::load_dotenv(&work.dir);

    let result = match cli.command {
        Commands::Tickets { document } => cmd::tickets::run(&work, &document, cli.json),
        Commands::Mirror => cmd::mirror::run(&work, cli.json),
        Commands::Testcases {
            no_comments,
            no_commit,
        } => cmd::testcases::run(&work, !no_comments, !no_commit, cli.json),
        Commands::Parse { file } => cmd::parse::run(&file, cli.json),
        Commands::Tree => cmd::tree::run(&work, cli.json),
        Commands::Config { subcommand } => cmd::config::run(subcommand, cli.json),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
