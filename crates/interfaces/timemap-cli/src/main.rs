use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};
use timemap_cli::{commands, ConfigArgs};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(flatten)]
    config: ConfigArgs,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the resolved endpoint of every domain
    Endpoints,
    /// Fetch and aggregate every enabled domain
    Fetch {
        #[arg(short, long)]
        output: Option<Utf8PathBuf>,
    },
    /// Fetch the sources endpoint only
    Sources,
    #[command(name = "narrative-range")]
    NarrativeRange {
        /// JSON file holding a list of narratives
        #[arg(long)]
        file: Utf8PathBuf,
        #[arg(long)]
        id: Option<String>,
    },
    /// Apply a JSON list of dashboard actions and print the resulting state
    Replay {
        file: Utf8PathBuf,
        #[arg(short, long)]
        output: Option<Utf8PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::WARN
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Endpoints => commands::cmd_endpoints(&cli.config.load()?),
        Commands::Fetch { output } => {
            commands::cmd_fetch(cli.config.load()?, output).await?;
        }
        Commands::Sources => {
            commands::cmd_sources(cli.config.load()?).await?;
        }
        Commands::NarrativeRange { file, id } => {
            commands::cmd_narrative_range(file, id)?;
        }
        Commands::Replay { file, output } => {
            commands::cmd_replay(file, output)?;
        }
    }

    Ok(())
}
