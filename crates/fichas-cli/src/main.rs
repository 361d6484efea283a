use clap::{Parser, Subcommand};
use fichas_cli::cmd::{self, Ctx};
use fichas_cli::root;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "fichas",
    about = "Triage outreach leads: rank pending fichas, mark them contacted or discarded",
    version,
    propagate_version = true
)]
struct Cli {
    /// Project root (default: auto-detect from .fichas/)
    #[arg(long, global = true, env = "FICHAS_ROOT")]
    root: Option<PathBuf>,

    /// SQLite database path (default: from .fichas/config.yaml)
    #[arg(long, global = true, env = "FICHAS_DB")]
    db: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create .fichas/ with a default config and an empty database
    Init,

    /// List pending fichas in triage order
    Pending {
        /// Case-insensitive text matched against title, institution and channel
        #[arg(long, short = 'q')]
        query: Option<String>,
        /// Only show this priority (high, medium, low; alta/media/baja accepted)
        #[arg(long, short = 'p')]
        priority: Option<String>,
    },

    /// List fichas in a given state, in triage order
    List {
        #[arg(long, default_value = "pending")]
        state: String,
        #[arg(long, short = 'q')]
        query: Option<String>,
        #[arg(long, short = 'p')]
        priority: Option<String>,
    },

    /// Show one ficha
    Show { id: String },

    /// Mark a ficha as contacted
    Contact { id: String },

    /// Mark a ficha as discarded
    Discard { id: String },

    /// Discard every pending low-priority ficha
    DiscardLow,

    /// Show aggregate counts
    Summary,

    /// Insert fichas from a JSON array file, skipping duplicates
    Ingest { file: PathBuf },

    /// Write a JSON snapshot of every ficha
    Export {
        #[arg(long, short = 'o', default_value = "fichas.json")]
        output: PathBuf,
    },

    /// Serve the HTTP API
    Serve {
        /// Port to listen on (default: from config)
        #[arg(long)]
        port: Option<u16>,
        /// Address to bind (default: from config)
        #[arg(long)]
        bind: Option<String>,
        /// Open the pending list in a browser
        #[arg(long)]
        open: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = match &cli.command {
        Commands::Serve { .. } => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let ctx = Ctx {
        root: root::resolve_root(cli.root.as_deref()),
        db: cli.db,
        json: cli.json,
    };

    let result = match cli.command {
        Commands::Init => cmd::init::run(&ctx),
        Commands::Pending { query, priority } => {
            cmd::ficha::pending(&ctx, query, priority.as_deref())
        }
        Commands::List {
            state,
            query,
            priority,
        } => cmd::ficha::list(&ctx, &state, query, priority.as_deref()),
        Commands::Show { id } => cmd::ficha::show(&ctx, &id),
        Commands::Contact { id } => cmd::ficha::contact(&ctx, &id),
        Commands::Discard { id } => cmd::ficha::discard(&ctx, &id),
        Commands::DiscardLow => cmd::ficha::discard_low(&ctx),
        Commands::Summary => cmd::summary::run(&ctx),
        Commands::Ingest { file } => cmd::ingest::run(&ctx, &file),
        Commands::Export { output } => cmd::export::run(&ctx, &output),
        Commands::Serve { port, bind, open } => cmd::serve::run(&ctx, port, bind, open),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
