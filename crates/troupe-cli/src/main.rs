//! Troupe CLI — design agent teams and run supervised conversations.
//!
//! Reuses the same core domain logic (troupe-core) and server bootstrap
//! (troupe-server) that power the HTTP API.

mod commands;

use clap::{Parser, Subcommand};

/// Troupe CLI — dynamic multi-agent conversation platform
#[derive(Parser)]
#[command(name = "troupe", version, about = "Troupe CLI — dynamic multi-agent conversation platform")]
pub struct Cli {
    /// Path to the SQLite database file
    #[arg(long, env = "TROUPE_DB_PATH", default_value = "troupe.db")]
    db: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the troupe HTTP backend server
    Server {
        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
        /// Port to listen on
        #[arg(long, default_value_t = 3720)]
        port: u16,
    },

    /// Design an agent team for a use-case description and persist it
    Design {
        /// The natural-language use-case description
        description: String,
    },

    /// List persisted use cases and their agent teams
    Cases {
        /// Print machine-readable JSON instead of styled text
        #[arg(long)]
        json: bool,
    },

    /// Run one conversation against an existing use case
    Run {
        /// Use case ID (see `troupe cases`)
        #[arg(long = "use-case")]
        use_case_id: String,
        /// The initial user message
        message: String,
        /// Upper bound on supervisor↔specialist round trips
        #[arg(long, default_value_t = 20)]
        max_turns: u32,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Server { host, port } => commands::server::run(host, port, cli.db).await,
        Commands::Design { description } => commands::design::run(&cli.db, &description).await,
        Commands::Cases { json } => commands::cases::run(&cli.db, json).await,
        Commands::Run {
            use_case_id,
            message,
            max_turns,
        } => commands::run::run(&cli.db, &use_case_id, &message, max_turns).await,
    };

    if let Err(e) = result {
        eprintln!("{} {}", console::style("error:").red().bold(), e);
        std::process::exit(1);
    }
}
