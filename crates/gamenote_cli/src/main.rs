//! GameNote terminal shell.
//!
//! Commands:
//! - `sign-up`  create a local account
//! - `route`    resolve a location fragment and print the mounted view
//! - `notes`    list, show, add, edit and delete notes
//! - `feedback` ask the mentor to review one note
//! - `chat`     talk to the mentor (single message or interactive)

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(
    name = "gamenote",
    about = "GameNote: study notes for game developers, with an AI mentor",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// SQLite database file
    #[arg(long, global = true, env = "GAMENOTE_DB_PATH")]
    db: Option<PathBuf>,

    /// Gemini API key
    #[arg(long, global = true, env = "GAMENOTE_GEMINI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Gemini model name
    #[arg(long, global = true, env = "GAMENOTE_GEMINI_MODEL")]
    model: Option<String>,

    /// Log level (trace|debug|info|warn|error)
    #[arg(long, global = true, env = "GAMENOTE_LOG_LEVEL")]
    log_level: Option<String>,

    /// Absolute directory for log files
    #[arg(long, global = true, env = "GAMENOTE_LOG_DIR")]
    log_dir: Option<PathBuf>,

    #[command(flatten)]
    credentials: Credentials,
}

/// Account used by commands that act for a signed-in user.
#[derive(Args, Clone)]
struct Credentials {
    #[arg(long, global = true, env = "GAMENOTE_EMAIL")]
    email: Option<String>,

    #[arg(long, global = true, env = "GAMENOTE_PASSWORD", hide_env_values = true)]
    password: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an account with --email and --password
    SignUp,

    /// Resolve a fragment such as `#/editor?id=...` and print the view
    Route {
        #[arg(default_value = "#/")]
        fragment: String,
    },

    /// Manage notes
    Notes {
        #[command(subcommand)]
        action: NotesAction,
    },

    /// Ask the mentor for feedback on a note
    Feedback {
        /// Note id
        id: String,
    },

    /// Chat with the mentor
    Chat {
        /// Send a single message instead of entering interactive mode
        #[arg(short, long)]
        message: Option<String>,
    },
}

#[derive(Subcommand)]
enum NotesAction {
    /// List notes, newest first
    List {
        #[arg(long)]
        category: Option<String>,
        #[arg(long = "type")]
        note_type: Option<String>,
        #[arg(long)]
        search: Option<String>,
    },
    /// Print one note
    Show { id: String },
    /// Create a note
    Add {
        #[arg(long, default_value = "")]
        title: String,
        #[arg(long, default_value = "")]
        content: String,
        #[arg(long, default_value = "Other")]
        category: String,
        #[arg(long = "type", default_value = "Estudo")]
        note_type: String,
        /// Comma-separated tags
        #[arg(long, default_value = "")]
        tags: String,
    },
    /// Update the given fields of a note
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        content: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long = "type")]
        note_type: Option<String>,
        #[arg(long)]
        tags: Option<String>,
    },
    /// Delete a note
    Delete { id: String },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = commands::resolve_config(&cli);
    gamenote_core::init_logging(&config.logging)?;

    let result = commands::run(&cli, &config);
    if let Err(err) = &result {
        log::error!("event=cli_command module=cli status=error error={err}");
    }
    result
}
