//! chatbot CLI: Terminal chat client for the Gemini API

use chatbot_engine::{
    connect, Config, Controller, FileSessionStore, MemorySessionStore, Paths, Role,
    SessionStore, Transcript,
};
use clap::{Parser, Subcommand};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// Environment variable controlling the log filter.
const LOG_ENV: &str = "CHATBOT_LOG";

/// Chat with a generative model from the terminal
#[derive(Parser)]
#[command(name = "chatbot")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Config file (default: platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Session name; each session keeps its own transcript
    #[arg(long, global = true, default_value = "default")]
    session: String,

    /// Model id (overrides config and CHATBOT_MODEL)
    #[arg(long, global = true)]
    model: Option<String>,

    /// Keep the transcript in memory only
    #[arg(long, global = true)]
    ephemeral: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the chat UI (default when no command specified)
    Tui,

    /// Send one message and print the reply
    Ask {
        /// Message text
        prompt: String,
    },

    /// Print the session transcript
    History {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Delete the session transcript
    Clear,

    /// Print the effective configuration
    Config,
}

fn main() {
    let cli = Cli::parse();

    let paths = match Paths::discover() {
        Ok(paths) => paths,
        Err(e) => fail(&format!("Failed to locate config directories: {e}")),
    };

    // Reject a bad --session before anything touches the filesystem.
    if let Err(e) = paths.session_dir(&cli.session) {
        fail(&e.to_string());
    }

    let interactive = matches!(cli.command, None | Some(Commands::Tui));
    init_logging(interactive.then_some(paths.log_file.as_path()));

    let config = load_config(&cli, &paths);

    match cli.command {
        None | Some(Commands::Tui) => cmd_tui(&cli, &paths, &config),
        Some(Commands::Ask { ref prompt }) => cmd_ask(&cli, &paths, &config, prompt),
        Some(Commands::History { json }) => cmd_history(&cli, &paths, &config, json),
        Some(Commands::Clear) => cmd_clear(&cli, &paths, &config),
        Some(Commands::Config) => cmd_config(&config),
    }
}

fn fail(message: &str) -> ! {
    eprintln!("Error: {message}");
    std::process::exit(1);
}

/// Install the tracing subscriber. With a log file the terminal stays clean
/// for the UI; otherwise logs go to stderr.
fn init_logging(log_file: Option<&Path>) {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    let file = log_file.and_then(|path| {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir).ok()?;
        }
        OpenOptions::new().create(true).append(true).open(path).ok()
    });

    match file {
        Some(file) => builder.with_ansi(false).with_writer(Mutex::new(file)).init(),
        // No usable log file: drop logs rather than draw over the UI.
        None if log_file.is_some() => builder.with_writer(std::io::sink).init(),
        None => builder.with_writer(std::io::stderr).init(),
    }
}

fn load_config(cli: &Cli, paths: &Paths) -> Config {
    let path = cli.config.as_deref().unwrap_or(&paths.config_file);
    let mut config = match Config::load_or_default(path) {
        Ok(config) => config.with_env_overrides(),
        Err(e) => fail(&format!("Failed to load config {}: {e}", path.display())),
    };
    if let Some(model) = &cli.model {
        config.model.clone_from(model);
    }
    config
}

fn open_store(cli: &Cli, paths: &Paths) -> Box<dyn SessionStore> {
    if cli.ephemeral {
        return Box::new(MemorySessionStore::new());
    }
    let dir = match paths.session_dir(&cli.session) {
        Ok(dir) => dir,
        Err(e) => fail(&e.to_string()),
    };
    match FileSessionStore::new(dir) {
        Ok(store) => Box::new(store),
        Err(e) => {
            tracing::warn!("session storage unavailable, keeping history in memory: {e}");
            Box::new(MemorySessionStore::new())
        }
    }
}

fn build_controller(cli: &Cli, paths: &Paths, config: &Config) -> Controller {
    let mut controller = Controller::new(connect(config), open_store(cli, paths))
        .with_storage_key(config.storage_key.clone());
    controller.restore();
    controller
}

fn runtime() -> tokio::runtime::Runtime {
    match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => fail(&format!("Failed to create tokio runtime: {e}")),
    }
}

fn cmd_tui(cli: &Cli, paths: &Paths, config: &Config) {
    let controller = build_controller(cli, paths, config);
    if let Err(e) = runtime().block_on(chatbot_tui::run_tui(controller)) {
        fail(&e.to_string());
    }
}

fn cmd_ask(cli: &Cli, paths: &Paths, config: &Config, prompt: &str) {
    if prompt.trim().is_empty() {
        fail("Nothing to send");
    }

    let mut controller = build_controller(cli, paths, config);
    runtime().block_on(controller.send_text(prompt));

    match controller.transcript().last() {
        Some(message) if message.role() == Role::Bot => println!("{}", message.text()),
        _ => fail("No reply"),
    }
}

fn cmd_history(cli: &Cli, paths: &Paths, config: &Config, json: bool) {
    let store = open_store(cli, paths);
    let transcript = match store.get(&config.storage_key) {
        Ok(Some(saved)) => match Transcript::from_json(&saved) {
            Ok(transcript) => transcript,
            Err(e) => fail(&format!("Unreadable history: {e}")),
        },
        Ok(None) => Transcript::new(),
        Err(e) => fail(&format!("Failed to read history: {e}")),
    };

    if json {
        match serde_json::to_string_pretty(&transcript) {
            Ok(text) => println!("{text}"),
            Err(e) => fail(&format!("Failed to serialize history: {e}")),
        }
        return;
    }

    if transcript.is_empty() {
        println!("No messages in session '{}'", cli.session);
        return;
    }

    for (i, message) in transcript.messages().iter().enumerate() {
        if i > 0 {
            println!();
        }
        match message.role() {
            Role::User => println!("You: {}", message.text()),
            Role::Bot => println!("{}", message.text()),
        }
    }
}

fn cmd_clear(cli: &Cli, paths: &Paths, config: &Config) {
    let store = open_store(cli, paths);
    match store.remove(&config.storage_key) {
        Ok(()) => println!("Cleared session '{}'", cli.session),
        Err(e) => fail(&format!("Failed to clear session: {e}")),
    }
}

fn cmd_config(config: &Config) {
    match serde_json::to_string_pretty(&config.redacted()) {
        Ok(text) => println!("{text}"),
        Err(e) => fail(&format!("Failed to serialize config: {e}")),
    }
}
