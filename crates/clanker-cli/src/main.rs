//! clanker CLI: chat with the booking assistant from a terminal

use clanker_engine::format::{format_businesses_list, format_contact_message};
use clanker_engine::{
    build_service, Config, Conversation, Role, SendOutcome, Timeline, TimelineItem,
};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Environment variable holding the log filter.
const LOG_ENV: &str = "CLANKER_LOG";

/// Chat with the clanker booking assistant
#[derive(Parser)]
#[command(name = "clanker")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the API base URL
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Print extra detail
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the chat TUI (default when no command specified)
    Chat,

    /// Send messages without the TUI and print the conversation
    Send {
        /// Messages to send, one turn each
        #[arg(required = true)]
        text: Vec<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,

        /// Don't wait for the booking animation to finish
        #[arg(long)]
        no_wait: bool,
    },

    /// Manage the config file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Write a default config file
    Init,

    /// Print the effective configuration
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);

    match cli.command {
        None | Some(Commands::Chat) => {
            init_file_logging();
            let config = load_config(&config_path, cli.base_url.as_deref());
            let rt = runtime();
            if let Err(e) = rt.block_on(clanker_tui::run_tui(&config)) {
                eprintln!("Error: {e}");
                std::process::exit(1);
            }
        }
        Some(Commands::Send {
            text,
            json,
            no_wait,
        }) => {
            init_stderr_logging();
            let config = load_config(&config_path, cli.base_url.as_deref());
            cmd_send(&config, &text, json, no_wait, cli.verbose);
        }
        Some(Commands::Config { action }) => match action {
            ConfigAction::Init => cmd_config_init(&config_path),
            ConfigAction::Show { json } => {
                let config = load_config(&config_path, cli.base_url.as_deref());
                cmd_config_show(&config, &config_path, json);
            }
        },
    }
}

fn runtime() -> tokio::runtime::Runtime {
    match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Error: failed to start runtime: {e}");
            std::process::exit(1);
        }
    }
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Log to stderr; stdout carries the conversation.
fn init_stderr_logging() {
    tracing_subscriber::registry()
        .with(env_filter())
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true),
        )
        .init();
}

/// Log to a file, since the TUI owns the terminal.
fn init_file_logging() {
    let dir = Config::data_dir();
    let file = std::fs::create_dir_all(&dir).and_then(|()| {
        std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(dir.join("clanker.log"))
    });

    match file {
        Ok(file) => {
            tracing_subscriber::registry()
                .with(env_filter())
                .with(
                    fmt::layer()
                        .with_writer(Mutex::new(file))
                        .with_ansi(false)
                        .with_target(true),
                )
                .init();
        }
        Err(e) => eprintln!("Warning: logging disabled: {e}"),
    }
}

/// Load the config file, then apply the environment and `--base-url`.
fn load_config(path: &Path, base_url: Option<&str>) -> Config {
    let config = match Config::load_or_default(path) {
        Ok(config) => config.with_env_overrides(),
        Err(e) => {
            eprintln!("Error loading config: {e}");
            std::process::exit(1);
        }
    };

    let config = match base_url {
        Some(url) => config.with_base_url(url),
        None => config,
    };

    if let Err(e) = config.validate() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
    config
}

fn cmd_send(config: &Config, turns: &[String], json: bool, no_wait: bool, verbose: bool) {
    let service = match build_service(config) {
        Ok(service) => service,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    let rt = runtime();
    let session = rt.block_on(async {
        let mut conversation = Conversation::new(service, config.timings);
        for turn in turns {
            match conversation.send(turn).await {
                Ok(SendOutcome::Cycling { businesses }) if verbose => {
                    eprintln!("{}", format_businesses_list(&businesses));
                    for (i, business) in businesses.iter().enumerate() {
                        eprintln!();
                        eprintln!("{}", format_contact_message(business, i, businesses.len()));
                    }
                }
                Ok(outcome) => tracing::debug!(?outcome, "Turn complete"),
                Err(e) => eprintln!("Skipped {turn:?}: {e}"),
            }
            if !no_wait {
                conversation.run_until_idle().await;
            }
        }
        conversation.into_session()
    });

    if json {
        let output = serde_json::json!({
            "conversation_id": session.conversation_id(),
            "items": session.timeline().items(),
        });
        match serde_json::to_string_pretty(&output) {
            Ok(text) => println!("{text}"),
            Err(e) => {
                eprintln!("Error: {e}");
                std::process::exit(1);
            }
        }
    } else {
        print_timeline(session.timeline());
    }
}

fn print_timeline(timeline: &Timeline) {
    for item in timeline.items() {
        match item {
            TimelineItem::Separator { text, .. } => println!("--- {text} ---"),
            TimelineItem::Message(message) => {
                let prefix = match message.role {
                    Role::User => "you",
                    Role::Bot => "clanker",
                };
                let mut lines = message.content.lines();
                println!("{prefix}: {}", lines.next().unwrap_or_default());
                for line in lines {
                    println!("{:width$}  {line}", "", width = prefix.len());
                }
            }
        }
    }
}

fn cmd_config_init(path: &Path) {
    if path.exists() {
        println!("Config already exists at {}", path.display());
        return;
    }

    match Config::default().save(path) {
        Ok(()) => println!("Created {}", path.display()),
        Err(e) => {
            eprintln!("Failed to write config: {e}");
            std::process::exit(1);
        }
    }
}

fn cmd_config_show(config: &Config, path: &Path, json: bool) {
    if json {
        match serde_json::to_string_pretty(config) {
            Ok(text) => println!("{text}"),
            Err(e) => {
                eprintln!("Error: {e}");
                std::process::exit(1);
            }
        }
        return;
    }

    println!("clanker configuration");
    println!("=====================");
    println!();
    let source = if path.exists() { "" } else { " (not found, using defaults)" };
    println!("File:          {}{source}", path.display());
    println!("Transport:     {:?}", config.transport);
    println!("Base URL:      {}", config.api_base_url);
    println!("Create path:   {}", config.create_path);
    println!("Continue path: {}", config.continue_path);
    println!("Legacy path:   {}", config.legacy_path);
    println!("Timeout:       {}s", config.request_timeout_secs);
    println!();
    println!("Timings (ms)");
    println!("  announce:     {}", config.timings.announce_delay_ms);
    println!("  cycle:        {}", config.timings.cycle_interval_ms);
    println!("  confirmation: {}", config.timings.confirmation_delay_ms);
    println!("  tick:         {}", config.timings.tick_rate_ms);
}
