// SPDX-FileCopyrightText: 2026 Chatsight Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chatsight - conversation event ingestion and scheduled LLM analysis.
//!
//! This is the binary entry point for the Chatsight service.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use clap::{Parser, Subcommand};

mod analyze;
mod serve;

/// Chatsight - conversation event ingestion and scheduled LLM analysis.
#[derive(Parser, Debug)]
#[command(name = "chatsight", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the ingestion consumers and the analysis scheduler.
    Serve,
    /// Analyze a single conversation on demand.
    Analyze {
        /// Session identifier.
        session_id: String,
        /// Chat identifier within the session.
        chat_id: String,
    },
    /// Print the resolved configuration (secrets redacted).
    Config,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Load and validate configuration at startup.
    let config = match chatsight_config::load_and_validate() {
        Ok(config) => config,
        Err(errors) => {
            chatsight_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Some(Commands::Serve) => serve::run_serve(config).await,
        Some(Commands::Analyze {
            session_id,
            chat_id,
        }) => analyze::run_analyze(config, &session_id, &chat_id).await,
        Some(Commands::Config) => {
            print_config(config);
            Ok(())
        }
        None => {
            println!("chatsight: use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

/// Prints the resolved configuration as TOML with credentials redacted.
fn print_config(mut config: chatsight_config::ChatsightConfig) {
    if config.projects.token.is_some() {
        config.projects.token = Some("[redacted]".to_string());
    }
    if config.projects.client_secret.is_some() {
        config.projects.client_secret = Some("[redacted]".to_string());
    }
    match toml::to_string_pretty(&config) {
        Ok(rendered) => println!("{rendered}"),
        Err(e) => eprintln!("error: failed to render config: {e}"),
    }
}

#[cfg(test)]
mod tests {
    #[test]
    #[cfg(not(target_env = "msvc"))]
    fn jemalloc_is_active() {
        // Verify jemalloc is the global allocator by advancing the epoch.
        // Only jemalloc supports this -- the system allocator would fail.
        use tikv_jemalloc_ctl::{epoch, stats};
        epoch::advance().unwrap();
        let allocated = stats::allocated::read().unwrap();
        assert!(allocated > 0, "jemalloc should report non-zero allocation");
    }

    #[test]
    fn default_config_is_valid_for_startup() {
        let config = chatsight_config::load_and_validate_str("")
            .expect("default config should be valid");
        assert_eq!(config.analysis.batch_size, 30);
    }
}
