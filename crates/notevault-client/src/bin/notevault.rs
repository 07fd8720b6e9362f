//! Read-only command-line view of a NoteVault catalog.

use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use notevault_client::{BrowseState, NoteVault, VaultConfig};
use notevault_core::{display_name, Category, RequestEntry};
use notevault_store::StaticAuthProvider;

#[derive(Parser)]
#[command(name = "notevault")]
#[command(author, version, about = "Browse a NoteVault catalog")]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List one page of notes
    Browse {
        /// Search title and subject (overrides the category)
        #[arg(short, long, default_value = "")]
        query: String,

        /// ALL, BOOKMARKED, COMMUNITY, or a branch name
        #[arg(short, long, default_value = "ALL")]
        category: Category,

        /// 1-based page number
        #[arg(short, long, default_value_t = 1)]
        page: usize,
    },
    /// List the most recent missing-note requests
    Requests,
}

/// Initialize tracing.
///
/// Environment variables:
///   LOG_FORMAT  - "json" or "text" (default: "text")
///   LOG_FILE    - path to log file (optional, enables file logging)
///   LOG_ANSI    - "true"/"false" override ANSI colors (auto-detected by default)
///   RUST_LOG    - standard env filter (default: "notevault_client=info")
fn init_logging() -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let log_file = std::env::var("LOG_FILE").ok();
    let log_ansi = std::env::var("LOG_ANSI")
        .ok()
        .map(|v| v == "true" || v == "1");

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "notevault_client=info,notevault_store=info".into());
    let registry = tracing_subscriber::registry().with(env_filter);

    let guard = if let Some(ref path) = log_file {
        let file_dir = std::path::Path::new(path)
            .parent()
            .unwrap_or(std::path::Path::new("."));
        let file_name = std::path::Path::new(path)
            .file_name()
            .and_then(|f| f.to_str())
            .unwrap_or("notevault.log");
        let file_appender = tracing_appender::rolling::daily(file_dir, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        if log_format == "json" {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(non_blocking),
                )
                .init();
        } else {
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(log_ansi.unwrap_or(false));
            registry.with(layer).init();
        }
        Some(guard)
    } else {
        // Logs go to stderr so stdout stays the listing.
        if log_format == "json" {
            registry
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        } else {
            let mut layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);
            if let Some(ansi) = log_ansi {
                layer = layer.with_ansi(ansi);
            }
            registry.with(layer).init();
        }
        None
    };

    info!(
        log_format = %log_format,
        log_file = log_file.as_deref().unwrap_or("(stderr)"),
        "Logging initialized"
    );
    guard
}

fn print_request(entry: &RequestEntry) {
    let when = entry
        .created_at
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string());
    println!(
        "[{}] {}  {}  by {}",
        entry.status,
        when,
        entry.title,
        display_name(entry.requested_by_email.as_deref())
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let _log_guard = init_logging();
    let cli = Cli::parse();

    let config = VaultConfig::from_env().context("reading NOTEVAULT_* settings")?;
    config.validate().context("invalid NOTEVAULT_* settings")?;
    let vault = NoteVault::connect(&config, Arc::new(StaticAuthProvider::guest()))?;

    match cli.command {
        Commands::Browse {
            query,
            category,
            page,
        } => {
            vault.cache.load_notes().await?;
            let mut browse = BrowseState::new(config.page_size);
            browse.set_category(category);
            browse.set_query(query);
            browse.go_to_page(&vault.cache, page)?;

            let view = browse.view(&vault.cache);
            if view.is_empty() {
                println!("No notes found.");
                return Ok(());
            }
            for note in &view.items {
                println!(
                    "{}  [{} / {}]  {}",
                    note.display_title(),
                    note.subject,
                    note.branch_bucket(),
                    note.file_url
                );
            }
            println!(
                "-- page {} of {} ({} notes)",
                view.page, view.total_pages, view.total_results
            );
        }
        Commands::Requests => {
            let recent = vault.requests.load_recent().await?;
            if recent.is_empty() {
                println!("No open requests.");
            }
            for entry in &recent {
                print_request(entry);
            }
        }
    }
    Ok(())
}
