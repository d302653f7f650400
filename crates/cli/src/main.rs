use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use resreg_api::{CrudGateway, HttpGateway};
use resreg_core::columns::{list_columns, render_cell};
use resreg_core::{ClientConfig, FilterField, Resource, ResourceKey};
use resreg_edit::{encode_resource, Confirm, EditorSessionController, NoopLock, SessionOutcome};
use resreg_store::{ListSyncOptions, PaginationController, PaginationSupport, ResourceListSync};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "resregctl", version, about = "resreg CLI")]
struct Cli {
    /// Output format
    #[arg(short = 'o', long = "output", value_enum, global = true, default_value_t = Output::Human)]
    output: Output,

    /// Registry API base URL
    #[arg(long = "base-url", env = "RESREG_API_BASE", global = true)]
    base_url: Option<String>,

    /// Page size for list calls
    #[arg(long = "limit", env = "RESREG_PAGE_LIMIT", global = true)]
    limit: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum Output { Human, Json }

#[derive(Subcommand, Debug)]
enum Commands {
    /// List resources, optionally filtered
    Ls {
        #[arg(long = "group")]
        group: Option<String>,
        #[arg(long = "kind")]
        kind: Option<String>,
        #[arg(long = "shard")]
        shard: Option<String>,
        #[arg(long = "ns")]
        namespace: Option<String>,
        /// 1-based page number
        #[arg(long = "page", default_value_t = 1)]
        page: usize,
    },
    /// Print one resource
    Get {
        /// Resource key, e.g. "core/default/pod/web-1"
        key: ResourceKey,
    },
    /// Create a resource from a JSON file
    Create {
        #[arg(short = 'f', long = "file")]
        file: PathBuf,
    },
    /// Replace a resource with the contents of a JSON file
    Edit {
        key: ResourceKey,
        #[arg(short = 'f', long = "file")]
        file: PathBuf,
    },
    /// Delete a resource
    Delete {
        key: ResourceKey,
        /// Skip the confirmation prompt
        #[arg(long = "yes", short = 'y', action = ArgAction::SetTrue)]
        yes: bool,
    },
}

fn init_tracing() {
    let env = std::env::var("RESREG_LOG").unwrap_or_else(|_| "info".to_string());
    let filter = tracing_subscriber::EnvFilter::from_str(&env).unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    // Logs go to stderr so table/JSON output stays pipeable
    tracing_subscriber::fmt().with_env_filter(filter).with_target(true).with_writer(std::io::stderr).init();
}

fn init_metrics() {
    if let Ok(addr) = std::env::var("RESREG_METRICS_ADDR") {
        if let Ok(sock) = addr.parse::<std::net::SocketAddr>() {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            match builder.with_http_listener(sock).install() {
                Ok(_) => tracing::info!(addr = %addr, "Prometheus metrics exporter listening"),
                Err(e) => tracing::warn!(error = %e, "failed to install metrics exporter"),
            }
        } else {
            tracing::warn!(addr = %addr, "invalid RESREG_METRICS_ADDR; expected host:port");
        }
    }
}

/// Asks on stderr and reads the answer from stdin; only `y`/`yes` confirms.
struct StdinConfirm;

impl Confirm for StdinConfirm {
    fn confirm(&self, prompt: &str) -> bool {
        eprint!("{} [y/N] ", prompt);
        let _ = std::io::stderr().flush();
        let mut line = String::new();
        if std::io::stdin().lock().read_line(&mut line).is_err() {
            return false;
        }
        matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes")
    }
}

fn render_table(rows: &[Resource], now: DateTime<Utc>) -> String {
    let cols = list_columns();
    let mut out = String::new();
    let header: Vec<String> = cols.iter().map(|c| format!("{:<w$}", c.label, w = c.width)).collect();
    out.push_str(header.join(" ").trim_end());
    out.push('\n');
    for r in rows {
        let cells: Vec<String> = cols.iter().map(|c| format!("{:<w$}", render_cell(r, c.kind, now), w = c.width)).collect();
        out.push_str(cells.join(" ").trim_end());
        out.push('\n');
    }
    out
}

fn footer(p: &PaginationController, shown: usize) -> String {
    match p.support() {
        PaginationSupport::Unsupported => format!("{} items (unpaginated)", shown),
        _ => {
            let more = if p.has_next_page() { ", more available" } else { "" };
            format!("page {} of {} ({} total{})", p.current_page(), p.total_pages().max(1), p.total_count(), more)
        }
    }
}

fn read_text(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

fn print_resource(r: &Resource) { println!("{}", encode_resource(r)); }

/// Map a session outcome to process output; refusals and failures become errors.
fn report(outcome: SessionOutcome) -> Result<()> {
    match outcome {
        SessionOutcome::Updated(r) | SessionOutcome::Created(r) | SessionOutcome::Reloaded(r) => {
            print_resource(&r);
            Ok(())
        }
        SessionOutcome::Deleted => {
            eprintln!("deleted");
            Ok(())
        }
        SessionOutcome::Cancelled => {
            eprintln!("cancelled");
            Ok(())
        }
        SessionOutcome::Invalid(msg) => Err(anyhow!("invalid resource: {}", msg)),
        SessionOutcome::Failed(msg) => Err(anyhow!(msg)),
        SessionOutcome::Ignored => Err(anyhow!("no editor session open")),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    init_metrics();
    let cli = Cli::parse();

    let mut cfg = ClientConfig::from_env();
    if let Some(base) = cli.base_url.clone() {
        cfg.base_url = base;
    }
    if let Some(limit) = cli.limit {
        cfg.page_limit = limit.max(1);
    }
    let gateway: Arc<dyn CrudGateway> = Arc::new(HttpGateway::from_config(&cfg)?);
    let mut list = ResourceListSync::new(gateway.clone(), ListSyncOptions::from(&cfg));
    let mut session = EditorSessionController::new(gateway.clone(), Arc::new(NoopLock));

    match cli.command {
        Commands::Ls { group, kind, shard, namespace, page } => {
            info!(page, "ls invoked");
            let filters = [
                (FilterField::ResourceGroup, group),
                (FilterField::Kind, kind),
                (FilterField::ShardId, shard),
                (FilterField::Namespace, namespace),
            ];
            for (field, value) in filters {
                if let Some(v) = value {
                    list.set_filter(field, v);
                }
            }
            list.go_to_page(page).await;
            if let Some(err) = list.error() {
                return Err(anyhow!("list failed: {}", err));
            }
            match cli.output {
                Output::Human => {
                    print!("{}", render_table(list.rows(), Utc::now()));
                    println!("{}", footer(list.pagination(), list.rows().len()));
                }
                Output::Json => println!("{}", serde_json::to_string_pretty(list.rows())?),
            }
        }
        Commands::Get { key } => {
            info!(key = %key, "get invoked");
            let r = gateway.get(&key).await.with_context(|| format!("get {}", key))?;
            print_resource(&r);
        }
        Commands::Create { file } => {
            let text = read_text(&file)?;
            session.open_create();
            session.edit(text);
            report(session.submit(&mut list).await)?;
        }
        Commands::Edit { key, file } => {
            let text = read_text(&file)?;
            let current = gateway.get(&key).await.with_context(|| format!("get {}", key))?;
            session.open_existing(&current)?;
            session.edit(text);
            report(session.submit(&mut list).await)?;
        }
        Commands::Delete { key, yes } => {
            let current = gateway.get(&key).await.with_context(|| format!("get {}", key))?;
            session.open_existing(&current)?;
            let outcome = if yes {
                session.delete(&mut list, &|_: &str| true).await
            } else {
                session.delete(&mut list, &StdinConfirm).await
            };
            report(outcome)?;
        }
    }
    Ok(())
}
