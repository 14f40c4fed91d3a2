use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use synctrail_lib::config::{Config, FolderConfig};
use synctrail_lib::formatting;
use synctrail_lib::history::{EventAction, HistoryStore};
use synctrail_lib::service::HistoryService;
use synctrail_lib::system_integration::Desktop;
use synctrail_lib::watcher::{self, FolderNotification, WatcherManager};

#[derive(Parser)]
#[command(name = "synctrail-cli")]
#[command(about = "File-sync event history viewer", long_about = None)]
struct Cli {
    /// Folder to watch (in addition to any configured folders)
    #[arg(short, long)]
    folder: Option<PathBuf>,

    /// Identifier for the --folder argument
    #[arg(long, default_value = "magic-folder")]
    id: String,

    /// YAML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the history capacity
    #[arg(short, long)]
    max_items: Option<usize>,

    /// Keep every event instead of collapsing repeats per file
    #[arg(long)]
    no_dedup: bool,

    /// Report files already present before watching
    #[arg(short, long)]
    backfill: bool,

    /// Scan, print the history once and exit (implies --backfill)
    #[arg(long)]
    once: bool,
}

fn render(service: &HistoryService, printer: &dyn Fn(String)) {
    let snapshot = service.snapshot();
    if snapshot.is_empty() {
        printer("   (no events yet)".to_string());
        return;
    }
    let now = chrono::Utc::now().timestamp();
    for event in &snapshot {
        let icon = match event.action {
            EventAction::Added => "➕",
            EventAction::Modified | EventAction::Updated => "🔄",
            EventAction::Removed | EventAction::Deleted => "❌",
        };
        printer(format!(
            "   {} {:<32} {:>10}   {}",
            icon,
            event.basename(),
            formatting::natural_size(event.size),
            formatting::describe(event, now),
        ));
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    if let Some(max_items) = cli.max_items {
        config.max_items = max_items;
    }
    if cli.no_dedup {
        config.deduplicate = false;
    }
    if let Some(folder) = &cli.folder {
        config.folders.push(FolderConfig {
            id: cli.id.clone(),
            path: folder.clone(),
        });
    }

    if config.folders.is_empty() {
        anyhow::bail!("No folders to watch: pass --folder or configure some in --config");
    }
    for folder in &config.folders {
        if !folder.path.exists() {
            anyhow::bail!("Folder does not exist: {:?}", folder.path);
        }
    }

    let service = HistoryService::new(
        HistoryStore::new(config.deduplicate, config.max_items),
        Arc::new(Desktop::new()),
    );

    if cli.backfill || cli.once {
        println!("🔍 Scanning existing files...");
        for folder in &config.folders {
            let sink = service.clone();
            let reported = watcher::scan_existing(
                &folder.id,
                &folder.path,
                &config.exclude_patterns,
                move |n| sink.ingest(n),
            )?;
            println!("   {} file(s) in {:?}", reported, folder.path);
        }
    }

    if cli.once {
        println!();
        println!("📜 History ({} entries):", service.count());
        render(&service, &|line| println!("{line}"));
        return Ok(());
    }

    let (tx, mut rx) = tokio::sync::mpsc::channel::<FolderNotification>(100);

    let mut manager = WatcherManager::new();
    for folder in &config.folders {
        let tx = tx.clone();
        manager.start_watching(
            folder.id.clone(),
            folder.path.clone(),
            &config.exclude_patterns,
            move |notification| {
                let _ = tx.blocking_send(notification);
            },
        )?;
        println!("👀 Watching {:?} as '{}'", folder.path, folder.id);
    }
    drop(tx);

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    spinner.set_message("Waiting for file changes... (Ctrl-C to quit)");
    spinner.enable_steady_tick(Duration::from_millis(120));

    loop {
        tokio::select! {
            notification = rx.recv() => {
                let Some(notification) = notification else { break };
                let folder = notification.folder_id.clone();
                service.ingest(notification);
                spinner.println(format!(
                    "📜 History for '{}' ({} entries):",
                    folder,
                    service.count()
                ));
                render(&service, &|line| spinner.println(line));
            }
            _ = tokio::signal::ctrl_c() => {
                spinner.finish_with_message("👋 Stopped watching");
                break;
            }
        }
    }

    manager.stop_all();
    Ok(())
}
