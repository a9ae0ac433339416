use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::Parser;
use client_core::{
    BackendApi, ClientError, CoreOptions, DragEvent, DragEventKind, DragPayload, HttpBackend,
    InteractionCore, InteractionView,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod view;

use commands::{parse, read_upload, ConsoleCommand, HELP};
use config::{load_settings, DEFAULT_CONFIG_FILE};
use view::ConsoleView;

#[derive(Parser, Debug)]
#[command(about = "Ask a SQL backend questions in plain language")]
struct Args {
    /// Backend base url. Overrides the config file and SERVER_URL.
    #[arg(long)]
    server_url: Option<String>,
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,
    #[arg(long)]
    debounce_ms: Option<u64>,
    #[arg(long)]
    llm_provider: Option<String>,
    /// Where CSV exports are written.
    #[arg(long)]
    download_dir: Option<PathBuf>,
    /// Answer yes to confirmation prompts such as table removal.
    #[arg(long)]
    assume_yes: bool,
    /// Log filter, e.g. `debug` or `client_core=trace`. Falls back to RUST_LOG.
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let filter = match &args.log_level {
        Some(level) => EnvFilter::try_new(level).context("invalid --log-level")?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let mut settings = load_settings(&args.config)?;
    if let Some(v) = args.server_url {
        settings.server_url = v;
    }
    if let Some(v) = args.debounce_ms {
        settings.debounce_ms = v;
    }
    if let Some(v) = args.llm_provider {
        settings.llm_provider = v;
    }
    if let Some(v) = args.download_dir {
        settings.download_dir = v;
    }

    let backend =
        HttpBackend::new(&settings.server_url)?.with_llm_provider(settings.llm_provider.clone());
    info!(
        server_url = %backend.base_url(),
        llm_provider = %settings.llm_provider,
        "starting console"
    );
    let view = Arc::new(ConsoleView::new(args.assume_yes, settings.download_dir.clone()));
    let core = InteractionCore::new(
        Arc::new(backend) as Arc<dyn BackendApi>,
        view.clone() as Arc<dyn InteractionView>,
        CoreOptions {
            debounce_delay: settings.debounce_delay(),
            banner_ttl: settings.banner_ttl(),
            ..CoreOptions::default()
        },
    );

    core.start().await;
    println!("type 'help' for commands");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match parse(&line) {
            Ok(Some(ConsoleCommand::Quit)) => break,
            Ok(Some(command)) => run(&core, &view, command).await,
            Ok(None) => {}
            Err(err) => eprintln!("{err}"),
        }
    }

    info!(busy = ?core.flights().busy_keys(), "console closed");
    Ok(())
}

/// Runs one command. Backend-bound work is spawned so the prompt stays
/// responsive while it is in flight.
async fn run(core: &InteractionCore, view: &ConsoleView, command: ConsoleCommand) {
    match command {
        ConsoleCommand::Query(text) => {
            view.set_query_text(&text);
            debug!(outcome = ?core.query.submit(), "query submitted");
        }
        ConsoleCommand::Type(text) => view.set_query_text(&text),
        ConsoleCommand::Submit => {
            debug!(outcome = ?core.query.submit(), "query submitted");
        }
        ConsoleCommand::Random => {
            let random = core.random_query.clone();
            tokio::spawn(async move { random.generate().await });
        }
        ConsoleCommand::Upload(path) => match read_upload(&path).await {
            Ok(file) => {
                let uploads = core.uploads.clone();
                tokio::spawn(async move { uploads.upload_from_picker(file).await });
            }
            Err(err) => eprintln!("error: {err:#}"),
        },
        ConsoleCommand::Sample(name) => {
            let uploads = core.uploads.clone();
            tokio::spawn(async move { uploads.load_sample(&name).await });
        }
        ConsoleCommand::Drag { zone, kind } => {
            let event = DragEvent::new(kind, DragPayload::file_manifest());
            if let Err(err) = core.drop_zones.dispatch(&zone, event) {
                report_zone_error(core, &err);
            }
        }
        ConsoleCommand::Drop { zone, path } => {
            let payload = match read_upload(&path).await {
                Ok(file) => DragPayload::files(vec![file]),
                Err(err) => {
                    warn!("dropped path unreadable: {err:#}");
                    DragPayload::file_manifest()
                }
            };
            match core
                .drop_zones
                .dispatch(&zone, DragEvent::new(DragEventKind::Drop, payload))
            {
                Ok(dispatch) => debug!(response = ?dispatch.response, "drop handled"),
                Err(err) => report_zone_error(core, &err),
            }
        }
        ConsoleCommand::Generate(table) => {
            let tables = core.tables.clone();
            tokio::spawn(async move { tables.generate_data(&table).await });
        }
        ConsoleCommand::Remove(table) => {
            let tables = core.tables.clone();
            tokio::spawn(async move { tables.remove_table(&table).await });
        }
        ConsoleCommand::ExportTable(table) => {
            let tables = core.tables.clone();
            tokio::spawn(async move { tables.export_table(&table).await });
        }
        ConsoleCommand::ExportResults => {
            if !core.export.panel().exportable() {
                println!("nothing to export yet");
                return;
            }
            let export = core.export.clone();
            tokio::spawn(async move { export.export_results().await });
        }
        ConsoleCommand::Toggle => {
            core.export.toggle_results();
        }
        ConsoleCommand::Schema => {
            core.schema.reload().await;
        }
        ConsoleCommand::Help => println!("{HELP}"),
        ConsoleCommand::Quit => {}
    }
}

fn report_zone_error(core: &InteractionCore, err: &ClientError) {
    let mut zones: Vec<String> = core
        .drop_zones
        .zone_ids()
        .iter()
        .map(ToString::to_string)
        .collect();
    zones.sort();
    eprintln!("error: {err} (zones: {})", zones.join(", "));
}
