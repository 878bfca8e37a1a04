//! Command line client for the admin list endpoints.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use dotenvy::dotenv;

use pushkind_leads::domain::query::SortDirection;
use pushkind_leads::domain::types::RecordId;
use pushkind_leads::dto::export::{ExportColumn, ExportTable};
use pushkind_leads::endpoints::csv::CsvExportSink;
use pushkind_leads::endpoints::http::HttpEndpoints;
use pushkind_leads::endpoints::notify::LogNotifier;
use pushkind_leads::forms::record::StatusForm;
use pushkind_leads::models::config::{load_config, load_config_file};
use pushkind_leads::pagination::PageSummary;
use pushkind_leads::services::{export, list, mutation};
use pushkind_leads::{ListController, ServiceResult};

#[derive(Debug, Parser)]
#[command(name = "pushkind-leads", version, about = "Browse and export admin record lists")]
struct Cli {
    /// Settings profile loaded from `config/{profile}.yaml`.
    #[arg(long, env = "APP_ENV", default_value = "local")]
    profile: String,

    /// Read settings from this YAML file instead of `config/`.
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(flatten)]
    query: QueryArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Args)]
struct QueryArgs {
    /// Free-text search.
    #[arg(long, global = true)]
    search: Option<String>,

    /// Field filter as `name=value`, repeatable.
    #[arg(long = "filter", value_parser = parse_filter, global = true)]
    filters: Vec<(String, String)>,

    /// Sort as `key` or `key:asc|desc`.
    #[arg(long, value_parser = parse_sort, global = true)]
    sort: Option<(String, SortDirection)>,

    /// Records per page.
    #[arg(long, global = true)]
    page_size: Option<u32>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print one page of records.
    List {
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    /// Write every matching record to a CSV file.
    Export { output: PathBuf },
    /// Change the status of a record on the given page.
    Status {
        id: i64,
        status: String,
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    /// Delete records by id.
    Delete {
        #[arg(required = true)]
        ids: Vec<i64>,
    },
}

fn parse_filter(value: &str) -> Result<(String, String), String> {
    match value.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(format!("expected name=value, got '{value}'")),
    }
}

fn parse_sort(value: &str) -> Result<(String, SortDirection), String> {
    match value.split_once(':') {
        Some((key, direction)) => direction
            .parse()
            .map(|direction| (key.trim().to_string(), direction))
            .map_err(|err| format!("{err}")),
        None => Ok((value.trim().to_string(), SortDirection::Asc)),
    }
}

fn apply_query(controller: &mut ListController, args: &QueryArgs) -> ServiceResult<()> {
    if let Some(size) = args.page_size {
        controller.set_page_size(size)?;
    }
    if let Some(search) = &args.search {
        controller.input_search(search.clone(), std::time::Instant::now());
        controller.flush_search();
    }
    for (name, value) in &args.filters {
        controller.set_filter(name, value.clone())?;
    }
    if let Some((key, direction)) = &args.sort {
        controller.set_sort(key, *direction)?;
    }
    Ok(())
}

fn print_page(controller: &ListController, columns: &[ExportColumn]) {
    let table = ExportTable::build(controller.records(), columns);
    println!("{}", table.headers.join("\t"));
    for row in &table.rows {
        println!("{}", row.join("\t"));
    }

    let summary = PageSummary::from_controller(controller);
    let pages: Vec<String> = summary
        .pages
        .iter()
        .map(|page| match page {
            Some(page) if *page == summary.page => format!("[{page}]"),
            Some(page) => page.to_string(),
            None => "...".to_string(),
        })
        .collect();
    println!(
        "\n{} records, page {} of {}: {}",
        summary.total_items,
        summary.page,
        summary.total_pages,
        pages.join(" ")
    );
}

#[tokio::main]
async fn main() {
    dotenv().ok(); // Load .env file
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config_file(path),
        None => load_config(&cli.profile),
    };
    let config = match config {
        Ok(config) => config,
        Err(err) => {
            log::error!("Error loading settings: {err}");
            std::process::exit(1);
        }
    };

    let settings = match config.controller_settings() {
        Ok(settings) => settings,
        Err(err) => {
            log::error!("Invalid list settings: {err}");
            std::process::exit(1);
        }
    };

    let endpoints = match HttpEndpoints::new(&config) {
        Ok(endpoints) => endpoints,
        Err(err) => {
            log::error!("Cannot build HTTP client: {err}");
            std::process::exit(1);
        }
    };

    let notifier = LogNotifier;
    let mut controller = ListController::new(settings);
    if let Err(err) = apply_query(&mut controller, &cli.query) {
        log::error!("{err}");
        std::process::exit(2);
    }

    let result = match cli.command {
        Command::List { page } => {
            controller.set_page(page);
            list::sync(&mut controller, &endpoints, &notifier)
                .await
                .map(|_| print_page(&controller, &config.export_columns))
        }
        Command::Export { output } => {
            let sink = CsvExportSink::new(output);
            export::export_records(
                &controller,
                &endpoints,
                &sink,
                &notifier,
                &config.export_columns,
            )
            .await
            .map(|_| ())
        }
        Command::Status { id, status, page } => {
            controller.set_page(page);
            match list::sync(&mut controller, &endpoints, &notifier).await {
                Ok(_) => mutation::submit_status_form(
                    &mut controller,
                    &endpoints,
                    &notifier,
                    StatusForm { id, status },
                )
                .await
                .map(|_| ()),
                Err(err) => Err(err),
            }
        }
        Command::Delete { ids } => {
            let mut selected: ServiceResult<()> = Ok(());
            for id in ids {
                match RecordId::new(id) {
                    Ok(id) => {
                        controller.toggle_selected(id);
                    }
                    Err(err) => {
                        selected = Err(err.into());
                        break;
                    }
                }
            }
            match selected {
                Ok(()) => mutation::delete_selected(&mut controller, &endpoints, &notifier)
                    .await
                    .map(|_| ()),
                Err(err) => Err(err),
            }
        }
    };

    if let Err(err) = result {
        log::error!("{err}");
        std::process::exit(1);
    }
}
