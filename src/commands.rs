use serde_json::Value;
use toolbelt::config::Settings;
use toolbelt::http::{Body, HttpClient, RequestOptions, Response, ResponseBody};
use toolbelt::prefs::{PreferenceSchema, PreferenceStore, PrefsError, SerialNumbering};
use toolbelt::tabular::{self, TableFormat, TabularError};
use tracing::{info, warn};

use crate::cli::{Cli, Commands, FormatArg, PrefsCommand, RequestArgs, TableCommand};

pub async fn run(cli: Cli) -> toolbelt::Result<()> {
    let settings = match &cli.config {
        Some(path) => Settings::load_from_path(path)?,
        None => Settings::load()?,
    };

    match cli.command {
        Commands::Get(args) => {
            let client = HttpClient::new(&settings.http)?;
            let response = client
                .get(&args.request.url, request_options(&args.request))
                .await?;
            print_response(&response);
        }
        Commands::Post(args) => {
            let client = HttpClient::new(&settings.http)?;
            let body = match args.body {
                Some(text) if args.json => Some(Body::Json(parse_json_body(&text)?)),
                Some(text) => Some(Body::Text(text)),
                None => None,
            };
            let response = client
                .post(&args.request.url, body, request_options(&args.request))
                .await?;
            print_response(&response);
        }
        Commands::Prefs(command) => run_prefs(command, &settings)?,
        Commands::Table(command) => run_table(command, &settings)?,
    }

    Ok(())
}

fn request_options(args: &RequestArgs) -> RequestOptions {
    let mut options = RequestOptions::new();
    for (key, value) in &args.params {
        options = options.param(key, value);
    }
    for (name, value) in &args.headers {
        options = options.header(name, value);
    }
    if let Some(timeout) = args.timeout {
        options = options.timeout(timeout.as_duration());
    }
    options
}

fn parse_json_body(text: &str) -> toolbelt::Result<Value> {
    serde_json::from_str(text).map_err(|e| {
        toolbelt::http::HttpError::InvalidArgument(format!("body is not valid JSON: {e}")).into()
    })
}

fn print_response(response: &Response) {
    if response.is_success() {
        info!(status = response.status, "Response received");
    } else {
        warn!(status = response.status, "Response has a non-success status");
    }

    match &response.body {
        ResponseBody::Json(value) => println!("{value:#}"),
        ResponseBody::Text(text) => println!("{text}"),
    }
}

fn run_prefs(command: PrefsCommand, settings: &Settings) -> toolbelt::Result<()> {
    let store = PreferenceStore::new(PreferenceSchema::serial_numbering());
    let resolve = |path: Option<std::path::PathBuf>| path.unwrap_or_else(|| settings.prefs.path.clone());

    match command {
        PrefsCommand::Show(arg) => {
            let set = store.load(&resolve(arg.path))?;
            for (key, value) in set.iter() {
                println!("{key} = {value}");
            }
        }
        PrefsCommand::Set { key, value, path } => {
            let path = resolve(path.path);
            let mut set = store.load(&path)?;
            set.set_from_str(&key, &value)?;
            SerialNumbering::from_set(&set)?;
            store.save(&set, &path)?;
            info!(key = %key, path = %path.display(), "Preference saved");
        }
        PrefsCommand::NextSerial { latest, path } => {
            let set = store.load(&resolve(path.path))?;
            let numbering = SerialNumbering::from_set(&set)?;
            let next = numbering.next_after(latest).map_err(PrefsError::from)?;
            println!("{next}");
        }
    }

    Ok(())
}

fn run_table(command: TableCommand, settings: &Settings) -> toolbelt::Result<()> {
    match command {
        TableCommand::Show { file } => {
            let table = tabular::read(&file, &settings.tabular)?;
            for record in table.records() {
                let line = serde_json::to_string(&record)
                    .map_err(|e| TabularError::Encode(e.to_string()))?;
                println!("{line}");
            }
        }
        TableCommand::Convert {
            input,
            output,
            format,
        } => {
            let table = tabular::read(&input, &settings.tabular)?;
            match format {
                Some(FormatArg::Csv) => {
                    tabular::write_as(&table, &output, TableFormat::Delimited, &settings.tabular)?
                }
                Some(FormatArg::Xlsx) => {
                    tabular::write_as(&table, &output, TableFormat::Workbook, &settings.tabular)?
                }
                None => tabular::write(&table, &output, &settings.tabular)?,
            }
        }
    }

    Ok(())
}
