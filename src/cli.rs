use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use toolbelt::humanize::HumanDuration;

#[derive(Parser, Debug)]
#[command(name = "toolbelt")]
#[command(about = "HTTP, preference and table utilities", long_about = None)]
pub struct Cli {
    /// Settings file (defaults to config/toolbelt.toml or TOOLBELT_CONFIG)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Send a GET request and print the response body
    Get(GetArgs),
    /// Send a POST request and print the response body
    Post(PostArgs),
    /// Inspect or edit the preference file
    #[command(subcommand)]
    Prefs(PrefsCommand),
    /// Read and convert delimited text or workbook files
    #[command(subcommand)]
    Table(TableCommand),
}

#[derive(clap::Args, Debug)]
pub struct RequestArgs {
    /// Absolute URL, or a path relative to http.base_url
    pub url: String,

    /// Query parameter as key=value (repeatable)
    #[arg(long = "param", value_parser = parse_key_value)]
    pub params: Vec<(String, String)>,

    /// Header as name=value (repeatable)
    #[arg(long = "header", value_parser = parse_key_value)]
    pub headers: Vec<(String, String)>,

    /// Per-request timeout such as 5s or 250ms
    #[arg(long)]
    pub timeout: Option<HumanDuration>,
}

#[derive(clap::Args, Debug)]
pub struct GetArgs {
    #[command(flatten)]
    pub request: RequestArgs,
}

#[derive(clap::Args, Debug)]
pub struct PostArgs {
    #[command(flatten)]
    pub request: RequestArgs,

    /// Request body
    #[arg(long)]
    pub body: Option<String>,

    /// Send the body as JSON instead of plain text
    #[arg(long, requires = "body")]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum PrefsCommand {
    /// Print every preference
    Show(PrefsPathArg),
    /// Set one preference; `null` clears it
    Set {
        key: String,
        value: String,
        #[command(flatten)]
        path: PrefsPathArg,
    },
    /// Print the next serial number this station may use
    NextSerial {
        latest: u64,
        #[command(flatten)]
        path: PrefsPathArg,
    },
}

#[derive(clap::Args, Debug)]
pub struct PrefsPathArg {
    /// Preference file (defaults to prefs.path from settings)
    #[arg(long)]
    pub path: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum TableCommand {
    /// Print each record as a JSON line
    Show { file: PathBuf },
    /// Rewrite a table in another format
    Convert {
        input: PathBuf,
        output: PathBuf,
        /// Output format; inferred from the output extension when omitted
        #[arg(long, value_enum)]
        format: Option<FormatArg>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum FormatArg {
    Csv,
    Xlsx,
}

fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got {raw:?}"))?;
    if key.trim().is_empty() {
        return Err(format!("empty key in {raw:?}"));
    }
    Ok((key.trim().to_string(), value.to_string()))
}
