use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use mg_download::app::{App, FetchOptions};
use mg_download::auth::Credentials;
use mg_download::catalog::CatalogHttpClient;
use mg_download::config::ConfigLoader;
use mg_download::domain::Identifier;
use mg_download::error::MgError;
use mg_download::output::{ConsoleProgress, JsonOutput, TsvOutput};
use mg_download::store::DownloadTree;

#[derive(Parser)]
#[command(name = "mg-download")]
#[command(about = "List available files for a project or metagenome id, or download them")]
#[command(after_help = "EXAMPLES:\n    mg-download --metagenome mgm4441680.3 --list")]
#[command(version, author)]
struct Cli {
    /// Communities API url
    #[arg(long)]
    url: Option<String>,

    /// OAuth username
    #[arg(long)]
    user: Option<String>,

    /// OAuth password
    #[arg(long)]
    passwd: Option<String>,

    /// OAuth token
    #[arg(long)]
    token: Option<String>,

    /// Project ID
    #[arg(long)]
    project: Option<String>,

    /// Metagenome ID
    #[arg(long)]
    metagenome: Option<String>,

    /// File ID for given project or metagenome
    #[arg(long = "file")]
    file_id: Option<String>,

    /// Directory to do downloads
    #[arg(long, default_value = ".")]
    dir: PathBuf,

    /// List files and their info for given ID
    #[arg(long)]
    list: bool,

    /// Print the listing as JSON instead of tab-separated text
    #[arg(long, requires = "list")]
    json: bool,

    /// Config file with default url and token
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        match report.downcast_ref::<MgError>() {
            Some(err) if err.is_usage() => eprintln!("ERROR: {err}"),
            _ => eprintln!("{report:?}"),
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let identifier = Identifier::from_options(cli.project.as_deref(), cli.metagenome.as_deref())?;
    check_dir(&cli.dir)?;

    let resolved = ConfigLoader::resolve(cli.config.as_deref(), cli.url.as_deref())?;
    let credentials = Credentials {
        token: cli.token,
        user: cli.user,
        passwd: cli.passwd,
        stored: resolved.token,
    };
    let token = credentials.acquire(&resolved.api, |header| {
        CatalogHttpClient::new(Some(header))
    })?;

    let client = CatalogHttpClient::new(token.as_ref())?;
    let app = App::new(client, resolved.api);

    if cli.list {
        let result = app.list(&identifier, &ConsoleProgress)?;
        if cli.json {
            JsonOutput::print_list(&result).into_diagnostic()?;
        } else {
            TsvOutput::print_list(&result).into_diagnostic()?;
        }
        return Ok(());
    }

    let options = FetchOptions {
        dest: cli.dir,
        file_id: cli.file_id,
    };
    app.fetch(&identifier, &options, &ConsoleProgress)?;
    Ok(())
}

fn check_dir(dir: &Path) -> Result<(), MgError> {
    DownloadTree::new(dir, None).map(|_| ())
}
