use std::fs::File;
use std::io;
use std::num::NonZeroUsize;
use std::path::PathBuf;

use carsurf_crawler::{
    check_site, crawl_site, parse_limit, parse_zip, scrap_single_listing, CrawlError,
    CrawlerConfig, OnError, SearchFilter, WebDriverSession, Zip,
};
use carsurf_sheet::{CsvDialect, SheetTarget, SheetWriter, DEFAULT_OUTPUT};
use clap::{CommandFactory, Parser};
use clap_complete::{generate, Shell};
use tokio::runtime;

mod prompt;

const DEFAULT_LOG_FILTER: &str = "carsurf=info,carsurf_crawler=info,carsurf_sheet=info";

/// Vehicle listing crawler
#[derive(Debug, Parser)]
#[command(version)]
pub struct Args {
    #[command(subcommand)]
    pub cmd: SubCommand,
}

#[derive(Debug, clap::Subcommand)]
pub enum SubCommand {
    #[command(name = "search")]
    Search(SearchArgs),
    #[command(name = "listing")]
    Listing(ListingArgs),
    #[command(name = "check")]
    Check(CheckArgs),
    #[command(hide = true)]
    Completion,
}

#[derive(Debug, clap::Args)]
pub struct SessionArgs {
    /// Optional default crawler yaml configuration file
    #[arg(env = "CARSURF_CRAWLER_CONFIG", long)]
    pub crawler_config: Option<PathBuf>,
    /// Override the path to the chromedriver executable
    #[arg(env = "DRIVER_PATH", long)]
    pub driver_path: Option<PathBuf>,
    /// Override the port chromedriver listens on
    #[arg(long)]
    pub driver_port: Option<u16>,
    /// Override the seconds to wait for pages to settle and load
    #[arg(env = "WAIT_TIME", long)]
    pub wait_time: Option<u64>,
    /// Override the search results page
    #[arg(long)]
    pub search_url: Option<String>,
    /// Show the browser window
    #[arg(long)]
    pub no_headless: bool,
    /// When quiet no logs are outputted
    #[arg(long, short)]
    pub quiet: bool,
}

impl TryFrom<&SessionArgs> for CrawlerConfig {
    type Error = anyhow::Error;

    fn try_from(args: &SessionArgs) -> Result<Self, Self::Error> {
        let mut conf = if let Some(file) = args.crawler_config.as_ref().map(File::open) {
            serde_yaml::from_reader(file?)?
        } else {
            CrawlerConfig::default()
        };
        if let Some(driver_path) = &args.driver_path {
            conf.driver_path = driver_path.clone();
        }
        if let Some(driver_port) = args.driver_port {
            conf.driver_port = driver_port;
        }
        if let Some(wait_time) = args.wait_time {
            conf.wait_time = wait_time;
        }
        if let Some(search_url) = &args.search_url {
            conf.search_url = search_url.to_string();
        }
        if args.no_headless {
            conf.headless = false;
        }
        Ok(conf)
    }
}

/// Search listings and save them to a spreadsheet
#[derive(Debug, clap::Args)]
pub struct SearchArgs {
    #[command(flatten)]
    pub session: SessionArgs,
    /// Search radius as offered by the site, e.g. "50 mi."
    #[arg(long)]
    pub radius: Option<String>,
    /// Zip code the radius is measured from
    #[arg(long, value_parser = zip_arg)]
    pub zip: Option<Zip>,
    /// Maximum number of listings to visit
    #[arg(long, short = 'n', value_parser = limit_arg)]
    pub limit: Option<NonZeroUsize>,
    /// Don't ask for radius, zip and limit when none is given
    #[arg(long)]
    pub no_prompt: bool,
    /// Output file, `.xlsx` for a workbook, `-` for CSV on stdout, CSV otherwise
    #[arg(long, short, default_value = DEFAULT_OUTPUT)]
    pub output: PathBuf,
    /// Field separator of CSV output
    #[arg(long, default_value_t = ',')]
    pub csv_delimiter: char,
    /// Escape quotes in CSV output with this character instead of doubling them
    #[arg(long)]
    pub csv_escape: Option<char>,
    /// End CSV lines with `\r\n`
    #[arg(long)]
    pub csv_crlf: bool,
    /// Override crawler's listing error handling strategy
    #[arg(value_enum, long)]
    pub on_listing_error: Option<OnError>,
}

fn zip_arg(s: &str) -> Result<Zip, String> {
    parse_zip(s).map_err(|e| e.to_string())
}

fn limit_arg(s: &str) -> Result<NonZeroUsize, String> {
    parse_limit(s).map_err(|e| e.to_string())
}

impl SearchArgs {
    fn filter(&self) -> anyhow::Result<SearchFilter> {
        if self.radius.is_none() && self.zip.is_none() && self.limit.is_none() && !self.no_prompt {
            let stdin = io::stdin();
            return prompt::ask_filter(&mut stdin.lock(), &mut io::stderr());
        }
        Ok(SearchFilter::new(
            self.radius.clone(),
            self.zip.clone(),
            self.limit,
        ))
    }

    fn dialect(&self) -> anyhow::Result<CsvDialect> {
        CsvDialect::new(self.csv_delimiter, self.csv_escape, self.csv_crlf)
    }
}

pub fn search(args: SearchArgs) -> anyhow::Result<()> {
    let mut conf: CrawlerConfig = (&args.session).try_into()?;
    if let Some(on_listing_error) = args.on_listing_error {
        conf.on_listing_error = on_listing_error;
    }
    let dialect = args.dialect()?;
    let filter = args.filter()?;
    let mut writer = SheetWriter::new(SheetTarget::from_path(&args.output)).with_dialect(dialect);

    let rt = runtime::Builder::new_current_thread().enable_all().build()?;
    let records = rt.block_on(async {
        let driver = WebDriverSession::launch(&conf)
            .await
            .map_err(CrawlError::Connectivity)?;
        crawl_site(driver, &conf, &filter, &mut writer).await
    })?;

    log::info!("Collected {} vehicles", records.len());
    Ok(())
}

/// Scrap a single listing and print it to stdout
#[derive(Debug, clap::Args)]
pub struct ListingArgs {
    #[command(flatten)]
    pub session: SessionArgs,
    /// Listing page to scrap
    pub url: String,
}

pub fn listing(args: ListingArgs) -> anyhow::Result<()> {
    let conf: CrawlerConfig = (&args.session).try_into()?;

    let rt = runtime::Builder::new_current_thread().enable_all().build()?;
    let record = rt.block_on(async {
        let driver = WebDriverSession::launch(&conf)
            .await
            .map_err(CrawlError::Connectivity)?;
        scrap_single_listing(driver, &conf, &args.url).await
    })?;

    serde_yaml::to_writer(io::stdout(), &record)?;
    Ok(())
}

/// Check that the browser starts and the search page loads
#[derive(Debug, clap::Args)]
pub struct CheckArgs {
    #[command(flatten)]
    pub session: SessionArgs,
}

pub fn check(args: CheckArgs) -> anyhow::Result<()> {
    let conf: CrawlerConfig = (&args.session).try_into()?;

    let rt = runtime::Builder::new_current_thread().enable_all().build()?;
    rt.block_on(async {
        let driver = WebDriverSession::launch(&conf)
            .await
            .map_err(CrawlError::Connectivity)?;
        check_site(driver, &conf).await
    })?;

    println!("browser set up is fine");
    Ok(())
}

fn init_logs(session: &SessionArgs) {
    if !session.quiet {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(DEFAULT_LOG_FILTER))
            .init();
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    match args.cmd {
        SubCommand::Search(args) => {
            init_logs(&args.session);
            search(args)
        }
        SubCommand::Listing(args) => {
            init_logs(&args.session);
            listing(args)
        }
        SubCommand::Check(args) => {
            init_logs(&args.session);
            check(args)
        }
        SubCommand::Completion => {
            generate(Shell::Bash, &mut Args::command(), "carsurf", &mut io::stdout());
            Ok(())
        }
    }
}
