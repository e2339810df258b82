use ticker_dashboard::config::Config;
use ticker_dashboard::models::query::Query;
use ticker_dashboard::providers::opencage::OpenCage;
use ticker_dashboard::providers::yahoo::YahooFinance;
use ticker_dashboard::render::Renderer;
use ticker_dashboard::server::{self, AppState};
use ticker_dashboard::services::controller::{CycleOutcome, ViewController};

use anyhow::{bail, Context};
use chrono::{Local, NaiveDate};
use clap::{App, Arg, ArgMatches, SubCommand};
use log::{info, warn};
use std::sync::Arc;
use std::time::Duration;

fn timeout_arg() -> Arg<'static> {
    Arg::with_name("timeout")
        .long("timeout")
        .value_name("SECS")
        .help("Timeout for each outbound request")
        .takes_value(true)
        .default_value("10")
}

fn ticker_arg() -> Arg<'static> {
    Arg::with_name("ticker")
        .short('t')
        .long("ticker")
        .value_name("TICKER")
        .help("Ticker symbol (defaults to AAPL)")
        .takes_value(true)
}

/// Defaults, overridden by the environment and the command line
fn build_config(matches: &ArgMatches) -> anyhow::Result<Config> {
    let timeout_secs = matches
        .value_of("timeout")
        .unwrap_or("10")
        .parse::<u64>()
        .context("--timeout must be a whole number of seconds")?;

    let mut config = Config::new()
        .with_request_timeout(Duration::from_secs(timeout_secs))
        .with_opencage_api_key(std::env::var("OPENCAGE_API_KEY").ok());

    if let Some(ticker) = matches.value_of("ticker") {
        config = config.with_default_ticker(ticker);
    }
    if config.opencage_api_key.is_none() {
        warn!("OPENCAGE_API_KEY is not set; maps will show a geocoding error");
    }
    Ok(config)
}

fn parse_date(matches: &ArgMatches, name: &str, default: NaiveDate) -> anyhow::Result<NaiveDate> {
    match matches.value_of(name) {
        Some(value) => NaiveDate::parse_from_str(value, "%Y-%m-%d")
            .with_context(|| format!("--{} must be YYYY-MM-DD, got {}", name, value)),
        None => Ok(default),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init();

    let app = App::new("ticker_dashboard")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Stock dashboard: price chart, company statistics and headquarters map")
        .subcommand(
            SubCommand::with_name("serve")
                .about("Run the web dashboard")
                .arg(
                    Arg::with_name("bind")
                        .short('b')
                        .long("bind")
                        .value_name("ADDR")
                        .help("Address to listen on")
                        .takes_value(true)
                        .default_value("127.0.0.1:8888"),
                )
                .arg(
                    Arg::with_name("max-sessions")
                        .long("max-sessions")
                        .value_name("N")
                        .help("Number of browser sessions kept in memory")
                        .takes_value(true)
                        .default_value("256"),
                )
                .arg(ticker_arg())
                .arg(timeout_arg()),
        )
        .subcommand(
            SubCommand::with_name("render")
                .about("Run one fetch cycle and write a static HTML page")
                .arg(ticker_arg())
                .arg(
                    Arg::with_name("start")
                        .short('s')
                        .long("start")
                        .value_name("DATE")
                        .help("First day (YYYY-MM-DD), defaults to one year ago")
                        .takes_value(true),
                )
                .arg(
                    Arg::with_name("end")
                        .short('e')
                        .long("end")
                        .value_name("DATE")
                        .help("Last day (YYYY-MM-DD), defaults to yesterday")
                        .takes_value(true),
                )
                .arg(
                    Arg::with_name("output")
                        .short('o')
                        .long("output")
                        .value_name("FILE")
                        .help("Write the page here instead of stdout")
                        .takes_value(true),
                )
                .arg(timeout_arg()),
        );

    let matches = app.get_matches();

    if let Some(matches) = matches.subcommand_matches("serve") {
        let max_sessions = matches
            .value_of("max-sessions")
            .unwrap_or("256")
            .parse::<usize>()
            .context("--max-sessions must be a number")?;
        let config = build_config(matches)?
            .with_bind_addr(matches.value_of("bind").unwrap_or("127.0.0.1:8888"))
            .with_max_sessions(max_sessions);

        let market = Arc::new(YahooFinance::new(&config)?);
        let geocoder = Arc::new(OpenCage::new(&config)?);
        let state = Arc::new(AppState::new(config, market, geocoder)?);
        server::serve(state).await?;
    } else if let Some(matches) = matches.subcommand_matches("render") {
        let config = build_config(matches)?;
        let today = Local::now().date_naive();
        let defaults = Query::default_at(&config, today);

        let start = parse_date(matches, "start", defaults.start_date)?;
        let end = parse_date(matches, "end", defaults.end_date)?;
        let query = Query::new(&config.default_ticker, start, end)?;

        let market = Arc::new(YahooFinance::new(&config)?);
        let geocoder = Arc::new(OpenCage::new(&config)?);
        let controller = ViewController::new(&config, market, geocoder);

        let published = match controller.run_cycle(query.clone()).await {
            CycleOutcome::Published(published) => published,
            CycleOutcome::Superseded { cycle } => bail!("cycle {} was superseded", cycle),
        };
        let page = Renderer::new()?.page(&query, today, Some(&published.view), false)?;

        match matches.value_of("output") {
            Some(path) => {
                std::fs::write(path, page).with_context(|| format!("writing {}", path))?;
                info!("Wrote {} dashboard to {}", query.ticker, path);
            }
            None => println!("{}", page),
        }
    } else {
        info!("No command specified. Use --help for usage information.");
    }

    Ok(())
}
