use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing::debug;

use health_exposure::config::AppConfig;
use health_exposure::location_resolver::position_provider;
use health_exposure::models::NewsArticle;
use health_exposure::{
    DashboardView, EnvironmentalSnapshot, FetchOutcome, HealthApiClient, HealthExposureError,
    Location, LocationResolver, Metric, MetricDetail, NewsCard, NewsCarousel, RefreshCoordinator,
    logging, news,
};

/// Environmental health risks for where you are
#[derive(Debug, Parser)]
#[command(name = "health-exposure", version, about)]
struct Cli {
    /// Configuration file
    #[arg(short, long, global = true, env = "HEALTH_EXPOSURE_CONFIG")]
    config: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Latitude of the position to use instead of an IP lookup
    #[arg(long, global = true, requires = "lon", allow_hyphen_values = true)]
    lat: Option<f64>,

    /// Longitude of the position to use instead of an IP lookup
    #[arg(long, global = true, requires = "lat", allow_hyphen_values = true)]
    lon: Option<f64>,

    /// Place name or "lat,lon" to look up instead of the current position
    #[arg(short, long, global = true, conflicts_with_all = ["lat", "lon"])]
    location: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Fetch once and show the risk-sorted dashboard
    Dashboard,
    /// Load, then try a manual refresh straight away
    Refresh,
    /// Search for places
    Search {
        query: String,
    },
    /// Every field of one metric
    Detail {
        /// air_quality, uv, pollen, humidity or tap_water
        metric: Metric,
    },
    /// Recent local health news
    News {
        /// List every article, older ones included, newest first
        #[arg(long)]
        all: bool,
    },
    /// Show the configuration file location
    Config {
        /// Write a commented template if no file exists yet
        #[arg(long)]
        init: bool,
    },
    /// Rotate through recent news
    Watch {
        /// Number of rotations before exiting
        #[arg(long, default_value_t = 5)]
        cycles: u32,
    },
}

struct App {
    config: AppConfig,
    resolver: LocationResolver<HealthApiClient>,
    coordinator: RefreshCoordinator<HealthApiClient>,
}

impl App {
    fn new(cli: &Cli) -> Result<Self> {
        let mut config = AppConfig::load_from_path(cli.config.clone())
            .context("Failed to load configuration")?;
        if cli.verbose {
            config.logging.level = "debug".to_string();
        }
        logging::init(&config.logging)?;
        debug!("Configuration loaded: {:?}", AppConfig::get_config_path());

        let client = Arc::new(HealthApiClient::new(&config.api)?);
        let provider = position_provider(&config.locate, cli.lat.zip(cli.lon))?;
        let resolver =
            LocationResolver::new(Arc::clone(&client), provider, config.locate.timeout());
        let coordinator = RefreshCoordinator::new(client, config.refresh.cooldown());

        Ok(Self {
            config,
            resolver,
            coordinator,
        })
    }

    /// Resolve the requested location and load its snapshot
    async fn fetch(&self, cli: &Cli) -> Result<(Location, EnvironmentalSnapshot)> {
        let location = match &cli.location {
            Some(text) => self.resolver.resolve(text).await?,
            None => self.resolver.current_location().await?,
        };

        match self.coordinator.load(location.clone()).await? {
            FetchOutcome::Accepted(snapshot) => Ok((location, snapshot)),
            FetchOutcome::Superseded => anyhow::bail!("Request was superseded"),
        }
    }

    fn dashboard(&self, snapshot: &EnvironmentalSnapshot, location: &Location) -> DashboardView {
        DashboardView::build_at(
            snapshot,
            &self.config.risk,
            Utc::now(),
            self.config.refresh.recent_news_window(),
        )
        .with_fallback_location(location)
    }

    fn news_card(&self, snapshot: &EnvironmentalSnapshot) -> NewsCard {
        NewsCard::from_feed(
            &snapshot.news,
            Utc::now(),
            self.config.refresh.recent_news_window(),
        )
    }
}

/// Runs without loading the file, so a broken config can still be located
fn show_config(cli: &Cli, init: bool) -> Result<()> {
    let path = if init {
        Some(AppConfig::write_template()?)
    } else {
        cli.config.clone().or_else(AppConfig::get_config_path)
    };
    match path {
        Some(path) if path.exists() => println!("{}", path.display()),
        Some(path) => println!("{} (not created yet, using defaults)", path.display()),
        None => println!("No configuration directory available, using defaults"),
    }
    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    if let Command::Config { init } = cli.command {
        return show_config(&cli, init);
    }
    let app = App::new(&cli)?;

    match &cli.command {
        Command::Config { .. } => {}
        Command::Search { query } => {
            let results = app.resolver.search(query).await?;
            if results.is_empty() {
                println!("No places found for '{query}'");
            }
            for result in results {
                println!(
                    "{}  ({})",
                    result.location.name,
                    result.location.format_coordinates()
                );
            }
        }
        Command::Dashboard => {
            let (location, snapshot) = app.fetch(&cli).await?;
            print!("{}", app.dashboard(&snapshot, &location));
        }
        Command::Refresh => {
            let (location, snapshot) = app.fetch(&cli).await?;
            print!("{}", app.dashboard(&snapshot, &location));

            match app.coordinator.refresh().await {
                Ok(FetchOutcome::Accepted(fresh)) => {
                    println!();
                    print!("{}", app.dashboard(&fresh, &location));
                }
                Ok(FetchOutcome::Superseded) => {}
                Err(err @ HealthExposureError::RefreshCooldown { .. }) => {
                    println!();
                    println!("{}", err.user_message());
                }
                Err(err) => return Err(err.into()),
            }
        }
        Command::Detail { metric } => {
            let (_, snapshot) = app.fetch(&cli).await?;
            print!(
                "{}",
                MetricDetail::build(*metric, &snapshot.data, &app.config.risk)
            );
        }
        Command::News { all: true } => {
            let (_, snapshot) = app.fetch(&cli).await?;
            let articles = news::sorted_by_date(&snapshot.news.articles);
            if articles.is_empty() {
                println!("{}", news::NO_NEWS);
            }
            articles.into_iter().for_each(print_article);
        }
        Command::News { all: false } => {
            let (_, snapshot) = app.fetch(&cli).await?;
            let card = app.news_card(&snapshot);
            match card.message() {
                Some(message) => {
                    println!("{message}");
                    if matches!(card, NewsCard::NoneRecent { .. }) {
                        println!("Run `health-exposure news --all` to view older news");
                    }
                }
                None => card.articles().iter().for_each(print_article),
            }
        }
        Command::Watch { cycles } => {
            let (_, snapshot) = app.fetch(&cli).await?;
            let card = app.news_card(&snapshot);
            if let Some(message) = card.message() {
                println!("{message}");
                return Ok(());
            }

            let articles = card.articles();
            let mut carousel =
                NewsCarousel::spawn(articles.len(), app.config.refresh.carousel_interval());
            print_article(&articles[carousel.current()]);
            for _ in 0..*cycles {
                let Some(index) = carousel.changed().await else {
                    break;
                };
                print_article(&articles[index]);
            }
            carousel.stop();
        }
    }

    Ok(())
}

fn print_article(article: &NewsArticle) {
    println!("• {}", article.title);
    if !article.description.is_empty() {
        println!("  {}", article.description);
    }
    let meta: Vec<&str> = [article.source.as_deref(), article.pub_date.as_deref()]
        .into_iter()
        .flatten()
        .collect();
    if !meta.is_empty() {
        println!("  {}", meta.join(" · "));
    }
    if let Some(link) = &article.link {
        println!("  {link}");
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            match err.downcast_ref::<HealthExposureError>() {
                Some(e) => eprintln!("{}", e.user_message()),
                None => eprintln!("Error: {err:#}"),
            }
            debug!("{err:?}");
            ExitCode::FAILURE
        }
    }
}
