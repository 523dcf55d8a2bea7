use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;
use tracing::debug;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use opendata::api::overpass::food_categories;
use opendata::api::{
    TagFilter, ThumbFit, WikipediaGeoSearch, commons, fetch_food_shops, fetch_pois, geocode,
    nominatim, wikidata, wikipedia,
};
use opendata::{BoundingBox, Config, LatLng, extract_diets};

/// Query OpenStreetMap, Wikipedia, Wikidata and Wikimedia Commons
///
/// Examples:
///   # Cafes and restaurants in Dakar
///   opendata pois --bbox 14.67,-17.46,14.71,-17.41 -t amenity=cafe -t amenity=restaurant
///
///   # Most common cuisines within 2km of a geocoded place
///   opendata diets --place "Dakar, Senegal" -r 2000
///
///   # Wikipedia articles around a point, in French
///   opendata wikipedia --lat 14.69 --lon -17.44 --language fr
///
///   # Thumbnails 400px high for two Commons files
///   opendata thumbs 136289240 136289206 --height 400
#[derive(Parser, Debug)]
#[command(name = "opendata")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to config file (optional, auto-searches opendata.toml if not provided)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

/// Area to search: an explicit bbox, or a radius around a point or a place
#[derive(clap::Args, Debug)]
struct AreaArgs {
    /// Bounding box as south,west,north,east
    #[arg(long, allow_hyphen_values = true, conflicts_with_all = ["lat", "place"])]
    bbox: Option<BoundingBox>,

    /// Latitude of the center (use with --lon)
    #[arg(long, requires = "lon", allow_hyphen_values = true)]
    lat: Option<f64>,

    /// Longitude of the center (use with --lat)
    #[arg(long, requires = "lat", allow_hyphen_values = true)]
    lon: Option<f64>,

    /// Place name to geocode with Nominatim
    #[arg(short = 'p', long, conflicts_with = "lat")]
    place: Option<String>,

    /// Radius in meters around --lat/--lon or --place
    #[arg(short = 'r', long, default_value = "1000")]
    radius: u32,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Points of interest matching tag filters
    Pois {
        #[command(flatten)]
        area: AreaArgs,

        /// Category as key=value (repeatable), e.g. amenity=cafe
        #[arg(short = 't', long = "tag", required = true)]
        tags: Vec<TagFilter>,
    },

    /// Cafes, restaurants, delis, ice cream parlours and fast food
    Food {
        #[command(flatten)]
        area: AreaArgs,
    },

    /// Cuisine and diet counts of the POIs in an area (food places by default)
    Diets {
        #[command(flatten)]
        area: AreaArgs,

        /// Category as key=value (repeatable)
        #[arg(short = 't', long = "tag")]
        tags: Vec<TagFilter>,
    },

    /// Geocode a place name
    Geocode {
        query: String,

        #[arg(short = 'l', long, default_value = "5")]
        limit: u32,
    },

    /// Wikipedia articles around a point
    Wikipedia {
        #[arg(long, default_value = "37", allow_hyphen_values = true)]
        lat: f64,

        #[arg(long, default_value = "-122", allow_hyphen_values = true)]
        lon: f64,

        /// Wiki language code (defaults to the configured language)
        #[arg(long)]
        language: Option<String>,

        /// Search radius in meters
        #[arg(short = 'r', long, default_value = "10000")]
        radius: u32,

        #[arg(short = 'l', long, default_value = "100")]
        limit: u32,
    },

    /// Wikidata entities with coordinates in an area
    Wikidata {
        #[command(flatten)]
        area: AreaArgs,

        #[arg(short = 'l', long, default_value_t = wikidata::DEFAULT_LIMIT)]
        limit: u32,
    },

    /// Geotagged Wikimedia Commons files in an area
    Commons {
        #[command(flatten)]
        area: AreaArgs,

        #[arg(short = 'l', long, default_value_t = commons::DEFAULT_GEOSEARCH_LIMIT)]
        limit: u32,
    },

    /// Image metadata and thumbnails of Commons files
    Thumbs {
        /// Commons page ids
        #[arg(required = true)]
        pageids: Vec<u64>,

        /// Thumbnail width in pixels (default 600)
        #[arg(long, conflicts_with = "height")]
        width: Option<u32>,

        /// Thumbnail height in pixels
        #[arg(long)]
        height: Option<u32>,
    },

    /// Uploader of a Commons file and a link to their uploads
    Author {
        /// File title, e.g. "File:Gorée.jpg"
        #[arg(long)]
        title: String,

        #[arg(long)]
        pageid: u64,

        #[arg(short = 'l', long, default_value_t = commons::DEFAULT_AUTHOR_LINK_LIMIT)]
        limit: u32,
    },

    /// Links of the Wikimedia Commons picture of the day feed
    Potd {
        /// Feed language (defaults to the configured language)
        #[arg(long)]
        language: Option<String>,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_filter = if args.verbose {
        "opendata=debug"
    } else {
        "opendata=warn"
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = if let Some(ref config_path) = args.config {
        if config_path.exists() {
            let contents = std::fs::read_to_string(config_path)
                .context(format!("Failed to read config file: {:?}", config_path))?;
            Config::from_toml(&contents).context("Failed to parse config file")?
        } else {
            bail!("Config file not found: {:?}", config_path);
        }
    } else {
        Config::load().unwrap_or_default()
    };

    debug!(?config, "Configuration");

    match args.command {
        Command::Pois { area, tags } => {
            let bbox = area.resolve(&config)?;
            let pois = run_step(
                "Fetching POIs from OpenStreetMap...",
                || fetch_pois(&config, &bbox, &tags),
                |pois| format!("Fetched {} POIs", pois.len()),
            )
            .context("Failed to fetch POIs from Overpass API")?;
            print_json(&pois)
        }
        Command::Food { area } => {
            let bbox = area.resolve(&config)?;
            let pois = run_step(
                "Fetching food places from OpenStreetMap...",
                || fetch_food_shops(&config, bbox.north_east(), bbox.south_west()),
                |pois| format!("Fetched {} food places", pois.len()),
            )
            .context("Failed to fetch food places from Overpass API")?;
            print_json(&pois)
        }
        Command::Diets { area, tags } => {
            let bbox = area.resolve(&config)?;
            let tags = if tags.is_empty() {
                food_categories()
            } else {
                tags
            };
            let pois = run_step(
                "Fetching POIs from OpenStreetMap...",
                || fetch_pois(&config, &bbox, &tags),
                |pois| format!("Fetched {} POIs", pois.len()),
            )
            .context("Failed to fetch POIs from Overpass API")?;
            print_json(&extract_diets(&pois))
        }
        Command::Geocode { query, limit } => {
            let places = run_step(
                "Geocoding...",
                || nominatim::search_places(&config, &query, limit),
                |places| format!("Found {} places", places.len()),
            )
            .context("Failed to geocode")?;
            print_json(&places)
        }
        Command::Wikipedia {
            lat,
            lon,
            language,
            radius,
            limit,
        } => {
            let search = WikipediaGeoSearch {
                center: LatLng::new(lat, lon),
                language: language.unwrap_or_else(|| config.language.clone()),
                radius_m: radius,
                limit,
            };
            let articles = run_step(
                "Searching Wikipedia...",
                || wikipedia::geosearch(&config, &search),
                |articles| format!("Found {} articles", articles.len()),
            )
            .context("Failed to query Wikipedia")?;
            print_json(&articles)
        }
        Command::Wikidata { area, limit } => {
            let bbox = area.resolve(&config)?;
            let items = run_step(
                "Querying Wikidata...",
                || wikidata::query_box(&config, bbox.north_east(), bbox.south_west(), limit),
                |items| format!("Found {} items", items.len()),
            )
            .context("Failed to query Wikidata")?;
            print_json(&items)
        }
        Command::Commons { area, limit } => {
            let bbox = area.resolve(&config)?;
            let images = run_step(
                "Searching Wikimedia Commons...",
                || commons::geosearch(&config, bbox.north_east(), bbox.south_west(), limit),
                |images| format!("Found {} images", images.len()),
            )
            .context("Failed to query Wikimedia Commons")?;
            print_json(&images)
        }
        Command::Thumbs {
            pageids,
            width,
            height,
        } => {
            let fit = match (width, height) {
                (_, Some(h)) => ThumbFit::Height(h),
                (Some(w), None) => ThumbFit::Width(w),
                (None, None) => ThumbFit::default(),
            };
            let details = run_step(
                "Fetching image info...",
                || match pageids.as_slice() {
                    &[pageid] => commons::thumb(&config, pageid, fit).map(|d| vec![d]),
                    _ => commons::thumbs(&config, &pageids, fit),
                },
                |details| format!("Fetched {} images", details.len()),
            )
            .context("Failed to fetch image info from Wikimedia Commons")?;
            print_json(&details)
        }
        Command::Author {
            title,
            pageid,
            limit,
        } => {
            let user = run_step(
                "Looking up author...",
                || commons::author(&config, &title, pageid),
                |user| format!("Uploaded by {user}"),
            )
            .context("Failed to fetch author from Wikimedia Commons")?;
            let link = commons::author_link(&user, limit);
            print_json(&serde_json::json!({ "user": user, "link": link }))
        }
        Command::Potd { language } => {
            let language = language.unwrap_or_default();
            let links = run_step(
                "Fetching picture of the day feed...",
                || commons::picture_of_the_day(&config, &language),
                |links| format!("Found {} links", links.len()),
            )
            .context("Failed to fetch picture of the day")?;
            print_json(&links)
        }
    }
}

impl AreaArgs {
    fn resolve(&self, config: &Config) -> Result<BoundingBox> {
        if let Some(bbox) = self.bbox {
            return Ok(bbox);
        }

        let center = if let (Some(lat), Some(lon)) = (self.lat, self.lon) {
            LatLng::new(lat, lon)
        } else if let Some(ref place) = self.place {
            run_step(
                "Geocoding place...",
                || geocode(config, place),
                |c| format!("Geocoded: {} -> ({:.4}, {:.4})", place, c.lat, c.lng),
            )
            .context("Failed to geocode place")?
        } else {
            bail!("Must provide --bbox, --lat and --lon, or --place");
        };

        Ok(BoundingBox::around(center, self.radius))
    }
}

/// Run one request behind a spinner, finishing with `summary` on success
fn run_step<T>(
    message: &str,
    step: impl FnOnce() -> opendata::Result<T>,
    summary: impl FnOnce(&T) -> String,
) -> opendata::Result<T> {
    let spinner = create_spinner(message);
    let start = Instant::now();

    let result = step();
    match &result {
        Ok(value) => spinner.finish_with_message(format!(
            "{} [{:.1}s]",
            summary(value),
            start.elapsed().as_secs_f32()
        )),
        Err(_) => spinner.finish_and_clear(),
    }

    result
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{json}");
    Ok(())
}

fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(80));
    pb
}
