use serde::Deserialize;
use std::path::PathBuf;
use tracing::{debug, warn};

pub const DEFAULT_USER_AGENT: &str = concat!(
    "opendata/",
    env!("CARGO_PKG_VERSION"),
    " (https://github.com/tbo47/ez-opendata)"
);

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

// Overpass queries run with a 25s server-side timeout
fn default_timeout_secs() -> u64 {
    30
}

fn default_language() -> String {
    "en".to_string()
}

fn default_overpass_url() -> String {
    "https://overpass-api.de/api/interpreter".to_string()
}

fn default_nominatim_url() -> String {
    "https://nominatim.openstreetmap.org/search".to_string()
}

fn default_wikipedia_url() -> String {
    "https://{language}.wikipedia.org/w/api.php".to_string()
}

fn default_wikidata_sparql_url() -> String {
    "https://query.wikidata.org/bigdata/namespace/wdq/sparql".to_string()
}

fn default_commons_url() -> String {
    "https://commons.wikimedia.org/w/api.php".to_string()
}

/// Settings shared by every outbound request
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct HttpConfig {
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Base URLs of the upstream services
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Endpoints {
    #[serde(default = "default_overpass_url")]
    pub overpass_url: String,
    #[serde(default = "default_nominatim_url")]
    pub nominatim_url: String,
    /// `{language}` is replaced with the wiki language code
    #[serde(default = "default_wikipedia_url")]
    pub wikipedia_url: String,
    #[serde(default = "default_wikidata_sparql_url")]
    pub wikidata_sparql_url: String,
    #[serde(default = "default_commons_url")]
    pub commons_url: String,
}

impl Endpoints {
    pub fn wikipedia_api_url(&self, language: &str) -> String {
        self.wikipedia_url.replace("{language}", language)
    }
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            overpass_url: default_overpass_url(),
            nominatim_url: default_nominatim_url(),
            wikipedia_url: default_wikipedia_url(),
            wikidata_sparql_url: default_wikidata_sparql_url(),
            commons_url: default_commons_url(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Config {
    /// Language used by Wikipedia and the Commons picture of the day when
    /// the caller does not pick one
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub endpoints: Endpoints,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            language: default_language(),
            http: HttpConfig::default(),
            endpoints: Endpoints::default(),
        }
    }
}

impl Config {
    pub fn from_toml(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    /// Load the first readable config file from the standard locations
    pub fn load() -> Option<Self> {
        Self::load_from(&get_config_paths())
    }

    pub fn load_from(paths: &[PathBuf]) -> Option<Self> {
        for path in paths {
            if path.exists()
                && let Ok(contents) = std::fs::read_to_string(path)
            {
                match Self::from_toml(&contents) {
                    Ok(config) => {
                        debug!(path = %path.display(), "Loaded config file");
                        return Some(config);
                    }
                    Err(e) => {
                        warn!("Failed to parse config file {}: {}", path.display(), e);
                    }
                }
            }
        }
        None
    }
}

fn get_config_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    paths.push(PathBuf::from("opendata.toml"));
    paths.push(PathBuf::from(".opendata.toml"));

    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("opendata").join("config.toml"));
        paths.push(config_dir.join("opendata.toml"));
    }

    if let Some(home) = dirs::home_dir() {
        paths.push(home.join(".opendata.toml"));
        paths.push(home.join(".config").join("opendata").join("config.toml"));
    }

    paths
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.language, "en");
        assert_eq!(
            config.endpoints.overpass_url,
            "https://overpass-api.de/api/interpreter"
        );
        assert_eq!(
            config.endpoints.wikipedia_api_url("fr"),
            "https://fr.wikipedia.org/w/api.php"
        );
    }

    #[test]
    fn test_partial_override() {
        let config = Config::from_toml(
            r#"
language = "fr"

[http]
timeout_secs = 90

[endpoints]
overpass_url = "https://overpass.private.coffee/api/interpreter"
"#,
        )
        .unwrap();

        assert_eq!(config.language, "fr");
        assert_eq!(config.http.timeout_secs, 90);
        assert_eq!(config.http.user_agent, DEFAULT_USER_AGENT);
        assert_eq!(
            config.endpoints.overpass_url,
            "https://overpass.private.coffee/api/interpreter"
        );
        assert_eq!(config.endpoints.commons_url, default_commons_url());
    }

    #[test]
    fn test_load_from_skips_invalid_files() {
        let dir = tempfile::tempdir().unwrap();
        let broken = dir.path().join("broken.toml");
        let missing = dir.path().join("missing.toml");
        let valid = dir.path().join("opendata.toml");
        fs::write(&broken, "language = [").unwrap();
        fs::write(&valid, "language = \"de\"").unwrap();

        let config = Config::load_from(&[missing, broken, valid]).unwrap();
        assert_eq!(config.language, "de");
    }

    #[test]
    fn test_load_from_nothing() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Config::load_from(&[dir.path().join("nope.toml")]).is_none());
    }
}
