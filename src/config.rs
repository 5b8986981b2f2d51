use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

use crate::error::{AppError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_db_path")]
    pub db_path: String,

    /// Weekday names in the order the schedule page lists its tables.
    #[serde(default = "default_days")]
    pub days: Vec<String>,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_schedule_path")]
    pub schedule_path: String,

    #[serde(default = "default_shortener_url")]
    pub shortener_url: String,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_db_path() -> String {
    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("airwatch");
    std::fs::create_dir_all(&data_dir).ok();
    data_dir.join("data.db").to_string_lossy().to_string()
}

fn default_days() -> Vec<String> {
    [
        "Monday",
        "Tuesday",
        "Wednesday",
        "Thursday",
        "Friday",
        "Saturday",
        "Sunday",
    ]
    .iter()
    .map(|d| d.to_string())
    .collect()
}

fn default_base_url() -> String {
    "https://horriblesubs.info".to_string()
}

fn default_schedule_path() -> String {
    "/release-schedule/".to_string()
}

fn default_shortener_url() -> String {
    "http://mgnet.me/api/create".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_user_agent() -> String {
    "airwatch/0.1".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            days: default_days(),
            base_url: default_base_url(),
            schedule_path: default_schedule_path(),
            shortener_url: default_shortener_url(),
            request_timeout_secs: default_request_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            let config = Config::default();
            config.save()?;
            Ok(config)
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| AppError::Config(e.to_string()))?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("airwatch")
            .join("config.toml")
    }

    fn validate(&self) -> Result<()> {
        if self.days.is_empty() {
            return Err(AppError::Config("`days` must list at least one day".to_string()));
        }
        for (i, day) in self.days.iter().enumerate() {
            if self.days[..i].contains(day) {
                return Err(AppError::Config(format!("day `{}` is listed twice", day)));
            }
        }
        Ok(())
    }

    pub fn endpoints(&self) -> Result<Endpoints> {
        Endpoints::new(&self.base_url, &self.schedule_path, &self.shortener_url)
    }
}

/// Every remote URL the scraper touches, derived from one base URL.
#[derive(Debug, Clone)]
pub struct Endpoints {
    base: Url,
    schedule: Url,
    api: Url,
    shortener: Url,
}

impl Endpoints {
    pub fn new(base_url: &str, schedule_path: &str, shortener_url: &str) -> Result<Self> {
        let base = Url::parse(base_url)?;
        let schedule = base.join(schedule_path)?;
        let api = base.join("/api.php")?;
        let shortener = Url::parse(shortener_url)?;
        Ok(Self {
            base,
            schedule,
            api,
            shortener,
        })
    }

    pub fn schedule(&self) -> &str {
        self.schedule.as_str()
    }

    /// Resolve a show's relative schedule href against the base URL.
    pub fn show_page(&self, href: &str) -> Result<String> {
        Ok(self.base.join(href)?.to_string())
    }

    pub fn latest_releases(&self) -> String {
        let mut url = self.api.clone();
        url.set_query(Some("method=getlatest"));
        url.to_string()
    }

    pub fn show_episodes(&self, show_id: i64) -> String {
        let mut url = self.api.clone();
        url.set_query(Some(&format!("method=getshows&type=show&showid={}", show_id)));
        url.to_string()
    }

    pub fn shorten(&self, link: &str) -> String {
        let mut url = self.shortener.clone();
        url.set_query(Some(&format!("m={}", urlencoding::encode(link))));
        url.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoints() -> Endpoints {
        Endpoints::new("https://example.org", "/release-schedule/", "http://short.test/api/create")
            .unwrap()
    }

    #[test]
    fn builds_remote_urls_from_base() {
        let ep = endpoints();
        assert_eq!(ep.schedule(), "https://example.org/release-schedule/");
        assert_eq!(
            ep.show_page("/shows/some-show").unwrap(),
            "https://example.org/shows/some-show"
        );
        assert_eq!(ep.latest_releases(), "https://example.org/api.php?method=getlatest");
        assert_eq!(
            ep.show_episodes(42),
            "https://example.org/api.php?method=getshows&type=show&showid=42"
        );
    }

    #[test]
    fn api_sits_at_the_site_root() {
        let ep = Endpoints::new("https://example.org/mirror/", "schedule/", "http://short.test/api/create")
            .unwrap();
        assert_eq!(ep.schedule(), "https://example.org/mirror/schedule/");
        assert_eq!(ep.latest_releases(), "https://example.org/api.php?method=getlatest");
    }

    #[test]
    fn base_that_cannot_hold_paths_is_rejected() {
        let result = Endpoints::new("mailto:shows@example.org", "/release-schedule/", "http://short.test/api/create");
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn shorten_url_encodes_magnet() {
        let url = endpoints().shorten("magnet:?xt=urn:btih:abc&dn=x y");
        assert_eq!(
            url,
            "http://short.test/api/create?m=magnet%3A%3Fxt%3Durn%3Abtih%3Aabc%26dn%3Dx%20y"
        );
    }

    #[test]
    fn partial_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "days = [\"Mon\", \"Tue\"]\nbase_url = \"https://example.org\"\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.days, vec!["Mon", "Tue"]);
        assert_eq!(config.base_url, "https://example.org");
        assert_eq!(config.schedule_path, "/release-schedule/");
        assert_eq!(config.request_timeout_secs, 30);
    }

    #[test]
    fn rejects_duplicate_days() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "days = [\"Mon\", \"Mon\"]\n").unwrap();

        assert!(matches!(Config::load_from(&path), Err(AppError::Config(_))));
    }
}
