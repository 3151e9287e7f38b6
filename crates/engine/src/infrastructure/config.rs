//! Process configuration read from the environment.

use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default upstream game-data API.
pub const DEFAULT_GAMEDATA_API_URL: &str = "https://awedtan.ca/api";

/// Default ceiling for one interactive selection window.
pub const DEFAULT_INTERACTION_WINDOW: Duration = Duration::from_secs(300);

/// Default delay between the "done" signal and closing the page.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(1000);

/// Default maximum lifetime of one render session.
pub const DEFAULT_RENDER_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable {0}")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Everything the bot reads at start-up.
#[derive(Debug, Clone)]
pub struct BotConfig {
    pub discord_token: String,
    pub gamedata_api_url: String,
    pub spine_asset_dir: PathBuf,
    /// Page that plays a skeleton and saves the animation.
    pub spine_render_url: String,
    pub spine_output_dir: PathBuf,
    pub chrome_path: PathBuf,
    pub settle_delay: Duration,
    pub render_timeout: Duration,
    pub interaction_window: Duration,
    pub id_overrides_path: Option<PathBuf>,
}

impl BotConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable lookup; empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let discord_token = get("DISCORD_TOKEN").ok_or(ConfigError::Missing("DISCORD_TOKEN"))?;
        let gamedata_api_url =
            get("GAMEDATA_API_URL").unwrap_or_else(|| DEFAULT_GAMEDATA_API_URL.to_string());
        let spine_asset_dir = PathBuf::from(get("SPINE_ASSET_DIR").unwrap_or_else(|| "assets/spine".into()));
        let spine_render_url = match get("SPINE_RENDER_URL") {
            Some(url) => url,
            None => default_render_url(&spine_asset_dir),
        };
        let spine_output_dir =
            PathBuf::from(get("SPINE_OUTPUT_DIR").unwrap_or_else(|| "spine-output".into()));
        let chrome_path = PathBuf::from(get("CHROME_PATH").unwrap_or_else(|| "chromium".into()));

        let settle_delay = parse_duration(&get, "SPINE_SETTLE_MS", Duration::from_millis)?
            .unwrap_or(DEFAULT_SETTLE_DELAY);
        let render_timeout = parse_duration(&get, "SPINE_RENDER_TIMEOUT_SECS", Duration::from_secs)?
            .unwrap_or(DEFAULT_RENDER_TIMEOUT);
        let interaction_window =
            parse_duration(&get, "INTERACTION_WINDOW_SECS", Duration::from_secs)?
                .unwrap_or(DEFAULT_INTERACTION_WINDOW);

        Ok(Self {
            discord_token,
            gamedata_api_url,
            spine_asset_dir,
            spine_render_url,
            spine_output_dir,
            chrome_path,
            settle_delay,
            render_timeout,
            interaction_window,
            id_overrides_path: get("SPINE_ID_OVERRIDES").map(PathBuf::from),
        })
    }
}

fn parse_duration(
    get: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    unit: fn(u64) -> Duration,
) -> Result<Option<Duration>, ConfigError> {
    match get(name) {
        None => Ok(None),
        Some(value) => value
            .parse::<u64>()
            .map(|n| Some(unit(n)))
            .map_err(|_| ConfigError::Invalid { name, value }),
    }
}

fn default_render_url(asset_dir: &Path) -> String {
    let page = asset_dir.join("index.html");
    let absolute = std::path::absolute(&page).unwrap_or(page);
    url::Url::from_file_path(&absolute)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| format!("file://{}", absolute.display()))
}

/// Load `.env.local` then `.env` from the repository root.
pub fn load_dotenv_from_repo_root() {
    let repo_root = Path::new(env!("CARGO_MANIFEST_DIR")).join("..").join("..");

    // Prefer local overrides.
    for filename in [".env.local", ".env"] {
        let path = repo_root.join(filename);
        if path.exists() {
            let _ = dotenvy::from_path(path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults_apply_when_only_token_is_set() {
        let config = BotConfig::from_lookup(lookup(&[("DISCORD_TOKEN", "abc")])).unwrap();
        assert_eq!(config.gamedata_api_url, DEFAULT_GAMEDATA_API_URL);
        assert_eq!(config.interaction_window, Duration::from_secs(300));
        assert_eq!(config.settle_delay, Duration::from_millis(1000));
        assert_eq!(config.render_timeout, Duration::from_secs(120));
        assert!(config.spine_render_url.starts_with("file://"));
        assert!(config.spine_render_url.ends_with("index.html"));
        assert!(config.id_overrides_path.is_none());
    }

    #[test]
    fn missing_token_is_an_error() {
        let result = BotConfig::from_lookup(lookup(&[("DISCORD_TOKEN", "  ")]));
        assert!(matches!(result, Err(ConfigError::Missing("DISCORD_TOKEN"))));
    }

    #[test]
    fn invalid_numbers_are_rejected() {
        let result = BotConfig::from_lookup(lookup(&[
            ("DISCORD_TOKEN", "abc"),
            ("SPINE_SETTLE_MS", "soon"),
        ]));
        assert!(matches!(
            result,
            Err(ConfigError::Invalid {
                name: "SPINE_SETTLE_MS",
                ..
            })
        ));
    }

    #[test]
    fn overrides_are_read() {
        let config = BotConfig::from_lookup(lookup(&[
            ("DISCORD_TOKEN", "abc"),
            ("SPINE_RENDER_URL", "http://localhost:8080/spine.html"),
            ("INTERACTION_WINDOW_SECS", "60"),
            ("SPINE_ID_OVERRIDES", "overrides.json"),
        ]))
        .unwrap();
        assert_eq!(config.spine_render_url, "http://localhost:8080/spine.html");
        assert_eq!(config.interaction_window, Duration::from_secs(60));
        assert_eq!(config.id_overrides_path, Some(PathBuf::from("overrides.json")));
    }
}
