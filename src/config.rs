//! Runtime configuration sourced from the environment

use crate::error::{Result, WatchError};
use crate::notify::DEFAULT_BATCH_SIZE;
use crate::schema::RowLayout;
use crate::tsv::Delimiters;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "https://kurisyushien.org/api";
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60);
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

pub const ENV_TOKEN: &str = "TOKEN";
pub const ENV_CHANNEL_ID: &str = "CHANNEL_ID";
pub const ENV_API_URL: &str = "API_URL";
pub const ENV_POLL_INTERVAL: &str = "POLL_INTERVAL_SECS";
pub const ENV_HTTP_TIMEOUT: &str = "HTTP_TIMEOUT_SECS";
pub const ENV_BATCH_SIZE: &str = "BATCH_SIZE";
pub const ENV_DELIMITERS: &str = "FEED_DELIMITERS";
pub const ENV_LAYOUT: &str = "ROW_LAYOUT";
pub const ENV_PROFILE: &str = "PROFILE";
pub const ENV_REJECT_MALFORMED: &str = "REJECT_MALFORMED";

/// How strictly startup is checked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Profile {
    /// Numeric channel id, channel resolved before polling starts
    #[default]
    Strict,
    /// Startup problems are logged and polling carries on
    Lenient,
}

impl Profile {
    pub fn parse(s: &str) -> std::result::Result<Self, String> {
        match s.to_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "lenient" => Ok(Self::Lenient),
            _ => Err(format!("Invalid profile: {}. Use 'strict' or 'lenient'", s)),
        }
    }

    pub fn is_strict(self) -> bool {
        self == Self::Strict
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub token: String,
    pub channel_id: String,
    pub api_url: String,
    pub poll_interval: Duration,
    pub http_timeout: Duration,
    pub batch_size: usize,
    pub delimiters: Delimiters,
    pub layout: RowLayout,
    pub profile: Profile,
    /// Skip snapshots containing rows too short for `layout`
    pub reject_malformed: bool,
}

impl Config {
    /// Build from the process environment, falling back to `env_file` when given.
    ///
    /// Variables already set in the process win over the file, as with dotenv.
    pub fn load(env_file: Option<&Path>) -> Result<Self> {
        Self::load_with(env_file, |key| std::env::var(key).ok())
    }

    /// Like [`Config::load`], with `overrides` standing in for the process environment
    pub fn load_with<F>(env_file: Option<&Path>, overrides: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let file_vars = match env_file {
            Some(path) => read_env_file(path)?,
            None => match dotenvy::dotenv_iter() {
                Ok(iter) => iter.collect::<std::result::Result<HashMap<_, _>, _>>()?,
                Err(e) if e.not_found() => HashMap::new(),
                Err(e) => return Err(e.into()),
            },
        };

        Self::from_lookup(|key| overrides(key).or_else(|| file_vars.get(key).cloned()))
    }

    /// Build from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let token = get(ENV_TOKEN).ok_or_else(|| WatchError::config(format!("{} is not set", ENV_TOKEN)))?;
        let channel_id =
            get(ENV_CHANNEL_ID).ok_or_else(|| WatchError::config(format!("{} is not set", ENV_CHANNEL_ID)))?;

        let profile = match get(ENV_PROFILE) {
            Some(s) => Profile::parse(&s).map_err(WatchError::config)?,
            None => Profile::default(),
        };
        let delimiters = match get(ENV_DELIMITERS) {
            Some(s) => Delimiters::parse(&s).map_err(WatchError::config)?,
            None => Delimiters::default(),
        };
        let layout = match get(ENV_LAYOUT) {
            Some(s) => RowLayout::parse(&s).map_err(WatchError::config)?,
            None => RowLayout::default(),
        };

        let poll_interval = match get(ENV_POLL_INTERVAL) {
            Some(s) => Duration::from_secs(parse_positive(ENV_POLL_INTERVAL, &s)? as u64),
            None => DEFAULT_POLL_INTERVAL,
        };
        let http_timeout = match get(ENV_HTTP_TIMEOUT) {
            Some(s) => Duration::from_secs(parse_positive(ENV_HTTP_TIMEOUT, &s)? as u64),
            None => DEFAULT_HTTP_TIMEOUT,
        };
        let batch_size = match get(ENV_BATCH_SIZE) {
            Some(s) => parse_positive(ENV_BATCH_SIZE, &s)?,
            None => DEFAULT_BATCH_SIZE,
        };

        let reject_malformed = match get(ENV_REJECT_MALFORMED) {
            Some(s) => parse_flag(ENV_REJECT_MALFORMED, &s)?,
            None => false,
        };

        let config = Self {
            token,
            channel_id,
            api_url: get(ENV_API_URL).unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            poll_interval,
            http_timeout,
            batch_size,
            delimiters,
            layout,
            profile,
            reject_malformed,
        };
        config.validate()?;
        Ok(config)
    }

    /// Re-check invariants after overrides have been applied
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(WatchError::config("Batch size must be greater than 0"));
        }
        if self.poll_interval.is_zero() {
            return Err(WatchError::config("Poll interval must be greater than 0"));
        }
        if self.profile.is_strict() && self.channel_id.parse::<u64>().is_err() {
            return Err(WatchError::config(format!(
                "{} must be a numeric channel id, got '{}'",
                ENV_CHANNEL_ID, self.channel_id
            )));
        }
        if !self.api_url.starts_with("http://") && !self.api_url.starts_with("https://") {
            return Err(WatchError::config(format!("{} must be an http(s) URL", ENV_API_URL)));
        }
        Ok(())
    }
}

fn read_env_file(path: &Path) -> Result<HashMap<String, String>> {
    let vars = dotenvy::from_path_iter(path)?.collect::<std::result::Result<HashMap<_, _>, _>>()?;
    log::debug!("Loaded {} variable(s) from {}", vars.len(), path.display());
    Ok(vars)
}

fn parse_flag(key: &str, value: &str) -> Result<bool> {
    match value.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(WatchError::config(format!("Invalid {}: '{}'. Use true or false.", key, value))),
    }
}

fn parse_positive(key: &str, value: &str) -> Result<usize> {
    let n: usize = value
        .parse()
        .map_err(|_| WatchError::config(format!("Invalid {}: '{}'. Must be a positive integer.", key, value)))?;
    if n == 0 {
        return Err(WatchError::config(format!("{} must be greater than 0", key)));
    }
    Ok(n)
}
