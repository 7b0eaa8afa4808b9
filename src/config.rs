use serde::Deserialize;
use url::Url;

use crate::cli::Cli;
use crate::error::ExtractError;
use crate::query::Filter;

/// Index pattern searched when none is configured.
pub const DEFAULT_INDEX: &str = "leak_*";

/// Defaults read from the YAML config file. Every field is optional; values
/// explicitly passed on the command line take precedence.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct FileConfig {
    pub url: Option<String>,
    pub index: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub outfile: Option<String>,
    pub verbose: Option<bool>,
    pub debug: Option<bool>,
    pub limit: Option<u64>,
    pub domain: Option<String>,
    pub email: Option<String>,
    pub pass: Option<String>,
}

impl FileConfig {
    pub fn load(path: &str) -> Result<Self, ExtractError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ExtractError::Config(format!("failed to read config file '{}': {}", path, e))
        })?;
        serde_yaml::from_str(&content).map_err(|e| {
            ExtractError::Config(format!("failed to parse config file '{}': {}", path, e))
        })
    }
}

/// Fully resolved, immutable configuration for one run. Assembled once by
/// [`Settings::resolve`] and passed by reference into each component.
#[derive(Debug, Clone)]
pub struct Settings {
    pub url: Url,
    pub index: String,
    pub username: String,
    pub password: String,
    pub outfile: Option<String>,
    pub filter: Filter,
    pub limit: u64,
    pub verbose: bool,
    pub debug: bool,
}

impl Settings {
    /// Merge the YAML config file (if any) with command-line flags and
    /// validate the result. Flags win when explicitly supplied; boolean
    /// flags can only raise, never clear, a file-configured value.
    pub fn resolve(args: Cli) -> Result<Self, ExtractError> {
        let file = match &args.config {
            Some(path) => FileConfig::load(path)?,
            None => FileConfig::default(),
        };

        let url_str = args.url.or(file.url).ok_or_else(|| missing("url"))?;
        let url = Url::parse(&url_str)
            .map_err(|e| ExtractError::Config(format!("malformed url '{}': {}", url_str, e)))?;

        let index = args
            .index
            .or(file.index)
            .unwrap_or_else(|| DEFAULT_INDEX.to_string());
        if index.is_empty() {
            return Err(missing("index"));
        }

        let username = args
            .username
            .or(file.username)
            .ok_or_else(|| missing("username"))?;
        let password = args
            .password
            .or(file.password)
            .ok_or_else(|| missing("password"))?;

        let filter = Filter::from_options(
            args.email.or(file.email),
            args.domain.or(file.domain),
            args.pass.or(file.pass),
        )?;

        Ok(Settings {
            url,
            index,
            username,
            password,
            outfile: args.outfile.or(file.outfile),
            filter,
            limit: args.limit.or(file.limit).unwrap_or(0),
            verbose: args.verbose || file.verbose.unwrap_or(false),
            debug: args.debug || file.debug.unwrap_or(false),
        })
    }
}

fn missing(name: &str) -> ExtractError {
    ExtractError::Config(format!("missing required {} parameter", name))
}
