//! server configuration, loaded from a json file
//!
//! ```json
//! {
//!   "port": 8080,
//!   "root": "/srv/site",
//!   "routes": { "/echo": "echo_dir", "/static": "static_dir" }
//! }
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use color_eyre::eyre::{self, eyre};
use serde::Deserialize;

use crate::connection::Limits;
use crate::router::RouteTable;

// a single absolute path segment: "/echo", "/static"
static ROUTE_PREFIX_PATTERN: &str = r"^/[^/\s]+$";

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    /// server root; static files live under `<root>/public`
    #[serde(default)]
    pub root: Option<PathBuf>,

    #[serde(default)]
    pub routes: BTreeMap<String, String>,

    #[serde(default = "default_read_timeout_secs")]
    pub read_timeout_secs: u64,

    #[serde(default = "default_drain_timeout_secs")]
    pub drain_timeout_secs: u64,

    #[serde(default = "default_max_request_bytes")]
    pub max_request_bytes: usize,

    #[serde(default)]
    pub max_connections: Option<usize>,
}

fn default_port() -> u16 {
    8080
}

fn default_read_timeout_secs() -> u64 {
    30
}

fn default_drain_timeout_secs() -> u64 {
    10
}

fn default_max_request_bytes() -> usize {
    8192
}

impl ServerConfig {
    /// read, parse and validate a config file
    pub fn load(path: &Path) -> eyre::Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| eyre!("failed to read config '{}': {}", path.display(), e))?;

        let config = Self::from_json(&content)
            .map_err(|e| eyre!("invalid config '{}': {}", path.display(), e))?;

        log::debug!(
            "loaded config from {} ({} routes)",
            path.display(),
            config.routes.len()
        );
        Ok(config)
    }

    pub fn from_json(content: &str) -> eyre::Result<Self> {
        let config: ServerConfig = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> eyre::Result<()> {
        let re = regex::Regex::new(ROUTE_PREFIX_PATTERN)
            .map_err(|e| eyre!("invalid regex pattern: {}", e))?;

        for (prefix, tag) in &self.routes {
            if !re.is_match(prefix) {
                return Err(eyre!(
                    "routes: '{}' must be a single path segment like \"/echo\"",
                    prefix
                ));
            }
            if tag.trim().is_empty() {
                return Err(eyre!("routes: '{}' has an empty handler tag", prefix));
            }
        }

        if self.read_timeout_secs == 0 {
            return Err(eyre!("read_timeout_secs must be greater than 0"));
        }
        if self.drain_timeout_secs == 0 {
            return Err(eyre!("drain_timeout_secs must be greater than 0"));
        }
        if self.max_request_bytes == 0 {
            return Err(eyre!("max_request_bytes must be greater than 0"));
        }
        if self.max_connections == Some(0) {
            return Err(eyre!("max_connections must be greater than 0 when set"));
        }

        Ok(())
    }

    /// configured root, or the working directory when none is set
    pub fn root(&self) -> eyre::Result<PathBuf> {
        match &self.root {
            Some(root) => Ok(root.clone()),
            None => std::env::current_dir()
                .map_err(|e| eyre!("unable to determine working directory: {}", e)),
        }
    }

    pub fn route_table(&self) -> RouteTable {
        self.routes
            .iter()
            .map(|(prefix, tag)| (prefix.clone(), tag.clone()))
            .collect()
    }

    pub fn limits(&self) -> Limits {
        Limits {
            read_timeout: Duration::from_secs(self.read_timeout_secs),
            drain_timeout: Duration::from_secs(self.drain_timeout_secs),
            max_request_bytes: self.max_request_bytes,
        }
    }
}
