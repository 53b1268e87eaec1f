//! Configuration types for the IOC blocker.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Indicator API connection settings.
    pub api: ApiConfig,

    /// Spreadsheet input.
    #[serde(default)]
    pub input: InputConfig,
}

/// Indicator API connection settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
    /// API base URL, e.g. `https://api.us-2.crowdstrike.com/`.
    pub base_url: String,

    /// OAuth2 client id (supports ${ENV_VAR} syntax).
    pub client_id: String,

    /// OAuth2 client secret (supports ${ENV_VAR} syntax).
    pub client_secret: String,

    /// Per-request timeout in milliseconds.
    #[serde(default = "default_timeout")]
    pub timeout_ms: u64,
}

impl ApiConfig {
    /// Join an endpoint path onto the base URL with exactly one `/`.
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

fn default_timeout() -> u64 {
    30_000
}

/// Spreadsheet input configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InputConfig {
    /// Path to the workbook.
    #[serde(default = "default_input_path")]
    pub path: PathBuf,

    /// Sheet/column holding SHA-256 hashes.
    #[serde(default = "default_hash_column")]
    pub hashes: ColumnConfig,

    /// Sheet/column holding IPv4 addresses.
    #[serde(default = "default_ip_column")]
    pub ips: ColumnConfig,

    /// Sheet/column holding domains.
    #[serde(default = "default_domain_column")]
    pub domains: ColumnConfig,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            path: default_input_path(),
            hashes: default_hash_column(),
            ips: default_ip_column(),
            domains: default_domain_column(),
        }
    }
}

/// Location of one indicator column.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct ColumnConfig {
    /// Worksheet name.
    pub sheet: String,
    /// Header text of the column.
    pub column: String,
}

impl ColumnConfig {
    fn new(sheet: &str, column: &str) -> Self {
        Self {
            sheet: sheet.to_string(),
            column: column.to_string(),
        }
    }
}

fn default_input_path() -> PathBuf {
    PathBuf::from("indicators.xlsx")
}

fn default_hash_column() -> ColumnConfig {
    ColumnConfig::new("HASH", "SHA256")
}

fn default_ip_column() -> ColumnConfig {
    ColumnConfig::new("IP ADDRESS", "IP Address")
}

fn default_domain_column() -> ColumnConfig {
    ColumnConfig::new("DOMAIN", "Domain")
}

impl Config {
    /// Load configuration from a YAML file.
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let expanded = expand_env_vars(&content);
        let config: Config = serde_yaml::from_str(&expanded)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration.
    pub fn validate(&self) -> anyhow::Result<()> {
        let api = &self.api;

        if api.base_url.trim().is_empty() {
            anyhow::bail!("api.base_url is empty");
        }
        if !api.base_url.starts_with("http://") && !api.base_url.starts_with("https://") {
            anyhow::bail!("api.base_url must start with http:// or https://: {}", api.base_url);
        }
        if api.client_id.is_empty() {
            anyhow::bail!("api.client_id is empty");
        }
        if api.client_secret.is_empty() {
            anyhow::bail!("api.client_secret is empty");
        }
        if api.timeout_ms == 0 {
            anyhow::bail!("api.timeout_ms must be greater than 0");
        }

        for (name, column) in [
            ("hashes", &self.input.hashes),
            ("ips", &self.input.ips),
            ("domains", &self.input.domains),
        ] {
            if column.sheet.trim().is_empty() || column.column.trim().is_empty() {
                anyhow::bail!("input.{} needs both a sheet and a column name", name);
            }
        }

        Ok(())
    }

    /// Generate example configuration YAML.
    pub fn example() -> String {
        r#"# Falcon IOC Blocker Configuration

api:
  base_url: "https://api.us-2.crowdstrike.com/"
  client_id: "${FALCON_CLIENT_ID}"          # Use environment variables
  client_secret: "${FALCON_CLIENT_SECRET}"
  timeout_ms: 30000                         # Per-request timeout

# Workbook with one sheet per indicator type
input:
  path: "indicators.xlsx"
  hashes:
    sheet: "HASH"
    column: "SHA256"
  ips:
    sheet: "IP ADDRESS"
    column: "IP Address"
  domains:
    sheet: "DOMAIN"
    column: "Domain"
"#
        .to_string()
    }
}

/// Expand environment variables in the format ${VAR_NAME}.
fn expand_env_vars(content: &str) -> String {
    let mut result = content.to_string();
    let re = regex::Regex::new(r"\$\{([^}]+)\}").unwrap();

    for cap in re.captures_iter(content) {
        let var_name = &cap[1];
        let var_value = std::env::var(var_name).unwrap_or_default();
        result = result.replace(&cap[0], &var_value);
    }

    result
}
