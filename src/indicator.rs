//! Indicator data model and value normalization.

use serde::Serialize;
use std::fmt;

/// Source tag attached to every submitted indicator.
pub const INDICATOR_SOURCE: &str = "API Script";

/// Kind of indicator, serialized as the vendor's `type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IndicatorType {
    /// SHA-256 file hash.
    Sha256,
    /// IPv4 address.
    Ipv4,
    /// Domain name.
    Domain,
}

impl IndicatorType {
    /// Wire name of this type.
    pub fn as_str(&self) -> &'static str {
        match self {
            IndicatorType::Sha256 => "sha256",
            IndicatorType::Ipv4 => "ipv4",
            IndicatorType::Domain => "domain",
        }
    }

    /// Hashes are blocked outright, network indicators are only detected.
    pub fn action(&self) -> IndicatorAction {
        match self {
            IndicatorType::Sha256 => IndicatorAction::Prevent,
            IndicatorType::Ipv4 | IndicatorType::Domain => IndicatorAction::Detect,
        }
    }

    /// Whether values of this type may arrive defanged.
    pub fn is_network(&self) -> bool {
        matches!(self, IndicatorType::Ipv4 | IndicatorType::Domain)
    }

    fn description(&self) -> String {
        match self {
            IndicatorType::Sha256 => "Blocked by automation script".to_string(),
            other => format!("Blocked {} by automation script", other.as_str()),
        }
    }
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Enforcement action requested for an indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IndicatorAction {
    /// Raise a detection when seen.
    Detect,
    /// Block execution.
    Prevent,
}

/// Indicator severity. Only `high` is ever submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    High,
}

/// Endpoint platform an indicator applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Platform {
    Windows,
    Mac,
    Linux,
}

/// A single indicator as sent to the indicator API.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Indicator {
    #[serde(rename = "type")]
    kind: IndicatorType,
    value: String,
    action: IndicatorAction,
    source: &'static str,
    description: String,
    severity: Severity,
    applied_globally: bool,
    platforms: [Platform; 3],
}

impl Indicator {
    /// Build an indicator, normalizing the raw value.
    ///
    /// Whitespace is trimmed and network values are refanged. The value must
    /// not be empty afterwards.
    pub fn new(kind: IndicatorType, raw: &str) -> Result<Self, InvalidIndicator> {
        let trimmed = raw.trim();
        let value = if kind.is_network() {
            refang(trimmed)
        } else {
            trimmed.to_string()
        };

        if value.is_empty() {
            return Err(InvalidIndicator { kind });
        }

        Ok(Self {
            kind,
            value,
            action: kind.action(),
            source: INDICATOR_SOURCE,
            description: kind.description(),
            severity: Severity::High,
            applied_globally: true,
            platforms: [Platform::Windows, Platform::Mac, Platform::Linux],
        })
    }

    pub fn kind(&self) -> IndicatorType {
        self.kind
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn action(&self) -> IndicatorAction {
        self.action
    }
}

/// Request body for the indicator create endpoint.
#[derive(Debug, Serialize)]
pub struct CreateIndicatorsRequest<'a> {
    pub indicators: [&'a Indicator; 1],
}

impl<'a> CreateIndicatorsRequest<'a> {
    pub fn single(indicator: &'a Indicator) -> Self {
        Self {
            indicators: [indicator],
        }
    }
}

/// Raised when a value is empty after normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidIndicator {
    pub kind: IndicatorType,
}

impl fmt::Display for InvalidIndicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "empty {} value", self.kind)
    }
}

impl std::error::Error for InvalidIndicator {}

/// Undo defang notation: every `[.]` becomes `.`.
///
/// Repeats until no `[.]` is left, so nested forms like `[[.]]` are undone
/// too and a second pass is a no-op.
pub fn refang(value: &str) -> String {
    let mut out = value.replace("[.]", ".");
    while out.contains("[.]") {
        out = out.replace("[.]", ".");
    }
    out
}

/// Indicator values loaded from the input workbook.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndicatorBatch {
    pub hashes: Vec<String>,
    pub domains: Vec<String>,
    pub ips: Vec<String>,
}

impl IndicatorBatch {
    /// Groups in submission order: hashes, domains, IPs.
    pub fn groups(&self) -> [(IndicatorType, &[String]); 3] {
        [
            (IndicatorType::Sha256, self.hashes.as_slice()),
            (IndicatorType::Domain, self.domains.as_slice()),
            (IndicatorType::Ipv4, self.ips.as_slice()),
        ]
    }

    pub fn len(&self) -> usize {
        self.hashes.len() + self.domains.len() + self.ips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
