//! Falcon IOC Blocker.
//!
//! Reads threat indicators from a spreadsheet and pushes them to the
//! CrowdStrike Falcon indicator API so they are enforced on every managed
//! endpoint.
//!
//! # Features
//!
//! - **Spreadsheet Input** - One sheet per indicator type, any format calamine reads
//! - **Refanging** - `1[.]2[.]3[.]4` and `example[.]com` are restored before submission
//! - **Typed Outcomes** - Created, already present, rejected and transport failures are kept apart
//! - **Failure Isolation** - One bad indicator never stops the rest of the run
//!
//! Hashes are submitted with action `prevent`, IPs and domains with `detect`.
//!
//! # Example Configuration
//!
//! ```yaml
//! api:
//!   base_url: "https://api.us-2.crowdstrike.com/"
//!   client_id: "${FALCON_CLIENT_ID}"
//!   client_secret: "${FALCON_CLIENT_SECRET}"
//!
//! input:
//!   path: "indicators.xlsx"
//! ```

pub mod api;
pub mod blocker;
pub mod config;
pub mod indicator;
pub mod loader;
pub mod submitter;

pub use api::falcon::FalconClient;
pub use blocker::{IndicatorBlocker, RunSummary};
pub use config::Config;
pub use indicator::{Indicator, IndicatorBatch, IndicatorType};
