//! Parsing of the optional in-repository scan configuration document.
//!
//! Repositories declare security scanner adoption in a YAML document:
//!
//! ```yaml
//! scans:
//!   codeql: true
//!   snyk: false
//! ```
//!
//! Providers missing from the document stay pending. A document that cannot
//! be parsed leaves every provider pending.

use std::collections::HashMap;

use serde::Deserialize;

use crate::record::{ScanFlags, ScanProvider, ScanStatus};

/// Default location of the scan configuration inside target repositories.
pub const DEFAULT_SCAN_CONFIG_PATH: &str = ".github/security-scans.yaml";

#[derive(Debug, Default, Deserialize,)]
struct ScanDocument
{
    #[serde(default)]
    scans: HashMap<String, bool,>,
}

/// Parses a scan configuration document into per-provider flags.
///
/// # Errors
///
/// Returns the YAML decoding error when the document is malformed. Callers
/// treat that as "all providers pending".
pub fn parse_scan_config(contents: &str,) -> Result<ScanFlags, serde_yaml::Error,>
{
    let document: Option<ScanDocument,> = serde_yaml::from_str(contents,)?;
    let toggles = document.unwrap_or_default().scans;

    let mut flags = ScanFlags::default();
    for provider in ScanProvider::ALL {
        let status = match toggles.get(provider.config_key(),).copied() {
            Some(true,) => ScanStatus::Enabled,
            Some(false,) => ScanStatus::Disabled,
            None => ScanStatus::PendingImplementation,
        };
        flags.set(provider, status,);
    }

    Ok(flags,)
}
