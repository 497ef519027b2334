//! CNI spec versions and parsing of results for a given version.

use std::io::Write;

use crate::error::{ChainedError, ChainedResult, ErrorCode};
use crate::types::{current, v020, v040};

/// The result version every previous result gets converted into.
pub const CURRENT_VERSION: &str = "1.1.0";

/// Config version assumed when cniVersion is missing.
pub const DEFAULT_CONFIG_VERSION: &str = "0.1.0";

pub const SUPPORTED_VERSIONS: &[&str] = &[
    "0.1.0", "0.2.0", "0.3.0", "0.3.1", "0.4.0", "1.0.0", "1.1.0",
];

/// Answer to the VERSION command.
#[derive(Debug, Serialize)]
pub struct PluginInfo {
    #[serde(rename = "cniVersion")]
    pub cni_version: &'static str,
    #[serde(rename = "supportedVersions")]
    pub supported_versions: &'static [&'static str],
}

impl Default for PluginInfo {
    fn default() -> Self {
        PluginInfo {
            cni_version: CURRENT_VERSION,
            supported_versions: SUPPORTED_VERSIONS,
        }
    }
}

pub fn write_plugin_info(out: &mut dyn Write) -> ChainedResult<()> {
    serde_json::to_writer(&mut *out, &PluginInfo::default())?;
    writeln!(out)?;
    Ok(())
}

/// A result parsed with the schema of its declared version.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VersionedResult {
    V020(v020::Result),
    V040(v040::Result),
    Current(current::Result),
}

/// Parse a result using the schema for the given cni version. The parsed
/// result carries the given version even when the json claims another one.
pub fn new_result(version: &str, data: &[u8]) -> ChainedResult<VersionedResult> {
    match version {
        "0.1.0" | "0.2.0" => {
            let mut res: v020::Result = serde_json::from_slice(data)?;
            res.cni_version = version.to_string();
            Ok(VersionedResult::V020(res))
        }
        "0.3.0" | "0.3.1" | "0.4.0" => {
            let mut res: v040::Result = serde_json::from_slice(data)?;
            res.cni_version = version.to_string();
            Ok(VersionedResult::V040(res))
        }
        "1.0.0" | "1.1.0" => {
            let mut res: current::Result = serde_json::from_slice(data)?;
            res.cni_version = version.to_string();
            Ok(VersionedResult::Current(res))
        }
        _ => Err(ChainedError::code_msg(
            ErrorCode::IncompatibleCniVersion,
            format!("unsupported CNI result version {:?}", version),
        )),
    }
}

impl VersionedResult {
    /// Convert into the current result version. Every older schema maps
    /// onto the current one, values are carried over as they are.
    pub fn into_current(self) -> current::Result {
        match self {
            VersionedResult::V020(r) => r.into_current(CURRENT_VERSION),
            VersionedResult::V040(r) => r.into_current(CURRENT_VERSION),
            VersionedResult::Current(mut r) => {
                r.cni_version = CURRENT_VERSION.to_string();
                r
            }
        }
    }
}

pub fn is_supported(version: &str) -> bool {
    SUPPORTED_VERSIONS.contains(&version)
}

fn parse_version(version: &str) -> ChainedResult<(u64, u64, u64)> {
    let invalid = || {
        ChainedError::code_msg(
            ErrorCode::InvalidNetworkConfig,
            format!("invalid version {:?}", version),
        )
    };
    let mut parts = version.split('.');
    let mut next = || -> ChainedResult<u64> {
        parts
            .next()
            .ok_or_else(invalid)?
            .parse::<u64>()
            .map_err(|_| invalid())
    };
    let parsed = (next()?, next()?, next()?);
    if parts.next().is_some() {
        return Err(invalid());
    }
    Ok(parsed)
}

/// Returns true if version is equal to or newer than other.
pub fn greater_than_or_equal_to(version: &str, other: &str) -> ChainedResult<bool> {
    Ok(parse_version(version)? >= parse_version(other)?)
}

/// Extract cniVersion from a raw config. Returns None when the data is not
/// a json object, a missing or empty version means 0.1.0.
pub fn config_version(data: &[u8]) -> Option<String> {
    let value: serde_json::Value = serde_json::from_slice(data).ok()?;
    let obj = value.as_object()?;
    match obj.get("cniVersion").and_then(|v| v.as_str()) {
        Some(v) if !v.is_empty() => Some(v.to_string()),
        _ => Some(DEFAULT_CONFIG_VERSION.to_string()),
    }
}
