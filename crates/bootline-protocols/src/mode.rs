//! Invocation and trace modes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// How the actions attached to a target are executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvocationMode {
    /// Call every handler immediately, in order, without awaiting.
    Sync,
    /// Await each handler before starting the next one.
    Serial,
    /// Start every handler, then await them all.
    Parallel,
    /// Thread the payload through each handler in turn.
    Waterfall,
}

impl InvocationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sync => "sync",
            Self::Serial => "serial",
            Self::Parallel => "parallel",
            Self::Waterfall => "waterfall",
        }
    }
}

impl fmt::Display for InvocationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InvocationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sync" => Ok(Self::Sync),
            "serial" | "serie" => Ok(Self::Serial),
            "parallel" => Ok(Self::Parallel),
            "waterfall" => Ok(Self::Waterfall),
            other => Err(format!("unknown invocation mode: {}", other)),
        }
    }
}

/// Rendering style of the boot trace report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TraceMode {
    /// Human-readable ordered list of invocations.
    Compact,
    /// Structured JSON record of every invocation.
    Full,
}

impl FromStr for TraceMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "full" => Ok(Self::Full),
            other => Err(format!("unknown trace mode: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_roundtrip_str() {
        for mode in [
            InvocationMode::Sync,
            InvocationMode::Serial,
            InvocationMode::Parallel,
            InvocationMode::Waterfall,
        ] {
            assert_eq!(mode.as_str().parse::<InvocationMode>().unwrap(), mode);
        }
    }

    #[test]
    fn test_mode_accepts_serie_alias() {
        assert_eq!("serie".parse::<InvocationMode>().unwrap(), InvocationMode::Serial);
        assert_eq!("PARALLEL".parse::<InvocationMode>().unwrap(), InvocationMode::Parallel);
    }

    #[test]
    fn test_mode_rejects_unknown() {
        let err = "eventually".parse::<InvocationMode>().unwrap_err();
        assert!(err.contains("eventually"));
    }

    #[test]
    fn test_mode_serde() {
        let json = serde_json::to_string(&InvocationMode::Waterfall).unwrap();
        assert_eq!(json, "\"waterfall\"");
    }

    #[test]
    fn test_trace_mode_parse() {
        assert_eq!("compact".parse::<TraceMode>().unwrap(), TraceMode::Compact);
        assert_eq!("full".parse::<TraceMode>().unwrap(), TraceMode::Full);
        assert!("verbose".parse::<TraceMode>().is_err());
    }
}
