//! Exercise modes selectable by callers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

pub const MODE_SQUAT: &str = "squat";
pub const MODE_SITTING: &str = "sitting";

/// All accepted mode strings.
pub const VALID_MODES: &[&str] = &[MODE_SQUAT, MODE_SITTING];

/// Exercise whose rule table is applied to each frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisMode {
    #[default]
    Squat,
    Sitting,
}

impl AnalysisMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Squat => MODE_SQUAT,
            Self::Sitting => MODE_SITTING,
        }
    }
}

impl fmt::Display for AnalysisMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnalysisMode {
    type Err = CoreError;

    /// Parse a mode string. Unknown modes are rejected, never defaulted.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            MODE_SQUAT => Ok(Self::Squat),
            MODE_SITTING => Ok(Self::Sitting),
            _ => Err(CoreError::UnsupportedMode(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn parses_known_modes() {
        assert_eq!("squat".parse::<AnalysisMode>().unwrap(), AnalysisMode::Squat);
        assert_eq!(" Sitting ".parse::<AnalysisMode>().unwrap(), AnalysisMode::Sitting);
    }

    #[test]
    fn rejects_unknown_mode() {
        let err = "jumping".parse::<AnalysisMode>().unwrap_err();
        assert_matches!(err, CoreError::UnsupportedMode(ref m) if m == "jumping");
    }

    #[test]
    fn rejects_empty_mode() {
        assert!("".parse::<AnalysisMode>().is_err());
    }

    #[test]
    fn display_matches_valid_modes() {
        assert_eq!(AnalysisMode::Squat.to_string(), VALID_MODES[0]);
        assert_eq!(AnalysisMode::Sitting.to_string(), VALID_MODES[1]);
    }
}
