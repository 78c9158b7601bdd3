//! Placement - how the validated offset is materialized on the two tracks

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::SyncError;

/// Placement mode for the OffsetApplier
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Placement {
    /// Delay the track that starts early with blank; trim nothing
    #[default]
    Pad,
    /// Keep A's timeline, shift B onto it
    KeepA,
    /// Keep B's timeline, shift A onto it
    KeepB,
}

impl Placement {
    pub fn as_str(&self) -> &'static str {
        match self {
            Placement::Pad => "pad",
            Placement::KeepA => "keep_a",
            Placement::KeepB => "keep_b",
        }
    }
}

impl FromStr for Placement {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pad" => Ok(Placement::Pad),
            "keep_a" | "keep-a" | "a" => Ok(Placement::KeepA),
            "keep_b" | "keep-b" | "b" => Ok(Placement::KeepB),
            _ => Err(SyncError::InvalidMode {
                mode: s.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for Placement {
    type Error = SyncError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Placement> for String {
    fn from(value: Placement) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for Placement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
