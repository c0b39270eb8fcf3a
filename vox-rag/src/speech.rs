//! Speech synthesis trait and the supported voice set.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};

/// Voices accepted by the speech model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Voice {
    Alloy,
    Ash,
    Coral,
    Echo,
    Fable,
    Onyx,
    #[default]
    Nova,
    Sage,
    Shimmer,
}

impl Voice {
    /// Every supported voice, in display order.
    pub const ALL: [Voice; 9] = [
        Voice::Alloy,
        Voice::Ash,
        Voice::Coral,
        Voice::Echo,
        Voice::Fable,
        Voice::Onyx,
        Voice::Nova,
        Voice::Sage,
        Voice::Shimmer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Alloy => "alloy",
            Self::Ash => "ash",
            Self::Coral => "coral",
            Self::Echo => "echo",
            Self::Fable => "fable",
            Self::Onyx => "onyx",
            Self::Nova => "nova",
            Self::Sage => "sage",
            Self::Shimmer => "shimmer",
        }
    }
}

impl fmt::Display for Voice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Voice {
    type Err = RagError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|v| v.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| RagError::InvalidVoice(s.to_string()))
    }
}

/// One text-to-speech request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeechRequest {
    pub text: String,
    pub voice: Voice,
    /// Optional delivery guidance (tone, pacing) for models that accept it.
    pub instructions: Option<String>,
}

/// A hosted text-to-speech model.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize `request` and return the encoded audio (MP3) bytes.
    async fn synthesize(&self, request: &SpeechRequest) -> Result<Vec<u8>>;

    /// Model name used in logs.
    fn name(&self) -> &str;
}
