//! Per-console state kept by the caller, never by the pipeline.

use vox_rag::{Result, Voice};

/// What one interactive session has done so far.
#[derive(Debug, Clone, Default)]
pub struct ConsoleSession {
    /// Display names ingested during this session, in order.
    pub processed_documents: Vec<String>,
    /// Voice used for answers.
    pub voice: Voice,
}

impl ConsoleSession {
    pub fn new(voice: Voice) -> Self {
        Self { processed_documents: Vec::new(), voice }
    }

    pub fn is_processed(&self, name: &str) -> bool {
        self.processed_documents.iter().any(|d| d == name)
    }

    /// Record `name`; returns `false` if it was already recorded.
    pub fn mark_processed(&mut self, name: impl Into<String>) -> bool {
        let name = name.into();
        if self.is_processed(&name) {
            return false;
        }
        self.processed_documents.push(name);
        true
    }

    /// Switch voice by name, leaving the current one on error.
    pub fn set_voice(&mut self, name: &str) -> Result<Voice> {
        self.voice = name.parse()?;
        Ok(self.voice)
    }
}

/// One line of console input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Ingest { path: String, name: Option<String> },
    Docs,
    Voice(String),
    Voices,
    Help,
    Quit,
    Ask(String),
    Unknown(String),
}

impl ConsoleCommand {
    /// Lines starting with `:` are commands; anything else is a question.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        let Some(rest) = line.strip_prefix(':') else {
            return Some(Self::Ask(line.to_string()));
        };

        let mut parts = rest.splitn(2, char::is_whitespace);
        let command = parts.next().unwrap_or_default();
        let args = parts.next().map(str::trim).unwrap_or_default();

        Some(match command {
            "ingest" | "i" if !args.is_empty() => {
                let mut words = args.splitn(2, char::is_whitespace);
                let path = words.next().unwrap_or_default().to_string();
                let name = words.next().map(str::trim).filter(|n| !n.is_empty()).map(String::from);
                Self::Ingest { path, name }
            }
            "docs" => Self::Docs,
            "voice" if !args.is_empty() => Self::Voice(args.to_string()),
            "voices" => Self::Voices,
            "help" | "h" | "?" => Self::Help,
            "quit" | "q" | "exit" => Self::Quit,
            _ => Self::Unknown(line.to_string()),
        })
    }
}
