use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use vox_rag::Voice;
use vox_rag::config::{DEFAULT_COLLECTION, DEFAULT_TOP_K};

#[derive(Parser, Debug)]
#[command(name = "vox")]
#[command(about = "Ask questions about your documents and hear the answers", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(flatten)]
    pub options: PipelineOptions,

    /// Log at debug level (RUST_LOG overrides this)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Parse, chunk, embed and store documents
    Ingest {
        /// PDF, text or markdown files
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Display name recorded as the source (single file only)
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Answer a question from the stored documents and narrate it
    Ask {
        question: String,

        /// Voice for this answer
        #[arg(long)]
        voice: Option<String>,

        /// Print the full result as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the supported voices
    Voices,

    /// Interactive session: ingest documents and ask questions
    Console,
}

/// Settings shared by every subcommand.
#[derive(Args, Debug, Clone)]
pub struct PipelineOptions {
    /// Qdrant endpoint; an in-memory store is used when unset
    #[arg(long, env = "QDRANT_URL", global = true)]
    pub qdrant_url: Option<String>,

    #[arg(long, env = "QDRANT_API_KEY", global = true, hide_env_values = true)]
    pub qdrant_api_key: Option<String>,

    #[arg(long, env = "VOX_COLLECTION", default_value = DEFAULT_COLLECTION, global = true)]
    pub collection: String,

    /// Default narration voice
    #[arg(long = "default-voice", env = "VOX_VOICE", default_value_t = Voice::default(), global = true)]
    pub default_voice: Voice,

    /// Matches retrieved per question
    #[arg(long, env = "VOX_TOP_K", default_value_t = DEFAULT_TOP_K, global = true)]
    pub top_k: usize,

    #[arg(long, env = "VOX_CHUNK_SIZE", default_value_t = vox_rag::chunking::DEFAULT_CHUNK_SIZE, global = true)]
    pub chunk_size: usize,

    #[arg(long, env = "VOX_CHUNK_OVERLAP", default_value_t = vox_rag::chunking::DEFAULT_CHUNK_OVERLAP, global = true)]
    pub chunk_overlap: usize,

    /// Drop matches scoring below this cosine similarity
    #[arg(long, env = "VOX_SIMILARITY_THRESHOLD", global = true)]
    pub similarity_threshold: Option<f32>,

    /// Where generated MP3 files are written (defaults to the temp dir)
    #[arg(long, env = "VOX_AUDIO_DIR", global = true)]
    pub audio_dir: Option<PathBuf>,

    /// Tone and pacing guidance for the speech model
    #[arg(long, env = "VOX_NARRATION_INSTRUCTIONS", global = true)]
    pub narration_instructions: Option<String>,

    /// Seconds allowed for each external call
    #[arg(long, env = "VOX_TIMEOUT_SECS", default_value_t = 60, global = true)]
    pub timeout_secs: u64,

    #[arg(long, env = "VOX_CHAT_MODEL", default_value = "gpt-4o", global = true)]
    pub chat_model: String,

    #[arg(long, env = "VOX_TTS_MODEL", default_value = "gpt-4o-mini-tts", global = true)]
    pub tts_model: String,

    #[arg(long, env = "VOX_EMBEDDING_MODEL", default_value = "text-embedding-3-small", global = true)]
    pub embedding_model: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_ask_with_voice_and_json() {
        let cli = Cli::try_parse_from(["vox", "ask", "What is Rust?", "--voice", "coral", "--json"])
            .unwrap();
        match cli.command {
            Commands::Ask { question, voice, json } => {
                assert_eq!(question, "What is Rust?");
                assert_eq!(voice.as_deref(), Some("coral"));
                assert!(json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn ingest_requires_a_file() {
        assert!(Cli::try_parse_from(["vox", "ingest"]).is_err());
    }

    #[test]
    fn global_options_follow_the_subcommand() {
        let cli = Cli::try_parse_from([
            "vox",
            "ingest",
            "guide.pdf",
            "--collection",
            "manuals",
            "--top-k",
            "5",
            "--default-voice",
            "onyx",
        ])
        .unwrap();
        assert_eq!(cli.options.collection, "manuals");
        assert_eq!(cli.options.top_k, 5);
        assert_eq!(cli.options.default_voice, Voice::Onyx);
    }

    #[test]
    fn unknown_default_voice_is_rejected() {
        assert!(Cli::try_parse_from(["vox", "voices", "--default-voice", "robot"]).is_err());
    }
}
