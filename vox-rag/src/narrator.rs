//! Turning answers into MP3 files.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::DEFAULT_AUDIO_PREFIX;
use crate::error::{RagError, Result, bounded};
use crate::speech::{SpeechRequest, SpeechSynthesizer, Voice};

/// Writes synthesized speech to uniquely named files in a scratch directory.
///
/// Each call produces `{prefix}_{uuid}.mp3`. The caller owns the returned
/// file and is responsible for removing it.
#[derive(Clone)]
pub struct Narrator {
    synthesizer: Arc<dyn SpeechSynthesizer>,
    audio_dir: PathBuf,
    file_prefix: String,
    instructions: Option<String>,
    timeout: Duration,
}

impl Narrator {
    /// A narrator writing into the system temp directory.
    pub fn new(synthesizer: Arc<dyn SpeechSynthesizer>) -> Self {
        Self {
            synthesizer,
            audio_dir: std::env::temp_dir(),
            file_prefix: DEFAULT_AUDIO_PREFIX.to_string(),
            instructions: None,
            timeout: Duration::from_secs(60),
        }
    }

    pub fn with_audio_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.audio_dir = dir.into();
        self
    }

    pub fn with_file_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.file_prefix = prefix.into();
        self
    }

    /// Delivery guidance (tone, pacing) forwarded with every request.
    pub fn with_instructions(mut self, instructions: Option<String>) -> Self {
        self.instructions = instructions;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Like [`narrate`](Self::narrate), taking the voice by name.
    ///
    /// An unknown name fails with [`RagError::InvalidVoice`] before the
    /// synthesizer is called.
    pub async fn narrate_named(&self, text: &str, voice: &str) -> Result<PathBuf> {
        let voice: Voice = voice.parse()?;
        self.narrate(text, voice).await
    }

    /// Synthesize `text` with `voice` and return the path of the MP3 file.
    ///
    /// The file either exists with the complete audio or not at all.
    pub async fn narrate(&self, text: &str, voice: Voice) -> Result<PathBuf> {
        if text.trim().is_empty() {
            return Err(RagError::AudioGeneration("nothing to narrate".to_string()));
        }

        let request = SpeechRequest {
            text: text.to_string(),
            voice,
            instructions: self.instructions.clone(),
        };
        debug!(synthesizer = self.synthesizer.name(), %voice, "requesting speech");

        let audio = bounded(self.timeout, self.synthesizer.synthesize(&request), |limit| {
            RagError::AudioGeneration(format!("speech synthesis timed out after {limit:?}"))
        })
        .await
        .map_err(|e| match e {
            e @ RagError::AudioGeneration(_) => e,
            other => RagError::AudioGeneration(other.to_string()),
        })
        .inspect_err(|e| error!(error = %e, "speech synthesis failed"))?;

        if audio.is_empty() {
            return Err(RagError::AudioGeneration("synthesizer returned no audio".to_string()));
        }

        let path = self.write_audio(&audio).await?;
        info!(path = %path.display(), bytes = audio.len(), %voice, "narration written");
        Ok(path)
    }

    async fn write_audio(&self, audio: &[u8]) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.audio_dir).await.map_err(|e| {
            RagError::AudioGeneration(format!(
                "cannot create audio directory {}: {e}",
                self.audio_dir.display()
            ))
        })?;

        let file_name = format!("{}_{}.mp3", self.file_prefix, Uuid::new_v4());
        let path = self.audio_dir.join(&file_name);
        let partial = self.audio_dir.join(format!(".{file_name}.part"));

        let written = match tokio::fs::write(&partial, audio).await {
            Ok(()) => tokio::fs::rename(&partial, &path).await,
            Err(e) => Err(e),
        };

        if let Err(e) = written {
            if let Err(cleanup) = tokio::fs::remove_file(&partial).await {
                warn!(path = %partial.display(), error = %cleanup, "failed to remove partial audio file");
            }
            return Err(RagError::AudioGeneration(format!(
                "failed to write {}: {e}",
                path.display()
            )));
        }
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;

    struct FixedAudio {
        bytes: Vec<u8>,
        calls: AtomicUsize,
    }

    impl FixedAudio {
        fn new(bytes: &[u8]) -> Self {
            Self { bytes: bytes.to_vec(), calls: AtomicUsize::new(0) }
        }
    }

    #[async_trait]
    impl SpeechSynthesizer for FixedAudio {
        async fn synthesize(&self, _request: &SpeechRequest) -> Result<Vec<u8>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.bytes.clone())
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    #[tokio::test]
    async fn writes_complete_mp3_with_unique_name() {
        let dir = tempfile::tempdir().unwrap();
        let narrator =
            Narrator::new(Arc::new(FixedAudio::new(b"ID3audio"))).with_audio_dir(dir.path());

        let first = narrator.narrate("Paris.", Voice::Nova).await.unwrap();
        let second = narrator.narrate("Paris.", Voice::Nova).await.unwrap();

        assert_ne!(first, second);
        assert_eq!(std::fs::read(&first).unwrap(), b"ID3audio");
        let name = first.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("tech_docs_response_"));
        assert!(name.ends_with(".mp3"));
        // Only the two finished files remain; no partials.
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 2);
    }

    #[tokio::test]
    async fn creates_missing_audio_dir() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("audio/out");
        let narrator = Narrator::new(Arc::new(FixedAudio::new(b"x"))).with_audio_dir(&nested);

        let path = narrator.narrate("hello", Voice::Echo).await.unwrap();
        assert!(path.starts_with(&nested));
    }

    #[tokio::test]
    async fn unknown_voice_is_rejected_before_synthesis() {
        let synthesizer = Arc::new(FixedAudio::new(b"x"));
        let narrator = Narrator::new(synthesizer.clone());

        let err = narrator.narrate_named("hello", "robot").await.unwrap_err();
        assert!(matches!(err, RagError::InvalidVoice(ref v) if v == "robot"));
        assert_eq!(synthesizer.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn empty_audio_is_an_error_and_leaves_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let narrator = Narrator::new(Arc::new(FixedAudio::new(b""))).with_audio_dir(dir.path());

        let err = narrator.narrate("hello", Voice::Nova).await.unwrap_err();
        assert!(matches!(err, RagError::AudioGeneration(_)));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn unwritable_directory_is_an_audio_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, b"file").unwrap();
        let narrator = Narrator::new(Arc::new(FixedAudio::new(b"x"))).with_audio_dir(&blocker);

        let err = narrator.narrate("hello", Voice::Nova).await.unwrap_err();
        assert!(matches!(err, RagError::AudioGeneration(_)));
    }
}
