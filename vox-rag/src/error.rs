//! Error types for the `vox-rag` crate.

use std::future::Future;
use std::time::Duration;

use thiserror::Error;

/// Errors that can occur while ingesting documents or answering a query.
#[derive(Debug, Error)]
pub enum RagError {
    /// The source document could not be read or is in an unsupported format.
    #[error("Document parse error ({file}): {message}")]
    DocumentParse {
        /// Display name or path of the offending document.
        file: String,
        /// A description of the failure.
        message: String,
    },

    /// An error occurred during embedding generation.
    #[error("Embedding error ({provider}): {message}")]
    Embedding {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// An error occurred in the vector store backend.
    #[error("Vector store error ({backend}): {message}")]
    VectorStore {
        /// The vector store backend that produced the error.
        backend: String,
        /// A description of the failure.
        message: String,
    },

    /// A similarity search produced nothing to answer from.
    #[error("No relevant documents found: {0}")]
    NoResults(String),

    /// The chat model failed to produce an answer.
    #[error("Answer generation error ({model}): {message}")]
    AnswerGeneration {
        /// The chat model that was asked.
        model: String,
        /// A description of the failure.
        message: String,
    },

    /// Speech synthesis failed or its audio could not be written.
    #[error("Audio generation error: {0}")]
    AudioGeneration(String),

    /// A voice identifier outside the supported set.
    #[error("Unsupported voice '{0}'")]
    InvalidVoice(String),

    /// Caller input rejected before any external call.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A configuration validation error.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// A convenience result type for RAG operations.
pub type Result<T> = std::result::Result<T, RagError>;

/// Await `fut` for at most `limit`, mapping an elapsed deadline through `on_timeout`.
pub(crate) async fn bounded<T, F>(
    limit: Duration,
    fut: F,
    on_timeout: impl FnOnce(Duration) -> RagError,
) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(on_timeout(limit)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn bounded_maps_elapsed_deadline() {
        let result: Result<()> = bounded(
            Duration::from_millis(10),
            async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(())
            },
            |d| RagError::AudioGeneration(format!("timed out after {d:?}")),
        )
        .await;

        assert!(matches!(result, Err(RagError::AudioGeneration(msg)) if msg.contains("timed out")));
    }

    #[tokio::test]
    async fn bounded_passes_through_inner_error() {
        let result: Result<()> = bounded(
            Duration::from_secs(1),
            async { Err(RagError::NoResults("empty".into())) },
            |_| RagError::Config("unreachable".into()),
        )
        .await;

        assert!(matches!(result, Err(RagError::NoResults(_))));
    }

    #[test]
    fn display_includes_component_context() {
        let err = RagError::Embedding { provider: "OpenAI".into(), message: "rate limited".into() };
        assert_eq!(err.to_string(), "Embedding error (OpenAI): rate limited");
    }
}
