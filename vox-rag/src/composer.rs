//! Grounded answer generation from retrieved matches.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error};

use crate::chat::{ChatMessage, ChatModel};
use crate::document::RetrievedMatch;
use crate::error::{RagError, Result, bounded};

/// Standing instruction sent with every question.
pub const SYSTEM_PROMPT: &str = "You are a technical documentation assistant. \
Explain technical concepts clearly and accurately, include code examples when they help, \
and make complex topics approachable. Your answer will be read aloud, so write in natural \
conversational prose without bullet points, numbered lists, tables or markdown. \
Mention the source documents when it helps the listener.";

const DELIVERY_INSTRUCTION: &str = "Please give a complete answer that works well when spoken \
aloud, using only the documentation above. Include practical examples and explain technical \
concepts clearly.";

/// Asks a [`ChatModel`] to answer a question from retrieved context.
#[derive(Clone)]
pub struct AnswerComposer {
    model: Arc<dyn ChatModel>,
    timeout: Duration,
}

impl AnswerComposer {
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self { model, timeout: Duration::from_secs(60) }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Render the user prompt: numbered, attributed context blocks followed
    /// by the question.
    ///
    /// ```
    /// use vox_rag::{AnswerComposer, RetrievedMatch};
    ///
    /// let matches = vec![RetrievedMatch {
    ///     content: "Paris is the capital of France.".into(),
    ///     source: "france.txt".into(),
    ///     page: 1,
    ///     score: 0.9,
    /// }];
    /// let prompt = AnswerComposer::build_prompt("What is the capital?", &matches);
    /// assert!(prompt.contains("Source 1: france.txt (Page 1)\nParis is the capital of France."));
    /// ```
    pub fn build_prompt(question: &str, matches: &[RetrievedMatch]) -> String {
        let context = matches
            .iter()
            .enumerate()
            .map(|(i, m)| {
                let mut header = format!("Source {}: {}", i + 1, m.source);
                if m.page != 0 {
                    header.push_str(&format!(" (Page {})", m.page));
                }
                format!("{header}\n{}", m.content)
            })
            .collect::<Vec<_>>()
            .join("\n\n");

        format!(
            "Based on the following technical documentation:\n\n{context}\n\nQuestion: {question}\n\n{DELIVERY_INSTRUCTION}"
        )
    }

    /// Produce a spoken-style answer to `question` grounded in `matches`.
    ///
    /// Sends exactly one request and returns the reply with surrounding
    /// whitespace removed.
    ///
    /// # Errors
    ///
    /// - [`RagError::NoResults`] if `matches` is empty; nothing is sent.
    /// - [`RagError::AnswerGeneration`] if the request fails, times out, or
    ///   the reply is empty.
    pub async fn compose(&self, question: &str, matches: &[RetrievedMatch]) -> Result<String> {
        if matches.is_empty() {
            return Err(RagError::NoResults("no context to answer from".to_string()));
        }

        let messages =
            [ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(Self::build_prompt(question, matches))];
        debug!(model = self.model.name(), context_blocks = matches.len(), "composing answer");

        let model_name = self.model.name().to_string();
        let reply = bounded(self.timeout, self.model.complete(&messages), |limit| {
            RagError::AnswerGeneration {
                model: model_name.clone(),
                message: format!("timed out after {limit:?}"),
            }
        })
        .await
        .map_err(|e| match e {
            e @ RagError::AnswerGeneration { .. } => e,
            other => RagError::AnswerGeneration { model: model_name.clone(), message: other.to_string() },
        })
        .inspect_err(|e| error!(error = %e, "answer generation failed"))?;

        let answer = reply.trim();
        if answer.is_empty() {
            error!(model = %model_name, "model returned an empty answer");
            return Err(RagError::AnswerGeneration {
                model: model_name,
                message: "model returned an empty answer".to_string(),
            });
        }
        Ok(answer.to_string())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;

    struct ScriptedModel {
        reply: Result<String>,
        seen: Mutex<Vec<Vec<ChatMessage>>>,
    }

    impl ScriptedModel {
        fn replying(text: &str) -> Self {
            Self { reply: Ok(text.to_string()), seen: Mutex::new(Vec::new()) }
        }
    }

    #[async_trait]
    impl ChatModel for ScriptedModel {
        async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
            self.seen.lock().unwrap().push(messages.to_vec());
            match &self.reply {
                Ok(text) => Ok(text.clone()),
                Err(e) => Err(RagError::Config(e.to_string())),
            }
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    fn hit(source: &str, page: u32, content: &str) -> RetrievedMatch {
        RetrievedMatch { content: content.into(), source: source.into(), page, score: 0.8 }
    }

    #[test]
    fn prompt_numbers_sources_and_omits_page_zero() {
        let prompt = AnswerComposer::build_prompt(
            "How do I install it?",
            &[hit("guide.pdf", 3, "Run the installer."), hit("notes.md", 0, "Use cargo.")],
        );
        assert!(prompt.contains("Source 1: guide.pdf (Page 3)\nRun the installer.\n\nSource 2: notes.md\nUse cargo."));
        assert!(prompt.contains("Question: How do I install it?"));
        assert!(!prompt.contains("Page 0"));
    }

    #[tokio::test]
    async fn sends_one_request_and_trims_reply() {
        let model = Arc::new(ScriptedModel::replying("  The capital of France is Paris.\n"));
        let composer = AnswerComposer::new(model.clone());

        let answer = composer.compose("capital?", &[hit("france.txt", 1, "Paris")]).await.unwrap();

        assert_eq!(answer, "The capital of France is Paris.");
        let seen = model.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0][0].content, SYSTEM_PROMPT);
    }

    #[tokio::test]
    async fn empty_matches_send_nothing() {
        let model = Arc::new(ScriptedModel::replying("unused"));
        let composer = AnswerComposer::new(model.clone());

        let err = composer.compose("capital?", &[]).await.unwrap_err();
        assert!(matches!(err, RagError::NoResults(_)));
        assert!(model.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn blank_reply_is_an_error() {
        let composer = AnswerComposer::new(Arc::new(ScriptedModel::replying("   ")));
        let err = composer.compose("q", &[hit("a", 0, "b")]).await.unwrap_err();
        assert!(matches!(err, RagError::AnswerGeneration { .. }));
    }

    #[tokio::test]
    async fn foreign_errors_become_answer_errors() {
        let model = ScriptedModel {
            reply: Err(RagError::Config("socket closed".into())),
            seen: Mutex::new(Vec::new()),
        };
        let composer = AnswerComposer::new(Arc::new(model));
        let err = composer.compose("q", &[hit("a", 0, "b")]).await.unwrap_err();
        assert!(matches!(err, RagError::AnswerGeneration { ref message, .. } if message.contains("socket closed")));
    }
}
