//! Pipeline construction and the one-shot subcommands.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use tracing::info;
use vox_rag::openai::{
    OpenAIChatModel, OpenAIConfig, OpenAIEmbeddingProvider, OpenAISpeechSynthesizer,
};
use vox_rag::{
    IngestReport, InMemoryVectorStore, QdrantVectorStore, QueryResult, RagConfig, VectorStore,
    Voice, VoiceRagPipeline,
};

use crate::cli::PipelineOptions;

/// Translate command-line options into a validated [`RagConfig`].
pub fn rag_config(options: &PipelineOptions) -> Result<RagConfig> {
    let mut builder = RagConfig::builder()
        .chunk_size(options.chunk_size)
        .chunk_overlap(options.chunk_overlap)
        .top_k(options.top_k)
        .default_voice(options.default_voice)
        .collection_name(options.collection.clone())
        .request_timeout(Duration::from_secs(options.timeout_secs));
    if let Some(threshold) = options.similarity_threshold {
        builder = builder.similarity_threshold(threshold);
    }
    if let Some(dir) = &options.audio_dir {
        builder = builder.audio_dir(dir.clone());
    }
    if let Some(instructions) = &options.narration_instructions {
        builder = builder.narration_instructions(instructions.clone());
    }
    Ok(builder.build()?)
}

/// Build the pipeline against OpenAI and, when configured, Qdrant.
pub fn build_pipeline(options: &PipelineOptions) -> Result<VoiceRagPipeline> {
    pipeline_with(options, OpenAIConfig::from_env()?)
}

/// Build the pipeline with an explicit OpenAI configuration.
pub fn pipeline_with(options: &PipelineOptions, openai: OpenAIConfig) -> Result<VoiceRagPipeline> {
    let config = rag_config(options)?;
    let openai = openai.with_timeout(config.request_timeout);

    let vector_store: Arc<dyn VectorStore> = match &options.qdrant_url {
        Some(url) => {
            info!(%url, "using Qdrant vector store");
            Arc::new(
                QdrantVectorStore::with_api_key(url, options.qdrant_api_key.clone())
                    .context("failed to connect to Qdrant")?,
            )
        }
        None => {
            info!("QDRANT_URL not set, using in-memory vector store");
            Arc::new(InMemoryVectorStore::new())
        }
    };

    let pipeline = VoiceRagPipeline::builder()
        .config(config)
        .embedding_provider(Arc::new(
            OpenAIEmbeddingProvider::new(openai.clone())?.with_model(&options.embedding_model),
        ))
        .vector_store(vector_store)
        .chat_model(Arc::new(OpenAIChatModel::new(openai.clone())?.with_model(&options.chat_model)))
        .speech_synthesizer(Arc::new(
            OpenAISpeechSynthesizer::new(openai)?.with_model(&options.tts_model),
        ))
        .build()?;
    Ok(pipeline)
}

/// Display name for a file: the explicit one, or its file name.
pub fn display_name(path: &Path, explicit: Option<&str>) -> String {
    explicit.map(str::to_string).unwrap_or_else(|| {
        path.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string())
    })
}

pub fn format_report(report: &IngestReport) -> String {
    format!("{}: {} pages, {} chunks", report.file_name, report.pages, report.chunks)
}

pub async fn ingest(
    pipeline: &VoiceRagPipeline,
    files: &[impl AsRef<Path>],
    name: Option<&str>,
) -> Result<()> {
    if name.is_some() && files.len() > 1 {
        bail!("--name can only be used with a single file");
    }
    pipeline.ensure_collection().await?;
    for file in files {
        let file = file.as_ref();
        let report = pipeline
            .ingest_file(file, display_name(file, name))
            .await
            .with_context(|| format!("failed to ingest {}", file.display()))?;
        println!("{}", format_report(&report));
    }
    Ok(())
}

/// Render a result for the terminal.
pub fn format_result(result: &QueryResult) -> String {
    if !result.is_success() {
        return result.status.to_string();
    }
    let mut out = result.text_response.clone();
    if !result.sources.is_empty() {
        out.push_str(&format!("\n\nSources: {}", result.sources.join(", ")));
    }
    if let Some(path) = &result.audio_path {
        out.push_str(&format!("\nAudio: {}", path.display()));
    }
    out
}

/// Answer one question and print the result once.
///
/// Returns whether the query succeeded; a failed query has already been
/// reported through its printed status.
pub async fn ask(
    pipeline: &VoiceRagPipeline,
    question: &str,
    voice: Option<&str>,
    json: bool,
) -> Result<bool> {
    let result = pipeline.answer_query(question, voice).await;
    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("{}", format_result(&result));
    }
    Ok(result.is_success())
}

pub fn format_voices(default: Voice) -> String {
    Voice::ALL
        .iter()
        .map(|v| if *v == default { format!("{v} (default)") } else { v.to_string() })
        .collect::<Vec<_>>()
        .join("\n")
}
