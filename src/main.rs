//! padanan - Batch evaluation of retrieval-augmented translation
//!
//! Reads settings from `$PADANAN_CONFIG` or the user config directory, builds
//! the word index over the training corpus, translates the test set and
//! writes per-row scores and a summary to the output directory.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use padanan::config::Settings;
use padanan::corpus::load_corpus;
use padanan::embedding::{EmbeddingCache, SentenceEmbedder};
use padanan::providers::ai::OpenAiCompatibleProvider;
use padanan::retrieval::Retriever;
use padanan::services::{BatchEvaluator, RetryPolicy, TranslationService};

fn settings_path() -> Option<PathBuf> {
    std::env::var_os("PADANAN_CONFIG")
        .map(PathBuf::from)
        .or_else(Settings::default_path)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    tracing::info!("Starting padanan");

    let settings = match settings_path() {
        Some(path) => Settings::load(&path)
            .with_context(|| format!("loading settings from {}", path.display()))?,
        None => Settings::default(),
    };
    let columns = settings.corpus.columns();

    let corpus = load_corpus(&settings.corpus.path, &columns).context("loading training corpus")?;
    let test_rows =
        load_corpus(&settings.batch.test_path, &columns).context("loading test set")?;

    let embedding_config = settings.embedding.clone();
    let cache = EmbeddingCache::new(&settings.retrieval.cache_dir);
    let retriever = tokio::task::spawn_blocking(move || {
        let model_id = embedding_config.model_id.clone();
        Retriever::build(
            corpus,
            SentenceEmbedder::load(embedding_config),
            &model_id,
            Some(&cache),
        )
    })
    .await??;

    if !retriever.is_ready() {
        tracing::warn!("Vocabulary embeddings unavailable, prompts will carry no examples");
    }

    let llm = OpenAiCompatibleProvider::from_settings(&settings.llm)
        .context("configuring LLM provider")?;

    let translator = TranslationService::new(retriever, Arc::new(llm))
        .with_languages(settings.corpus.languages.clone())
        .with_similarity_threshold(settings.retrieval.similarity_threshold)
        .with_sampling(settings.llm.temperature, settings.llm.max_tokens)
        .with_retry_policy(RetryPolicy::from(&settings.batch));

    let evaluator = BatchEvaluator::new(translator, &settings.batch.output_dir)
        .with_request_delay(settings.batch.request_delay());

    tokio::select! {
        summary = evaluator.run(&test_rows) => {
            let summary = summary?;
            println!("{}", summary.report());
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::warn!(
                results = %evaluator.result_path().display(),
                "Interrupted, results so far are kept"
            );
        }
    }

    Ok(())
}
