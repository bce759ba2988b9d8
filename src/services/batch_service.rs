//! Batch translation and scoring of a test set.
//!
//! The [`BatchEvaluator`] translates every row of a test set, scores each
//! translation against its reference and rewrites the results CSV and the
//! running summary after every row, so an interrupted run keeps everything
//! finished so far.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::translation_service::TranslationService;
use crate::domain::CorpusRow;
use crate::evaluation::{score_sentence, CorpusAccumulator, CorpusScores, SentenceScores};
use crate::storage::write_atomic;

/// Translation recorded for rows whose every attempt failed.
pub const ERROR_TRANSLATION: &str = "ERROR_TRANSLATION";

/// Per-row results file inside the output directory.
pub const RESULT_FILE: &str = "result.csv";

/// Running summary file inside the output directory.
pub const SUMMARY_FILE: &str = "total_evaluation.txt";

/// Errors that can occur during batch evaluation.
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Result type for batch operations.
pub type BatchResult<T> = Result<T, BatchError>;

/// One evaluated row of `result.csv`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub source: String,
    pub reference: String,
    pub translation: String,
    pub bleu_score: f64,
    pub ter_score: Option<f64>,
    pub chrf_score: f64,
    pub rouge1_score: f64,
    pub rouge2_score: f64,
    pub rougel_score: f64,
}

impl ResultRecord {
    fn new(row: &CorpusRow, translation: String, scores: SentenceScores) -> Self {
        Self {
            source: row.source_text.clone(),
            reference: row.target_text.clone(),
            translation,
            bleu_score: scores.bleu,
            ter_score: scores.ter,
            chrf_score: scores.chrf,
            rouge1_score: scores.rouge.rouge_1,
            rouge2_score: scores.rouge.rouge_2,
            rougel_score: scores.rouge.rouge_l,
        }
    }
}

/// Averages over the rows evaluated so far.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Rows evaluated.
    pub rows: usize,
    /// Rows recorded as [`ERROR_TRANSLATION`].
    pub failed: usize,
    pub mean_bleu: f64,
    /// Mean over rows with a non-empty reference.
    pub mean_ter: Option<f64>,
    pub mean_chrf: f64,
    pub mean_rouge_l: f64,
    /// Scores from summed corpus statistics.
    pub corpus: CorpusScores,
}

impl BatchSummary {
    fn from_records(records: &[ResultRecord], failed: usize, corpus: CorpusScores) -> Self {
        let rows = records.len();
        let mean = |f: fn(&ResultRecord) -> f64| {
            if rows == 0 {
                0.0
            } else {
                records.iter().map(f).sum::<f64>() / rows as f64
            }
        };

        let ter: Vec<f64> = records.iter().filter_map(|r| r.ter_score).collect();
        let mean_ter = (!ter.is_empty()).then(|| ter.iter().sum::<f64>() / ter.len() as f64);

        Self {
            rows,
            failed,
            mean_bleu: mean(|r| r.bleu_score),
            mean_ter,
            mean_chrf: mean(|r| r.chrf_score),
            mean_rouge_l: mean(|r| r.rougel_score),
            corpus,
        }
    }

    /// Plain-text report written to [`SUMMARY_FILE`].
    pub fn report(&self) -> String {
        let ter = |t: Option<f64>, precision: usize| match t {
            Some(t) => format!("{:.*}", precision, t),
            None => "n/a".to_string(),
        };

        format!(
            "--- Evaluation Summary ---\n\n\
             Rows evaluated: {}\n\
             Failed translations: {}\n\n\
             Mean BLEU score     : {:.4} (higher is better)\n\
             Mean TER score      : {} (LOWER is better)\n\
             Mean chrF score     : {:.4} (higher is better)\n\
             Mean ROUGE-L score  : {:.4} (higher is better)\n\n\
             Corpus BLEU         : {:.2}\n\
             Corpus chrF         : {:.2}\n\
             Corpus TER          : {}\n\
             Mean sentence BLEU  : {:.2}\n",
            self.rows,
            self.failed,
            self.mean_bleu,
            ter(self.mean_ter, 4),
            self.mean_chrf,
            self.mean_rouge_l,
            self.corpus.bleu,
            self.corpus.chrf,
            ter(self.corpus.ter, 2),
            self.corpus.mean_sentence_bleu,
        )
    }
}

/// Translates and scores a test set, persisting progress after every row.
pub struct BatchEvaluator {
    translator: TranslationService,
    output_dir: PathBuf,
    request_delay: Duration,
}

impl BatchEvaluator {
    pub fn new(translator: TranslationService, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            translator,
            output_dir: output_dir.into(),
            request_delay: Duration::from_secs(1),
        }
    }

    /// Sets the wait between rows.
    pub fn with_request_delay(mut self, delay: Duration) -> Self {
        self.request_delay = delay;
        self
    }

    pub fn result_path(&self) -> PathBuf {
        self.output_dir.join(RESULT_FILE)
    }

    pub fn summary_path(&self) -> PathBuf {
        self.output_dir.join(SUMMARY_FILE)
    }

    /// Evaluates every row in order.
    ///
    /// Rows whose translation fails are recorded as [`ERROR_TRANSLATION`]
    /// and scored like any other output.
    pub async fn run(&self, rows: &[CorpusRow]) -> BatchResult<BatchSummary> {
        tracing::info!(
            rows = rows.len(),
            output_dir = %self.output_dir.display(),
            "Starting batch evaluation"
        );

        let mut records = Vec::with_capacity(rows.len());
        let mut corpus = CorpusAccumulator::new();
        let mut failed = 0;
        let mut summary = BatchSummary::from_records(&records, failed, corpus.finish());

        for (i, row) in rows.iter().enumerate() {
            let translation = match self.translator.translate(&row.source_text).await {
                Ok(translation) => translation.text,
                Err(e) => {
                    tracing::warn!(row = i, error = %e, "Recording failed translation");
                    failed += 1;
                    ERROR_TRANSLATION.to_string()
                }
            };

            let scores = score_sentence(&row.target_text, &translation);
            corpus.add(&row.target_text, &translation);
            records.push(ResultRecord::new(row, translation, scores));

            summary = BatchSummary::from_records(&records, failed, corpus.finish());
            self.persist(&records, &summary)?;

            tracing::info!(
                row = i + 1,
                total = rows.len(),
                bleu = scores.bleu,
                chrf = scores.chrf,
                "Row evaluated"
            );

            if i + 1 < rows.len() && !self.request_delay.is_zero() {
                tokio::time::sleep(self.request_delay).await;
            }
        }

        tracing::info!(
            rows = summary.rows,
            failed = summary.failed,
            corpus_bleu = summary.corpus.bleu,
            "Batch evaluation complete"
        );
        Ok(summary)
    }

    fn persist(&self, records: &[ResultRecord], summary: &BatchSummary) -> BatchResult<()> {
        let result_path = self.result_path();
        write_atomic(&result_path, &records_to_csv(records)?).map_err(|source| BatchError::Io {
            path: result_path,
            source,
        })?;

        let summary_path = self.summary_path();
        write_atomic(&summary_path, summary.report().as_bytes()).map_err(|source| {
            BatchError::Io {
                path: summary_path,
                source,
            }
        })
    }
}

fn records_to_csv(records: &[ResultRecord]) -> BatchResult<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for record in records {
        writer.serialize(record)?;
    }
    writer
        .into_inner()
        .map_err(|e| BatchError::Csv(csv::Error::from(e.into_error())))
}

#[derive(Debug, Deserialize)]
struct ScoredPair {
    reference: String,
    translation: String,
}

/// Recomputes corpus scores from a results CSV written by [`BatchEvaluator`].
///
/// Only the `reference` and `translation` columns are read.
pub fn rescore_results(path: &Path) -> BatchResult<CorpusScores> {
    let file = File::open(path).map_err(|source| BatchError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let mut reader = csv::Reader::from_reader(file);
    let mut corpus = CorpusAccumulator::new();
    for pair in reader.deserialize::<ScoredPair>() {
        let pair = pair?;
        corpus.add(&pair.reference, &pair.translation);
    }

    let scores = corpus.finish();
    tracing::info!(
        path = %path.display(),
        sentences = scores.sentences,
        bleu = scores.bleu,
        chrf = scores.chrf,
        "Rescored results"
    );
    Ok(scores)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::corpus::CorpusIndex;
    use crate::embedding::testing::OneHotProvider;
    use crate::providers::ai::LlmError;
    use crate::retrieval::Retriever;
    use crate::services::testing::ScriptedLlm;
    use crate::services::RetryPolicy;
    use pretty_assertions::assert_eq;

    fn translator(llm: Arc<ScriptedLlm>, attempts: u32) -> TranslationService {
        let provider = Arc::new(OneHotProvider::new(16));
        let rows = vec![CorpusRow::new("saya suka makan", "ambo suko makan")];
        let index = CorpusIndex::build(rows, provider.as_ref(), None).unwrap();

        TranslationService::new(Retriever::new(Arc::new(index), provider), llm)
            .with_retry_policy(RetryPolicy::new(attempts, Duration::ZERO))
    }

    fn test_rows() -> Vec<CorpusRow> {
        vec![
            CorpusRow::new("saya suka makan", "ambo suko makan"),
            CorpusRow::new("saya makan", "ambo makan"),
        ]
    }

    #[tokio::test]
    async fn run_writes_results_and_summary() {
        let dir = tempfile::tempdir().unwrap();
        let llm = Arc::new(ScriptedLlm::new(vec![
            Ok("ambo suko makan".to_string()),
            Ok("ambo makan".to_string()),
        ]));
        let evaluator = BatchEvaluator::new(translator(llm, 1), dir.path().join("results"))
            .with_request_delay(Duration::ZERO);

        let summary = evaluator.run(&test_rows()).await.unwrap();

        assert_eq!(summary.rows, 2);
        assert_eq!(summary.failed, 0);
        assert!((summary.mean_chrf - 100.0).abs() < 1e-6);
        assert_eq!(summary.mean_ter, Some(0.0));

        let csv = std::fs::read_to_string(evaluator.result_path()).unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next().unwrap(),
            "source,reference,translation,bleu_score,ter_score,chrf_score,rouge1_score,rouge2_score,rougel_score"
        );
        assert!(lines.next().unwrap().starts_with("saya suka makan,ambo suko makan,ambo suko makan,"));
        assert_eq!(lines.count(), 1);

        let report = std::fs::read_to_string(evaluator.summary_path()).unwrap();
        assert_eq!(report, summary.report());
        assert!(report.contains("Rows evaluated: 2"));
    }

    #[tokio::test]
    async fn failed_rows_are_recorded_with_sentinel() {
        let dir = tempfile::tempdir().unwrap();
        let llm = Arc::new(ScriptedLlm::new(vec![
            Err(LlmError::Unavailable("down".to_string())),
            Ok(String::new()),
            Ok("ambo makan".to_string()),
        ]));
        let evaluator =
            BatchEvaluator::new(translator(llm, 2), dir.path()).with_request_delay(Duration::ZERO);

        let summary = evaluator.run(&test_rows()).await.unwrap();

        assert_eq!(summary.rows, 2);
        assert_eq!(summary.failed, 1);

        let mut reader = csv::Reader::from_path(evaluator.result_path()).unwrap();
        let records: Vec<ResultRecord> = reader.deserialize().map(Result::unwrap).collect();
        assert_eq!(records[0].translation, ERROR_TRANSLATION);
        assert_eq!(records[0].bleu_score, 0.0);
        assert_eq!(records[1].translation, "ambo makan");
    }

    #[tokio::test]
    async fn empty_test_set_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let evaluator = BatchEvaluator::new(translator(Arc::new(ScriptedLlm::new(vec![])), 1), dir.path());

        let summary = evaluator.run(&[]).await.unwrap();

        assert_eq!(summary.rows, 0);
        assert_eq!(summary.mean_ter, None);
        assert!(!evaluator.result_path().exists());
    }

    #[tokio::test]
    async fn rescore_matches_run() {
        let dir = tempfile::tempdir().unwrap();
        let llm = Arc::new(ScriptedLlm::new(vec![
            Ok("ambo suka makan".to_string()),
            Ok("ambo makan nasi".to_string()),
        ]));
        let evaluator =
            BatchEvaluator::new(translator(llm, 1), dir.path()).with_request_delay(Duration::ZERO);

        let summary = evaluator.run(&test_rows()).await.unwrap();
        let rescored = rescore_results(&evaluator.result_path()).unwrap();

        assert_eq!(rescored, summary.corpus);
        assert_eq!(rescored.sentences, 2);
    }

    #[test]
    fn rescore_reads_only_needed_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("external.csv");
        std::fs::write(
            &path,
            "id,translation,reference,notes\n1,ambo makan,ambo makan,ok\n",
        )
        .unwrap();

        let scores = rescore_results(&path).unwrap();
        assert_eq!(scores.sentences, 1);
        assert_eq!(scores.ter, Some(0.0));
    }

    #[test]
    fn rescore_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            rescore_results(&dir.path().join("absent.csv")),
            Err(BatchError::Io { .. })
        ));
    }

    #[test]
    fn report_without_ter() {
        let summary = BatchSummary::from_records(&[], 0, CorpusAccumulator::new().finish());
        let report = summary.report();

        assert!(report.contains("Mean TER score      : n/a"));
        assert!(report.contains("Corpus TER          : n/a"));
    }
}
