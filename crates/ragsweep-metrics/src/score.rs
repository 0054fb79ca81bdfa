//! Score run: results file in, metrics file out.

use crate::reference::reference_answers;
use crate::{Metric, ScoreColumns};
use anyhow::Context;
use ragsweep_core::config::MetricsLayout;
use ragsweep_core::model::EvaluationRecord;
use ragsweep_core::report::read_jsonl;
use serde_json::{Map, Value};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

pub const REFERENCE_COLUMN: &str = "reference_answers";

#[derive(Debug, Clone)]
pub struct ScoreReport {
    pub rows: usize,
    pub columns: ScoreColumns,
}

/// Runs each metric in order over all records. The first failure aborts.
pub async fn score_records(
    records: &[EvaluationRecord],
    metrics: &[Arc<dyn Metric>],
) -> anyhow::Result<ScoreColumns> {
    let references: Vec<Vec<String>> = records.iter().map(reference_answers).collect();
    let candidates: Vec<String> = records.iter().map(|r| r.model_answer.clone()).collect();

    let mut columns = ScoreColumns::new();
    for metric in metrics {
        tracing::info!(metric = metric.name(), rows = records.len(), "scoring");
        let cols = metric
            .score_many(&references, &candidates)
            .await
            .with_context(|| format!("metric '{}' failed", metric.name()))?;
        for (name, values) in cols {
            if values.len() != records.len() {
                anyhow::bail!(
                    "metric '{}' returned {} values for column '{}' but there are {} rows",
                    metric.name(),
                    values.len(),
                    name,
                    records.len()
                );
            }
            columns.insert(name, values);
        }
    }
    Ok(columns)
}

/// Builds the metrics document for `layout`.
pub fn render_metrics(
    records: &[EvaluationRecord],
    columns: &ScoreColumns,
    layout: MetricsLayout,
) -> anyhow::Result<Value> {
    match layout {
        MetricsLayout::Columns => Ok(serde_json::to_value(columns)?),
        MetricsLayout::Table => {
            let mut rows = Vec::with_capacity(records.len());
            for (i, rec) in records.iter().enumerate() {
                let mut row = match serde_json::to_value(rec)? {
                    Value::Object(m) => m,
                    _ => Map::new(),
                };
                row.insert(
                    REFERENCE_COLUMN.to_string(),
                    serde_json::to_value(reference_answers(rec))?,
                );
                for (name, values) in columns {
                    row.insert(name.clone(), serde_json::to_value(values[i])?);
                }
                rows.push(Value::Object(row));
            }
            Ok(Value::Array(rows))
        }
    }
}

/// Writes next to `path` and renames over it, so readers never see a
/// partial file.
pub fn write_json_atomic(path: &Path, value: &Value) -> anyhow::Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent)
        .with_context(|| format!("failed to create {}", parent.display()))?;

    let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
    serde_json::to_writer(&mut tmp, value)?;
    tmp.write_all(b"\n")?;
    tmp.flush()?;
    tmp.persist(path)
        .map_err(|e| e.error)
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

/// Reads `results`, scores every row and writes `output`. Nothing is
/// written unless every metric succeeds.
pub async fn run_scoring(
    results: &Path,
    output: &Path,
    layout: MetricsLayout,
    metrics: &[Arc<dyn Metric>],
) -> anyhow::Result<ScoreReport> {
    let records = read_jsonl(results)?;
    let errors = records.iter().filter(|r| r.is_error()).count();
    if errors > 0 {
        tracing::warn!(errors, "results contain error-tagged answers; scoring them as text");
    }

    let columns = score_records(&records, metrics).await?;
    let doc = render_metrics(&records, &columns, layout)?;
    write_json_atomic(output, &doc)?;
    tracing::info!(path = %output.display(), rows = records.len(), "metrics written");

    Ok(ScoreReport {
        rows: records.len(),
        columns,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MetricError;
    use async_trait::async_trait;
    use ragsweep_core::model::ContextCondition;

    fn record(condition: ContextCondition, answer: &str) -> EvaluationRecord {
        EvaluationRecord {
            item_index: 0,
            model_name: "llama3.2".into(),
            prompt_variant: "langchain_base".into(),
            context_condition: condition,
            question: "What is the capital of France?".into(),
            gold_answer: "Paris".into(),
            context: "Paris is the capital of France.".into(),
            documents: vec![],
            system_prompt: None,
            user_prompt: None,
            model_answer: answer.into(),
        }
    }

    struct Constant(&'static str, f64);

    #[async_trait]
    impl Metric for Constant {
        fn name(&self) -> &'static str {
            self.0
        }

        async fn score_many(
            &self,
            _references: &[Vec<String>],
            candidates: &[String],
        ) -> Result<ScoreColumns, MetricError> {
            Ok(ScoreColumns::from([(
                self.0.to_string(),
                vec![self.1; candidates.len()],
            )]))
        }
    }

    struct Broken;

    #[async_trait]
    impl Metric for Broken {
        fn name(&self) -> &'static str {
            "broken"
        }

        async fn score_many(
            &self,
            _references: &[Vec<String>],
            _candidates: &[String],
        ) -> Result<ScoreColumns, MetricError> {
            Err(MetricError::Embedding {
                embedder: "x",
                message: "down".into(),
            })
        }
    }

    #[test]
    fn table_layout_appends_references_and_columns() {
        let records = vec![
            record(ContextCondition::RelevantOnly, "Paris"),
            record(ContextCondition::IrrelevantOnly, "I don't know"),
        ];
        let columns = ScoreColumns::from([("m".to_string(), vec![0.5, 0.25])]);
        let doc = render_metrics(&records, &columns, MetricsLayout::Table).unwrap();

        assert_eq!(doc[0]["reference_answers"], serde_json::json!(["Paris"]));
        assert_eq!(doc[1]["reference_answers"][0], "I don't know");
        assert_eq!(doc[1]["m"], 0.25);
        assert_eq!(doc[0]["model_answer"], "Paris");
    }

    #[test]
    fn columns_layout_is_a_flat_mapping() {
        let columns = ScoreColumns::from([("bleu".to_string(), vec![1.0])]);
        let doc = render_metrics(&[], &columns, MetricsLayout::Columns).unwrap();
        assert_eq!(doc, serde_json::json!({"bleu": [1.0]}));
    }

    #[tokio::test]
    async fn failing_metric_aborts_without_output() {
        let dir = tempfile::tempdir().unwrap();
        let results = dir.path().join("results.jsonl");
        ragsweep_core::report::write_jsonl(
            &results,
            &[record(ContextCondition::RelevantOnly, "Paris")],
        )
        .unwrap();
        let output = dir.path().join("metrics.json");

        let metrics: Vec<Arc<dyn Metric>> = vec![Arc::new(Constant("a", 1.0)), Arc::new(Broken)];
        let err = run_scoring(&results, &output, MetricsLayout::Columns, &metrics)
            .await
            .unwrap_err();

        assert!(format!("{:#}", err).contains("broken"));
        assert!(!output.exists());
    }

    #[tokio::test]
    async fn atomic_write_replaces_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out/metrics.json");
        write_json_atomic(&output, &serde_json::json!({"a": 1})).unwrap();
        write_json_atomic(&output, &serde_json::json!({"a": 2})).unwrap();
        let back: Value = serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(back["a"], 2);
        assert_eq!(std::fs::read_dir(output.parent().unwrap()).unwrap().count(), 1);
    }
}
