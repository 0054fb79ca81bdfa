//! Full score run over a results file with the offline embedder.

use ragsweep_core::config::{EmbedderKind, MetricsLayout, ScoringConfig};
use ragsweep_core::model::{ContextCondition, Document, EvaluationRecord};
use ragsweep_core::providers::http::HttpTransport;
use ragsweep_core::report::write_jsonl;
use ragsweep_metrics::embedder::build_embedder;
use ragsweep_metrics::score::run_scoring;
use ragsweep_metrics::{bertscore, bleu, default_metrics, rouge};
use serde_json::Value;

fn record(i: usize, condition: ContextCondition, answer: &str) -> EvaluationRecord {
    EvaluationRecord {
        item_index: i,
        model_name: "llama3.2".into(),
        prompt_variant: "langchain_base".into(),
        context_condition: condition,
        question: "What is the capital of France?".into(),
        gold_answer: "Paris is the capital of France".into(),
        context: "Paris is the capital of France.".into(),
        documents: vec![Document::relevant("Paris is the capital of France.")],
        system_prompt: Some("Use the context.".into()),
        user_prompt: Some("{context}\n{question}".into()),
        model_answer: answer.into(),
    }
}

fn hash_scoring(layout: MetricsLayout) -> ScoringConfig {
    let mut cfg = ScoringConfig {
        layout,
        ..ScoringConfig::default()
    };
    cfg.bert_score.embedder = EmbedderKind::Hash;
    cfg
}

#[tokio::test]
async fn columns_layout_scores_every_row() {
    let dir = tempfile::tempdir().unwrap();
    let results = dir.path().join("rag_results.jsonl");
    let output = dir.path().join("metric_scores.json");
    write_jsonl(
        &results,
        &[
            record(0, ContextCondition::RelevantOnly, "Paris is the capital of France"),
            record(0, ContextCondition::IrrelevantOnly, "I don't know"),
            record(0, ContextCondition::Mixed, "[ERROR] backend down"),
        ],
    )
    .unwrap();

    let cfg = hash_scoring(MetricsLayout::Columns);
    let embedder = build_embedder(&cfg.bert_score, "http://unused", HttpTransport::default());
    let metrics = default_metrics(&cfg, embedder);
    let report = run_scoring(&results, &output, cfg.layout, &metrics)
        .await
        .unwrap();
    assert_eq!(report.rows, 3);

    let doc: Value = serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
    for col in [
        rouge::PRECISION_COLUMN,
        rouge::RECALL_COLUMN,
        bleu::BLEU_COLUMN,
        bertscore::PRECISION_COLUMN,
        bertscore::RECALL_COLUMN,
    ] {
        assert_eq!(doc[col].as_array().unwrap().len(), 3, "column {}", col);
    }

    let keys: Vec<&str> = doc.as_object().unwrap().keys().map(String::as_str).collect();
    assert_eq!(
        keys,
        [
            rouge::PRECISION_COLUMN,
            rouge::RECALL_COLUMN,
            bleu::BLEU_COLUMN,
            bertscore::PRECISION_COLUMN,
            bertscore::RECALL_COLUMN,
        ]
    );

    // Exact answers score perfectly against the gold answer and the IDK references.
    assert_eq!(doc[rouge::RECALL_COLUMN][0], 1.0);
    assert_eq!(doc[rouge::RECALL_COLUMN][1], 1.0);
    assert!((doc[bleu::BLEU_COLUMN][0].as_f64().unwrap() - 1.0).abs() < 1e-12);
    assert!(doc[rouge::RECALL_COLUMN][2].as_f64().unwrap() < 0.5);
}

#[tokio::test]
async fn table_layout_keeps_record_fields() {
    let dir = tempfile::tempdir().unwrap();
    let results = dir.path().join("rag_results.jsonl");
    let output = dir.path().join("metric_scores.json");
    write_jsonl(
        &results,
        &[record(3, ContextCondition::IrrelevantOnly, "The retrieved context does not contain information to answer the question")],
    )
    .unwrap();

    let cfg = hash_scoring(MetricsLayout::Table);
    let embedder = build_embedder(&cfg.bert_score, "http://unused", HttpTransport::default());
    run_scoring(&results, &output, cfg.layout, &default_metrics(&cfg, embedder))
        .await
        .unwrap();

    let doc: Value = serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
    let row = &doc[0];
    let keys: Vec<&str> = row.as_object().unwrap().keys().map(String::as_str).collect();
    assert_eq!(keys[0], "item_index");
    assert_eq!(keys[1], "model_name");
    assert_eq!(keys[10], "model_answer");
    assert_eq!(
        keys[11..],
        [
            "reference_answers",
            rouge::PRECISION_COLUMN,
            rouge::RECALL_COLUMN,
            bleu::BLEU_COLUMN,
            bertscore::PRECISION_COLUMN,
            bertscore::RECALL_COLUMN,
        ]
    );
    assert_eq!(row["item_index"], 3);
    assert_eq!(row["context_condition"], "irrelevant_only");
    assert_eq!(row["reference_answers"].as_array().unwrap().len(), 2);
    assert_eq!(row[rouge::PRECISION_COLUMN], 1.0);
    assert!((row[bertscore::RECALL_COLUMN].as_f64().unwrap() - 1.0).abs() < 1e-9);
}

#[tokio::test]
async fn missing_results_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = hash_scoring(MetricsLayout::Columns);
    let embedder = build_embedder(&cfg.bert_score, "http://unused", HttpTransport::default());
    let output = dir.path().join("metric_scores.json");
    let err = run_scoring(
        &dir.path().join("nope.jsonl"),
        &output,
        cfg.layout,
        &default_metrics(&cfg, embedder),
    )
    .await
    .unwrap_err();
    assert!(err.to_string().contains("nope.jsonl"));
    assert!(!output.exists());
}
