use super::plan::WorkUnit;
use crate::context::{build_context, BuiltContext};
use crate::invoker::ModelInvoker;
use crate::model::{error_answer, EvaluationRecord};
use crate::prompt::build_messages;
use crate::report::progress::{ProgressEvent, ProgressSink};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::{Id, JoinError, JoinSet};

/// Result of one unit. Both arms carry a record; a failed unit's answer is
/// `"[ERROR] <message>"`.
#[derive(Debug, Clone, PartialEq)]
pub enum UnitOutcome {
    Completed(EvaluationRecord),
    Failed(EvaluationRecord),
}

impl UnitOutcome {
    pub fn record(&self) -> &EvaluationRecord {
        match self {
            UnitOutcome::Completed(r) | UnitOutcome::Failed(r) => r,
        }
    }

    pub fn into_record(self) -> EvaluationRecord {
        match self {
            UnitOutcome::Completed(r) | UnitOutcome::Failed(r) => r,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, UnitOutcome::Failed(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunSummary {
    pub total: usize,
    pub completed: usize,
    pub failed: usize,
    pub duration_ms: u64,
}

#[derive(Debug, Clone)]
pub struct RunOutput {
    /// In submission order.
    pub outcomes: Vec<UnitOutcome>,
    pub summary: RunSummary,
}

impl RunOutput {
    pub fn records(&self) -> Vec<EvaluationRecord> {
        self.outcomes.iter().map(|o| o.record().clone()).collect()
    }
}

pub struct Runner {
    pub invoker: Arc<ModelInvoker>,
    pub parallel: usize,
}

impl Runner {
    pub fn new(invoker: Arc<ModelInvoker>, parallel: usize) -> Self {
        Self {
            invoker,
            parallel: parallel.max(1),
        }
    }

    /// Runs every unit; outcomes are collected in completion order and
    /// returned sorted by submission index. If `progress` is set, it is
    /// called after each unit completes.
    pub async fn run(
        &self,
        units: Vec<WorkUnit>,
        progress: Option<ProgressSink>,
    ) -> anyhow::Result<RunOutput> {
        let started = Instant::now();
        let total = units.len();
        let sem = Arc::new(Semaphore::new(self.parallel));
        let mut join_set = JoinSet::new();

        tracing::info!(units = total, parallel = self.parallel, "starting sweep");

        // Units stay outside their tasks so a panicked task still yields a row.
        let mut pending: HashMap<Id, WorkUnit> = HashMap::with_capacity(total);
        for unit in units {
            let permit = sem.clone().acquire_owned().await?;
            let invoker = self.invoker.clone();
            let task_unit = unit.clone();
            let handle = join_set.spawn(async move {
                let _permit = permit;
                run_unit(&invoker, &task_unit).await
            });
            pending.insert(handle.id(), unit);
        }

        let mut outcomes: Vec<(usize, UnitOutcome)> = Vec::with_capacity(total);
        while let Some(res) = join_set.join_next_with_id().await {
            let (id, joined) = match res {
                Ok((id, outcome)) => (id, Ok(outcome)),
                Err(e) => (e.id(), Err(e)),
            };
            let unit = pending
                .remove(&id)
                .ok_or_else(|| anyhow::anyhow!("task {} finished but was never planned", id))?;
            let outcome = match joined {
                Ok(outcome) => outcome,
                Err(e) => {
                    let message = join_error_message(e);
                    tracing::warn!(
                        item_index = unit.item_index,
                        variant = %unit.variant.name,
                        condition = %unit.condition,
                        model = %unit.model.name,
                        error = %message,
                        "unit task aborted"
                    );
                    let ctx = unit_context(&unit);
                    UnitOutcome::Failed(unit_record(&unit, ctx, error_answer(&message)))
                }
            };
            outcomes.push((unit.index, outcome));
            if let Some(ref sink) = progress {
                sink(ProgressEvent {
                    done: outcomes.len(),
                    total,
                });
            }
        }

        outcomes.sort_by_key(|(index, _)| *index);
        let outcomes: Vec<UnitOutcome> = outcomes.into_iter().map(|(_, o)| o).collect();

        let failed = outcomes.iter().filter(|o| o.is_failed()).count();
        let summary = RunSummary {
            total,
            completed: total - failed,
            failed,
            duration_ms: started.elapsed().as_millis().min(u128::from(u64::MAX)) as u64,
        };
        tracing::info!(
            total = summary.total,
            completed = summary.completed,
            failed = summary.failed,
            duration_ms = summary.duration_ms,
            "sweep finished"
        );

        Ok(RunOutput { outcomes, summary })
    }
}

/// Context, prompt, model call, record. Never fails: errors become an
/// error-tagged record.
pub async fn run_unit(invoker: &ModelInvoker, unit: &WorkUnit) -> UnitOutcome {
    let item = &unit.item;
    let ctx = unit_context(unit);

    tracing::info!(
        "[{:03}][{}][{}] Q: {}",
        unit.item_index,
        unit.variant.name,
        unit.condition,
        item.question
    );

    let answer = match build_messages(&item.question, &ctx.text, &unit.variant) {
        Ok(messages) => {
            invoker
                .invoke(&unit.model, &messages, unit.variant.answer_marker.as_deref())
                .await
        }
        Err(e) => Err(e.into()),
    };

    let (model_answer, failed) = match answer {
        Ok(a) => {
            tracing::info!(" -> {}", a);
            (a, false)
        }
        Err(e) => {
            tracing::warn!(
                item_index = unit.item_index,
                variant = %unit.variant.name,
                condition = %unit.condition,
                model = %unit.model.name,
                error = %e,
                "unit failed"
            );
            (error_answer(&e.to_string()), true)
        }
    };

    let record = unit_record(unit, ctx, model_answer);
    if failed {
        UnitOutcome::Failed(record)
    } else {
        UnitOutcome::Completed(record)
    }
}

/// The unit's documents; reproducible from its seed alone.
fn unit_context(unit: &WorkUnit) -> BuiltContext {
    let mut rng = StdRng::seed_from_u64(unit.seed);
    build_context(&unit.item, unit.condition, &mut rng)
}

fn unit_record(unit: &WorkUnit, ctx: BuiltContext, model_answer: String) -> EvaluationRecord {
    EvaluationRecord {
        item_index: unit.item_index,
        model_name: unit.model.name.clone(),
        prompt_variant: unit.variant.name.clone(),
        context_condition: unit.condition,
        question: unit.item.question.clone(),
        gold_answer: unit.item.gold_answer.clone(),
        context: ctx.text,
        documents: ctx.documents,
        system_prompt: unit.variant.system.clone(),
        user_prompt: unit.variant.user.clone(),
        model_answer,
    }
}

fn join_error_message(err: JoinError) -> String {
    if !err.is_panic() {
        return format!("unit task did not complete: {}", err);
    }
    let payload = err.into_panic();
    let detail = payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_string());
    format!("unit task panicked: {}", detail)
}
