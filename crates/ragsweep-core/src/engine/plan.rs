//! Up-front enumeration of the sweep's units of work.

use crate::invoker::ModelSpec;
use crate::model::{ContextCondition, DatasetItem};
use crate::prompt::PromptVariant;
use sha2::{Digest, Sha256};
use std::sync::Arc;

/// One (item, condition, model, variant) combination.
#[derive(Debug, Clone)]
pub struct WorkUnit {
    /// Submission position; output is sorted by this.
    pub index: usize,
    pub item_index: usize,
    pub item: Arc<DatasetItem>,
    pub condition: ContextCondition,
    pub model: Arc<ModelSpec>,
    pub variant: Arc<PromptVariant>,
    /// Seed for this unit's document shuffle.
    pub seed: u64,
}

/// Items outermost, then conditions, then models, variants innermost.
pub fn plan_units(
    items: &[DatasetItem],
    conditions: &[ContextCondition],
    models: &[ModelSpec],
    variants: &[PromptVariant],
    seed: u64,
) -> Vec<WorkUnit> {
    let models: Vec<Arc<ModelSpec>> = models.iter().cloned().map(Arc::new).collect();
    let variants: Vec<Arc<PromptVariant>> = variants.iter().cloned().map(Arc::new).collect();

    let mut units =
        Vec::with_capacity(items.len() * conditions.len() * models.len() * variants.len());
    for (item_index, item) in items.iter().enumerate() {
        let item = Arc::new(item.clone());
        for &condition in conditions {
            for model in &models {
                for variant in &variants {
                    units.push(WorkUnit {
                        index: units.len(),
                        item_index,
                        item: item.clone(),
                        condition,
                        model: model.clone(),
                        variant: variant.clone(),
                        seed: unit_seed(seed, item_index, condition, &model.name, &variant.name),
                    });
                }
            }
        }
    }
    units
}

/// Stable per-unit seed, independent of scheduling and worker count.
pub fn unit_seed(
    seed: u64,
    item_index: usize,
    condition: ContextCondition,
    model: &str,
    variant: &str,
) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(seed.to_le_bytes());
    hasher.update((item_index as u64).to_le_bytes());
    hasher.update(condition.as_str().as_bytes());
    hasher.update(b"|");
    hasher.update(model.as_bytes());
    hasher.update(b"|");
    hasher.update(variant.as_bytes());
    let digest = hasher.finalize();

    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::llm::Backend;

    fn item(q: &str) -> DatasetItem {
        DatasetItem {
            question: q.into(),
            relevant_docs: vec!["r".into()],
            irrelevant_docs: vec!["i".into()],
            gold_answer: "g".into(),
        }
    }

    fn variant(name: &str) -> PromptVariant {
        PromptVariant::new(name, None, Some("{question}".into())).unwrap()
    }

    #[test]
    fn enumerates_cross_product_in_nesting_order() {
        let units = plan_units(
            &[item("a"), item("b")],
            &[ContextCondition::RelevantOnly, ContextCondition::Mixed],
            &[ModelSpec::new("m", Backend::LocalChat)],
            &[variant("v1"), variant("v2")],
            42,
        );
        assert_eq!(units.len(), 8);
        let keys: Vec<_> = units
            .iter()
            .map(|u| (u.item_index, u.condition, u.variant.name.clone()))
            .collect();
        assert_eq!(keys[0], (0, ContextCondition::RelevantOnly, "v1".into()));
        assert_eq!(keys[1], (0, ContextCondition::RelevantOnly, "v2".into()));
        assert_eq!(keys[2], (0, ContextCondition::Mixed, "v1".into()));
        assert_eq!(keys[4], (1, ContextCondition::RelevantOnly, "v1".into()));
        assert!(units.iter().enumerate().all(|(i, u)| u.index == i));
    }

    #[test]
    fn empty_axis_plans_nothing() {
        let units = plan_units(&[item("a")], &[], &[], &[variant("v")], 1);
        assert!(units.is_empty());
    }

    #[test]
    fn unit_seed_depends_on_every_coordinate() {
        let base = unit_seed(42, 0, ContextCondition::Mixed, "m", "v");
        assert_eq!(base, unit_seed(42, 0, ContextCondition::Mixed, "m", "v"));
        assert_ne!(base, unit_seed(43, 0, ContextCondition::Mixed, "m", "v"));
        assert_ne!(base, unit_seed(42, 1, ContextCondition::Mixed, "m", "v"));
        assert_ne!(base, unit_seed(42, 0, ContextCondition::RelevantOnly, "m", "v"));
        assert_ne!(base, unit_seed(42, 0, ContextCondition::Mixed, "m2", "v"));
        assert_ne!(base, unit_seed(42, 0, ContextCondition::Mixed, "m", "v2"));
    }
}
