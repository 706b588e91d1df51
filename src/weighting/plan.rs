//! Execution plan: which strategies run, and in which order.
//!
//! Rules:
//! - every declared name (combo order or not) must be a registered strategy
//!   with valid parameters
//! - with a `combo` entry, its `order` is the execution order
//! - without one, exactly one strategy may be declared

use std::collections::{BTreeMap, BTreeSet};

use serde_json::Value;
use tracing::warn;

use crate::error::{Result, WeightError};
use crate::strategies::registry::parse_combo;
use crate::strategies::{COMBO, Strategy, lookup};

/// Ordered list of validated strategies.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionPlan {
    steps: Vec<Strategy>,
}

impl ExecutionPlan {
    pub fn resolve(strategies: &BTreeMap<String, Value>) -> Result<Self> {
        if strategies.is_empty() {
            return Err(WeightError::config("No strategies configured."));
        }

        let mut declared: BTreeMap<&str, Strategy> = BTreeMap::new();
        for (name, params) in strategies {
            if name == COMBO {
                continue;
            }
            declared.insert(name.as_str(), lookup(name, params)?);
        }

        let steps = match strategies.get(COMBO) {
            Some(params) => Self::ordered(&declared, &parse_combo(params)?.order)?,
            None if declared.len() == 1 => declared.into_values().collect(),
            None => {
                let names: Vec<&str> = declared.keys().copied().collect();
                return Err(WeightError::config(format!(
                    "Several strategies configured ({}) without a '{COMBO}' order; \
                     add {{\"{COMBO}\": {{\"order\": [...]}}}} to fix the composition.",
                    names.join(", ")
                )));
            }
        };

        Ok(Self { steps })
    }

    fn ordered(declared: &BTreeMap<&str, Strategy>, order: &[String]) -> Result<Vec<Strategy>> {
        if order.is_empty() {
            return Err(WeightError::config(format!("'{COMBO}.order' must not be empty.")));
        }

        let mut seen: BTreeSet<&str> = BTreeSet::new();
        let mut steps = Vec::with_capacity(order.len());
        for name in order {
            let name = name.as_str();
            if name == COMBO {
                return Err(WeightError::config(format!("'{COMBO}.order' cannot contain '{COMBO}'.")));
            }
            if !seen.insert(name) {
                return Err(WeightError::config(format!(
                    "'{COMBO}.order' lists '{name}' more than once."
                )));
            }
            let strategy = declared.get(name).ok_or_else(|| {
                WeightError::config(format!(
                    "'{COMBO}.order' references '{name}', which is not declared in strategies."
                ))
            })?;
            steps.push(strategy.clone());
        }

        for name in declared.keys().filter(|n| !seen.contains(*n)) {
            warn!(strategy = name, "declared strategy is not in the combo order; skipping");
        }
        Ok(steps)
    }

    pub fn steps(&self) -> &[Strategy] {
        &self.steps
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.steps.iter().map(Strategy::name).collect()
    }

    /// Table columns read by any step, beyond date and target.
    pub fn required_columns(&self) -> Vec<&str> {
        let mut cols: Vec<&str> = Vec::new();
        for col in self.steps.iter().flat_map(Strategy::required_columns) {
            if !cols.contains(&col) {
                cols.push(col);
            }
        }
        cols
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategies::DecayRate;
    use serde_json::json;

    fn map(value: Value) -> BTreeMap<String, Value> {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn single_strategy_needs_no_order() {
        let plan = ExecutionPlan::resolve(&map(json!({"balanced": {}}))).unwrap();
        assert_eq!(plan.names(), vec!["balanced"]);
    }

    #[test]
    fn combo_order_is_respected() {
        let plan = ExecutionPlan::resolve(&map(json!({
            "balanced": {},
            "recency_decay": {"half_life": 12},
            "combo": {"order": ["recency_decay", "balanced"]}
        })))
        .unwrap();
        assert_eq!(plan.names(), vec!["recency_decay", "balanced"]);
        assert_eq!(plan.steps()[0], Strategy::RecencyDecay(DecayRate::HalfLife(12.0)));
    }

    #[test]
    fn ambiguous_composition_is_rejected() {
        let err = ExecutionPlan::resolve(&map(json!({"balanced": {}, "equal_vintage": {}}))).unwrap_err();
        assert!(matches!(err, WeightError::Configuration(_)));
        assert!(err.to_string().contains("balanced, equal_vintage"));
    }

    #[test]
    fn combo_order_must_reference_declared_strategies() {
        let err = ExecutionPlan::resolve(&map(json!({
            "balanced": {},
            "combo": {"order": ["balanced", "equal_vintage"]}
        })))
        .unwrap_err();
        assert!(err.to_string().contains("'equal_vintage'"));
    }

    #[test]
    fn combo_order_rejects_duplicates_empty_and_self() {
        for order in [json!([]), json!(["balanced", "balanced"]), json!(["combo"])] {
            let cfg = map(json!({"balanced": {}, "combo": {"order": order}}));
            assert!(ExecutionPlan::resolve(&cfg).is_err());
        }
        assert!(ExecutionPlan::resolve(&map(json!({"balanced": {}, "combo": {}}))).is_err());
    }

    #[test]
    fn unordered_declarations_are_still_validated() {
        let err = ExecutionPlan::resolve(&map(json!({
            "balanced": {},
            "recency_decay": {"half_life": -1},
            "combo": {"order": ["balanced"]}
        })))
        .unwrap_err();
        assert!(err.to_string().contains("half_life"));

        let plan = ExecutionPlan::resolve(&map(json!({
            "balanced": {},
            "equal_vintage": {},
            "combo": {"order": ["balanced"]}
        })))
        .unwrap();
        assert_eq!(plan.names(), vec!["balanced"]);
    }

    #[test]
    fn empty_and_unknown_are_configuration_errors() {
        assert!(ExecutionPlan::resolve(&BTreeMap::new()).is_err());
        let err = ExecutionPlan::resolve(&map(json!({"foo": {}}))).unwrap_err();
        assert!(matches!(err, WeightError::Configuration(_)));
    }

    #[test]
    fn required_columns_are_deduplicated() {
        let plan = ExecutionPlan::resolve(&map(json!({
            "expected_loss": {"ead_col": "ead", "lgd_col": "lgd"},
        })))
        .unwrap();
        assert_eq!(plan.required_columns(), vec!["ead", "lgd"]);
    }
}
