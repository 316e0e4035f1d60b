// Cost accounting
//
// Converts reported token usage into money using a per-model price table and
// keeps running totals for a run. Totals are informational; they never gate
// generation.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

use crate::providers::TokenUsage;

#[derive(Debug, Error, PartialEq)]
pub enum CostError {
    /// Reporting zero for an unpriced model would be worse than no report
    #[error("Model '{model}' not found in pricing options")]
    UnknownModelPricing { model: String },
}

/// Price per token, in dollars
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelPricing {
    pub input: f64,
    pub output: f64,
}

impl ModelPricing {
    pub const fn new(input: f64, output: f64) -> Self {
        Self { input, output }
    }

    pub fn cost(&self, input_tokens: u64, output_tokens: u64) -> f64 {
        self.input * input_tokens as f64 + self.output * output_tokens as f64
    }
}

const BUILTIN_PRICING: [(&str, ModelPricing); 2] = [
    ("gpt-3.5-turbo", ModelPricing::new(0.5 / 1e6, 1.5 / 1e6)),
    ("gpt-4o", ModelPricing::new(5.0 / 1e6, 15.0 / 1e6)),
];

#[derive(Debug, Clone, PartialEq)]
pub struct PricingTable {
    entries: HashMap<String, ModelPricing>,
}

impl PricingTable {
    pub fn empty() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Built-in OpenAI prices
    pub fn builtin() -> Self {
        let mut table = Self::empty();
        for (model, pricing) in BUILTIN_PRICING {
            table.insert(model, pricing);
        }
        table
    }

    /// Built-in prices with `overrides` layered on top
    pub fn with_overrides(overrides: &HashMap<String, ModelPricing>) -> Self {
        let mut table = Self::builtin();
        for (model, pricing) in overrides {
            table.insert(model.clone(), *pricing);
        }
        table
    }

    pub fn insert(&mut self, model: impl Into<String>, pricing: ModelPricing) {
        self.entries.insert(model.into(), pricing);
    }

    pub fn get(&self, model: &str) -> Result<ModelPricing, CostError> {
        self.entries
            .get(model)
            .copied()
            .ok_or_else(|| CostError::UnknownModelPricing {
                model: model.to_string(),
            })
    }
}

impl Default for PricingTable {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Prices calls for one model
#[derive(Debug, Clone)]
pub struct CostAccountant {
    model: String,
    table: PricingTable,
}

impl CostAccountant {
    pub fn new(model: impl Into<String>, table: PricingTable) -> Self {
        Self {
            model: model.into(),
            table,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Fails if the model has no price entry
    pub fn ensure_priced(&self) -> Result<ModelPricing, CostError> {
        self.table.get(&self.model)
    }

    pub fn cost(&self, input_tokens: u64, output_tokens: u64) -> Result<f64, CostError> {
        Ok(self.ensure_priced()?.cost(input_tokens, output_tokens))
    }
}

/// Running totals for one process
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CostLedger {
    pub calls: u64,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub total_cost: f64,
}

impl CostLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Price `usage`, add it to the totals and return the call's cost
    pub fn record(&mut self, accountant: &CostAccountant, usage: TokenUsage) -> Result<f64, CostError> {
        let cost = accountant.cost(usage.input_tokens, usage.output_tokens)?;
        self.calls += 1;
        self.input_tokens += usage.input_tokens;
        self.output_tokens += usage.output_tokens;
        self.total_cost += cost;
        Ok(cost)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn accountant() -> CostAccountant {
        let mut table = PricingTable::empty();
        table.insert("test-model", ModelPricing::new(0.5e-6, 1.5e-6));
        CostAccountant::new("test-model", table)
    }

    #[test]
    fn test_cost_per_call() {
        let cost = accountant().cost(100, 50).unwrap();
        assert!((cost - 125e-6).abs() < 1e-12);
    }

    #[test]
    fn test_ledger_accumulates_individual_costs() {
        let accountant = accountant();
        let mut ledger = CostLedger::new();

        let first = ledger.record(&accountant, TokenUsage::new(100, 50)).unwrap();
        let second = ledger.record(&accountant, TokenUsage::new(200, 100)).unwrap();

        assert_eq!(ledger.calls, 2);
        assert_eq!(ledger.input_tokens, 300);
        assert_eq!(ledger.output_tokens, 150);
        assert!((ledger.total_cost - (first + second)).abs() < 1e-12);
        assert!((ledger.total_cost - accountant.cost(300, 150).unwrap()).abs() < 1e-12);
    }

    #[test]
    fn test_unknown_model_pricing() {
        let accountant = CostAccountant::new("llama-3", PricingTable::builtin());
        assert_eq!(
            accountant.cost(1, 1),
            Err(CostError::UnknownModelPricing {
                model: "llama-3".to_string()
            })
        );

        let mut ledger = CostLedger::new();
        assert!(ledger.record(&accountant, TokenUsage::new(1, 1)).is_err());
        assert_eq!(ledger, CostLedger::default());
    }

    #[test]
    fn test_builtin_table_and_overrides() {
        let builtin = PricingTable::builtin();
        assert_eq!(builtin.get("gpt-4o").unwrap(), ModelPricing::new(5e-6, 15e-6));

        let mut overrides = HashMap::new();
        overrides.insert("gpt-4o".to_string(), ModelPricing::new(2.5e-6, 10e-6));
        overrides.insert("local".to_string(), ModelPricing::new(0.0, 0.0));
        let table = PricingTable::with_overrides(&overrides);

        assert_eq!(table.get("gpt-4o").unwrap().input, 2.5e-6);
        assert!(table.get("local").is_ok());
        assert!(table.get("gpt-3.5-turbo").is_ok());
    }
}
