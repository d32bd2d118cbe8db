//! Input and output shapes of a simulation run.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use rulebook_core::{TraceEntry, Value, Variables};

/// A coverage offered in the quote, with the customer's selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverageSelection {
    pub coverage_id: String,
    pub coverage_name: String,
    #[serde(default)]
    pub selected: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deductible: Option<Decimal>,
}

/// Read-only input to one simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationContext {
    pub product_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_name: Option<String>,
    pub state: String,
    pub effective_date: String,
    #[serde(default)]
    pub coverages: Vec<CoverageSelection>,
    #[serde(default)]
    pub exposures: Variables,
    #[serde(default)]
    pub rating_factors: BTreeMap<String, Decimal>,
}

impl SimulationContext {
    /// Flat variable binding for rule evaluation.
    ///
    /// `state` and `effectiveDate` first, then exposures, then rating
    /// factors; later sources overwrite earlier ones on key collisions.
    pub fn variables(&self) -> Variables {
        let mut vars = Variables::new();
        vars.insert("state".to_string(), Value::from(self.state.as_str()));
        vars.insert(
            "effectiveDate".to_string(),
            Value::from(self.effective_date.as_str()),
        );
        vars.extend(self.exposures.iter().map(|(k, v)| (k.clone(), v.clone())));
        vars.extend(
            self.rating_factors
                .iter()
                .map(|(k, v)| (k.clone(), Value::Decimal(*v))),
        );
        vars
    }

    pub fn selected_coverages(&self) -> impl Iterator<Item = &CoverageSelection> {
        self.coverages.iter().filter(|c| c.selected)
    }
}

/// One factor application inside a coverage premium calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FactorStep {
    pub factor_name: String,
    pub factor: Decimal,
    pub premium_before: Decimal,
    pub premium_after: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoveragePremium {
    pub coverage_id: String,
    pub coverage_name: String,
    pub base_premium: Decimal,
    pub adjusted_premium: Decimal,
    pub steps: Vec<FactorStep>,
}

/// Premium change caused by one rating factor on one coverage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PremiumAdjustment {
    pub coverage_id: String,
    pub name: String,
    pub factor: Decimal,
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeLine {
    pub name: String,
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxLine {
    pub name: String,
    pub rate: Decimal,
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PremiumBreakdown {
    pub base_premium: Decimal,
    pub adjustments: Vec<PremiumAdjustment>,
    pub fees: Vec<FeeLine>,
    pub taxes: Vec<TaxLine>,
    pub fees_total: Decimal,
    pub taxes_total: Decimal,
    pub total: Decimal,
}

impl PremiumBreakdown {
    pub fn zero() -> Self {
        PremiumBreakdown {
            base_premium: Decimal::ZERO,
            adjustments: Vec::new(),
            fees: Vec::new(),
            taxes: Vec::new(),
            fees_total: Decimal::ZERO,
            taxes_total: Decimal::ZERO,
            total: Decimal::ZERO,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationResult {
    pub success: bool,
    pub premium: PremiumBreakdown,
    pub coverages: Vec<CoveragePremium>,
    pub trace: Vec<TraceEntry>,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    /// Wall-clock run time in microseconds.
    pub execution_time: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rating_factors_overwrite_exposures() {
        let ctx: SimulationContext = serde_json::from_value(serde_json::json!({
            "productId": "p1",
            "state": "CA",
            "effectiveDate": "2025-01-01",
            "exposures": { "territory": "coastal", "age": 40 },
            "ratingFactors": { "territory": "1.1" }
        }))
        .unwrap();
        let vars = ctx.variables();
        assert_eq!(vars.get("territory"), Some(&Value::Decimal(Decimal::new(11, 1))));
        assert_eq!(vars.get("age"), Some(&Value::Int(40)));
        assert_eq!(vars.get("state"), Some(&Value::from("CA")));
        assert_eq!(vars.get("effectiveDate"), Some(&Value::from("2025-01-01")));
    }

    #[test]
    fn only_selected_coverages_are_listed() {
        let ctx: SimulationContext = serde_json::from_value(serde_json::json!({
            "productId": "p1",
            "state": "CA",
            "effectiveDate": "2025-01-01",
            "coverages": [
                { "coverageId": "a", "coverageName": "A", "selected": true },
                { "coverageId": "b", "coverageName": "B" }
            ]
        }))
        .unwrap();
        let ids: Vec<_> = ctx.selected_coverages().map(|c| c.coverage_id.as_str()).collect();
        assert_eq!(ids, vec!["a"]);
    }
}
