//! Deterministic pricing simulation.
//!
//! A [`SimulationEngine`] runs the eligibility rules of a rule set against
//! a [`SimulationContext`], prices every selected coverage by folding its
//! rating factors over a base rate, then applies the configured fees and
//! taxes. Every step appends to the engine's trace; create a fresh engine
//! per run when trace isolation matters.
//!
//! A run never fails outward: any internal error becomes a
//! `success = false` result carrying the trace recorded so far.

pub mod config;
pub mod types;

use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::{debug, info, warn};

use rulebook_core::{Rule, RuleType, TraceEntry, TraceKind, TraceRecorder, TraceStep, Variables};

use crate::numeric::{round_money, MAX_SCALE};
use crate::rules::evaluate_rules_with;

pub use config::{FeeSpec, SimulationConfig, TaxSpec};
pub use types::{
    CoveragePremium, CoverageSelection, FactorStep, FeeLine, PremiumAdjustment,
    PremiumBreakdown, SimulationContext, SimulationResult, TaxLine,
};

/// Errors raised inside a run. Only visible to callers of
/// [`SimulationEngine::calculate_coverage_premium`]; `run_simulation`
/// folds them into its result.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SimulationError {
    #[error("numeric overflow while computing {context}")]
    Overflow { context: String },

    #[error("invalid simulation config: {message}")]
    InvalidConfig { message: String },
}

fn overflow(context: impl Into<String>) -> SimulationError {
    SimulationError::Overflow {
        context: context.into(),
    }
}

/// Running totals of the priced coverages.
struct CoverageTotals {
    coverages: Vec<CoveragePremium>,
    adjustments: Vec<PremiumAdjustment>,
    total_base: Decimal,
    total_adjusted: Decimal,
}

pub struct SimulationEngine {
    context: SimulationContext,
    config: SimulationConfig,
    recorder: TraceRecorder,
}

impl SimulationEngine {
    pub fn new(context: SimulationContext, config: SimulationConfig) -> Self {
        SimulationEngine {
            context,
            config,
            recorder: TraceRecorder::new(),
        }
    }

    pub fn with_defaults(context: SimulationContext) -> Self {
        Self::new(context, SimulationConfig::default())
    }

    pub fn context(&self) -> &SimulationContext {
        &self.context
    }

    /// Trace accumulated by this engine so far.
    pub fn trace(&self) -> &[TraceEntry] {
        self.recorder.entries()
    }

    /// Price one coverage: start from `base_rate` and multiply by each
    /// factor in map order. Records one `calculation` entry per factor and
    /// a closing `result` entry.
    pub fn calculate_coverage_premium(
        &mut self,
        coverage_id: &str,
        coverage_name: &str,
        base_rate: Decimal,
        factors: &BTreeMap<String, Decimal>,
    ) -> Result<CoveragePremium, SimulationError> {
        let mut premium = base_rate;
        let mut steps = Vec::with_capacity(factors.len());

        for (name, factor) in factors {
            let started = Instant::now();
            let next = premium
                .checked_mul(*factor)
                .ok_or_else(|| overflow(format!("{} factor '{}'", coverage_name, name)))?;
            self.recorder.record(
                TraceStep::new(
                    TraceKind::Calculation,
                    format!("{}: apply {}", coverage_name, name),
                )
                .input("premium", premium)
                .input("factor", *factor)
                .output(next)
                .since(started),
            );
            steps.push(FactorStep {
                factor_name: name.clone(),
                factor: *factor,
                premium_before: premium,
                premium_after: next,
            });
            premium = next;
        }

        let adjusted = round_money(premium, self.config.money_scale);
        self.recorder.record(
            TraceStep::new(TraceKind::Result, format!("{} premium", coverage_name))
                .input("coverageId", coverage_id)
                .input("basePremium", base_rate)
                .output(adjusted),
        );

        Ok(CoveragePremium {
            coverage_id: coverage_id.to_string(),
            coverage_name: coverage_name.to_string(),
            base_premium: base_rate,
            adjusted_premium: adjusted,
            steps,
        })
    }

    /// Run one simulation against `rules` and the coverage rate table.
    pub fn run_simulation(
        &mut self,
        rules: &[Rule],
        base_rates: &BTreeMap<String, Decimal>,
    ) -> SimulationResult {
        let started = Instant::now();
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        info!(
            product_id = %self.context.product_id,
            state = %self.context.state,
            rules = rules.len(),
            "running simulation"
        );

        match self.price(rules, base_rates, &mut errors, &mut warnings) {
            Ok((premium, coverages)) => SimulationResult {
                success: errors.is_empty(),
                premium,
                coverages,
                trace: self.recorder.entries().to_vec(),
                errors,
                warnings,
                execution_time: elapsed_micros(started),
            },
            Err(e) => {
                warn!(error = %e, "simulation aborted");
                errors.push(e.to_string());
                SimulationResult {
                    success: false,
                    premium: PremiumBreakdown::zero(),
                    coverages: Vec::new(),
                    trace: self.recorder.entries().to_vec(),
                    errors,
                    warnings,
                    execution_time: elapsed_micros(started),
                }
            }
        }
    }

    fn price(
        &mut self,
        rules: &[Rule],
        base_rates: &BTreeMap<String, Decimal>,
        errors: &mut Vec<String>,
        warnings: &mut Vec<String>,
    ) -> Result<(PremiumBreakdown, Vec<CoveragePremium>), SimulationError> {
        if self.config.money_scale > MAX_SCALE {
            return Err(SimulationError::InvalidConfig {
                message: format!(
                    "money_scale {} exceeds the maximum of {}",
                    self.config.money_scale, MAX_SCALE
                ),
            });
        }

        let vars = self.context.variables();
        self.recorder.record(
            TraceStep::new(TraceKind::Lookup, "context variables")
                .inputs(&vars)
                .output(vars.len() as i64),
        );

        self.check_eligibility(rules, &vars, errors);

        let totals = self.price_coverages(base_rates, warnings)?;
        self.apply_fees_and_taxes(totals)
    }

    fn check_eligibility(
        &mut self,
        rules: &[Rule],
        vars: &Variables,
        errors: &mut Vec<String>,
    ) {
        let eligibility: Vec<&Rule> = rules
            .iter()
            .filter(|r| r.rule_type == RuleType::Eligibility)
            .collect();
        let passed = evaluate_rules_with(eligibility.iter().copied(), vars, &mut self.recorder);
        if passed.len() == eligibility.len() {
            return;
        }

        for rule in eligibility {
            if passed.iter().any(|p| std::ptr::eq(*p, rule)) {
                continue;
            }
            let message = rule
                .outcome
                .as_ref()
                .map(|o| o.message.clone())
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| format!("Eligibility rule '{}' not satisfied", rule.name));
            debug!(rule_id = %rule.id, "eligibility rule failed");
            errors.push(message);
        }
    }

    fn price_coverages(
        &mut self,
        base_rates: &BTreeMap<String, Decimal>,
        warnings: &mut Vec<String>,
    ) -> Result<CoverageTotals, SimulationError> {
        let selected: Vec<CoverageSelection> =
            self.context.selected_coverages().cloned().collect();
        if selected.is_empty() {
            warnings.push("No coverages selected".to_string());
        }

        let factors = self.context.rating_factors.clone();
        let mut totals = CoverageTotals {
            coverages: Vec::with_capacity(selected.len()),
            adjustments: Vec::new(),
            total_base: Decimal::ZERO,
            total_adjusted: Decimal::ZERO,
        };

        for coverage in &selected {
            let base_rate = match base_rates.get(&coverage.coverage_id) {
                Some(rate) => *rate,
                None => {
                    let fallback = self.config.default_base_rate;
                    warn!(coverage_id = %coverage.coverage_id, default = %fallback, "missing base rate; using default");
                    warnings.push(format!(
                        "No base rate for coverage '{}'; using default {}",
                        coverage.coverage_name, fallback
                    ));
                    self.recorder.record(
                        TraceStep::new(
                            TraceKind::Lookup,
                            format!("{} base rate", coverage.coverage_name),
                        )
                        .input("coverageId", coverage.coverage_id.as_str())
                        .output(fallback)
                        .message("base rate missing; default applied"),
                    );
                    fallback
                }
            };

            let premium = self.calculate_coverage_premium(
                &coverage.coverage_id,
                &coverage.coverage_name,
                base_rate,
                &factors,
            )?;

            for step in &premium.steps {
                let amount = step
                    .premium_after
                    .checked_sub(step.premium_before)
                    .ok_or_else(|| overflow("premium adjustment"))?;
                totals.adjustments.push(PremiumAdjustment {
                    coverage_id: coverage.coverage_id.clone(),
                    name: step.factor_name.clone(),
                    factor: step.factor,
                    amount: round_money(amount, self.config.money_scale),
                });
            }
            totals.total_base = totals
                .total_base
                .checked_add(premium.base_premium)
                .ok_or_else(|| overflow("total base premium"))?;
            totals.total_adjusted = totals
                .total_adjusted
                .checked_add(premium.adjusted_premium)
                .ok_or_else(|| overflow("total adjusted premium"))?;
            totals.coverages.push(premium);
        }

        Ok(totals)
    }

    fn apply_fees_and_taxes(
        &mut self,
        totals: CoverageTotals,
    ) -> Result<(PremiumBreakdown, Vec<CoveragePremium>), SimulationError> {
        let scale = self.config.money_scale;

        let mut fees = Vec::with_capacity(self.config.fees.len());
        let mut fees_total = Decimal::ZERO;
        for fee in &self.config.fees {
            let amount = round_money(fee.amount, scale);
            fees_total = fees_total
                .checked_add(amount)
                .ok_or_else(|| overflow("fees total"))?;
            fees.push(FeeLine {
                name: fee.name.clone(),
                amount,
            });
        }
        self.recorder.record(
            TraceStep::new(TraceKind::Calculation, "fees")
                .input("count", fees.len() as i64)
                .output(fees_total),
        );

        let mut taxes = Vec::with_capacity(self.config.taxes.len());
        let mut taxes_total = Decimal::ZERO;
        for tax in &self.config.taxes {
            let raw = totals
                .total_adjusted
                .checked_mul(tax.rate)
                .ok_or_else(|| overflow(format!("tax '{}'", tax.name)))?;
            let amount = round_money(raw, scale);
            self.recorder.record(
                TraceStep::new(TraceKind::Calculation, tax.name.clone())
                    .input("taxableAmount", totals.total_adjusted)
                    .input("rate", tax.rate)
                    .output(amount),
            );
            taxes_total = taxes_total
                .checked_add(amount)
                .ok_or_else(|| overflow("taxes total"))?;
            taxes.push(TaxLine {
                name: tax.name.clone(),
                rate: tax.rate,
                amount,
            });
        }

        let total = totals
            .total_adjusted
            .checked_add(fees_total)
            .and_then(|t| t.checked_add(taxes_total))
            .ok_or_else(|| overflow("total premium"))?;
        self.recorder.record(
            TraceStep::new(TraceKind::Result, "total premium")
                .input("adjustedPremium", totals.total_adjusted)
                .input("feesTotal", fees_total)
                .input("taxesTotal", taxes_total)
                .output(total),
        );
        info!(total = %total, "simulation priced");

        let premium = PremiumBreakdown {
            base_premium: totals.total_base,
            adjustments: totals.adjustments,
            fees,
            taxes,
            fees_total,
            taxes_total,
            total,
        };
        Ok((premium, totals.coverages))
    }
}

fn elapsed_micros(started: Instant) -> u64 {
    rulebook_core::trace::duration_micros(started.elapsed())
}

/// Run one simulation on a fresh engine.
pub fn simulate(
    context: SimulationContext,
    rules: &[Rule],
    base_rates: &BTreeMap<String, Decimal>,
    config: SimulationConfig,
) -> SimulationResult {
    SimulationEngine::new(context, config).run_simulation(rules, base_rates)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> SimulationContext {
        SimulationContext {
            product_id: "ho3".to_string(),
            product_name: None,
            state: "CA".to_string(),
            effective_date: "2025-01-01".to_string(),
            coverages: vec![CoverageSelection {
                coverage_id: "dwelling".to_string(),
                coverage_name: "Dwelling".to_string(),
                selected: true,
                limit: None,
                deductible: None,
            }],
            exposures: Default::default(),
            rating_factors: BTreeMap::from([
                ("claimsFree".to_string(), Decimal::new(9, 1)),
                ("territory".to_string(), Decimal::new(11, 1)),
            ]),
        }
    }

    #[test]
    fn coverage_premium_folds_factors() {
        let mut engine = SimulationEngine::with_defaults(context());
        let factors = engine.context().rating_factors.clone();
        let p = engine
            .calculate_coverage_premium("dwelling", "Dwelling", Decimal::new(1000, 0), &factors)
            .unwrap();
        assert_eq!(p.adjusted_premium, Decimal::new(990, 0));
        assert_eq!(p.steps.len(), 2);

        let kinds: Vec<_> = engine.trace().iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![TraceKind::Calculation, TraceKind::Calculation, TraceKind::Result]
        );
    }

    #[test]
    fn no_factors_keeps_base_rate() {
        let mut engine = SimulationEngine::with_defaults(context());
        let p = engine
            .calculate_coverage_premium("x", "X", Decimal::new(250, 0), &BTreeMap::new())
            .unwrap();
        assert_eq!(p.adjusted_premium, Decimal::new(250, 0));
        assert_eq!(engine.trace().len(), 1);
    }

    #[test]
    fn overflow_becomes_failed_result() {
        let mut ctx = context();
        ctx.rating_factors = BTreeMap::from([("huge".to_string(), Decimal::MAX)]);
        let rates = BTreeMap::from([("dwelling".to_string(), Decimal::MAX)]);
        let result = simulate(ctx, &[], &rates, SimulationConfig::default());
        assert!(!result.success);
        assert_eq!(result.premium, PremiumBreakdown::zero());
        assert!(result.errors[0].contains("overflow"));
        assert!(!result.trace.is_empty());
    }

    #[test]
    fn invalid_scale_is_reported() {
        let cfg = SimulationConfig {
            money_scale: 40,
            ..SimulationConfig::default()
        };
        let result = simulate(context(), &[], &BTreeMap::new(), cfg);
        assert!(!result.success);
        assert!(result.errors[0].contains("money_scale"));
    }

    #[test]
    fn trace_accumulates_across_runs_on_one_engine() {
        let mut engine = SimulationEngine::with_defaults(context());
        let rates = BTreeMap::from([("dwelling".to_string(), Decimal::new(1000, 0))]);
        let first = engine.run_simulation(&[], &rates);
        let second = engine.run_simulation(&[], &rates);
        assert!(second.trace.len() > first.trace.len());
        assert_eq!(first.premium.total, second.premium.total);
    }
}
