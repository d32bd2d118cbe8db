use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::process;

use rulebook_core::Rule;
use rulebook_eval::{simulate, SimulationConfig, SimulationContext, SimulationResult};

use crate::{load_json, print_json, OutputFormat};

/// A simulation input file.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Scenario {
    context: SimulationContext,
    #[serde(default)]
    rules: Vec<Rule>,
    #[serde(default)]
    base_rates: BTreeMap<String, Decimal>,
}

pub(crate) fn cmd_simulate(
    scenario_path: &Path,
    config: SimulationConfig,
    output: OutputFormat,
    quiet: bool,
) {
    let scenario: Scenario = load_json(scenario_path, "scenario", output, quiet);
    let result = simulate(
        scenario.context.clone(),
        &scenario.rules,
        &scenario.base_rates,
        config,
    );

    if !quiet {
        match output {
            OutputFormat::Json => print_json(&result),
            OutputFormat::Text => print_text(&scenario.context, &result),
        }
    }

    if !result.success {
        process::exit(1);
    }
}

fn print_text(context: &SimulationContext, result: &SimulationResult) {
    let product = context
        .product_name
        .as_deref()
        .unwrap_or(context.product_id.as_str());
    println!(
        "Simulation: {} ({}, effective {})",
        product, context.state, context.effective_date
    );
    println!();

    println!("Coverages:");
    if result.coverages.is_empty() {
        println!("  (none)");
    }
    for c in &result.coverages {
        println!(
            "  {}: base {} -> adjusted {}",
            c.coverage_name, c.base_premium, c.adjusted_premium
        );
        for step in &c.steps {
            println!(
                "      x {} {} = {}",
                step.factor, step.factor_name, step.premium_after
            );
        }
    }
    println!();

    let premium = &result.premium;
    println!("  Base premium: {}", premium.base_premium);
    for fee in &premium.fees {
        println!("  {}: {}", fee.name, fee.amount);
    }
    for tax in &premium.taxes {
        println!("  {} ({}): {}", tax.name, tax.rate, tax.amount);
    }
    println!("  Total: {}", premium.total);

    if !result.warnings.is_empty() {
        println!();
        println!("Warnings:");
        for w in &result.warnings {
            println!("  - {}", w);
        }
    }
    if !result.errors.is_empty() {
        println!();
        println!("Errors:");
        for e in &result.errors {
            println!("  - {}", e);
        }
    }

    println!();
    println!(
        "Result: {} ({} trace entries, {} us)",
        if result.success { "SUCCESS" } else { "FAILED" },
        result.trace.len(),
        result.execution_time
    );
}
