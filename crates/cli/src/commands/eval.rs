use std::path::Path;

use rulebook_core::{Rule, TraceEntry, Variables};
use rulebook_eval::evaluate_rules;

use crate::{load_json, print_json, OutputFormat};

pub(crate) fn cmd_eval(rules_path: &Path, vars_path: &Path, output: OutputFormat, quiet: bool) {
    let rules: Vec<Rule> = load_json(rules_path, "rules", output, quiet);
    let vars: Variables = load_json(vars_path, "variables", output, quiet);

    let evaluation = evaluate_rules(&rules, &vars);
    if quiet {
        return;
    }

    match output {
        OutputFormat::Json => print_json(&evaluation),
        OutputFormat::Text => {
            println!(
                "Applicable rules ({} of {}):",
                evaluation.applicable_rules.len(),
                rules.len()
            );
            for rule in &evaluation.applicable_rules {
                let priority = rule
                    .priority
                    .map(|p| p.to_string())
                    .unwrap_or_else(|| "-".to_string());
                println!("  {} [priority {}] {}", rule.id, priority, rule.name);
            }
            println!();
            println!("Trace:");
            for entry in &evaluation.trace {
                println!("  {}", trace_line(entry));
            }
        }
    }
}

fn trace_line(entry: &TraceEntry) -> String {
    let verdict = match entry.passed {
        Some(true) => "pass",
        Some(false) => "fail",
        None => "-",
    };
    match &entry.message {
        Some(m) => format!("{} {}: {} ({})", entry.id, entry.name, verdict, m),
        None => format!("{} {}: {}", entry.id, entry.name, verdict),
    }
}
