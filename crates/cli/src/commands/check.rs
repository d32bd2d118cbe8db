use std::path::Path;
use std::process;

use rulebook_analyze::{detect_conflicts, ConflictKind, ConflictPolicy, ConflictSeverity};
use rulebook_core::Rule;

use crate::{load_json, print_json, OutputFormat};

pub(crate) fn cmd_check(rules_path: &Path, policy: &ConflictPolicy, output: OutputFormat, quiet: bool) {
    let rules: Vec<Rule> = load_json(rules_path, "rules", output, quiet);
    let result = detect_conflicts(&rules, policy);

    if !quiet {
        match output {
            OutputFormat::Json => print_json(&result),
            OutputFormat::Text => {
                println!("Rule Conflict Report");
                println!("====================");
                println!();
                println!("  Rules checked: {}", rules.len());
                println!(
                    "  Overlapping windows: {}",
                    result.of_kind(ConflictKind::Overlap).count()
                );
                println!(
                    "  Circular dependencies: {}",
                    result.of_kind(ConflictKind::CircularDependency).count()
                );
                println!(
                    "  Priority ties: {}",
                    result.of_kind(ConflictKind::PriorityTie).count()
                );
                if result.dependency_walk_truncated {
                    println!(
                        "  WARNING: dependency walk stopped after {} visits; cycle list may be incomplete",
                        policy.max_dependency_visits
                    );
                }

                if result.is_clean() {
                    println!();
                    println!("No conflicts found.");
                } else {
                    println!();
                    println!("Conflicts:");
                    for c in &result.conflicts {
                        let tag = match c.severity {
                            ConflictSeverity::Error => "ERROR",
                            ConflictSeverity::Warning => "WARNING",
                        };
                        println!("  [{}] {}", tag, c.message);
                        println!("      rules: {}", c.rule_ids.join(", "));
                    }
                    let errors = result
                        .conflicts
                        .iter()
                        .filter(|c| c.severity == ConflictSeverity::Error)
                        .count();
                    println!();
                    println!(
                        "Result: {} error(s), {} warning(s)",
                        errors,
                        result.conflicts.len() - errors
                    );
                }
            }
        }
    }

    if result.has_errors {
        process::exit(1);
    }
}
