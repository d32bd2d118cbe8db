use serde::Serialize;
use std::path::Path;
use std::process;

use rulebook_core::{validate_tree, ConditionGroup, IssueSeverity, TreeIssue};

use crate::{load_json, print_json, OutputFormat};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TreeReport<'a> {
    root: &'a str,
    rendered: String,
    leaf_count: usize,
    depth: usize,
    publishable: bool,
    issues: &'a [TreeIssue],
}

pub(crate) fn cmd_validate(tree_path: &Path, output: OutputFormat, quiet: bool) {
    let tree: ConditionGroup = load_json(tree_path, "condition tree", output, quiet);
    let issues = validate_tree(&tree);
    let publishable = issues.iter().all(|i| i.severity != IssueSeverity::Error);

    if !quiet {
        match output {
            OutputFormat::Json => print_json(&TreeReport {
                root: tree.id.as_str(),
                rendered: tree.to_string(),
                leaf_count: tree.leaf_count(),
                depth: tree.depth(),
                publishable,
                issues: &issues,
            }),
            OutputFormat::Text => {
                println!("{}", tree);
                println!(
                    "  {} leaf condition(s), depth {}",
                    tree.leaf_count(),
                    tree.depth()
                );
                if issues.is_empty() {
                    println!("Valid: no issues found");
                } else {
                    for issue in &issues {
                        let tag = match issue.severity {
                            IssueSeverity::Error => "error",
                            IssueSeverity::Warning => "warning",
                        };
                        println!("  [{}] {}: {}", tag, issue.node_id, issue.message);
                    }
                    if publishable {
                        println!("Valid with {} warning(s)", issues.len());
                    } else {
                        println!("Invalid: tree cannot be published");
                    }
                }
            }
        }
    }

    if !publishable {
        process::exit(1);
    }
}
