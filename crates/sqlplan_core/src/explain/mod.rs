//! Plan dumps.
//!
//! The dump of a statement is the main plan tree followed by every subplan
//! it references, then CTEs in reverse definition order. Output is
//! deterministic for a given plan.

pub mod explainable;
pub mod node;

use hashbrown::HashSet;

use explainable::ExplainEntry;
use node::ExplainNode;

use crate::logical::operator::LogicalOperator;
use crate::logical::statement::CompiledStatement;
use crate::logical::subplan::SubplanId;

/// Format a compiled statement as a human readable tree.
pub fn format_statement(stmt: &CompiledStatement) -> String {
    let mut out = String::new();
    let mut printed = HashSet::new();

    ExplainNode::walk_logical(&stmt.root).write_tree(&mut out);
    write_subplans(stmt, &referenced_subplans(&stmt.root), &mut printed, &mut out);

    for cte in stmt.ctes.iter().rev() {
        let kind = if cte.recursive { "recursive cte" } else { "cte" };
        let header = ExplainEntry::new("Subplan")
            .with_annotation(kind)
            .with_annotation(format!("id={}", cte.name))
            .with_annotations(&cte.renames);
        write_rooted(header, &cte.plan, &mut out);
        write_subplans(stmt, &referenced_subplans(&cte.plan), &mut printed, &mut out);
    }

    out
}

/// Format a single plan tree without any subplans.
pub fn format_plan(plan: &LogicalOperator) -> String {
    let mut out = String::new();
    ExplainNode::walk_logical(plan).write_tree(&mut out);
    out
}

fn write_rooted(header: ExplainEntry, plan: &LogicalOperator, out: &mut String) {
    ExplainNode {
        entry: header,
        children: vec![ExplainNode::walk_logical(plan)],
    }
    .write_tree(out);
}

fn write_subplans(
    stmt: &CompiledStatement,
    ids: &[SubplanId],
    printed: &mut HashSet<SubplanId>,
    out: &mut String,
) {
    for &id in ids {
        if !printed.insert(id) {
            continue;
        }
        let Ok(subplan) = stmt.subplan(id) else {
            continue;
        };
        let header = ExplainEntry::new("Subplan")
            .with_annotation("subquery")
            .with_annotation(format!("id={id}"));
        write_rooted(header, &subplan.plan, out);
        write_subplans(stmt, &referenced_subplans(&subplan.plan), printed, out);
    }
}

/// Subplans referenced within a plan, children before their parents.
fn referenced_subplans(plan: &LogicalOperator) -> Vec<SubplanId> {
    fn inner(plan: &LogicalOperator, out: &mut Vec<SubplanId>) {
        for child in plan.children() {
            inner(child, out);
        }
        out.extend(plan.referenced_subplans());
    }

    let mut out = Vec::new();
    inner(plan, &mut out);
    out
}
