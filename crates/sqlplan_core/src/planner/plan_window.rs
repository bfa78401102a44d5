use hashbrown::HashMap;
use sqlplan_error::{PlanError, Result};

use super::PlanContext;
use crate::ast;
use crate::binder::expr_binder::ExpressionBinder;
use crate::expr::Expression;
use crate::expr::ref_expr::RefBinding;
use crate::expr::window_expr::WindowSpec;
use crate::logical::logical_window::LogicalWindow;
use crate::logical::operator::{LogicalOperator, Node};

#[derive(Debug)]
pub struct WindowPlanner;

impl WindowPlanner {
    /// Bind the definitions in a WINDOW clause.
    pub fn bind_named_windows(
        &self,
        ctx: &mut PlanContext,
        binder: &ExpressionBinder,
        windows: &[(String, ast::WindowDefinition)],
    ) -> Result<HashMap<String, WindowSpec>> {
        let mut bound = HashMap::with_capacity(windows.len());
        for (name, def) in windows {
            let name = ctx.config.normalize_ident(name);
            if bound.contains_key(&name) {
                return Err(PlanError::Syntax(format!(
                    "window \"{name}\" is already defined"
                )));
            }
            let spec = binder.bind_window_definition(ctx, def)?;
            bound.insert(name, spec);
        }
        Ok(bound)
    }

    /// Extract window functions from the projections, planning one window
    /// node per distinct window spec.
    ///
    /// Nodes are stacked in the order their spec first appears, with the
    /// first one closest to the input.
    pub fn plan(
        &self,
        ctx: &mut PlanContext,
        projections: &mut [Expression],
        mut plan: LogicalOperator,
    ) -> Result<LogicalOperator> {
        let mut windows: Vec<LogicalWindow> = Vec::new();
        for expr in projections.iter_mut() {
            extract_windows(ctx, expr, &mut windows)?;
        }

        for window in windows {
            plan = LogicalOperator::Window(Node::new(window, vec![plan]));
        }

        Ok(plan)
    }
}

fn extract_windows(
    ctx: &mut PlanContext,
    expr: &mut Expression,
    windows: &mut Vec<LogicalWindow>,
) -> Result<()> {
    let Expression::Window(window_expr) = &*expr else {
        return expr.for_each_child_mut(&mut |child| extract_windows(ctx, child, windows));
    };
    let spec = window_expr.spec.clone();

    let existing = windows
        .iter()
        .flat_map(|window| window.functions.iter())
        .find(|binding| binding.expr == *expr)
        .map(|binding| binding.reference());

    let reference = match existing {
        Some(reference) => reference,
        None => {
            let binding = RefBinding {
                id: ctx.next_ref_id(),
                expr: expr.clone(),
            };
            let reference = binding.reference();
            match windows.iter_mut().find(|window| window.spec == spec) {
                Some(window) => window.functions.push(binding),
                None => windows.push(LogicalWindow {
                    spec,
                    functions: vec![binding],
                }),
            }
            reference
        }
    };

    *expr = Expression::Reference(reference);
    Ok(())
}
