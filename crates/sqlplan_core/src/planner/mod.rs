//! Planning of parsed statements into logical plans.
//!
//! Each clause has its own planner (e.g. [`plan_select::SelectPlanner`])
//! operating on a shared [`PlanContext`].

pub mod plan_aggregate;
pub mod plan_cte;
pub mod plan_from;
pub mod plan_insert;
pub mod plan_mutate;
pub mod plan_select;
pub mod plan_setop;
pub mod plan_subquery;
pub mod plan_window;

use hashbrown::HashMap;
use sqlplan_error::Result;
use tracing::debug;

use crate::ast;
use crate::binder::bind_context::BindContext;
use crate::catalog::Catalog;
use crate::config::PlannerConfig;
use crate::expr::column_expr::ColumnExpr;
use crate::expr::ref_expr::RefId;
use crate::logical::logical_return::LogicalReturn;
use crate::logical::operator::{LogicalNode, LogicalOperator, Node};
use crate::logical::statement::{CompiledStatement, CtePlan};
use crate::logical::subplan::{Subplan, SubplanId};
use crate::optimizer::Optimizer;
use crate::types::Relation;

/// A CTE visible to table references.
#[derive(Debug, Clone)]
pub struct CteBinding {
    /// Output relation qualified by the CTE name.
    pub relation: Relation,
    /// Set while the recursive part of the CTE is being planned.
    pub recursive: bool,
}

/// State shared while planning a single statement.
pub struct PlanContext<'a> {
    pub catalog: &'a dyn Catalog,
    pub config: &'a PlannerConfig,
    pub bind_context: BindContext,
    /// Subplans indexed by id, in the order they finished planning.
    pub subplans: Vec<Subplan>,
    /// Planned CTEs in definition order.
    pub ctes: Vec<CtePlan>,
    /// CTEs visible to table references, keyed by name.
    pub cte_bindings: HashMap<String, CteBinding>,
    next_ref: u32,
}

impl std::fmt::Debug for PlanContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlanContext")
            .field("config", &self.config)
            .field("bind_context", &self.bind_context)
            .field("subplans", &self.subplans.len())
            .field("ctes", &self.ctes.len())
            .finish_non_exhaustive()
    }
}

impl<'a> PlanContext<'a> {
    pub fn new(catalog: &'a dyn Catalog, config: &'a PlannerConfig) -> Self {
        PlanContext {
            catalog,
            config,
            bind_context: BindContext::new(),
            subplans: Vec::new(),
            ctes: Vec::new(),
            cte_bindings: HashMap::new(),
            next_ref: 0,
        }
    }

    /// Hand out the next reference id.
    ///
    /// Ids are unique for the whole statement.
    pub fn next_ref_id(&mut self) -> RefId {
        let id = RefId(self.next_ref);
        self.next_ref += 1;
        id
    }

    /// Store a finished subplan, returning its id.
    pub fn push_subplan(
        &mut self,
        plan: LogicalOperator,
        correlated: Vec<ColumnExpr>,
    ) -> SubplanId {
        let id = SubplanId(self.subplans.len());
        debug!(%id, correlated = correlated.len(), "planned subquery");
        self.subplans.push(Subplan {
            id,
            plan,
            correlated,
        });
        id
    }

    fn finish(self, root: LogicalOperator) -> CompiledStatement {
        CompiledStatement {
            root,
            ctes: self.ctes,
            subplans: self.subplans,
        }
    }
}

/// Plan a statement without optimizing it.
pub fn plan(
    stmt: &ast::SqlStatement,
    catalog: &dyn Catalog,
    config: &PlannerConfig,
) -> Result<CompiledStatement> {
    let span = tracing::debug_span!("plan_statement");
    let _guard = span.enter();

    let mut ctx = PlanContext::new(catalog, config);

    if let Some(with) = &stmt.with {
        plan_cte::CtePlanner.plan(&mut ctx, with)?;
    }

    let root_scope = ctx.bind_context.root_scope_ref();
    let root = match &stmt.statement {
        ast::Statement::Select(select) => {
            let (plan, relation) = plan_select::SelectPlanner.plan(&mut ctx, root_scope, select)?;
            LogicalOperator::Return(Node::new(
                LogicalReturn::from_relation(&relation),
                vec![plan],
            ))
        }
        ast::Statement::Insert(insert) => {
            plan_insert::InsertPlanner.plan(&mut ctx, root_scope, insert)?
        }
        ast::Statement::Update(update) => {
            plan_mutate::MutatePlanner.plan_update(&mut ctx, root_scope, update)?
        }
        ast::Statement::Delete(delete) => {
            plan_mutate::MutatePlanner.plan_delete(&mut ctx, root_scope, delete)?
        }
    };

    debug!(
        root = root.name(),
        subplans = ctx.subplans.len(),
        ctes = ctx.ctes.len(),
        "planned statement"
    );

    Ok(ctx.finish(root))
}

/// Plan a statement, then run the optimizer if enabled in `config`.
pub fn plan_and_optimize(
    stmt: &ast::SqlStatement,
    catalog: &dyn Catalog,
    config: &PlannerConfig,
) -> Result<CompiledStatement> {
    let planned = plan(stmt, catalog, config)?;
    if !config.enable_optimizer {
        return Ok(planned);
    }
    Optimizer::new().optimize(planned)
}
