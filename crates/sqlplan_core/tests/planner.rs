//! Plan dumps for complete statements.

mod common;

use common::{UUID_A, UUID_B, assert_plan, assert_plan_err, catalog, plan_with_config, uuid};
use rstest::rstest;
use sqlplan_core::ast::builder::*;
use sqlplan_core::ast::{Expr, SelectStatement, SqlStatement};
use sqlplan_core::catalog::{Column, Table};
use sqlplan_core::config::PlannerConfig;
use sqlplan_core::logical::statement::CompiledStatement;
use sqlplan_core::types::DataType;
use sqlplan_error::ErrorKind;

fn users_core() -> SelectCore {
    SelectCore::new()
        .column(col("id"))
        .column(col("name"))
        .from(table("users"))
}

fn sum(expr: Expr) -> Expr {
    func("sum", vec![expr])
}

/// `WITH RECURSIVE r AS (<body>) SELECT * FROM r`
fn select_from_recursive(body: SelectStatement) -> SqlStatement {
    select(SelectCore::new().wildcard().from(table("r"))).with_ctes(with(true, vec![cte("r", &[], body)]))
}

fn counter_base() -> SelectCore {
    SelectCore::new().column_as(int(1), "n")
}

#[test]
fn basic_select() {
    assert_plan(
        &catalog(),
        select(SelectCore::new().column(int(1))),
        concat!(
            "Return: ?column? [int8]\n",
            "└─Project: 1\n",
            "  └─Empty Scan\n",
        ),
    );
}

#[test]
fn array_and_object() {
    let catalog = catalog()
        .with_variable("$c", DataType::array(DataType::Int8))
        .with_object("$a", [("b", DataType::Int8)]);

    assert_plan(
        &catalog,
        select(
            SelectCore::new()
                .column(var("a").field("b"))
                .column_as(var("c"), "c1"),
        ),
        concat!(
            "Return: ?column? [int8], c1 [int8[]]\n",
            "└─Project: $a.b; $c AS c1\n",
            "  └─Empty Scan\n",
        ),
    );
}

#[test]
fn select_array() {
    assert_plan(
        &catalog(),
        select(SelectCore::new().column(array(vec![int(1), int(2), int(3)]))),
        concat!(
            "Return: ?column? [int8[]]\n",
            "└─Project: [1, 2, 3]\n",
            "  └─Empty Scan\n",
        ),
    );
}

#[test]
fn select_with_filter() {
    assert_plan(
        &catalog(),
        select(users_core().filter(col("age").gt(int(18)))),
        concat!(
            "Return: id [uuid], name [text]\n",
            "└─Project: users.id; users.name\n",
            "  └─Filter: users.age > 18\n",
            "    └─Scan Table: users [physical]\n",
        ),
    );
}

#[test]
fn subquery_join() {
    let owners = SelectCore::new().column(col("owner_id")).from(table("posts"));
    assert_plan(
        &catalog(),
        select(
            SelectCore::new()
                .column(col("name"))
                .from(table_as("users", "u"))
                .join(
                    JoinKind::Inner,
                    subquery_as(owners, "p"),
                    qcol("u", "id").equals(qcol("p", "owner_id")),
                ),
        ),
        concat!(
            "Return: name [text]\n",
            "└─Project: u.name\n",
            "  └─Join [inner]: u.id = p.owner_id\n",
            "    ├─Scan Table [alias=\"u\"]: users [physical]\n",
            "    └─Scan Subquery [alias=\"p\"]: [subplan_id=0] (uncorrelated)\n",
            "Subplan [subquery] [id=0]\n",
            "└─Project: posts.owner_id\n",
            "  └─Scan Table: posts [physical]\n",
        ),
    );
}

#[test]
fn correlated_joined_subquery() {
    let ages = SelectCore::new()
        .column(col("age"))
        .from(table("users"))
        .filter(col("id").equals(qcol("u", "id")));
    let owners = SelectCore::new()
        .column(col("owner_id"))
        .from(table("posts"))
        .join(
            JoinKind::Inner,
            subquery_as(ages, "u2"),
            qcol("u2", "age").equals(func("length", vec![qcol("posts", "content")])),
        );

    assert_plan(
        &catalog(),
        select(
            SelectCore::new()
                .column(col("name"))
                .from(table_as("users", "u"))
                .filter(col("id").equals(subquery(owners))),
        ),
        concat!(
            "Return: name [text]\n",
            "└─Project: u.name\n",
            "  └─Filter: u.id = [subquery (scalar) (subplan_id=1) (correlated: u.id)]\n",
            "    └─Scan Table [alias=\"u\"]: users [physical]\n",
            "Subplan [subquery] [id=1]\n",
            "└─Project: posts.owner_id\n",
            "  └─Join [inner]: u2.age = length(posts.content)\n",
            "    ├─Scan Table: posts [physical]\n",
            "    └─Scan Subquery [alias=\"u2\"]: [subplan_id=0] (correlated: u.id)\n",
            "Subplan [subquery] [id=0]\n",
            "└─Project: users.age\n",
            "  └─Filter: users.id = u.id\n",
            "    └─Scan Table: users [physical]\n",
        ),
    );
}

#[test]
fn scalar_subquery_in_where() {
    let ids = SelectCore::new()
        .column(col("id"))
        .from(table("posts"))
        .filter(col("content").equals(text("hello")));

    assert_plan(
        &catalog(),
        select(
            SelectCore::new()
                .column(col("name"))
                .from(table("users"))
                .filter(col("id").equals(subquery(ids))),
        ),
        concat!(
            "Return: name [text]\n",
            "└─Project: users.name\n",
            "  └─Filter: users.id = [subquery (scalar) (subplan_id=0) (uncorrelated)]\n",
            "    └─Scan Table: users [physical]\n",
            "Subplan [subquery] [id=0]\n",
            "└─Project: posts.id\n",
            "  └─Filter: posts.content = 'hello'\n",
            "    └─Scan Table: posts [physical]\n",
        ),
    );
}

#[test]
fn correlated_exists_in_where() {
    let posts = SelectCore::new()
        .column(int(1))
        .from(table_as("posts", "p"))
        .filter(qcol("p", "owner_id").equals(qcol("u", "id")));

    assert_plan(
        &catalog(),
        select(
            SelectCore::new()
                .column(col("name"))
                .from(table_as("users", "u"))
                .filter(exists(posts)),
        ),
        concat!(
            "Return: name [text]\n",
            "└─Project: u.name\n",
            "  └─Filter: [subquery (exists) (subplan_id=0) (correlated: u.id)]\n",
            "    └─Scan Table [alias=\"u\"]: users [physical]\n",
            "Subplan [subquery] [id=0]\n",
            "└─Project: 1\n",
            "  └─Filter: p.owner_id = u.id\n",
            "    └─Scan Table [alias=\"p\"]: posts [physical]\n",
        ),
    );
}

#[test]
fn subquery_in_result() {
    let post_ids = SelectCore::new()
        .column(col("id"))
        .from(table("posts"))
        .filter(col("owner_id").equals(qcol("users", "id")));
    let first = SelectStatement::from(SelectCore::new().wildcard().from(subquery_as(post_ids, "p")))
        .limit(int(1));

    assert_plan(
        &catalog(),
        select(SelectCore::new().column(subquery(first)).from(table("users"))),
        concat!(
            "Return: id [uuid]\n",
            "└─Project: [subquery (scalar) (subplan_id=1) (correlated: users.id)]\n",
            "  └─Scan Table: users [physical]\n",
            "Subplan [subquery] [id=1]\n",
            "└─Project: p.id\n",
            "  └─Limit: 1\n",
            "    └─Scan Subquery [alias=\"p\"]: [subplan_id=0] (correlated: users.id)\n",
            "Subplan [subquery] [id=0]\n",
            "└─Project: posts.id\n",
            "  └─Filter: posts.owner_id = users.id\n",
            "    └─Scan Table: posts [physical]\n",
        ),
    );
}

#[test]
fn subquery_exists() {
    let posts = SelectCore::new()
        .column(int(1))
        .from(table("posts"))
        .filter(col("owner_id").equals(qcol("users", "id")));

    assert_plan(
        &catalog(),
        select(
            SelectCore::new()
                .column(col("name"))
                .from(table("users"))
                .filter(exists(posts)),
        ),
        concat!(
            "Return: name [text]\n",
            "└─Project: users.name\n",
            "  └─Filter: [subquery (exists) (subplan_id=0) (correlated: users.id)]\n",
            "    └─Scan Table: users [physical]\n",
            "Subplan [subquery] [id=0]\n",
            "└─Project: 1\n",
            "  └─Filter: posts.owner_id = users.id\n",
            "    └─Scan Table: posts [physical]\n",
        ),
    );
}

#[test]
fn double_nested_correlated_subquery() {
    let inner = SelectCore::new()
        .column(int(1))
        .from(table_as("posts", "p2"))
        .filter(qcol("p2", "owner_id").equals(qcol("u", "id")));
    let middle = SelectCore::new()
        .column(int(1))
        .from(table_as("posts", "p"))
        .filter(exists(inner));

    assert_plan(
        &catalog(),
        select(
            SelectCore::new()
                .column(col("name"))
                .from(table_as("users", "u"))
                .filter(exists(middle)),
        ),
        concat!(
            "Return: name [text]\n",
            "└─Project: u.name\n",
            "  └─Filter: [subquery (exists) (subplan_id=1) (correlated: u.id)]\n",
            "    └─Scan Table [alias=\"u\"]: users [physical]\n",
            "Subplan [subquery] [id=1]\n",
            "└─Project: 1\n",
            "  └─Filter: [subquery (exists) (subplan_id=0) (correlated: u.id)]\n",
            "    └─Scan Table [alias=\"p\"]: posts [physical]\n",
            "Subplan [subquery] [id=0]\n",
            "└─Project: 1\n",
            "  └─Filter: p2.owner_id = u.id\n",
            "    └─Scan Table [alias=\"p2\"]: posts [physical]\n",
        ),
    );
}

#[test]
fn aggregate_without_group_by() {
    assert_plan(
        &catalog(),
        select(SelectCore::new().column(sum(col("age"))).from(table("users"))),
        concat!(
            "Return: sum [decimal(1000,0)]\n",
            "└─Project: {#ref(A)}\n",
            "  └─Aggregate: {#ref(A) = sum(users.age)}\n",
            "    └─Scan Table: users [physical]\n",
        ),
    );
}

#[test]
fn aggregate_with_group_by() {
    assert_plan(
        &catalog(),
        select(
            SelectCore::new()
                .column(col("name"))
                .column(sum(col("age")))
                .from(table("users"))
                .filter(col("name").equals(text("a")))
                .group_by(vec![col("name")])
                .having(sum(col("age")).cast_to("int8").gt(int(100))),
        ),
        concat!(
            "Return: name [text], sum [decimal(1000,0)]\n",
            "└─Project: {#ref(A)}; {#ref(B)}\n",
            "  └─Filter: {#ref(B)}::int8 > 100\n",
            "    └─Aggregate [{#ref(A) = users.name}]: {#ref(B) = sum(users.age)}\n",
            "      └─Filter: users.name = 'a'\n",
            "        └─Scan Table: users [physical]\n",
        ),
    );
}

#[test]
fn complex_group_by_and_aggregate() {
    let bucket = || qcol("p", "created_at").divided_by(int(100));
    assert_plan(
        &catalog(),
        select(
            SelectCore::new()
                .column_as(
                    sum(qcol("u", "age")).cast_to("int").divided_by(bucket()),
                    "res",
                )
                .from(table_as("users", "u"))
                .join(
                    JoinKind::Inner,
                    table_as("posts", "p"),
                    qcol("u", "id").equals(qcol("p", "owner_id")),
                )
                .group_by(vec![bucket()])
                .having(bucket().gt(int(10))),
        ),
        concat!(
            "Return: res [int8]\n",
            "└─Project: {#ref(B)}::int8 / {#ref(A)} AS res\n",
            "  └─Filter: {#ref(A)} > 10\n",
            "    └─Aggregate [{#ref(A) = p.created_at / 100}]: {#ref(B) = sum(u.age)}\n",
            "      └─Join [inner]: u.id = p.owner_id\n",
            "        ├─Scan Table [alias=\"u\"]: users [physical]\n",
            "        └─Scan Table [alias=\"p\"]: posts [physical]\n",
        ),
    );
}

#[test]
fn complex_group_by() {
    assert_plan(
        &catalog(),
        select(
            SelectCore::new()
                .column(col("age").divided_by(int(2)))
                .column(col("age").times(int(3)))
                .from(table("users"))
                .group_by(vec![
                    col("age").divided_by(int(2)),
                    col("age").times(int(3)),
                ]),
        ),
        concat!(
            "Return: ?column? [int8], ?column? [int8]\n",
            "└─Project: {#ref(A)}; {#ref(B)}\n",
            "  └─Aggregate [{#ref(A) = users.age / 2}] [{#ref(B) = users.age * 3}]\n",
            "    └─Scan Table: users [physical]\n",
        ),
    );
}

#[test]
fn select_star_with_group_by() {
    assert_plan(
        &catalog(),
        select(
            SelectCore::new()
                .wildcard()
                .from(table("users"))
                .group_by(vec![col("name"), col("age"), col("id")]),
        ),
        concat!(
            "Return: id [uuid], name [text], age [int8]\n",
            "└─Project: {#ref(C)}; {#ref(A)}; {#ref(B)}\n",
            "  └─Aggregate [{#ref(A) = users.name}] [{#ref(B) = users.age}] [{#ref(C) = users.id}]\n",
            "    └─Scan Table: users [physical]\n",
        ),
    );
}

#[test]
fn complex_having() {
    let half = || col("age").divided_by(int(2));
    assert_plan(
        &catalog(),
        select(
            SelectCore::new()
                .column(col("name"))
                .column(sum(half()).plus(sum(col("age").times(int(10)))))
                .from(table("users"))
                .group_by(vec![col("name")])
                .having(
                    sum(col("age"))
                        .cast_to("int8")
                        .gt(int(100))
                        .or(sum(half()).cast_to("int8").gt(int(10))),
                ),
        ),
        concat!(
            "Return: name [text], ?column? [decimal(1000,0)]\n",
            "└─Project: {#ref(A)}; {#ref(C)} + {#ref(D)}\n",
            "  └─Filter: {#ref(B)}::int8 > 100 OR {#ref(C)}::int8 > 10\n",
            "    └─Aggregate [{#ref(A) = users.name}]: {#ref(B) = sum(users.age)}; {#ref(C) = sum(users.age / 2)}; {#ref(D) = sum(users.age * 10)}\n",
            "      └─Scan Table: users [physical]\n",
        ),
    );
}

#[test]
fn duplicate_group_by_columns() {
    assert_plan(
        &catalog(),
        select(
            SelectCore::new()
                .column(col("name"))
                .column(col("age"))
                .from(table("users"))
                .group_by(vec![col("name"), col("name"), col("age")]),
        ),
        concat!(
            "Return: name [text], age [int8]\n",
            "└─Project: {#ref(A)}; {#ref(B)}\n",
            "  └─Aggregate [{#ref(A) = users.name}] [{#ref(B) = users.age}]\n",
            "    └─Scan Table: users [physical]\n",
        ),
    );
}

#[test]
fn group_by_qualified_column() {
    assert_plan(
        &catalog(),
        select(
            SelectCore::new()
                .column(col("name"))
                .from(table("users"))
                .group_by(vec![qcol("users", "name")]),
        ),
        concat!(
            "Return: name [text]\n",
            "└─Project: {#ref(A)}\n",
            "  └─Aggregate [{#ref(A) = users.name}]\n",
            "    └─Scan Table: users [physical]\n",
        ),
    );
}

#[test]
fn every_type_of_join() {
    let catalog = catalog()
        .with_variable("$id", DataType::Int8)
        .with_variable("$name", DataType::Text);
    let adults = SelectCore::new()
        .column(col("id"))
        .from(table("users"))
        .filter(col("age").gt(int(18)));

    assert_plan(
        &catalog,
        select(
            SelectCore::new()
                .column(qcol("u", "name"))
                .column(qcol("u2", "id"))
                .column(func("count", vec![qcol("p", "id")]))
                .from(table_as("users", "u"))
                .join(
                    JoinKind::Inner,
                    table_as("posts", "p"),
                    qcol("u", "id").equals(qcol("p", "owner_id")),
                )
                .join(
                    JoinKind::Full,
                    subquery_as(adults, "u2"),
                    qcol("u2", "id").equals(qcol("u", "id")),
                )
                .group_by(vec![qcol("u", "name"), qcol("u2", "id")]),
        ),
        concat!(
            "Return: name [text], id [uuid], count [int8]\n",
            "└─Project: {#ref(A)}; {#ref(B)}; {#ref(C)}\n",
            "  └─Aggregate [{#ref(A) = u.name}] [{#ref(B) = u2.id}]: {#ref(C) = count(p.id)}\n",
            "    └─Join [outer]: u2.id = u.id\n",
            "      ├─Join [inner]: u.id = p.owner_id\n",
            "      │ ├─Scan Table [alias=\"u\"]: users [physical]\n",
            "      │ └─Scan Table [alias=\"p\"]: posts [physical]\n",
            "      └─Scan Subquery [alias=\"u2\"]: [subplan_id=0] (uncorrelated)\n",
            "Subplan [subquery] [id=0]\n",
            "└─Project: users.id\n",
            "  └─Filter: users.age > 18\n",
            "    └─Scan Table: users [physical]\n",
        ),
    );
}

#[test]
fn basic_inline_window() {
    assert_plan(
        &catalog(),
        select(
            SelectCore::new()
                .column(col("name"))
                .column(sum(col("age")).over(window().partition_by(col("name"))))
                .from(table("users")),
        ),
        concat!(
            "Return: name [text], sum [decimal(1000,0)]\n",
            "└─Project: users.name; {#ref(A)}\n",
            "  └─Window [partition_by=users.name]: {#ref(A) = sum(users.age)}\n",
            "    └─Scan Table: users [physical]\n",
        ),
    );
}

#[test]
fn named_window_used_several_times() {
    assert_plan(
        &catalog(),
        select(
            SelectCore::new()
                .column(col("name"))
                .column(sum(col("age")).over_named("w1"))
                .column(func("array_agg", vec![col("name")]).over_named("w1"))
                .from(table("users"))
                .window(
                    "w1",
                    window().partition_by(col("name")).order_by(asc(col("age"))),
                ),
        ),
        concat!(
            "Return: name [text], sum [decimal(1000,0)], array_agg [text[]]\n",
            "└─Project: users.name; {#ref(A)}; {#ref(B)}\n",
            "  └─Window [partition_by=users.name] [order_by=users.age asc nulls last]: {#ref(A) = sum(users.age)}; {#ref(B) = array_agg(users.name)}\n",
            "    └─Scan Table: users [physical]\n",
        ),
    );
}

#[test]
fn common_table_expressions() {
    let stmt = select(SelectCore::new().wildcard().from(table("b"))).with_ctes(with(
        false,
        vec![
            cte(
                "a",
                &["id2", "name2"],
                SelectCore::new()
                    .column(col("id"))
                    .column(col("name"))
                    .from(table("users")),
            ),
            cte("b", &[], SelectCore::new().wildcard().from(table("a"))),
        ],
    ));

    assert_plan(
        &catalog(),
        stmt,
        concat!(
            "Return: id2 [uuid], name2 [text]\n",
            "└─Project: b.id2; b.name2\n",
            "  └─Scan Table: b [cte]\n",
            "Subplan [cte] [id=b] [a.id2 -> id2] [a.name2 -> name2]\n",
            "└─Project: a.id2; a.name2\n",
            "  └─Scan Table: a [cte]\n",
            "Subplan [cte] [id=a] [users.id -> id2] [users.name -> name2]\n",
            "└─Project: users.id; users.name\n",
            "  └─Scan Table: users [physical]\n",
        ),
    );
}

#[test]
fn recursive_cte() {
    let body = SelectStatement::from(SelectCore::new().column_as(int(1), "n")).compound(
        CompoundOperator::UnionAll,
        SelectCore::new()
            .column(col("n").plus(int(1)))
            .from(table("r"))
            .filter(col("n").lt(int(10))),
    );
    let stmt = select(SelectCore::new().wildcard().from(table("r")))
        .with_ctes(with(true, vec![cte("r", &[], body)]));

    assert_plan(
        &catalog(),
        stmt,
        concat!(
            "Return: n [int8]\n",
            "└─Project: r.n\n",
            "  └─Scan Table: r [cte]\n",
            "Subplan [recursive cte] [id=r] [r.n -> n]\n",
            "└─Set: union all\n",
            "  ├─Project: 1 AS n\n",
            "  │ └─Empty Scan\n",
            "  └─Project: r.n + 1\n",
            "    └─Filter: r.n < 10\n",
            "      └─Scan Table: r [cte]\n",
        ),
    );
}

#[test]
fn set_operations() {
    let stmt = SelectStatement::from(users_core())
        .compound(CompoundOperator::Union, users_core())
        .compound(CompoundOperator::UnionAll, users_core())
        .compound(CompoundOperator::Intersect, users_core())
        .compound(CompoundOperator::Except, users_core());

    assert_plan(
        &catalog(),
        stmt,
        concat!(
            "Return: id [uuid], name [text]\n",
            "└─Set: except\n",
            "  ├─Set: intersect\n",
            "  │ ├─Set: union all\n",
            "  │ │ ├─Set: union\n",
            "  │ │ │ ├─Project: users.id; users.name\n",
            "  │ │ │ │ └─Scan Table: users [physical]\n",
            "  │ │ │ └─Project: users.id; users.name\n",
            "  │ │ │   └─Scan Table: users [physical]\n",
            "  │ │ └─Project: users.id; users.name\n",
            "  │ │   └─Scan Table: users [physical]\n",
            "  │ └─Project: users.id; users.name\n",
            "  │   └─Scan Table: users [physical]\n",
            "  └─Project: users.id; users.name\n",
            "    └─Scan Table: users [physical]\n",
        ),
    );
}

#[test]
fn set_operation_with_order_by() {
    let posts = SelectCore::new()
        .column(col("id"))
        .column(col("content"))
        .from(table("posts"));
    let stmt = SelectStatement::from(users_core())
        .compound(CompoundOperator::Union, posts)
        .order_by(desc(col("name")));

    assert_plan(
        &catalog(),
        stmt,
        concat!(
            "Return: id [uuid], name [text]\n",
            "└─Sort: name desc nulls last\n",
            "  └─Set: union\n",
            "    ├─Project: users.id; users.name\n",
            "    │ └─Scan Table: users [physical]\n",
            "    └─Project: posts.id; posts.content\n",
            "      └─Scan Table: posts [physical]\n",
        ),
    );
}

#[test]
fn sort() {
    let stmt = SelectStatement::from(
        SelectCore::new()
            .column(col("name"))
            .column(col("age"))
            .from(table("users")),
    )
    .order_by(desc(col("name")).nulls_last())
    .order_by(asc(col("id")));

    assert_plan(
        &catalog(),
        stmt,
        concat!(
            "Return: name [text], age [int8]\n",
            "└─Project: users.name; users.age\n",
            "  └─Sort: users.name desc nulls last; users.id asc nulls last\n",
            "    └─Scan Table: users [physical]\n",
        ),
    );
}

#[test]
fn sort_with_group_by() {
    let stmt = SelectStatement::from(
        SelectCore::new()
            .column(col("name"))
            .column(sum(col("age")))
            .from(table("users"))
            .group_by(vec![col("name")]),
    )
    .order_by(asc(col("name")))
    .order_by(asc(sum(col("age"))));

    assert_plan(
        &catalog(),
        stmt,
        concat!(
            "Return: name [text], sum [decimal(1000,0)]\n",
            "└─Project: {#ref(A)}; {#ref(B)}\n",
            "  └─Sort: {#ref(A)} asc nulls last; {#ref(B)} asc nulls last\n",
            "    └─Aggregate [{#ref(A) = users.name}]: {#ref(B) = sum(users.age)}\n",
            "      └─Scan Table: users [physical]\n",
        ),
    );
}

#[test]
fn sort_with_new_aggregate() {
    let stmt = SelectStatement::from(
        SelectCore::new()
            .column(col("name"))
            .from(table("users"))
            .group_by(vec![col("name")]),
    )
    .order_by(asc(sum(col("age"))));

    assert_plan(
        &catalog(),
        stmt,
        concat!(
            "Return: name [text]\n",
            "└─Project: {#ref(A)}\n",
            "  └─Sort: {#ref(B)} asc nulls last\n",
            "    └─Aggregate [{#ref(A) = users.name}]: {#ref(B) = sum(users.age)}\n",
            "      └─Scan Table: users [physical]\n",
        ),
    );
}

#[test]
fn limit_and_offset() {
    let stmt = SelectStatement::from(
        SelectCore::new()
            .column(col("name"))
            .column(col("age"))
            .from(table("users")),
    )
    .limit(int(10))
    .offset(int(5));

    assert_plan(
        &catalog(),
        stmt,
        concat!(
            "Return: name [text], age [int8]\n",
            "└─Project: users.name; users.age\n",
            "  └─Limit [offset=5]: 10\n",
            "    └─Scan Table: users [physical]\n",
        ),
    );
}

#[test]
fn distinct() {
    assert_plan(
        &catalog(),
        select(
            SelectCore::new()
                .distinct()
                .column(col("name"))
                .column(col("age"))
                .from(table("users")),
        ),
        concat!(
            "Return: name [text], age [int8]\n",
            "└─Distinct\n",
            "  └─Project: users.name; users.age\n",
            "    └─Scan Table: users [physical]\n",
        ),
    );
}

#[test]
fn distinct_aggregate() {
    assert_plan(
        &catalog(),
        select(
            SelectCore::new()
                .column(func_distinct("count", vec![col("name")]))
                .column(sum(col("age")))
                .from(table("users")),
        ),
        concat!(
            "Return: count [int8], sum [decimal(1000,0)]\n",
            "└─Project: {#ref(A)}; {#ref(B)}\n",
            "  └─Aggregate: {#ref(A) = count(distinct users.name)}; {#ref(B) = sum(users.age)}\n",
            "    └─Scan Table: users [physical]\n",
        ),
    );
}

#[test]
fn unary_and_alias() {
    assert_plan(
        &catalog(),
        select(
            SelectCore::new()
                .column_as(col("age"), "pos_age")
                .column(col("age").negate())
                .from(table("users")),
        ),
        concat!(
            "Return: pos_age [int8], ?column? [int8]\n",
            "└─Project: users.age AS pos_age; -users.age\n",
            "  └─Scan Table: users [physical]\n",
        ),
    );
}

#[test]
fn order_by_alias() {
    let stmt = SelectStatement::from(
        SelectCore::new()
            .column_as(col("age"), "pos_age")
            .from(table("users")),
    )
    .order_by(asc(col("pos_age")));

    assert_plan(
        &catalog(),
        stmt,
        concat!(
            "Return: pos_age [int8]\n",
            "└─Project: users.age AS pos_age\n",
            "  └─Sort: pos_age asc nulls last\n",
            "    └─Scan Table: users [physical]\n",
        ),
    );
}

#[test]
fn collate() {
    assert_plan(
        &catalog(),
        select(
            SelectCore::new()
                .column(col("name").collate("nocase"))
                .from(table("users"))
                .filter(col("name").equals(text("SATOSHI").collate("nocase"))),
        ),
        concat!(
            "Return: name [text]\n",
            "└─Project: users.name COLLATE nocase\n",
            "  └─Filter: users.name = 'SATOSHI' COLLATE nocase\n",
            "    └─Scan Table: users [physical]\n",
        ),
    );
}

#[test]
fn not_in_list() {
    assert_plan(
        &catalog(),
        select(
            SelectCore::new()
                .column(col("name"))
                .from(table("users"))
                .filter(
                    col("name")
                        .not_in_list(vec![text("satoshi"), text("wendys_drive_through_lady")]),
                ),
        ),
        concat!(
            "Return: name [text]\n",
            "└─Project: users.name\n",
            "  └─Filter: NOT users.name IN ('satoshi', 'wendys_drive_through_lady')\n",
            "    └─Scan Table: users [physical]\n",
        ),
    );
}

#[test]
fn like_and_ilike() {
    let not_ilike = Expr::Like {
        expr: Box::new(col("name")),
        pattern: Box::new(text("w_Nd%")),
        not: true,
        case_insensitive: true,
    };
    assert_plan(
        &catalog(),
        select(
            SelectCore::new()
                .column(col("name"))
                .from(table("users"))
                .filter(col("name").like(text("s%")).or(not_ilike)),
        ),
        concat!(
            "Return: name [text]\n",
            "└─Project: users.name\n",
            "  └─Filter: users.name LIKE 's%' OR NOT users.name ILIKE 'w_Nd%'\n",
            "    └─Scan Table: users [physical]\n",
        ),
    );
}

#[test]
fn case_with_operand() {
    assert_plan(
        &catalog(),
        select(
            SelectCore::new()
                .column(col("name"))
                .from(table("users"))
                .filter(case(
                    Some(col("age")),
                    vec![(int(20), lit(true))],
                    Some(lit(false)),
                )),
        ),
        concat!(
            "Return: name [text]\n",
            "└─Project: users.name\n",
            "  └─Filter: CASE [users.age] WHEN [20] THEN [true] ELSE [false] END\n",
            "    └─Scan Table: users [physical]\n",
        ),
    );
}

#[test]
fn case_without_operand() {
    assert_plan(
        &catalog(),
        select(
            SelectCore::new()
                .column(col("name"))
                .from(table("users"))
                .filter(case(
                    None,
                    vec![(col("age").equals(int(20)), lit(true))],
                    Some(lit(false)),
                )),
        ),
        concat!(
            "Return: name [text]\n",
            "└─Project: users.name\n",
            "  └─Filter: CASE WHEN [users.age = 20] THEN [true] ELSE [false] END\n",
            "    └─Scan Table: users [physical]\n",
        ),
    );
}

#[test]
fn basic_update() {
    assert_plan(
        &catalog(),
        update("users", vec![assign("name", text("satoshi"))]).filter(col("age").equals(int(1))),
        concat!(
            "Update [users]: name = 'satoshi'\n",
            "└─Filter: users.age = 1\n",
            "  └─Scan Table: users [physical]\n",
        ),
    );
}

#[test]
fn update_from_with_join() {
    let satoshi_posts = SelectCore::new()
        .column(qcol("p", "content"))
        .from(table_as("posts", "p"))
        .join(
            JoinKind::Inner,
            table_as("users", "u"),
            qcol("p", "owner_id").equals(qcol("u", "id")),
        )
        .filter(qcol("u", "name").equals(text("satoshi")));

    let stmt = update("users", vec![assign("name", qcol("pu", "content"))])
        .from(table_as("posts", "p"))
        .join(
            JoinKind::Inner,
            subquery_as(satoshi_posts, "pu"),
            qcol("p", "content").equals(qcol("pu", "content")),
        )
        .filter(qcol("p", "owner_id").equals(qcol("users", "id")));

    // Unoptimized, so the FROM list stays a cartesian product.
    assert_plan(
        &catalog(),
        stmt,
        concat!(
            "Update [users]: name = pu.content\n",
            "└─Filter: p.owner_id = users.id\n",
            "  └─Cartesian Product\n",
            "    ├─Scan Table: users [physical]\n",
            "    └─Join [inner]: p.content = pu.content\n",
            "      ├─Scan Table [alias=\"p\"]: posts [physical]\n",
            "      └─Scan Subquery [alias=\"pu\"]: [subplan_id=0] (uncorrelated)\n",
            "Subplan [subquery] [id=0]\n",
            "└─Project: p.content\n",
            "  └─Filter: u.name = 'satoshi'\n",
            "    └─Join [inner]: p.owner_id = u.id\n",
            "      ├─Scan Table [alias=\"p\"]: posts [physical]\n",
            "      └─Scan Table [alias=\"u\"]: users [physical]\n",
        ),
    );
}

#[test]
fn basic_delete() {
    assert_plan(
        &catalog(),
        delete("users").filter(col("age").equals(int(1))),
        concat!(
            "Delete [users]\n",
            "└─Filter: users.age = 1\n",
            "  └─Scan Table: users [physical]\n",
        ),
    );
}

#[test]
fn insert_values() {
    assert_plan(
        &catalog(),
        insert(
            "users",
            &[],
            vec![
                vec![uuid(UUID_A), text("satoshi"), int(1)],
                vec![uuid(UUID_B), text("satoshi2"), int(2)],
            ],
        ),
        concat!(
            "Insert [users]: id [uuid], name [text], age [int8]\n",
            "└─Values: ('123e4567-e89b-12d3-a456-426614174000'::uuid, 'satoshi', 1); ('123e4567-e89b-12d3-a456-426614174001'::uuid, 'satoshi2', 2)\n",
        ),
    );
}

#[test]
fn insert_fills_omitted_with_null() {
    assert_plan(
        &catalog(),
        insert(
            "users",
            &["id", "name"],
            vec![vec![uuid(UUID_A), text("satoshi")]],
        ),
        concat!(
            "Insert [users]: id [uuid], name [text], age [int8]\n",
            "└─Values: ('123e4567-e89b-12d3-a456-426614174000'::uuid, 'satoshi', NULL)\n",
        ),
    );
}

#[test]
fn on_conflict_do_nothing() {
    assert_plan(
        &catalog(),
        insert("users", &[], vec![vec![uuid(UUID_A), text("satoshi"), int(1)]])
            .on_conflict_do_nothing(&[]),
        concat!(
            "Insert [users]: id [uuid], name [text], age [int8]\n",
            "├─Values: ('123e4567-e89b-12d3-a456-426614174000'::uuid, 'satoshi', 1)\n",
            "└─Conflict [nothing]\n",
        ),
    );
}

#[test]
fn on_conflict_primary_key() {
    assert_plan(
        &catalog(),
        insert("users", &[], vec![vec![uuid(UUID_A), text("satoshi"), int(1)]])
            .on_conflict_do_update(&["id"], vec![assign("name", text("satoshi"))], None),
        concat!(
            "Insert [users]: id [uuid], name [text], age [int8]\n",
            "├─Values: ('123e4567-e89b-12d3-a456-426614174000'::uuid, 'satoshi', 1)\n",
            "└─Conflict [update] [arbiter=users.id (primary key)]: [name = 'satoshi']\n",
        ),
    );
}

#[test]
fn on_conflict_unique_constraint() {
    assert_plan(
        &catalog(),
        insert(
            "posts",
            &[],
            vec![vec![uuid(UUID_A), uuid(UUID_B), text("hello"), int(1)]],
        )
        .on_conflict_do_update(&["content"], vec![assign("owner_id", uuid(UUID_B))], None),
        concat!(
            "Insert [posts]: id [uuid], owner_id [uuid], content [text], created_at [int8]\n",
            "├─Values: ('123e4567-e89b-12d3-a456-426614174000'::uuid, '123e4567-e89b-12d3-a456-426614174001'::uuid, 'hello', 1)\n",
            "└─Conflict [update] [arbiter=posts.content (unique)]: [owner_id = '123e4567-e89b-12d3-a456-426614174001'::uuid]\n",
        ),
    );
}

#[test]
fn on_conflict_unique_index_with_where() {
    assert_plan(
        &catalog(),
        insert("users", &[], vec![vec![uuid(UUID_A), text("satoshi"), int(1)]])
            .on_conflict_do_update(
                &["name"],
                vec![assign("name", text("satoshi"))],
                Some(qcol("users", "age").equals(int(1))),
            ),
        concat!(
            "Insert [users]: id [uuid], name [text], age [int8]\n",
            "├─Values: ('123e4567-e89b-12d3-a456-426614174000'::uuid, 'satoshi', 1)\n",
            "└─Conflict [update] [arbiter=name_idx (index)]: [name = 'satoshi'] where [users.age = 1]\n",
        ),
    );
}

#[test]
fn on_conflict_multi_column_constraint() {
    assert_plan(
        &catalog(),
        insert(
            "posts",
            &[],
            vec![vec![uuid(UUID_A), uuid(UUID_B), text("hello"), int(1)]],
        )
        .on_conflict_do_update(
            &["owner_id", "created_at"],
            vec![assign("content", text("hello"))],
            None,
        ),
        concat!(
            "Insert [posts]: id [uuid], owner_id [uuid], content [text], created_at [int8]\n",
            "├─Values: ('123e4567-e89b-12d3-a456-426614174000'::uuid, '123e4567-e89b-12d3-a456-426614174001'::uuid, 'hello', 1)\n",
            "└─Conflict [update] [arbiter=owner_created_idx (index)]: [content = 'hello']\n",
        ),
    );
}

#[test]
fn on_conflict_excluded() {
    assert_plan(
        &catalog(),
        insert(
            "users",
            &["id", "name"],
            vec![vec![uuid(UUID_A), text("satoshi")]],
        )
        .on_conflict_do_update(
            &["id"],
            vec![assign("name", qcol("excluded", "name"))],
            Some(
                qcol("excluded", "age")
                    .divided_by(int(2))
                    .equals(int(0)),
            ),
        ),
        concat!(
            "Insert [users]: id [uuid], name [text], age [int8]\n",
            "├─Values: ('123e4567-e89b-12d3-a456-426614174000'::uuid, 'satoshi', NULL)\n",
            "└─Conflict [update] [arbiter=users.id (primary key)]: [name = excluded.name] where [excluded.age / 2 = 0]\n",
        ),
    );
}

#[test]
fn insert_with_select() {
    assert_plan(
        &catalog(),
        insert_select("users", &[], SelectCore::new().wildcard().from(table("users"))),
        concat!(
            "Insert [users]: id [uuid], name [text], age [int8]\n",
            "└─Project: users.id; users.name; users.age\n",
            "  └─Scan Table: users [physical]\n",
        ),
    );
}

fn users_row() -> Vec<Vec<Expr>> {
    vec![vec![uuid(UUID_A), text("satoshi"), int(1)]]
}

fn posts_row() -> Vec<Vec<Expr>> {
    vec![vec![uuid(UUID_A), uuid(UUID_B), text("hello"), int(1)]]
}

#[rstest]
#[case::group_by_expression_not_selected(
    select(SelectCore::new().column(col("age")).from(table("users")).group_by(vec![col("age").divided_by(int(2))])),
    ErrorKind::IllegalAggregate,
)]
#[case::aggregate_in_group_by(
    select(SelectCore::new().column(sum(col("age"))).from(table("users")).group_by(vec![sum(col("age"))])),
    ErrorKind::IllegalAggregate,
)]
#[case::aggregate_in_where(
    select(SelectCore::new().column(sum(col("age"))).from(table("users")).filter(sum(col("age")).cast_to("int8").gt(int(100)))),
    ErrorKind::IllegalAggregate,
)]
#[case::select_star_missing_group_columns(
    select(SelectCore::new().wildcard().from(table("users")).group_by(vec![col("name")])),
    ErrorKind::IllegalAggregate,
)]
#[case::set_incompatible_types(
    SelectStatement::from(users_core()).compound(
        CompoundOperator::Union,
        SelectCore::new().column(col("id")).column(col("owner_id")).from(table("posts")),
    ).into(),
    ErrorKind::SetIncompatibleSchemas,
)]
#[case::set_incompatible_lengths(
    SelectStatement::from(users_core()).compound(CompoundOperator::Union, SelectCore::new().column(int(1))).into(),
    ErrorKind::SetIncompatibleSchemas,
)]
#[case::sort_unknown_column(
    SelectStatement::from(SelectCore::new().column(col("name")).from(table("users"))).order_by(asc(col("wallet"))).into(),
    ErrorKind::ColumnNotFound,
)]
#[case::update_without_where(
    update("users", vec![assign("name", qcol("pu", "content"))]).from(table_as("posts", "pu")).into(),
    ErrorKind::UpdateOrDeleteWithoutWhere,
)]
#[case::delete_without_where(delete("users").into(), ErrorKind::UpdateOrDeleteWithoutWhere)]
#[case::insert_null_primary_key(
    insert("users", &["name"], vec![vec![text("satoshi")]]).into(),
    ErrorKind::NotNullableColumn,
)]
#[case::conflict_on_non_unique_column(
    insert("users", &[], users_row()).on_conflict_do_update(&["age"], vec![assign("name", text("satoshi"))], None).into(),
    ErrorKind::IllegalConflictArbiter,
)]
#[case::conflict_on_partial_constraint(
    insert("posts", &[], posts_row()).on_conflict_do_update(&["owner_id"], vec![assign("content", text("hello"))], None).into(),
    ErrorKind::IllegalConflictArbiter,
)]
#[case::conflict_update_without_target(
    insert("users", &[], users_row()).on_conflict_do_update(&[], vec![assign("name", text("satoshi"))], None).into(),
    ErrorKind::IllegalConflictArbiter,
)]
#[case::conflict_where_ambiguous_with_excluded(
    insert("users", &[], users_row()).on_conflict_do_update(&["name"], vec![assign("name", text("satoshi"))], Some(col("age").equals(int(1)))).into(),
    ErrorKind::AmbiguousColumn,
)]
#[case::conflict_arbiter_predicate(
    insert("users", &[], users_row()).on_conflict_do_nothing(&["name"]).arbiter_where(col("age").equals(int(1))).into(),
    ErrorKind::Unsupported,
)]
#[case::insert_wrong_arity(
    insert("users", &[], vec![vec![uuid(UUID_A), text("satoshi")]]).into(),
    ErrorKind::WrongArity,
)]
#[case::insert_type_mismatch(
    insert("users", &[], vec![vec![uuid(UUID_A), int(5), int(1)]]).into(),
    ErrorKind::TypeMismatch,
)]
#[case::insert_select_partial_columns(
    insert_select("users", &["id"], SelectCore::new().column(col("id")).from(table("posts"))).into(),
    ErrorKind::Unsupported,
)]
#[case::unknown_table(select(SelectCore::new().wildcard().from(table("wallets"))), ErrorKind::UnknownTable)]
#[case::table_joined_twice(
    select(SelectCore::new().wildcard().from(table("users")).from(table("users"))),
    ErrorKind::TableAlreadyJoined,
)]
#[case::unknown_variable(select(SelectCore::new().column(var("missing"))), ErrorKind::UnknownVariable)]
#[case::unknown_function(select(SelectCore::new().column(func("frobnicate", vec![int(1)]))), ErrorKind::UnknownFunction)]
#[case::where_not_bool(
    select(SelectCore::new().wildcard().from(table("users")).filter(col("age"))),
    ErrorKind::TypeMismatch,
)]
#[case::window_in_where(
    select(SelectCore::new().wildcard().from(table("users")).filter(sum(col("age")).over(window()).cast_to("int8").gt(int(1)))),
    ErrorKind::IllegalWindowFunction,
)]
#[case::offset_without_limit(
    SelectStatement::from(SelectCore::new().column(col("name")).from(table("users"))).offset(int(1)).into(),
    ErrorKind::Syntax,
)]
#[case::recursive_cte_with_union(
    select_from_recursive(SelectStatement::from(counter_base()).compound(
        CompoundOperator::Union,
        SelectCore::new().column(col("n").plus(int(1))).from(table("r")).filter(col("n").lt(int(10))),
    )),
    ErrorKind::Syntax,
)]
#[case::recursive_cte_self_reference_in_base(
    select_from_recursive(SelectStatement::from(SelectCore::new().column(col("n")).from(table("r"))).compound(
        CompoundOperator::UnionAll,
        SelectCore::new().column(col("n").plus(int(1))).from(table("r")).filter(col("n").lt(int(10))),
    )),
    ErrorKind::Syntax,
)]
#[case::recursive_cte_joined_with_itself(
    select_from_recursive(SelectStatement::from(counter_base()).compound(
        CompoundOperator::UnionAll,
        SelectCore::new().column(qcol("r", "n").plus(int(1))).from(table("r")).from(table_as("r", "r2")),
    )),
    ErrorKind::Syntax,
)]
#[case::recursive_cte_self_reference_in_subquery(
    select_from_recursive(SelectStatement::from(counter_base()).compound(
        CompoundOperator::UnionAll,
        SelectCore::new()
            .column(col("n").plus(int(1)))
            .from(table("r"))
            .filter(col("n").in_subquery(SelectCore::new().column(col("n")).from(table("r")))),
    )),
    ErrorKind::Syntax,
)]
fn planning_errors(#[case] stmt: SqlStatement, #[case] kind: ErrorKind) {
    assert_plan_err(&catalog(), stmt, kind);
}

#[test]
fn compiled_statement_serializes() {
    let planned = common::plan(
        &catalog(),
        select(
            SelectCore::new()
                .column(col("name"))
                .column(sum(col("age")))
                .from(table("users"))
                .filter(exists(
                    SelectCore::new()
                        .column(int(1))
                        .from(table("posts"))
                        .filter(col("owner_id").equals(qcol("users", "id"))),
                ))
                .group_by(vec![col("name")]),
        ),
    )
    .unwrap();

    let json = serde_json::to_string(&planned).unwrap();
    let restored: CompiledStatement = serde_json::from_str(&json).unwrap();
    assert_eq!(planned, restored);
}

#[test]
fn identifiers_are_case_insensitive_by_default() {
    let stmt = select(
        SelectCore::new()
            .column(col("Name"))
            .from(table("USERS"))
            .filter(qcol("Users", "AGE").gt(int(18))),
    );
    let planned = plan_with_config(&catalog(), stmt, &PlannerConfig::default()).unwrap();
    assert_eq!(
        concat!(
            "Return: name [text]\n",
            "└─Project: users.name\n",
            "  └─Filter: users.age > 18\n",
            "    └─Scan Table: users [physical]\n",
        ),
        planned.to_string()
    );
}

#[test]
fn case_sensitive_identifiers() {
    let config = PlannerConfig {
        case_sensitive: true,
        ..Default::default()
    };

    let err = plan_with_config(
        &catalog(),
        select(SelectCore::new().wildcard().from(table("Users"))),
        &config,
    )
    .unwrap_err();
    assert_eq!(ErrorKind::UnknownTable, err.kind());

    let err = plan_with_config(
        &catalog(),
        select(SelectCore::new().column(col("Name")).from(table("users"))),
        &config,
    )
    .unwrap_err();
    assert_eq!(ErrorKind::ColumnNotFound, err.kind());

    plan_with_config(
        &catalog(),
        select(SelectCore::new().column(col("name")).from(table("users"))),
        &config,
    )
    .unwrap();
}

#[test]
fn default_namespace_used_for_unqualified_tables() {
    let catalog = catalog().with_namespaced_table(
        "finance",
        Table::new(
            "balances",
            vec![
                Column::new("id", DataType::Uuid).primary_key(),
                Column::new("amount", DataType::Int8),
            ],
        ),
    );
    let stmt = select(SelectCore::new().column(col("amount")).from(table("balances")));

    let err = plan_with_config(&catalog, stmt.clone(), &PlannerConfig::default()).unwrap_err();
    assert_eq!(ErrorKind::UnknownTable, err.kind());

    let config = PlannerConfig {
        default_namespace: Some("finance".to_string()),
        ..Default::default()
    };
    let planned = plan_with_config(&catalog, stmt, &config).unwrap();
    assert_eq!(
        concat!(
            "Return: amount [int8]\n",
            "└─Project: balances.amount\n",
            "  └─Scan Table: balances [physical]\n",
        ),
        planned.to_string()
    );

    // Tables outside the default namespace are no longer visible unqualified.
    let err = plan_with_config(
        &catalog,
        select(SelectCore::new().wildcard().from(table("users"))),
        &config,
    )
    .unwrap_err();
    assert_eq!(ErrorKind::UnknownTable, err.kind());
}

#[test]
fn planning_is_deterministic() {
    let stmt = select(
        SelectCore::new()
            .column(col("name"))
            .column(sum(col("age")))
            .from(table_as("users", "u"))
            .join(
                JoinKind::Left,
                table_as("posts", "p"),
                qcol("u", "id").equals(qcol("p", "owner_id")),
            )
            .filter(exists(
                SelectCore::new()
                    .column(int(1))
                    .from(table("posts"))
                    .filter(col("owner_id").equals(qcol("u", "id"))),
            ))
            .group_by(vec![col("name")])
            .having(sum(col("age")).cast_to("int8").gt(int(100))),
    );

    let first = common::plan(&catalog(), stmt.clone()).unwrap();
    let second = common::plan(&catalog(), stmt).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.to_string(), second.to_string());
}
