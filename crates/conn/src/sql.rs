//! Parameterized statement builders
//!
//! Pure functions of the dialect and the column lists. Parameters are
//! named `p1..pn` in placeholder order; the dialect decides how a
//! placeholder appears in the text.

use relica_core::statement::Statement;
use relica_core::value::{Condition, SqlParam, SqlValue};
use relica_dialect::Dialect;

/// `INSERT INTO table (c1, c2) VALUES (…)`.
pub fn insert_statement(
    dialect: &dyn Dialect,
    table: &str,
    columns: &[(String, SqlValue)],
) -> Statement {
    let mut names = Vec::with_capacity(columns.len());
    let mut slots = Vec::with_capacity(columns.len());
    let mut params = Vec::with_capacity(columns.len());
    for (i, (column, value)) in columns.iter().enumerate() {
        let name = format!("p{}", i + 1);
        names.push(column.clone());
        slots.push(dialect.placeholder(i + 1, &name));
        params.push(SqlParam::new(name, value.clone()));
    }
    Statement::with_params(
        format!(
            "INSERT INTO {} ({}) VALUES ({})",
            table,
            names.join(", "),
            slots.join(", ")
        ),
        params,
    )
}

/// `UPDATE table SET c1 = …, c2 = … WHERE …`.
pub fn update_statement(
    dialect: &dyn Dialect,
    table: &str,
    assignments: &[(String, SqlValue)],
    conditions: &[Condition],
) -> Statement {
    let mut sets = Vec::with_capacity(assignments.len());
    let mut params = Vec::with_capacity(assignments.len() + conditions.len());
    for (i, (column, value)) in assignments.iter().enumerate() {
        let name = format!("p{}", i + 1);
        sets.push(format!("{} = {}", column, dialect.placeholder(i + 1, &name)));
        params.push(SqlParam::new(name, value.clone()));
    }
    let (where_sql, where_params) = where_clause(dialect, assignments.len() + 1, conditions);
    params.extend(where_params);
    let mut sql = format!("UPDATE {} SET {}", table, sets.join(", "));
    if !where_sql.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&where_sql);
    }
    Statement::with_params(sql, params)
}

/// Equality predicate text plus its parameters, starting numbering at
/// `first_index`. Empty conditions yield an empty predicate.
pub fn where_clause(
    dialect: &dyn Dialect,
    first_index: usize,
    conditions: &[Condition],
) -> (String, Vec<SqlParam>) {
    let mut predicates = Vec::with_capacity(conditions.len());
    let mut params = Vec::with_capacity(conditions.len());
    for (offset, condition) in conditions.iter().enumerate() {
        let index = first_index + offset;
        let name = format!("p{}", index);
        predicates.push(format!(
            "{} = {}",
            condition.column,
            dialect.placeholder(index, &name)
        ));
        params.push(SqlParam::new(name, condition.value.clone()));
    }
    (predicates.join(" AND "), params)
}
