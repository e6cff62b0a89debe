//! Chainable SELECT/UPDATE/DELETE/EXEC query builders (§4.K).
//!
//! Grounded on `query/select.py`/`update.py`/`delete.py`/`exec_.py`.
//! These operate on a bare table name rather than a declarative Model
//! class — the model/fields layer is an external schema concern
//! (Non-goal). `offset()` has no counterpart in the reference builders
//! at all; SPEC_FULL.md requires it explicitly, so it is added here,
//! composable with `limit()` exactly like the reference's own
//! `n#(...)` wrapping.

use super::{
    compile_functional_delete, compile_functional_exec, compile_functional_select,
    compile_functional_update, Named,
};
use crate::expr::Expr;

/// `?[t;c;b;a]` builder (`query/select.py::SelectQuery`).
#[derive(Clone, Debug, Default)]
pub struct SelectQuery {
    table: String,
    columns: Vec<Expr>,
    named: Named,
    where_: Vec<Expr>,
    by: Vec<Expr>,
    by_named: Named,
    limit_n: Option<i64>,
    offset_n: Option<i64>,
}

impl SelectQuery {
    #[must_use]
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn columns(mut self, columns: impl IntoIterator<Item = Expr>) -> Self {
        self.columns.extend(columns);
        self
    }

    #[must_use]
    pub fn named(mut self, alias: impl Into<String>, expr: Expr) -> Self {
        self.named.insert(alias.into(), expr);
        self
    }

    #[must_use]
    pub fn where_(mut self, conditions: impl IntoIterator<Item = Expr>) -> Self {
        self.where_.extend(conditions);
        self
    }

    #[must_use]
    pub fn by(mut self, columns: impl IntoIterator<Item = Expr>) -> Self {
        self.by.extend(columns);
        self
    }

    #[must_use]
    pub fn by_named(mut self, alias: impl Into<String>, expr: Expr) -> Self {
        self.by_named.insert(alias.into(), expr);
        self
    }

    #[must_use]
    pub fn limit(mut self, n: i64) -> Self {
        self.limit_n = Some(n);
        self
    }

    /// Drop the first `n` rows of the compiled result (`k _ (...)`).
    /// Composes with `limit()`: limit is applied first, then offset,
    /// matching the order the two wrapping calls would nest in q.
    #[must_use]
    pub fn offset(mut self, n: i64) -> Self {
        self.offset_n = Some(n);
        self
    }

    #[must_use]
    pub fn compile(&self) -> String {
        let mut q = compile_functional_select(
            &self.table,
            &self.where_,
            &self.by,
            &self.by_named,
            &self.columns,
            &self.named,
        );
        if let Some(n) = self.limit_n {
            q = format!("{n}#({q})");
        }
        if let Some(n) = self.offset_n {
            q = format!("{n} _ ({q})");
        }
        q
    }

    #[must_use]
    pub fn explain(&self) -> String {
        format!("-- SelectQuery on `{}\n{}", self.table, self.compile())
    }
}

/// `![t;c;b;a]` builder (`query/update.py::UpdateQuery`).
#[derive(Clone, Debug, Default)]
pub struct UpdateQuery {
    table: String,
    assignments: Named,
    where_: Vec<Expr>,
    by: Vec<Expr>,
}

impl UpdateQuery {
    #[must_use]
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn set(mut self, column: impl Into<String>, value: Expr) -> Self {
        self.assignments.insert(column.into(), value);
        self
    }

    #[must_use]
    pub fn where_(mut self, conditions: impl IntoIterator<Item = Expr>) -> Self {
        self.where_.extend(conditions);
        self
    }

    #[must_use]
    pub fn by(mut self, columns: impl IntoIterator<Item = Expr>) -> Self {
        self.by.extend(columns);
        self
    }

    #[must_use]
    pub fn compile(&self) -> String {
        compile_functional_update(&self.table, &self.where_, &self.by, &self.assignments)
    }
}

/// `![t;c;0b;a]` builder (`query/delete.py::DeleteQuery`).
#[derive(Clone, Debug, Default)]
pub struct DeleteQuery {
    table: String,
    where_: Vec<Expr>,
    columns: Option<Vec<String>>,
}

impl DeleteQuery {
    #[must_use]
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn where_(mut self, conditions: impl IntoIterator<Item = Expr>) -> Self {
        self.where_.extend(conditions);
        self
    }

    /// Delete specific columns instead of matching rows.
    #[must_use]
    pub fn columns(mut self, names: impl IntoIterator<Item = String>) -> Self {
        self.columns = Some(names.into_iter().collect());
        self
    }

    #[must_use]
    pub fn compile(&self) -> String {
        compile_functional_delete(&self.table, &self.where_, self.columns.as_deref())
    }
}

/// `?[t;c;b;a]` builder with exec-style column collapsing
/// (`query/exec_.py::ExecQuery`).
#[derive(Clone, Debug, Default)]
pub struct ExecQuery {
    table: String,
    columns: Vec<Expr>,
    named: Named,
    where_: Vec<Expr>,
    by: Vec<Expr>,
    by_named: Named,
    limit_n: Option<i64>,
    offset_n: Option<i64>,
}

impl ExecQuery {
    #[must_use]
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn columns(mut self, columns: impl IntoIterator<Item = Expr>) -> Self {
        self.columns.extend(columns);
        self
    }

    #[must_use]
    pub fn named(mut self, alias: impl Into<String>, expr: Expr) -> Self {
        self.named.insert(alias.into(), expr);
        self
    }

    #[must_use]
    pub fn where_(mut self, conditions: impl IntoIterator<Item = Expr>) -> Self {
        self.where_.extend(conditions);
        self
    }

    #[must_use]
    pub fn by(mut self, columns: impl IntoIterator<Item = Expr>) -> Self {
        self.by.extend(columns);
        self
    }

    #[must_use]
    pub fn by_named(mut self, alias: impl Into<String>, expr: Expr) -> Self {
        self.by_named.insert(alias.into(), expr);
        self
    }

    #[must_use]
    pub fn limit(mut self, n: i64) -> Self {
        self.limit_n = Some(n);
        self
    }

    #[must_use]
    pub fn offset(mut self, n: i64) -> Self {
        self.offset_n = Some(n);
        self
    }

    #[must_use]
    pub fn compile(&self) -> String {
        let mut q = compile_functional_exec(
            &self.table,
            &self.where_,
            &self.by,
            &self.by_named,
            &self.columns,
            &self.named,
        );
        if let Some(n) = self.limit_n {
            q = format!("{n}#({q})");
        }
        if let Some(n) = self.offset_n {
            q = format!("{n} _ ({q})");
        }
        q
    }

    #[must_use]
    pub fn explain(&self) -> String {
        format!("-- ExecQuery on `{}\n{}", self.table, self.compile())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{avg_, col};

    #[test]
    fn select_compiles_where_by_limit() {
        let q = SelectQuery::new("trade")
            .columns([col("sym")])
            .named("avg_price", avg_("price"))
            .where_([col("price").gt(100)])
            .by([col("sym")])
            .limit(10);
        assert_eq!(
            q.compile(),
            "10#(?[trade;enlist ((price>100));([] sym:sym);([] sym:sym; avg_price:avg price)])"
        );
    }

    #[test]
    fn select_offset_wraps_after_limit() {
        let q = SelectQuery::new("trade").limit(10).offset(5);
        assert_eq!(q.compile(), "5 _ (10#(?[trade;();0b;()]))");
    }

    #[test]
    fn select_offset_without_limit() {
        let q = SelectQuery::new("trade").offset(5);
        assert_eq!(q.compile(), "5 _ (?[trade;();0b;()])");
    }

    #[test]
    fn update_compiles_assignment() {
        let q = UpdateQuery::new("trade")
            .set("price", col("price").mul(1.1))
            .where_([col("sym").eq_("AAPL")]);
        assert_eq!(
            q.compile(),
            "![trade;enlist ((sym=`AAPL));0b;([] price:(price*1.1))]"
        );
    }

    #[test]
    fn delete_rows_uses_empty_symbol_vector() {
        let q = DeleteQuery::new("trade").where_([col("sym").eq_("AAPL")]);
        assert_eq!(q.compile(), "![trade;enlist ((sym=`AAPL));0b;`symbol$()]");
    }

    #[test]
    fn delete_columns_lists_backtick_names() {
        let q = DeleteQuery::new("trade").columns(["price".to_string(), "size".to_string()]);
        assert_eq!(q.compile(), "![trade;();0b;`price`size]");
    }

    #[test]
    fn exec_single_column_is_atom() {
        let q = ExecQuery::new("trade").columns([col("price")]);
        assert_eq!(q.compile(), "?[trade;();0b;`price]");
    }
}
