//! Functional-form query compilation (§4.K Compiler API).
//!
//! Grounded on `query/compiler.py`: the infix dialect pinned by
//! `DESIGN.md` Open Question 2. `?[t;c;b;a]` for select/exec,
//! `![t;c;b;a]` for update, `![t;c;0b;a]` for delete.

mod insert;
mod joins;
mod query;

pub use insert::{ColumnValues, InsertBuilder};
pub use joins::{aj, ij, lj, wj, AsOfJoin, InnerJoin, LeftJoin, WindowJoin};
pub use query::{DeleteQuery, ExecQuery, SelectQuery, UpdateQuery};

use std::collections::BTreeMap;

use crate::expr::{Expr, Literal};

/// Implemented by every query/insert/join builder that exposes a
/// `compile()` method, so `Session::exec` can take any of them
/// uniformly.
pub trait Compilable {
    fn compile(&self) -> String;
}

macro_rules! impl_compilable {
    ($($ty:ty),* $(,)?) => {
        $(impl Compilable for $ty {
            fn compile(&self) -> String {
                <$ty>::compile(self)
            }
        })*
    };
}

impl_compilable!(
    SelectQuery,
    UpdateQuery,
    DeleteQuery,
    ExecQuery,
    InsertBuilder,
    AsOfJoin,
    LeftJoin,
    InnerJoin,
    WindowJoin,
);

/// Compile a single expression to a q string.
#[must_use]
pub fn compile_expr(expr: &Expr) -> String {
    match expr {
        Expr::Column(name) => name.clone(),
        Expr::Literal(lit) => compile_literal(lit),
        Expr::BinOp { op, left, right } => {
            let l = compile_expr(left);
            let r = compile_expr(right);
            if *op == "mod" {
                format!("({l} mod {r})")
            } else {
                format!("({l}{op}{r})")
            }
        }
        Expr::UnaryOp { op, operand } => {
            let o = compile_expr(operand);
            format!("({op} {o})")
        }
        Expr::Call { func_name, args } => {
            if matches!(func_name.as_str(), "like" | "in" | "within" | "xbar") {
                let left = compile_expr(&args[0]);
                let right = compile_expr(&args[1]);
                format!("({left} {func_name} {right})")
            } else {
                let joined = args
                    .iter()
                    .map(compile_expr)
                    .collect::<Vec<_>>()
                    .join(";");
                format!("{func_name}[{joined}]")
            }
        }
        Expr::Agg { func_name, column } => {
            format!("{func_name} {}", compile_expr(column))
        }
        Expr::Fby {
            agg_name,
            col,
            group_col,
        } => format!(
            "({agg_name};{}) fby {}",
            compile_expr(col),
            compile_expr(group_col)
        ),
        Expr::Each { func_expr, adverb } => {
            format!("{} {adverb}", compile_expr(func_expr))
        }
    }
}

/// Compile a literal value to its q representation.
#[must_use]
pub fn compile_literal(value: &Literal) -> String {
    match value {
        Literal::Sentinel(s) => (*s).to_string(),
        Literal::Null => "(::)".to_string(),
        Literal::Bool(b) => if *b { "1b" } else { "0b" }.to_string(),
        Literal::Int(i) => i.to_string(),
        Literal::Float(f) => {
            if f.is_nan() {
                "0Nf".to_string()
            } else {
                format!("{f}f")
            }
        }
        Literal::Str(s) => {
            if is_q_identifier(s) {
                format!("`{s}")
            } else {
                format!("\"{s}\"")
            }
        }
        Literal::List(items) => {
            if items.is_empty() {
                "()".to_string()
            } else {
                let joined = items.iter().map(compile_literal).collect::<Vec<_>>().join(";");
                format!("({joined})")
            }
        }
        Literal::Bytes(bytes) => {
            let hex: String = bytes.iter().map(|b| format!("{b:02x}")).collect();
            format!("0x{hex}")
        }
    }
}

fn is_q_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Named (aliased) expressions, keyed by output column name. A
/// `BTreeMap` keeps compiled output deterministic across calls, unlike
/// Python's (still ordered, but separately-constructed) plain dict.
pub type Named = BTreeMap<String, Expr>;

/// WHERE clause list: `enlist (expr)`, `(e1;e2;...)`, or `()` for none.
#[must_use]
pub fn compile_where(clauses: &[Expr]) -> String {
    if clauses.is_empty() {
        return "()".to_string();
    }
    let parts: Vec<String> = clauses.iter().map(|c| format!("({})", compile_expr(c))).collect();
    if parts.len() == 1 {
        format!("enlist {}", parts[0])
    } else {
        format!("({})", parts.join(";"))
    }
}

/// GROUP BY clause: `([] col1:col1; ...)`, or `0b` for none.
#[must_use]
pub fn compile_by(by_exprs: &[Expr], named: &Named) -> String {
    if by_exprs.is_empty() && named.is_empty() {
        return "0b".to_string();
    }
    let mut parts = Vec::new();
    for expr in by_exprs {
        if let Expr::Column(name) = expr {
            parts.push(format!("{name}:{name}"));
        } else {
            parts.push(compile_expr(expr));
        }
    }
    for (alias, expr) in named {
        parts.push(format!("{alias}:{}", compile_expr(expr)));
    }
    format!("([] {})", parts.join("; "))
}

/// SELECT column dictionary: `([] sym:sym; avg_price:avg price)`, or
/// `()` to select every column.
#[must_use]
pub fn compile_select_columns(columns: &[Expr], named: &Named) -> String {
    if columns.is_empty() && named.is_empty() {
        return "()".to_string();
    }
    let mut parts = Vec::new();
    for col in columns {
        match col {
            Expr::Column(name) => parts.push(format!("{name}:{name}")),
            Expr::Agg { .. } => {
                let compiled = compile_expr(col);
                let name = infer_agg_name(col);
                parts.push(format!("{name}:{compiled}"));
            }
            _ => parts.push(compile_expr(col)),
        }
    }
    for (alias, expr) in named {
        parts.push(format!("{alias}:{}", compile_expr(expr)));
    }
    format!("([] {})", parts.join("; "))
}

/// Infer an output column name for an aggregate expression:
/// `<func>_<column>` if aggregating a bare column, else the bare
/// function name.
#[must_use]
pub fn infer_agg_name(expr: &Expr) -> String {
    if let Expr::Agg { func_name, column } = expr {
        if let Expr::Column(name) = column.as_ref() {
            return format!("{func_name}_{name}");
        }
        return func_name.clone();
    }
    compile_expr(expr)
}

/// EXEC column form: a bare atom for a single unaliased column, the
/// compiled expression for a single unaliased non-column, or a dict
/// `` `k1`k2!(v1;v2) `` for everything else.
#[must_use]
pub fn compile_exec_columns(columns: &[Expr], named: &Named) -> String {
    let mut all_parts: Vec<(String, String)> = Vec::new();
    for col in columns {
        match col {
            Expr::Column(name) => all_parts.push((name.clone(), name.clone())),
            Expr::Agg { .. } => {
                let compiled = compile_expr(col);
                let name = infer_agg_name(col);
                all_parts.push((name, compiled));
            }
            _ => {
                let compiled = compile_expr(col);
                all_parts.push((compiled.clone(), compiled));
            }
        }
    }
    for (alias, expr) in named {
        all_parts.push((alias.clone(), compile_expr(expr)));
    }

    if all_parts.is_empty() {
        return "()".to_string();
    }

    if all_parts.len() == 1 && named.is_empty() {
        let (name, compiled) = &all_parts[0];
        return if matches!(columns[0], Expr::Column(_)) {
            format!("`{name}")
        } else {
            compiled.clone()
        };
    }

    let keys: String = all_parts.iter().map(|(n, _)| format!("`{n}")).collect();
    let vals = all_parts.iter().map(|(_, v)| v.clone()).collect::<Vec<_>>().join(";");
    format!("{keys}!({vals})")
}

/// Full functional select: `?[t;c;b;a]`.
#[must_use]
pub fn compile_functional_select(
    table: &str,
    where_clauses: &[Expr],
    by_exprs: &[Expr],
    by_named: &Named,
    columns: &[Expr],
    named: &Named,
) -> String {
    let c = compile_where(where_clauses);
    let b = compile_by(by_exprs, by_named);
    let a = compile_select_columns(columns, named);
    format!("?[{table};{c};{b};{a}]")
}

/// Full functional update: `![t;c;b;a]`.
#[must_use]
pub fn compile_functional_update(
    table: &str,
    where_clauses: &[Expr],
    by_exprs: &[Expr],
    assignments: &Named,
) -> String {
    let c = compile_where(where_clauses);
    let b = compile_by(by_exprs, &Named::new());
    let parts: Vec<String> = assignments
        .iter()
        .map(|(name, expr)| format!("{name}:{}", compile_expr(expr)))
        .collect();
    let a = format!("([] {})", parts.join("; "));
    format!("![{table};{c};{b};{a}]")
}

/// Full functional delete: `![t;c;0b;a]`. `columns = None` deletes
/// matching rows; `Some(cols)` deletes those columns instead.
#[must_use]
pub fn compile_functional_delete(table: &str, where_clauses: &[Expr], columns: Option<&[String]>) -> String {
    let c = compile_where(where_clauses);
    let a = match columns {
        Some(cols) if !cols.is_empty() => {
            let joined: String = cols.iter().map(|c| format!("`{c}")).collect();
            joined
        }
        _ => "`symbol$()".to_string(),
    };
    format!("![{table};{c};0b;{a}]")
}

/// Full functional exec: `?[t;c;b;a]` with exec-style column form.
#[must_use]
pub fn compile_functional_exec(
    table: &str,
    where_clauses: &[Expr],
    by_exprs: &[Expr],
    by_named: &Named,
    columns: &[Expr],
    named: &Named,
) -> String {
    let c = compile_where(where_clauses);
    let b = compile_by(by_exprs, by_named);
    let a = compile_exec_columns(columns, named);
    format!("?[{table};{c};{b};{a}]")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{avg_, col, count_};

    #[test]
    fn compiles_comparison() {
        let e = col("price").gt(100);
        assert_eq!(compile_expr(&e), "(price>100)");
    }

    #[test]
    fn compiles_mod_with_spaces() {
        let e = col("x").modulo(3);
        assert_eq!(compile_expr(&e), "(x mod 3)");
    }

    #[test]
    fn symbol_literal_uses_backtick() {
        assert_eq!(compile_literal(&Literal::Str("AAPL".into())), "`AAPL");
    }

    #[test]
    fn non_identifier_literal_is_quoted() {
        assert_eq!(compile_literal(&Literal::Str("hello world".into())), "\"hello world\"");
    }

    #[test]
    fn where_single_clause_uses_enlist() {
        let clauses = vec![col("price").gt(100)];
        assert_eq!(compile_where(&clauses), "enlist ((price>100))");
    }

    #[test]
    fn where_empty_is_unit() {
        assert_eq!(compile_where(&[]), "()");
    }

    #[test]
    fn by_empty_is_false() {
        assert_eq!(compile_by(&[], &Named::new()), "0b");
    }

    #[test]
    fn by_column_self_assigns() {
        let by = vec![col("sym")];
        assert_eq!(compile_by(&by, &Named::new()), "([] sym:sym)");
    }

    #[test]
    fn select_infers_agg_column_name() {
        let columns = vec![avg_("price")];
        assert_eq!(
            compile_select_columns(&columns, &Named::new()),
            "([] avg_price:avg price)"
        );
    }

    #[test]
    fn exec_single_column_collapses_to_atom() {
        let columns = vec![col("price")];
        assert_eq!(compile_exec_columns(&columns, &Named::new()), "`price");
    }

    #[test]
    fn exec_multiple_columns_uses_dict_form() {
        let columns = vec![col("sym"), col("price")];
        assert_eq!(
            compile_exec_columns(&columns, &Named::new()),
            "`sym`price!(sym;price)"
        );
    }

    #[test]
    fn count_with_no_column_uses_i() {
        let e = count_(None);
        assert_eq!(compile_expr(&e), "count i");
    }

    #[test]
    fn select_all_is_unit() {
        assert_eq!(compile_select_columns(&[], &Named::new()), "()");
    }
}
