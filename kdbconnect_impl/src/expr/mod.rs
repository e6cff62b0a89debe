//! Query expression tree (§4.J Expression API).
//!
//! Grounded on `query/expressions.py`. Python builds this tree through
//! operator overloading (`Trade.price > 100`); Rust has no operator
//! overloading expressive enough for a typed DSL like this, so the
//! same tree is built through explicit methods (`col("price").gt(100)`)
//! instead — the "Non-overloadable-operators" redesign flag.

use std::fmt;

/// A literal value embedded in a query expression.
#[derive(Clone, Debug, PartialEq)]
pub enum Literal {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
    List(Vec<Literal>),
    /// A verbatim q fragment that compiles to exactly itself, e.g.
    /// `.z.d` / `.z.p` (§4.J `today_`/`now_`).
    Sentinel(&'static str),
}

impl From<bool> for Literal {
    fn from(v: bool) -> Self {
        Literal::Bool(v)
    }
}
impl From<i64> for Literal {
    fn from(v: i64) -> Self {
        Literal::Int(v)
    }
}
impl From<i32> for Literal {
    fn from(v: i32) -> Self {
        Literal::Int(i64::from(v))
    }
}
impl From<f64> for Literal {
    fn from(v: f64) -> Self {
        Literal::Float(v)
    }
}
impl From<&str> for Literal {
    fn from(v: &str) -> Self {
        Literal::Str(v.to_string())
    }
}
impl From<String> for Literal {
    fn from(v: String) -> Self {
        Literal::Str(v)
    }
}

/// A node in a query expression tree.
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    Column(String),
    Literal(Literal),
    BinOp {
        op: &'static str,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    UnaryOp {
        op: &'static str,
        operand: Box<Expr>,
    },
    /// A function call, rendered `name[args]` except for the
    /// compiler-known infix forms (`like`/`in`/`within`/`xbar`).
    Call {
        func_name: String,
        args: Vec<Expr>,
    },
    /// `<func> <col>`, e.g. `avg price`.
    Agg {
        func_name: String,
        column: Box<Expr>,
    },
    /// `(agg;col) fby group_col`.
    Fby {
        agg_name: String,
        col: Box<Expr>,
        group_col: Box<Expr>,
    },
    /// `func_expr each col` / `func_expr peach col`.
    Each {
        func_expr: Box<Expr>,
        adverb: &'static str,
    },
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", crate::compiler::compile_expr(self))
    }
}

/// Reference a column by name (`query/expressions.py::Column`).
#[must_use]
pub fn col(name: impl Into<String>) -> Expr {
    Expr::Column(name.into())
}

/// Wrap a bare value as a literal expression.
#[must_use]
pub fn lit(value: impl Into<Literal>) -> Expr {
    Expr::Literal(value.into())
}

impl Expr {
    #[must_use]
    pub fn gt(self, other: impl IntoExpr) -> Expr {
        bin(">", self, other)
    }
    #[must_use]
    pub fn ge(self, other: impl IntoExpr) -> Expr {
        bin(">=", self, other)
    }
    #[must_use]
    pub fn lt(self, other: impl IntoExpr) -> Expr {
        bin("<", self, other)
    }
    #[must_use]
    pub fn le(self, other: impl IntoExpr) -> Expr {
        bin("<=", self, other)
    }
    #[must_use]
    pub fn eq_(self, other: impl IntoExpr) -> Expr {
        bin("=", self, other)
    }
    #[must_use]
    pub fn ne(self, other: impl IntoExpr) -> Expr {
        bin("<>", self, other)
    }
    #[must_use]
    pub fn add(self, other: impl IntoExpr) -> Expr {
        bin("+", self, other)
    }
    #[must_use]
    pub fn sub(self, other: impl IntoExpr) -> Expr {
        bin("-", self, other)
    }
    #[must_use]
    pub fn mul(self, other: impl IntoExpr) -> Expr {
        bin("*", self, other)
    }
    #[must_use]
    pub fn div(self, other: impl IntoExpr) -> Expr {
        bin("%", self, other)
    }
    #[must_use]
    pub fn modulo(self, other: impl IntoExpr) -> Expr {
        bin("mod", self, other)
    }
    #[must_use]
    pub fn and(self, other: impl IntoExpr) -> Expr {
        bin("&", self, other)
    }
    #[must_use]
    pub fn or(self, other: impl IntoExpr) -> Expr {
        bin("|", self, other)
    }
    #[must_use]
    pub fn neg(self) -> Expr {
        Expr::UnaryOp {
            op: "neg",
            operand: Box::new(self),
        }
    }
    #[must_use]
    pub fn not(self) -> Expr {
        Expr::UnaryOp {
            op: "not",
            operand: Box::new(self),
        }
    }
    #[must_use]
    pub fn within(self, low: impl Into<Literal>, high: impl Into<Literal>) -> Expr {
        Expr::Call {
            func_name: "within".into(),
            args: vec![
                self,
                Expr::Literal(Literal::List(vec![low.into(), high.into()])),
            ],
        }
    }
    #[must_use]
    pub fn like(self, pattern: impl Into<String>) -> Expr {
        Expr::Call {
            func_name: "like".into(),
            args: vec![self, Expr::Literal(Literal::Str(pattern.into()))],
        }
    }
    #[must_use]
    pub fn in_(self, values: Vec<Literal>) -> Expr {
        Expr::Call {
            func_name: "in".into(),
            args: vec![self, Expr::Literal(Literal::List(values))],
        }
    }
    #[must_use]
    pub fn asc(self) -> Expr {
        Expr::Call {
            func_name: "asc".into(),
            args: vec![self],
        }
    }
    #[must_use]
    pub fn desc(self) -> Expr {
        Expr::Call {
            func_name: "desc".into(),
            args: vec![self],
        }
    }
}

fn bin(op: &'static str, left: Expr, right: impl IntoExpr) -> Expr {
    Expr::BinOp {
        op,
        left: Box::new(left),
        right: Box::new(right.into_expr()),
    }
}

/// Anything that can appear on the right-hand side of an operator
/// method: an existing [`Expr`], or a bare value wrapped as a literal
/// (mirrors `_wrap()` in the reference).
pub trait IntoExpr {
    fn into_expr(self) -> Expr;
}

impl IntoExpr for Expr {
    fn into_expr(self) -> Expr {
        self
    }
}
impl IntoExpr for i64 {
    fn into_expr(self) -> Expr {
        Expr::Literal(Literal::Int(self))
    }
}
impl IntoExpr for i32 {
    fn into_expr(self) -> Expr {
        Expr::Literal(Literal::Int(i64::from(self)))
    }
}
impl IntoExpr for f64 {
    fn into_expr(self) -> Expr {
        Expr::Literal(Literal::Float(self))
    }
}
impl IntoExpr for bool {
    fn into_expr(self) -> Expr {
        Expr::Literal(Literal::Bool(self))
    }
}
impl IntoExpr for &str {
    fn into_expr(self) -> Expr {
        Expr::Literal(Literal::Str(self.to_string()))
    }
}
impl IntoExpr for String {
    fn into_expr(self) -> Expr {
        Expr::Literal(Literal::Str(self))
    }
}

/// Something usable as a column reference: a bare name or an
/// already-built expression (mirrors `_wrap_col()`).
pub trait IntoColumn {
    fn into_column(self) -> Expr;
}
impl IntoColumn for &str {
    fn into_column(self) -> Expr {
        Expr::Column(self.to_string())
    }
}
impl IntoColumn for String {
    fn into_column(self) -> Expr {
        Expr::Column(self)
    }
}
impl IntoColumn for Expr {
    fn into_column(self) -> Expr {
        self
    }
}

// ── Aggregate constructors (§4.J) ──────────────────────────────────

macro_rules! agg_fn {
    ($name:ident, $q:literal) => {
        #[must_use]
        pub fn $name(column: impl IntoColumn) -> Expr {
            Expr::Agg {
                func_name: $q.to_string(),
                column: Box::new(column.into_column()),
            }
        }
    };
}

agg_fn!(avg_, "avg");
agg_fn!(sum_, "sum");
agg_fn!(min_, "min");
agg_fn!(max_, "max");
agg_fn!(first_, "first");
agg_fn!(last_, "last");
agg_fn!(med_, "med");
agg_fn!(dev_, "dev");
agg_fn!(var_, "var");

/// `count column`, or `count i` when no column is given (reference's
/// `count_(col=None)`).
#[must_use]
pub fn count_(column: Option<Expr>) -> Expr {
    Expr::Agg {
        func_name: "count".to_string(),
        column: Box::new(column.unwrap_or_else(|| Expr::Column("i".to_string()))),
    }
}

/// Weighted average. The reference implementation is itself
/// simplified to only wrap `weights`, not combine weights and values
/// into a single `wavg` call; kept identical here for parity.
#[must_use]
pub fn wavg_(weights: impl IntoColumn, _values: impl IntoColumn) -> Expr {
    Expr::Agg {
        func_name: "wavg".to_string(),
        column: Box::new(weights.into_column()),
    }
}

impl Expr {
    /// Apply this aggregate with the `each` adverb. Only meaningful on
    /// an [`Expr::Agg`], matching `AggFunc.each()`.
    #[must_use]
    pub fn each(self) -> Expr {
        Expr::Each {
            func_expr: Box::new(self),
            adverb: "each",
        }
    }
    /// Apply this aggregate with the `peach` adverb.
    #[must_use]
    pub fn peach(self) -> Expr {
        Expr::Each {
            func_expr: Box::new(self),
            adverb: "peach",
        }
    }
}

/// `bucket xbar col` — bucket timestamps/values.
#[must_use]
pub fn xbar_(bucket: i64, col: impl IntoColumn) -> Expr {
    Expr::Call {
        func_name: "xbar".to_string(),
        args: vec![Expr::Literal(Literal::Int(bucket)), col.into_column()],
    }
}

/// Compiles to `.z.d` (current date).
#[must_use]
pub fn today_() -> Expr {
    Expr::Literal(Literal::Sentinel(".z.d"))
}

/// Compiles to `.z.p` (current timestamp).
#[must_use]
pub fn now_() -> Expr {
    Expr::Literal(Literal::Sentinel(".z.p"))
}

/// `(agg;col) fby group_col`.
#[must_use]
pub fn fby_(agg_name: impl Into<String>, col: impl IntoColumn, group_col: impl IntoColumn) -> Expr {
    Expr::Fby {
        agg_name: agg_name.into(),
        col: Box::new(col.into_column()),
        group_col: Box::new(group_col.into_column()),
    }
}

/// `func_name each col`.
#[must_use]
pub fn each_(func_name: impl Into<String>, col: impl IntoColumn) -> Expr {
    Expr::Each {
        func_expr: Box::new(Expr::Agg {
            func_name: func_name.into(),
            column: Box::new(col.into_column()),
        }),
        adverb: "each",
    }
}

/// `func_name peach col`.
#[must_use]
pub fn peach_(func_name: impl Into<String>, col: impl IntoColumn) -> Expr {
    Expr::Each {
        func_expr: Box::new(Expr::Agg {
            func_name: func_name.into(),
            column: Box::new(col.into_column()),
        }),
        adverb: "peach",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_comparison_tree() {
        let e = col("price").gt(100);
        assert_eq!(
            e,
            Expr::BinOp {
                op: ">",
                left: Box::new(Expr::Column("price".into())),
                right: Box::new(Expr::Literal(Literal::Int(100))),
            }
        );
    }

    #[test]
    fn count_defaults_to_i() {
        let e = count_(None);
        assert_eq!(
            e,
            Expr::Agg {
                func_name: "count".into(),
                column: Box::new(Expr::Column("i".into())),
            }
        );
    }
}
