//! Synchronous native rust driver for kdb+/q.
//!
//! `kdbconnect` provides a lean, blocking rust API for talking to a
//! kdb+ (or q) process over its binary IPC protocol: open a
//! [`Connection`] or a [`Session`] against a `kdb://host:port` DSN,
//! send q expressions, and get back [`Value`]s that mirror q's own
//! type system (atoms, typed vectors, mixed lists, dicts, tables).
//!
//! Rather than hand-writing query strings, build them with the
//! [`query`] module's expression tree: `col("price").gt(lit(100.0))`
//! compiles to the functional `?[t;c;b;a]`/`![t;c;b;a]` forms the
//! server itself uses internally, so the generated q is exactly what
//! a human would write by hand.
//!
//! For usecases that need non-blocking I/O, see
//! [`kdbconnect_async`](https://docs.rs/kdbconnect_async), this
//! driver's asynchronous sibling. The two share nearly all of their
//! implementation; only the transport and the connection API differ.
//!
//! # Example
//!
//! ```rust,no_run
//! use kdbconnect::query::{col, lit, SelectQuery};
//! use kdbconnect::{IntoConnectParams, ResultSet, Session};
//!
//! # fn main() -> kdbconnect::QResult<()> {
//! let params = "kdb://localhost:5001".into_connect_params()?;
//! let mut session = Session::open(params)?;
//! let sel = SelectQuery::new("trade").where_([col("sym").eq_(lit("AAPL"))]);
//! let value = session.exec(&sel)?;
//! let trades = ResultSet::from_value(&value);
//! # let _ = trades;
//! # Ok(())
//! # }
//! ```

#![deny(missing_debug_implementations)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]

pub use kdbconnect_impl::{
    create_table_q, drop_table_q, parse_meta_result, table_count_q, table_exists_q, table_meta_q,
    temporal, Attribute, ColumnMeta, ConnectParams, ConnectParamsBuilder, FuncValue,
    IntoConnectParams, PoolConfig, QError, QResult, RetryPolicy, Schema, TableMeta, Tls, TypeCode,
    VecData, Value, Vector,
};

pub use kdbconnect_impl::sync::Connection;
pub use kdbconnect_impl::{ResultSet, Session, SyncPool, SyncPooledConnection};

/// The expression tree and query compiler, re-exported verbatim from
/// [`kdbconnect_impl`] — building a query doesn't depend on which
/// transport will run it.
pub mod query {
    pub use kdbconnect_impl::query::{
        aj, avg_, col, compile_by, compile_exec_columns, compile_expr, compile_functional_delete,
        compile_functional_exec, compile_functional_select, compile_functional_update,
        compile_literal, compile_select_columns, compile_where, count_, dev_, each_, fby_,
        first_, ij, infer_agg_name, last_, lit, lj, max_, med_, min_, now_, peach_, sum_, today_,
        var_, wavg_, wj, xbar_, AsOfJoin, Compilable,
        ColumnValues, DeleteQuery, ExecQuery, Expr, InnerJoin, InsertBuilder, IntoColumn, IntoExpr,
        LeftJoin, Literal, Named, SelectQuery, UpdateQuery, WindowJoin,
    };
}
