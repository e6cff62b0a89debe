//! Asynchronous native rust driver for kdb+/q.
//!
//! `kdbconnect_async` is written completely in rust; its asynchronous
//! model is based on [`tokio`](https://crates.io/crates/tokio). It
//! provides a lean, cooperative rust API for talking to a kdb+ (or q)
//! process over its binary IPC protocol.
//!
//! For usecases where you don't need an asynchronous driver, you
//! might want to use `kdbconnect_async`'s synchronous sibling,
//! [`kdbconnect`](https://docs.rs/kdbconnect). The two drivers share
//! nearly all of their implementation; only the transport and the
//! connection API differ.
//!
//! # Example
//!
//! ```rust,no_run
//! use kdbconnect_async::query::{col, lit, SelectQuery};
//! use kdbconnect_async::{AsyncSession, IntoConnectParams, ResultSet};
//!
//! # async fn run() -> kdbconnect_async::QResult<()> {
//! let params = "kdb://localhost:5001".into_connect_params()?;
//! let mut session = AsyncSession::open(params).await?;
//! let sel = SelectQuery::new("trade").where_([col("sym").eq_(lit("AAPL"))]);
//! let value = session.exec(&sel).await?;
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

pub use kdbconnect_impl::a_sync::AsyncConnection;
pub use kdbconnect_impl::{AsyncPool, AsyncPooledConnection, AsyncSession, ResultSet};

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
