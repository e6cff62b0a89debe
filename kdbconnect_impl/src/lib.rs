//! Do not use this crate directly.
//!
//! This is the implementation crate for `kdbconnect` and `kdbconnect_async`.
//!
//! If you need a synchronous driver, use `kdbconnect`.
//!
//! If you need an asynchronous driver, use `kdbconnect_async`.

#![deny(missing_debug_implementations)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![cfg_attr(not(any(feature = "sync", feature = "async")), allow(unused_imports))]
#![cfg_attr(not(any(feature = "sync", feature = "async")), allow(dead_code))]

mod compiler;
mod conn;
mod error;
mod expr;
mod schema;
mod session;
mod types_impl;
mod value;
mod wire;

#[cfg(feature = "async")]
pub mod a_sync;
#[cfg(feature = "sync")]
pub mod sync;

pub use crate::conn::{ConnectParams, ConnectParamsBuilder, IntoConnectParams, RetryPolicy, Tls};
#[cfg(any(feature = "sync", feature = "async"))]
pub use crate::conn::pool::PoolConfig;
#[cfg(feature = "sync")]
pub use crate::conn::pool::{PooledConnection as SyncPooledConnection, SyncPool};
#[cfg(feature = "async")]
pub use crate::conn::pool::{AsyncPool, AsyncPooledConnection};
pub use crate::error::{QError, QResult};
pub use crate::schema::{
    create_table_q, drop_table_q, parse_meta_result, table_count_q, table_exists_q, table_meta_q,
    ColumnMeta, Schema, TableMeta,
};
pub use crate::session::ResultSet;
#[cfg(feature = "sync")]
pub use crate::session::Session;
#[cfg(feature = "async")]
pub use crate::session::AsyncSession;
pub use crate::value::{Attribute, FuncValue, TypeCode, VecData, Value, Vector};
pub use crate::wire::{compress, decompress, pack_header, unpack_header, Deserializer, Header, MsgType, Serializer, HEADER_SIZE};

/// The expression tree and query compiler (§4.K): build `?[t;c;b;a]`
/// and `![t;c;b;a]` functional forms from `col`/`lit` expressions
/// rather than hand-written query strings.
pub mod query {
    pub use crate::compiler::{
        aj, compile_by, compile_exec_columns, compile_expr, compile_functional_delete,
        compile_functional_exec, compile_functional_select, compile_functional_update,
        compile_literal, compile_select_columns, compile_where, ij, infer_agg_name, lj, wj,
        AsOfJoin, Compilable, ColumnValues, DeleteQuery, ExecQuery, InnerJoin, InsertBuilder,
        LeftJoin, Named, SelectQuery, UpdateQuery, WindowJoin,
    };
    pub use crate::expr::{
        avg_, col, count_, dev_, each_, fby_, first_, last_, lit, max_, med_, min_, now_, peach_,
        sum_, today_, var_, wavg_, xbar_, Expr, IntoColumn, IntoExpr, Literal,
    };
}

/// q epoch conversions (§3, §4.C/§4.M), re-exported for callers that
/// build column values directly rather than through [`query`].
pub mod temporal {
    pub use crate::types_impl::temporal::{
        date_to_python, datetime_to_python, datetime_to_timestamp, minute_to_time, month_to_python,
        python_to_date, python_to_datetime, python_to_month, python_to_time, second_to_time,
        time_to_minute, time_to_python, time_to_second, timedelta_to_timespan, timespan_to_timedelta,
        timestamp_to_datetime,
    };
}

/// Default pool size, matching [`PoolConfig::default`]'s `max_size`
/// (§4.H).
pub const DEFAULT_POOL_MAX_SIZE: usize = 10;
