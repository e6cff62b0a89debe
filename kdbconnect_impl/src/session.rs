//! Sync and async session layer: retrying query/exec/call, DDL
//! helpers, reflection, and a thin push-message listener (§4.O/§4.S).
//!
//! Grounded on `session.py` (`Session`, `AsyncSession`, `_with_retry`,
//! `_reconnect`, `ModelResultSet`/`_map_result`) and
//! `model/reflect.py` for the `meta`/`keys` query shape feeding
//! [`crate::schema::parse_meta_result`]. The declarative `Model`
//! binding `ModelResultSet` carries in the reference is out of scope
//! (Non-goal); [`ResultSet`] here is a plain column-oriented view a
//! caller builds explicitly from a returned table value.

use log::debug;

use crate::compiler::Compilable;
use crate::conn::params::ConnectParams;
use crate::conn::retry::RetryPolicy;
use crate::error::{QError, QResult};
use crate::schema::{create_table_q, drop_table_q, table_exists_q, table_meta_q, ColumnMeta, Schema, TableMeta};
use crate::value::{VecData, Value, Vector};

/// A column-oriented view over a server-returned table
/// (`session.py::ModelResultSet`, minus model binding).
#[derive(Clone, Debug)]
pub struct ResultSet {
    columns: Vec<String>,
    data: Vec<Value>,
    len: usize,
}

impl ResultSet {
    /// Build a `ResultSet` from a query result, if it is a table.
    #[must_use]
    pub fn from_value(value: &Value) -> Option<Self> {
        let (names, cols) = value.as_table()?;
        let len = cols.first().map_or(0, column_len);
        Some(Self {
            columns: names.to_vec(),
            data: cols.to_vec(),
            len,
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// The whole column vector for `name`, column-oriented.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&Value> {
        let idx = self.columns.iter().position(|c| c == name)?;
        self.data.get(idx)
    }

    /// Row `i` as `(column_name, value)` pairs, row-oriented.
    #[must_use]
    pub fn row(&self, i: usize) -> Option<Vec<(String, Value)>> {
        if i >= self.len {
            return None;
        }
        Some(
            self.columns
                .iter()
                .zip(&self.data)
                .map(|(name, col)| (name.clone(), element_at(col, i)))
                .collect(),
        )
    }

    /// Iterate rows, each as `(column_name, value)` pairs.
    pub fn rows(&self) -> impl Iterator<Item = Vec<(String, Value)>> + '_ {
        (0..self.len).map(move |i| self.row(i).expect("index within bounds"))
    }
}

fn column_len(value: &Value) -> usize {
    match value {
        Value::Vector(v) => v.data.len(),
        Value::List(items) => items.len(),
        _ => 0,
    }
}

fn element_at(value: &Value, i: usize) -> Value {
    match value {
        Value::List(items) => items[i].clone(),
        Value::Vector(Vector { data, .. }) => match data {
            VecData::Bool(v) => Value::Bool(v[i]),
            VecData::Guid(v) => Value::Guid(v[i]),
            VecData::Byte(v) => Value::Byte(v[i]),
            VecData::Short(v) => Value::Short(v[i]),
            VecData::Int(v) => Value::Int(v[i]),
            VecData::Long(v) => Value::Long(v[i]),
            VecData::Real(v) => Value::Real(v[i]),
            VecData::Float(v) => Value::Float(v[i]),
            VecData::Char(s) => Value::Char(s.chars().nth(i).unwrap_or(' ')),
            VecData::Symbol(v) => Value::Symbol(v[i].clone()),
            VecData::Timestamp(v) => Value::Timestamp(v[i]),
            VecData::Month(v) => Value::Month(v[i]),
            VecData::Date(v) => Value::Date(v[i]),
            VecData::Datetime(v) => Value::Datetime(v[i]),
            VecData::Timespan(v) => Value::Timespan(v[i]),
            VecData::Minute(v) => Value::Minute(v[i]),
            VecData::Second(v) => Value::Second(v[i]),
            VecData::Time(v) => Value::Time(v[i]),
            VecData::Enum(v) => Value::Int(v[i]),
        },
        other => other.clone(),
    }
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::Symbol(s) => s.clone(),
        Value::Vector(Vector {
            data: VecData::Char(s),
            ..
        }) => s.clone(),
        other => format!("{other:?}"),
    }
}

fn value_to_symbol_list(value: &Value) -> Option<Vec<String>> {
    match value {
        Value::Vector(Vector {
            data: VecData::Symbol(names),
            ..
        }) => Some(names.clone()),
        Value::List(items) => items
            .iter()
            .map(|v| match v {
                Value::Symbol(s) => Some(s.clone()),
                _ => None,
            })
            .collect(),
        _ => None,
    }
}

fn value_to_bool(value: &Value) -> bool {
    matches!(value, Value::Bool(true))
}

/// A push frame's body is `(function_name; table_name; payload)` or
/// `(table_name; payload)` — the common `.u.sub` tickerplant pattern.
fn decode_push(value: Value) -> Option<(String, Value)> {
    let Value::List(mut items) = value else {
        return None;
    };
    match items.len() {
        3 => {
            let payload = items.pop()?;
            let table = items.pop()?;
            Some((value_to_string(&table), payload))
        }
        2 => {
            let payload = items.pop()?;
            let table = items.pop()?;
            Some((value_to_string(&table), payload))
        }
        _ => None,
    }
}

#[cfg(feature = "sync")]
mod sync_session {
    use super::{
        create_table_q, debug, decode_push, drop_table_q, table_exists_q, table_meta_q,
        value_to_bool, value_to_symbol_list, Compilable, ColumnMeta, ConnectParams, QError,
        QResult, RetryPolicy, Schema, TableMeta, Value,
    };
    use crate::schema::parse_meta_result;
    use crate::sync::connection::Connection;

    /// A synchronous session bound to one connection, re-opened
    /// transparently on retryable errors if a [`RetryPolicy`] is
    /// configured (`session.py::Session`).
    #[derive(Debug)]
    pub struct Session {
        params: ConnectParams,
        conn: Connection,
        retry: Option<RetryPolicy>,
    }

    impl Session {
        /// # Errors
        /// Whatever [`Connection::open`] can fail with.
        pub fn open(params: ConnectParams) -> QResult<Self> {
            let retry = params.retry_policy().cloned();
            let conn = Connection::open(params.clone())?;
            Ok(Self { params, conn, retry })
        }

        #[must_use]
        pub fn connection(&self) -> &Connection {
            &self.conn
        }

        pub fn close(&mut self) {
            self.conn.close();
        }

        fn reconnect(&mut self) -> QResult<()> {
            self.conn.close();
            self.conn = Connection::open(self.params.clone())?;
            debug!("session reconnected to {}", self.params);
            Ok(())
        }

        /// Run `f` against the live connection, reopening and retrying
        /// on a retryable failure per the configured [`RetryPolicy`].
        /// Implemented directly rather than via
        /// [`crate::conn::retry::retry_sync`]: that helper's two
        /// closures can't both borrow `self` mutably at once here,
        /// since reconnecting replaces `self.conn` itself.
        fn with_retry<T>(&mut self, mut f: impl FnMut(&mut Connection) -> QResult<T>) -> QResult<T> {
            let Some(policy) = self.retry.clone() else {
                return f(&mut self.conn);
            };
            let mut attempt = 0;
            loop {
                match f(&mut self.conn) {
                    Ok(v) => return Ok(v),
                    Err(e) => {
                        let retryable = policy.is_retryable.map_or_else(|| e.is_retryable(), |r| r(&e));
                        if retryable && attempt < policy.max_retries {
                            self.reconnect()?;
                            std::thread::sleep(policy.delay(attempt));
                            attempt += 1;
                        } else {
                            return Err(e);
                        }
                    }
                }
            }
        }

        /// Evaluate a raw q expression.
        ///
        /// # Errors
        /// Transport errors, or `QError::Remote` for a server-side error.
        pub fn raw(&mut self, q_expr: &str, args: &[Value]) -> QResult<Value> {
            debug!("raw: {q_expr}");
            self.with_retry(|conn| conn.query(q_expr, args))
        }

        /// Compile and send a query/insert/join builder.
        ///
        /// # Errors
        /// See [`Self::raw`].
        pub fn exec(&mut self, query: &impl Compilable) -> QResult<Value> {
            let q_str = query.compile();
            debug!("exec: {q_str}");
            self.with_retry(|conn| conn.query(&q_str, &[]))
        }

        /// Call a named q function with positional arguments.
        ///
        /// # Errors
        /// See [`Self::raw`].
        pub fn call(&mut self, func_name: &str, args: &[Value]) -> QResult<Value> {
            debug!("call: {func_name}");
            self.with_retry(|conn| conn.query(func_name, args))
        }

        /// # Errors
        /// See [`Self::raw`].
        pub fn create_table(&mut self, meta: &TableMeta) -> QResult<Value> {
            self.raw(&create_table_q(meta), &[])
        }

        /// # Errors
        /// See [`Self::raw`].
        pub fn drop_table(&mut self, table: &str) -> QResult<Value> {
            self.raw(&drop_table_q(table), &[])
        }

        /// # Errors
        /// See [`Self::raw`].
        pub fn table_exists(&mut self, table: &str) -> QResult<bool> {
            Ok(value_to_bool(&self.raw(&table_exists_q(table), &[])?))
        }

        /// List every table name in the process.
        ///
        /// # Errors
        /// See [`Self::raw`].
        pub fn tables(&mut self) -> QResult<Vec<String>> {
            let result = self.raw("tables[]", &[])?;
            Ok(value_to_symbol_list(&result).unwrap_or_default())
        }

        /// Reflect one table's column metadata and key columns, via
        /// `meta tablename` and `keys tablename`.
        ///
        /// # Errors
        /// `QError::Reflection` if `meta tablename` fails or its result
        /// doesn't parse as column metadata.
        pub fn reflect(&mut self, table: &str) -> QResult<TableMeta> {
            let meta_data = self
                .raw(&table_meta_q(table), &[])
                .map_err(|e| QError::Reflection(format!("failed to get metadata for table {table:?}: {e}")))?;
            let pairs = parse_meta_result(&meta_data)?;
            let columns = pairs
                .into_iter()
                .map(|(name, type_char)| ColumnMeta::new(name, type_char))
                .collect();
            let keys = self
                .raw(&format!("keys {table}"), &[])
                .ok()
                .and_then(|v| value_to_symbol_list(&v))
                .unwrap_or_default();
            Ok(TableMeta::new(table, columns).with_keys(keys))
        }

        /// Reflect every table in the process into a [`Schema`] registry.
        ///
        /// # Errors
        /// See [`Self::reflect`].
        pub fn reflect_all(&mut self) -> QResult<Schema> {
            let mut schema = Schema::new();
            for name in self.tables()? {
                schema.insert(self.reflect(&name)?);
            }
            Ok(schema)
        }

        /// Block for server-push messages, invoking `callback` with
        /// `(table_name, payload)` for each, until it returns `false`
        /// or the connection is lost (§4.S).
        ///
        /// # Errors
        /// Transport errors while waiting for the next frame.
        pub fn listen(&mut self, mut callback: impl FnMut(String, Value) -> bool) -> QResult<()> {
            loop {
                let msg = self.conn.listen_once()?;
                match decode_push(msg) {
                    Some((table, payload)) => {
                        debug!("received update for {table}");
                        if !callback(table, payload) {
                            return Ok(());
                        }
                    }
                    None => debug!("received non-table push message"),
                }
            }
        }
    }
}

#[cfg(feature = "sync")]
pub use sync_session::Session;

#[cfg(feature = "async")]
mod async_session {
    use super::{
        create_table_q, debug, decode_push, drop_table_q, table_exists_q, table_meta_q,
        value_to_bool, value_to_symbol_list, Compilable, ColumnMeta, ConnectParams, QError,
        QResult, RetryPolicy, Schema, TableMeta, Value,
    };
    use crate::a_sync::connection::AsyncConnection;
    use crate::schema::parse_meta_result;

    /// Asynchronous counterpart of [`super::Session`]
    /// (`session.py::AsyncSession`).
    #[derive(Debug)]
    pub struct AsyncSession {
        params: ConnectParams,
        conn: AsyncConnection,
        retry: Option<RetryPolicy>,
    }

    impl AsyncSession {
        /// # Errors
        /// Whatever [`AsyncConnection::open`] can fail with.
        pub async fn open(params: ConnectParams) -> QResult<Self> {
            let retry = params.retry_policy().cloned();
            let conn = AsyncConnection::open(params.clone()).await?;
            Ok(Self { params, conn, retry })
        }

        #[must_use]
        pub fn connection(&self) -> &AsyncConnection {
            &self.conn
        }

        pub async fn close(&mut self) {
            self.conn.close().await;
        }

        async fn reconnect(&mut self) -> QResult<()> {
            self.conn.close().await;
            self.conn = AsyncConnection::open(self.params.clone()).await?;
            debug!("async session reconnected to {}", self.params);
            Ok(())
        }

        /// Run one `query` round trip, reopening and retrying on a
        /// retryable failure per the configured [`RetryPolicy`]. Kept
        /// non-generic (every public method here bottoms out in a
        /// `Connection::query` call returning `Value`) rather than
        /// threaded through a generic closure: an async closure that
        /// reborrows `&mut self.conn` per retry attempt needs either
        /// boxed futures or async closures, neither of which is worth
        /// it for a single call shape.
        async fn query_with_retry(&mut self, expr: &str, args: &[Value]) -> QResult<Value> {
            let Some(policy) = self.retry.clone() else {
                return self.conn.query(expr, args).await;
            };
            let mut attempt = 0;
            loop {
                match self.conn.query(expr, args).await {
                    Ok(v) => return Ok(v),
                    Err(e) => {
                        let retryable = policy.is_retryable.map_or_else(|| e.is_retryable(), |r| r(&e));
                        if retryable && attempt < policy.max_retries {
                            self.reconnect().await?;
                            tokio::time::sleep(policy.delay(attempt)).await;
                            attempt += 1;
                        } else {
                            return Err(e);
                        }
                    }
                }
            }
        }

        /// # Errors
        /// Transport errors, or `QError::Remote` for a server-side error.
        pub async fn raw(&mut self, q_expr: &str, args: &[Value]) -> QResult<Value> {
            debug!("async raw: {q_expr}");
            self.query_with_retry(q_expr, args).await
        }

        /// # Errors
        /// See [`Self::raw`].
        pub async fn exec(&mut self, query: &impl Compilable) -> QResult<Value> {
            let q_str = query.compile();
            debug!("async exec: {q_str}");
            self.query_with_retry(&q_str, &[]).await
        }

        /// # Errors
        /// See [`Self::raw`].
        pub async fn call(&mut self, func_name: &str, args: &[Value]) -> QResult<Value> {
            debug!("async call: {func_name}");
            self.query_with_retry(func_name, args).await
        }

        /// # Errors
        /// See [`Self::raw`].
        pub async fn create_table(&mut self, meta: &TableMeta) -> QResult<Value> {
            self.raw(&create_table_q(meta), &[]).await
        }

        /// # Errors
        /// See [`Self::raw`].
        pub async fn drop_table(&mut self, table: &str) -> QResult<Value> {
            self.raw(&drop_table_q(table), &[]).await
        }

        /// # Errors
        /// See [`Self::raw`].
        pub async fn table_exists(&mut self, table: &str) -> QResult<bool> {
            Ok(value_to_bool(&self.raw(&table_exists_q(table), &[]).await?))
        }

        /// # Errors
        /// See [`Self::raw`].
        pub async fn tables(&mut self) -> QResult<Vec<String>> {
            let result = self.raw("tables[]", &[]).await?;
            Ok(value_to_symbol_list(&result).unwrap_or_default())
        }

        /// # Errors
        /// `QError::Reflection` if `meta tablename` fails or its result
        /// doesn't parse as column metadata.
        pub async fn reflect(&mut self, table: &str) -> QResult<TableMeta> {
            let meta_data = self
                .raw(&table_meta_q(table), &[])
                .await
                .map_err(|e| QError::Reflection(format!("failed to get metadata for table {table:?}: {e}")))?;
            let pairs = parse_meta_result(&meta_data)?;
            let columns = pairs
                .into_iter()
                .map(|(name, type_char)| ColumnMeta::new(name, type_char))
                .collect();
            let keys = match self.raw(&format!("keys {table}"), &[]).await {
                Ok(v) => value_to_symbol_list(&v).unwrap_or_default(),
                Err(_) => Vec::new(),
            };
            Ok(TableMeta::new(table, columns).with_keys(keys))
        }

        /// # Errors
        /// See [`Self::reflect`].
        pub async fn reflect_all(&mut self) -> QResult<Schema> {
            let mut schema = Schema::new();
            for name in self.tables().await? {
                schema.insert(self.reflect(&name).await?);
            }
            Ok(schema)
        }

        /// Async counterpart of [`super::Session::listen`] (§4.S).
        /// `callback` stays synchronous: awaiting inside the per-message
        /// callback would need a boxed future for no benefit here, since
        /// nothing else runs concurrently with the listen loop itself.
        ///
        /// # Errors
        /// Transport errors while waiting for the next frame.
        pub async fn listen_async(&mut self, mut callback: impl FnMut(String, Value) -> bool) -> QResult<()> {
            loop {
                let msg = self.conn.listen_once().await?;
                match decode_push(msg) {
                    Some((table, payload)) => {
                        debug!("received update for {table}");
                        if !callback(table, payload) {
                            return Ok(());
                        }
                    }
                    None => debug!("received non-table push message"),
                }
            }
        }
    }

}

#[cfg(feature = "async")]
pub use async_session::AsyncSession;

#[cfg(all(test, feature = "sync"))]
mod tests {
    use super::*;
    use crate::value::{VecData, Vector};

    #[test]
    fn result_set_reads_columns_and_rows() {
        let table = Value::table(
            vec!["sym".to_string(), "price".to_string()],
            vec![
                Value::Vector(Vector::new(VecData::Symbol(vec!["AAPL".to_string(), "GOOG".to_string()]))),
                Value::Vector(Vector::new(VecData::Float(vec![150.25, 2800.0]))),
            ],
        );
        let rs = ResultSet::from_value(&table).expect("table value");
        assert_eq!(rs.len(), 2);
        assert_eq!(rs.columns(), &["sym".to_string(), "price".to_string()]);
        let row0 = rs.row(0).unwrap();
        assert_eq!(row0[0], ("sym".to_string(), Value::Symbol("AAPL".to_string())));
        assert_eq!(row0[1], ("price".to_string(), Value::Float(150.25)));
    }

    #[test]
    fn result_set_from_non_table_is_none() {
        assert!(ResultSet::from_value(&Value::Bool(true)).is_none());
    }

    #[test]
    fn decode_push_handles_three_and_two_element_frames() {
        let three = Value::List(vec![
            Value::Symbol("upd".to_string()),
            Value::Symbol("trade".to_string()),
            Value::Bool(true),
        ]);
        assert_eq!(decode_push(three), Some(("trade".to_string(), Value::Bool(true))));

        let two = Value::List(vec![Value::Symbol("trade".to_string()), Value::Bool(false)]);
        assert_eq!(decode_push(two), Some(("trade".to_string(), Value::Bool(false))));

        assert_eq!(decode_push(Value::Bool(true)), None);
    }
}
