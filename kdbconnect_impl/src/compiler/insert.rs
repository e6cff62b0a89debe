//! Batch insert builder with row-to-column transpose (§4.K).
//!
//! Grounded on `query/insert.py::InsertQuery`/`_compile_column_vector`.
//! The reference transposes declarative-model row instances into
//! per-type q vector literals; since the model/fields layer is out of
//! scope here (Non-goal), callers supply already column-oriented data
//! directly through [`ColumnValues`].

use time::{Date, PrimitiveDateTime, Time};
use uuid::Uuid;

/// One column's worth of values, tagged by the q type they'll be
/// serialized as. Each variant's formatting matches the corresponding
/// branch of `_compile_column_vector`, including its null token.
#[derive(Clone, Debug)]
pub enum ColumnValues {
    Symbol(Vec<Option<String>>),
    Float(Vec<Option<f64>>),
    Long(Vec<Option<i64>>),
    Int(Vec<Option<i32>>),
    Short(Vec<Option<i16>>),
    Boolean(Vec<bool>),
    Timestamp(Vec<Option<PrimitiveDateTime>>),
    Date(Vec<Option<Date>>),
    Time(Vec<Option<Time>>),
    Char(Vec<Option<char>>),
    Guid(Vec<Option<Uuid>>),
}

impl ColumnValues {
    fn compile(&self) -> String {
        match self {
            ColumnValues::Symbol(values) => {
                let syms: Vec<String> = values
                    .iter()
                    .map(|v| match v {
                        Some(s) => format!("`{}", q_escape(s)),
                        None => "`".to_string(),
                    })
                    .collect();
                if syms.len() > 1 {
                    format!("({})", syms.join(";"))
                } else {
                    syms.first().cloned().unwrap_or_default()
                }
            }
            ColumnValues::Float(values) => values
                .iter()
                .map(|v| match v {
                    Some(f) if f.is_nan() => "0n".to_string(),
                    Some(f) => format!("{f}f"),
                    None => "0n".to_string(),
                })
                .collect::<Vec<_>>()
                .join(" "),
            ColumnValues::Long(values) => values
                .iter()
                .map(|v| v.map_or_else(|| "0N".to_string(), |x| x.to_string()))
                .collect::<Vec<_>>()
                .join(" "),
            ColumnValues::Int(values) => values
                .iter()
                .map(|v| v.map_or_else(|| "0Ni".to_string(), |x| format!("{x}i")))
                .collect::<Vec<_>>()
                .join(" "),
            ColumnValues::Short(values) => values
                .iter()
                .map(|v| v.map_or_else(|| "0Nh".to_string(), |x| format!("{x}h")))
                .collect::<Vec<_>>()
                .join(" "),
            ColumnValues::Boolean(values) => {
                let bits: String = values.iter().map(|v| if *v { '1' } else { '0' }).collect();
                format!("{bits}b")
            }
            ColumnValues::Timestamp(values) => {
                let parts: Vec<String> = values
                    .iter()
                    .map(|v| match v {
                        None => "0Np".to_string(),
                        Some(dt) => format!("{}T{}", dt.date(), dt.time()),
                    })
                    .collect();
                format!("({})", parts.join(";"))
            }
            ColumnValues::Date(values) => {
                let parts: Vec<String> = values
                    .iter()
                    .map(|v| v.map_or_else(|| "0Nd".to_string(), |d| d.to_string()))
                    .collect();
                format!("({})", parts.join(";"))
            }
            ColumnValues::Time(values) => {
                let parts: Vec<String> = values
                    .iter()
                    .map(|v| v.map_or_else(|| "0Nt".to_string(), |t| t.to_string()))
                    .collect();
                format!("({})", parts.join(";"))
            }
            ColumnValues::Char(values) => {
                let chars: String = values.iter().map(|v| v.unwrap_or(' ')).collect();
                format!("\"{chars}\"")
            }
            ColumnValues::Guid(values) => {
                let parts: Vec<String> = values
                    .iter()
                    .map(|v| match v {
                        None => "0Ng".to_string(),
                        Some(u) => format!("\"{u}\""),
                    })
                    .collect();
                format!("({})", parts.join(";"))
            }
        }
    }
}

fn q_escape(s: &str) -> String {
    s.replace('`', "")
}

/// Batch insert builder (`query/insert.py::InsertQuery`).
#[derive(Clone, Debug, Default)]
pub struct InsertBuilder {
    table: String,
    columns: Vec<(String, ColumnValues)>,
}

impl InsertBuilder {
    #[must_use]
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            columns: Vec::new(),
        }
    }

    #[must_use]
    pub fn column(mut self, name: impl Into<String>, values: ColumnValues) -> Self {
        self.columns.push((name.into(), values));
        self
    }

    /// Compile to a q insert expression: `` `table insert (col1;col2;...) ``.
    #[must_use]
    pub fn compile(&self) -> String {
        if self.columns.is_empty() {
            return format!("`{} insert ()", self.table);
        }
        let cols_q: String = self
            .columns
            .iter()
            .map(|(_, values)| values.compile())
            .collect::<Vec<_>>()
            .join(";");
        format!("`{} insert ({cols_q})", self.table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_insert_uses_unit() {
        let q = InsertBuilder::new("trade");
        assert_eq!(q.compile(), "`trade insert ()");
    }

    #[test]
    fn single_row_symbol_unwraps() {
        let q = InsertBuilder::new("trade")
            .column("sym", ColumnValues::Symbol(vec![Some("AAPL".to_string())]));
        assert_eq!(q.compile(), "`trade insert (`AAPL)");
    }

    #[test]
    fn multi_row_long_space_joins_with_null() {
        let q = InsertBuilder::new("trade").column("size", ColumnValues::Long(vec![Some(100), None, Some(50)]));
        assert_eq!(q.compile(), "`trade insert (100 0N 50)");
    }

    #[test]
    fn boolean_column_renders_as_bit_string() {
        let q = InsertBuilder::new("trade").column("live", ColumnValues::Boolean(vec![true, false, true]));
        assert_eq!(q.compile(), "`trade insert (101b)");
    }

    #[test]
    fn multiple_columns_semicolon_joined() {
        let q = InsertBuilder::new("trade")
            .column("sym", ColumnValues::Symbol(vec![Some("AAPL".into()), Some("GOOG".into())]))
            .column("price", ColumnValues::Float(vec![Some(150.25), Some(2800.0)]));
        assert_eq!(q.compile(), "`trade insert ((`AAPL;`GOOG);150.25f 2800f)");
    }
}
