//! Table/column metadata contract and DDL generation (§4.R Schema
//! contract, §4.K table DDL helpers).
//!
//! Grounded on `model/schema.py` (DDL generators) and
//! `model/reflect.py::_parse_meta_result` (parsing `meta tablename`
//! output). The declarative `Model`/`Field` layer those files build on
//! is out of scope (Non-goal) — this module takes explicit column
//! metadata instead of a model class, keeping this crate's side of the
//! contract to "supply names, type chars and attributes", nothing more.

use std::collections::HashMap;

use crate::error::{QError, QResult};
use crate::value::{Attribute, Value};

/// One column's metadata, as seen in q's `meta` output or supplied
/// ahead of time for DDL generation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColumnMeta {
    pub name: String,
    /// The q type character (`j`, `f`, `s`, ...; a space for a mixed
    /// list column).
    pub type_char: char,
    pub attribute: Attribute,
}

impl ColumnMeta {
    #[must_use]
    pub fn new(name: impl Into<String>, type_char: char) -> Self {
        Self {
            name: name.into(),
            type_char,
            attribute: Attribute::None,
        }
    }

    #[must_use]
    pub fn with_attribute(mut self, attribute: Attribute) -> Self {
        self.attribute = attribute;
        self
    }
}

/// A table's column layout and key columns, as reflected from the
/// server or declared ahead of a `create_table_q` call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TableMeta {
    pub name: String,
    pub columns: Vec<ColumnMeta>,
    pub keys: Vec<String>,
}

impl TableMeta {
    #[must_use]
    pub fn new(name: impl Into<String>, columns: Vec<ColumnMeta>) -> Self {
        Self {
            name: name.into(),
            columns,
            keys: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_keys(mut self, keys: Vec<String>) -> Self {
        self.keys = keys;
        self
    }
}

fn attr_prefix(attr: Attribute) -> &'static str {
    match attr {
        Attribute::None => "",
        Attribute::Sorted => "`s#",
        Attribute::Unique => "`u#",
        Attribute::Parted => "`p#",
        Attribute::Grouped => "`g#",
    }
}

/// Generate the q expression to create a table (`model/schema.py::create_table_q`):
/// `trade:([] sym:`symbol$(); price:`float$())`, or, for keyed tables,
/// `daily_price:([sym:`symbol$()] close:`float$())`.
#[must_use]
pub fn create_table_q(meta: &TableMeta) -> String {
    let key_set: std::collections::HashSet<&str> = meta.keys.iter().map(String::as_str).collect();
    let mut key_parts = Vec::new();
    let mut val_parts = Vec::new();

    for col in &meta.columns {
        let attr_str = attr_prefix(col.attribute);
        let def = if col.type_char == ' ' {
            format!("{}:{attr_str}()", col.name)
        } else {
            format!("{}:{attr_str}`{}$()", col.name, col.type_char)
        };
        if key_set.contains(col.name.as_str()) {
            key_parts.push(def);
        } else {
            val_parts.push(def);
        }
    }

    let key_section = if key_parts.is_empty() {
        "[]".to_string()
    } else {
        format!("[{}]", key_parts.join("; "))
    };
    let val_section = val_parts.join("; ");
    format!("{}:({key_section} {val_section})", meta.name)
}

/// `delete tablename from `.`
#[must_use]
pub fn drop_table_q(table: &str) -> String {
    format!("delete {table} from `.")
}

/// `meta tablename`
#[must_use]
pub fn table_meta_q(table: &str) -> String {
    format!("meta {table}")
}

/// `count tablename`
#[must_use]
pub fn table_count_q(table: &str) -> String {
    format!("count {table}")
}

/// `` `tablename in tables[] ``
#[must_use]
pub fn table_exists_q(table: &str) -> String {
    format!("`{table} in tables[]")
}

/// Parse the deserialized result of `meta tablename` into
/// `(column_name, type_char)` pairs, matching
/// `model/reflect.py::_parse_meta_result`. Accepts both the flat-dict
/// shape (a dict with entries `c`/`t`/`f`/`a`) and the keyed-table
/// shape (a dict of `Table!Table`, `c` in the key table and `t` in the
/// value table).
///
/// # Errors
/// `QError::Reflection` if the result isn't a dict, is missing `c`/`t`,
/// or the column and type-char counts disagree.
pub fn parse_meta_result(meta_data: &Value) -> QResult<Vec<(String, char)>> {
    let Value::Dict(keys, values) = meta_data else {
        return Err(QError::Reflection(format!(
            "expected dict from meta, got {:?}",
            meta_data.type_code()
        )));
    };

    let (columns, type_chars) = if keys.as_table().is_some() && values.as_table().is_some() {
        let columns = table_column_symbols(keys, "c")
            .ok_or_else(|| QError::Reflection("meta result missing 'c'".into()))?;
        let type_chars = table_column_chars(values, "t")
            .ok_or_else(|| QError::Reflection("meta result missing 't'".into()))?;
        (columns, type_chars)
    } else {
        let columns = dict_field_symbols(meta_data, "c")
            .ok_or_else(|| QError::Reflection("meta result missing 'c'".into()))?;
        let type_chars = dict_field_chars(meta_data, "t")
            .ok_or_else(|| QError::Reflection("meta result missing 't'".into()))?;
        (columns, type_chars)
    };

    if columns.len() != type_chars.len() {
        return Err(QError::Reflection(format!(
            "column count ({}) != type char count ({})",
            columns.len(),
            type_chars.len()
        )));
    }

    Ok(columns.into_iter().zip(type_chars).collect())
}

fn dict_field<'a>(dict_value: &'a Value, field: &str) -> Option<&'a Value> {
    let Value::Dict(keys, values) = dict_value else {
        return None;
    };
    let Value::Vector(crate::value::Vector {
        data: crate::value::VecData::Symbol(names),
        ..
    }) = keys.as_ref()
    else {
        return None;
    };
    let Value::List(items) = values.as_ref() else {
        return None;
    };
    let idx = names.iter().position(|n| n == field)?;
    items.get(idx)
}

fn dict_field_symbols(dict_value: &Value, field: &str) -> Option<Vec<String>> {
    match dict_field(dict_value, field)? {
        Value::Vector(v) => match &v.data {
            crate::value::VecData::Symbol(names) => Some(names.clone()),
            _ => None,
        },
        _ => None,
    }
}

fn dict_field_chars(dict_value: &Value, field: &str) -> Option<Vec<char>> {
    match dict_field(dict_value, field)? {
        Value::Vector(v) => match &v.data {
            crate::value::VecData::Char(s) => Some(s.chars().collect()),
            _ => None,
        },
        _ => None,
    }
}

fn table_column_symbols(table_value: &Value, field: &str) -> Option<Vec<String>> {
    let (names, columns) = table_value.as_table()?;
    let idx = names.iter().position(|n| n == field)?;
    match &columns[idx] {
        Value::Vector(v) => match &v.data {
            crate::value::VecData::Symbol(names) => Some(names.clone()),
            _ => None,
        },
        _ => None,
    }
}

fn table_column_chars(table_value: &Value, field: &str) -> Option<Vec<char>> {
    let (names, columns) = table_value.as_table()?;
    let idx = names.iter().position(|n| n == field)?;
    match &columns[idx] {
        Value::Vector(v) => match &v.data {
            crate::value::VecData::Char(s) => Some(s.chars().collect()),
            _ => None,
        },
        _ => None,
    }
}

/// A lightweight in-process registry of reflected table schemas
/// (§4.R), populated by `Session::reflect_all`.
#[derive(Clone, Debug, Default)]
pub struct Schema {
    tables: HashMap<String, TableMeta>,
}

impl Schema {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, meta: TableMeta) {
        self.tables.insert(meta.name.clone(), meta);
    }

    #[must_use]
    pub fn get(&self, table: &str) -> Option<&TableMeta> {
        self.tables.get(table)
    }

    #[must_use]
    pub fn table_names(&self) -> Vec<&str> {
        self.tables.keys().map(String::as_str).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_table_q_matches_reference_shape() {
        let meta = TableMeta::new(
            "trade",
            vec![
                ColumnMeta::new("sym", 's'),
                ColumnMeta::new("price", 'f'),
                ColumnMeta::new("size", 'j'),
            ],
        );
        assert_eq!(
            create_table_q(&meta),
            "trade:([] sym:`s$(); price:`f$(); size:`j$())"
        );
    }

    #[test]
    fn create_table_q_with_keys_uses_bracketed_key_section() {
        let meta = TableMeta::new(
            "daily_price",
            vec![ColumnMeta::new("sym", 's'), ColumnMeta::new("close", 'f')],
        )
        .with_keys(vec!["sym".to_string()]);
        assert_eq!(
            create_table_q(&meta),
            "daily_price:([sym:`s$()] close:`f$())"
        );
    }

    #[test]
    fn drop_table_q_deletes_from_dot() {
        assert_eq!(drop_table_q("trade"), "delete trade from `.");
    }

    #[test]
    fn table_exists_q_checks_tables_list() {
        assert_eq!(table_exists_q("trade"), "`trade in tables[]");
    }

    #[test]
    fn parses_flat_dict_meta_shape() {
        use crate::value::{VecData, Vector};

        let meta = Value::Dict(
            Box::new(Value::Vector(Vector::new(VecData::Symbol(vec![
                "c".to_string(),
                "t".to_string(),
            ])))),
            Box::new(Value::List(vec![
                Value::Vector(Vector::new(VecData::Symbol(vec![
                    "sym".to_string(),
                    "price".to_string(),
                ]))),
                Value::Vector(Vector::new(VecData::Char("sf".to_string()))),
            ])),
        );
        let parsed = parse_meta_result(&meta).unwrap();
        assert_eq!(
            parsed,
            vec![("sym".to_string(), 's'), ("price".to_string(), 'f')]
        );
    }
}
