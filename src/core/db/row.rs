/// Row records
///
/// Every row of one result set shares the same column list, so the names are
/// kept once behind an `Arc` and each row only owns its values.

use crate::core::Result;
use rusqlite::types::{FromSql, Value, ValueRef};
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use std::sync::Arc;

use super::driver::ResultSet;

/// One result row, addressable by column name
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Arc<[String]>,
    values: Vec<Value>,
}

impl Row {
    pub fn new(columns: Arc<[String]>, values: Vec<Value>) -> Self {
        debug_assert_eq!(columns.len(), values.len());
        Row { columns, values }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Raw value of the named column. With duplicate names the first wins.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.position(name).map(|i| &self.values[i])
    }

    /// Converts the named column with the driver's `FromSql` rules.
    pub fn get_as<T: FromSql>(&self, name: &str) -> Result<T> {
        let value = self
            .get(name)
            .ok_or_else(|| rusqlite::Error::InvalidColumnName(name.to_string()))?;
        Ok(T::column_result(ValueRef::from(value))?)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns.iter().map(String::as_str).zip(self.values.iter())
    }

    /// Renders the row as a JSON object with keys in column order.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (name, value) in self.iter() {
            match value {
                Value::Null => map.serialize_entry(name, &())?,
                Value::Integer(i) => map.serialize_entry(name, i)?,
                Value::Real(f) => map.serialize_entry(name, f)?,
                Value::Text(s) => map.serialize_entry(name, s)?,
                Value::Blob(b) => map.serialize_entry(name, b)?,
            }
        }
        map.end()
    }
}

/// Splits a driver result set into rows sharing one column list.
pub fn rows_from(result: ResultSet) -> Vec<Row> {
    let columns: Arc<[String]> = result.columns.into();
    result
        .rows
        .into_iter()
        .map(|values| Row::new(Arc::clone(&columns), values))
        .collect()
}
