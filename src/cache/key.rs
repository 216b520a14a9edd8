//! Cache keys.
//!
//! A key is `(family, operation, params, epoch)`. Parameters are reduced to a
//! canonical JSON form (object members sorted, `null` members dropped) so
//! that two deep-equal parameter objects always collide, however they were
//! built.

use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fmt::Write as _;

/// Resource family; the unit of refresh-epoch granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Family {
  Orders,
  Products,
  Customers,
  Dashboard,
}

impl Family {
  pub const ALL: [Family; 4] = [
    Family::Orders,
    Family::Products,
    Family::Customers,
    Family::Dashboard,
  ];

  pub fn as_str(self) -> &'static str {
    match self {
      Family::Orders => "orders",
      Family::Products => "products",
      Family::Customers => "customers",
      Family::Dashboard => "dashboard",
    }
  }

  pub(crate) fn index(self) -> usize {
    match self {
      Family::Orders => 0,
      Family::Products => 1,
      Family::Customers => 2,
      Family::Dashboard => 3,
    }
  }
}

/// What a cached read fetches within its family.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Operation {
  List,
  /// Accumulated pages of a paginated list
  Infinite,
  Detail(String),
  Stats,
  Barcode(String),
  Categories,
  Summary,
  TopProducts,
  SalesReport,
}

impl Operation {
  fn label(&self) -> String {
    match self {
      Operation::List => "list".to_string(),
      Operation::Infinite => "infinite".to_string(),
      Operation::Detail(id) => format!("detail:{}", id),
      Operation::Stats => "stats".to_string(),
      Operation::Barcode(code) => format!("barcode:{}", code),
      Operation::Categories => "categories".to_string(),
      Operation::Summary => "summary".to_string(),
      Operation::TopProducts => "topProducts".to_string(),
      Operation::SalesReport => "salesReport".to_string(),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
  family: Family,
  operation: Operation,
  params: String,
  epoch: Option<u64>,
}

impl QueryKey {
  /// A key without parameters and outside epoch control.
  pub fn new(family: Family, operation: Operation) -> Self {
    Self {
      family,
      operation,
      params: "{}".to_string(),
      epoch: None,
    }
  }

  /// Attach the caller's parameter object.
  ///
  /// Parameters that fail to serialize degrade to `null`, which still keys
  /// deterministically.
  pub fn with_params<P: Serialize>(mut self, params: &P) -> Self {
    let value = serde_json::to_value(params).unwrap_or(Value::Null);
    self.params = canonical_json(&value);
    self
  }

  /// Fold the family's refresh epoch into the key.
  pub fn with_epoch(mut self, epoch: u64) -> Self {
    self.epoch = Some(epoch);
    self
  }

  pub fn family(&self) -> Family {
    self.family
  }

  pub fn operation(&self) -> &Operation {
    &self.operation
  }

  pub fn epoch(&self) -> Option<u64> {
    self.epoch
  }

  /// Stable, fixed-length identifier used as the cache map key.
  pub fn cache_hash(&self) -> String {
    let input = format!(
      "{}|{}|{}|{}",
      self.family.as_str(),
      self.operation.label(),
      self.params,
      self.epoch.map(|e| e.to_string()).unwrap_or_default()
    );

    // SHA256 hash for stable, fixed-length keys
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
  }

  /// Human-readable form for logs.
  pub fn description(&self) -> String {
    let mut out = format!("{}/{}", self.family.as_str(), self.operation.label());
    if self.params != "{}" {
      let _ = write!(out, " {}", self.params);
    }
    if let Some(epoch) = self.epoch {
      let _ = write!(out, " @{}", epoch);
    }
    out
  }
}

/// Serialize with object members in key order and `null` members removed.
pub fn canonical_json(value: &Value) -> String {
  let mut out = String::new();
  write_canonical(value, &mut out);
  out
}

fn write_canonical(value: &Value, out: &mut String) {
  match value {
    Value::Object(map) => {
      let mut entries: Vec<(&String, &Value)> = map.iter().filter(|(_, v)| !v.is_null()).collect();
      entries.sort_by(|a, b| a.0.cmp(b.0));
      out.push('{');
      for (i, (key, v)) in entries.into_iter().enumerate() {
        if i > 0 {
          out.push(',');
        }
        out.push_str(&Value::String(key.clone()).to_string());
        out.push(':');
        write_canonical(v, out);
      }
      out.push('}');
    }
    Value::Array(items) => {
      out.push('[');
      for (i, v) in items.iter().enumerate() {
        if i > 0 {
          out.push(',');
        }
        write_canonical(v, out);
      }
      out.push(']');
    }
    other => out.push_str(&other.to_string()),
  }
}
