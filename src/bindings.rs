//! Caller input: the query, its parameters and their resolution into bindings.
//!
//! Parameters arrive in whatever shape the caller has (`Params`, an ordered
//! list of keyed values). They are resolved exactly once into [`Bindings`],
//! which is either positional or named; the rest of the engine only sees
//! that tagged form.

use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

use crate::error::{WardenError, WardenResult};
use crate::finding::{Finding, FindingCode};

/// A bound value with its runtime type.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum BoundValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl BoundValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            BoundValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            BoundValue::Null => "null",
            BoundValue::Bool(_) => "boolean",
            BoundValue::Int(_) => "integer",
            BoundValue::Float(_) => "float",
            BoundValue::String(_) => "string",
        }
    }

    /// Convert a JSON value. Arrays and objects become their JSON text.
    pub fn from_json(value: &serde_json::Value) -> Self {
        use serde_json::Value;
        match value {
            Value::Null => BoundValue::Null,
            Value::Bool(b) => BoundValue::Bool(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => BoundValue::Int(i),
                None => BoundValue::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => BoundValue::String(s.clone()),
            other => BoundValue::String(other.to_string()),
        }
    }
}

impl fmt::Display for BoundValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoundValue::Null => write!(f, "NULL"),
            BoundValue::Bool(b) => write!(f, "{}", b),
            BoundValue::Int(i) => write!(f, "{}", i),
            BoundValue::Float(x) => write!(f, "{}", x),
            BoundValue::String(s) => write!(f, "'{}'", s),
        }
    }
}

impl From<&str> for BoundValue {
    fn from(s: &str) -> Self {
        BoundValue::String(s.to_string())
    }
}

impl From<String> for BoundValue {
    fn from(s: String) -> Self {
        BoundValue::String(s)
    }
}

impl From<i64> for BoundValue {
    fn from(i: i64) -> Self {
        BoundValue::Int(i)
    }
}

impl From<i32> for BoundValue {
    fn from(i: i32) -> Self {
        BoundValue::Int(i64::from(i))
    }
}

impl From<f64> for BoundValue {
    fn from(x: f64) -> Self {
        BoundValue::Float(x)
    }
}

impl From<bool> for BoundValue {
    fn from(b: bool) -> Self {
        BoundValue::Bool(b)
    }
}

impl<T: Into<BoundValue>> From<Option<T>> for BoundValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(BoundValue::Null)
    }
}

/// How a caller keyed one parameter.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum ParamKey {
    /// 0-based sequential index.
    Index(usize),
    Name(String),
}

impl fmt::Display for ParamKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamKey::Index(i) => write!(f, "#{}", i + 1),
            ParamKey::Name(name) => write!(f, ":{}", name),
        }
    }
}

/// Parameters exactly as the caller supplied them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params {
    entries: Vec<(ParamKey, BoundValue)>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sequential parameters, keyed by position.
    pub fn positional<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<BoundValue>,
    {
        Self {
            entries: values
                .into_iter()
                .enumerate()
                .map(|(i, v)| (ParamKey::Index(i), v.into()))
                .collect(),
        }
    }

    /// Associative parameters, keyed by name (a leading `:` is accepted).
    pub fn named<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<BoundValue>,
    {
        Self {
            entries: pairs
                .into_iter()
                .map(|(k, v)| (ParamKey::Name(k.into()), v.into()))
                .collect(),
        }
    }

    pub fn push(&mut self, key: ParamKey, value: impl Into<BoundValue>) {
        self.entries.push((key, value.into()));
    }

    /// Decode parameters from JSON: an array is sequential, an object is
    /// keyed (all-digit keys count as sequential indexes), `null` is empty.
    pub fn from_json(value: &serde_json::Value) -> WardenResult<Self> {
        use serde_json::Value;
        match value {
            Value::Null => Ok(Self::new()),
            Value::Array(items) => Ok(Self::positional(items.iter().map(BoundValue::from_json))),
            Value::Object(map) => {
                let mut params = Self::new();
                for (key, v) in map {
                    let key = match key.parse::<usize>() {
                        Ok(i) if key.bytes().all(|b| b.is_ascii_digit()) => ParamKey::Index(i),
                        _ => ParamKey::Name(key.clone()),
                    };
                    params.push(key, BoundValue::from_json(v));
                }
                Ok(params)
            }
            other => Err(WardenError::InvalidParams(format!(
                "expected an array or an object, got {}",
                other
            ))),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ParamKey, &BoundValue)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    /// Resolve into bindings, or explain why the shape is malformed.
    pub fn resolve(&self) -> Result<Bindings, Finding> {
        let first_index = self.entries.iter().find_map(|(k, _)| match k {
            ParamKey::Index(i) => Some(*i),
            ParamKey::Name(_) => None,
        });
        let first_name = self.entries.iter().find_map(|(k, _)| match k {
            ParamKey::Name(n) => Some(n.as_str()),
            ParamKey::Index(_) => None,
        });

        match (first_index, first_name) {
            (Some(index), Some(name)) => Err(Finding::new(
                FindingCode::MalformedBindings,
                format!(
                    "Malformed bindings: parameters mix sequential and named keys (#{} and :{}). Use either a list or a map",
                    index + 1,
                    name.trim_start_matches(':')
                ),
            )),
            (_, Some(_)) => {
                let mut seen = BTreeSet::new();
                let mut named = Vec::with_capacity(self.entries.len());
                for (key, value) in &self.entries {
                    if let ParamKey::Name(raw) = key {
                        let name = raw.trim_start_matches(':');
                        if !seen.insert(name) {
                            return Err(Finding::new(
                                FindingCode::MalformedBindings,
                                format!("Malformed bindings: parameter :{} is supplied more than once", name),
                            ));
                        }
                        named.push((name.to_string(), value.clone()));
                    }
                }
                Ok(Bindings::Named(named))
            }
            _ => {
                let mut indexed: Vec<(usize, &BoundValue)> = self
                    .entries
                    .iter()
                    .filter_map(|(k, v)| match k {
                        ParamKey::Index(i) => Some((*i, v)),
                        ParamKey::Name(_) => None,
                    })
                    .collect();
                indexed.sort_by_key(|(i, _)| *i);
                if let Some(pair) = indexed.windows(2).find(|w| w[0].0 == w[1].0) {
                    return Err(Finding::new(
                        FindingCode::MalformedBindings,
                        format!("Malformed bindings: parameter #{} is supplied more than once", pair[0].0 + 1),
                    ));
                }
                Ok(Bindings::Positional(indexed.into_iter().map(|(_, v)| v.clone()).collect()))
            }
        }
    }
}

/// Parameters resolved to one binding protocol.
#[derive(Debug, Clone, PartialEq)]
pub enum Bindings {
    Positional(Vec<BoundValue>),
    /// Names are unique and stored without the leading `:`.
    Named(Vec<(String, BoundValue)>),
}

impl Bindings {
    pub fn len(&self) -> usize {
        match self {
            Bindings::Positional(values) => values.len(),
            Bindings::Named(pairs) => pairs.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn names(&self) -> BTreeSet<&str> {
        match self {
            Bindings::Positional(_) => BTreeSet::new(),
            Bindings::Named(pairs) => pairs.iter().map(|(n, _)| n.as_str()).collect(),
        }
    }

    pub fn get_named(&self, name: &str) -> Option<&BoundValue> {
        match self {
            Bindings::Named(pairs) => pairs.iter().find(|(n, _)| n == name).map(|(_, v)| v),
            Bindings::Positional(_) => None,
        }
    }

    pub fn get_positional(&self, index: usize) -> Option<&BoundValue> {
        match self {
            Bindings::Positional(values) => values.get(index),
            Bindings::Named(_) => None,
        }
    }
}

/// A query handed to the guard.
#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    /// A bare SQL string with no parameter container at all.
    Raw(String),
    Prepared { sql: String, params: Params },
}

impl Query {
    pub fn raw(sql: impl Into<String>) -> Self {
        Query::Raw(sql.into())
    }

    pub fn prepared(sql: impl Into<String>, params: Params) -> Self {
        Query::Prepared {
            sql: sql.into(),
            params,
        }
    }

    pub fn sql(&self) -> &str {
        match self {
            Query::Raw(sql) => sql,
            Query::Prepared { sql, .. } => sql,
        }
    }

    pub fn params(&self) -> Option<&Params> {
        match self {
            Query::Raw(_) => None,
            Query::Prepared { params, .. } => Some(params),
        }
    }

    /// Decode `"SELECT ..."` or `{"sql": "...", "params": [...]}`.
    pub fn from_json(value: &serde_json::Value) -> WardenResult<Self> {
        use serde_json::Value;
        match value {
            Value::String(sql) => Ok(Query::raw(sql.clone())),
            Value::Object(map) => {
                let sql = map
                    .get("sql")
                    .and_then(Value::as_str)
                    .ok_or_else(|| WardenError::InvalidParams("missing string field 'sql'".into()))?;
                let params = map.get("params").map(Params::from_json).transpose()?.unwrap_or_default();
                Ok(Query::prepared(sql, params))
            }
            other => Err(WardenError::InvalidParams(format!(
                "expected a SQL string or an object with 'sql', got {}",
                other
            ))),
        }
    }
}

impl From<&str> for Query {
    fn from(sql: &str) -> Self {
        Query::raw(sql)
    }
}

impl From<String> for Query {
    fn from(sql: String) -> Self {
        Query::Raw(sql)
    }
}

/// What the reconciler has to compare placeholders against.
#[derive(Debug, Clone, PartialEq)]
pub enum Supplied {
    /// No params container: the query came as a bare string.
    Raw,
    /// A container whose shape could not be resolved.
    Malformed,
    Bound(Bindings),
}

impl Supplied {
    /// Resolve the query's parameters, returning the malformed-shape finding if any.
    pub fn from_query(query: &Query) -> (Self, Option<Finding>) {
        match query.params() {
            None => (Supplied::Raw, None),
            Some(params) => match params.resolve() {
                Ok(bindings) => (Supplied::Bound(bindings), None),
                Err(finding) => (Supplied::Malformed, Some(finding)),
            },
        }
    }

    pub fn bindings(&self) -> Option<&Bindings> {
        match self {
            Supplied::Bound(bindings) => Some(bindings),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_positional_resolution() {
        let params = Params::positional(["John", "j@x.com"]);
        assert_eq!(
            params.resolve().unwrap(),
            Bindings::Positional(vec!["John".into(), "j@x.com".into()])
        );
    }

    #[test]
    fn test_named_strips_colon() {
        let params = Params::named([(":email", BoundValue::from("a@b.c")), ("status", "on".into())]);
        let bindings = params.resolve().unwrap();
        assert_eq!(bindings.names().into_iter().collect::<Vec<_>>(), vec!["email", "status"]);
        assert_eq!(bindings.get_named("email"), Some(&BoundValue::from("a@b.c")));
    }

    #[test]
    fn test_mixed_keys_are_malformed() {
        let mut params = Params::positional([1]);
        params.push(ParamKey::Name("email".into()), "x");
        let finding = params.resolve().unwrap_err();
        assert_eq!(finding.code, FindingCode::MalformedBindings);
        assert!(finding.message.contains("#1"));
        assert!(finding.message.contains(":email"));
    }

    #[test]
    fn test_duplicate_names_are_malformed() {
        let params = Params::named([("id", 1), (":id", 2)]);
        let finding = params.resolve().unwrap_err();
        assert!(finding.message.contains(":id is supplied more than once"));
    }

    #[test]
    fn test_json_object_with_digit_keys_is_sequential() {
        let params = Params::from_json(&json!({"1": "b", "0": "a"})).unwrap();
        assert_eq!(
            params.resolve().unwrap(),
            Bindings::Positional(vec!["a".into(), "b".into()])
        );
    }

    #[test]
    fn test_json_mixed_object_is_malformed() {
        let params = Params::from_json(&json!({"0": 1, "email": "x"})).unwrap();
        assert!(params.resolve().is_err());
    }

    #[test]
    fn test_json_scalar_params_rejected() {
        assert!(Params::from_json(&json!(42)).is_err());
    }

    #[test]
    fn test_bound_value_types() {
        assert_eq!(BoundValue::from_json(&json!(3)), BoundValue::Int(3));
        assert_eq!(BoundValue::from_json(&json!(1.5)), BoundValue::Float(1.5));
        assert_eq!(BoundValue::from_json(&json!([1])), BoundValue::String("[1]".into()));
        assert_eq!(BoundValue::from(None::<i64>), BoundValue::Null);
        assert_eq!(BoundValue::Int(1).type_name(), "integer");
    }

    #[test]
    fn test_query_from_json() {
        let raw = Query::from_json(&json!("SELECT 1")).unwrap();
        assert_eq!(raw, Query::raw("SELECT 1"));

        let prepared = Query::from_json(&json!({"sql": "SELECT ?", "params": [1]})).unwrap();
        assert_eq!(prepared.params().map(Params::len), Some(1));

        assert!(Query::from_json(&json!({"params": []})).is_err());
    }

    #[test]
    fn test_supplied_from_query() {
        assert_eq!(Supplied::from_query(&Query::raw("SELECT 1")).0, Supplied::Raw);

        let (supplied, finding) = Supplied::from_query(&Query::prepared("SELECT ?", Params::positional([1])));
        assert!(finding.is_none());
        assert_eq!(supplied.bindings().map(Bindings::len), Some(1));
    }
}
