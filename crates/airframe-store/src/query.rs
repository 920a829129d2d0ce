//! Mongo-style predicate queries over object data.
//!
//! A raw query is a JSON object mapping field names to either a scalar
//! (shorthand for equality) or a single-entry `{operator: operand}` object:
//!
//! ```json
//! {"name": "Ann", "age": {"gte": 20}, "tags": {"contains": "admin"}}
//! ```
//!
//! Clauses are AND-combined. There is no `$or`/`$not` composition.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use airframe_types::Payload;
use serde_json::Value;

use crate::error::{StoreError, StoreResult};

/// Comparison applied by a single clause.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operator {
    Equals,
    GreaterThan,
    GreaterOrEqual,
    LessThan,
    LessOrEqual,
    Contains,
}

impl Operator {
    /// The name used in raw queries.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Equals => "eq",
            Self::GreaterThan => "gt",
            Self::GreaterOrEqual => "gte",
            Self::LessThan => "lt",
            Self::LessOrEqual => "lte",
            Self::Contains => "contains",
        }
    }

    /// Ordering operators only apply to numbers.
    pub fn is_ordering(&self) -> bool {
        matches!(
            self,
            Self::GreaterThan | Self::GreaterOrEqual | Self::LessThan | Self::LessOrEqual
        )
    }
}

impl FromStr for Operator {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "eq" => Ok(Self::Equals),
            "gt" => Ok(Self::GreaterThan),
            "gte" => Ok(Self::GreaterOrEqual),
            "lt" => Ok(Self::LessThan),
            "lte" => Ok(Self::LessOrEqual),
            "contains" => Ok(Self::Contains),
            other => Err(StoreError::UnknownOperator(other.to_string())),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One compiled predicate: `data[field] <op> operand`.
#[derive(Clone, Debug, PartialEq)]
pub struct Clause {
    pub field: String,
    pub op: Operator,
    pub operand: Value,
}

impl Clause {
    pub fn new(field: impl Into<String>, op: Operator, operand: Value) -> Self {
        Self { field: field.into(), op, operand }
    }

    /// Evaluate against an object's data.
    ///
    /// A missing field equals only `null` and fails every other operator.
    /// Applying an operator to a field of the wrong type yields
    /// [`StoreError::TypeMismatch`].
    pub fn evaluate(&self, data: &Payload) -> StoreResult<bool> {
        let Some(value) = data.get(&self.field) else {
            return Ok(self.op == Operator::Equals && self.operand.is_null());
        };
        match self.op {
            Operator::Equals => Ok(values_equal(value, &self.operand)),
            Operator::Contains => {
                contains(value, &self.operand).ok_or_else(|| self.mismatch("string or array"))
            }
            op => {
                let ord = compare_numbers(value, &self.operand)
                    .ok_or_else(|| self.mismatch("number"))?;
                Ok(match op {
                    Operator::GreaterThan => ord == Ordering::Greater,
                    Operator::GreaterOrEqual => ord != Ordering::Less,
                    Operator::LessThan => ord == Ordering::Less,
                    _ => ord != Ordering::Greater,
                })
            }
        }
    }

    fn mismatch(&self, expected: &'static str) -> StoreError {
        StoreError::TypeMismatch { field: self.field.clone(), expected }
    }
}

/// A normalized, AND-combined list of clauses.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Query {
    clauses: Vec<Clause>,
}

impl Query {
    /// The empty query, matching every object.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn from_clauses(clauses: Vec<Clause>) -> Self {
        Self { clauses }
    }

    /// Compile a raw query document.
    pub fn compile(raw: &Value) -> StoreResult<Self> {
        let Value::Object(fields) = raw else {
            return Err(StoreError::InvalidQuery("query must be a JSON object".into()));
        };
        let mut clauses = Vec::with_capacity(fields.len());
        for (field, condition) in fields {
            let clause = match condition {
                Value::Object(ops) => {
                    let mut entries = ops.iter();
                    let (name, operand) = match (entries.next(), entries.next()) {
                        (Some(entry), None) => entry,
                        _ => {
                            return Err(StoreError::InvalidQuery(format!(
                                "field {field:?} must name exactly one operator"
                            )))
                        }
                    };
                    let op: Operator = name.parse()?;
                    if op.is_ordering() && !operand.is_number() {
                        return Err(StoreError::InvalidQuery(format!(
                            "operator {op} on {field:?} needs a numeric operand"
                        )));
                    }
                    Clause::new(field.clone(), op, operand.clone())
                }
                scalar => Clause::new(field.clone(), Operator::Equals, scalar.clone()),
            };
            clauses.push(clause);
        }
        Ok(Self { clauses })
    }

    /// Compile from a JSON string. An empty or blank string is the empty
    /// query.
    pub fn from_json(raw: &str) -> StoreResult<Self> {
        if raw.trim().is_empty() {
            return Ok(Self::all());
        }
        let value: Value = serde_json::from_str(raw)
            .map_err(|e| StoreError::InvalidQuery(e.to_string()))?;
        Self::compile(&value)
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// `true` iff every clause matches. A clause that hits a type mismatch
    /// counts as not matching; it never fails the whole query.
    pub fn matches(&self, data: &Payload) -> bool {
        self.clauses.iter().all(|clause| match clause.evaluate(data) {
            Ok(matched) => matched,
            Err(err) => {
                tracing::trace!(field = %clause.field, op = %clause.op, %err, "clause skipped");
                false
            }
        })
    }
}

/// Numbers compare by value (`1 == 1.0`), everything else structurally.
pub(crate) fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(_), Value::Number(_)) => compare_numbers(a, b) == Some(Ordering::Equal),
        _ => a == b,
    }
}

fn compare_numbers(a: &Value, b: &Value) -> Option<Ordering> {
    let (Value::Number(x), Value::Number(y)) = (a, b) else {
        return None;
    };
    if let (Some(x), Some(y)) = (x.as_i64(), y.as_i64()) {
        return Some(x.cmp(&y));
    }
    if let (Some(x), Some(y)) = (x.as_u64(), y.as_u64()) {
        return Some(x.cmp(&y));
    }
    x.as_f64()?.partial_cmp(&y.as_f64()?)
}

/// `None` when the field type does not support `contains`.
fn contains(haystack: &Value, needle: &Value) -> Option<bool> {
    match (haystack, needle) {
        (Value::String(s), Value::String(sub)) => Some(s.contains(sub.as_str())),
        (Value::String(_), _) => None,
        (Value::Array(items), Value::Array(seq)) => {
            if seq.is_empty() {
                return Some(true);
            }
            Some(items.windows(seq.len()).any(|window| {
                window.iter().zip(seq).all(|(a, b)| values_equal(a, b))
            }))
        }
        (Value::Array(items), elem) => Some(items.iter().any(|item| values_equal(item, elem))),
        _ => None,
    }
}
