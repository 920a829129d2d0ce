use std::collections::BTreeMap;

use serde_json::Value;

use crate::document::item::{escape_key, Item};
use crate::query::{Clause, Operator, Query};

/// One attribute condition in a scan filter.
#[derive(Clone, Debug, PartialEq)]
pub struct FilterCondition {
    /// Stored attribute name (already escaped).
    pub attribute: String,
    pub op: Operator,
    pub value: Value,
}

/// An AND-combined scan filter over flattened items.
///
/// This is what a [`DocumentClient`](super::DocumentClient) receives. Clients
/// talking to a real store send [`FilterExpression::render`]; in-process
/// clients can evaluate it directly with [`FilterExpression::matches`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FilterExpression {
    conditions: Vec<FilterCondition>,
}

/// Native expression string with its placeholder bindings.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RenderedFilter {
    /// `None` when the filter is empty (scan everything).
    pub expression: Option<String>,
    pub names: BTreeMap<String, String>,
    pub values: BTreeMap<String, Value>,
}

impl FilterExpression {
    /// Translate compiled query clauses onto stored attribute names.
    pub fn from_query(query: &Query) -> Self {
        let conditions = query
            .clauses()
            .iter()
            .map(|clause| FilterCondition {
                attribute: escape_key(&clause.field).into_owned(),
                op: clause.op,
                value: clause.operand.clone(),
            })
            .collect();
        Self { conditions }
    }

    pub fn conditions(&self) -> &[FilterCondition] {
        &self.conditions
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Render as `#a0 = :v0 AND contains(#a1, :v1)`, with attribute names and
    /// values bound through placeholders so user keys never need quoting.
    pub fn render(&self) -> RenderedFilter {
        let mut rendered = RenderedFilter::default();
        let mut terms = Vec::with_capacity(self.conditions.len());
        for (i, cond) in self.conditions.iter().enumerate() {
            let name = format!("#a{i}");
            let value = format!(":v{i}");
            terms.push(match cond.op {
                Operator::Equals => format!("{name} = {value}"),
                Operator::GreaterThan => format!("{name} > {value}"),
                Operator::GreaterOrEqual => format!("{name} >= {value}"),
                Operator::LessThan => format!("{name} < {value}"),
                Operator::LessOrEqual => format!("{name} <= {value}"),
                Operator::Contains => format!("contains({name}, {value})"),
            });
            rendered.names.insert(name, cond.attribute.clone());
            rendered.values.insert(value, cond.value.clone());
        }
        if !terms.is_empty() {
            rendered.expression = Some(terms.join(" AND "));
        }
        rendered
    }

    /// Evaluate against a stored item with the same semantics as
    /// [`Query::matches`].
    pub fn matches(&self, item: &Item) -> bool {
        let clauses = self
            .conditions
            .iter()
            .map(|cond| Clause::new(cond.attribute.clone(), cond.op, cond.value.clone()))
            .collect();
        Query::from_clauses(clauses).matches(item)
    }
}
