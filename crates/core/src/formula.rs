//! Airtable `filterByFormula` assembly.
//!
//! Filters are modeled as a list of predicates combined with a logical AND
//! instead of ad hoc string concatenation, so the query shape is unit
//! testable without a live base and user input cannot break out of its
//! quoted position.

use crate::domain::ProjectFilters;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Predicate {
    /// Case-insensitive substring search across one or more text fields,
    /// combined with OR.
    TextSearch { term: String, fields: Vec<String> },
    /// Exact match on a single-value field.
    Equals { field: String, value: String },
    /// Membership test on a multi-value field.
    SetContains { field: String, value: String },
}

impl Predicate {
    fn render(&self) -> String {
        match self {
            Self::TextSearch { term, fields } => {
                let term = escape(term);
                let clauses: Vec<String> = fields
                    .iter()
                    .map(|field| format!("FIND(LOWER(\"{term}\"),LOWER({{{field}}}))"))
                    .collect();
                match clauses.len() {
                    1 => clauses.into_iter().next().unwrap_or_default(),
                    _ => format!("OR({})", clauses.join(",")),
                }
            }
            Self::Equals { field, value } => {
                format!("{{{field}}}=\"{}\"", escape(value))
            }
            Self::SetContains { field, value } => {
                format!("FIND(\"{}\",ARRAYJOIN({{{field}}}))", escape(value))
            }
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Formula {
    predicates: Vec<Predicate>,
}

impl Formula {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, predicate: Predicate) -> &mut Self {
        self.predicates.push(predicate);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    /// Renders the AND combination, or `None` when no predicate is active
    /// (Airtable then returns the unfiltered table).
    pub fn render(&self) -> Option<String> {
        let mut rendered = self.predicates.iter().map(Predicate::render);
        match self.predicates.len() {
            0 => None,
            1 => rendered.next(),
            _ => Some(format!("AND({})", rendered.collect::<Vec<_>>().join(","))),
        }
    }
}

/// Builds the formula for an active filter set. Search terms look at both
/// `Initiative` and `Description`; the remaining dimensions narrow with AND.
pub fn filters_formula(filters: &ProjectFilters) -> Option<String> {
    let mut formula = Formula::new();

    if let Some(search) = filters.search.as_deref().map(str::trim).filter(|term| !term.is_empty()) {
        formula.push(Predicate::TextSearch {
            term: search.to_string(),
            fields: vec!["Initiative".to_string(), "Description".to_string()],
        });
    }
    if let Some(status) = filters.status.as_deref() {
        formula.push(Predicate::Equals { field: "Status".to_string(), value: status.to_string() });
    }
    if let Some(priority) = filters.priority.as_deref() {
        formula
            .push(Predicate::Equals { field: "Priority".to_string(), value: priority.to_string() });
    }
    if let Some(business_unit) = filters.business_unit.as_deref() {
        formula.push(Predicate::SetContains {
            field: "Related BU".to_string(),
            value: business_unit.to_string(),
        });
    }
    if let Some(objective) = filters.objective.as_deref() {
        formula.push(Predicate::SetContains {
            field: "Related OKR".to_string(),
            value: objective.to_string(),
        });
    }
    if let Some(owner) = filters.owner.as_deref() {
        formula.push(Predicate::SetContains {
            field: "Project Owners".to_string(),
            value: owner.to_string(),
        });
    }

    formula.render()
}

/// Escapes a user-provided value for embedding inside a double-quoted
/// formula literal.
fn escape(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            _ => escaped.push(ch),
        }
    }
    escaped
}
