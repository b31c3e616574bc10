//! Backend-agnostic filter predicates.
//!
//! A [`Filter`] maps field names to literals (implicit equality) or to a
//! [`Comparator`], plus the `$and` / `$or` / `$not` combinators. Both storage
//! adapters compile the same value into their native query language and must
//! return the same set of records.

use common::{AppError, AppResult};

use super::value::Value;

/// Prefix reserved for logical combinators.
pub const COMBINATOR_PREFIX: char = '$';

/// Operators applicable to one field. Every operator that is set is ANDed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Comparator {
    pub eq: Option<Value>,
    pub ne: Option<Value>,
    pub gt: Option<Value>,
    pub gte: Option<Value>,
    pub lt: Option<Value>,
    pub lte: Option<Value>,
    pub r#in: Option<Vec<Value>>,
    pub nin: Option<Vec<Value>>,
    /// Inclusive on both ends
    pub between: Option<(Value, Value)>,
    pub contains: Option<String>,
    pub starts_with: Option<String>,
    pub ends_with: Option<String>,
    pub array_contains: Option<Value>,
    pub exists: Option<bool>,
}

/// One comparison extracted from a [`Comparator`].
#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    Eq(Value),
    Ne(Value),
    Gt(Value),
    Gte(Value),
    Lt(Value),
    Lte(Value),
    In(Vec<Value>),
    Nin(Vec<Value>),
    Between(Value, Value),
    Contains(String),
    StartsWith(String),
    EndsWith(String),
    ArrayContains(Value),
    Exists(bool),
}

impl Op {
    /// Short operator name, used in parameter names and error messages.
    pub fn name(&self) -> &'static str {
        match self {
            Op::Eq(_) => "eq",
            Op::Ne(_) => "ne",
            Op::Gt(_) => "gt",
            Op::Gte(_) => "gte",
            Op::Lt(_) => "lt",
            Op::Lte(_) => "lte",
            Op::In(_) => "in",
            Op::Nin(_) => "nin",
            Op::Between(_, _) => "between",
            Op::Contains(_) => "contains",
            Op::StartsWith(_) => "starts_with",
            Op::EndsWith(_) => "ends_with",
            Op::ArrayContains(_) => "array_contains",
            Op::Exists(_) => "exists",
        }
    }
}

impl Comparator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, v: impl Into<Value>) -> Self {
        self.eq = Some(v.into());
        self
    }

    pub fn ne(mut self, v: impl Into<Value>) -> Self {
        self.ne = Some(v.into());
        self
    }

    pub fn gt(mut self, v: impl Into<Value>) -> Self {
        self.gt = Some(v.into());
        self
    }

    pub fn gte(mut self, v: impl Into<Value>) -> Self {
        self.gte = Some(v.into());
        self
    }

    pub fn lt(mut self, v: impl Into<Value>) -> Self {
        self.lt = Some(v.into());
        self
    }

    pub fn lte(mut self, v: impl Into<Value>) -> Self {
        self.lte = Some(v.into());
        self
    }

    pub fn is_in<V: Into<Value>>(mut self, values: impl IntoIterator<Item = V>) -> Self {
        self.r#in = Some(values.into_iter().map(Into::into).collect());
        self
    }

    pub fn not_in<V: Into<Value>>(mut self, values: impl IntoIterator<Item = V>) -> Self {
        self.nin = Some(values.into_iter().map(Into::into).collect());
        self
    }

    pub fn between(mut self, lo: impl Into<Value>, hi: impl Into<Value>) -> Self {
        self.between = Some((lo.into(), hi.into()));
        self
    }

    pub fn contains(mut self, s: impl Into<String>) -> Self {
        self.contains = Some(s.into());
        self
    }

    pub fn starts_with(mut self, s: impl Into<String>) -> Self {
        self.starts_with = Some(s.into());
        self
    }

    pub fn ends_with(mut self, s: impl Into<String>) -> Self {
        self.ends_with = Some(s.into());
        self
    }

    pub fn array_contains(mut self, v: impl Into<Value>) -> Self {
        self.array_contains = Some(v.into());
        self
    }

    pub fn exists(mut self, present: bool) -> Self {
        self.exists = Some(present);
        self
    }

    /// The operators that are set, in a fixed order.
    pub fn ops(&self) -> Vec<Op> {
        let mut ops = Vec::new();
        if let Some(v) = &self.eq {
            ops.push(Op::Eq(v.clone()));
        }
        if let Some(v) = &self.ne {
            ops.push(Op::Ne(v.clone()));
        }
        if let Some(v) = &self.gt {
            ops.push(Op::Gt(v.clone()));
        }
        if let Some(v) = &self.gte {
            ops.push(Op::Gte(v.clone()));
        }
        if let Some(v) = &self.lt {
            ops.push(Op::Lt(v.clone()));
        }
        if let Some(v) = &self.lte {
            ops.push(Op::Lte(v.clone()));
        }
        if let Some(v) = &self.r#in {
            ops.push(Op::In(v.clone()));
        }
        if let Some(v) = &self.nin {
            ops.push(Op::Nin(v.clone()));
        }
        if let Some((lo, hi)) = &self.between {
            ops.push(Op::Between(lo.clone(), hi.clone()));
        }
        if let Some(s) = &self.contains {
            ops.push(Op::Contains(s.clone()));
        }
        if let Some(s) = &self.starts_with {
            ops.push(Op::StartsWith(s.clone()));
        }
        if let Some(s) = &self.ends_with {
            ops.push(Op::EndsWith(s.clone()));
        }
        if let Some(v) = &self.array_contains {
            ops.push(Op::ArrayContains(v.clone()));
        }
        if let Some(b) = self.exists {
            ops.push(Op::Exists(b));
        }
        ops
    }
}

/// Condition on a single field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldFilter {
    /// Implicit equality
    Literal(Value),
    Compare(Comparator),
}

impl FieldFilter {
    pub fn ops(&self) -> Vec<Op> {
        match self {
            FieldFilter::Literal(v) => vec![Op::Eq(v.clone())],
            FieldFilter::Compare(c) => c.ops(),
        }
    }
}

impl From<Comparator> for FieldFilter {
    fn from(c: Comparator) -> Self {
        FieldFilter::Compare(c)
    }
}

/// A boolean predicate over one entity type.
///
/// Field conditions and combinators are all ANDed together. An empty filter
/// matches every record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    fields: Vec<(String, FieldFilter)>,
    and: Vec<Filter>,
    or: Option<Vec<Filter>>,
    not: Option<Box<Filter>>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Implicit equality on `field`.
    pub fn eq(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.field(field, FieldFilter::Literal(value.into()))
    }

    /// Attach a condition to `field`. Field names must not start with `$`.
    pub fn field(mut self, field: impl Into<String>, condition: impl Into<FieldFilter>) -> Self {
        self.fields.push((field.into(), condition.into()));
        self
    }

    /// `$and`: every sub-filter must match. Empty means match all.
    pub fn and(mut self, filters: impl IntoIterator<Item = Filter>) -> Self {
        self.and.extend(filters);
        self
    }

    /// `$or`: at least one sub-filter must match. Empty means match nothing.
    pub fn or(mut self, filters: impl IntoIterator<Item = Filter>) -> Self {
        self.or.get_or_insert_with(Vec::new).extend(filters);
        self
    }

    /// `$not`: the sub-filter must not match.
    pub fn not(mut self, filter: Filter) -> Self {
        self.not = Some(Box::new(filter));
        self
    }

    pub fn fields(&self) -> &[(String, FieldFilter)] {
        &self.fields
    }

    pub fn and_filters(&self) -> &[Filter] {
        &self.and
    }

    pub fn or_filters(&self) -> Option<&[Filter]> {
        self.or.as_deref()
    }

    pub fn not_filter(&self) -> Option<&Filter> {
        self.not.as_deref()
    }

    /// True when the filter has no keys at all.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.and.is_empty() && self.or.is_none() && self.not.is_none()
    }

    /// Reject field keys that use the combinator prefix.
    pub fn validate(&self) -> AppResult<()> {
        for (name, _) in &self.fields {
            if name.starts_with(COMBINATOR_PREFIX) {
                return Err(AppError::validation(format!(
                    "field name `{}` uses the reserved `$` prefix",
                    name
                )));
            }
        }
        for f in self
            .and
            .iter()
            .chain(self.or.iter().flatten())
            .chain(self.not.as_deref())
        {
            f.validate()?;
        }
        Ok(())
    }
}

// =============================================================================
// JSON form
// =============================================================================

impl TryFrom<serde_json::Value> for Filter {
    type Error = AppError;

    fn try_from(json: serde_json::Value) -> AppResult<Self> {
        Filter::try_from(&json)
    }
}

impl TryFrom<&serde_json::Value> for Filter {
    type Error = AppError;

    fn try_from(json: &serde_json::Value) -> AppResult<Self> {
        let obj = json
            .as_object()
            .ok_or_else(|| AppError::validation("filter must be a JSON object"))?;

        let mut filter = Filter::new();
        for (key, value) in obj {
            match key.as_str() {
                "$and" => filter = filter.and(parse_filter_list(key, value)?),
                "$or" => filter = filter.or(parse_filter_list(key, value)?),
                "$not" => filter = filter.not(Filter::try_from(value)?),
                k if k.starts_with(COMBINATOR_PREFIX) => {
                    return Err(AppError::validation(format!(
                        "unknown combinator `{}`",
                        k
                    )))
                }
                field => {
                    let condition = match value {
                        serde_json::Value::Object(ops) => {
                            FieldFilter::Compare(parse_comparator(field, ops)?)
                        }
                        serde_json::Value::Array(_) => {
                            return Err(AppError::validation(format!(
                                "field `{}`: use `in` to match a list of values",
                                field
                            )))
                        }
                        scalar => FieldFilter::Literal(Value::from_json(scalar)?),
                    };
                    filter = filter.field(field, condition);
                }
            }
        }
        Ok(filter)
    }
}

fn parse_filter_list(key: &str, value: &serde_json::Value) -> AppResult<Vec<Filter>> {
    value
        .as_array()
        .ok_or_else(|| AppError::validation(format!("`{}` expects an array of filters", key)))?
        .iter()
        .map(Filter::try_from)
        .collect()
}

fn parse_values(field: &str, op: &str, value: &serde_json::Value) -> AppResult<Vec<Value>> {
    value
        .as_array()
        .ok_or_else(|| {
            AppError::validation(format!("field `{}`: `{}` expects an array", field, op))
        })?
        .iter()
        .map(Value::from_json)
        .collect()
}

fn parse_string(field: &str, op: &str, value: &serde_json::Value) -> AppResult<String> {
    value.as_str().map(str::to_string).ok_or_else(|| {
        AppError::validation(format!("field `{}`: `{}` expects a string", field, op))
    })
}

fn parse_comparator(
    field: &str,
    ops: &serde_json::Map<String, serde_json::Value>,
) -> AppResult<Comparator> {
    let mut c = Comparator::new();
    for (op, value) in ops {
        match op.as_str() {
            "eq" => c.eq = Some(Value::from_json(value)?),
            "ne" => c.ne = Some(Value::from_json(value)?),
            "gt" => c.gt = Some(Value::from_json(value)?),
            "gte" => c.gte = Some(Value::from_json(value)?),
            "lt" => c.lt = Some(Value::from_json(value)?),
            "lte" => c.lte = Some(Value::from_json(value)?),
            "in" => c.r#in = Some(parse_values(field, op, value)?),
            "nin" => c.nin = Some(parse_values(field, op, value)?),
            "between" => {
                let mut bounds = parse_values(field, op, value)?;
                if bounds.len() != 2 {
                    return Err(AppError::validation(format!(
                        "field `{}`: `between` expects exactly two values",
                        field
                    )));
                }
                let hi = bounds.pop().unwrap_or(Value::Null);
                let lo = bounds.pop().unwrap_or(Value::Null);
                c.between = Some((lo, hi));
            }
            "contains" => c.contains = Some(parse_string(field, op, value)?),
            "startsWith" => c.starts_with = Some(parse_string(field, op, value)?),
            "endsWith" => c.ends_with = Some(parse_string(field, op, value)?),
            "arrayContains" => c.array_contains = Some(Value::from_json(value)?),
            "exists" => {
                c.exists = Some(value.as_bool().ok_or_else(|| {
                    AppError::validation(format!("field `{}`: `exists` expects a bool", field))
                })?)
            }
            other => {
                return Err(AppError::validation(format!(
                    "field `{}`: unknown comparator `{}`",
                    field, other
                )))
            }
        }
    }
    Ok(c)
}
