//! Filter -> SurrealQL `WHERE` expression.
//!
//! Operands are always bound as `$field_op_n` parameters. Absent fields read as
//! NONE and sort before every other value, so comparisons carry an explicit
//! presence guard to match SQL's treatment of NULL.
//!
//! `startsWith` is approximated by the range `[p, p + '\u{f8ff}']`. `contains`
//! and `endsWith` have no index-friendly equivalent and are rejected.

use std::collections::BTreeMap;
use std::marker::PhantomData;

use common::{AppError, AppResult};

use super::codec::bind_value;
use crate::query::{Filter, Op, SortDirection, Value};
use crate::schema::{FieldDef, FieldKind, Persistable};

/// Upper bound appended to a prefix for range scans.
pub const PREFIX_UPPER_BOUND: char = '\u{f8ff}';

pub type Binds = BTreeMap<String, serde_json::Value>;

/// Compile a filter on its own. Returns the expression and its bindings.
pub fn compile<D: Persistable>(filter: &Filter) -> AppResult<(String, Binds)> {
    let mut compiler = Compiler::<D>::new();
    let clause = compiler.filter(filter)?;
    Ok((clause, compiler.into_binds()))
}

/// Expression of a field; `id` reads the key of the record link.
pub(crate) fn field_expr(name: &str) -> String {
    if name == "id" {
        "record::id(id)".to_string()
    } else {
        format!("`{}`", name)
    }
}

fn present(f: &str) -> String {
    format!("{f} != NONE AND {f} != NULL")
}

fn missing(f: &str) -> String {
    format!("({f} = NONE OR {f} = NULL)")
}

pub(crate) struct Compiler<D> {
    counter: usize,
    binds: Binds,
    _entity: PhantomData<fn() -> D>,
}

impl<D: Persistable> Compiler<D> {
    pub(crate) fn new() -> Self {
        Self {
            counter: 0,
            binds: Binds::new(),
            _entity: PhantomData,
        }
    }

    pub(crate) fn into_binds(self) -> Binds {
        self.binds
    }

    fn bind(&mut self, field: &str, op: &str, value: serde_json::Value) -> String {
        let name = format!("{}_{}_{}", field, op, self.counter);
        self.counter += 1;
        self.binds.insert(name.clone(), value);
        format!("${}", name)
    }

    pub(crate) fn filter(&mut self, filter: &Filter) -> AppResult<String> {
        filter.validate()?;
        self.walk(filter)
    }

    fn walk(&mut self, filter: &Filter) -> AppResult<String> {
        let mut parts = Vec::new();

        for (name, condition) in filter.fields() {
            let def = D::field(name)?;
            for op in condition.ops() {
                parts.push(self.op(def, op)?);
            }
        }

        for sub in filter.and_filters() {
            parts.push(self.walk(sub)?);
        }

        if let Some(any) = filter.or_filters() {
            if any.is_empty() {
                parts.push("false".to_string());
            } else {
                let branches = any
                    .iter()
                    .map(|f| self.walk(f))
                    .collect::<AppResult<Vec<_>>>()?;
                parts.push(format!("({})", branches.join(" OR ")));
            }
        }

        if let Some(inner) = filter.not_filter() {
            parts.push(format!("!({})", self.walk(inner)?));
        }

        Ok(match parts.len() {
            0 => "true".to_string(),
            1 => parts.remove(0),
            _ => format!("({})", parts.join(" AND ")),
        })
    }

    fn operand(&mut self, def: &FieldDef, op: &Op, value: &Value) -> AppResult<String> {
        if value.is_null() {
            return Err(AppError::validation(format!(
                "field `{}`: `{}` does not accept null",
                def.name,
                op.name()
            )));
        }
        let value = value.coerce(def.kind, def.name)?;
        Ok(self.bind(def.name, op.name(), bind_value(&value)))
    }

    fn operands(&mut self, def: &FieldDef, op: &Op, values: &[Value]) -> AppResult<String> {
        let mut list = Vec::with_capacity(values.len());
        for v in values {
            if v.is_null() {
                return Err(AppError::validation(format!(
                    "field `{}`: `{}` does not accept null",
                    def.name,
                    op.name()
                )));
            }
            list.push(bind_value(&v.coerce(def.kind, def.name)?));
        }
        Ok(self.bind(def.name, op.name(), serde_json::Value::Array(list)))
    }

    fn op(&mut self, def: &FieldDef, op: Op) -> AppResult<String> {
        let f = field_expr(def.name);

        if def.kind == FieldKind::Json && !matches!(op, Op::Exists(_)) {
            return Err(AppError::unsupported(format!(
                "field `{}` holds JSON and cannot be filtered",
                def.name
            )));
        }

        Ok(match &op {
            Op::Eq(Value::Null) | Op::Exists(false) => missing(&f),
            Op::Ne(Value::Null) | Op::Exists(true) => format!("({})", present(&f)),
            Op::Eq(v) => format!("{} = {}", f, self.operand(def, &op, v)?),
            Op::Ne(v) => format!("({} AND {} != {})", present(&f), f, self.operand(def, &op, v)?),
            Op::Gt(v) => format!("({} AND {} > {})", present(&f), f, self.operand(def, &op, v)?),
            Op::Gte(v) => format!("({} AND {} >= {})", present(&f), f, self.operand(def, &op, v)?),
            Op::Lt(v) => format!("({} AND {} < {})", present(&f), f, self.operand(def, &op, v)?),
            Op::Lte(v) => format!("({} AND {} <= {})", present(&f), f, self.operand(def, &op, v)?),
            Op::In(values) if values.is_empty() => "false".to_string(),
            Op::Nin(values) if values.is_empty() => "true".to_string(),
            Op::In(values) => format!("{} INSIDE {}", f, self.operands(def, &op, values)?),
            Op::Nin(values) => format!(
                "({} AND {} NOTINSIDE {})",
                present(&f),
                f,
                self.operands(def, &op, values)?
            ),
            Op::Between(lo, hi) => {
                let lo = self.operand(def, &op, lo)?;
                let hi = self.operand(def, &op, hi)?;
                format!("({} AND {} >= {} AND {} <= {})", present(&f), f, lo, f, hi)
            }
            Op::StartsWith(prefix) => {
                if def.kind != FieldKind::Text {
                    return Err(AppError::validation(format!(
                        "field `{}`: `startsWith` applies to text fields only",
                        def.name
                    )));
                }
                let lo = self.bind(def.name, op.name(), serde_json::Value::String(prefix.clone()));
                let hi = self.bind(
                    def.name,
                    op.name(),
                    serde_json::Value::String(format!("{}{}", prefix, PREFIX_UPPER_BOUND)),
                );
                format!("({} AND {} >= {} AND {} <= {})", present(&f), f, lo, f, hi)
            }
            Op::Contains(_) | Op::EndsWith(_) => {
                return Err(AppError::unsupported(format!(
                    "field `{}`: `{}` is not available on the document store",
                    def.name,
                    op.name()
                )))
            }
            Op::ArrayContains(v) => {
                if def.kind != FieldKind::TextArray {
                    return Err(AppError::validation(format!(
                        "field `{}`: `arrayContains` applies to array fields only",
                        def.name
                    )));
                }
                format!("{} CONTAINS {}", f, self.operand(def, &op, v)?)
            }
        })
    }

    /// Keyset predicate selecting the documents strictly after `cursor` under
    /// `keys`. Ascending keys put absent values first, descending keys last.
    pub(crate) fn after(
        &mut self,
        keys: &[(String, SortDirection)],
        cursor: &serde_json::Map<String, serde_json::Value>,
    ) -> String {
        let value_of = |name: &str| cursor.get(name).filter(|v| !v.is_null()).cloned();

        let mut branches = Vec::with_capacity(keys.len());
        for (i, (field, direction)) in keys.iter().enumerate() {
            let mut parts = Vec::with_capacity(i + 1);

            for (prev, _) in &keys[..i] {
                let f = field_expr(prev);
                parts.push(match value_of(prev) {
                    None => missing(&f),
                    Some(v) => format!("{} = {}", f, self.bind(prev, "cursor", v)),
                });
            }

            let f = field_expr(field);
            parts.push(match (direction, value_of(field)) {
                (SortDirection::Asc, None) => format!("({})", present(&f)),
                (SortDirection::Asc, Some(v)) => {
                    format!("({} AND {} > {})", present(&f), f, self.bind(field, "cursor", v))
                }
                (SortDirection::Desc, None) => "false".to_string(),
                (SortDirection::Desc, Some(v)) => format!(
                    "({} < {} OR {} = NONE OR {} = NULL)",
                    f,
                    self.bind(field, "cursor", v),
                    f,
                    f
                ),
            });

            branches.push(format!("({})", parts.join(" AND ")));
        }

        if branches.is_empty() {
            "true".to_string()
        } else {
            format!("({})", branches.join(" OR "))
        }
    }
}
