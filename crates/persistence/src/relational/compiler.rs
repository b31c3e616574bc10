//! Filter -> SQL expression tree.
//!
//! Compilation is a pure recursive walk producing [`SqlExpr`]. Every
//! field/operator pair becomes one clause whose parameters are named
//! `{field}_{op}_{n}`, with `n` taken from one counter for the whole filter so
//! names never collide under nested combinators. The tree lowers to a SeaORM
//! [`Condition`] for execution and renders to named-parameter SQL for logs.
//!
//! Under `$not`, value comparisons are guarded with `IS NOT NULL` so a NULL
//! column negates to true, as an absent field does on the document store.

use common::{AppError, AppResult};
use sea_orm::sea_query::{Alias, Condition, Expr, LikeExpr, SimpleExpr};
use sea_orm::{EntityTrait, IdenStatic};

use super::field_map::FieldMap;
use crate::query::{Filter, Op, Value};
use crate::schema::{FieldDef, FieldKind, Persistable};

/// A bound parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub value: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlOp {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    In,
    NotIn,
    Between,
    Like,
    IsNull,
    IsNotNull,
}

/// One column comparison.
#[derive(Debug, Clone, PartialEq)]
pub struct Clause {
    pub column: String,
    pub kind: FieldKind,
    pub op: SqlOp,
    pub params: Vec<Param>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SqlExpr {
    True,
    False,
    Clause(Clause),
    And(Vec<SqlExpr>),
    Or(Vec<SqlExpr>),
    Not(Box<SqlExpr>),
}

/// Compile `filter` against the schema of `D` and the columns of `E`.
pub fn compile<D, E>(filter: &Filter, fields: &FieldMap<E>) -> AppResult<SqlExpr>
where
    D: Persistable,
    E: EntityTrait,
{
    filter.validate()?;
    let mut compiler = Compiler::<D, E> {
        fields,
        counter: 0,
        negated: 0,
        _entity: std::marker::PhantomData,
    };
    compiler.filter(filter)
}

struct Compiler<'a, D, E: EntityTrait> {
    fields: &'a FieldMap<E>,
    counter: usize,
    /// Depth of enclosing `$not`s
    negated: usize,
    _entity: std::marker::PhantomData<fn() -> D>,
}

impl<'a, D: Persistable, E: EntityTrait> Compiler<'a, D, E> {
    fn filter(&mut self, filter: &Filter) -> AppResult<SqlExpr> {
        let mut parts = Vec::new();

        for (name, condition) in filter.fields() {
            let def = D::field(name)?;
            let column = self.fields.column(name)?.as_str().to_string();
            for op in condition.ops() {
                parts.push(self.op(def, &column, op)?);
            }
        }

        for sub in filter.and_filters() {
            parts.push(self.filter(sub)?);
        }

        if let Some(any) = filter.or_filters() {
            if any.is_empty() {
                parts.push(SqlExpr::False);
            } else {
                let branches = any
                    .iter()
                    .map(|f| self.filter(f))
                    .collect::<AppResult<Vec<_>>>()?;
                parts.push(SqlExpr::Or(branches));
            }
        }

        if let Some(inner) = filter.not_filter() {
            self.negated += 1;
            let compiled = self.filter(inner);
            self.negated -= 1;
            parts.push(SqlExpr::Not(Box::new(compiled?)));
        }

        Ok(match parts.len() {
            0 => SqlExpr::True,
            1 => parts.remove(0),
            _ => SqlExpr::And(parts),
        })
    }

    fn param(&mut self, def: &FieldDef, op: &Op, value: Value) -> Param {
        let name = format!("{}_{}_{}", def.name, op.name(), self.counter);
        self.counter += 1;
        Param { name, value }
    }

    fn operand(&mut self, def: &FieldDef, op: &Op, value: &Value) -> AppResult<Param> {
        if value.is_null() {
            return Err(AppError::validation(format!(
                "field `{}`: `{}` does not accept null",
                def.name,
                op.name()
            )));
        }
        let value = value.coerce(def.kind, def.name)?;
        Ok(self.param(def, op, value))
    }

    fn op(&mut self, def: &FieldDef, column: &str, op: Op) -> AppResult<SqlExpr> {
        let negated = self.negated > 0;
        let clause = |op: SqlOp, params: Vec<Param>| {
            let compare = SqlExpr::Clause(Clause {
                column: column.to_string(),
                kind: def.kind,
                op,
                params,
            });
            if !negated || matches!(op, SqlOp::IsNull | SqlOp::IsNotNull) {
                return compare;
            }
            let present = SqlExpr::Clause(Clause {
                column: column.to_string(),
                kind: def.kind,
                op: SqlOp::IsNotNull,
                params: vec![],
            });
            SqlExpr::And(vec![present, compare])
        };

        if def.kind == FieldKind::Json && !matches!(op, Op::Exists(_)) {
            return Err(AppError::unsupported(format!(
                "field `{}` holds JSON and cannot be filtered",
                def.name
            )));
        }

        Ok(match &op {
            Op::Eq(Value::Null) => clause(SqlOp::IsNull, vec![]),
            Op::Ne(Value::Null) => clause(SqlOp::IsNotNull, vec![]),
            Op::Eq(v) => clause(SqlOp::Eq, vec![self.operand(def, &op, v)?]),
            Op::Ne(v) => clause(SqlOp::Ne, vec![self.operand(def, &op, v)?]),
            Op::Gt(v) => clause(SqlOp::Gt, vec![self.operand(def, &op, v)?]),
            Op::Gte(v) => clause(SqlOp::Gte, vec![self.operand(def, &op, v)?]),
            Op::Lt(v) => clause(SqlOp::Lt, vec![self.operand(def, &op, v)?]),
            Op::Lte(v) => clause(SqlOp::Lte, vec![self.operand(def, &op, v)?]),
            Op::In(values) if values.is_empty() => SqlExpr::False,
            Op::Nin(values) if values.is_empty() => SqlExpr::True,
            Op::In(values) | Op::Nin(values) => {
                let params = values
                    .iter()
                    .map(|v| self.operand(def, &op, v))
                    .collect::<AppResult<Vec<_>>>()?;
                let sql_op = if matches!(op, Op::In(_)) {
                    SqlOp::In
                } else {
                    SqlOp::NotIn
                };
                clause(sql_op, params)
            }
            Op::Between(lo, hi) => {
                let lo = self.operand(def, &op, lo)?;
                let hi = self.operand(def, &op, hi)?;
                clause(SqlOp::Between, vec![lo, hi])
            }
            Op::Contains(s) => clause(SqlOp::Like, vec![self.pattern(def, &op, like_contains(s))?]),
            Op::StartsWith(s) => clause(SqlOp::Like, vec![self.pattern(def, &op, like_starts(s))?]),
            Op::EndsWith(s) => clause(SqlOp::Like, vec![self.pattern(def, &op, like_ends(s))?]),
            Op::ArrayContains(_) => {
                return Err(AppError::unsupported(format!(
                    "field `{}`: arrayContains is not available on the relational store",
                    def.name
                )))
            }
            Op::Exists(true) => clause(SqlOp::IsNotNull, vec![]),
            Op::Exists(false) => clause(SqlOp::IsNull, vec![]),
        })
    }

    fn pattern(&mut self, def: &FieldDef, op: &Op, pattern: String) -> AppResult<Param> {
        if def.kind != FieldKind::Text {
            return Err(AppError::validation(format!(
                "field `{}`: `{}` applies to text fields only",
                def.name,
                op.name()
            )));
        }
        Ok(self.param(def, op, Value::String(pattern)))
    }
}

/* ---------- LIKE helpers ---------- */

const LIKE_ESCAPE: char = '\\';

fn like_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '%' | '_' | '\\' => {
                out.push(LIKE_ESCAPE);
                out.push(ch);
            }
            c => out.push(c),
        }
    }
    out
}

fn like_contains(s: &str) -> String {
    format!("%{}%", like_escape(s))
}

fn like_starts(s: &str) -> String {
    format!("{}%", like_escape(s))
}

fn like_ends(s: &str) -> String {
    format!("%{}", like_escape(s))
}

/// SeaORM value for an already-coerced operand.
pub(crate) fn sea_value(kind: FieldKind, value: &Value) -> sea_orm::Value {
    match (kind, value) {
        (FieldKind::Bool, Value::Bool(b)) => sea_orm::Value::from(Some(*b)),
        (FieldKind::Bool, _) => sea_orm::Value::from(None::<bool>),
        (FieldKind::Integer, Value::Int(i)) => sea_orm::Value::from(Some(*i)),
        (FieldKind::Integer, _) => sea_orm::Value::from(None::<i64>),
        (FieldKind::Float, Value::Float(f)) => sea_orm::Value::from(Some(*f)),
        (FieldKind::Float, _) => sea_orm::Value::from(None::<f64>),
        (FieldKind::DateTime, Value::DateTime(dt)) => sea_orm::Value::from(Some(*dt)),
        (FieldKind::DateTime, _) => sea_orm::Value::from(None::<chrono::DateTime<chrono::Utc>>),
        (FieldKind::Json, _) => sea_orm::Value::from(None::<serde_json::Value>),
        (FieldKind::Text | FieldKind::TextArray, Value::String(s)) => {
            sea_orm::Value::from(Some(s.clone()))
        }
        (FieldKind::Text | FieldKind::TextArray, _) => sea_orm::Value::from(None::<String>),
    }
}

impl SqlExpr {
    /// Lower to a SeaORM condition.
    pub fn to_condition(&self) -> Condition {
        match self {
            SqlExpr::True => Condition::all().add(Expr::cust("1=1")),
            SqlExpr::False => Condition::all().add(Expr::cust("1=0")),
            SqlExpr::Clause(c) => Condition::all().add(c.to_simple_expr()),
            SqlExpr::And(parts) => parts
                .iter()
                .fold(Condition::all(), |acc, p| acc.add(p.to_condition())),
            SqlExpr::Or(parts) => parts
                .iter()
                .fold(Condition::any(), |acc, p| acc.add(p.to_condition())),
            SqlExpr::Not(inner) => Condition::all().add(inner.to_condition()).not(),
        }
    }

    /// SQL text with `:name` placeholders.
    pub fn render(&self) -> String {
        match self {
            SqlExpr::True => "1=1".to_string(),
            SqlExpr::False => "1=0".to_string(),
            SqlExpr::Clause(c) => c.render(),
            SqlExpr::And(parts) => join(parts, " AND "),
            SqlExpr::Or(parts) => join(parts, " OR "),
            SqlExpr::Not(inner) => format!("NOT ({})", inner.render()),
        }
    }

    /// All parameters in rendering order.
    pub fn params(&self) -> Vec<&Param> {
        let mut out = Vec::new();
        self.collect_params(&mut out);
        out
    }

    fn collect_params<'a>(&'a self, out: &mut Vec<&'a Param>) {
        match self {
            SqlExpr::True | SqlExpr::False => {}
            SqlExpr::Clause(c) => out.extend(c.params.iter()),
            SqlExpr::And(parts) | SqlExpr::Or(parts) => {
                for p in parts {
                    p.collect_params(out);
                }
            }
            SqlExpr::Not(inner) => inner.collect_params(out),
        }
    }
}

fn join(parts: &[SqlExpr], sep: &str) -> String {
    let rendered: Vec<String> = parts.iter().map(SqlExpr::render).collect();
    format!("({})", rendered.join(sep))
}

impl Clause {
    fn to_simple_expr(&self) -> SimpleExpr {
        let col = Expr::col(Alias::new(self.column.as_str()));
        let values = || {
            self.params
                .iter()
                .map(|p| sea_value(self.kind, &p.value))
                .collect::<Vec<_>>()
        };
        let first = || {
            self.params
                .first()
                .map(|p| sea_value(self.kind, &p.value))
                .unwrap_or_else(|| sea_value(self.kind, &Value::Null))
        };

        match self.op {
            SqlOp::Eq => col.eq(first()),
            SqlOp::Ne => col.ne(first()),
            SqlOp::Gt => col.gt(first()),
            SqlOp::Gte => col.gte(first()),
            SqlOp::Lt => col.lt(first()),
            SqlOp::Lte => col.lte(first()),
            SqlOp::In => col.is_in(values()),
            SqlOp::NotIn => col.is_not_in(values()),
            SqlOp::Between => {
                let mut v = values().into_iter();
                let lo = v.next().unwrap_or_else(|| sea_value(self.kind, &Value::Null));
                let hi = v.next().unwrap_or_else(|| sea_value(self.kind, &Value::Null));
                col.between(lo, hi)
            }
            SqlOp::Like => {
                let pattern = match self.params.first().map(|p| &p.value) {
                    Some(Value::String(s)) => s.clone(),
                    _ => String::new(),
                };
                col.like(LikeExpr::new(pattern).escape(LIKE_ESCAPE))
            }
            SqlOp::IsNull => col.is_null(),
            SqlOp::IsNotNull => col.is_not_null(),
        }
    }

    fn render(&self) -> String {
        let names: Vec<String> = self.params.iter().map(|p| format!(":{}", p.name)).collect();
        let one = names.first().cloned().unwrap_or_default();
        match self.op {
            SqlOp::Eq => format!("{} = {}", self.column, one),
            SqlOp::Ne => format!("{} <> {}", self.column, one),
            SqlOp::Gt => format!("{} > {}", self.column, one),
            SqlOp::Gte => format!("{} >= {}", self.column, one),
            SqlOp::Lt => format!("{} < {}", self.column, one),
            SqlOp::Lte => format!("{} <= {}", self.column, one),
            SqlOp::In => format!("{} IN ({})", self.column, names.join(", ")),
            SqlOp::NotIn => format!("{} NOT IN ({})", self.column, names.join(", ")),
            SqlOp::Between => format!(
                "{} BETWEEN {} AND {}",
                self.column,
                one,
                names.get(1).cloned().unwrap_or_default()
            ),
            SqlOp::Like => format!("{} LIKE {} ESCAPE '\\'", self.column, one),
            SqlOp::IsNull => format!("{} IS NULL", self.column),
            SqlOp::IsNotNull => format!("{} IS NOT NULL", self.column),
        }
    }
}
