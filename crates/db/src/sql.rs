//! Specification-to-SQL translation.
//!
//! Renders a [`Specification`] tree into a `WHERE` clause with `$n`
//! placeholders and a matching bind vector. Field names reaching this layer
//! have passed allow-list validation, but every identifier is still checked
//! against a strict shape before being spliced into SQL — an unsafe name is
//! a configuration bug, reported as a [`RepositoryError`].

use lexika_core::error::RepositoryError;
use lexika_core::query::params::Value;
use lexika_core::query::spec::{CompareOp, MatchKind, Specification};

/// A rendered `WHERE` clause (without the keyword) and its bind values.
///
/// An empty clause means the specification matches everything. Placeholders
/// are numbered from `$1`; callers appending `LIMIT`/`OFFSET` continue the
/// numbering after `binds.len()`.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlWhere {
    pub clause: String,
    pub binds: Vec<Value>,
}

/// Render a specification into a `WHERE` clause.
pub fn render_where(spec: &Specification) -> Result<SqlWhere, RepositoryError> {
    if spec.is_all() {
        return Ok(SqlWhere {
            clause: String::new(),
            binds: Vec::new(),
        });
    }
    let mut clause = String::new();
    let mut binds = Vec::new();
    render(spec, &mut clause, &mut binds)?;
    Ok(SqlWhere { clause, binds })
}

fn render(
    spec: &Specification,
    out: &mut String,
    binds: &mut Vec<Value>,
) -> Result<(), RepositoryError> {
    match spec {
        Specification::All => out.push_str("TRUE"),
        Specification::And(parts) | Specification::Or(parts) => {
            let connective = if matches!(spec, Specification::And(_)) {
                " AND "
            } else {
                " OR "
            };
            // The builder never emits empty groups; render them as the
            // identity of their connective anyway.
            if parts.is_empty() {
                out.push_str(if connective == " AND " { "TRUE" } else { "FALSE" });
                return Ok(());
            }
            out.push('(');
            for (i, part) in parts.iter().enumerate() {
                if i > 0 {
                    out.push_str(connective);
                }
                render(part, out, binds)?;
            }
            out.push(')');
        }
        Specification::Compare { field, op, value } => {
            ensure_identifier(field)?;
            binds.push(value.clone());
            out.push_str(&format!("{field} {} ${}", compare_sql(*op), binds.len()));
        }
        Specification::Membership {
            field,
            values,
            negated,
        } => {
            ensure_identifier(field)?;
            if values.is_empty() {
                // x IN () is invalid SQL; an empty list matches nothing.
                out.push_str(if *negated { "TRUE" } else { "FALSE" });
                return Ok(());
            }
            let mut placeholders = Vec::with_capacity(values.len());
            for value in values {
                binds.push(value.clone());
                placeholders.push(format!("${}", binds.len()));
            }
            let keyword = if *negated { "NOT IN" } else { "IN" };
            out.push_str(&format!(
                "{field} {keyword} ({})",
                placeholders.join(", ")
            ));
        }
        Specification::Range { field, low, high } => {
            ensure_identifier(field)?;
            binds.push(low.clone());
            let low_n = binds.len();
            binds.push(high.clone());
            let high_n = binds.len();
            out.push_str(&format!("{field} BETWEEN ${low_n} AND ${high_n}"));
        }
        Specification::Pattern { field, kind, term } => {
            ensure_identifier(field)?;
            binds.push(Value::Str(like_operand(*kind, term)));
            out.push_str(&format!("{field} ILIKE ${}", binds.len()));
        }
        Specification::Null { field, negated } => {
            ensure_identifier(field)?;
            let check = if *negated { "IS NOT NULL" } else { "IS NULL" };
            out.push_str(&format!("{field} {check}"));
        }
    }
    Ok(())
}

fn compare_sql(op: CompareOp) -> &'static str {
    match op {
        CompareOp::Eq => "=",
        CompareOp::Ne => "<>",
        CompareOp::Gt => ">",
        CompareOp::Gte => ">=",
        CompareOp::Lt => "<",
        CompareOp::Lte => "<=",
    }
}

/// The ILIKE operand for a pattern criterion. `Like` passes the caller's
/// wildcards through; the literal kinds escape them.
fn like_operand(kind: MatchKind, term: &str) -> String {
    match kind {
        MatchKind::Like => term.to_string(),
        MatchKind::Contains => format!("%{}%", escape_like(term)),
        MatchKind::StartsWith => format!("{}%", escape_like(term)),
        MatchKind::EndsWith => format!("%{}", escape_like(term)),
    }
}

/// Escape LIKE wildcards in a literal term (default `\` escape character).
fn escape_like(term: &str) -> String {
    term.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Reject anything that is not a plain snake_case SQL identifier.
pub fn ensure_identifier(name: &str) -> Result<(), RepositoryError> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) if first.is_ascii_lowercase() || first == '_' => {
            chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
        }
        _ => false,
    };
    if valid {
        Ok(())
    } else {
        Err(RepositoryError::new(format!(
            "unsafe SQL identifier: {name:?}"
        )))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
