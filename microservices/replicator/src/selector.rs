//! Selector Compiler
//!
//! Turns a vector selector expression such as `up{job=~"node.*"}` into the
//! ordered matcher list sent with every remote read query.

use bridge_core::{BridgeError, Result};
use bridge_proto::{LabelMatcher, MatcherType};
use promql_parser::label::{MatchOp, Matcher};
use promql_parser::parser::{self, Expr, VectorSelector};

pub const METRIC_NAME_LABEL: &str = "__name__";

/// Compiled label matchers, created once and reused for every cycle
#[derive(Debug, Clone, PartialEq)]
pub struct Selector {
    expr: String,
    matchers: Vec<LabelMatcher>,
}

impl Selector {
    pub fn compile(expr: &str) -> Result<Self> {
        let parsed = parser::parse(expr).map_err(BridgeError::Parse)?;

        let vs = match unwrap_parens(parsed) {
            Expr::VectorSelector(vs) => vs,
            other => {
                return Err(BridgeError::UnsupportedSelector(format!(
                    "expected a single vector selector, got {}",
                    expr_kind(&other)
                )))
            }
        };

        Ok(Self {
            expr: expr.to_string(),
            matchers: to_label_matchers(&vs)?,
        })
    }

    pub fn expr(&self) -> &str {
        &self.expr
    }

    pub fn matchers(&self) -> &[LabelMatcher] {
        &self.matchers
    }

    pub fn len(&self) -> usize {
        self.matchers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matchers.is_empty()
    }
}

impl std::fmt::Display for Selector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.expr)
    }
}

fn unwrap_parens(expr: Expr) -> Expr {
    match expr {
        Expr::Paren(paren) => unwrap_parens(*paren.expr),
        other => other,
    }
}

fn expr_kind(expr: &Expr) -> &'static str {
    match expr {
        Expr::MatrixSelector(_) => "a range selector",
        Expr::Aggregate(_) => "an aggregation",
        Expr::Call(_) => "a function call",
        Expr::Binary(_) => "a binary expression",
        Expr::Unary(_) => "a unary expression",
        Expr::Subquery(_) => "a subquery",
        Expr::NumberLiteral(_) | Expr::StringLiteral(_) => "a literal",
        _ => "an unsupported expression",
    }
}

fn to_label_matchers(vs: &VectorSelector) -> Result<Vec<LabelMatcher>> {
    if vs.offset.is_some() || vs.at.is_some() {
        return Err(BridgeError::UnsupportedSelector(
            "offset and @ modifiers cannot be expressed in a remote read query".to_string(),
        ));
    }
    if !vs.matchers.or_matchers.is_empty() {
        return Err(BridgeError::UnsupportedSelector(
            "`or` matcher groups cannot be expressed in a remote read query".to_string(),
        ));
    }

    let mut matchers = Vec::with_capacity(vs.matchers.matchers.len() + 1);

    // A bare metric name is shorthand for an equality matcher on __name__
    if let Some(name) = &vs.name {
        let has_name_matcher = vs
            .matchers
            .matchers
            .iter()
            .any(|m| m.name == METRIC_NAME_LABEL);
        if !has_name_matcher {
            matchers.push(LabelMatcher::new(MatcherType::Eq, METRIC_NAME_LABEL, name.as_str()));
        }
    }

    for m in &vs.matchers.matchers {
        matchers.push(LabelMatcher::new(matcher_type(m)?, m.name.as_str(), m.value.as_str()));
    }

    Ok(matchers)
}

#[allow(unreachable_patterns)]
fn matcher_type(m: &Matcher) -> Result<MatcherType> {
    match &m.op {
        MatchOp::Equal => Ok(MatcherType::Eq),
        MatchOp::NotEqual => Ok(MatcherType::Neq),
        MatchOp::Re(_) => Ok(MatcherType::Re),
        MatchOp::NotRe(_) => Ok(MatcherType::Nre),
        _ => Err(BridgeError::UnsupportedSelector(format!(
            "invalid matcher type on label {:?}",
            m.name
        ))),
    }
}
