//! Abstract Syntax Tree (AST) representation
//!
//! The AST mirrors the filter grammar directly, without any knowledge of entity
//! schemas. Field references are kept as raw identifier segments; the resolver
//! decides what they mean.
//!
//! # Grammar
//!
//! ```text
//! expression : or_expr
//! or_expr    : and_expr ('OR' and_expr)*
//! and_expr   : not_expr ('AND' not_expr)*
//! not_expr   : 'NOT' not_expr | comparison | '(' expression ')'
//! comparison : field_ref operator literal
//! field_ref  : segment ('.' segment)*
//! segment    : IDENTIFIER | `BACKQUOTED`
//! operator   : '=' | '!=' | '<>' | '<' | '<=' | '>' | '>=' | 'LIKE'
//! literal    : INTEGER | FLOAT | STRING
//! ```
//!
//! An unparenthesized chain such as `a AND b AND c` becomes a single `And`
//! with three operands. A parenthesized group is always its own node.

use std::fmt;

/// AST node representing a filter expression
#[derive(Debug, Clone, PartialEq)]
pub enum AstNode {
    /// Conjunction of two or more operands
    And(Vec<AstNode>),

    /// Disjunction of two or more operands
    Or(Vec<AstNode>),

    Not(Box<AstNode>),

    /// `field_ref operator literal`
    Comparison {
        field: FieldRef,
        operator: ComparisonOperator,
        literal: Literal,
    },
}

/// A dotted field reference, e.g. `contexts_0.name` or ``properties.`a:b`.int_value``
#[derive(Debug, Clone)]
pub struct FieldRef {
    /// Identifier segments with backquotes removed
    pub segments: Vec<String>,
    /// Character offset of the first segment
    pub position: usize,
}

impl FieldRef {
    pub fn new(segments: Vec<String>, position: usize) -> Self {
        Self { segments, position }
    }

    /// The reference as written, without backquotes (`properties.0:b.int_value`).
    pub fn dotted(&self) -> String {
        self.segments.join(".")
    }
}

// Positions are diagnostics only and do not take part in equality.
impl PartialEq for FieldRef {
    fn eq(&self, other: &Self) -> bool {
        self.segments == other.segments
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComparisonOperator {
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    Like,
}

impl ComparisonOperator {
    /// SQL spelling of the operator
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Equal => "=",
            Self::NotEqual => "!=",
            Self::LessThan => "<",
            Self::LessThanOrEqual => "<=",
            Self::GreaterThan => ">",
            Self::GreaterThanOrEqual => ">=",
            Self::Like => "LIKE",
        }
    }
}

impl fmt::Display for ComparisonOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Integer(i64),
    Float(f64),
    String(String),
}

/// Formats a float so that it always carries a decimal point (`1` -> `1.0`).
pub(crate) fn format_float(value: f64) -> String {
    let mut out = value.to_string();
    if !out.contains('.') {
        out.push_str(".0");
    }
    out
}

fn is_plain_identifier(segment: &str) -> bool {
    let mut chars = segment.chars();
    let starts_ok = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_');
    starts_ok
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !matches!(
            segment.to_ascii_uppercase().as_str(),
            "AND" | "OR" | "NOT" | "LIKE"
        )
}

impl fmt::Display for FieldRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            if is_plain_identifier(segment) {
                f.write_str(segment)?;
            } else {
                write!(f, "`{}`", segment)?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Integer(i) => write!(f, "{}", i),
            Literal::Float(v) => f.write_str(&format_float(*v)),
            // Strings carry no escapes, so pick the quote that does not occur.
            Literal::String(s) if s.contains('\'') => write!(f, "\"{}\"", s),
            Literal::String(s) => write!(f, "'{}'", s),
        }
    }
}

/// Prints a canonical filter expression that parses back to an equal AST.
impl fmt::Display for AstNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AstNode::And(operands) => write_chain(f, operands, "AND"),
            AstNode::Or(operands) => write_chain(f, operands, "OR"),
            AstNode::Not(operand) => match operand.as_ref() {
                AstNode::Comparison { .. } | AstNode::Not(_) => write!(f, "NOT {}", operand),
                _ => write!(f, "NOT ({})", operand),
            },
            AstNode::Comparison {
                field,
                operator,
                literal,
            } => write!(f, "{} {} {}", field, operator, literal),
        }
    }
}

fn write_chain(f: &mut fmt::Formatter<'_>, operands: &[AstNode], keyword: &str) -> fmt::Result {
    for (i, operand) in operands.iter().enumerate() {
        if i > 0 {
            write!(f, " {} ", keyword)?;
        }
        match operand {
            AstNode::And(_) | AstNode::Or(_) => write!(f, "({})", operand)?,
            _ => write!(f, "{}", operand)?,
        }
    }
    Ok(())
}
