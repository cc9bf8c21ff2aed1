//! Semantic analysis: AST -> typed AST
//!
//! Walks the untyped tree in source order and checks every field reference
//! against an [`EntitySchema`]. Resolution fails closed: the first reference
//! that is unknown or not applicable to the entity kind aborts the whole
//! expression.

use crate::ast::{AstNode, FieldRef, Literal};
use crate::error::ResolveError;
use crate::parser::DEFAULT_MAX_DEPTH;
use crate::schema::{EntitySchema, JoinKey, JoinKind, ValueType};
use crate::typed::{Attribute, TypedNode};

/// Value columns of the property tables
const VALUE_KINDS: [(&str, ValueType); 3] = [
    ("int_value", ValueType::Int),
    ("double_value", ValueType::Double),
    ("string_value", ValueType::String),
];

/// Prefixes of neighbor mentions, longest first
const NEIGHBOR_PREFIXES: [(&str, JoinKind); 3] = [
    ("parent_contexts", JoinKind::ParentContext),
    ("child_contexts", JoinKind::ChildContext),
    ("contexts", JoinKind::Context),
];

/// Resolve `ast` against `schema` using default limits.
pub fn resolve(ast: &AstNode, schema: &EntitySchema) -> Result<TypedNode, ResolveError> {
    Resolver::new(schema).resolve(ast)
}

pub struct Resolver<'s> {
    schema: &'s EntitySchema,
    max_depth: usize,
}

impl<'s> Resolver<'s> {
    pub fn new(schema: &'s EntitySchema) -> Self {
        Self {
            schema,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn resolve(&self, ast: &AstNode) -> Result<TypedNode, ResolveError> {
        self.resolve_node(ast, 0)
    }

    fn resolve_node(&self, ast: &AstNode, depth: usize) -> Result<TypedNode, ResolveError> {
        if depth > self.max_depth {
            return Err(ResolveError::TooDeep {
                max_depth: self.max_depth,
                kind: self.schema.kind,
            });
        }
        let next_depth = depth + 1;

        match ast {
            AstNode::And(operands) => Ok(TypedNode::And(
                self.resolve_operands(operands, next_depth)?,
            )),
            AstNode::Or(operands) => Ok(TypedNode::Or(
                self.resolve_operands(operands, next_depth)?,
            )),
            AstNode::Not(operand) => Ok(TypedNode::Not(Box::new(
                self.resolve_node(operand, next_depth)?,
            ))),
            AstNode::Comparison {
                field,
                operator,
                literal,
            } => {
                let (attribute, value_type) = self.resolve_field(field)?;
                tracing::trace!(
                    reference = %field.dotted(),
                    ?attribute,
                    "resolved field reference"
                );
                Ok(TypedNode::Comparison {
                    attribute,
                    value_type,
                    operator: *operator,
                    literal: widen_literal(literal, value_type),
                })
            }
        }
    }

    /// Left to right, so join keys appear in source order.
    fn resolve_operands(
        &self,
        operands: &[AstNode],
        depth: usize,
    ) -> Result<Vec<TypedNode>, ResolveError> {
        operands
            .iter()
            .map(|operand| self.resolve_node(operand, depth))
            .collect()
    }

    fn resolve_field(&self, field: &FieldRef) -> Result<(Attribute, ValueType), ResolveError> {
        match field.segments.as_slice() {
            [name] => self.resolve_bare(field, name),
            [head, attr] => match neighbor_mention(head) {
                Some((join_kind, index)) => self.resolve_neighbor(field, join_kind, index, attr),
                None => Err(self.malformed(field)),
            },
            [head, name, value_kind] if head == "properties" || head == "custom_properties" => {
                let Some((column, value_type)) =
                    VALUE_KINDS.iter().find(|(column, _)| *column == value_kind.as_str())
                else {
                    return Err(ResolveError::UnknownValueKind {
                        value_kind: value_kind.clone(),
                        reference: field.dotted(),
                        kind: self.schema.kind,
                    });
                };
                let key = if head == "properties" {
                    JoinKey::Property(name.clone())
                } else {
                    JoinKey::CustomProperty(name.clone())
                };
                Ok((
                    Attribute::Joined {
                        key,
                        column: (*column).to_string(),
                    },
                    *value_type,
                ))
            }
            _ => Err(self.malformed(field)),
        }
    }

    fn resolve_bare(
        &self,
        field: &FieldRef,
        name: &str,
    ) -> Result<(Attribute, ValueType), ResolveError> {
        if let Some(value_type) = self.schema.attribute(name) {
            return Ok((
                Attribute::Direct {
                    column: name.to_string(),
                },
                value_type,
            ));
        }
        if name == "type" {
            return Ok((
                Attribute::Joined {
                    key: JoinKey::Type,
                    column: "type".to_string(),
                },
                ValueType::String,
            ));
        }
        if neighbor_mention(name).is_some() || name == "properties" || name == "custom_properties"
        {
            return Err(self.malformed(field));
        }
        Err(ResolveError::UnknownAttribute {
            name: name.to_string(),
            kind: self.schema.kind,
        })
    }

    fn resolve_neighbor(
        &self,
        field: &FieldRef,
        join_kind: JoinKind,
        index: &str,
        attr: &str,
    ) -> Result<(Attribute, ValueType), ResolveError> {
        if !self.schema.permits(join_kind) {
            return Err(ResolveError::NotApplicable {
                reference: field.dotted(),
                kind: self.schema.kind,
            });
        }

        let index = parse_neighbor_index(index).ok_or_else(|| {
            ResolveError::MalformedNeighborIndex {
                reference: field.dotted(),
                kind: self.schema.kind,
            }
        })?;

        let Some(value_type) = self.schema.neighbor_attribute(attr) else {
            return Err(ResolveError::UnknownAttribute {
                name: field.dotted(),
                kind: self.schema.kind,
            });
        };

        let key = match join_kind {
            JoinKind::Context => JoinKey::Context(index),
            JoinKind::ParentContext => JoinKey::ParentContext(index),
            JoinKind::ChildContext => JoinKey::ChildContext(index),
            JoinKind::Type | JoinKind::Property | JoinKind::CustomProperty => {
                return Err(self.malformed(field))
            }
        };

        Ok((
            Attribute::Joined {
                key,
                column: attr.to_string(),
            },
            value_type,
        ))
    }

    fn malformed(&self, field: &FieldRef) -> ResolveError {
        ResolveError::MalformedReference {
            reference: field.dotted(),
            kind: self.schema.kind,
        }
    }
}

/// Splits `contexts_3` into `(Context, "3")`. The index text is returned
/// unchecked (possibly empty) so that `contexts_x` reports a malformed index.
fn neighbor_mention(head: &str) -> Option<(JoinKind, &str)> {
    NEIGHBOR_PREFIXES.iter().find_map(|(prefix, kind)| {
        let rest = head.strip_prefix(prefix)?;
        if rest.is_empty() {
            Some((*kind, rest))
        } else {
            rest.strip_prefix('_').map(|index| (*kind, index))
        }
    })
}

/// Decimal neighbor index; leading zeros are allowed and normalized away.
fn parse_neighbor_index(index: &str) -> Option<u32> {
    if index.is_empty() || !index.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    index.parse().ok()
}

/// Integer literals compared against a double column render as doubles.
/// Magnitudes above 2^53 round to the nearest double, which is the value the
/// column comparison would use anyway.
fn widen_literal(literal: &Literal, column_type: ValueType) -> Literal {
    match (literal, column_type) {
        (Literal::Integer(value), ValueType::Double) => Literal::Float(*value as f64),
        _ => literal.clone(),
    }
}
