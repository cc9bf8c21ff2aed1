//! Typed AST
//!
//! Output of the resolver: the same connective shape as [`AstNode`], with every
//! field reference resolved against an entity schema. Code generation works on
//! this tree only and never re-validates it.
//!
//! [`AstNode`]: crate::ast::AstNode

use crate::ast::{ComparisonOperator, Literal};
use crate::schema::{JoinKey, ValueType};

#[derive(Debug, Clone, PartialEq)]
pub enum TypedNode {
    And(Vec<TypedNode>),
    Or(Vec<TypedNode>),
    Not(Box<TypedNode>),
    Comparison {
        attribute: Attribute,
        /// Type of the compared column
        value_type: ValueType,
        operator: ComparisonOperator,
        /// Literal after column-driven widening (integer -> float for doubles)
        literal: Literal,
    },
}

/// Where a compared column lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attribute {
    /// Column of the base table
    Direct { column: String },
    /// Column of the neighbor joined for `key`
    Joined { key: JoinKey, column: String },
}

impl Attribute {
    pub fn column(&self) -> &str {
        match self {
            Attribute::Direct { column } | Attribute::Joined { column, .. } => column,
        }
    }

    pub fn join_key(&self) -> Option<&JoinKey> {
        match self {
            Attribute::Direct { .. } => None,
            Attribute::Joined { key, .. } => Some(key),
        }
    }
}

impl TypedNode {
    /// Join keys in first-appearance order, without duplicates.
    pub fn join_keys(&self) -> Vec<&JoinKey> {
        let mut keys = Vec::new();
        self.collect_join_keys(&mut keys);
        keys
    }

    fn collect_join_keys<'a>(&'a self, keys: &mut Vec<&'a JoinKey>) {
        match self {
            TypedNode::And(operands) | TypedNode::Or(operands) => {
                for operand in operands {
                    operand.collect_join_keys(keys);
                }
            }
            TypedNode::Not(operand) => operand.collect_join_keys(keys),
            TypedNode::Comparison { attribute, .. } => {
                if let Some(key) = attribute.join_key() {
                    if !keys.contains(&key) {
                        keys.push(key);
                    }
                }
            }
        }
    }
}
