//! SQL generation: typed AST -> FROM/WHERE fragments
//!
//! The builder renders the WHERE clause and, as a side effect, assigns table
//! aliases to the joins the expression needs. Aliases come from one counter
//! shared by all join kinds and are handed out on first mention, so the FROM
//! clause is only meaningful after [`QueryBuilder::visit`] has run.

use crate::ast::{format_float, Literal};
use crate::error::BuildError;
use crate::schema::{quote_string, EntitySchema, JoinKey, BASE_TABLE_ALIAS};
use crate::typed::{Attribute, TypedNode};
use serde::Serialize;
use std::collections::HashMap;

/// One join of the FROM clause
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JoinFragment {
    pub key: JoinKey,
    pub alias: String,
    pub sql: String,
}

/// Builds the clauses of one filter expression. Use a fresh builder per
/// expression; aliases are never reset.
pub struct QueryBuilder<'s> {
    schema: &'s EntitySchema,
    alias_table: HashMap<JoinKey, String>,
    next_table_index: u32,
    join_fragments: Vec<JoinFragment>,
    where_clause: String,
}

impl<'s> QueryBuilder<'s> {
    pub fn new(schema: &'s EntitySchema) -> Self {
        Self {
            schema,
            alias_table: HashMap::new(),
            next_table_index: 1,
            join_fragments: Vec::new(),
            where_clause: String::new(),
        }
    }

    /// Render `node` as the WHERE clause, assigning aliases along the way.
    pub fn visit(&mut self, node: &TypedNode) -> Result<(), BuildError> {
        self.where_clause = self.render(node)?;
        Ok(())
    }

    pub fn where_clause(&self) -> &str {
        &self.where_clause
    }

    /// Joins in alias assignment order
    pub fn join_fragments(&self) -> &[JoinFragment] {
        &self.join_fragments
    }

    /// The joins to append after the base table; empty when nothing is joined.
    pub fn from_clause(&self) -> String {
        self.join_fragments
            .iter()
            .map(|fragment| fragment.sql.as_str())
            .collect()
    }

    pub fn base_table_clause(&self) -> String {
        self.schema.base_table_clause(BASE_TABLE_ALIAS)
    }

    /// Base table followed by every join
    pub fn full_from_clause(&self) -> String {
        let mut from = self.base_table_clause();
        from.push_str(&self.from_clause());
        from
    }

    pub fn into_parts(self) -> (Vec<JoinFragment>, String) {
        (self.join_fragments, self.where_clause)
    }

    /// Alias of the join for `key`, adding the join on first use.
    pub fn alias_for(&mut self, key: &JoinKey) -> Result<String, BuildError> {
        if let Some(alias) = self.alias_table.get(key) {
            return Ok(alias.clone());
        }

        let alias = format!("table_{}", self.next_table_index);
        let sql = self
            .schema
            .join_fragment(key, BASE_TABLE_ALIAS, &alias)
            .ok_or(BuildError::MissingJoinTemplate {
                join: key.kind(),
                kind: self.schema.kind,
            })?;
        self.next_table_index += 1;

        tracing::trace!(?key, alias = %alias, "assigned join alias");

        self.alias_table.insert(key.clone(), alias.clone());
        self.join_fragments.push(JoinFragment {
            key: key.clone(),
            alias: alias.clone(),
            sql,
        });
        Ok(alias)
    }

    fn render(&mut self, node: &TypedNode) -> Result<String, BuildError> {
        match node {
            TypedNode::And(operands) => self.render_chain(operands, "AND"),
            TypedNode::Or(operands) => self.render_chain(operands, "OR"),
            TypedNode::Not(operand) => Ok(format!("NOT ({})", self.render(operand)?)),
            TypedNode::Comparison {
                attribute,
                operator,
                literal,
                ..
            } => {
                let column = self.render_attribute(attribute)?;
                Ok(format!(
                    "({}) {} {}",
                    column,
                    operator,
                    render_literal(literal)
                ))
            }
        }
    }

    fn render_chain(&mut self, operands: &[TypedNode], keyword: &str) -> Result<String, BuildError> {
        let mut parts = Vec::with_capacity(operands.len());
        for operand in operands {
            parts.push(format!("({})", self.render(operand)?));
        }
        Ok(parts.join(&format!(" {} ", keyword)))
    }

    fn render_attribute(&mut self, attribute: &Attribute) -> Result<String, BuildError> {
        match attribute {
            Attribute::Direct { column } => Ok(format!("{}.{}", BASE_TABLE_ALIAS, column)),
            Attribute::Joined { key, column } => {
                let alias = self.alias_for(key)?;
                Ok(format!("{}.{}", alias, column))
            }
        }
    }
}

/// Integers render bare, floats and strings parenthesized.
fn render_literal(literal: &Literal) -> String {
    match literal {
        Literal::Integer(value) => value.to_string(),
        Literal::Float(value) => format!("({})", format_float(*value)),
        Literal::String(value) => format!("({})", quote_string(value)),
    }
}
