//! Compilation entry point
//!
//! Runs the three stages (parse, resolve, build) for one expression and one
//! entity kind, and packages the resulting clauses as a [`FilterQuery`].

use crate::ast::AstNode;
use crate::builder::{JoinFragment, QueryBuilder};
use crate::error::{ParseError, Result};
use crate::lexer::Lexer;
use crate::parser::{Parser, DEFAULT_MAX_DEPTH};
use crate::resolver::Resolver;
use crate::schema::{EntityKind, EntitySchema, BASE_TABLE_ALIAS};
use serde::{Deserialize, Serialize};

/// Input limits applied to every compilation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompileOptions {
    /// Longest accepted expression, in bytes
    pub max_expression_len: usize,
    /// Deepest accepted NOT/parenthesis nesting
    pub max_depth: usize,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            max_expression_len: 16 * 1024,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl CompileOptions {
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.max_expression_len == 0 {
            return Err("compile.max_expression_len must be greater than 0".to_string());
        }
        if self.max_depth == 0 {
            return Err("compile.max_depth must be greater than 0".to_string());
        }
        Ok(())
    }
}

/// A compiled filter: the FROM and WHERE fragments of one query
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterQuery {
    pub entity_kind: EntityKind,
    /// Join fragments to append after the base table, possibly empty
    pub from_clause: String,
    pub where_clause: String,
    pub joins: Vec<JoinFragment>,
}

impl FilterQuery {
    fn schema(&self) -> &'static EntitySchema {
        self.entity_kind.schema()
    }

    /// `` `Artifact` AS table_0 `` followed by the joins
    pub fn full_from_clause(&self) -> String {
        let mut from = self.schema().base_table_clause(BASE_TABLE_ALIAS);
        from.push_str(&self.from_clause);
        from
    }

    /// A complete statement selecting the ids of matching entities.
    pub fn to_select_ids_sql(&self) -> String {
        format!(
            "SELECT {}.id FROM {}WHERE {}",
            BASE_TABLE_ALIAS,
            self.full_from_clause(),
            self.where_clause
        )
    }
}

/// Filter compiler. Holds no per-query state and can be shared across threads.
#[derive(Debug, Clone, Default)]
pub struct Compiler {
    options: CompileOptions,
}

impl Compiler {
    pub fn new(options: CompileOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &CompileOptions {
        &self.options
    }

    /// Parse `text` into an AST without resolving it.
    pub fn parse(&self, text: &str) -> Result<AstNode> {
        if text.len() > self.options.max_expression_len {
            return Err(ParseError::new(
                0,
                Lexer::new(text).fragment_at(0),
                format!(
                    "Expression too long ({} bytes, max {})",
                    text.len(),
                    self.options.max_expression_len
                ),
            )
            .into());
        }

        let ast = Parser::new(text)
            .with_max_depth(self.options.max_depth)
            .parse()?;
        tracing::trace!(%ast, "parsed filter expression");
        Ok(ast)
    }

    /// Compile `text` into the FROM/WHERE fragments for `kind`.
    pub fn compile(&self, text: &str, kind: EntityKind) -> Result<FilterQuery> {
        self.compile_with_schema(text, kind.schema())
    }

    pub fn compile_with_schema(&self, text: &str, schema: &EntitySchema) -> Result<FilterQuery> {
        tracing::debug!(kind = %schema.kind, len = text.len(), "compiling filter expression");

        let ast = self.parse(text)?;

        let typed = Resolver::new(schema)
            .with_max_depth(self.options.max_depth)
            .resolve(&ast)?;
        tracing::debug!(
            kind = %schema.kind,
            joins = typed.join_keys().len(),
            "resolved filter expression"
        );

        let mut builder = QueryBuilder::new(schema);
        builder.visit(&typed)?;
        let from_clause = builder.from_clause();
        let (joins, where_clause) = builder.into_parts();
        tracing::debug!(kind = %schema.kind, where_clause = %where_clause, "built filter query");

        Ok(FilterQuery {
            entity_kind: schema.kind,
            from_clause,
            where_clause,
            joins,
        })
    }
}

/// Compile with default options.
pub fn compile(text: &str, kind: EntityKind) -> Result<FilterQuery> {
    Compiler::default().compile(text, kind)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_select_ids_sql() {
        let query = compile("uri = 'a'", EntityKind::Artifact).unwrap();
        assert_eq!(
            query.to_select_ids_sql(),
            "SELECT table_0.id FROM `Artifact` AS table_0 WHERE (table_0.uri) = (\"a\")"
        );
    }

    #[test]
    fn test_expression_too_long() {
        let compiler = Compiler::new(CompileOptions {
            max_expression_len: 8,
            ..CompileOptions::default()
        });
        let err = compiler.compile("name = 'abcdef'", EntityKind::Context).unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
        assert!(err.to_string().contains("too long"));
        match err {
            Error::Parse(e) => {
                assert_eq!(e.position, 0);
                assert_eq!(e.fragment, "name = 'abcdef'");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_options_validate() {
        assert!(CompileOptions::default().validate().is_ok());
        let zero = CompileOptions {
            max_depth: 0,
            ..CompileOptions::default()
        };
        assert!(zero.validate().is_err());
    }

    #[test]
    fn test_compiler_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Compiler>();
    }
}
