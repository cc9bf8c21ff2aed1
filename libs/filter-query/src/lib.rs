//! Filter query compiler - turns filter expressions into SQL FROM/WHERE fragments
//!
//! A filter expression such as `contexts_0.name = 'run' AND properties.p.int_value > 3`
//! is compiled against one entity kind (artifact, execution or context) into:
//! 1. **FROM** fragment: the joins the expression needs, each with a unique alias
//! 2. **WHERE** fragment: a boolean expression over the base table and those aliases
//!
//! # Architecture Overview
//!
//! ```text
//! Expression String
//!      |
//!   Parser -> AST (untyped, schema agnostic)
//!      |
//!   Resolver -> Typed AST (checked against an EntitySchema)
//!      |
//!   QueryBuilder -> FROM joins + WHERE clause
//! ```
//!
//! The base table is always aliased `table_0`; joins get `table_1`, `table_2`,
//! ... in order of first mention.
//!
//! ```
//! use mlmd_filter_query::{compile, EntityKind};
//!
//! let query = compile("type = 'Model' AND uri LIKE 'gs://%'", EntityKind::Artifact).unwrap();
//! assert_eq!(
//!     query.where_clause,
//!     "((table_1.type) = (\"Model\")) AND ((table_0.uri) LIKE (\"gs://%\"))"
//! );
//! ```

pub mod ast;
pub mod builder;
pub mod compiler;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod resolver;
pub mod schema;
pub mod token;
pub mod typed;

// Re-export main types
pub use ast::{AstNode, ComparisonOperator, FieldRef, Literal};
pub use builder::{JoinFragment, QueryBuilder};
pub use compiler::{compile, CompileOptions, Compiler, FilterQuery};
pub use error::{BuildError, Error, ParseError, ResolveError, Result};
pub use parser::parse;
pub use resolver::resolve;
pub use schema::{
    EntityKind, EntitySchema, JoinKey, JoinKind, ValueType, ARTIFACT_SCHEMA, BASE_TABLE_ALIAS,
    CONTEXT_SCHEMA, EXECUTION_SCHEMA,
};
pub use typed::{Attribute, TypedNode};
