#![allow(dead_code)]

use mlmd_filter_query::{
    compile, EntityKind, EntitySchema, FilterQuery, JoinKey, BASE_TABLE_ALIAS,
};

pub const ARTIFACT_ONLY: &[EntityKind] = &[EntityKind::Artifact];
pub const EXCLUDE_CONTEXT: &[EntityKind] = &[EntityKind::Artifact, EntityKind::Execution];
pub const CONTEXT_ONLY: &[EntityKind] = &[EntityKind::Context];
pub const ALL_KINDS: &[EntityKind] = &EntityKind::ALL;

pub fn property(name: &str) -> JoinKey {
    JoinKey::Property(name.to_string())
}

pub fn custom_property(name: &str) -> JoinKey {
    JoinKey::CustomProperty(name.to_string())
}

/// Expected join fragments for `joins`, given as (key, alias) in alias order.
pub fn expected_from_clause(schema: &EntitySchema, joins: &[(JoinKey, &str)]) -> String {
    joins
        .iter()
        .map(|(key, alias)| {
            schema
                .join_fragment(key, BASE_TABLE_ALIAS, alias)
                .unwrap_or_else(|| panic!("{:?} is not applicable to {}", key, schema.kind))
        })
        .collect()
}

pub fn compile_ok(expression: &str, kind: EntityKind) -> FilterQuery {
    compile(expression, kind)
        .unwrap_or_else(|e| panic!("failed to compile {:?} for {}: {}", expression, kind, e))
}

/// Compile `expression` for every kind in `kinds` and check both clauses.
pub fn assert_compiles(
    expression: &str,
    kinds: &[EntityKind],
    joins: &[(JoinKey, &str)],
    where_clause: &str,
) {
    for &kind in kinds {
        let query = compile_ok(expression, kind);
        assert_eq!(
            query.where_clause, where_clause,
            "where clause of {:?} for {}",
            expression, kind
        );
        assert_eq!(
            query.from_clause,
            expected_from_clause(kind.schema(), joins),
            "from clause of {:?} for {}",
            expression,
            kind
        );
        let aliases: Vec<(&JoinKey, &str)> = query
            .joins
            .iter()
            .map(|join| (&join.key, join.alias.as_str()))
            .collect();
        let expected: Vec<(&JoinKey, &str)> =
            joins.iter().map(|(key, alias)| (key, *alias)).collect();
        assert_eq!(aliases, expected, "joins of {:?} for {}", expression, kind);
    }
}
