//! Entity schema descriptors
//!
//! Each filterable entity kind is described by a static [`EntitySchema`]: its
//! base table, the attributes answerable without a join, and the SQL join
//! templates for every neighbor kind it supports. A join kind without a
//! template is not applicable to that entity kind, which is how the resolver
//! rejects e.g. `parent_contexts_0` on artifacts.
//!
//! Attribute tables use compile-time perfect hash maps (phf).

use phf::phf_map;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Alias of the base table in every compiled query. Never assigned to a join.
pub const BASE_TABLE_ALIAS: &str = "table_0";

/// The three kinds of catalog entities a filter can target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    /// Primary entity; has a `uri` and belongs to contexts through attributions
    Artifact,
    /// Derived entity; belongs to contexts through associations
    Execution,
    /// Container entity; has parent and child contexts
    Context,
}

impl EntityKind {
    pub const ALL: [EntityKind; 3] = [Self::Artifact, Self::Execution, Self::Context];

    pub fn schema(self) -> &'static EntitySchema {
        match self {
            Self::Artifact => &ARTIFACT_SCHEMA,
            Self::Execution => &EXECUTION_SCHEMA,
            Self::Context => &CONTEXT_SCHEMA,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Artifact => "artifact",
            Self::Execution => "execution",
            Self::Context => "context",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown entity kind '{0}', expected artifact, execution or context")]
pub struct UnknownEntityKind(pub String);

impl FromStr for EntityKind {
    type Err = UnknownEntityKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "artifact" => Ok(Self::Artifact),
            "execution" => Ok(Self::Execution),
            "context" => Ok(Self::Context),
            _ => Err(UnknownEntityKind(s.to_string())),
        }
    }
}

/// Storage type of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    Int,
    Double,
    String,
}

/// Kinds of joins a filter can imply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinKind {
    Type,
    Context,
    ParentContext,
    ChildContext,
    Property,
    CustomProperty,
}

impl fmt::Display for JoinKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Type => "type",
            Self::Context => "context",
            Self::ParentContext => "parent context",
            Self::ChildContext => "child context",
            Self::Property => "property",
            Self::CustomProperty => "custom property",
        })
    }
}

/// Unit of alias deduplication: one join per distinct key within a query.
///
/// Neighbor variants carry the query-local mention index (`contexts_<N>`),
/// property variants the property name without backquotes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "identity", rename_all = "snake_case")]
pub enum JoinKey {
    Type,
    Context(u32),
    ParentContext(u32),
    ChildContext(u32),
    Property(String),
    CustomProperty(String),
}

impl JoinKey {
    pub fn kind(&self) -> JoinKind {
        match self {
            Self::Type => JoinKind::Type,
            Self::Context(_) => JoinKind::Context,
            Self::ParentContext(_) => JoinKind::ParentContext,
            Self::ChildContext(_) => JoinKind::ChildContext,
            Self::Property(_) => JoinKind::Property,
            Self::CustomProperty(_) => JoinKind::CustomProperty,
        }
    }
}

/// Join templates of one entity kind.
///
/// Placeholders: `{base}` base alias, `{alias}` join alias, `{type_kind}` the
/// schema's type kind id and, for property joins, `{name}` the quoted
/// property name.
#[derive(Debug, Clone, Copy)]
pub struct JoinTemplates {
    pub context: Option<&'static str>,
    pub parent_context: Option<&'static str>,
    pub child_context: Option<&'static str>,
    pub property: &'static str,
    pub custom_property: &'static str,
}

/// Read-only description of one filterable entity kind
#[derive(Debug)]
pub struct EntitySchema {
    pub kind: EntityKind,
    pub base_table: &'static str,
    /// Discriminator of this kind's rows in the shared `Type` table
    pub type_kind: i32,
    attributes: &'static phf::Map<&'static str, ValueType>,
    joins: JoinTemplates,
}

impl EntitySchema {
    /// Type of a direct (base table) attribute
    pub fn attribute(&self, name: &str) -> Option<ValueType> {
        self.attributes.get(name).copied()
    }

    /// Names of the direct attributes, sorted
    pub fn attribute_names(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.attributes.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Type of an attribute of a joined context (`contexts_0.name`)
    pub fn neighbor_attribute(&self, name: &str) -> Option<ValueType> {
        NEIGHBOR_ATTRIBUTES.get(name).copied()
    }

    pub fn permits(&self, kind: JoinKind) -> bool {
        self.template(kind).is_some()
    }

    fn template(&self, kind: JoinKind) -> Option<&'static str> {
        match kind {
            JoinKind::Type => Some(TYPE_JOIN),
            JoinKind::Context => self.joins.context,
            JoinKind::ParentContext => self.joins.parent_context,
            JoinKind::ChildContext => self.joins.child_context,
            JoinKind::Property => Some(self.joins.property),
            JoinKind::CustomProperty => Some(self.joins.custom_property),
        }
    }

    /// `` `Artifact` AS table_0 ``, the head of the FROM clause
    pub fn base_table_clause(&self, base_alias: &str) -> String {
        format!("`{}` AS {} ", self.base_table, base_alias)
    }

    /// SQL joining the neighbor named by `key` as `alias`, or `None` when the
    /// join kind does not apply to this entity kind.
    pub fn join_fragment(&self, key: &JoinKey, base_alias: &str, alias: &str) -> Option<String> {
        let template = self.template(key.kind())?;
        let sql = template
            .replace("{type_kind}", &self.type_kind.to_string())
            .replace("{base}", base_alias)
            .replace("{alias}", alias);
        // Substituted last so a property name can never introduce placeholders.
        Some(match key {
            JoinKey::Property(name) | JoinKey::CustomProperty(name) => {
                sql.replace("{name}", &quote_string(name))
            }
            _ => sql,
        })
    }
}

/// Renders `value` as a double-quoted SQL string literal.
pub(crate) fn quote_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}

static ARTIFACT_ATTRIBUTES: phf::Map<&'static str, ValueType> = phf_map! {
    "id" => ValueType::Int,
    "type_id" => ValueType::Int,
    "uri" => ValueType::String,
    "state" => ValueType::Int,
    "name" => ValueType::String,
    "external_id" => ValueType::String,
    "create_time_since_epoch" => ValueType::Int,
    "last_update_time_since_epoch" => ValueType::Int,
};

static EXECUTION_ATTRIBUTES: phf::Map<&'static str, ValueType> = phf_map! {
    "id" => ValueType::Int,
    "type_id" => ValueType::Int,
    "last_known_state" => ValueType::Int,
    "name" => ValueType::String,
    "external_id" => ValueType::String,
    "create_time_since_epoch" => ValueType::Int,
    "last_update_time_since_epoch" => ValueType::Int,
};

static CONTEXT_ATTRIBUTES: phf::Map<&'static str, ValueType> = phf_map! {
    "id" => ValueType::Int,
    "type_id" => ValueType::Int,
    "name" => ValueType::String,
    "external_id" => ValueType::String,
    "create_time_since_epoch" => ValueType::Int,
    "last_update_time_since_epoch" => ValueType::Int,
};

/// Columns exposed by every context neighbor join, including the type name
static NEIGHBOR_ATTRIBUTES: phf::Map<&'static str, ValueType> = phf_map! {
    "id" => ValueType::Int,
    "type_id" => ValueType::Int,
    "type" => ValueType::String,
    "name" => ValueType::String,
    "external_id" => ValueType::String,
    "create_time_since_epoch" => ValueType::Int,
    "last_update_time_since_epoch" => ValueType::Int,
};

const TYPE_JOIN: &str = "JOIN (SELECT `Type`.`id` AS type_id, `Type`.`name` AS type FROM `Type` WHERE `Type`.`type_kind` = {type_kind}) AS {alias} ON {base}.type_id = {alias}.type_id ";

const ARTIFACT_CONTEXT_JOIN: &str = "JOIN (SELECT c.id, c.type_id, t.name AS type, c.name, c.external_id, c.create_time_since_epoch, c.last_update_time_since_epoch, a.artifact_id FROM `Context` AS c JOIN `Type` AS t ON c.type_id = t.id JOIN `Attribution` AS a ON c.id = a.context_id) AS {alias} ON {base}.id = {alias}.artifact_id ";

const EXECUTION_CONTEXT_JOIN: &str = "JOIN (SELECT c.id, c.type_id, t.name AS type, c.name, c.external_id, c.create_time_since_epoch, c.last_update_time_since_epoch, a.execution_id FROM `Context` AS c JOIN `Type` AS t ON c.type_id = t.id JOIN `Association` AS a ON c.id = a.context_id) AS {alias} ON {base}.id = {alias}.execution_id ";

const PARENT_CONTEXT_JOIN: &str = "JOIN (SELECT c.id, c.type_id, t.name AS type, c.name, c.external_id, c.create_time_since_epoch, c.last_update_time_since_epoch, pc.context_id AS child_context_id FROM `Context` AS c JOIN `Type` AS t ON c.type_id = t.id JOIN `ParentContext` AS pc ON c.id = pc.parent_context_id) AS {alias} ON {base}.id = {alias}.child_context_id ";

const CHILD_CONTEXT_JOIN: &str = "JOIN (SELECT c.id, c.type_id, t.name AS type, c.name, c.external_id, c.create_time_since_epoch, c.last_update_time_since_epoch, pc.parent_context_id FROM `Context` AS c JOIN `Type` AS t ON c.type_id = t.id JOIN `ParentContext` AS pc ON c.id = pc.context_id) AS {alias} ON {base}.id = {alias}.parent_context_id ";

pub static ARTIFACT_SCHEMA: EntitySchema = EntitySchema {
    kind: EntityKind::Artifact,
    base_table: "Artifact",
    type_kind: 1,
    attributes: &ARTIFACT_ATTRIBUTES,
    joins: JoinTemplates {
        context: Some(ARTIFACT_CONTEXT_JOIN),
        parent_context: None,
        child_context: None,
        property: "JOIN (SELECT * FROM `ArtifactProperty` WHERE name = {name} AND is_custom_property = 0) AS {alias} ON {base}.id = {alias}.artifact_id ",
        custom_property: "JOIN (SELECT * FROM `ArtifactProperty` WHERE name = {name} AND is_custom_property = 1) AS {alias} ON {base}.id = {alias}.artifact_id ",
    },
};

pub static EXECUTION_SCHEMA: EntitySchema = EntitySchema {
    kind: EntityKind::Execution,
    base_table: "Execution",
    type_kind: 0,
    attributes: &EXECUTION_ATTRIBUTES,
    joins: JoinTemplates {
        context: Some(EXECUTION_CONTEXT_JOIN),
        parent_context: None,
        child_context: None,
        property: "JOIN (SELECT * FROM `ExecutionProperty` WHERE name = {name} AND is_custom_property = 0) AS {alias} ON {base}.id = {alias}.execution_id ",
        custom_property: "JOIN (SELECT * FROM `ExecutionProperty` WHERE name = {name} AND is_custom_property = 1) AS {alias} ON {base}.id = {alias}.execution_id ",
    },
};

pub static CONTEXT_SCHEMA: EntitySchema = EntitySchema {
    kind: EntityKind::Context,
    base_table: "Context",
    type_kind: 2,
    attributes: &CONTEXT_ATTRIBUTES,
    joins: JoinTemplates {
        context: None,
        parent_context: Some(PARENT_CONTEXT_JOIN),
        child_context: Some(CHILD_CONTEXT_JOIN),
        property: "JOIN (SELECT * FROM `ContextProperty` WHERE name = {name} AND is_custom_property = 0) AS {alias} ON {base}.id = {alias}.context_id ",
        custom_property: "JOIN (SELECT * FROM `ContextProperty` WHERE name = {name} AND is_custom_property = 1) AS {alias} ON {base}.id = {alias}.context_id ",
    },
};
