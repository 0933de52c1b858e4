//! schemamend-rules: rewrite rules for the CheeseMap schema
//!
//! A rule locates a structural anchor in the schema buffer (a model block,
//! a field declaration, an annotation) and produces the edits that bring it
//! in line with the evolved data model. Rules are assembled into a
//! [`RuleSet`] that runs them in a fixed order and validates inter-rule
//! dependencies up front.

mod cheesemap;
mod field_patch;
mod relation;
mod rename;
mod ruleset;

pub use cheesemap::{cheesemap_rule_set, cheesemap_rules};
pub use field_patch::{InsertFields, Position, RemoveField, ReplaceField, UpdateAnnotation};
pub use relation::{LinkRelation, RequireRelation};
pub use rename::{RenameField, RenameModel};
pub use ruleset::{OrderingError, Rule, RuleApplication, RuleError, RuleOutcome, RuleSet};
