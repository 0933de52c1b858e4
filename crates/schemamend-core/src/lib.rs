//! schemamend-core: Core abstractions for Prisma schema rewriting
//!
//! This crate provides:
//! - `Span` / `Edit`: byte-range modifications of the schema buffer
//! - `apply_edits()`: Function to apply edits preserving surrounding text
//! - `Block` / `find_block()`: nesting-aware model block location
//! - `check_balance()`: structural validation after each rewrite
//! - `matcher`: word-boundary identifier and field-line anchors

mod block;
mod edit;
pub mod matcher;

pub use block::{check_balance, find_block, Block, StructureError};
pub use edit::{apply_edits, Edit, EditError, Span};
pub use matcher::{
    find_field, find_identifier, find_identifier_guarded, find_literal, FieldMatch, Multiplicity,
};
