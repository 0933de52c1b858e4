//! Relation restructure rules
//!
//! Prisma relations come in pairs, so restructuring one side usually means
//! touching the other: making a relation required strips the `?` from both
//! the object field and its foreign-key scalar, and linking two models adds
//! the scalar on the owning side and the collection on the related side.

use schemamend_core::{find_block, find_field, Edit, Span};

use crate::ruleset::{Rule, RuleError};

fn anchor_err(rule: &str, anchor: String) -> RuleError {
    RuleError::AnchorNotFound {
        rule: rule.to_string(),
        anchor,
    }
}

/// Turn an optional singular relation into a required one, foreign-key
/// scalar included.
pub struct RequireRelation {
    pub name: &'static str,
    pub description: &'static str,
    pub model: &'static str,
    /// The foreign-key scalar, e.g. `inventoryId`
    pub scalar: &'static str,
    /// The relation object field, e.g. `inventory`
    pub relation: &'static str,
    /// The related model that the object field is typed as
    pub related: &'static str,
    pub requires: &'static [&'static str],
}

impl Rule for RequireRelation {
    fn name(&self) -> &'static str {
        self.name
    }

    fn description(&self) -> &'static str {
        self.description
    }

    fn requires(&self) -> &[&'static str] {
        self.requires
    }

    fn check(&self, buffer: &str) -> Result<Vec<Edit>, RuleError> {
        let block = find_block(buffer, self.model)?
            .ok_or_else(|| anchor_err(self.name, format!("model {}", self.model)))?;

        let rel = find_field(buffer, &block, self.relation)
            .ok_or_else(|| anchor_err(self.name, format!("{}.{}", self.model, self.relation)))?;
        let scalar = find_field(buffer, &block, self.scalar)
            .ok_or_else(|| anchor_err(self.name, format!("{}.{}", self.model, self.scalar)))?;

        let optional_ty = format!("{}?", self.related);
        let mut edits = Vec::new();

        if rel.ty == optional_ty {
            edits.push(Edit::new(
                rel.ty_span,
                self.related,
                format!("Require {}.{}", self.model, self.relation),
            ));
        } else if rel.ty != self.related {
            return Err(anchor_err(
                self.name,
                format!("{}.{} {}", self.model, self.relation, optional_ty),
            ));
        }

        if let Some(required) = scalar.ty.strip_suffix('?') {
            edits.push(Edit::new(
                scalar.ty_span,
                required.to_string(),
                format!("Require {}.{}", self.model, self.scalar),
            ));
        }

        Ok(edits)
    }
}

/// Link two models: insert the foreign-key scalar after an anchor on the
/// owning side and the paired collection field after an anchor on the
/// related side. Each side is checked independently, so a half-applied link
/// is completed rather than duplicated.
pub struct LinkRelation {
    pub name: &'static str,
    pub description: &'static str,
    /// Model that owns the foreign key
    pub owner: &'static str,
    pub scalar_decl: &'static str,
    pub owner_anchor: &'static str,
    /// Model that gains the collection field
    pub related: &'static str,
    pub collection_decl: &'static str,
    pub related_anchor: &'static str,
    pub requires: &'static [&'static str],
    pub produces: &'static [&'static str],
}

impl LinkRelation {
    fn insert_after(
        &self,
        buffer: &str,
        model: &str,
        anchor: &str,
        decl: &str,
    ) -> Result<Option<Edit>, RuleError> {
        let block = find_block(buffer, model)?
            .ok_or_else(|| anchor_err(self.name, format!("model {}", model)))?;

        let field = decl.split_whitespace().next().unwrap_or(decl);
        if find_field(buffer, &block, field).is_some() {
            return Ok(None);
        }

        let at = find_field(buffer, &block, anchor)
            .ok_or_else(|| anchor_err(self.name, format!("{}.{}", model, anchor)))?;

        Ok(Some(Edit::new(
            Span::new(at.line.end, at.line.end),
            format!("\n{}{}", at.indent, decl),
            format!("Link {}.{}", model, field),
        )))
    }
}

impl Rule for LinkRelation {
    fn name(&self) -> &'static str {
        self.name
    }

    fn description(&self) -> &'static str {
        self.description
    }

    fn requires(&self) -> &[&'static str] {
        self.requires
    }

    fn produces(&self) -> &[&'static str] {
        self.produces
    }

    fn check(&self, buffer: &str) -> Result<Vec<Edit>, RuleError> {
        let mut edits = Vec::new();

        if let Some(edit) =
            self.insert_after(buffer, self.owner, self.owner_anchor, self.scalar_decl)?
        {
            edits.push(edit);
        }
        if let Some(edit) =
            self.insert_after(buffer, self.related, self.related_anchor, self.collection_decl)?
        {
            edits.push(edit);
        }

        Ok(edits)
    }
}
