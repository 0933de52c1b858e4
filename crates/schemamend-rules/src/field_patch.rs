//! Field-level patch rules: insert, replace, remove, annotation rewrite
//!
//! Every rule here is block-scoped: anchors are resolved inside one located
//! model block, so an identically named field in another model is never
//! touched.

use schemamend_core::{
    find_block, find_field, find_identifier, find_literal, Block, Edit, Multiplicity, Span,
};

use crate::ruleset::{Rule, RuleError};

/// Where inserted fields land relative to the anchor field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    Before,
    After,
}

/// First field name declared in a slice of declaration lines, skipping
/// blank and comment lines.
fn lead_field<'a>(decls: &[&'a str]) -> &'a str {
    decls
        .iter()
        .map(|d| d.trim())
        .find(|d| !d.is_empty() && !d.starts_with("//"))
        .and_then(|d| d.split_whitespace().next())
        .unwrap_or("")
}

/// Every field name declared in a slice of declaration lines, skipping
/// blank and comment lines.
fn declared_names<'a>(decls: &[&'a str]) -> Vec<&'a str> {
    decls
        .iter()
        .map(|d| d.trim())
        .filter(|d| !d.is_empty() && !d.starts_with("//"))
        .filter_map(|d| d.split_whitespace().next())
        .collect()
}

/// Declared type of the line in `decls` whose field name is `name`
fn declared_ty<'a>(decls: &[&'a str], name: &str) -> Option<&'a str> {
    decls.iter().find_map(|d| {
        let mut parts = d.split_whitespace();
        (parts.next() == Some(name)).then(|| parts.next()).flatten()
    })
}

fn locate(rule: &'static str, buffer: &str, model: &str) -> Result<Block, RuleError> {
    find_block(buffer, model)?.ok_or_else(|| RuleError::AnchorNotFound {
        rule: rule.to_string(),
        anchor: format!("model {}", model),
    })
}

/// Insert new field declarations immediately before or after an anchor
/// field. Idempotent: once every inserted field exists in the block, the
/// rule is satisfied. A block holding only some of the fields is refused,
/// since inserting again would duplicate the ones already there.
pub struct InsertFields {
    pub name: &'static str,
    pub description: &'static str,
    pub model: &'static str,
    pub anchor: &'static str,
    pub position: Position,
    /// Declaration lines without indentation; blank and `//` lines allowed
    pub fields: &'static [&'static str],
    pub requires: &'static [&'static str],
    pub produces: &'static [&'static str],
}

impl Rule for InsertFields {
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
        let block = locate(self.name, buffer, self.model)?;

        let names = declared_names(self.fields);
        let (present, missing): (Vec<&str>, Vec<&str>) = names
            .into_iter()
            .partition(|n| find_field(buffer, &block, n).is_some());
        if missing.is_empty() {
            return Ok(vec![]);
        }
        if let Some(found) = present.first() {
            return Err(RuleError::PartialMigration {
                rule: self.name.to_string(),
                present: found.to_string(),
                missing: missing[0].to_string(),
            });
        }

        let anchor =
            find_field(buffer, &block, self.anchor).ok_or_else(|| RuleError::AnchorNotFound {
                rule: self.name.to_string(),
                anchor: format!("{}.{}", self.model, self.anchor),
            })?;

        let mut text = String::new();
        let edit_span = match self.position {
            Position::Before => {
                for decl in self.fields {
                    if decl.is_empty() {
                        text.push('\n');
                    } else {
                        text.push_str(&anchor.indent);
                        text.push_str(decl);
                        text.push('\n');
                    }
                }
                Span::new(anchor.line.start, anchor.line.start)
            }
            Position::After => {
                for decl in self.fields {
                    text.push('\n');
                    if !decl.is_empty() {
                        text.push_str(&anchor.indent);
                        text.push_str(decl);
                    }
                }
                Span::new(anchor.line.end, anchor.line.end)
            }
        };

        Ok(vec![Edit::new(
            edit_span,
            text,
            format!(
                "Insert {} field(s) into {} at {}",
                self.fields.len(),
                self.model,
                self.anchor
            ),
        )])
    }
}

/// Replace one field declaration with one or more lines, preserving its
/// indent and relative position. When `expect_ty` is set the existing
/// declaration must carry that type, so a half-migrated schema fails loudly
/// instead of being rewritten twice.
#[derive(Clone, Copy)]
pub struct ReplaceField {
    pub name: &'static str,
    pub description: &'static str,
    pub model: &'static str,
    pub field: &'static str,
    pub expect_ty: Option<&'static str>,
    pub replacement: &'static [&'static str],
    pub requires: &'static [&'static str],
    pub produces: &'static [&'static str],
}

impl Rule for ReplaceField {
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
        let block = locate(self.name, buffer, self.model)?;
        let lead = lead_field(self.replacement);

        let decl = match find_field(buffer, &block, self.field) {
            Some(decl) => decl,
            None => {
                // renamed away already?
                if lead != self.field && find_field(buffer, &block, lead).is_some() {
                    return Ok(vec![]);
                }
                return Err(RuleError::AnchorNotFound {
                    rule: self.name.to_string(),
                    anchor: format!("{}.{}", self.model, self.field),
                });
            }
        };

        if let Some(ty) = self.expect_ty {
            if decl.ty != ty {
                // the declaration may already have the target shape
                if declared_ty(self.replacement, self.field) == Some(decl.ty.as_str()) {
                    return Ok(vec![]);
                }
                return Err(RuleError::AnchorNotFound {
                    rule: self.name.to_string(),
                    anchor: format!("{}.{} {}", self.model, self.field, ty),
                });
            }
        }

        let text = self
            .replacement
            .iter()
            .map(|line| format!("{}{}", decl.indent, line))
            .collect::<Vec<_>>()
            .join("\n");

        Ok(vec![Edit::new(
            decl.line,
            text,
            format!("Replace {}.{}", self.model, self.field),
        )])
    }
}

/// Remove a field declaration line. Removal refuses to run while the field
/// is still referenced elsewhere in its block (relation mappings, indexes);
/// an absent field is a valid steady state.
pub struct RemoveField {
    pub name: &'static str,
    pub description: &'static str,
    pub model: &'static str,
    pub field: &'static str,
    pub requires: &'static [&'static str],
}

impl Rule for RemoveField {
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
        let block = locate(self.name, buffer, self.model)?;

        let decl = match find_field(buffer, &block, self.field) {
            Some(decl) => decl,
            None => return Ok(vec![]),
        };

        for span in find_identifier(buffer, block.body, self.field) {
            if !decl.line.contains(span) {
                return Err(RuleError::FieldStillReferenced {
                    rule: self.name.to_string(),
                    field: self.field.to_string(),
                    offset: span.start,
                });
            }
        }

        // take the line terminator with the line
        let end = if buffer[decl.line.end..].starts_with('\n') {
            decl.line.end + 1
        } else {
            decl.line.end
        };

        Ok(vec![Edit::new(
            Span::new(decl.line.start, end),
            "",
            format!("Remove {}.{}", self.model, self.field),
        )])
    }
}

/// Rewrite a block-level annotation (e.g. an `@@index([...])`) by literal
/// match inside one block.
#[derive(Clone, Copy)]
pub struct UpdateAnnotation {
    pub name: &'static str,
    pub description: &'static str,
    pub model: &'static str,
    pub old: &'static str,
    pub new: &'static str,
    pub requires: &'static [&'static str],
}

impl Rule for UpdateAnnotation {
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
        let block = locate(self.name, buffer, self.model)?;

        let spans = find_literal(buffer, block.body, self.old);
        if spans.is_empty() && !find_literal(buffer, block.body, self.new).is_empty() {
            return Ok(vec![]);
        }
        if !Multiplicity::ExactlyOne.admits(spans.len()) {
            return Err(RuleError::AnchorNotFound {
                rule: self.name.to_string(),
                anchor: format!("{} in {} (found {})", self.old, self.model, spans.len()),
            });
        }

        Ok(spans
            .into_iter()
            .map(|span| {
                Edit::new(
                    span,
                    self.new,
                    format!("Rewrite annotation in {}", self.model),
                )
            })
            .collect())
    }
}
