//! Rename rules: whole-token model and field renames

use schemamend_core::{
    find_block, find_identifier, find_identifier_guarded, find_literal, Edit, Multiplicity, Span,
};

use crate::ruleset::{Rule, RuleError};

/// Rename a model across the whole buffer.
///
/// Every whole-token occurrence of the old name is rewritten (word
/// boundaries keep `Booking` out of `BookingStatus`), and the model's
/// `@@map("...")` table mapping is moved to its new external name. When a
/// skip-guard is set, occurrences followed by that literal are left alone.
pub struct RenameModel {
    pub name: &'static str,
    pub description: &'static str,
    pub old: &'static str,
    pub new: &'static str,
    /// `(old_table, new_table)` for the `@@map` annotation, when one exists
    pub map: Option<(&'static str, &'static str)>,
    pub skip_before: Option<&'static str>,
    pub produces: &'static [&'static str],
}

impl Rule for RenameModel {
    fn name(&self) -> &'static str {
        self.name
    }

    fn description(&self) -> &'static str {
        self.description
    }

    fn produces(&self) -> &[&'static str] {
        self.produces
    }

    fn check(&self, buffer: &str) -> Result<Vec<Edit>, RuleError> {
        if find_block(buffer, self.old)?.is_none() {
            // the old header must exist, unless the rename already happened
            if find_block(buffer, self.new)?.is_some() {
                return Ok(vec![]);
            }
            return Err(RuleError::AnchorNotFound {
                rule: self.name.to_string(),
                anchor: format!("model {}", self.old),
            });
        }

        let scope = Span::new(0, buffer.len());
        let occurrences = find_identifier_guarded(buffer, scope, self.old, self.skip_before);

        // bulk replace: the header itself guarantees at least one occurrence
        if !Multiplicity::Any.admits(occurrences.len()) {
            return Err(RuleError::AnchorNotFound {
                rule: self.name.to_string(),
                anchor: self.old.to_string(),
            });
        }

        let mut edits: Vec<Edit> = occurrences
            .into_iter()
            .map(|span| Edit::new(span, self.new, format!("Rename {} to {}", self.old, self.new)))
            .collect();

        if let Some((old_table, new_table)) = self.map {
            let old_lit = format!("@@map(\"{}\")", old_table);
            let new_lit = format!("@@map(\"{}\")", new_table);
            for span in find_literal(buffer, scope, &old_lit) {
                edits.push(Edit::new(
                    span,
                    new_lit.clone(),
                    format!("Remap table {} to {}", old_table, new_table),
                ));
            }
        }

        Ok(edits)
    }
}

/// Rename a field within one block, declaration and in-block references
/// (`@relation(fields: [...])`, `@@index([...])`) together.
pub struct RenameField {
    pub name: &'static str,
    pub description: &'static str,
    pub model: &'static str,
    pub old: &'static str,
    pub new: &'static str,
    pub expect_ty: Option<&'static str>,
    pub requires: &'static [&'static str],
    pub produces: &'static [&'static str],
}

impl Rule for RenameField {
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
        let block = find_block(buffer, self.model)?.ok_or_else(|| RuleError::AnchorNotFound {
            rule: self.name.to_string(),
            anchor: format!("model {}", self.model),
        })?;

        let decl = match schemamend_core::find_field(buffer, &block, self.old) {
            Some(decl) => decl,
            None => {
                if schemamend_core::find_field(buffer, &block, self.new).is_some() {
                    return Ok(vec![]);
                }
                return Err(RuleError::AnchorNotFound {
                    rule: self.name.to_string(),
                    anchor: format!("{}.{}", self.model, self.old),
                });
            }
        };

        if let Some(ty) = self.expect_ty {
            if decl.ty != ty {
                return Err(RuleError::AnchorNotFound {
                    rule: self.name.to_string(),
                    anchor: format!("{}.{} {}", self.model, self.old, ty),
                });
            }
        }

        Ok(find_identifier(buffer, block.body, self.old)
            .into_iter()
            .map(|span| {
                Edit::new(
                    span,
                    self.new,
                    format!("Rename {}.{} to {}", self.model, self.old, self.new),
                )
            })
            .collect())
    }
}
