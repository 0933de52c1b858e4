//! Rule trait and ordered rule set

use schemamend_core::{apply_edits, check_balance, Edit, EditError, StructureError};
use std::collections::HashSet;
use thiserror::Error;

/// Errors raised while a rule checks or rewrites the buffer
#[derive(Error, Debug)]
pub enum RuleError {
    /// A strict anchor was absent and the rule's applied form is absent too:
    /// the precondition the rule depends on does not hold.
    #[error("rule '{rule}': required anchor not found: {anchor}")]
    AnchorNotFound { rule: String, anchor: String },

    /// An insert found only some of its fields already in place. Re-running
    /// it blindly would duplicate declarations, so the partially migrated
    /// block is reported instead.
    #[error("rule '{rule}': block partially migrated; '{present}' exists but '{missing}' is absent")]
    PartialMigration {
        rule: String,
        present: String,
        missing: String,
    },

    /// Refusing to remove a field that is still referenced inside its block.
    #[error("rule '{rule}': field '{field}' is still referenced at offset {offset}")]
    FieldStillReferenced {
        rule: String,
        field: String,
        offset: usize,
    },

    #[error(transparent)]
    Structure(#[from] StructureError),

    #[error(transparent)]
    Edit(#[from] EditError),
}

/// Errors detected when assembling a rule set
#[derive(Error, Debug)]
pub enum OrderingError {
    #[error("rule '{rule}' requires '{ident}', which is produced only by the later rule '{produced_by}'")]
    UnmetRequirement {
        rule: String,
        ident: String,
        produced_by: String,
    },
}

/// A rewrite rule that can detect and rewrite one schema drift
pub trait Rule: Send + Sync {
    /// The unique identifier for this rule (e.g. "rename-booking-model")
    fn name(&self) -> &'static str;

    /// A short description of what this rule does
    fn description(&self) -> &'static str;

    /// Identifiers this rule expects to pre-exist. An identifier produced by
    /// an earlier rule (e.g. a renamed model) is a hard ordering dependency;
    /// identifiers produced by no rule are part of the initial schema.
    fn requires(&self) -> &[&'static str] {
        &[]
    }

    /// Identifiers this rule introduces into the buffer
    fn produces(&self) -> &[&'static str] {
        &[]
    }

    /// Check the current buffer and return the edits that apply this rule.
    /// An already-applied rule returns no edits; a rule whose anchor is
    /// missing without the applied form being present returns an error.
    fn check(&self, buffer: &str) -> Result<Vec<Edit>, RuleError>;
}

/// One rule's contribution to a run
#[derive(Debug, Clone)]
pub struct RuleApplication {
    pub name: &'static str,
    pub edits: usize,
}

/// Result of running a rule set to completion
#[derive(Debug)]
pub struct RuleOutcome {
    /// The fully rewritten buffer
    pub buffer: String,
    /// Per-rule edit counts, in application order (zero = already satisfied)
    pub applied: Vec<RuleApplication>,
}

/// An ordered sequence of rewrite rules.
///
/// Rules run strictly left to right against the same evolving buffer, so a
/// later rule always sees the effects of every earlier one. Dependencies
/// between rules are validated at construction time rather than discovered
/// mid-run.
pub struct RuleSet {
    rules: Vec<Box<dyn Rule>>,
}

impl std::fmt::Debug for RuleSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleSet").field("rules", &self.names()).finish()
    }
}

impl RuleSet {
    /// Assemble a rule set, rejecting any order in which a rule requires an
    /// identifier that only a later rule produces.
    pub fn new(rules: Vec<Box<dyn Rule>>) -> Result<Self, OrderingError> {
        let mut introduced: HashSet<&str> = HashSet::new();

        for (i, rule) in rules.iter().enumerate() {
            for ident in rule.requires() {
                if introduced.contains(ident) {
                    continue;
                }
                if let Some(later) = rules[i + 1..].iter().find(|r| r.produces().contains(ident))
                {
                    return Err(OrderingError::UnmetRequirement {
                        rule: rule.name().to_string(),
                        ident: ident.to_string(),
                        produced_by: later.name().to_string(),
                    });
                }
            }
            introduced.extend(rule.produces());
        }

        Ok(Self { rules })
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Rule names in application order
    pub fn names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    /// Run every rule in order against the buffer.
    ///
    /// Each rule checks the buffer produced by its predecessor; after each
    /// rewrite the block delimiters are re-verified so a rule that produced
    /// structurally invalid text aborts the run instead of corrupting the
    /// rules behind it.
    pub fn apply(&self, buffer: String) -> Result<RuleOutcome, RuleError> {
        let mut buffer = buffer;
        let mut applied = Vec::with_capacity(self.rules.len());

        check_balance(&buffer)?;

        for rule in &self.rules {
            let edits = rule.check(&buffer)?;
            applied.push(RuleApplication {
                name: rule.name(),
                edits: edits.len(),
            });

            if edits.is_empty() {
                continue;
            }

            buffer = apply_edits(&buffer, &edits)?;
            check_balance(&buffer)?;
        }

        Ok(RuleOutcome { buffer, applied })
    }
}
