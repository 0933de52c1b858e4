//! Anchor matching for rewrite rules
//!
//! Two anchor shapes cover every rule: whole-token identifier occurrences
//! (for renames and literal annotations) and field-declaration lines inside
//! one block (for field patches). Identifier matching is word-boundary
//! aware so `Booking` never matches inside `BookingStatus`.

use regex::Regex;

use crate::block::Block;
use crate::edit::Span;

/// How many matches a rule's anchor is allowed to produce
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Multiplicity {
    /// Exactly one match; zero or several means the precondition is stale
    ExactlyOne,
    /// One or more matches, all rewritten
    Any,
    /// Zero matches is a valid steady state
    Optional,
}

impl Multiplicity {
    pub fn admits(&self, found: usize) -> bool {
        match self {
            Multiplicity::ExactlyOne => found == 1,
            Multiplicity::Any => found >= 1,
            Multiplicity::Optional => true,
        }
    }
}

/// All whole-token occurrences of `ident` within `scope`, in source order.
pub fn find_identifier(source: &str, scope: Span, ident: &str) -> Vec<Span> {
    find_identifier_guarded(source, scope, ident, None)
}

/// Like [`find_identifier`], but occurrences followed (after horizontal
/// whitespace) by `not_before` are skipped. The regex crate has no
/// lookaround, so the guard is a post-match probe of the trailing text.
pub fn find_identifier_guarded(
    source: &str,
    scope: Span,
    ident: &str,
    not_before: Option<&str>,
) -> Vec<Span> {
    let pattern = Regex::new(&format!(r"\b{}\b", regex::escape(ident)))
        .expect("valid identifier pattern");
    let haystack = &source[scope.start..scope.end];

    pattern
        .find_iter(haystack)
        .map(|m| Span::new(scope.start + m.start(), scope.start + m.end()))
        .filter(|span| match not_before {
            Some(guard) => {
                let rest = source[span.end..scope.end].trim_start_matches([' ', '\t']);
                !rest.starts_with(guard)
            }
            None => true,
        })
        .collect()
}

/// All occurrences of a literal (e.g. `@@map("bookings")`) within `scope`.
pub fn find_literal(source: &str, scope: Span, literal: &str) -> Vec<Span> {
    let haystack = &source[scope.start..scope.end];
    let mut spans = Vec::new();
    let mut from = 0;

    while let Some(pos) = haystack[from..].find(literal) {
        let start = scope.start + from + pos;
        spans.push(Span::new(start, start + literal.len()));
        from += pos + literal.len();
    }

    spans
}

/// A matched field-declaration line inside a block
#[derive(Debug, Clone)]
pub struct FieldMatch {
    /// The whole line, indent included, line terminator excluded
    pub line: Span,
    /// Leading whitespace of the line
    pub indent: String,
    /// The declared type token, e.g. `ShopInventory?`
    pub ty: String,
    /// Span of the type token, for in-place type rewrites
    pub ty_span: Span,
    /// Everything after the type (attributes), trimmed
    pub attrs: String,
}

/// Match the declaration line for field `name` inside `block`.
///
/// The name must match the whole field token: looking for `weight` will not
/// match a `weightKg` declaration. Field names are unique within a Prisma
/// block, so at most one match exists.
pub fn find_field(source: &str, block: &Block, name: &str) -> Option<FieldMatch> {
    let pattern = Regex::new(&format!(
        r"(?m)^([ \t]*){}[ \t]+(\S+)[ \t]*(.*?)[ \t\r]*$",
        regex::escape(name)
    ))
    .expect("valid field pattern");

    let body = block.body_text(source);
    let caps = pattern.captures(body)?;
    let whole = caps.get(0).expect("match 0");
    let indent = caps.get(1).expect("indent group");
    let ty = caps.get(2).expect("type group");
    let attrs = caps.get(3).map(|m| m.as_str()).unwrap_or("");

    let base = block.body.start;
    Some(FieldMatch {
        line: Span::new(base + whole.start(), base + whole.end()),
        indent: indent.as_str().to_string(),
        ty: ty.as_str().to_string(),
        ty_span: Span::new(base + ty.start(), base + ty.end()),
        attrs: attrs.trim().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::find_block;

    fn whole(source: &str) -> Span {
        Span::new(0, source.len())
    }

    #[test]
    fn test_word_boundaries() {
        let source = "Booking BookingStatus OverbookingPolicy Booking[]";
        let spans = find_identifier(source, whole(source), "Booking");

        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0], Span::new(0, 7));
        // the [] suffix is not a word character, so the list type matches
        assert_eq!(&source[spans[1].start..spans[1].end], "Booking");
        assert_eq!(spans[1].start, 40);
    }

    #[test]
    fn test_guard_skips_relation_use() {
        let source = "booking   Booking  @relation(fields: [bookingId])\nitems Booking[]";
        let spans = find_identifier_guarded(source, whole(source), "Booking", Some("@relation"));

        assert_eq!(spans.len(), 1);
        assert_eq!(&source[spans[0].start..spans[0].end + 2], "Booking[]");
    }

    #[test]
    fn test_scoped_search() {
        let source = "Booking here\nmodel X {\n  b Booking\n}\n";
        let spans = find_identifier(source, Span::new(13, source.len()), "Booking");
        assert_eq!(spans.len(), 1);
        assert!(spans[0].start > 13);
    }

    #[test]
    fn test_find_literal() {
        let source = "  @@map(\"bookings\")\n";
        let spans = find_literal(source, whole(source), "@@map(\"bookings\")");
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0], Span::new(2, 19));
    }

    const BLOCK: &str = "model AgingLog {\n  id      String @id\n  weight  Float?\n  weightKg Float?\n  notes   String? @map(\"note\")\n}\n";

    #[test]
    fn test_field_match() {
        let block = find_block(BLOCK, "AgingLog").unwrap().unwrap();
        let m = find_field(BLOCK, &block, "weight").unwrap();

        assert_eq!(m.ty, "Float?");
        assert_eq!(m.indent, "  ");
        assert_eq!(&BLOCK[m.line.start..m.line.end], "  weight  Float?");
    }

    #[test]
    fn test_field_name_is_exact() {
        let block = find_block(BLOCK, "AgingLog").unwrap().unwrap();
        let m = find_field(BLOCK, &block, "weightKg").unwrap();
        assert_eq!(&BLOCK[m.line.start..m.line.end], "  weightKg Float?");

        // and the prefix field does not swallow the longer name's line
        let m = find_field(BLOCK, &block, "weight").unwrap();
        assert!(!BLOCK[m.line.start..m.line.end].contains("Kg"));
    }

    #[test]
    fn test_field_attrs_captured() {
        let block = find_block(BLOCK, "AgingLog").unwrap().unwrap();
        let m = find_field(BLOCK, &block, "notes").unwrap();
        assert_eq!(m.ty, "String?");
        assert_eq!(m.attrs, "@map(\"note\")");
    }

    #[test]
    fn test_field_absent() {
        let block = find_block(BLOCK, "AgingLog").unwrap().unwrap();
        assert!(find_field(BLOCK, &block, "photos").is_none());
    }

    #[test]
    fn test_multiplicity() {
        assert!(Multiplicity::ExactlyOne.admits(1));
        assert!(!Multiplicity::ExactlyOne.admits(0));
        assert!(!Multiplicity::ExactlyOne.admits(2));
        assert!(Multiplicity::Any.admits(3));
        assert!(!Multiplicity::Any.admits(0));
        assert!(Multiplicity::Optional.admits(0));
    }
}
