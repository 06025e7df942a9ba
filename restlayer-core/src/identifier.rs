//! Identifier ambiguity resolution for client-supplied filters.
//!
//! The store's native identifier ([`ObjectId`]) and its 24 character hexadecimal rendering
//! are different values. A filter written with the string form does not match documents
//! that hold the native form, and vice versa. [`resolve_identifiers`] makes a filter
//! representation-agnostic by rewriting every clause whose value looks like an identifier
//! into an `$or` of both forms:
//!
//! ```text
//! { user: "507f1f77bcf86cd799439011" }
//!   => { $or: [ { user: "507f1f77bcf86cd799439011" },
//!               { user: ObjectId("507f1f77bcf86cd799439011") } ] }
//! ```
//!
//! The check is purely syntactic. Several rewritten fields at the same level are required
//! jointly through an `$and` of their `$or` groups, and the rewrite stays at the level of
//! the document it was found in. Arrays inside documents are copied unchanged, which is
//! what keeps a second pass over already resolved output from expanding it again. Only a
//! top-level array (an aggregation pipeline) is resolved element by element.
//!
//! Operator documents are descended into like any other sub-document, so
//! `{ f: { $eq: "<hex>" } }` becomes `{ f: { $or: [...] } }`, which the store rejects.
//! Plain equality or `$in` should be used for identifier fields. Filters built from flat
//! query parameters go through [`resolve_clauses`] instead, which leaves operator documents
//! other than `$in` alone.

use std::iter::once;
use bson::{Bson, Document, doc, oid::ObjectId};
use tracing::trace;


/// Length of the hexadecimal rendering of a native identifier.
pub const IDENTIFIER_HEX_LEN: usize = 24;

const MEMBERSHIP_OPERATOR: &str = "$in";

/// Decodes `value` if it is exactly [`IDENTIFIER_HEX_LEN`] hexadecimal characters.
pub fn parse_identifier(value: &str) -> Option<ObjectId> {
    if value.len() != IDENTIFIER_HEX_LEN || !value.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }

    ObjectId::parse_str(value).ok()
}

/// Returns the native form of an identifier candidate.
///
/// Candidates are identifier strings or non-empty arrays made only of identifier strings.
fn native_form(value: &Bson) -> Option<Bson> {
    match value {
        Bson::String(s) => parse_identifier(s).map(Bson::ObjectId),
        Bson::Array(items) if !items.is_empty() => items
            .iter()
            .map(|item| match item {
                Bson::String(s) => parse_identifier(s).map(Bson::ObjectId),
                _ => None,
            })
            .collect::<Option<Vec<_>>>()
            .map(Bson::Array),
        _ => None,
    }
}

/// Returns `true` if `value` is an identifier string or a non-empty array of them.
pub fn is_identifier_candidate(value: &Bson) -> bool {
    native_form(value).is_some()
}

/// For an operator document whose `$in` operand is an array of identifier strings,
/// returns a copy with only that operand decoded.
fn native_membership(value: &Bson) -> Option<Document> {
    let Bson::Document(operators) = value else {
        return None;
    };

    let operand = operators.get(MEMBERSHIP_OPERATOR)?;
    if !matches!(operand, Bson::Array(_)) {
        return None;
    }

    let native = native_form(operand)?;
    let mut rewritten = operators.clone();
    rewritten.insert(MEMBERSHIP_OPERATOR, native);
    Some(rewritten)
}

/// Resolves identifier clauses anywhere in `value`.
///
/// Documents are rewritten, arrays are resolved element-wise, and every other value is
/// returned unchanged.
pub fn resolve_identifiers(value: &Bson) -> Bson {
    match value {
        Bson::Document(document) => Bson::Document(resolve_document(document)),
        Bson::Array(items) => Bson::Array(items.iter().map(resolve_identifiers).collect()),
        other => other.clone(),
    }
}

/// Resolves identifier clauses in one filter document and its sub-documents.
pub fn resolve_document(document: &Document) -> Document {
    resolve_level(document, true)
}

/// Resolves only the top-level clauses of a filter built from flat parameters.
///
/// Plain equality values and `$in` operands are expanded. Every other operator document
/// is copied unchanged, since a field-level `$or` is rejected by the store and an `$or`
/// of negated clauses matches every document.
pub fn resolve_clauses(document: &Document) -> Document {
    resolve_level(document, false)
}

fn resolve_level(document: &Document, descend: bool) -> Document {
    let mut resolved = Document::new();
    let mut groups = Vec::new();

    for (key, value) in document {
        if let Some(native) = native_form(value) {
            trace!(field = key.as_str(), "expanding identifier clause");
            groups.push(alternatives(key, value.clone(), native));
        } else if let Some(native) = native_membership(value) {
            trace!(field = key.as_str(), "expanding identifier membership clause");
            groups.push(alternatives(key, value.clone(), Bson::Document(native)));
        } else if let (true, Bson::Document(nested)) = (descend, value) {
            resolved.insert(key, resolve_document(nested));
        } else {
            resolved.insert(key, value.clone());
        }
    }

    merge_groups(resolved, groups)
}

fn alternatives(key: &str, original: Bson, native: Bson) -> Vec<Bson> {
    vec![
        Bson::Document(doc! { key: original }),
        Bson::Document(doc! { key: native }),
    ]
}

/// Attaches the `$or` groups generated for one level to its resolved document.
///
/// A single group becomes `$or`. Several groups, or a group next to an `$or` or `$and`
/// the document already had, are combined under one `$and`.
fn merge_groups(mut resolved: Document, mut groups: Vec<Vec<Bson>>) -> Document {
    if groups.is_empty() {
        return resolved;
    }

    let has_or = resolved.contains_key("$or");
    let has_and = resolved.contains_key("$and");

    if groups.len() == 1 && !has_or && !has_and {
        if let Some(alternatives) = groups.pop() {
            resolved.insert("$or", alternatives);
        }
        return resolved;
    }

    let generated = groups
        .into_iter()
        .map(|alternatives| Bson::Document(doc! { "$or": alternatives }));

    if let Some(and) = resolved.get_mut("$and") {
        match and {
            Bson::Array(existing) => existing.extend(generated),
            other => {
                let previous = std::mem::replace(other, Bson::Null);
                *other = Bson::Array(once(previous).chain(generated).collect());
            }
        }
        return resolved;
    }

    let combined: Vec<Bson> = match resolved.remove("$or") {
        Some(existing) => once(Bson::Document(doc! { "$or": existing }))
            .chain(generated)
            .collect(),
        None => generated.collect(),
    };
    resolved.insert("$and", combined);
    resolved
}
