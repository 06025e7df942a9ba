//! Filter trees built from flat query parameters.
//!
//! A flat parameter source (a query string) carries one criterion per key. The key names
//! the field and may carry an operator suffix after a delimiter:
//!
//! | Key          | Field | Operator |
//! |--------------|-------|----------|
//! | `age`        | `age` | `eq`     |
//! | `age$`       | `age` | `eq`     |
//! | `age$gte`    | `age` | `gte`    |
//! | `age$regex`  | `age` | `regex` (passed through) |
//! | `age$gt$lt`  | skipped (ambiguous) | |
//! | `$gt`        | skipped (empty field) | |
//!
//! [`FilterParser::parse`] turns those entries into a [`FilterTree`], coercing every value
//! through the schema. Several operators on one field accumulate into a single
//! [`ClauseSet`], all of which must match.
//!
//! # Rendering
//!
//! Trees are rendered into the store's query syntax through the [`FilterVisitor`] trait.
//! [`BsonRenderer`] produces a BSON filter document:
//!
//! ```ignore
//! use restlayer_core::{filter::extract_conditions, schema::{FieldType, SchemaDescriptor}};
//!
//! let schema = SchemaDescriptor::from_iter([("age", FieldType::Number)]);
//! let tree = extract_conditions([("age$gte", "10"), ("age$lt", "20")], &schema);
//!
//! assert_eq!(tree.to_document(), bson::doc! { "age": { "$gte": 10_i64, "$lt": 20_i64 } });
//! ```

use std::collections::BTreeMap;
use bson::{Bson, Document};
use tracing::{debug, trace};

use crate::{
    coerce::{TypedValue, ValueCoercer},
    config::TranslatorConfig,
    schema::SchemaDescriptor,
};


/// Comparison and membership operators.
///
/// Suffixes that are not one of the standard operators are kept verbatim in
/// [`Operator::Other`] and handed to the store as-is.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Operator {
    /// Equal to.
    Eq,
    /// Not equal to.
    Ne,
    /// Greater than.
    Gt,
    /// Greater than or equal to.
    Gte,
    /// Less than.
    Lt,
    /// Less than or equal to.
    Lte,
    /// Value is one of a list.
    In,
    /// Value is none of a list.
    Nin,
    /// Any other store operator, by name without the `$` prefix.
    Other(String),
}

impl Operator {
    /// Maps a key suffix to an operator. The empty suffix is equality.
    pub fn from_suffix(suffix: &str) -> Self {
        match suffix {
            "" | "eq" => Operator::Eq,
            "ne" => Operator::Ne,
            "gt" => Operator::Gt,
            "gte" => Operator::Gte,
            "lt" => Operator::Lt,
            "lte" => Operator::Lte,
            "in" => Operator::In,
            "nin" => Operator::Nin,
            other => Operator::Other(other.to_string()),
        }
    }

    /// Returns the operator's name in the store's query syntax (`$gte`).
    pub fn as_store_name(&self) -> String {
        let name = match self {
            Operator::Eq => "eq",
            Operator::Ne => "ne",
            Operator::Gt => "gt",
            Operator::Gte => "gte",
            Operator::Lt => "lt",
            Operator::Lte => "lte",
            Operator::In => "in",
            Operator::Nin => "nin",
            Operator::Other(name) => name,
        };
        format!("${name}")
    }
}


/// A single `(field, operator, value)` criterion.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterClause {
    pub field: String,
    pub operator: Operator,
    pub value: TypedValue,
}

impl FilterClause {
    pub fn new(field: impl Into<String>, operator: Operator, value: TypedValue) -> Self {
        Self { field: field.into(), operator, value }
    }
}


/// The clauses that apply to one field. All of them must match.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClauseSet {
    clauses: Vec<FilterClause>,
}

impl ClauseSet {
    /// Adds a clause, replacing an earlier clause with the same operator.
    pub fn insert(&mut self, clause: FilterClause) {
        match self.clauses.iter_mut().find(|c| c.operator == clause.operator) {
            Some(existing) => *existing = clause,
            None => self.clauses.push(clause),
        }
    }

    /// Returns the value bound to `operator`, if any.
    pub fn get(&self, operator: &Operator) -> Option<&TypedValue> {
        self.clauses
            .iter()
            .find(|c| &c.operator == operator)
            .map(|c| &c.value)
    }

    pub fn contains(&self, operator: &Operator) -> bool {
        self.get(operator).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FilterClause> {
        self.clauses.iter()
    }

    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }
}


/// What a field of a [`FilterTree`] is matched against.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldFilter {
    /// Operator clauses on the field itself.
    Clauses(ClauseSet),
    /// A filter over a sub-document.
    Nested(FilterTree),
}


/// Structured query constraints.
///
/// Fields combine under an implicit AND. `and` and `or` hold explicit groups of sub-trees.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterTree {
    fields: BTreeMap<String, FieldFilter>,
    and: Vec<FilterTree>,
    or: Vec<FilterTree>,
}

impl FilterTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a clause to its field's clause set.
    ///
    /// A nested filter already stored under the same field is replaced.
    pub fn insert_clause(&mut self, clause: FilterClause) {
        let entry = self
            .fields
            .entry(clause.field.clone())
            .or_insert_with(|| FieldFilter::Clauses(ClauseSet::default()));

        if let FieldFilter::Nested(_) = entry {
            *entry = FieldFilter::Clauses(ClauseSet::default());
        }
        if let FieldFilter::Clauses(set) = entry {
            set.insert(clause);
        }
    }

    /// Stores a sub-document filter under `field`, replacing whatever was there.
    pub fn insert_nested(&mut self, field: impl Into<String>, tree: FilterTree) {
        self.fields.insert(field.into(), FieldFilter::Nested(tree));
    }

    /// Adds a sub-tree to the explicit AND group.
    pub fn and(mut self, tree: FilterTree) -> Self {
        self.and.push(tree);
        self
    }

    /// Adds a sub-tree to the explicit OR group.
    pub fn or(mut self, tree: FilterTree) -> Self {
        self.or.push(tree);
        self
    }

    pub fn field(&self, name: &str) -> Option<&FieldFilter> {
        self.fields.get(name)
    }

    /// Returns the clause set of `name`, if it holds clauses rather than a nested filter.
    pub fn clauses(&self, name: &str) -> Option<&ClauseSet> {
        match self.fields.get(name) {
            Some(FieldFilter::Clauses(set)) => Some(set),
            _ => None,
        }
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldFilter)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn and_groups(&self) -> &[FilterTree] {
        &self.and
    }

    pub fn or_groups(&self) -> &[FilterTree] {
        &self.or
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.and.is_empty() && self.or.is_empty()
    }

    /// Renders this tree as a BSON filter document.
    pub fn to_document(&self) -> Document {
        BsonRenderer.visit_tree(self)
    }
}


/// Parses flat `key → raw value` entries into a [`FilterTree`].
#[derive(Debug, Clone)]
pub struct FilterParser {
    delimiter: char,
    coercer: ValueCoercer,
}

impl Default for FilterParser {
    fn default() -> Self {
        Self::from_config(&TranslatorConfig::default())
    }
}

impl FilterParser {
    pub fn from_config(config: &TranslatorConfig) -> Self {
        Self {
            delimiter: config.operator_delimiter,
            coercer: ValueCoercer::from_config(config),
        }
    }

    /// Splits a flat key into its field and operator.
    ///
    /// Returns `None` for keys with an empty field name or more than one delimiter.
    pub fn split_key<'k>(&self, key: &'k str) -> Option<(&'k str, Operator)> {
        let mut parts = key.split(self.delimiter);
        let field = parts.next().unwrap_or_default();
        let suffix = parts.next().unwrap_or_default();

        if field.is_empty() || parts.next().is_some() {
            return None;
        }

        Some((field, Operator::from_suffix(suffix)))
    }

    /// Builds a filter tree from flat entries, coercing each value through `schema`.
    ///
    /// Ambiguous keys are skipped without error.
    pub fn parse<K, V>(
        &self,
        entries: impl IntoIterator<Item = (K, V)>,
        schema: &SchemaDescriptor,
    ) -> FilterTree
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut tree = FilterTree::new();

        for (key, raw) in entries {
            let key = key.as_ref();
            let Some((field, operator)) = self.split_key(key) else {
                debug!(key, "skipping ambiguous filter key");
                continue;
            };

            let value = self.coercer.coerce(field, raw.as_ref(), schema);
            if value.is_sentinel() {
                debug!(field, ?operator, "filter value did not coerce to the declared type");
            }
            tree.insert_clause(FilterClause::new(field, operator, value));
        }

        trace!(fields = tree.fields.len(), "parsed flat filter");
        tree
    }
}

/// Parses flat entries with the default delimiter (`$`), list separator, and null literal.
pub fn extract_conditions<K, V>(
    entries: impl IntoIterator<Item = (K, V)>,
    schema: &SchemaDescriptor,
) -> FilterTree
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    FilterParser::default().parse(entries, schema)
}


pub trait FilterVisitor {
    type Output;

    fn visit_tree(&mut self, tree: &FilterTree) -> Self::Output;
    fn visit_clauses(&mut self, field: &str, clauses: &ClauseSet) -> Self::Output;
    fn visit_nested(&mut self, field: &str, tree: &FilterTree) -> Self::Output;
    fn visit_and(&mut self, trees: &[FilterTree]) -> Self::Output;
    fn visit_or(&mut self, trees: &[FilterTree]) -> Self::Output;

    fn visit_field(&mut self, field: &str, filter: &FieldFilter) -> Self::Output {
        match filter {
            FieldFilter::Clauses(clauses) => self.visit_clauses(field, clauses),
            FieldFilter::Nested(tree) => self.visit_nested(field, tree),
        }
    }
}

/// Renders filter trees into BSON filter documents.
///
/// A field whose only clause is equality renders as plain `{field: value}`, so the
/// identifier resolver can recognise it. Other clause sets render as
/// `{field: {"$op": value, ...}}`.
pub struct BsonRenderer;

impl FilterVisitor for BsonRenderer {
    type Output = Document;

    fn visit_tree(&mut self, tree: &FilterTree) -> Self::Output {
        let mut document = Document::new();

        for (field, filter) in tree.fields() {
            document.extend(self.visit_field(field, filter));
        }
        if !tree.and.is_empty() {
            document.extend(self.visit_and(&tree.and));
        }
        if !tree.or.is_empty() {
            document.extend(self.visit_or(&tree.or));
        }

        document
    }

    fn visit_clauses(&mut self, field: &str, clauses: &ClauseSet) -> Self::Output {
        let value = match (clauses.len(), clauses.get(&Operator::Eq)) {
            (1, Some(value)) => Bson::from(value.clone()),
            _ => Bson::Document(
                clauses
                    .iter()
                    .map(|c| (c.operator.as_store_name(), Bson::from(c.value.clone())))
                    .collect(),
            ),
        };

        let mut document = Document::new();
        document.insert(field, value);
        document
    }

    fn visit_nested(&mut self, field: &str, tree: &FilterTree) -> Self::Output {
        let mut document = Document::new();
        document.insert(field, self.visit_tree(tree));
        document
    }

    fn visit_and(&mut self, trees: &[FilterTree]) -> Self::Output {
        let mut document = Document::new();
        document.insert(
            "$and",
            trees.iter().map(|tree| Bson::Document(self.visit_tree(tree))).collect::<Vec<_>>(),
        );
        document
    }

    fn visit_or(&mut self, trees: &[FilterTree]) -> Self::Output {
        let mut document = Document::new();
        document.insert(
            "$or",
            trees.iter().map(|tree| Bson::Document(self.visit_tree(tree))).collect::<Vec<_>>(),
        );
        document
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;
    use std::collections::HashMap;

    use crate::schema::FieldType;

    fn schema() -> SchemaDescriptor {
        SchemaDescriptor::from_iter([
            ("name", FieldType::String),
            ("age", FieldType::Number),
            ("active", FieldType::Boolean),
        ])
    }

    #[test]
    fn operators_on_one_field_accumulate() {
        let tree = extract_conditions([("age$gte", "10"), ("age$lt", "20")], &schema());

        let clauses = tree.clauses("age").unwrap();
        assert_eq!(clauses.len(), 2);
        assert_eq!(clauses.get(&Operator::Gte), Some(&TypedValue::Integer(10)));
        assert_eq!(clauses.get(&Operator::Lt), Some(&TypedValue::Integer(20)));
        assert_eq!(tree.fields().count(), 1);
    }

    #[test]
    fn keys_without_suffix_are_equality() {
        let tree = extract_conditions([("name", "Tom"), ("age$", "3")], &schema());

        assert_eq!(
            tree.clauses("name").unwrap().get(&Operator::Eq),
            Some(&TypedValue::String("Tom".into())),
        );
        assert_eq!(
            tree.clauses("age").unwrap().get(&Operator::Eq),
            Some(&TypedValue::Integer(3)),
        );
    }

    #[test]
    fn ambiguous_keys_are_skipped() {
        let tree = extract_conditions(
            [("$", "x"), ("$gt", "1"), ("age$gt$lt", "5"), ("name", "Tom")],
            &schema(),
        );

        assert_eq!(tree.fields().map(|(f, _)| f).collect::<Vec<_>>(), vec!["name"]);
        assert!(extract_conditions([("$", "x")], &schema()).is_empty());
    }

    #[test]
    fn unknown_suffix_passes_through() {
        let tree = extract_conditions([("name$regex", "^To")], &schema());

        assert_eq!(
            tree.clauses("name").unwrap().get(&Operator::Other("regex".into())),
            Some(&TypedValue::String("^To".into())),
        );
        assert_eq!(tree.to_document(), doc! { "name": { "$regex": "^To" } });
    }

    #[test]
    fn unparseable_numbers_keep_their_operator() {
        let tree = extract_conditions([("age$ne", "abc"), ("age$gt", "1")], &schema());

        let clauses = tree.clauses("age").unwrap();
        assert!(clauses.get(&Operator::Ne).is_some_and(TypedValue::is_sentinel));
        assert_eq!(clauses.get(&Operator::Gt), Some(&TypedValue::Integer(1)));

        let rendered = tree.to_document();
        let age = rendered.get_document("age").unwrap();
        assert!(matches!(age.get("$ne"), Some(Bson::Double(f)) if f.is_nan()));
        assert_eq!(age.get("$gt"), Some(&Bson::Int64(1)));
    }

    #[test]
    fn accepts_owned_maps() {
        let params = HashMap::from([
            ("active".to_string(), "true".to_string()),
            ("age$in".to_string(), "1,2".to_string()),
        ]);

        let tree = extract_conditions(&params, &schema());

        assert_eq!(
            tree.to_document(),
            doc! { "active": true, "age": { "$in": ["1", "2"] } },
        );
    }

    #[test]
    fn custom_delimiter() {
        let parser = FilterParser::from_config(&TranslatorConfig {
            operator_delimiter: ':',
            ..TranslatorConfig::default()
        });

        let tree = parser.parse([("age:gt", "4"), ("age$gt", "7")], &schema());

        assert_eq!(
            tree.clauses("age").unwrap().get(&Operator::Gt),
            Some(&TypedValue::Integer(4)),
        );
        assert_eq!(
            tree.clauses("age$gt").unwrap().get(&Operator::Eq),
            Some(&TypedValue::String("7".into())),
        );
    }

    #[test]
    fn renders_equality_plainly_and_ranges_as_operators() {
        let tree = extract_conditions(
            [("name", "Tom"), ("age$gte", "10"), ("age$lt", "20.5")],
            &schema(),
        );

        assert_eq!(
            tree.to_document(),
            doc! {
                "age": { "$gte": 10_i64, "$lt": 20.5 },
                "name": "Tom",
            },
        );
    }

    #[test]
    fn equality_beside_other_operators_is_explicit() {
        let tree = extract_conditions([("age", "3"), ("age$ne", "null")], &schema());

        assert_eq!(tree.to_document(), doc! { "age": { "$eq": 3_i64, "$ne": null } });
    }

    #[test]
    fn renders_nested_and_groups() {
        let mut inner = FilterTree::new();
        inner.insert_clause(FilterClause::new("city", Operator::Eq, TypedValue::String("Oslo".into())));

        let mut left = FilterTree::new();
        left.insert_clause(FilterClause::new("age", Operator::Lt, TypedValue::Integer(5)));
        let mut right = FilterTree::new();
        right.insert_clause(FilterClause::new("age", Operator::Gt, TypedValue::Integer(50)));

        let mut tree = FilterTree::new().or(left).or(right);
        tree.insert_nested("address", inner);

        assert_eq!(
            tree.to_document(),
            doc! {
                "address": { "city": "Oslo" },
                "$or": [ { "age": { "$lt": 5_i64 } }, { "age": { "$gt": 50_i64 } } ],
            },
        );
    }

    #[test]
    fn repeated_operator_replaces_value() {
        let mut set = ClauseSet::default();
        set.insert(FilterClause::new("age", Operator::Gt, TypedValue::Integer(1)));
        set.insert(FilterClause::new("age", Operator::Gt, TypedValue::Integer(2)));

        assert_eq!(set.len(), 1);
        assert_eq!(set.get(&Operator::Gt), Some(&TypedValue::Integer(2)));
    }
}
