//! Structured query shapes and their AQL rendering.
//!
//! The stores only ever need three shapes: find by equality (an empty filter
//! is a full scan), keyed upsert and removal by equality. Keeping them
//! structured lets every driver evaluate them natively; the HTTP driver
//! renders them to AQL with bind variables, never by string interpolation of
//! values.

use serde_json::Value;

use crate::document::Document;

/// Conjunction of `field == value` conditions. Empty matches everything.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Filter(Vec<(String, Value)>);

impl Filter {
    /// A filter matching every document.
    pub fn all() -> Self {
        Self(Vec::new())
    }

    /// Add an equality condition.
    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.push((field.into(), value.into()));
        self
    }

    pub fn conditions(&self) -> &[(String, Value)] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn matches(&self, doc: &Document) -> bool {
        self.0
            .iter()
            .all(|(field, value)| doc.get(field) == Some(value))
    }
}

/// A query against one collection.
#[derive(Clone, Debug, PartialEq)]
pub enum Query {
    /// Return every document matching `filter`.
    Find { collection: String, filter: Filter },
    /// Update `fields` on the document matching `key`, or insert
    /// `key ∪ fields` if none matches.
    Upsert {
        collection: String,
        key: Filter,
        fields: Document,
    },
    /// Delete every document matching `filter`.
    Remove { collection: String, filter: Filter },
}

/// Per-query options.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct QueryOptions {
    /// Ask the server for the total result count up front.
    pub count: bool,
    /// Wait for modifications to be synced to disk.
    pub wait_for_sync: bool,
    /// Documents per cursor batch.
    pub batch_size: Option<u32>,
}

impl QueryOptions {
    pub fn with_count(mut self) -> Self {
        self.count = true;
        self
    }
}

impl Query {
    pub fn collection(&self) -> &str {
        match self {
            Self::Find { collection, .. }
            | Self::Upsert { collection, .. }
            | Self::Remove { collection, .. } => collection,
        }
    }

    /// Render to AQL text plus bind variables.
    ///
    /// Bind variable names are the field names without leading underscores,
    /// so `_key` binds as `@key`.
    pub fn to_aql(&self, options: &QueryOptions) -> (String, Document) {
        let mut binds = Document::new();
        let aql = match self {
            Self::Find { collection, filter } => {
                let mut aql = format!("FOR d IN {collection}");
                if !filter.is_empty() {
                    aql.push_str(" FILTER ");
                    aql.push_str(&render_conditions(filter, &mut binds));
                }
                aql.push_str(" RETURN d");
                aql
            }
            Self::Upsert {
                collection,
                key,
                fields,
            } => {
                let key_pairs = || key.conditions().iter().map(|(k, v)| (k.as_str(), v));
                let field_pairs = || fields.iter().map(|(k, v)| (k.as_str(), v));
                let key_obj = render_object(key_pairs(), &mut binds);
                let insert_obj = render_object(key_pairs().chain(field_pairs()), &mut binds);
                let update_obj = render_object(field_pairs(), &mut binds);
                let mut aql = format!(
                    "UPSERT {key_obj} INSERT {insert_obj} UPDATE {update_obj} IN {collection}"
                );
                push_sync_option(&mut aql, options);
                aql
            }
            Self::Remove { collection, filter } => {
                let mut aql = format!("FOR d IN {collection}");
                if !filter.is_empty() {
                    aql.push_str(" FILTER ");
                    aql.push_str(&render_conditions(filter, &mut binds));
                }
                aql.push_str(&format!(" REMOVE d IN {collection}"));
                push_sync_option(&mut aql, options);
                aql
            }
        };
        (aql, binds)
    }
}

fn bind_name(field: &str) -> String {
    field.trim_start_matches('_').to_string()
}

fn render_conditions(filter: &Filter, binds: &mut Document) -> String {
    filter
        .conditions()
        .iter()
        .map(|(field, value)| {
            let name = bind_name(field);
            binds.insert(name.clone(), value.clone());
            format!("d.{field} == @{name}")
        })
        .collect::<Vec<_>>()
        .join(" && ")
}

fn render_object<'a>(
    entries: impl Iterator<Item = (&'a str, &'a Value)>,
    binds: &mut Document,
) -> String {
    let parts: Vec<String> = entries
        .map(|(field, value)| {
            let name = bind_name(field);
            binds.insert(name.clone(), value.clone());
            format!("{field}: @{name}")
        })
        .collect();
    format!("{{ {} }}", parts.join(", "))
}

fn push_sync_option(aql: &mut String, options: &QueryOptions) {
    if options.wait_for_sync {
        aql.push_str(" OPTIONS { waitForSync: true }");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn find_by_hash_and_type() {
        let q = Query::Find {
            collection: "objects".into(),
            filter: Filter::all().eq("hash", "abc").eq("type", "blob"),
        };
        let (aql, binds) = q.to_aql(&QueryOptions::default());
        assert_eq!(
            aql,
            "FOR d IN objects FILTER d.hash == @hash && d.type == @type RETURN d"
        );
        assert_eq!(binds, doc(json!({ "hash": "abc", "type": "blob" })));
    }

    #[test]
    fn full_scan_has_no_filter() {
        let q = Query::Find {
            collection: "refs".into(),
            filter: Filter::all(),
        };
        let (aql, binds) = q.to_aql(&QueryOptions::default());
        assert_eq!(aql, "FOR d IN refs RETURN d");
        assert!(binds.is_empty());
    }

    #[test]
    fn upsert_shares_bind_variables() {
        let q = Query::Upsert {
            collection: "refs".into(),
            key: Filter::all().eq("name", "HEAD"),
            fields: doc(json!({ "target": "ref: refs/heads/master" })),
        };
        let (aql, binds) = q.to_aql(&QueryOptions::default());
        assert_eq!(
            aql,
            "UPSERT { name: @name } INSERT { name: @name, target: @target } \
             UPDATE { target: @target } IN refs"
        );
        assert_eq!(binds.len(), 2);
    }

    #[test]
    fn underscore_fields_bind_without_prefix() {
        let q = Query::Upsert {
            collection: "misc".into(),
            key: Filter::all().eq("_key", "config-key"),
            fields: doc(json!({ "config": "{}" })),
        };
        let (aql, binds) = q.to_aql(&QueryOptions::default());
        assert!(aql.starts_with("UPSERT { _key: @key }"));
        assert_eq!(binds.get("key"), Some(&json!("config-key")));
    }

    #[test]
    fn writes_request_sync_when_asked() {
        let q = Query::Remove {
            collection: "refs".into(),
            filter: Filter::all().eq("name", "refs/heads/old"),
        };
        let options = QueryOptions {
            wait_for_sync: true,
            ..QueryOptions::default()
        };
        let (aql, _) = q.to_aql(&options);
        assert_eq!(
            aql,
            "FOR d IN refs FILTER d.name == @name REMOVE d IN refs OPTIONS { waitForSync: true }"
        );
    }

    #[test]
    fn filter_matching() {
        let d = doc(json!({ "hash": "h1", "type": "commit", "object": "AA==" }));
        assert!(Filter::all().matches(&d));
        assert!(Filter::all().eq("hash", "h1").matches(&d));
        assert!(!Filter::all().eq("hash", "h1").eq("type", "blob").matches(&d));
        assert!(!Filter::all().eq("missing", "x").matches(&d));
    }

    #[test]
    fn collection_accessor() {
        let q = Query::Remove {
            collection: "misc".into(),
            filter: Filter::all(),
        };
        assert_eq!(q.collection(), "misc");
    }
}
