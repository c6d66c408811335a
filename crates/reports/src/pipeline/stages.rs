//! Row-level stages

use super::{FieldPath, Row, Stage};
use crate::dataset::Dataset;
use filingforge_common::db::models::Cik;
use filingforge_common::Collection;
use serde_json::Value;
use std::collections::HashMap;

/// How two join values are compared
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKey {
    /// Plain JSON equality
    Exact,
    /// Registry identifiers; numbers and digit strings compare by value
    Cik,
}

impl JoinKey {
    /// Hashable form of a join value; `None` never matches anything
    fn normalize(self, value: &Value) -> Option<String> {
        match self {
            JoinKey::Exact => Some(value.to_string()),
            JoinKey::Cik => Cik::from_json(value).map(|cik| cik.value().to_string()),
        }
    }
}

/// Inner join against another collection.
///
/// Every matching foreign row yields one output row carrying the match as
/// an object under `into`. Rows with no match are dropped.
pub struct Lookup {
    from: Collection,
    local: FieldPath,
    foreign: FieldPath,
    key: JoinKey,
    into: String,
}

impl Lookup {
    pub fn new(from: Collection, local: &str, foreign: &str, into: &str) -> Self {
        Self {
            from,
            local: FieldPath::parse(local),
            foreign: FieldPath::parse(foreign),
            key: JoinKey::Exact,
            into: into.to_string(),
        }
    }

    pub fn key(mut self, key: JoinKey) -> Self {
        self.key = key;
        self
    }
}

impl Stage for Lookup {
    fn name(&self) -> &'static str {
        "lookup"
    }

    fn apply(&self, rows: Vec<Row>, dataset: &Dataset) -> Vec<Row> {
        let foreign_rows = dataset.rows(self.from);

        // Foreign rows by normalized key, each list in storage order
        let mut index: HashMap<String, Vec<&Row>> = HashMap::new();
        for candidate in foreign_rows {
            if let Some(key) = self.foreign.get(candidate).and_then(|v| self.key.normalize(v)) {
                index.entry(key).or_default().push(candidate);
            }
        }

        let mut joined = Vec::new();
        for row in rows {
            let Some(matches) = self
                .local
                .get(&row)
                .and_then(|v| self.key.normalize(v))
                .and_then(|key| index.get(&key))
            else {
                continue;
            };
            for matched in matches {
                let mut out = row.clone();
                out.insert(self.into.clone(), Value::Object((*matched).clone()));
                joined.push(out);
            }
        }

        joined
    }
}

/// Keep only the listed paths, each at its original position.
///
/// Used ahead of fan-out stages so that large documents are not copied
/// whole for every output row.
pub struct Retain {
    paths: Vec<FieldPath>,
}

impl Retain {
    pub fn new(paths: &[&str]) -> Self {
        Self {
            paths: paths.iter().map(|path| FieldPath::parse(path)).collect(),
        }
    }

    /// Slim copy of a borrowed row
    pub fn select(&self, row: &Row) -> Row {
        let mut out = Row::new();
        for path in &self.paths {
            if let Some(value) = path.get(row) {
                path.set(&mut out, value.clone());
            }
        }
        out
    }
}

impl Stage for Retain {
    fn name(&self) -> &'static str {
        "retain"
    }

    fn apply(&self, rows: Vec<Row>, _dataset: &Dataset) -> Vec<Row> {
        rows.iter().map(|row| self.select(row)).collect()
    }
}

/// One row per element of the array at `path`, the element replacing the
/// array in place.
///
/// Rows where the path is missing, null or an empty array produce nothing.
/// A non-array value passes through as a single row.
pub struct Unwind {
    path: FieldPath,
}

impl Unwind {
    pub fn new(path: &str) -> Self {
        Self {
            path: FieldPath::parse(path),
        }
    }
}

impl Stage for Unwind {
    fn name(&self) -> &'static str {
        "unwind"
    }

    fn apply(&self, rows: Vec<Row>, _dataset: &Dataset) -> Vec<Row> {
        let mut unwound = Vec::new();

        for mut row in rows {
            match self.path.take(&mut row) {
                None | Some(Value::Null) => {}
                Some(Value::Array(elements)) => {
                    for element in elements {
                        let mut out = row.clone();
                        self.path.set(&mut out, element);
                        unwound.push(out);
                    }
                }
                Some(other) => {
                    self.path.set(&mut row, other);
                    unwound.push(row);
                }
            }
        }

        unwound
    }
}

type DeriveFn = dyn Fn(&Row) -> Option<Value> + Send + Sync;

/// Compute a field from the row; `None` leaves the row without it
pub struct Derive {
    field: FieldPath,
    compute: Box<DeriveFn>,
}

impl Derive {
    pub fn new<F>(field: &str, compute: F) -> Self
    where
        F: Fn(&Row) -> Option<Value> + Send + Sync + 'static,
    {
        Self {
            field: FieldPath::parse(field),
            compute: Box::new(compute),
        }
    }
}

impl Stage for Derive {
    fn name(&self) -> &'static str {
        "derive"
    }

    fn apply(&self, rows: Vec<Row>, _dataset: &Dataset) -> Vec<Row> {
        rows.into_iter()
            .map(|mut row| {
                if let Some(value) = (self.compute)(&row) {
                    self.field.set(&mut row, value);
                }
                row
            })
            .collect()
    }
}

type Predicate = dyn Fn(&Row) -> bool + Send + Sync;

pub struct Filter {
    predicate: Box<Predicate>,
}

impl Filter {
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&Row) -> bool + Send + Sync + 'static,
    {
        Self {
            predicate: Box::new(predicate),
        }
    }

    /// Keep rows whose value at `path` equals `expected`
    pub fn eq(path: &str, expected: Value) -> Self {
        let path = FieldPath::parse(path);
        Self::new(move |row| path.get(row) == Some(&expected))
    }
}

impl Stage for Filter {
    fn name(&self) -> &'static str {
        "filter"
    }

    fn apply(&self, rows: Vec<Row>, _dataset: &Dataset) -> Vec<Row> {
        rows.into_iter().filter(|row| (self.predicate)(row)).collect()
    }
}

/// Source of one projected field
#[derive(Debug, Clone)]
pub enum Projection {
    /// Value at a path; omitted when missing
    Path(FieldPath),
    /// The whole row minus the named top-level fields
    Root { exclude: Vec<String> },
}

/// Reshape each row into a new object with fields in declaration order
pub struct Project {
    fields: Vec<(String, Projection)>,
}

impl Project {
    pub fn new() -> Self {
        Self { fields: Vec::new() }
    }

    pub fn field(mut self, name: &str, path: &str) -> Self {
        self.fields
            .push((name.to_string(), Projection::Path(FieldPath::parse(path))));
        self
    }

    pub fn root_without(mut self, name: &str, exclude: &[&str]) -> Self {
        let exclude = exclude.iter().map(|field| field.to_string()).collect();
        self.fields.push((name.to_string(), Projection::Root { exclude }));
        self
    }

    fn project(&self, row: &Row) -> Row {
        let mut out = Row::with_capacity(self.fields.len());
        for (name, projection) in &self.fields {
            match projection {
                Projection::Path(path) => {
                    if let Some(value) = path.get(row) {
                        out.insert(name.clone(), value.clone());
                    }
                }
                Projection::Root { exclude } => {
                    let rest: Row = row
                        .iter()
                        .filter(|(field, _)| !exclude.contains(*field))
                        .map(|(field, value)| (field.clone(), value.clone()))
                        .collect();
                    out.insert(name.clone(), Value::Object(rest));
                }
            }
        }
        out
    }
}

impl Default for Project {
    fn default() -> Self {
        Self::new()
    }
}

impl Stage for Project {
    fn name(&self) -> &'static str {
        "project"
    }

    fn apply(&self, rows: Vec<Row>, _dataset: &Dataset) -> Vec<Row> {
        rows.iter().map(|row| self.project(row)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::Pipeline;
    use serde_json::json;

    fn row(value: Value) -> Row {
        value.as_object().cloned().unwrap()
    }

    fn rows(values: Vec<Value>) -> Vec<Row> {
        values.into_iter().map(row).collect()
    }

    #[test]
    fn test_lookup_is_inner_join_one_row_per_match() {
        let dataset = Dataset::default().with(
            Collection::Companies,
            rows(vec![
                json!({"_id": "a", "name": "Alpha"}),
                json!({"_id": "b", "name": "Beta"}),
                json!({"_id": "a", "name": "Alpha duplicate"}),
            ]),
        );
        let input = rows(vec![
            json!({"companyId": "a"}),
            json!({"companyId": "missing"}),
            json!({"other": 1}),
        ]);

        let out = Lookup::new(Collection::Companies, "companyId", "_id", "company")
            .apply(input, &dataset);

        assert_eq!(out.len(), 2);
        assert_eq!(out[0]["company"]["name"], json!("Alpha"));
        assert_eq!(out[1]["company"]["name"], json!("Alpha duplicate"));
    }

    #[test]
    fn test_lookup_cik_key_normalizes_representations() {
        let dataset = Dataset::default().with(
            Collection::Companies,
            rows(vec![json!({"cik": "0000320193", "name": "Apple"})]),
        );
        let input = rows(vec![json!({"cik": 320193})]);

        let exact = Lookup::new(Collection::Companies, "cik", "cik", "c")
            .apply(input.clone(), &dataset);
        assert!(exact.is_empty());

        let normalized = Lookup::new(Collection::Companies, "cik", "cik", "c")
            .key(JoinKey::Cik)
            .apply(input, &dataset);
        assert_eq!(normalized.len(), 1);
        assert_eq!(normalized[0]["c"]["name"], json!("Apple"));
    }

    #[test]
    fn test_unwind_edge_cases() {
        let input = rows(vec![
            json!({"id": 1, "a": {"list": [10, 20]}}),
            json!({"id": 2, "a": {"list": []}}),
            json!({"id": 3, "a": {"list": null}}),
            json!({"id": 4, "a": {}}),
            json!({"id": 5, "a": {"list": "scalar"}}),
        ]);

        let out = Unwind::new("a.list").apply(input, &Dataset::default());

        let ids: Vec<_> = out.iter().map(|r| r["id"].clone()).collect();
        assert_eq!(ids, vec![json!(1), json!(1), json!(5)]);
        assert_eq!(out[0]["a"]["list"], json!(10));
        assert_eq!(out[1]["a"]["list"], json!(20));
        assert_eq!(out[2]["a"]["list"], json!("scalar"));
    }

    #[test]
    fn test_derive_filter_project_chain() {
        let input = rows(vec![
            json!({"_id": "x", "n": 2, "tag": "keep"}),
            json!({"_id": "y", "n": 3, "tag": "drop"}),
            json!({"_id": "z", "tag": "keep"}),
        ]);

        let pipeline = Pipeline::new()
            .stage(Derive::new("double", |r| {
                r.get("n").and_then(Value::as_i64).map(|n| json!(n * 2))
            }))
            .stage(Filter::eq("tag", json!("keep")))
            .stage(
                Project::new()
                    .field("doubled", "double")
                    .root_without("source", &["double", "tag"]),
            );

        let out = pipeline.run(input, &Dataset::default());
        assert_eq!(
            out,
            rows(vec![
                json!({"doubled": 4, "source": {"_id": "x", "n": 2}}),
                json!({"source": {"_id": "z"}}),
            ])
        );
    }

    #[test]
    fn test_lookup_exact_key_distinguishes_types() {
        let dataset = Dataset::default().with(
            Collection::Companies,
            rows(vec![
                json!({"code": "1", "name": "string"}),
                json!({"code": 1, "name": "number"}),
            ]),
        );
        let input = rows(vec![json!({"code": 1})]);

        let out = Lookup::new(Collection::Companies, "code", "code", "c").apply(input, &dataset);

        assert_eq!(out.len(), 1);
        assert_eq!(out[0]["c"]["name"], json!("number"));
    }

    #[test]
    fn test_retain_before_unwind_drops_sibling_facts() {
        let input = rows(vec![json!({
            "cik": 1,
            "entityName": "Big Filer",
            "companyData": {"_id": "a", "sicDescription": "Mining", "tickers": ["BIG"]},
            "facts": {
                "dei": {"EntityCommonStockSharesOutstanding": {"units": {"shares": [1, 2, 3]}}},
                "us-gaap": {
                    "Assets": {"units": {"USD": [{"val": 9}]}},
                    "Revenues": {"label": "Revenues", "units": {"USD": [{"val": 1}, {"val": 2}]}}
                }
            }
        })]);

        let out = Pipeline::new()
            .stage(Retain::new(&["facts.us-gaap.Revenues.units.USD", "companyData.sicDescription"]))
            .stage(Unwind::new("facts.us-gaap.Revenues.units.USD"))
            .run(input, &Dataset::default());

        assert_eq!(
            out,
            rows(vec![
                json!({
                    "facts": {"us-gaap": {"Revenues": {"units": {"USD": {"val": 1}}}}},
                    "companyData": {"sicDescription": "Mining"}
                }),
                json!({
                    "facts": {"us-gaap": {"Revenues": {"units": {"USD": {"val": 2}}}}},
                    "companyData": {"sicDescription": "Mining"}
                }),
            ])
        );
    }
}
