//! Aggregation pipelines over document rows
//!
//! A report is a sequence of named stages, each turning a batch of rows
//! into the next batch:
//! - `lookup`: inner join against another collection
//! - `retain`: drop everything but a few paths
//! - `unwind`: one row per element of a nested array
//! - `derive`: compute a field from the row
//! - `filter`: keep rows matching a predicate
//! - `project`: reshape rows into output objects
//!
//! Grouping and ranking live in [`group`] and close the pipeline.

pub mod group;
mod stages;

pub use group::{sort_desc_by, Group, GroupBy};
pub use stages::{Derive, Filter, JoinKey, Lookup, Projection, Project, Retain, Unwind};

use crate::dataset::Dataset;
use serde_json::{Map, Value};
use tracing::debug;

/// Uniform intermediate representation: one JSON object per row
pub type Row = Map<String, Value>;

/// Dotted path into a row, e.g. `facts.us-gaap.Revenues.units.USD`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath(Vec<String>);

impl FieldPath {
    pub fn parse(path: &str) -> Self {
        Self(path.split('.').map(str::to_string).collect())
    }

    pub fn get<'r>(&self, row: &'r Row) -> Option<&'r Value> {
        let (first, rest) = self.0.split_first()?;
        rest.iter()
            .try_fold(row.get(first)?, |value, segment| value.get(segment))
    }

    /// Set the value, creating intermediate objects where needed
    pub fn set(&self, row: &mut Row, value: Value) {
        let Some((last, parents)) = self.0.split_last() else {
            return;
        };

        let mut current = row;
        for segment in parents {
            let entry = current
                .entry(segment.clone())
                .or_insert_with(|| Value::Object(Map::new()));
            if !entry.is_object() {
                *entry = Value::Object(Map::new());
            }
            current = match entry {
                Value::Object(map) => map,
                _ => return,
            };
        }
        current.insert(last.clone(), value);
    }

    /// Remove and return the value
    pub fn take(&self, row: &mut Row) -> Option<Value> {
        let (last, parents) = self.0.split_last()?;
        let mut current = row;
        for segment in parents {
            current = current.get_mut(segment)?.as_object_mut()?;
        }
        current.remove(last)
    }
}

impl From<&str> for FieldPath {
    fn from(path: &str) -> Self {
        Self::parse(path)
    }
}

/// One transformation step
pub trait Stage: Send + Sync {
    fn name(&self) -> &'static str;

    fn apply(&self, rows: Vec<Row>, dataset: &Dataset) -> Vec<Row>;
}

/// Ordered composition of stages
#[derive(Default)]
pub struct Pipeline {
    stages: Vec<Box<dyn Stage>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stage(mut self, stage: impl Stage + 'static) -> Self {
        self.stages.push(Box::new(stage));
        self
    }

    pub fn run(&self, rows: Vec<Row>, dataset: &Dataset) -> Vec<Row> {
        self.stages.iter().fold(rows, |rows, stage| {
            let rows = stage.apply(rows, dataset);
            debug!(stage = stage.name(), rows = rows.len(), "Stage applied");
            rows
        })
    }
}
