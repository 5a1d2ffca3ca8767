use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Deserializer, Serialize};

use crate::hierarchy::{Hierarchy, NodeData};

pub const SAMPLE_DATASET: &str = include_str!("../data/sample.json");

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Datum {
    pub name: String,
    #[serde(default, deserialize_with = "lenient_size")]
    pub size: Option<f64>,
    #[serde(default)]
    pub children: Vec<Datum>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Record {
    pub name: String,
    pub size: Option<f64>,
}

impl NodeData for Record {
    fn name(&self) -> &str {
        &self.name
    }

    fn size(&self) -> Option<f64> {
        self.size
    }
}

impl Datum {
    pub fn into_hierarchy(self) -> Hierarchy<Record> {
        Hierarchy::from_nested(self, |datum| {
            (
                Record {
                    name: datum.name,
                    size: datum.size,
                },
                datum.children,
            )
        })
    }
}

// Sizes that are missing, null, or not numbers fall back to the default radius later on.
fn lenient_size<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(serde_json::Value::as_f64))
}

pub fn parse_dataset(json: &str) -> Result<Datum> {
    let value: serde_json::Value =
        serde_json::from_str(json).context("dataset is not valid JSON")?;
    if !value.is_object() {
        return Err(anyhow!("dataset root must be an object with a `name` field"));
    }
    serde_json::from_value(value).context("dataset does not match {name, size, children} records")
}

pub fn load_dataset(path: &Path) -> Result<Datum> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read dataset {}", path.display()))?;
    parse_dataset(&text).with_context(|| format!("failed to load dataset {}", path.display()))
}

pub fn sample_dataset() -> Result<Datum> {
    parse_dataset(SAMPLE_DATASET).context("bundled sample dataset is invalid")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_nested_records() {
        let datum = parse_dataset(
            r#"{"name":"A","size":1000,"children":[
                {"name":"B","size":10},
                {"name":"C","size":10,"children":[{"name":"D","size":5}]}
            ]}"#,
        )
        .expect("valid dataset");

        assert_eq!(datum.name, "A");
        assert_eq!(datum.children.len(), 2);
        assert_eq!(datum.children[1].children[0].name, "D");
        assert_eq!(datum.children[1].children[0].size, Some(5.0));
    }

    #[test]
    fn missing_or_malformed_size_is_none() {
        let datum = parse_dataset(
            r#"{"name":"root","children":[{"name":"a","size":"big"},{"name":"b","size":null}]}"#,
        )
        .expect("valid dataset");

        assert_eq!(datum.size, None);
        assert_eq!(datum.children[0].size, None);
        assert_eq!(datum.children[1].size, None);
    }

    #[test]
    fn rejects_non_object_root() {
        assert!(parse_dataset("[1, 2, 3]").is_err());
        assert!(parse_dataset("{\"size\": 3}").is_err());
    }

    #[test]
    fn builds_hierarchy_in_source_order() {
        let mut tree = parse_dataset(
            r#"{"name":"A","children":[{"name":"B"},{"name":"C","children":[{"name":"D"}]}]}"#,
        )
        .expect("valid dataset")
        .into_hierarchy();

        let order = tree
            .flatten()
            .into_iter()
            .map(|key| tree.node(key).data().name.clone())
            .collect::<Vec<_>>();
        assert_eq!(order, ["B", "D", "C", "A"]);
    }

    #[test]
    fn bundled_sample_loads() {
        let tree = sample_dataset().expect("sample parses").into_hierarchy();
        assert!(tree.len() > 20);
    }
}
