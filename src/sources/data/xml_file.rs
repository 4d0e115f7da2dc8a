//! Document-backed data source reading XML files.
//!
//! # Responsibilities
//! - Read the configured document on every lookup
//! - Map the element tree into a `ConfigTree`
//! - Expose the whole document under one variable name
//!
//! # Design Decisions
//! - Nothing is contributed unless both a path and a variable are set
//! - Wrapping under the variable keeps document keys from colliding with
//!   keys contributed by other sources
//! - Read and parse failures are errors, never an empty tree

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::aggregate::ConfigTree;
use crate::config::StencilConfig;
use crate::sources::{DataSource, SourceError, SourceResult};

/// Key used for element text that sits next to attributes or children.
pub const TEXT_KEY: &str = "#text";

/// A document path bound to the variable it is exposed under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlBinding {
    pub path: PathBuf,
    pub var: String,
}

impl XmlBinding {
    /// Both halves must be present for a binding to exist.
    pub fn from_parts(path: Option<&Path>, var: Option<&str>) -> Option<Self> {
        match (path, var) {
            (Some(path), Some(var)) if !var.is_empty() => Some(Self {
                path: path.to_path_buf(),
                var: var.to_string(),
            }),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct XmlFileDataSource {
    global: Option<XmlBinding>,
    templates: BTreeMap<String, XmlBinding>,
}

impl XmlFileDataSource {
    pub fn new(global: Option<XmlBinding>, templates: BTreeMap<String, XmlBinding>) -> Self {
        Self { global, templates }
    }

    /// Global binding from the source entry; per-template bindings from
    /// `environments.<env>.<template>.xml_file_path` / `xml_file_var`.
    pub fn from_config(path: Option<&Path>, var: Option<&str>, config: &StencilConfig) -> Self {
        let global = XmlBinding::from_parts(path, var);
        let templates = config
            .active_environment()
            .map(|env| {
                env.templates
                    .iter()
                    .filter_map(|(name, settings)| {
                        XmlBinding::from_parts(
                            settings.xml_file_path.as_deref(),
                            settings.xml_file_var.as_deref(),
                        )
                        .map(|binding| (name.clone(), binding))
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self::new(global, templates)
    }

    async fn load(&self, binding: Option<&XmlBinding>) -> SourceResult<ConfigTree> {
        let Some(binding) = binding else {
            return Ok(ConfigTree::new());
        };

        tracing::info!(path = %binding.path.display(), var = %binding.var, "Opening XML file");
        let text = tokio::fs::read_to_string(&binding.path)
            .await
            .map_err(|source| SourceError::Io {
                path: binding.path.clone(),
                source,
            })?;
        let document = parse_document(&text).map_err(|e| SourceError::Parse {
            path: binding.path.clone(),
            reason: e.to_string(),
        })?;

        let mut tree = ConfigTree::new();
        tree.insert(binding.var.clone(), document);
        tracing::debug!(var = %binding.var, "Created XML structure");
        Ok(tree)
    }
}

#[async_trait]
impl DataSource for XmlFileDataSource {
    fn name(&self) -> &str {
        "xml_file"
    }

    async fn global_values(&self) -> SourceResult<ConfigTree> {
        self.load(self.global.as_ref()).await
    }

    async fn values_for_template(&self, template: &str) -> SourceResult<ConfigTree> {
        self.load(self.templates.get(template)).await
    }
}

/// Parse an XML document into `{ <root element>: <element value> }`.
pub fn parse_document(text: &str) -> Result<Value, roxmltree::Error> {
    let document = roxmltree::Document::parse(text)?;
    let root = document.root_element();

    let mut map = Map::new();
    map.insert(root.tag_name().name().to_string(), element_value(root));
    Ok(Value::Object(map))
}

/// Element with only text becomes a string, empty element becomes null,
/// anything with attributes or child elements becomes a mapping. Repeated
/// child names collapse into a sequence.
fn element_value(node: roxmltree::Node<'_, '_>) -> Value {
    let mut map = Map::new();
    for attr in node.attributes() {
        map.insert(attr.name().to_string(), Value::String(attr.value().to_string()));
    }

    let mut text = String::new();
    for child in node.children() {
        if child.is_element() {
            let key = child.tag_name().name().to_string();
            let value = element_value(child);
            match map.get_mut(&key) {
                Some(Value::Array(items)) => items.push(value),
                Some(existing) => {
                    let first = existing.take();
                    *existing = Value::Array(vec![first, value]);
                }
                None => {
                    map.insert(key, value);
                }
            }
        } else if child.is_text() {
            text.push_str(child.text().unwrap_or_default());
        }
    }

    let text = text.trim();
    if map.is_empty() {
        if text.is_empty() {
            Value::Null
        } else {
            Value::String(text.to_string())
        }
    } else {
        if !text.is_empty() {
            map.insert(TEXT_KEY.to_string(), Value::String(text.to_string()));
        }
        Value::Object(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    #[test]
    fn maps_elements_attributes_and_repeats() {
        let doc = parse_document(
            r#"<config version="3">
                 <name>billing</name>
                 <server>a</server>
                 <server>b</server>
                 <empty/>
                 <limit unit="mb">512</limit>
               </config>"#,
        )
        .unwrap();

        assert_eq!(
            doc,
            json!({
                "config": {
                    "version": "3",
                    "name": "billing",
                    "server": ["a", "b"],
                    "empty": null,
                    "limit": { "unit": "mb", "#text": "512" }
                }
            })
        );
    }

    #[tokio::test]
    async fn contributes_nothing_without_both_settings() {
        let only_path = XmlFileDataSource::new(
            XmlBinding::from_parts(Some(Path::new("/etc/x.xml")), None),
            BTreeMap::new(),
        );
        assert!(only_path.global_values().await.unwrap().is_empty());

        let only_var = XmlFileDataSource::new(XmlBinding::from_parts(None, Some("x")), BTreeMap::new());
        assert!(only_var.global_values().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn wraps_document_under_variable() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "<db><host>primary</host></db>").unwrap();

        let mut templates = BTreeMap::new();
        templates.insert(
            "db.conf".to_string(),
            XmlBinding::from_parts(Some(file.path()), Some("database")).unwrap(),
        );
        let source = XmlFileDataSource::new(None, templates);

        let values = source.values_for_template("db.conf").await.unwrap();
        assert_eq!(values.len(), 1);
        assert_eq!(values["database"], json!({ "db": { "host": "primary" } }));
        assert!(source.values_for_template("app.conf").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unparsable_document_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "<db><host>").unwrap();

        let source = XmlFileDataSource::new(
            XmlBinding::from_parts(Some(file.path()), Some("db")),
            BTreeMap::new(),
        );
        let err = source.global_values().await.unwrap_err();
        assert!(matches!(err, SourceError::Parse { .. }));
    }

    #[tokio::test]
    async fn missing_document_is_an_error() {
        let source = XmlFileDataSource::new(
            XmlBinding::from_parts(Some(Path::new("/no/such/file.xml")), Some("db")),
            BTreeMap::new(),
        );
        let err = source.global_values().await.unwrap_err();
        assert!(matches!(err, SourceError::Io { .. }));
    }
}
