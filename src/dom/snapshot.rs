use indexmap::IndexMap;
use serde::Deserialize;
use thiserror::Error;

use super::{Document, NodeId};

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("invalid page snapshot: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("node at {path} has an empty tag")]
    EmptyTag { path: String },
}

/// One element of a page snapshot.
#[derive(Debug, Clone, Deserialize)]
pub struct NodeSpec {
    pub tag: String,
    #[serde(default)]
    pub id: Option<String>,
    /// Space separated class list.
    #[serde(default)]
    pub class: Option<String>,
    #[serde(default)]
    pub attrs: IndexMap<String, String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub children: Vec<NodeSpec>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SnapshotRoot {
    Single(NodeSpec),
    Many(Vec<NodeSpec>),
}

impl Document {
    /// Builds a document from its JSON snapshot. A single root is used as the
    /// document element; a list of roots is wrapped in an implicit `html`.
    pub fn from_json(raw: &str) -> Result<Self, DocumentError> {
        let root: SnapshotRoot = serde_json::from_str(raw)?;
        match root {
            SnapshotRoot::Single(spec) if spec.tag.eq_ignore_ascii_case("html") => {
                let mut doc = Document::new();
                let root = doc.root();
                doc.fill(root, &spec, "html")?;
                Ok(doc)
            }
            SnapshotRoot::Single(spec) => Self::from_specs(std::slice::from_ref(&spec)),
            SnapshotRoot::Many(specs) => Self::from_specs(&specs),
        }
    }

    pub fn from_specs(specs: &[NodeSpec]) -> Result<Self, DocumentError> {
        let mut doc = Document::new();
        let root = doc.root();
        for (idx, spec) in specs.iter().enumerate() {
            doc.insert_spec(root, spec, &format!("html/{idx}"))?;
        }
        Ok(doc)
    }

    fn insert_spec(
        &mut self,
        parent: NodeId,
        spec: &NodeSpec,
        path: &str,
    ) -> Result<NodeId, DocumentError> {
        if spec.tag.trim().is_empty() {
            return Err(DocumentError::EmptyTag {
                path: path.to_string(),
            });
        }
        let id = self.create_element(spec.tag.trim());
        self.append_child(parent, id);
        self.fill(id, spec, path)?;
        Ok(id)
    }

    fn fill(&mut self, id: NodeId, spec: &NodeSpec, path: &str) -> Result<(), DocumentError> {
        {
            let element = self.get_mut(id);
            element.id = spec.id.clone();
            element.classes = spec
                .class
                .as_deref()
                .unwrap_or_default()
                .split_whitespace()
                .map(str::to_string)
                .collect();
            element.attrs = spec.attrs.clone();
            element.text = spec.text.clone();
            element.hidden = spec.hidden;
        }
        for (idx, child) in spec.children.iter().enumerate() {
            self.insert_spec(id, child, &format!("{path}/{idx}"))?;
        }
        Ok(())
    }
}
