use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::{CurateError, Result};
use crate::model::{ItemId, QuestionItem};

/// Contents of one collection as returned by [`VectorStore::get`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CollectionSnapshot {
    pub ids: Vec<ItemId>,
    #[serde(default)]
    pub metadatas: Vec<Option<Map<String, Value>>>,
}

impl CollectionSnapshot {
    /// Pairs ids with their metadata in collection order.
    pub fn into_items(self) -> Vec<QuestionItem> {
        if self.ids.len() != self.metadatas.len() {
            tracing::warn!(
                ids = self.ids.len(),
                metadatas = self.metadatas.len(),
                "collection ids and metadatas differ in length"
            );
        }
        self.ids
            .into_iter()
            .zip(self.metadatas)
            .map(|(id, meta)| QuestionItem::from_metadata(id, meta.unwrap_or_default()))
            .collect()
    }
}

/// Collection-oriented store holding the training items.
pub trait VectorStore {
    fn use_collection(&mut self, name: &str, description: &str) -> Result<()>;
    fn get(&self) -> Result<CollectionSnapshot>;
}

/// Store backed by exported snapshots, one `<name>.json` per collection.
pub struct JsonVectorStore {
    root: PathBuf,
    current: Option<PathBuf>,
}

impl JsonVectorStore {
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(CurateError::Config(format!(
                "vector store directory not found: {}",
                root.display()
            )));
        }
        Ok(Self {
            root,
            current: None,
        })
    }
}

impl VectorStore for JsonVectorStore {
    fn use_collection(&mut self, name: &str, description: &str) -> Result<()> {
        let path = self.root.join(format!("{name}.json"));
        if !path.is_file() {
            return Err(CurateError::Config(format!(
                "collection {name:?} not found at {}",
                path.display()
            )));
        }
        tracing::info!(collection = name, description, "using collection");
        self.current = Some(path);
        Ok(())
    }

    fn get(&self) -> Result<CollectionSnapshot> {
        let path = self
            .current
            .as_ref()
            .ok_or_else(|| CurateError::InvalidArg("no collection selected".to_string()))?;
        let file = File::open(path)?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }
}

#[derive(Debug, Deserialize)]
struct ValidationFile {
    #[serde(default)]
    items: Vec<ValidationItem>,
}

#[derive(Debug, Deserialize)]
struct ValidationItem {
    #[serde(default = "null_id")]
    id: ItemId,
    #[serde(default)]
    metadata: Option<Map<String, Value>>,
}

fn null_id() -> ItemId {
    ItemId::from_value(&Value::Null)
}

/// Loads the precomputed validation items file. Embedding vectors and any
/// other extra keys are ignored.
pub fn load_validation_items(path: &Path) -> Result<Vec<QuestionItem>> {
    if !path.is_file() {
        return Err(CurateError::Config(format!(
            "validation items file not found: {}",
            path.display()
        )));
    }
    let file = File::open(path)?;
    let parsed: ValidationFile = serde_json::from_reader(BufReader::new(file))?;
    Ok(parsed
        .items
        .into_iter()
        .map(|item| QuestionItem::from_metadata(item.id, item.metadata.unwrap_or_default()))
        .collect())
}
