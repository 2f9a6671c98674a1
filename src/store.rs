//! In-memory object store.
//!
//! Authoritative CRUD over `(object type, object id) -> document`. The set
//! of object types is fixed once the dataset is loaded; ids within a type
//! are unique. Bodies are stored without the synthetic `id` field, which is
//! attached again whenever a document is serialized for a response.

use std::collections::HashMap;
use std::path::Path;

use anyhow::Context;
use serde_json::{Map, Value};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::error::ApiError;
use crate::patch::{self, PatchOp};

/// A stored document body: a JSON object without the `id` field.
pub type Document = Map<String, Value>;

/// In-memory mapping of object type to objects.
///
/// A single coarse lock guards the whole store; writes to a given
/// `(type, id)` are observed atomically by concurrent readers.
#[derive(Debug, Default)]
pub struct ObjectStore {
    objects: RwLock<HashMap<String, HashMap<String, Document>>>,
}

impl ObjectStore {
    /// Create an empty store with no object types.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_dataset(dataset: HashMap<String, HashMap<String, Document>>) -> Self {
        Self {
            objects: RwLock::new(dataset),
        }
    }

    /// Load the dataset from a JSON file.
    ///
    /// The file must hold a top-level object mapping type name to an object
    /// mapping id to a document body. A body that is not itself a JSON
    /// object is a load error - the server must not start serving a corrupt
    /// dataset.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read dataset {}", path.display()))?;
        let raw: HashMap<String, HashMap<String, Value>> = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse dataset {}", path.display()))?;

        let mut dataset = HashMap::with_capacity(raw.len());
        for (object_type, objects) in raw {
            let mut docs = HashMap::with_capacity(objects.len());
            for (object_id, body) in objects {
                match body {
                    Value::Object(doc) => {
                        docs.insert(object_id, doc);
                    }
                    other => anyhow::bail!(
                        "dataset {}: {}/{} is not a JSON object (got {})",
                        path.display(),
                        object_type,
                        object_id,
                        json_type(&other),
                    ),
                }
            }
            dataset.insert(object_type, docs);
        }
        Ok(Self::from_dataset(dataset))
    }

    /// Number of object types and total objects, for startup reporting.
    pub async fn stats(&self) -> (usize, usize) {
        let objects = self.objects.read().await;
        (objects.len(), objects.values().map(HashMap::len).sum())
    }

    /// All documents of a type, each augmented with its `id`.
    pub async fn list(&self, object_type: &str) -> Result<Vec<Value>, ApiError> {
        let objects = self.objects.read().await;
        let docs = objects
            .get(object_type)
            .ok_or_else(|| ApiError::UnknownType(object_type.to_string()))?;
        Ok(docs.iter().map(|(id, doc)| attach_id(doc, id)).collect())
    }

    /// A single document, augmented with its `id`.
    pub async fn get(&self, object_type: &str, object_id: &str) -> Result<Value, ApiError> {
        let objects = self.objects.read().await;
        let doc = objects
            .get(object_type)
            .and_then(|docs| docs.get(object_id))
            .ok_or_else(|| not_found(object_type, object_id))?;
        Ok(attach_id(doc, object_id))
    }

    /// Store a new document under a freshly generated id and return it with
    /// the id attached. The type must already exist in the dataset.
    pub async fn create(&self, object_type: &str, mut doc: Document) -> Result<Value, ApiError> {
        doc.remove("id");
        let object_id = Uuid::new_v4().to_string();

        let mut objects = self.objects.write().await;
        let docs = objects
            .get_mut(object_type)
            .ok_or_else(|| ApiError::UnknownType(object_type.to_string()))?;
        let created = attach_id(&doc, &object_id);
        docs.insert(object_id.clone(), doc);
        debug!(object_type, object_id = %object_id, "object created");
        Ok(created)
    }

    /// Replace the full body of an existing object.
    pub async fn replace(
        &self,
        object_type: &str,
        object_id: &str,
        mut doc: Document,
    ) -> Result<(), ApiError> {
        doc.remove("id");

        let mut objects = self.objects.write().await;
        let slot = objects
            .get_mut(object_type)
            .and_then(|docs| docs.get_mut(object_id))
            .ok_or_else(|| not_found(object_type, object_id))?;
        *slot = doc;
        debug!(object_type, object_id, "object replaced");
        Ok(())
    }

    /// Remove an object. Succeeds whether or not it existed.
    pub async fn delete(&self, object_type: &str, object_id: &str) {
        let mut objects = self.objects.write().await;
        if let Some(docs) = objects.get_mut(object_type) {
            if docs.remove(object_id).is_some() {
                debug!(object_type, object_id, "object deleted");
            }
        }
    }

    /// Apply a patch to a stored document.
    ///
    /// The read-modify-write runs under one write lock: concurrent readers
    /// observe either the old or the fully patched body, and a failing
    /// operation leaves the store untouched.
    pub async fn apply_patch(
        &self,
        object_type: &str,
        object_id: &str,
        ops: &[PatchOp],
    ) -> Result<(), ApiError> {
        let mut objects = self.objects.write().await;
        let slot = objects
            .get_mut(object_type)
            .and_then(|docs| docs.get_mut(object_id))
            .ok_or_else(|| not_found(object_type, object_id))?;

        let patched = patch::apply(&Value::Object(slot.clone()), ops)?;
        let Value::Object(mut doc) = patched else {
            return Err(ApiError::InvalidPatch(
                "patched document is not a JSON object".to_string(),
            ));
        };
        doc.remove("id");
        *slot = doc;
        debug!(object_type, object_id, ops = ops.len(), "object patched");
        Ok(())
    }
}

fn attach_id(doc: &Document, object_id: &str) -> Value {
    let mut doc = doc.clone();
    doc.insert("id".to_string(), Value::String(object_id.to_string()));
    Value::Object(doc)
}

fn not_found(object_type: &str, object_id: &str) -> ApiError {
    ApiError::ObjectNotFound {
        object_type: object_type.to_string(),
        object_id: object_id.to_string(),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
