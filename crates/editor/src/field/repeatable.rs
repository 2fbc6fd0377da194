use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{EditableField, ExternalSync, FieldId};
use crate::error::FieldError;
use crate::store::ContentStore;
use crate::time::Timestamp;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum RepeatableOp {
    Add { item: Value },
    Remove { index: usize },
    Move { from: usize, to: usize },
    Update { index: usize, key: String, value: Value },
}

/// A list section (services, testimonials) stored as one array.
#[derive(Debug, Clone)]
pub struct RepeatableField {
    id: FieldId,
    path: String,
    items: Vec<Value>,
    disabled: bool,
}

impl RepeatableField {
    pub fn new(id: FieldId, path: impl Into<String>, initial: Option<&Value>) -> Self {
        Self {
            id,
            path: path.into(),
            items: initial
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default(),
            disabled: false,
        }
    }

    pub fn with_disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    pub fn id(&self) -> FieldId {
        self.id
    }

    pub fn items(&self) -> &[Value] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn apply(&mut self, op: RepeatableOp, store: &mut ContentStore) -> Result<(), FieldError> {
        if self.disabled {
            return Err(FieldError::Disabled(self.path.clone()));
        }
        match op {
            RepeatableOp::Add { item } => self.items.push(item),
            RepeatableOp::Remove { index } => {
                self.check_index(index)?;
                self.items.remove(index);
            }
            RepeatableOp::Move { from, to } => {
                self.check_index(from)?;
                self.check_index(to)?;
                let item = self.items.remove(from);
                self.items.insert(to, item);
            }
            RepeatableOp::Update { index, key, value } => {
                self.check_index(index)?;
                match &mut self.items[index] {
                    Value::Object(map) => {
                        map.insert(key, value);
                    }
                    other => {
                        let mut map = serde_json::Map::new();
                        map.insert(key, value);
                        *other = Value::Object(map);
                    }
                }
            }
        }
        tracing::debug!(field = %self.id, path = %self.path, len = self.items.len(), "list updated");
        store.update_content(self.path.clone(), Value::Array(self.items.clone()));
        Ok(())
    }

    fn check_index(&self, index: usize) -> Result<(), FieldError> {
        if index >= self.items.len() {
            return Err(FieldError::IndexOutOfRange {
                index,
                len: self.items.len(),
            });
        }
        Ok(())
    }
}

impl EditableField for RepeatableField {
    fn path(&self) -> &str {
        &self.path
    }

    fn value(&self) -> Value {
        Value::Array(self.items.clone())
    }

    fn is_disabled(&self) -> bool {
        self.disabled
    }

    fn receive_external(&mut self, value: &Value, _now: Timestamp) -> ExternalSync {
        let items = match value {
            Value::Array(items) => items.clone(),
            Value::Null => Vec::new(),
            _ => return ExternalSync::Rejected,
        };
        if items == self.items {
            return ExternalSync::Unchanged;
        }
        self.items = items;
        ExternalSync::Applied
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn move_reorders_items() {
        let mut store = ContentStore::new();
        let initial = json!([{ "title": "a" }, { "title": "b" }, { "title": "c" }]);
        let mut list = RepeatableField::new(FieldId::new(1), "services.items", Some(&initial));

        list.apply(RepeatableOp::Move { from: 0, to: 2 }, &mut store)
            .unwrap();
        assert_eq!(
            store.get("services.items"),
            Some(&json!([{ "title": "b" }, { "title": "c" }, { "title": "a" }]))
        );
        assert!(store.has_unsaved_changes());
    }

    #[test]
    fn out_of_range_index_is_rejected_without_writing() {
        let mut store = ContentStore::new();
        let mut list = RepeatableField::new(FieldId::new(1), "services.items", None);
        let err = list
            .apply(RepeatableOp::Remove { index: 0 }, &mut store)
            .unwrap_err();
        assert_eq!(err, FieldError::IndexOutOfRange { index: 0, len: 0 });
        assert!(!store.has_unsaved_changes());
    }
}
