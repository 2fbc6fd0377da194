use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{EditableField, ExternalSync, FieldId};
use crate::backend::{Plan, PlanPolicy};
use crate::error::FieldError;
use crate::store::ContentStore;
use crate::time::Timestamp;

/// Image actions offered to the current plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ImageAffordances {
    pub pick_stock: bool,
    pub upload: bool,
}

impl ImageAffordances {
    pub fn for_plan(policy: &dyn PlanPolicy, plan: Plan) -> Self {
        Self {
            pick_stock: policy.permission_to_edit_images(plan),
            upload: policy.permission_to_upload_images(plan),
        }
    }
}

/// An image slot whose `src` lives at a store path.
#[derive(Debug, Clone)]
pub struct EditableImage {
    id: FieldId,
    path: String,
    default_src: String,
    src: String,
    disabled: bool,
    affordances: ImageAffordances,
}

impl EditableImage {
    pub fn new(
        id: FieldId,
        path: impl Into<String>,
        default_src: impl Into<String>,
        initial: Option<&str>,
        affordances: ImageAffordances,
    ) -> Self {
        Self {
            id,
            path: path.into(),
            default_src: default_src.into(),
            src: initial.unwrap_or_default().to_string(),
            disabled: false,
            affordances,
        }
    }

    pub fn with_disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    pub fn id(&self) -> FieldId {
        self.id
    }

    pub fn affordances(&self) -> ImageAffordances {
        self.affordances
    }

    pub fn set_affordances(&mut self, affordances: ImageAffordances) {
        self.affordances = affordances;
    }

    /// The `src` the page shows, falling back to the theme default.
    pub fn display_src(&self) -> &str {
        if self.src.is_empty() {
            &self.default_src
        } else {
            &self.src
        }
    }

    pub fn choose_stock(&mut self, url: &str, store: &mut ContentStore) -> Result<(), FieldError> {
        self.check("choosing a stock image", self.affordances.pick_stock)?;
        self.replace(url, store);
        Ok(())
    }

    /// Takes the URL of an image the host has already uploaded.
    pub fn upload(&mut self, url: &str, store: &mut ContentStore) -> Result<(), FieldError> {
        self.check("uploading images", self.affordances.upload)?;
        self.replace(url, store);
        Ok(())
    }

    fn check(&self, action: &'static str, allowed: bool) -> Result<(), FieldError> {
        if self.disabled {
            return Err(FieldError::Disabled(self.path.clone()));
        }
        if !allowed {
            return Err(FieldError::NotPermitted { action });
        }
        Ok(())
    }

    fn replace(&mut self, url: &str, store: &mut ContentStore) {
        tracing::debug!(field = %self.id, path = %self.path, url, "image replaced");
        self.src = url.to_string();
        store.update_content(self.path.clone(), self.src.clone());
    }
}

impl EditableField for EditableImage {
    fn path(&self) -> &str {
        &self.path
    }

    fn value(&self) -> Value {
        Value::String(self.src.clone())
    }

    fn is_disabled(&self) -> bool {
        self.disabled
    }

    fn receive_external(&mut self, value: &Value, _now: Timestamp) -> ExternalSync {
        let incoming = match value {
            Value::String(s) => s.as_str(),
            Value::Null => "",
            _ => return ExternalSync::Rejected,
        };
        if incoming == self.src {
            return ExternalSync::Unchanged;
        }
        self.src = incoming.to_string();
        ExternalSync::Applied
    }
}
