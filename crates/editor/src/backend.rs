//! Contracts with the persistence and account layers, plus in-memory
//! stand-ins used by tests and the playground.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{BackendError, SaveError};
use crate::store::ContentMap;
use crate::time::Timestamp;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(String);

impl OwnerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredContent {
    pub content: ContentMap,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<Timestamp>,
}

pub trait ContentBackend {
    fn load_content(
        &self,
        owner: &OwnerId,
        theme: &str,
    ) -> Result<Option<StoredContent>, BackendError>;

    /// Persists the full map. Saving identical content twice must leave the
    /// same stored state as saving it once.
    fn save_content(
        &mut self,
        owner: &OwnerId,
        theme: &str,
        content: &ContentMap,
    ) -> Result<(), BackendError>;
}

pub trait AuthProvider {
    fn is_authenticated(&self) -> bool;
    fn current_owner_id(&self) -> Option<OwnerId>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Plan {
    #[default]
    Trial,
    Starter,
    Pro,
}

pub trait PlanPolicy {
    fn permission_to_edit_images(&self, plan: Plan) -> bool;
    fn permission_to_upload_images(&self, plan: Plan) -> bool;
}

/// Stock images on every plan; uploads once the site is paid for.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultPlanPolicy;

impl PlanPolicy for DefaultPlanPolicy {
    fn permission_to_edit_images(&self, _plan: Plan) -> bool {
        true
    }

    fn permission_to_upload_images(&self, plan: Plan) -> bool {
        matches!(plan, Plan::Starter | Plan::Pro)
    }
}

/// Anything that can persist a content snapshot on behalf of the autosave
/// scheduler.
pub trait SaveContent {
    fn save(&mut self, content: &ContentMap) -> Result<(), SaveError>;
}

/// Binds a backend to the signed-in owner and the theme being edited.
pub struct Saver<B, A> {
    backend: B,
    auth: A,
    theme: String,
}

impl<B: ContentBackend, A: AuthProvider> Saver<B, A> {
    pub fn new(backend: B, auth: A, theme: impl Into<String>) -> Self {
        Self {
            backend,
            auth,
            theme: theme.into(),
        }
    }

    pub fn theme(&self) -> &str {
        &self.theme
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn auth(&self) -> &A {
        &self.auth
    }

    pub fn auth_mut(&mut self) -> &mut A {
        &mut self.auth
    }

    fn owner(&self) -> Option<OwnerId> {
        if !self.auth.is_authenticated() {
            return None;
        }
        self.auth.current_owner_id()
    }

    /// Loads saved content; anonymous sessions have nothing to load.
    pub fn load(&self) -> Result<Option<StoredContent>, SaveError> {
        let Some(owner) = self.owner() else {
            return Ok(None);
        };
        Ok(self.backend.load_content(&owner, &self.theme)?)
    }
}

impl<B: ContentBackend, A: AuthProvider> SaveContent for Saver<B, A> {
    fn save(&mut self, content: &ContentMap) -> Result<(), SaveError> {
        let owner = self.owner().ok_or(SaveError::Unauthenticated)?;
        self.backend.save_content(&owner, &self.theme, content)?;
        Ok(())
    }
}

/// Keeps saved content in memory and records how it was called.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    records: HashMap<(OwnerId, String), StoredContent>,
    save_calls: usize,
    writes: usize,
    fail_next: usize,
    clock: Timestamp,
    last_saved: Option<ContentMap>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_content(
        mut self,
        owner: &OwnerId,
        theme: &str,
        content: ContentMap,
        last_updated: Option<Timestamp>,
    ) -> Self {
        self.records.insert(
            (owner.clone(), theme.to_string()),
            StoredContent {
                content,
                last_updated,
            },
        );
        self
    }

    /// Makes the next `count` saves fail.
    pub fn fail_next(&mut self, count: usize) {
        self.fail_next = count;
    }

    /// Timestamp recorded as `last_updated` by subsequent saves.
    pub fn set_clock(&mut self, now: Timestamp) {
        self.clock = now;
    }

    pub fn save_calls(&self) -> usize {
        self.save_calls
    }

    /// Saves that actually changed the stored state.
    pub fn writes(&self) -> usize {
        self.writes
    }

    pub fn last_saved(&self) -> Option<&ContentMap> {
        self.last_saved.as_ref()
    }

    pub fn stored(&self, owner: &OwnerId, theme: &str) -> Option<&StoredContent> {
        self.records.get(&(owner.clone(), theme.to_string()))
    }
}

impl ContentBackend for MemoryBackend {
    fn load_content(
        &self,
        owner: &OwnerId,
        theme: &str,
    ) -> Result<Option<StoredContent>, BackendError> {
        Ok(self.stored(owner, theme).cloned())
    }

    fn save_content(
        &mut self,
        owner: &OwnerId,
        theme: &str,
        content: &ContentMap,
    ) -> Result<(), BackendError> {
        self.save_calls += 1;
        if self.fail_next > 0 {
            self.fail_next -= 1;
            return Err(BackendError::new("service unavailable"));
        }

        self.last_saved = Some(content.clone());
        let key = (owner.clone(), theme.to_string());
        if self.records.get(&key).is_some_and(|stored| &stored.content == content) {
            return Ok(());
        }
        self.records.insert(
            key,
            StoredContent {
                content: content.clone(),
                last_updated: Some(self.clock),
            },
        );
        self.writes += 1;
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct StaticAuth {
    owner: Option<OwnerId>,
}

impl StaticAuth {
    pub fn signed_in(owner: OwnerId) -> Self {
        Self { owner: Some(owner) }
    }

    pub fn anonymous() -> Self {
        Self { owner: None }
    }

    pub fn sign_in(&mut self, owner: OwnerId) {
        self.owner = Some(owner);
    }

    pub fn sign_out(&mut self) {
        self.owner = None;
    }
}

impl AuthProvider for StaticAuth {
    fn is_authenticated(&self) -> bool {
        self.owner.is_some()
    }

    fn current_owner_id(&self) -> Option<OwnerId> {
        self.owner.clone()
    }
}
