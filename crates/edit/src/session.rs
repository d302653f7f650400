//! Editor session: one open resource (or a new one) and the calls that mutate it.

use std::sync::Arc;
use std::time::Instant;

use resreg_api::CrudGateway;
use resreg_core::{Resource, ResourceKey};
use resreg_store::ResourceListSync;
use tracing::{info, warn};

use crate::buffer::ResourceEditorBuffer;
use crate::{Confirm, PresentationLock};

#[derive(Debug, Clone)]
pub enum SessionState {
    Closed,
    /// Editing a stored resource; `key` is captured at open time and addresses every call.
    EditingExisting { original: Resource, key: ResourceKey, buffer: ResourceEditorBuffer },
    CreatingNew { buffer: ResourceEditorBuffer },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("resource is missing identity field `{0}`")]
    MissingIdentity(&'static str),
}

/// Result of a session action. Failures carry the message shown to the user.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionOutcome {
    Updated(Resource),
    Created(Resource),
    Deleted,
    Reloaded(Resource),
    /// Submission refused: the buffer does not decode.
    Invalid(String),
    /// Confirmation declined; nothing was sent.
    Cancelled,
    Failed(String),
    /// The action does not apply in the current state.
    Ignored,
}

pub struct EditorSessionController {
    gateway: Arc<dyn CrudGateway>,
    lock: Arc<dyn PresentationLock>,
    state: SessionState,
    status: Option<String>,
}

impl EditorSessionController {
    pub fn new(gateway: Arc<dyn CrudGateway>, lock: Arc<dyn PresentationLock>) -> Self {
        Self { gateway, lock, state: SessionState::Closed, status: None }
    }

    pub fn state(&self) -> &SessionState { &self.state }

    pub fn is_open(&self) -> bool { !matches!(self.state, SessionState::Closed) }

    /// Last error or progress message of this session.
    pub fn status(&self) -> Option<&str> { self.status.as_deref() }

    pub fn buffer(&self) -> Option<&ResourceEditorBuffer> {
        match &self.state {
            SessionState::Closed => None,
            SessionState::EditingExisting { buffer, .. } | SessionState::CreatingNew { buffer } => Some(buffer),
        }
    }

    fn buffer_mut(&mut self) -> Option<&mut ResourceEditorBuffer> {
        match &mut self.state {
            SessionState::Closed => None,
            SessionState::EditingExisting { buffer, .. } | SessionState::CreatingNew { buffer } => Some(buffer),
        }
    }

    /// Key the session writes to, if editing an existing resource.
    pub fn target_key(&self) -> Option<&ResourceKey> {
        match &self.state {
            SessionState::EditingExisting { key, .. } => Some(key),
            _ => None,
        }
    }

    /// Open a row for editing. Any open session is closed first.
    pub fn open_existing(&mut self, resource: &Resource) -> Result<(), SessionError> {
        let key = resource
            .key()
            .ok_or_else(|| SessionError::MissingIdentity(resource.missing_identity_field().unwrap_or("name")))?;
        self.close();
        info!(key = %key, "edit: session opened");
        self.state = SessionState::EditingExisting {
            original: resource.clone(),
            key,
            buffer: ResourceEditorBuffer::seeded(Some(resource)),
        };
        self.lock.acquire();
        Ok(())
    }

    pub fn open_create(&mut self) {
        self.close();
        info!("edit: create session opened");
        self.state = SessionState::CreatingNew { buffer: ResourceEditorBuffer::seeded(None) };
        self.lock.acquire();
    }

    /// Feed new editor text. Returns whether it decodes; false when no session is open.
    pub fn edit(&mut self, text: impl Into<String>) -> bool {
        match self.buffer_mut() {
            Some(b) => b.on_text_change(text),
            None => false,
        }
    }

    pub fn cancel(&mut self) {
        if self.is_open() {
            info!("edit: session cancelled");
        }
        self.close();
    }

    fn close(&mut self) {
        if self.is_open() {
            self.state = SessionState::Closed;
            self.status = None;
            self.lock.release();
        }
    }

    fn fail(&mut self, op: &str, e: impl std::fmt::Display) -> SessionOutcome {
        let msg = format!("{} failed: {}", op, e);
        warn!(op, error = %e, "edit: {} failed", op);
        self.status = Some(msg.clone());
        SessionOutcome::Failed(msg)
    }

    /// Update (editing) or create (creating) from the buffer; refreshes the list on success.
    ///
    /// An update stays open and re-seeds from the stored form; a create closes.
    pub async fn submit(&mut self, list: &mut ResourceListSync) -> SessionOutcome {
        let t0 = Instant::now();
        let Some(buffer) = self.buffer() else { return SessionOutcome::Ignored };
        let body = match (buffer.is_valid(), buffer.parsed_value()) {
            (true, Some(body)) => body.clone(),
            _ => {
                let msg = buffer.validity_message().unwrap_or("buffer is not valid JSON").to_string();
                return SessionOutcome::Invalid(msg);
            }
        };

        if let Some(key) = self.target_key().cloned() {
            match self.gateway.update(&key, &body).await {
                Ok(stored) => {
                    if let SessionState::EditingExisting { original, buffer, .. } = &mut self.state {
                        buffer.seed(Some(&stored));
                        *original = stored.clone();
                    }
                    self.status = Some("updated".into());
                    info!(key = %key, took_ms = %t0.elapsed().as_millis(), "edit: update ok");
                    list.refresh().await;
                    SessionOutcome::Updated(stored)
                }
                Err(e) => self.fail("update", e),
            }
        } else {
            match self.gateway.create(&body).await {
                Ok(stored) => {
                    info!(name = stored.name().unwrap_or("-"), took_ms = %t0.elapsed().as_millis(), "edit: create ok");
                    self.close();
                    list.refresh().await;
                    SessionOutcome::Created(stored)
                }
                Err(e) => self.fail("create", e),
            }
        }
    }

    /// Delete the open resource after `confirm` agrees; closes and refreshes the list on success.
    pub async fn delete(&mut self, list: &mut ResourceListSync, confirm: &dyn Confirm) -> SessionOutcome {
        let Some(key) = self.target_key().cloned() else { return SessionOutcome::Ignored };
        if !confirm.confirm(&format!("Delete {}?", key)) {
            info!(key = %key, "edit: delete declined");
            return SessionOutcome::Cancelled;
        }
        match self.gateway.delete(&key).await {
            Ok(()) => {
                info!(key = %key, "edit: delete ok");
                self.close();
                list.refresh().await;
                SessionOutcome::Deleted
            }
            Err(e) => self.fail("delete", e),
        }
    }

    /// Re-fetch the open resource, discarding unsaved edits.
    pub async fn reload(&mut self) -> SessionOutcome {
        let Some(key) = self.target_key().cloned() else { return SessionOutcome::Ignored };
        match self.gateway.get(&key).await {
            Ok(fresh) => {
                if let SessionState::EditingExisting { original, buffer, .. } = &mut self.state {
                    buffer.seed(Some(&fresh));
                    *original = fresh.clone();
                }
                self.status = None;
                info!(key = %key, "edit: reloaded");
                SessionOutcome::Reloaded(fresh)
            }
            Err(e) => self.fail("refresh", e),
        }
    }
}

impl Drop for EditorSessionController {
    fn drop(&mut self) { self.close(); }
}
