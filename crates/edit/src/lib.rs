//! resreg editor: JSON text buffer and the create/edit session over a gateway.

#![forbid(unsafe_code)]

mod buffer;
mod session;

pub use buffer::{decode_resource, encode_resource, DecodeError, ResourceEditorBuffer};
pub use session::{EditorSessionController, SessionError, SessionOutcome, SessionState};

/// Hook for whatever presents the editor (modal, pager, terminal raw mode).
///
/// `acquire` runs once when a session opens and `release` once when it closes.
pub trait PresentationLock: Send + Sync {
    fn acquire(&self);
    fn release(&self);
}

/// Lock that does nothing; for headless use.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopLock;

impl PresentationLock for NoopLock {
    fn acquire(&self) {}
    fn release(&self) {}
}

/// Asks the user a yes/no question before a destructive call.
pub trait Confirm: Send + Sync {
    fn confirm(&self, prompt: &str) -> bool;
}

impl<F> Confirm for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn confirm(&self, prompt: &str) -> bool { self(prompt) }
}
