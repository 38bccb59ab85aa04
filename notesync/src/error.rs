//! Engine error taxonomy
//!
//! Store failures never propagate to the UI layer as errors; the session
//! actor translates them into status-line state. `SessionError` covers the
//! operations the API facade can actually get wrong: talking to a session
//! that is not open, or failing to reach the store when opening one.

use crate::store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("no session is open")]
    NoSession,

    #[error("session mailbox closed: {0}")]
    Mailbox(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}
