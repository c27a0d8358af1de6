//! Settings core shared by the chat client's account and profile pages.
//!
//! This crate holds the edit-state diff tracker, the form controllers built
//! on it, the submit state machine, wire types and the collaborator traits
//! the forms talk to.

/// Account settings form controller.
pub mod account_form;
/// Header preview broadcast channel.
pub mod channel;
/// Edit-state diff tracker.
pub mod diff_store;
/// Stable settings error types and HTTP classification helpers.
pub mod error;
/// Header preview patches and reducer state.
pub mod header;
/// Language registry and translation pack loading.
pub mod languages;
/// Collaborator traits (transport, session, credentials, header, files).
pub mod ports;
/// Profile (bio) form controller.
pub mod profile_form;
/// Submit in-flight gate.
pub mod state_machine;
/// Wire types for the account endpoints.
pub mod types;
/// Process-wide window properties.
pub mod window;

#[cfg(test)]
mod test_support;

pub use account_form::{AccountField, AccountForm};
pub use channel::{HeaderChannel, HeaderStream};
pub use diff_store::{DiffStore, FieldValues, FormField};
pub use error::{RemoteError, SettingsError, SettingsErrorCategory, classify_http_status};
pub use header::{HeaderEvent, HeaderPatch, HeaderPreview};
pub use languages::{Language, LanguageError, LanguageRegistry, PackSource};
pub use ports::{AccountService, CredentialStore, FileEncoder, HeaderObserver, SessionLink};
pub use profile_form::{BIO_MAX_CHARS, ProfileField, ProfileForm, normalize_bio};
pub use state_machine::{SubmitGate, SubmitPhase};
pub use types::{
    AccountUser, SubmitOutcome, UpdateUserRequest, UpdateUserResponse, UserDetails, UserProfile,
};
pub use window::{WindowProperties, WindowSnapshot};
