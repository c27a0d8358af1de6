use std::future::Future;

use crate::{
    error::{RemoteError, SettingsError},
    header::HeaderPatch,
    types::{UpdateUserRequest, UpdateUserResponse, UserDetails},
};

/// Partial-update and user-details transport.
pub trait AccountService {
    /// Send a partial update. Only fields present in `request` change server side.
    fn update_user(
        &self,
        request: &UpdateUserRequest,
    ) -> impl Future<Output = Result<UpdateUserResponse, RemoteError>>;

    fn fetch_user_details(
        &self,
        user_id: &str,
    ) -> impl Future<Output = Result<UserDetails, RemoteError>>;
}

/// Realtime connection the requests are attributed to.
pub trait SessionLink {
    /// Current connection id, if connected.
    fn socket_id(&self) -> Option<String>;

    /// Switch the connection to a rotated token.
    fn update_token(&self, token: &str);
}

/// Durable storage for the session token.
pub trait CredentialStore {
    fn persist_token(&self, token: &str) -> Result<(), SettingsError>;
}

/// Receiver of optimistic header previews. Fire-and-forget.
pub trait HeaderObserver {
    fn notify(&self, patch: &HeaderPatch);

    /// Drop every pending preview.
    fn reset(&self);
}

/// File picker that yields one encoded payload per selected file.
pub trait FileEncoder {
    fn pick(&self) -> Vec<String>;
}
