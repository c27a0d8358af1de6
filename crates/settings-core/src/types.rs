use serde::{Deserialize, Serialize};

/// Account record supplied by the external account state.
///
/// Optional fields may be missing from the server payload; the forms only
/// rely on presence/absence.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct AccountUser {
    /// Stable account identifier.
    pub id: String,
    /// Login email address.
    pub email: Option<String>,
    /// Display username.
    pub username: Option<String>,
    /// Discriminator tag shown next to the username.
    pub tag: Option<String>,
    /// Current avatar reference, when set.
    pub avatar: Option<String>,
    /// Current banner reference, when set.
    pub banner: Option<String>,
}

/// Public profile section of the user details payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct UserProfile {
    /// Free-form multiline bio; `None` means the user has no bio.
    pub bio: Option<String>,
}

/// Response of the user details fetch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserDetails {
    /// Account the details belong to.
    pub user: AccountUser,
    /// Profile section, absent when the user never saved one.
    pub profile: Option<UserProfile>,
}

impl UserDetails {
    /// Bio text when present.
    pub fn bio(&self) -> Option<&str> {
        self.profile.as_ref().and_then(|profile| profile.bio.as_deref())
    }
}

/// Outbound partial-update body. Absent fields are not serialized.
#[derive(Debug, Clone, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    /// Current password, required by the server for sensitive changes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_password: Option<String>,
    /// Encoded image payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    /// Encoded image payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub banner: Option<String>,
    /// `None` leaves the bio alone, `Some(None)` serializes as an explicit `null`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<Option<String>>,
    /// Realtime connection id so the server can skip echoing the change back.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub socket_id: Option<String>,
}

impl UpdateUserRequest {
    /// `true` when no field would be sent.
    pub fn is_empty(&self) -> bool {
        *self
            == Self {
                socket_id: self.socket_id.clone(),
                ..Self::default()
            }
    }
}

/// Partial-update response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserResponse {
    /// Rotated session token, issued after a password change.
    pub new_token: Option<String>,
}

/// Final outcome of one submit attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Another submit was already in flight; nothing happened.
    Ignored,
    /// Local validation failed; nothing was sent.
    Rejected,
    /// The server accepted the update.
    Saved,
    /// The server (or transport) failed the update.
    Failed,
}
