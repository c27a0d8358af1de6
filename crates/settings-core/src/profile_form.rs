//! Profile settings form (bio).

use std::{collections::BTreeMap, sync::Arc};

use tracing::{debug, warn};

use crate::{
    diff_store::{DiffStore, FormField},
    error::{RemoteError, SettingsError},
    ports::AccountService,
    state_machine::SubmitGate,
    types::{
        AccountUser, SubmitOutcome, UpdateUserRequest, UpdateUserResponse, UserDetails,
        UserProfile,
    },
};

/// Display limit for the bio counter.
pub const BIO_MAX_CHARS: usize = 1_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ProfileField {
    Bio,
}

impl FormField for ProfileField {
    const ALL: &'static [Self] = &[Self::Bio];

    fn index(self) -> usize {
        self as usize
    }

    fn name(self) -> &'static str {
        match self {
            Self::Bio => "bio",
        }
    }
}

fn profile_default(details: Option<&UserDetails>, field: ProfileField) -> String {
    match field {
        ProfileField::Bio => details
            .and_then(UserDetails::bio)
            .unwrap_or_default()
            .to_owned(),
    }
}

/// Outbound bio: trimmed, with empty/whitespace-only meaning "no bio".
pub fn normalize_bio(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_owned())
}

/// Controller behind the profile settings page.
///
/// The baseline comes from a user-details fetch keyed by the account id; a
/// successful save merges the saved bio into the last snapshot instead of
/// fetching again.
#[derive(Debug)]
pub struct ProfileForm {
    store: DiffStore<ProfileField, UserDetails>,
    gate: SubmitGate,
    error: Option<SettingsError>,
    account: Option<Arc<AccountUser>>,
    fetching: Option<String>,
    pending_bio: Option<Option<String>>,
}

impl Default for ProfileForm {
    fn default() -> Self {
        Self {
            store: DiffStore::new(profile_default),
            gate: SubmitGate::default(),
            error: None,
            account: None,
            fetching: None,
            pending_bio: None,
        }
    }
}

impl ProfileForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether user details have arrived.
    pub fn is_loaded(&self) -> bool {
        self.store.source().is_some()
    }

    pub fn details(&self) -> Option<&Arc<UserDetails>> {
        self.store.source()
    }

    pub fn bio(&self) -> &str {
        self.store.get(ProfileField::Bio)
    }

    pub fn set_bio(&mut self, bio: impl Into<String>) {
        self.store.set(ProfileField::Bio, bio.into());
    }

    pub fn bio_char_count(&self) -> usize {
        self.bio().chars().count()
    }

    pub fn diff(&self) -> BTreeMap<ProfileField, String> {
        self.store.diff()
    }

    pub fn can_save(&self) -> bool {
        self.store.is_dirty()
    }

    pub fn error(&self) -> Option<&SettingsError> {
        self.error.as_ref()
    }

    pub fn gate(&self) -> &SubmitGate {
        &self.gate
    }

    pub fn status_label(&self) -> &'static str {
        self.gate.status_label()
    }

    /// Track the account identity. Returns the user id to fetch when it
    /// changed to a present account.
    pub fn account_changed(&mut self, account: Option<Arc<AccountUser>>) -> Option<String> {
        let unchanged = match (&self.account, &account) {
            (Some(current), Some(next)) => Arc::ptr_eq(current, next),
            (None, None) => true,
            _ => false,
        };
        if unchanged {
            return None;
        }

        self.account = account;
        let Some(user_id) = self.account.as_ref().map(|user| user.id.clone()) else {
            // Logged out: forget the pending fetch and the previous account's details.
            self.fetching = None;
            self.store.sync_source(None);
            debug!("account cleared; profile details dropped");
            return None;
        };
        debug!(%user_id, "profile details fetch requested");
        self.fetching = Some(user_id.clone());
        Some(user_id)
    }

    /// Install fetched details. Responses for a superseded request are ignored.
    pub fn apply_details(&mut self, user_id: &str, details: UserDetails) -> bool {
        if self.fetching.as_deref() != Some(user_id) {
            debug!(%user_id, "ignoring stale profile details");
            return false;
        }
        self.fetching = None;
        self.store.sync_source(Some(Arc::new(details)));
        true
    }

    pub fn fetch_failed(&mut self, user_id: &str, err: RemoteError) {
        if self.fetching.as_deref() != Some(user_id) {
            return;
        }
        self.fetching = None;
        warn!(%user_id, error = %err, "profile details fetch failed");
        self.error = Some(SettingsError::remote(err));
    }

    /// Track `account` and fetch its details when the identity changed.
    pub async fn refresh<A: AccountService>(
        &mut self,
        service: &A,
        account: Option<Arc<AccountUser>>,
    ) -> bool {
        let Some(user_id) = self.account_changed(account) else {
            return false;
        };
        match service.fetch_user_details(&user_id).await {
            Ok(details) => self.apply_details(&user_id, details),
            Err(err) => {
                self.fetch_failed(&user_id, err);
                false
            }
        }
    }

    /// First half of a submit: guard and build `{ bio: trimmed-or-null }`.
    pub fn begin_submit(&mut self) -> Option<UpdateUserRequest> {
        if !self.gate.begin() {
            return None;
        }
        self.error = None;

        if !self.is_loaded() || !self.store.is_dirty() {
            debug!("profile submit skipped: nothing to save");
            self.gate.finish(SubmitOutcome::Ignored);
            return None;
        }

        let bio = normalize_bio(self.bio());
        self.pending_bio = Some(bio.clone());
        Some(UpdateUserRequest {
            bio: Some(bio),
            ..UpdateUserRequest::default()
        })
    }

    /// Second half of a submit. Always releases the gate.
    pub fn finish_submit(
        &mut self,
        result: Result<UpdateUserResponse, RemoteError>,
    ) -> SubmitOutcome {
        let sent = self.pending_bio.take();
        let outcome = match result {
            Ok(_) => {
                let merged = match (sent, self.store.source()) {
                    (Some(bio), Some(current)) => Some(UserDetails {
                        profile: Some(UserProfile { bio }),
                        ..UserDetails::clone(current)
                    }),
                    _ => None,
                };
                if let Some(merged) = merged {
                    self.store.sync_source(Some(Arc::new(merged)));
                }
                SubmitOutcome::Saved
            }
            Err(err) => {
                warn!(error = %err, "profile update failed");
                self.error = Some(SettingsError::remote(err));
                SubmitOutcome::Failed
            }
        };
        self.gate.finish(outcome.clone());
        outcome
    }

    pub async fn submit<A: AccountService>(&mut self, service: &A) -> SubmitOutcome {
        let Some(request) = self.begin_submit() else {
            return SubmitOutcome::Ignored;
        };
        let result = service.update_user(&request).await;
        self.finish_submit(result)
    }
}
