//! Account settings form: email, username, tag, images and password change.

use std::{collections::BTreeMap, sync::Arc};

use tracing::{debug, info, warn};

use crate::{
    diff_store::{DiffStore, FieldValues, FormField},
    error::{RemoteError, SettingsError},
    header::HeaderPatch,
    ports::{AccountService, CredentialStore, FileEncoder, HeaderObserver, SessionLink},
    state_machine::SubmitGate,
    types::{AccountUser, SubmitOutcome, UpdateUserRequest, UpdateUserResponse},
};

/// Editable fields of the account form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AccountField {
    Email,
    Username,
    Tag,
    /// Current password, confirming sensitive changes.
    Password,
    NewPassword,
    /// UI-only; never sent.
    ConfirmNewPassword,
    /// Encoded image payload picked by the user.
    Avatar,
    /// Encoded image payload picked by the user.
    Banner,
}

impl FormField for AccountField {
    const ALL: &'static [Self] = &[
        Self::Email,
        Self::Username,
        Self::Tag,
        Self::Password,
        Self::NewPassword,
        Self::ConfirmNewPassword,
        Self::Avatar,
        Self::Banner,
    ];

    fn index(self) -> usize {
        self as usize
    }

    fn name(self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Username => "username",
            Self::Tag => "tag",
            Self::Password => "password",
            Self::NewPassword => "newPassword",
            Self::ConfirmNewPassword => "confirmNewPassword",
            Self::Avatar => "avatar",
            Self::Banner => "banner",
        }
    }
}

/// Fields written back to their defaults after a successful save.
const CLEARED_AFTER_SAVE: [AccountField; 5] = [
    AccountField::Password,
    AccountField::NewPassword,
    AccountField::ConfirmNewPassword,
    AccountField::Avatar,
    AccountField::Banner,
];

/// Baseline for the account form. Missing account values become `""`.
fn account_default(user: Option<&AccountUser>, field: AccountField) -> String {
    let Some(user) = user else {
        return String::new();
    };
    let value = match field {
        AccountField::Email => user.email.as_ref(),
        AccountField::Username => user.username.as_ref(),
        AccountField::Tag => user.tag.as_ref(),
        AccountField::Password
        | AccountField::NewPassword
        | AccountField::ConfirmNewPassword
        | AccountField::Avatar
        | AccountField::Banner => None,
    };
    value.cloned().unwrap_or_default()
}

#[derive(Debug, Clone, Copy)]
enum ImageSlot {
    Avatar,
    Banner,
}

impl ImageSlot {
    fn field(self) -> AccountField {
        match self {
            Self::Avatar => AccountField::Avatar,
            Self::Banner => AccountField::Banner,
        }
    }

    fn patch(self, value: Option<String>) -> HeaderPatch {
        match self {
            Self::Avatar => HeaderPatch::default().avatar(value),
            Self::Banner => HeaderPatch::default().banner(value),
        }
    }
}

/// Controller behind the account settings page.
///
/// Owns the diff store, the in-flight gate and the header preview side
/// channel. Dropping the form rolls back any header previews it pushed.
pub struct AccountForm<H: HeaderObserver> {
    store: DiffStore<AccountField, AccountUser>,
    gate: SubmitGate,
    error: Option<SettingsError>,
    pending: Option<UpdateUserRequest>,
    show_change_password: bool,
    header: H,
    mounted: bool,
}

impl<H: HeaderObserver> AccountForm<H> {
    /// Mount the form against the current account state.
    pub fn new(account: Option<Arc<AccountUser>>, header: H) -> Self {
        Self {
            store: DiffStore::with_source(account_default, account),
            gate: SubmitGate::default(),
            error: None,
            pending: None,
            show_change_password: false,
            header,
            mounted: true,
        }
    }

    /// Feed the latest account snapshot. A new snapshot discards all edits.
    pub fn sync_account(&mut self, account: Option<Arc<AccountUser>>) -> bool {
        let rebased = self.store.sync_source(account);
        if rebased {
            debug!("account form rebased on new account snapshot");
        }
        rebased
    }

    pub fn account(&self) -> Option<&Arc<AccountUser>> {
        self.store.source()
    }

    pub fn values(&self) -> FieldValues<AccountField> {
        self.store.values()
    }

    pub fn value(&self, field: AccountField) -> &str {
        self.store.get(field)
    }

    pub fn diff(&self) -> BTreeMap<AccountField, String> {
        self.store.diff()
    }

    pub fn set(&mut self, field: AccountField, value: impl Into<String>) {
        self.store.set(field, value.into());
    }

    /// Whether the save action should be offered.
    pub fn can_save(&self) -> bool {
        self.store.is_dirty()
    }

    /// The current password prompt is shown whenever anything changed.
    pub fn needs_password_confirmation(&self) -> bool {
        self.store.is_dirty()
    }

    pub fn show_change_password(&self) -> bool {
        self.show_change_password
    }

    /// Toggle the change-password section, clearing both new-password fields.
    pub fn toggle_change_password(&mut self) {
        self.store.set(AccountField::NewPassword, String::new());
        self.store.set(AccountField::ConfirmNewPassword, String::new());
        self.show_change_password = !self.show_change_password;
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

    /// Use the first picked payload as the new avatar and preview it in the header.
    pub fn pick_avatar(&mut self, payloads: impl IntoIterator<Item = String>) -> bool {
        self.pick_image(ImageSlot::Avatar, payloads)
    }

    /// Use the first picked payload as the new banner and preview it in the header.
    pub fn pick_banner(&mut self, payloads: impl IntoIterator<Item = String>) -> bool {
        self.pick_image(ImageSlot::Banner, payloads)
    }

    pub fn browse_avatar(&mut self, encoder: &impl FileEncoder) -> bool {
        self.pick_avatar(encoder.pick())
    }

    pub fn browse_banner(&mut self, encoder: &impl FileEncoder) -> bool {
        self.pick_banner(encoder.pick())
    }

    /// Undo an avatar pick: clears the field and its header preview.
    pub fn clear_avatar(&mut self) {
        self.clear_image(ImageSlot::Avatar);
    }

    /// Undo a banner pick: clears the field and its header preview.
    pub fn clear_banner(&mut self) {
        self.clear_image(ImageSlot::Banner);
    }

    fn pick_image(&mut self, slot: ImageSlot, payloads: impl IntoIterator<Item = String>) -> bool {
        let Some(payload) = payloads.into_iter().next().filter(|p| !p.is_empty()) else {
            return false;
        };
        self.store.set(slot.field(), payload.clone());
        if self.mounted {
            self.header.notify(&slot.patch(Some(payload)));
        }
        true
    }

    fn clear_image(&mut self, slot: ImageSlot) {
        self.store.set(slot.field(), String::new());
        if self.mounted {
            self.header.notify(&slot.patch(None));
        }
    }

    /// First half of a submit: guard, validate and build the outbound request.
    ///
    /// Returns `Ok(None)` when a submit is already in flight or nothing
    /// changed. On validation failure no request is built and the edits stay
    /// as they are.
    pub fn begin_submit(
        &mut self,
        session: &impl SessionLink,
    ) -> Result<Option<UpdateUserRequest>, SettingsError> {
        if !self.gate.begin() {
            return Ok(None);
        }
        self.error = None;

        if self.store.source().is_none() {
            debug!("account submit skipped: no account loaded");
            self.gate.finish(SubmitOutcome::Ignored);
            return Ok(None);
        }

        let new_password = self.store.get(AccountField::NewPassword);
        if !new_password.is_empty()
            && new_password != self.store.get(AccountField::ConfirmNewPassword)
        {
            let err = SettingsError::password_mismatch();
            warn!(code = %err.code, "account submit rejected by validation");
            self.error = Some(err.clone());
            self.gate.finish(SubmitOutcome::Rejected);
            return Err(err);
        }

        let request = self.build_request(session.socket_id());
        if request.is_empty() {
            debug!("account submit skipped: nothing changed");
            self.gate.finish(SubmitOutcome::Ignored);
            return Ok(None);
        }

        let fields: Vec<&str> = self.store.diff().keys().map(|f| f.name()).collect();
        debug!(?fields, "account submit started");
        self.pending = Some(request.clone());
        Ok(Some(request))
    }

    /// Second half of a submit: apply the server result. Always releases the gate.
    pub fn finish_submit(
        &mut self,
        result: Result<UpdateUserResponse, RemoteError>,
        credentials: &impl CredentialStore,
        session: &impl SessionLink,
    ) -> SubmitOutcome {
        let sent = self.pending.take();
        let outcome = match result {
            Ok(response) => {
                self.apply_saved(sent, response, credentials, session);
                SubmitOutcome::Saved
            }
            Err(err) => {
                warn!(error = %err, "account update failed");
                self.error = Some(SettingsError::remote(err));
                SubmitOutcome::Failed
            }
        };
        self.gate.finish(outcome.clone());
        outcome
    }

    /// Run a full submit against `service`.
    pub async fn submit<A, C, L>(
        &mut self,
        service: &A,
        credentials: &C,
        session: &L,
    ) -> SubmitOutcome
    where
        A: AccountService,
        C: CredentialStore,
        L: SessionLink,
    {
        let request = match self.begin_submit(session) {
            Ok(Some(request)) => request,
            Ok(None) => return SubmitOutcome::Ignored,
            Err(_) => return SubmitOutcome::Rejected,
        };
        let result = service.update_user(&request).await;
        self.finish_submit(result, credentials, session)
    }

    /// Tear the form down: drop header previews. Safe to call repeatedly.
    pub fn unmount(&mut self) {
        if !self.mounted {
            return;
        }
        self.mounted = false;
        self.header.reset();
        debug!("account form unmounted");
    }

    fn build_request(&self, socket_id: Option<String>) -> UpdateUserRequest {
        let mut request = UpdateUserRequest {
            socket_id,
            ..UpdateUserRequest::default()
        };
        for (field, value) in self.store.diff() {
            match field {
                AccountField::Email => request.email = Some(value),
                AccountField::Username => request.username = Some(value),
                AccountField::Tag => request.tag = Some(value),
                AccountField::Password => request.password = Some(value),
                AccountField::NewPassword => request.new_password = Some(value),
                AccountField::ConfirmNewPassword => {}
                AccountField::Avatar => request.avatar = Some(value),
                AccountField::Banner => request.banner = Some(value),
            }
        }
        request
    }

    fn apply_saved(
        &mut self,
        sent: Option<UpdateUserRequest>,
        response: UpdateUserResponse,
        credentials: &impl CredentialStore,
        session: &impl SessionLink,
    ) {
        if let Some(token) = response.new_token.as_deref() {
            info!("session token rotated by account update");
            if let Err(err) = credentials.persist_token(token) {
                warn!(error = %err, "failed persisting rotated token");
                self.error = Some(err);
            }
            session.update_token(token);
        }

        let saved = match (sent, self.store.source()) {
            (Some(sent), Some(current)) => Some(merge_saved(current, sent)),
            _ => None,
        };
        if let Some(saved) = saved {
            self.store.sync_source(Some(Arc::new(saved)));
        }

        self.show_change_password = false;
        for field in CLEARED_AFTER_SAVE {
            self.store.reset(field);
        }
        if self.mounted {
            self.header.reset();
        }
    }
}

/// Account snapshot the server holds after accepting `sent`.
fn merge_saved(current: &AccountUser, sent: UpdateUserRequest) -> AccountUser {
    let mut saved = current.clone();
    if sent.email.is_some() {
        saved.email = sent.email;
    }
    if sent.username.is_some() {
        saved.username = sent.username;
    }
    if sent.tag.is_some() {
        saved.tag = sent.tag;
    }
    saved
}

impl<H: HeaderObserver> Drop for AccountForm<H> {
    fn drop(&mut self) {
        self.unmount();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        channel::{HeaderChannel, HeaderStream},
        error::{PASSWORD_MISMATCH_MESSAGE, SettingsErrorCategory},
        header::HeaderEvent,
        test_support::{FakeCredentials, FakeService, FakeSession, account},
    };

    fn mounted_form() -> (AccountForm<HeaderChannel>, HeaderStream) {
        let header = HeaderChannel::new(32);
        let rx = header.subscribe();
        (AccountForm::new(Some(account("u1", "a", "1")), header), rx)
    }

    fn drain(rx: &mut HeaderStream) -> Vec<HeaderEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[test]
    fn baseline_uses_account_values_and_empty_secrets() {
        let (form, _rx) = mounted_form();
        let values = form.values();
        assert_eq!(values.get(AccountField::Username), "a");
        assert_eq!(values.get(AccountField::Tag), "1");
        assert_eq!(values.get(AccountField::Email), "a@example.org");
        assert_eq!(values.get(AccountField::Password), "");
        assert_eq!(values.get(AccountField::Avatar), "");
        assert!(!form.can_save());
    }

    #[tokio::test]
    async fn saving_username_rebases_and_clears_diff() {
        let (mut form, _rx) = mounted_form();
        let service = FakeService::default();
        let session = FakeSession::connected("sock-1");
        let credentials = FakeCredentials::default();

        form.set(AccountField::Username, "b");
        assert_eq!(form.value(AccountField::Username), "b");
        assert_eq!(form.diff().len(), 1);
        assert!(form.needs_password_confirmation());

        let outcome = form.submit(&service, &credentials, &session).await;

        assert_eq!(outcome, SubmitOutcome::Saved);
        let sent = service.updates.borrow();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].username.as_deref(), Some("b"));
        assert_eq!(sent[0].tag, None);
        assert_eq!(sent[0].socket_id.as_deref(), Some("sock-1"));

        assert!(form.diff().is_empty());
        assert_eq!(form.value(AccountField::Username), "b");
        assert_eq!(form.value(AccountField::Tag), "1");
        assert!(!form.gate().is_sending());
        assert_eq!(form.status_label(), "Save Changes");
    }

    #[tokio::test]
    async fn password_mismatch_sends_nothing_and_keeps_edits() {
        let (mut form, _rx) = mounted_form();
        let service = FakeService::default();
        let session = FakeSession::default();
        let credentials = FakeCredentials::default();

        form.toggle_change_password();
        form.set(AccountField::NewPassword, "abc");
        form.set(AccountField::ConfirmNewPassword, "abd");
        let before = form.diff();

        let outcome = form.submit(&service, &credentials, &session).await;

        assert_eq!(outcome, SubmitOutcome::Rejected);
        assert!(service.updates.borrow().is_empty());
        let err = form.error().expect("validation error should be set");
        assert_eq!(err.category, SettingsErrorCategory::Validation);
        assert_eq!(err.message, PASSWORD_MISMATCH_MESSAGE);
        assert_eq!(form.diff(), before);
        assert!(!form.gate().is_sending());
    }

    #[test]
    fn second_begin_while_sending_is_dropped() {
        let (mut form, _rx) = mounted_form();
        let session = FakeSession::default();
        form.set(AccountField::Tag, "2");

        let first = form.begin_submit(&session).expect("first submit should start");
        let second = form.begin_submit(&session).expect("second submit is a no-op");

        assert!(first.is_some());
        assert!(second.is_none());
        assert_eq!(form.status_label(), "Saving...");

        form.finish_submit(
            Ok(UpdateUserResponse::default()),
            &FakeCredentials::default(),
            &session,
        );
        assert!(!form.gate().is_sending());
    }

    #[test]
    fn confirmation_field_is_never_sent() {
        let (mut form, _rx) = mounted_form();
        form.set(AccountField::Password, "old");
        form.set(AccountField::NewPassword, "new-pass");
        form.set(AccountField::ConfirmNewPassword, "new-pass");

        let request = form
            .begin_submit(&FakeSession::default())
            .expect("matching passwords should validate")
            .expect("request should be built");

        let json = serde_json::to_value(&request).expect("request should serialize");
        assert_eq!(
            json,
            serde_json::json!({ "password": "old", "newPassword": "new-pass" })
        );
    }

    #[tokio::test]
    async fn remote_failure_keeps_edits_and_surfaces_message() {
        let (mut form, _rx) = mounted_form();
        let service = FakeService::default();
        service.respond_with(Err(RemoteError::new("Invalid password.").with_status(403)));
        let session = FakeSession::default();

        form.set(AccountField::Email, "new@example.org");
        form.set(AccountField::Password, "wrong");

        let outcome = form
            .submit(&service, &FakeCredentials::default(), &session)
            .await;

        assert_eq!(outcome, SubmitOutcome::Failed);
        assert_eq!(
            form.error().map(|err| err.message.as_str()),
            Some("Invalid password.")
        );
        assert_eq!(form.value(AccountField::Email), "new@example.org");
        assert_eq!(form.diff().len(), 2);

        let retry = form
            .submit(&service, &FakeCredentials::default(), &session)
            .await;
        assert_eq!(retry, SubmitOutcome::Saved);
        assert_eq!(form.error(), None);
        assert_eq!(service.updates.borrow().len(), 2);
    }

    #[tokio::test]
    async fn rotated_token_is_persisted_and_propagated() {
        let (mut form, _rx) = mounted_form();
        let service = FakeService::default();
        service.respond_with(Ok(UpdateUserResponse {
            new_token: Some("token-2".to_owned()),
        }));
        let session = FakeSession::connected("sock-1");
        let credentials = FakeCredentials::default();

        form.toggle_change_password();
        form.set(AccountField::Password, "old");
        form.set(AccountField::NewPassword, "next");
        form.set(AccountField::ConfirmNewPassword, "next");

        assert_eq!(
            form.submit(&service, &credentials, &session).await,
            SubmitOutcome::Saved
        );
        assert_eq!(*credentials.tokens.borrow(), vec!["token-2".to_owned()]);
        assert_eq!(*session.tokens.borrow(), vec!["token-2".to_owned()]);
        assert_eq!(form.value(AccountField::NewPassword), "");
        assert_eq!(form.value(AccountField::Password), "");
        assert!(!form.show_change_password());
        assert!(form.diff().is_empty());
    }

    #[tokio::test]
    async fn token_persist_failure_is_reported_but_save_stands() {
        let (mut form, _rx) = mounted_form();
        let service = FakeService::default();
        service.respond_with(Ok(UpdateUserResponse {
            new_token: Some("token-3".to_owned()),
        }));
        let session = FakeSession::default();
        let credentials = FakeCredentials {
            fail: true,
            ..FakeCredentials::default()
        };

        form.set(AccountField::Username, "z");
        let outcome = form.submit(&service, &credentials, &session).await;

        assert_eq!(outcome, SubmitOutcome::Saved);
        assert_eq!(
            form.error().map(|err| err.category),
            Some(SettingsErrorCategory::Storage)
        );
        assert_eq!(*session.tokens.borrow(), vec!["token-3".to_owned()]);
    }

    #[test]
    fn avatar_pick_previews_and_clear_undoes_both() {
        let (mut form, mut rx) = mounted_form();

        assert!(form.pick_avatar(vec!["data:a".to_owned(), "data:b".to_owned()]));
        assert_eq!(form.value(AccountField::Avatar), "data:a");
        assert_eq!(
            drain(&mut rx),
            vec![HeaderEvent::Patched(
                HeaderPatch::default().avatar(Some("data:a".to_owned()))
            )]
        );

        form.clear_avatar();
        assert!(form.diff().is_empty());
        assert_eq!(
            drain(&mut rx),
            vec![HeaderEvent::Patched(HeaderPatch::default().avatar(None))]
        );
    }

    #[test]
    fn empty_pick_is_ignored() {
        let (mut form, mut rx) = mounted_form();
        assert!(!form.pick_banner(Vec::new()));
        assert!(form.diff().is_empty());
        assert!(drain(&mut rx).is_empty());
    }

    #[test]
    fn browse_uses_file_encoder() {
        struct OneFile;
        impl FileEncoder for OneFile {
            fn pick(&self) -> Vec<String> {
                vec!["data:image/png;base64,iVBOR".to_owned()]
            }
        }

        let (mut form, _rx) = mounted_form();
        assert!(form.browse_banner(&OneFile));
        assert_eq!(
            form.diff().get(&AccountField::Banner).map(String::as_str),
            Some("data:image/png;base64,iVBOR")
        );
    }

    #[tokio::test]
    async fn successful_save_resets_header_and_image_fields() {
        let (mut form, mut rx) = mounted_form();
        let service = FakeService::default();

        form.pick_banner(vec!["data:banner".to_owned()]);
        drain(&mut rx);

        form.submit(&service, &FakeCredentials::default(), &FakeSession::default())
            .await;

        assert_eq!(
            service.updates.borrow()[0].banner.as_deref(),
            Some("data:banner")
        );
        assert_eq!(form.value(AccountField::Banner), "");
        assert_eq!(drain(&mut rx), vec![HeaderEvent::Reset]);
    }

    #[test]
    fn refreshed_account_discards_in_progress_edits() {
        let (mut form, _rx) = mounted_form();
        form.set(AccountField::Username, "draft");

        assert!(form.sync_account(Some(account("u1", "pushed", "1"))));
        assert!(form.diff().is_empty());
        assert_eq!(form.value(AccountField::Username), "pushed");
    }

    #[test]
    fn nothing_changed_does_not_build_a_request() {
        let (mut form, _rx) = mounted_form();
        let result = form
            .begin_submit(&FakeSession::connected("sock-1"))
            .expect("empty submit is not an error");
        assert_eq!(result, None);
        assert!(!form.gate().is_sending());
    }

    #[tokio::test]
    async fn submit_without_account_is_skipped_and_keeps_edits() {
        let header = HeaderChannel::new(4);
        let mut form = AccountForm::new(None, header);
        let service = FakeService::default();

        form.set(AccountField::Username, "b");
        let outcome = form
            .submit(&service, &FakeCredentials::default(), &FakeSession::default())
            .await;

        assert_eq!(outcome, SubmitOutcome::Ignored);
        assert!(service.updates.borrow().is_empty());
        assert_eq!(
            form.diff().get(&AccountField::Username).map(String::as_str),
            Some("b")
        );
        assert!(!form.gate().is_sending());
        assert_eq!(form.gate().last_outcome(), Some(&SubmitOutcome::Ignored));
    }

    #[test]
    fn late_response_after_unmount_is_applied_without_a_second_reset() {
        let (mut form, mut rx) = mounted_form();
        let session = FakeSession::default();
        form.pick_avatar(vec!["data:avatar".to_owned()]);
        form.set(AccountField::Username, "b");
        drain(&mut rx);

        let request = form
            .begin_submit(&session)
            .expect("submit should validate")
            .expect("request should be built");
        assert_eq!(request.username.as_deref(), Some("b"));

        form.unmount();
        let outcome = form.finish_submit(
            Ok(UpdateUserResponse::default()),
            &FakeCredentials::default(),
            &session,
        );

        assert_eq!(outcome, SubmitOutcome::Saved);
        assert!(form.diff().is_empty());
        assert!(!form.gate().is_sending());
        drop(form);
        assert_eq!(drain(&mut rx), vec![HeaderEvent::Reset]);
    }

    #[test]
    fn unmount_resets_header_once_and_tolerates_no_subscribers() {
        let (mut form, mut rx) = mounted_form();
        form.unmount();
        form.unmount();
        drop(form);
        assert_eq!(drain(&mut rx), vec![HeaderEvent::Reset]);

        let orphan = AccountForm::new(None, HeaderChannel::new(1));
        drop(orphan);
    }
}
