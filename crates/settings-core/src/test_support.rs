//! Hand-written collaborator fakes shared by the form tests.

use std::{
    cell::RefCell,
    collections::{HashMap, VecDeque},
    sync::Arc,
};

use crate::{
    error::{RemoteError, SettingsError},
    ports::{AccountService, CredentialStore, SessionLink},
    types::{AccountUser, UpdateUserRequest, UpdateUserResponse, UserDetails, UserProfile},
};

pub(crate) fn account(id: &str, username: &str, tag: &str) -> Arc<AccountUser> {
    Arc::new(AccountUser {
        id: id.to_owned(),
        email: Some(format!("{username}@example.org")),
        username: Some(username.to_owned()),
        tag: Some(tag.to_owned()),
        avatar: None,
        banner: None,
    })
}

pub(crate) fn details(user: &AccountUser, bio: Option<&str>) -> UserDetails {
    UserDetails {
        user: user.clone(),
        profile: Some(UserProfile {
            bio: bio.map(str::to_owned),
        }),
    }
}

#[derive(Default)]
pub(crate) struct FakeService {
    pub updates: RefCell<Vec<UpdateUserRequest>>,
    pub update_results: RefCell<VecDeque<Result<UpdateUserResponse, RemoteError>>>,
    pub fetches: RefCell<Vec<String>>,
    pub details: RefCell<HashMap<String, UserDetails>>,
}

impl FakeService {
    pub fn respond_with(&self, result: Result<UpdateUserResponse, RemoteError>) {
        self.update_results.borrow_mut().push_back(result);
    }

    pub fn with_details(self, details: UserDetails) -> Self {
        self.details
            .borrow_mut()
            .insert(details.user.id.clone(), details);
        self
    }
}

impl AccountService for FakeService {
    async fn update_user(
        &self,
        request: &UpdateUserRequest,
    ) -> Result<UpdateUserResponse, RemoteError> {
        self.updates.borrow_mut().push(request.clone());
        self.update_results
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Ok(UpdateUserResponse::default()))
    }

    async fn fetch_user_details(&self, user_id: &str) -> Result<UserDetails, RemoteError> {
        self.fetches.borrow_mut().push(user_id.to_owned());
        self.details
            .borrow()
            .get(user_id)
            .cloned()
            .ok_or_else(|| RemoteError::new("User not found").with_status(404))
    }
}

#[derive(Default)]
pub(crate) struct FakeSession {
    pub socket_id: Option<String>,
    pub tokens: RefCell<Vec<String>>,
}

impl FakeSession {
    pub fn connected(socket_id: &str) -> Self {
        Self {
            socket_id: Some(socket_id.to_owned()),
            tokens: RefCell::default(),
        }
    }
}

impl SessionLink for FakeSession {
    fn socket_id(&self) -> Option<String> {
        self.socket_id.clone()
    }

    fn update_token(&self, token: &str) {
        self.tokens.borrow_mut().push(token.to_owned());
    }
}

#[derive(Default)]
pub(crate) struct FakeCredentials {
    pub tokens: RefCell<Vec<String>>,
    pub fail: bool,
}

impl CredentialStore for FakeCredentials {
    fn persist_token(&self, token: &str) -> Result<(), SettingsError> {
        if self.fail {
            return Err(SettingsError::storage("disk full"));
        }
        self.tokens.borrow_mut().push(token.to_owned());
        Ok(())
    }
}
