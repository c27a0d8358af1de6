//! In-memory stand-ins for the account API, the realtime socket and the file picker.

use std::{
    cell::{Cell, RefCell},
    sync::Arc,
};

use settings_core::{
    AccountService, AccountUser, FileEncoder, RemoteError, SessionLink, UpdateUserRequest,
    UpdateUserResponse, UserDetails, UserProfile,
};
use tracing::{debug, info};

/// Account API backed by process memory.
///
/// Every accepted update publishes a fresh account snapshot, the way a
/// server push would.
pub struct InMemoryAccountService {
    account: RefCell<Arc<AccountUser>>,
    profile: RefCell<Option<UserProfile>>,
    password: RefCell<String>,
    token_counter: Cell<u32>,
}

impl InMemoryAccountService {
    pub fn new(username: &str, password: &str) -> Self {
        Self {
            account: RefCell::new(Arc::new(AccountUser {
                id: "1000".to_owned(),
                email: Some(format!("{username}@example.org")),
                username: Some(username.to_owned()),
                tag: Some("0001".to_owned()),
                avatar: None,
                banner: None,
            })),
            profile: RefCell::new(None),
            password: RefCell::new(password.to_owned()),
            token_counter: Cell::new(0),
        }
    }

    /// Latest account snapshot.
    pub fn account(&self) -> Arc<AccountUser> {
        Arc::clone(&self.account.borrow())
    }

    fn requires_password(request: &UpdateUserRequest) -> bool {
        request.email.is_some() || request.username.is_some() || request.new_password.is_some()
    }
}

impl AccountService for InMemoryAccountService {
    async fn update_user(
        &self,
        request: &UpdateUserRequest,
    ) -> Result<UpdateUserResponse, RemoteError> {
        if Self::requires_password(request)
            && request.password.as_deref() != Some(self.password.borrow().as_str())
        {
            return Err(RemoteError::new("Invalid password.").with_status(403));
        }

        let mut next = AccountUser::clone(&self.account.borrow());
        if let Some(email) = &request.email {
            next.email = Some(email.clone());
        }
        if let Some(username) = &request.username {
            next.username = Some(username.clone());
        }
        if let Some(tag) = &request.tag {
            next.tag = Some(tag.clone());
        }
        if request.avatar.is_some() {
            next.avatar = Some(format!("avatars/{}.webp", next.id));
        }
        if request.banner.is_some() {
            next.banner = Some(format!("banners/{}.webp", next.id));
        }
        if let Some(bio) = &request.bio {
            *self.profile.borrow_mut() = Some(UserProfile { bio: bio.clone() });
        }
        *self.account.borrow_mut() = Arc::new(next);

        let new_token = request.new_password.as_ref().map(|new_password| {
            *self.password.borrow_mut() = new_password.clone();
            let counter = self.token_counter.get() + 1;
            self.token_counter.set(counter);
            format!("smoke-token-{counter}")
        });
        debug!(rotated = new_token.is_some(), "in-memory account updated");
        Ok(UpdateUserResponse { new_token })
    }

    async fn fetch_user_details(&self, user_id: &str) -> Result<UserDetails, RemoteError> {
        let account = self.account();
        if account.id != user_id {
            return Err(RemoteError::new("User not found").with_status(404));
        }
        Ok(UserDetails {
            user: AccountUser::clone(&account),
            profile: self.profile.borrow().clone(),
        })
    }
}

/// Realtime connection stand-in.
pub struct DemoSession {
    socket_id: String,
    token: RefCell<Option<String>>,
}

impl DemoSession {
    pub fn new(socket_id: impl Into<String>) -> Self {
        Self {
            socket_id: socket_id.into(),
            token: RefCell::new(None),
        }
    }

    pub fn token(&self) -> Option<String> {
        self.token.borrow().clone()
    }
}

impl SessionLink for DemoSession {
    fn socket_id(&self) -> Option<String> {
        Some(self.socket_id.clone())
    }

    fn update_token(&self, token: &str) {
        info!("socket switched to rotated token");
        *self.token.borrow_mut() = Some(token.to_owned());
    }
}

/// File picker that always "selects" one tiny PNG.
pub struct DemoPicker;

impl FileEncoder for DemoPicker {
    fn pick(&self) -> Vec<String> {
        vec!["data:image/png;base64,iVBORw0KGgo=".to_owned()]
    }
}
