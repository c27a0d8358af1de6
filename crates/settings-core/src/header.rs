use serde::{Deserialize, Serialize};

/// Partial header override.
///
/// The settings forms only preview images; `username` and `tag` overrides
/// come from header consumers that build the patch directly. Each field is
/// `None` when untouched, `Some(None)` to clear the override
/// and `Some(Some(value))` to show `value`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct HeaderPatch {
    pub username: Option<Option<String>>,
    pub tag: Option<Option<String>>,
    pub avatar: Option<Option<String>>,
    pub banner: Option<Option<String>>,
}

impl HeaderPatch {
    pub fn avatar(mut self, value: Option<String>) -> Self {
        self.avatar = Some(value);
        self
    }

    pub fn banner(mut self, value: Option<String>) -> Self {
        self.banner = Some(value);
        self
    }
}

/// Event emitted to header subscribers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum HeaderEvent {
    /// Merge the patch into the current preview.
    Patched(HeaderPatch),
    /// Drop every override; the header shows canonical account data again.
    Reset,
}

/// Optimistic, non-authoritative header overrides.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct HeaderPreview {
    pub username: Option<String>,
    pub tag: Option<String>,
    pub avatar: Option<String>,
    pub banner: Option<String>,
}

impl HeaderPreview {
    pub fn apply(&mut self, event: &HeaderEvent) {
        match event {
            HeaderEvent::Patched(patch) => self.merge(patch),
            HeaderEvent::Reset => *self = Self::default(),
        }
    }

    pub fn merge(&mut self, patch: &HeaderPatch) {
        merge_field(&mut self.username, &patch.username);
        merge_field(&mut self.tag, &patch.tag);
        merge_field(&mut self.avatar, &patch.avatar);
        merge_field(&mut self.banner, &patch.banner);
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

fn merge_field(target: &mut Option<String>, update: &Option<Option<String>>) {
    if let Some(value) = update {
        target.clone_from(value);
    }
}
