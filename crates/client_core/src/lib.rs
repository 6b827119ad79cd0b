//! Client-side core for the capsule console: HTTP API client, token storage,
//! and the controllers that drive the application shell and the assistant chat.

pub mod api;
pub mod app;
pub mod chat;
pub mod error;
pub mod locale;
pub mod token_store;
pub mod view;

#[cfg(test)]
pub(crate) mod test_support;

pub use api::CapsuleApi;
pub use app::{
    ActionOutcome, AppAction, AppController, CapsuleParamsForm, ClusterForm, NewCapsuleForm,
};
pub use chat::{ChatController, ChatOutcome, TranscriptEntry};
pub use error::ClientError;
pub use token_store::{FileTokenStore, MemoryTokenStore, TokenStore, TokenStoreError};
pub use view::{
    AccessCodePrompt, AppView, AuthFormView, CapsuleCard, CapsuleDetailView, ChatView,
    ClusterCard, ClusterMemberRow, ClusterPanel, JoinRequestRow, Modal, Notice, Screen,
    UserSection,
};
