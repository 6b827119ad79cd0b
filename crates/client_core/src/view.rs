//! Rendering seams between the controllers and whatever front end drives them.
//!
//! Controllers only hand out data-only view models; a front end turns user
//! input back into typed actions (see [`crate::app::AppAction`]).

use async_trait::async_trait;
use shared::{
    domain::{AuthMode, CapsuleId, CapsuleStatus, TranscriptRole},
    protocol::{Capsule, ClusterDetail, ClusterMember, ClusterSummary, JoinRequest, UserRecord},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Auth,
    CapsuleList,
    CapsuleDetail,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modal {
    CreateCapsule,
    DestroyedCapsule,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Success(String),
    Error(String),
}

pub fn status_label(status: CapsuleStatus) -> &'static str {
    match status {
        CapsuleStatus::Day => "День",
        _ => "Ночь",
    }
}

fn temperature_label(value: f64) -> String {
    format!("{value}°C")
}

fn oxygen_label(value: f64) -> String {
    format!("{value}%")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthFormView {
    pub mode: AuthMode,
    pub title: &'static str,
    pub submit_label: &'static str,
    pub switch_hint: &'static str,
}

impl AuthFormView {
    pub fn for_mode(mode: AuthMode) -> Self {
        match mode {
            AuthMode::Register => Self {
                mode,
                title: "Регистрация",
                submit_label: "Зарегистрироваться",
                switch_hint: "Уже есть аккаунт? Войти",
            },
            AuthMode::Login => Self {
                mode,
                title: "Вход в систему",
                submit_label: "Войти",
                switch_hint: "Нет аккаунта? Зарегистрироваться",
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserSection {
    SignedIn { greeting: String },
    SignedOut,
}

impl UserSection {
    pub fn for_user(user: Option<&UserRecord>) -> Self {
        match user {
            Some(user) => Self::SignedIn {
                greeting: format!("Привет, {}!", user.username),
            },
            None => Self::SignedOut,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapsuleCard {
    pub id: CapsuleId,
    pub name: String,
    pub temperature: String,
    pub oxygen: String,
    pub status: CapsuleStatus,
    pub status_label: &'static str,
}

impl From<&Capsule> for CapsuleCard {
    fn from(capsule: &Capsule) -> Self {
        Self {
            id: capsule.id,
            name: capsule.name.clone(),
            temperature: temperature_label(capsule.temperature),
            oxygen: oxygen_label(capsule.oxygen_level),
            status: capsule.status,
            status_label: status_label(capsule.status),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterCard {
    pub name: String,
}

impl From<&ClusterSummary> for ClusterCard {
    fn from(cluster: &ClusterSummary) -> Self {
        Self {
            name: cluster.name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapsuleDetailView {
    pub id: CapsuleId,
    pub title: String,
    pub temperature: String,
    pub oxygen: String,
    pub status_label: &'static str,
    pub night_mode: bool,
}

impl From<&Capsule> for CapsuleDetailView {
    fn from(capsule: &Capsule) -> Self {
        Self {
            id: capsule.id,
            title: capsule.name.clone(),
            temperature: temperature_label(capsule.temperature),
            oxygen: oxygen_label(capsule.oxygen_level),
            status_label: status_label(capsule.status),
            night_mode: capsule.status == CapsuleStatus::Night,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterMemberRow {
    pub name: String,
    pub temperature: String,
    pub oxygen: String,
    pub status_label: &'static str,
}

impl From<&ClusterMember> for ClusterMemberRow {
    fn from(member: &ClusterMember) -> Self {
        Self {
            name: member.name.clone(),
            temperature: temperature_label(member.temperature),
            oxygen: oxygen_label(member.oxygen_level),
            status_label: status_label(member.status),
        }
    }
}

/// `Membership` hides the create/join forms; `NoCluster` shows them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClusterPanel {
    NoCluster,
    Membership {
        name: String,
        key: String,
        members_count: usize,
        members: Vec<ClusterMemberRow>,
    },
}

impl ClusterPanel {
    pub fn from_detail(detail: Option<&ClusterDetail>) -> Self {
        match detail {
            None => Self::NoCluster,
            Some(detail) => Self::Membership {
                name: detail.cluster_name.clone(),
                key: detail.cluster_key.clone(),
                members_count: detail.members_count,
                members: detail.members.iter().map(ClusterMemberRow::from).collect(),
            },
        }
    }
}

/// Carries the names needed to approve or reject, so the front end never has
/// to serialize the request itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinRequestRow {
    pub receiver_capsule: String,
    pub sender_capsule: String,
    pub cluster_name: String,
}

impl From<&JoinRequest> for JoinRequestRow {
    fn from(request: &JoinRequest) -> Self {
        Self {
            receiver_capsule: request.receiver_capsule_name.clone(),
            sender_capsule: request.sender_capsule_name.clone(),
            cluster_name: request.cluster_name.clone(),
        }
    }
}

pub trait AppView {
    fn show_screen(&mut self, screen: Screen);
    fn render_user_section(&mut self, section: &UserSection);
    fn render_auth_form(&mut self, form: &AuthFormView);
    /// An empty slice means the "no capsules yet" state.
    fn render_capsules(&mut self, cards: &[CapsuleCard]);
    fn render_clusters(&mut self, clusters: &[ClusterCard]);
    fn render_capsule_detail(&mut self, detail: &CapsuleDetailView);
    fn set_night_mode(&mut self, enabled: bool);
    fn render_cluster_panel(&mut self, panel: &ClusterPanel);
    /// An empty slice means "no active requests".
    fn render_join_requests(&mut self, rows: &[JoinRequestRow]);
    fn open_modal(&mut self, modal: Modal);
    fn close_modal(&mut self, modal: Modal);
    fn notify(&mut self, notice: Notice);
}

pub trait ChatView {
    fn append_message(&mut self, role: TranscriptRole, text: &str);
    fn show_typing(&mut self);
    fn hide_typing(&mut self);
    fn set_minimized(&mut self, minimized: bool);
}

/// Asks the user for a capsule access code. `None` means the user declined and
/// the pending action must be abandoned.
#[async_trait]
pub trait AccessCodePrompt: Send + Sync {
    async fn request_access_code(&self) -> Option<String>;
}
