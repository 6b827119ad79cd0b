//! Application shell controller: session, screens, and capsule/cluster
//! operations.
//!
//! The controller never patches server records by hand (cluster association
//! after cluster creation is the single exception). Every successful write is
//! followed by a re-fetch of whatever the write invalidated.

use shared::{
    domain::{AuthMode, CapsuleId, CapsuleStatus, JoinAction},
    protocol::{
        AccessCodeRequest, Capsule, CapsuleUpdate, ClusterDetail, ClusterSummary,
        CreateCapsuleRequest, CreateClusterKeyRequest, Credentials, JoinClusterRequest,
        JoinRequest, UserRecord,
    },
};
use tracing::{debug, info, warn};

use crate::{
    api::{http_status, CapsuleApi},
    error::ClientError,
    locale,
    view::{
        AccessCodePrompt, AppView, AuthFormView, CapsuleCard, CapsuleDetailView, ClusterCard,
        ClusterPanel, JoinRequestRow, Modal, Notice, Screen, UserSection,
    },
};

#[derive(Debug, Clone)]
pub struct NewCapsuleForm {
    pub name: String,
    pub access_code: String,
    pub confirm_code: String,
}

/// Raw parameter inputs; blank fields are left out of the update.
#[derive(Debug, Clone, Default)]
pub struct CapsuleParamsForm {
    pub status: Option<String>,
    pub temperature: Option<String>,
    pub oxygen_level: Option<String>,
}

impl CapsuleParamsForm {
    /// Builds the partial update without an access code yet.
    pub fn to_update(&self) -> Result<CapsuleUpdate, ClientError> {
        let mut update = CapsuleUpdate::default();
        if let Some(raw) = filled(&self.status) {
            let status = CapsuleStatus::parse(raw)
                .ok_or_else(|| ClientError::Validation(locale::invalid_status(raw)))?;
            update.status = Some(status);
        }
        update.temperature = parse_number(&self.temperature, "Температура")?;
        update.oxygen_level = parse_number(&self.oxygen_level, "Кислород")?;
        Ok(update)
    }
}

fn filled(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn parse_number(field: &Option<String>, label: &str) -> Result<Option<f64>, ClientError> {
    let Some(raw) = filled(field) else {
        return Ok(None);
    };
    match raw.replace(',', ".").parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(Some(value)),
        _ => Err(ClientError::Validation(locale::invalid_number(label, raw))),
    }
}

#[derive(Debug, Clone)]
pub struct ClusterForm {
    pub name: String,
    pub key: String,
}

/// Everything a front end can ask the shell to do.
#[derive(Debug, Clone)]
pub enum AppAction {
    ShowAuth(AuthMode),
    ToggleAuthMode,
    SubmitAuth(Credentials),
    ShowCapsuleList,
    OpenCapsule(CapsuleId),
    OpenCreateCapsule,
    CloseCreateCapsule,
    CreateCapsule(NewCapsuleForm),
    CloseDestroyedNotice,
    UpdateParams(CapsuleParamsForm),
    CreateCluster(ClusterForm),
    JoinCluster { cluster_name: String },
    ResolveJoinRequest {
        receiver_capsule: String,
        sender_capsule: String,
        action: JoinAction,
    },
    Logout,
}

impl AppAction {
    pub fn name(&self) -> &'static str {
        match self {
            Self::ShowAuth(_) => "show_auth",
            Self::ToggleAuthMode => "toggle_auth_mode",
            Self::SubmitAuth(_) => "submit_auth",
            Self::ShowCapsuleList => "show_capsule_list",
            Self::OpenCapsule(_) => "open_capsule",
            Self::OpenCreateCapsule => "open_create_capsule",
            Self::CloseCreateCapsule => "close_create_capsule",
            Self::CreateCapsule(_) => "create_capsule",
            Self::CloseDestroyedNotice => "close_destroyed_notice",
            Self::UpdateParams(_) => "update_params",
            Self::CreateCluster(_) => "create_cluster",
            Self::JoinCluster { .. } => "join_cluster",
            Self::ResolveJoinRequest { .. } => "resolve_join_request",
            Self::Logout => "logout",
        }
    }

    /// Actions that act on the open capsule and are cancelled without one.
    pub fn requires_capsule(&self) -> bool {
        matches!(
            self,
            Self::UpdateParams(_) | Self::CreateCluster(_) | Self::JoinCluster { .. }
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    Completed,
    /// Declined access-code prompt, or nothing to act on. No request was sent.
    Cancelled,
    /// The error was already shown to the user.
    Rejected(String),
}

pub struct AppController<V: AppView, P: AccessCodePrompt> {
    api: CapsuleApi,
    view: V,
    prompt: P,
    screen: Screen,
    auth_mode: AuthMode,
    user: Option<UserRecord>,
    capsules: Vec<Capsule>,
    clusters: Vec<ClusterSummary>,
    current_capsule: Option<Capsule>,
    cluster: Option<ClusterDetail>,
    join_requests: Vec<JoinRequest>,
}

impl<V: AppView, P: AccessCodePrompt> AppController<V, P> {
    pub fn new(api: CapsuleApi, view: V, prompt: P) -> Self {
        Self {
            api,
            view,
            prompt,
            screen: Screen::Auth,
            auth_mode: AuthMode::Login,
            user: None,
            capsules: Vec::new(),
            clusters: Vec::new(),
            current_capsule: None,
            cluster: None,
            join_requests: Vec::new(),
        }
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn auth_mode(&self) -> AuthMode {
        self.auth_mode
    }

    pub fn user(&self) -> Option<&UserRecord> {
        self.user.as_ref()
    }

    pub fn capsules(&self) -> &[Capsule] {
        &self.capsules
    }

    pub fn clusters(&self) -> &[ClusterSummary] {
        &self.clusters
    }

    pub fn current_capsule(&self) -> Option<&Capsule> {
        self.current_capsule.as_ref()
    }

    pub fn cluster(&self) -> Option<&ClusterDetail> {
        self.cluster.as_ref()
    }

    pub fn join_requests(&self) -> &[JoinRequest] {
        &self.join_requests
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }

    /// Restores a stored session. Returns whether the user is signed in.
    pub async fn start(&mut self) -> bool {
        if self.api.tokens().get().is_none() {
            self.show_auth(AuthMode::Login);
            return false;
        }

        match self.api.current_user().await {
            Ok(user) => {
                info!(user_id = user.id.0, "app: session restored");
                self.user = Some(user);
                self.show_capsule_list().await;
                true
            }
            Err(err) => {
                warn!(status = ?http_status(&err), "app: stored session rejected: {err}");
                if let Err(err) = self.api.tokens().clear() {
                    warn!("app: failed to clear stored token: {err}");
                }
                self.user = None;
                self.show_auth(AuthMode::Login);
                false
            }
        }
    }

    pub async fn dispatch(&mut self, action: AppAction) -> ActionOutcome {
        debug!(action = action.name(), "app: dispatch");
        match action {
            AppAction::ShowAuth(mode) => {
                self.show_auth(mode);
                ActionOutcome::Completed
            }
            AppAction::ToggleAuthMode => {
                self.set_auth_mode(self.auth_mode.toggled());
                ActionOutcome::Completed
            }
            AppAction::SubmitAuth(credentials) => self.submit_auth(credentials).await,
            AppAction::ShowCapsuleList => {
                self.show_capsule_list().await;
                ActionOutcome::Completed
            }
            AppAction::OpenCapsule(capsule_id) => self.open_capsule(capsule_id).await,
            AppAction::OpenCreateCapsule => {
                self.view.open_modal(Modal::CreateCapsule);
                ActionOutcome::Completed
            }
            AppAction::CloseCreateCapsule => {
                self.view.close_modal(Modal::CreateCapsule);
                ActionOutcome::Completed
            }
            AppAction::CreateCapsule(form) => self.create_capsule(form).await,
            AppAction::CloseDestroyedNotice => {
                self.view.close_modal(Modal::DestroyedCapsule);
                ActionOutcome::Completed
            }
            AppAction::UpdateParams(form) => self.update_params(form).await,
            AppAction::CreateCluster(form) => self.create_cluster(form).await,
            AppAction::JoinCluster { cluster_name } => self.join_cluster(cluster_name).await,
            AppAction::ResolveJoinRequest {
                receiver_capsule,
                sender_capsule,
                action,
            } => {
                self.resolve_join_request(&receiver_capsule, &sender_capsule, action)
                    .await
            }
            AppAction::Logout => {
                self.logout();
                ActionOutcome::Completed
            }
        }
    }

    pub fn show_auth(&mut self, mode: AuthMode) {
        self.screen = Screen::Auth;
        self.view.show_screen(Screen::Auth);
        self.set_auth_mode(mode);
        self.view
            .render_user_section(&UserSection::for_user(self.user.as_ref()));
    }

    fn set_auth_mode(&mut self, mode: AuthMode) {
        self.auth_mode = mode;
        self.view.render_auth_form(&AuthFormView::for_mode(mode));
    }

    pub async fn submit_auth(&mut self, credentials: Credentials) -> ActionOutcome {
        let mode = self.auth_mode;
        let token = match self.api.authenticate(mode, &credentials).await {
            Ok(token) => token,
            Err(err) => return self.reject(&err, locale::AUTH_FAILED),
        };
        if let Err(err) = self.api.tokens().set(&token.access_token) {
            warn!("app: failed to persist token: {err}");
            return self.reject_with(locale::AUTH_FAILED.to_string());
        }
        self.user = Some(token.user);
        self.show_capsule_list().await;
        ActionOutcome::Completed
    }

    pub async fn show_capsule_list(&mut self) {
        if self.screen == Screen::CapsuleDetail {
            self.view.set_night_mode(false);
        }
        self.current_capsule = None;
        self.cluster = None;
        self.join_requests.clear();

        self.screen = Screen::CapsuleList;
        self.view.show_screen(Screen::CapsuleList);
        self.view
            .render_user_section(&UserSection::for_user(self.user.as_ref()));
        self.load_capsules().await;
        self.load_clusters().await;
    }

    /// Failures are logged only; the previous list stays on screen.
    pub async fn load_capsules(&mut self) {
        match self.api.list_capsules().await {
            Ok(capsules) => {
                self.capsules = capsules;
                let cards: Vec<CapsuleCard> = self.capsules.iter().map(CapsuleCard::from).collect();
                self.view.render_capsules(&cards);
            }
            Err(err) => warn!("app: failed to load capsules: {err}"),
        }
    }

    pub async fn load_clusters(&mut self) {
        match self.api.list_clusters().await {
            Ok(clusters) => {
                self.clusters = clusters;
                let cards: Vec<ClusterCard> = self.clusters.iter().map(ClusterCard::from).collect();
                self.view.render_clusters(&cards);
            }
            Err(err) => warn!("app: failed to load clusters: {err}"),
        }
    }

    pub async fn open_capsule(&mut self, capsule_id: CapsuleId) -> ActionOutcome {
        let Some(capsule) = self.capsules.iter().find(|c| c.id == capsule_id).cloned() else {
            warn!(capsule_id = capsule_id.0, "app: capsule not in cached list");
            return self.reject_with(locale::CAPSULE_NOT_FOUND.to_string());
        };

        if capsule.status.is_destroyed() {
            info!(capsule_id = capsule_id.0, "app: capsule destroyed, showing notice");
            self.view.open_modal(Modal::DestroyedCapsule);
            return ActionOutcome::Completed;
        }

        self.current_capsule = Some(capsule);
        self.screen = Screen::CapsuleDetail;
        self.view.show_screen(Screen::CapsuleDetail);
        self.render_detail();
        self.load_cluster_detail().await;
        self.load_join_requests().await;
        ActionOutcome::Completed
    }

    fn render_detail(&mut self) {
        let Some(capsule) = &self.current_capsule else {
            return;
        };
        let detail = CapsuleDetailView::from(capsule);
        self.view.render_capsule_detail(&detail);
        self.view.set_night_mode(detail.night_mode);
    }

    pub async fn create_capsule(&mut self, form: NewCapsuleForm) -> ActionOutcome {
        if form.access_code != form.confirm_code {
            return self.reject(
                &ClientError::Validation(locale::CODES_MISMATCH.to_string()),
                locale::CREATE_CAPSULE_FAILED,
            );
        }

        let request = CreateCapsuleRequest {
            name: form.name,
            access_code: form.access_code,
        };
        match self.api.create_capsule(&request).await {
            Ok(capsule) => {
                info!(capsule_id = capsule.id.0, "app: capsule created");
                self.notify_success(locale::CAPSULE_CREATED.to_string());
                self.view.close_modal(Modal::CreateCapsule);
                self.load_capsules().await;
                ActionOutcome::Completed
            }
            Err(err) => self.reject(&err, locale::CREATE_CAPSULE_FAILED),
        }
    }

    pub async fn update_params(&mut self, form: CapsuleParamsForm) -> ActionOutcome {
        let Some(capsule_id) = self.current_capsule_id() else {
            return ActionOutcome::Cancelled;
        };
        let mut update = match form.to_update() {
            Ok(update) => update,
            Err(err) => return self.reject(&err, locale::UPDATE_FAILED),
        };
        let Some(access_code) = self.access_code().await else {
            return ActionOutcome::Cancelled;
        };
        update.access_code = access_code;

        match self.api.update_capsule(capsule_id, &update).await {
            Ok(updated) => {
                info!(capsule_id = capsule_id.0, status = updated.status.as_str(), "app: capsule updated");
                self.notify_success(locale::PARAMS_UPDATED.to_string());
                self.load_capsules().await;
                self.current_capsule = Some(updated);
                self.render_detail();
                ActionOutcome::Completed
            }
            Err(err) => self.reject(&err, locale::UPDATE_FAILED),
        }
    }

    pub async fn create_cluster(&mut self, form: ClusterForm) -> ActionOutcome {
        let Some(capsule_id) = self.current_capsule_id() else {
            return ActionOutcome::Cancelled;
        };
        let Some(access_code) = self.access_code().await else {
            return ActionOutcome::Cancelled;
        };

        let request = CreateClusterKeyRequest {
            access_code,
            cluster_name: form.name,
            cluster_key: form.key,
        };
        match self.api.create_cluster_key(capsule_id, &request).await {
            Ok(created) => {
                info!(capsule_id = capsule_id.0, cluster = %created.cluster_name, "app: cluster created");
                self.notify_success(locale::cluster_created(&created.cluster_name));
                self.load_capsules().await;
                self.load_cluster_detail().await;
                if let Some(current) = self.current_capsule.as_mut() {
                    current.cluster_name = Some(created.cluster_name);
                    current.cluster_key = Some(created.cluster_key);
                }
                self.render_detail();
                ActionOutcome::Completed
            }
            Err(err) => self.reject(&err, locale::CREATE_CLUSTER_FAILED),
        }
    }

    pub async fn join_cluster(&mut self, cluster_name: String) -> ActionOutcome {
        let Some(capsule_id) = self.current_capsule_id() else {
            return ActionOutcome::Cancelled;
        };
        let Some(access_code) = self.access_code().await else {
            return ActionOutcome::Cancelled;
        };

        let request = JoinClusterRequest {
            cluster_name,
            access_code,
        };
        match self.api.join_cluster(capsule_id, &request).await {
            Ok(_) => {
                info!(capsule_id = capsule_id.0, cluster = %request.cluster_name, "app: join request sent");
                self.notify_success(locale::JOIN_SENT.to_string());
                ActionOutcome::Completed
            }
            Err(err) => self.reject(&err, locale::JOIN_FAILED),
        }
    }

    /// Absent, `null`, rejected, or unreachable all render as "no cluster".
    pub async fn load_cluster_detail(&mut self) {
        let Some(capsule_id) = self.current_capsule_id() else {
            return;
        };
        self.cluster = match self.api.capsule_cluster(capsule_id).await {
            Ok(cluster) => cluster,
            Err(err) => {
                warn!(capsule_id = capsule_id.0, "app: failed to load cluster: {err}");
                None
            }
        };
        let panel = ClusterPanel::from_detail(self.cluster.as_ref());
        self.view.render_cluster_panel(&panel);
    }

    pub async fn load_join_requests(&mut self) {
        let Some(capsule_id) = self.current_capsule_id() else {
            return;
        };
        match self.api.cluster_requests(capsule_id).await {
            Ok(requests) => {
                self.join_requests = requests;
                let rows: Vec<JoinRequestRow> =
                    self.join_requests.iter().map(JoinRequestRow::from).collect();
                self.view.render_join_requests(&rows);
            }
            Err(err) => warn!(capsule_id = capsule_id.0, "app: failed to load join requests: {err}"),
        }
    }

    pub async fn resolve_join_request(
        &mut self,
        receiver_capsule: &str,
        sender_capsule: &str,
        action: JoinAction,
    ) -> ActionOutcome {
        let Some(access_code) = self.access_code().await else {
            return ActionOutcome::Cancelled;
        };

        let request = AccessCodeRequest { access_code };
        match self
            .api
            .resolve_cluster_request(receiver_capsule, action, sender_capsule, &request)
            .await
        {
            Ok(_) => {
                info!(
                    receiver = receiver_capsule,
                    sender = sender_capsule,
                    action = action.path_segment(),
                    "app: join request resolved"
                );
                let message = match action {
                    JoinAction::Approve => locale::REQUEST_APPROVED,
                    JoinAction::Reject => locale::REQUEST_REJECTED,
                };
                self.notify_success(message.to_string());
                self.load_cluster_detail().await;
                self.load_join_requests().await;
                ActionOutcome::Completed
            }
            Err(err) => self.reject(&err, locale::RESOLVE_FAILED),
        }
    }

    pub fn logout(&mut self) {
        if let Err(err) = self.api.tokens().clear() {
            warn!("app: failed to clear stored token: {err}");
        }
        if let Some(user) = &self.user {
            info!(user_id = user.id.0, "app: logged out");
        }
        self.user = None;
        self.current_capsule = None;
        self.capsules.clear();
        self.clusters.clear();
        self.cluster = None;
        self.join_requests.clear();
        self.show_auth(AuthMode::Login);
        self.view.set_night_mode(false);
    }

    fn current_capsule_id(&self) -> Option<CapsuleId> {
        let id = self.current_capsule.as_ref().map(|c| c.id);
        if id.is_none() {
            debug!("app: no capsule selected");
        }
        id
    }

    async fn access_code(&self) -> Option<String> {
        let code = self.prompt.request_access_code().await?;
        if code.trim().is_empty() {
            debug!("app: access code prompt left blank");
            return None;
        }
        Some(code)
    }

    fn notify_success(&mut self, message: String) {
        self.view.notify(Notice::Success(message));
    }

    fn reject(&mut self, err: &ClientError, fallback: &str) -> ActionOutcome {
        warn!(status = ?http_status(err), "app: action failed: {err}");
        self.reject_with(err.user_message(fallback))
    }

    fn reject_with(&mut self, message: String) -> ActionOutcome {
        self.view.notify(Notice::Error(message.clone()));
        ActionOutcome::Rejected(message)
    }
}

#[cfg(test)]
#[path = "tests/app_tests.rs"]
mod tests;
