//! Line-oriented rendering of the controllers' view models.

use std::{io::Write, sync::Arc};

use async_trait::async_trait;
use client_core::{
    locale, AccessCodePrompt, AppView, AuthFormView, CapsuleCard, CapsuleDetailView, ChatView,
    ClusterCard, ClusterPanel, JoinRequestRow, Modal, Notice, Screen, UserSection,
};
use shared::domain::TranscriptRole;
use tokio::{
    io::{BufReader, Lines, Stdin},
    sync::Mutex,
};
use tracing::warn;

/// Stdin shared between the command loop and the access-code prompt.
pub type SharedInput = Arc<Mutex<Lines<BufReader<Stdin>>>>;

pub fn flush_stdout() {
    if let Err(err) = std::io::stdout().flush() {
        warn!("console: failed to flush stdout: {err}");
    }
}

#[derive(Debug, Default)]
pub struct ConsoleView {
    active_modal: Option<Modal>,
}

impl ConsoleView {
    pub fn active_modal(&self) -> Option<Modal> {
        self.active_modal
    }
}

impl AppView for ConsoleView {
    fn show_screen(&mut self, screen: Screen) {
        let title = match screen {
            Screen::Auth => "Авторизация",
            Screen::CapsuleList => "Мои капсулы",
            Screen::CapsuleDetail => "Капсула",
        };
        println!("\n=== {title} ===");
    }

    fn render_user_section(&mut self, section: &UserSection) {
        if let UserSection::SignedIn { greeting } = section {
            println!("{greeting}");
        }
    }

    fn render_auth_form(&mut self, form: &AuthFormView) {
        println!("{} ({})", form.title, form.switch_hint);
    }

    fn render_capsules(&mut self, cards: &[CapsuleCard]) {
        if cards.is_empty() {
            println!("{}", locale::NO_CAPSULES);
            return;
        }
        for card in cards {
            let destroyed = if card.status.is_destroyed() {
                " [уничтожена]"
            } else {
                ""
            };
            println!(
                "  [{}] {}  {}  O2 {}  {}{destroyed}",
                card.id, card.name, card.temperature, card.oxygen, card.status_label
            );
        }
    }

    fn render_clusters(&mut self, clusters: &[ClusterCard]) {
        if clusters.is_empty() {
            return;
        }
        let names: Vec<&str> = clusters.iter().map(|c| c.name.as_str()).collect();
        println!("Кластеры: {}", names.join(", "));
    }

    fn render_capsule_detail(&mut self, detail: &CapsuleDetailView) {
        println!(
            "{} (#{}): температура {}, кислород {}, режим {}",
            detail.title, detail.id, detail.temperature, detail.oxygen, detail.status_label
        );
    }

    fn set_night_mode(&mut self, enabled: bool) {
        if enabled {
            println!("* ночной режим");
        }
    }

    fn render_cluster_panel(&mut self, panel: &ClusterPanel) {
        match panel {
            ClusterPanel::NoCluster => {
                println!("Капсула не в кластере: cluster-create <имя> <ключ> или cluster-join <имя>");
            }
            ClusterPanel::Membership {
                name,
                key,
                members_count,
                members,
            } => {
                println!("Кластер {name} (ключ {key}), участников: {members_count}");
                for member in members {
                    println!(
                        "  - {}  {}  O2 {}  {}",
                        member.name, member.temperature, member.oxygen, member.status_label
                    );
                }
            }
        }
    }

    fn render_join_requests(&mut self, rows: &[JoinRequestRow]) {
        if rows.is_empty() {
            println!("{}", locale::NO_ACTIVE_REQUESTS);
            return;
        }
        println!("Запросы на вступление:");
        for (n, row) in rows.iter().enumerate() {
            println!(
                "  {}. {} -> {} (кластер {})",
                n + 1,
                row.sender_capsule,
                row.receiver_capsule,
                row.cluster_name
            );
        }
    }

    fn open_modal(&mut self, modal: Modal) {
        self.active_modal = Some(modal);
        match modal {
            Modal::CreateCapsule => println!("Новая капсула"),
            Modal::DestroyedCapsule => {
                println!("Капсула уничтожена и недоступна для управления. (close - закрыть)");
            }
        }
    }

    fn close_modal(&mut self, modal: Modal) {
        if self.active_modal == Some(modal) {
            self.active_modal = None;
        }
    }

    fn notify(&mut self, notice: Notice) {
        match notice {
            Notice::Success(message) => println!("[ok] {message}"),
            Notice::Error(message) => println!("[ошибка] {message}"),
        }
    }
}

impl ChatView for ConsoleView {
    fn append_message(&mut self, role: TranscriptRole, text: &str) {
        let who = match role {
            TranscriptRole::User => "Вы",
            TranscriptRole::Assistant => "Плуто",
        };
        println!("{who}: {text}");
    }

    fn show_typing(&mut self) {
        println!("Плуто печатает...");
    }

    fn hide_typing(&mut self) {}

    fn set_minimized(&mut self, minimized: bool) {
        println!("{}", if minimized { "Чат свернут" } else { "Чат развернут" });
    }
}

pub struct ConsolePrompt {
    input: SharedInput,
}

impl ConsolePrompt {
    pub fn new(input: SharedInput) -> Self {
        Self { input }
    }
}

#[async_trait]
impl AccessCodePrompt for ConsolePrompt {
    async fn request_access_code(&self) -> Option<String> {
        print!("{} ", locale::ACCESS_CODE_PROMPT);
        flush_stdout();
        let mut lines = self.input.lock().await;
        match lines.next_line().await {
            Ok(line) => line,
            Err(err) => {
                warn!("console: failed to read access code: {err}");
                None
            }
        }
    }
}
