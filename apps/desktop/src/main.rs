use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::Parser;
use client_core::{
    ActionOutcome, AppAction, AppController, CapsuleApi, ChatController, ClusterForm,
    FileTokenStore, Modal, NewCapsuleForm, TokenStore,
};
use shared::{
    domain::{AuthMode, JoinAction},
    protocol::Credentials,
};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::Mutex,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod console;

use commands::{ShellCommand, HELP};
use config::load_settings;
use console::{flush_stdout, ConsolePrompt, ConsoleView, SharedInput};

const OPEN_CAPSULE_HINT: &str = "Сначала откройте капсулу: open <id>";

type App = AppController<ConsoleView, ConsolePrompt>;
type Chat = ChatController<ConsoleView>;

#[derive(Parser, Debug)]
#[command(name = "capsule-console", about = "Sleep capsule management console")]
struct Args {
    #[arg(long)]
    server_url: Option<String>,
    #[arg(long)]
    data_dir: Option<PathBuf>,
    #[arg(long)]
    log_filter: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let mut settings = load_settings();
    settings.apply_overrides(args.server_url, args.data_dir, args.log_filter);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.log_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    info!(
        server_url = %settings.server_url,
        data_dir = %settings.data_dir.display(),
        "console: starting"
    );

    let tokens: Arc<dyn TokenStore> = Arc::new(FileTokenStore::new(settings.token_store_path()));
    let api = CapsuleApi::new(&settings.server_url, tokens)
        .with_context(|| format!("invalid server url '{}'", settings.server_url))?;

    let input: SharedInput = Arc::new(Mutex::new(BufReader::new(tokio::io::stdin()).lines()));
    let mut app = AppController::new(
        api.clone(),
        ConsoleView::default(),
        ConsolePrompt::new(input.clone()),
    );
    let mut chat = ChatController::new(api, ConsoleView::default());

    app.start().await;
    println!("help - список команд");

    loop {
        print!("> ");
        flush_stdout();
        let line = input
            .lock()
            .await
            .next_line()
            .await
            .context("failed to read stdin")?;
        let Some(line) = line else {
            break;
        };

        match commands::parse(&line) {
            Ok(None) => {}
            Ok(Some(ShellCommand::Quit)) => break,
            Ok(Some(command)) => run(command, &mut app, &mut chat).await,
            Err(err) => println!("{err}"),
        }
    }

    info!("console: exiting");
    Ok(())
}

async fn run(command: ShellCommand, app: &mut App, chat: &mut Chat) {
    let action = match command {
        ShellCommand::Login { username, password } => {
            return authenticate(app, AuthMode::Login, username, password).await;
        }
        ShellCommand::Register { username, password } => {
            return authenticate(app, AuthMode::Register, username, password).await;
        }
        ShellCommand::ToggleAuthMode => AppAction::ToggleAuthMode,
        ShellCommand::List | ShellCommand::Back => AppAction::ShowCapsuleList,
        ShellCommand::Open(id) => AppAction::OpenCapsule(id),
        ShellCommand::NewCapsule {
            name,
            access_code,
            confirm_code,
        } => {
            app.dispatch(AppAction::OpenCreateCapsule).await;
            AppAction::CreateCapsule(NewCapsuleForm {
                name,
                access_code,
                confirm_code,
            })
        }
        ShellCommand::Close => match app.view().active_modal() {
            Some(Modal::CreateCapsule) => AppAction::CloseCreateCapsule,
            Some(Modal::DestroyedCapsule) => AppAction::CloseDestroyedNotice,
            None => return,
        },
        ShellCommand::SetParams(form) => AppAction::UpdateParams(form),
        ShellCommand::CreateCluster { name, key } => {
            AppAction::CreateCluster(ClusterForm { name, key })
        }
        ShellCommand::JoinCluster { name } => AppAction::JoinCluster { cluster_name: name },
        ShellCommand::Approve(n) => match resolve_action(app, n, JoinAction::Approve) {
            Some(action) => action,
            None => return,
        },
        ShellCommand::Reject(n) => match resolve_action(app, n, JoinAction::Reject) {
            Some(action) => action,
            None => return,
        },
        ShellCommand::Chat(text) => {
            chat.submit(&text).await;
            return;
        }
        ShellCommand::ToggleChat => {
            chat.toggle_minimized();
            return;
        }
        ShellCommand::Logout => AppAction::Logout,
        ShellCommand::Help => {
            println!("{HELP}");
            return;
        }
        ShellCommand::Quit => return,
    };
    let requires_capsule = action.requires_capsule();
    let outcome = app.dispatch(action).await;
    let capsule_open = app.current_capsule().is_some();
    if let Some(hint) = capsule_hint(requires_capsule, &outcome, capsule_open) {
        println!("{hint}");
    }
}

fn capsule_hint(
    requires_capsule: bool,
    outcome: &ActionOutcome,
    capsule_open: bool,
) -> Option<&'static str> {
    (requires_capsule && *outcome == ActionOutcome::Cancelled && !capsule_open)
        .then_some(OPEN_CAPSULE_HINT)
}

async fn authenticate(app: &mut App, mode: AuthMode, username: String, password: String) {
    if app.auth_mode() != mode {
        app.dispatch(AppAction::ShowAuth(mode)).await;
    }
    app.dispatch(AppAction::SubmitAuth(Credentials { username, password }))
        .await;
}

/// Maps a 1-based row number from the rendered request list.
fn resolve_action(app: &App, n: usize, action: JoinAction) -> Option<AppAction> {
    let Some(request) = app.join_requests().get(n - 1) else {
        warn!(row = n, "console: no such join request");
        println!("Нет запроса с номером {n}");
        return None;
    };
    Some(AppAction::ResolveJoinRequest {
        receiver_capsule: request.receiver_capsule_name.clone(),
        sender_capsule: request.sender_capsule_name.clone(),
        action,
    })
}
