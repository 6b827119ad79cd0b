//! Console commands parsed from one input line.

use client_core::CapsuleParamsForm;
use shared::domain::CapsuleId;
use thiserror::Error;

pub const HELP: &str = "\
Команды:
  login <логин> <пароль>            войти
  register <логин> <пароль>         зарегистрироваться
  auth-mode                         переключить вход/регистрацию
  list                              список капсул
  open <id>                         открыть капсулу
  back                              вернуться к списку
  new <имя> <код> <повтор кода>     создать капсулу
  close                             закрыть окно
  set [status=day|night] [temp=N] [oxygen=N]
  cluster-create <имя> <ключ>       создать кластер
  cluster-join <имя>                запросить вступление в кластер
  approve <n> | reject <n>          обработать запрос номер n
  chat <текст>                      написать помощнику
  chat-toggle                       свернуть/развернуть чат
  logout                            выйти
  help                              эта справка
  quit                              завершить работу";

#[derive(Debug, Clone)]
pub enum ShellCommand {
    Login { username: String, password: String },
    Register { username: String, password: String },
    ToggleAuthMode,
    List,
    Open(CapsuleId),
    Back,
    NewCapsule {
        name: String,
        access_code: String,
        confirm_code: String,
    },
    Close,
    SetParams(CapsuleParamsForm),
    CreateCluster { name: String, key: String },
    JoinCluster { name: String },
    Approve(usize),
    Reject(usize),
    Chat(String),
    ToggleChat,
    Logout,
    Help,
    Quit,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("неизвестная команда: {0} (help - список команд)")]
    Unknown(String),
    #[error("использование: {0}")]
    Usage(&'static str),
    #[error("неизвестный параметр: {0}")]
    UnknownParam(String),
}

/// Blank lines parse to `None`.
pub fn parse(line: &str) -> Result<Option<ShellCommand>, CommandError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };
    let args: Vec<&str> = rest.split_whitespace().collect();

    let command = match verb {
        "login" | "register" => {
            let [username, password] = args.as_slice() else {
                return Err(CommandError::Usage("login|register <логин> <пароль>"));
            };
            let (username, password) = (username.to_string(), password.to_string());
            if verb == "login" {
                ShellCommand::Login { username, password }
            } else {
                ShellCommand::Register { username, password }
            }
        }
        "auth-mode" => ShellCommand::ToggleAuthMode,
        "list" => ShellCommand::List,
        "open" => {
            let id = args
                .first()
                .and_then(|raw| raw.parse::<i64>().ok())
                .ok_or(CommandError::Usage("open <id>"))?;
            ShellCommand::Open(CapsuleId(id))
        }
        "back" => ShellCommand::Back,
        "new" => {
            let [name @ .., access_code, confirm_code] = args.as_slice() else {
                return Err(CommandError::Usage("new <имя> <код> <повтор кода>"));
            };
            if name.is_empty() {
                return Err(CommandError::Usage("new <имя> <код> <повтор кода>"));
            }
            ShellCommand::NewCapsule {
                name: name.join(" "),
                access_code: access_code.to_string(),
                confirm_code: confirm_code.to_string(),
            }
        }
        "close" => ShellCommand::Close,
        "set" => ShellCommand::SetParams(parse_params(&args)?),
        "cluster-create" => {
            let [name @ .., key] = args.as_slice() else {
                return Err(CommandError::Usage("cluster-create <имя> <ключ>"));
            };
            if name.is_empty() {
                return Err(CommandError::Usage("cluster-create <имя> <ключ>"));
            }
            ShellCommand::CreateCluster {
                name: name.join(" "),
                key: key.to_string(),
            }
        }
        "cluster-join" => {
            if rest.is_empty() {
                return Err(CommandError::Usage("cluster-join <имя>"));
            }
            ShellCommand::JoinCluster {
                name: rest.to_string(),
            }
        }
        "approve" => ShellCommand::Approve(parse_index(&args, "approve <n>")?),
        "reject" => ShellCommand::Reject(parse_index(&args, "reject <n>")?),
        "chat" => ShellCommand::Chat(rest.to_string()),
        "chat-toggle" => ShellCommand::ToggleChat,
        "logout" => ShellCommand::Logout,
        "help" => ShellCommand::Help,
        "quit" | "exit" => ShellCommand::Quit,
        other => return Err(CommandError::Unknown(other.to_string())),
    };
    Ok(Some(command))
}

fn parse_index(args: &[&str], usage: &'static str) -> Result<usize, CommandError> {
    args.first()
        .and_then(|raw| raw.parse::<usize>().ok())
        .filter(|n| *n > 0)
        .ok_or(CommandError::Usage(usage))
}

/// Values are kept raw; the controller validates them.
fn parse_params(args: &[&str]) -> Result<CapsuleParamsForm, CommandError> {
    let mut form = CapsuleParamsForm::default();
    for arg in args {
        let Some((key, value)) = arg.split_once('=') else {
            return Err(CommandError::Usage("set [status=day|night] [temp=N] [oxygen=N]"));
        };
        let value = Some(value.to_string());
        match key {
            "status" | "mode" => form.status = value,
            "temp" | "temperature" => form.temperature = value,
            "oxygen" | "oxygen_level" => form.oxygen_level = value,
            other => return Err(CommandError::UnknownParam(other.to_string())),
        }
    }
    Ok(form)
}
