//! User-facing strings. The backend speaks Russian, so the client does too.

pub const NETWORK_ERROR: &str = "Ошибка сети";
pub const CODES_MISMATCH: &str = "Коды доступа не совпадают";
pub const CAPSULE_NOT_FOUND: &str = "Капсула не найдена";
pub const ACCESS_CODE_PROMPT: &str = "Введите код доступа для капсулы:";

pub const AUTH_FAILED: &str = "Ошибка авторизации";
pub const CREATE_CAPSULE_FAILED: &str = "Ошибка создания капсулы";
pub const UPDATE_FAILED: &str = "Ошибка обновления параметров";
pub const CREATE_CLUSTER_FAILED: &str = "Ошибка создания кластера";
pub const JOIN_FAILED: &str = "Ошибка отправки запроса";
pub const RESOLVE_FAILED: &str = "Ошибка обработки запроса";

pub const CAPSULE_CREATED: &str = "Капсула успешно создана!";
pub const PARAMS_UPDATED: &str = "Параметры обновлены!";
pub const JOIN_SENT: &str = "Запрос на объединение отправлен!";
pub const REQUEST_APPROVED: &str = "Запрос принят";
pub const REQUEST_REJECTED: &str = "Запрос отклонен";

pub const NO_ACTIVE_REQUESTS: &str = "Нет активных запросов";
pub const NO_CAPSULES: &str = "У вас пока нет капсул";

pub const CHAT_GREETING: &str = "Привет! Я ваш космический помощник. Чем могу помочь?";
pub const CHAT_UNREACHABLE: &str = "Не удалось связаться с Плуто";
pub const CHAT_FAILURE: &str = "Извините, произошла ошибка. Попробуйте еще раз.";

pub fn cluster_created(name: &str) -> String {
    format!("Кластер создан: {name}")
}

pub fn invalid_number(field: &str, raw: &str) -> String {
    format!("Некорректное значение поля «{field}»: {raw}")
}

pub fn invalid_status(raw: &str) -> String {
    format!("Неизвестный режим капсулы: {raw}")
}
