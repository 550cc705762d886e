//! Fixed message copy sent by the bot

use super::stage::ClientProfile;

pub const INTEREST_PROMPT: &str = "Привет! Интересует изготовление изделия на заказ?";
pub const CHOICE_YES: &str = "Да";
pub const CHOICE_NO: &str = "Нет";

pub const PHOTO_PROMPT: &str = "Отлично! Пришлите фото изделия.";
pub const PHOTO_RECEIVED: &str = "✅ Фото получено, передано на оценку.";
pub const PHOTO_RETRY: &str = "Не удалось получить фото, пришлите ещё раз.";

pub const CHOICE_ACCEPT: &str = "Устраивает";
pub const CHOICE_REJECT: &str = "Не устраивает";

pub const REQUISITES_PROMPT: &str = "📄 Пришлите реквизиты.";
pub const DECLINED: &str = "Хорошо, на связи!";
pub const THANKS: &str = "✅ Спасибо! Мы свяжемся с вами.";
pub const CONTACT_HINT: &str = "Если что — нажмите кнопку:";
pub const CONTACT_MANAGER_BUTTON: &str = "📲 Связаться с менеджером";
pub const RESTART_REQUIRED: &str = "Ошибка. Начните заново: /start";

pub const CONTACT_PROMPT: &str = "Менеджер на связи👇";
pub const CONTACT_BUTTON: &str = "📲 Связаться в Telegram";

pub const OWNER_CLIENT_NOT_FOUND: &str = "❌ Клиент не найден.";
pub const OWNER_CLIENT_GONE: &str = "⚠️ Клиент больше не ждёт цену.";
pub const OWNER_PRICE_AS_TEXT: &str = "Ответьте на фото текстом с ценой.";

pub const EXPORT_CAPTION: &str = "📊 Заявки";
pub const EXPORT_DENIED: &str = "Нет доступа или файл не найден.";

/// Lower-cased word the client types (or taps) to confirm interest
pub const AFFIRMATIVE: &str = "да";
/// Lower-cased phrase the client uses to accept a price
pub const ACCEPTANCE: &str = "устраивает";

/// Case-insensitive comparison of a client reply against a fixed word
pub fn is_reply(text: &str, expected: &str) -> bool {
    text.trim().to_lowercase() == expected
}

pub fn appraisal_caption(profile: &ClientProfile) -> String {
    format!(
        "🆕 Фото клиента:\n👤 {} (@{})\nID: {}\nОтветьте на это сообщение с ценой.",
        profile.display_name,
        profile.username_or_placeholder(),
        profile.user_id
    )
}

pub fn price_offer(price: &str) -> String {
    format!("💰 Цена: {}. Устраивает?", price.trim())
}

pub fn requisites_caption(profile: &ClientProfile, requisites: &str) -> String {
    format!(
        "📄 Реквизиты от @{}:\n{}",
        profile.username_or_placeholder(),
        requisites
    )
}
