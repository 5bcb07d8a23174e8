//! HTML forms
//!
//! Each form holds the submitted values and the errors found while cleaning
//! them. A form is either cleaned into a typed value the services accept, or
//! rendered back through [`FormView`] with its errors attached to the fields.
//!
//! User-facing messages are Russian, like the rest of the site.

mod data;

pub mod article;
pub mod auth;

pub use article::{ArticleCreationForm, ArticleEditForm};
pub use auth::{UserLoginForm, UserRegistrationForm};
pub use data::{FormData, FormDataRejection, UploadedFile};

use serde::Serialize;
use std::collections::BTreeMap;

use crate::config::UploadConfig;
use crate::services::ImageUpload;

/// Validation messages
pub mod messages {
    pub const REQUIRED: &str = "Обязательное поле.";
    pub const INVALID_USERNAME: &str = "Введите правильное имя пользователя. Оно может содержать только буквы, цифры и знаки @/./+/-/_.";
    pub const INVALID_EMAIL: &str = "Введите правильный адрес электронной почты.";
    pub const USERNAME_TAKEN: &str = "Пользователь с таким именем уже существует.";
    pub const PASSWORD_MISMATCH: &str = "Пароль не совпадает";
    pub const LOGIN_FAILED: &str = "Неверные имя пользователя или пароль.";
    pub const INVALID_CHOICE: &str = "Выберите корректный вариант. Вашего варианта нет среди допустимых значений.";
    pub const INVALID_IMAGE: &str = "Загрузите правильное изображение. Файл, который вы загрузили, поврежден или не является изображением.";
    pub const EMPTY_FILE: &str = "Отправленный файл пуст.";

    pub fn max_length(limit: usize, actual: usize) -> String {
        format!(
            "Убедитесь, что это значение содержит не более {} символов (сейчас {}).",
            limit, actual
        )
    }

    pub fn invalid_choice_value(value: &str) -> String {
        format!(
            "Выберите корректный вариант. {} нет среди допустимых значений.",
            value
        )
    }

    pub fn image_too_large(limit_bytes: u64) -> String {
        format!(
            "Размер файла изображения превышает {} мегабайт",
            limit_bytes / (1024 * 1024)
        )
    }
}

/// Errors collected while cleaning a form
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FormErrors {
    fields: BTreeMap<String, Vec<String>>,
    non_field: Vec<String>,
}

impl FormErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.fields
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn add_non_field(&mut self, message: impl Into<String>) {
        self.non_field.push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.non_field.is_empty()
    }

    /// Messages for one field
    pub fn get(&self, field: &str) -> &[String] {
        self.fields.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has(&self, field: &str) -> bool {
        !self.get(field).is_empty()
    }

    pub fn non_field(&self) -> &[String] {
        &self.non_field
    }

    pub fn clear(&mut self) {
        self.fields.clear();
        self.non_field.clear();
    }
}

/// One selectable option of a choice field
#[derive(Debug, Clone, Serialize)]
pub struct ChoiceView {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

/// A form field as the templates see it
#[derive(Debug, Clone, Serialize)]
pub struct FieldView {
    pub name: &'static str,
    pub label: &'static str,
    /// `text`, `email`, `password`, `textarea`, `select`, `select_multiple` or `file`
    pub kind: &'static str,
    pub value: String,
    pub required: bool,
    pub max_length: Option<usize>,
    pub choices: Vec<ChoiceView>,
    pub errors: Vec<String>,
}

impl FieldView {
    fn new(name: &'static str, label: &'static str, kind: &'static str) -> Self {
        Self {
            name,
            label,
            kind,
            value: String::new(),
            required: true,
            max_length: None,
            choices: Vec::new(),
            errors: Vec::new(),
        }
    }

    fn value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }

    fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    fn max_length(mut self, max_length: usize) -> Self {
        self.max_length = Some(max_length);
        self
    }

    fn choices(mut self, choices: Vec<ChoiceView>) -> Self {
        self.choices = choices;
        self
    }

    fn errors(mut self, errors: &FormErrors) -> Self {
        self.errors = errors.get(self.name).to_vec();
        self
    }
}

/// A whole form as the templates see it
#[derive(Debug, Clone, Serialize)]
pub struct FormView {
    pub fields: Vec<FieldView>,
    pub non_field_errors: Vec<String>,
    /// Needs `enctype="multipart/form-data"`
    pub is_multipart: bool,
}

// ============================================================================
// Validators
// ============================================================================

/// Trimmed value, or a "required" error when blank
fn clean_required(errors: &mut FormErrors, field: &str, value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() {
        errors.add(field, messages::REQUIRED);
        None
    } else {
        Some(value.to_string())
    }
}

fn check_max_length(errors: &mut FormErrors, field: &str, value: &str, limit: usize) -> bool {
    let actual = value.chars().count();
    if actual > limit {
        errors.add(field, messages::max_length(limit, actual));
        false
    } else {
        true
    }
}

/// Letters, digits and `@.+-_`
pub fn is_valid_username(username: &str) -> bool {
    !username.is_empty()
        && username
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
}

/// `local@domain.tld` with no whitespace and a dotted domain, or `local@localhost`
pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.rsplit_once('@') else {
        return false;
    };
    if local.is_empty() || email.chars().any(char::is_whitespace) {
        return false;
    }
    if domain.eq_ignore_ascii_case("localhost") {
        return true;
    }
    let labels: Vec<&str> = domain.split('.').collect();
    labels.len() >= 2
        && labels.iter().all(|label| {
            !label.is_empty()
                && !label.starts_with('-')
                && !label.ends_with('-')
                && label.chars().all(|c| c.is_alphanumeric() || c == '-')
        })
}

/// Detect the image format from its leading bytes
pub fn sniff_image_type(data: &[u8]) -> Option<&'static str> {
    if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some("image/jpeg")
    } else if data.starts_with(b"\x89PNG\r\n\x1a\n") {
        Some("image/png")
    } else if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
        Some("image/gif")
    } else if data.len() >= 12 && &data[..4] == b"RIFF" && &data[8..12] == b"WEBP" {
        Some("image/webp")
    } else if data.starts_with(b"BM") {
        Some("image/bmp")
    } else {
        None
    }
}

/// Validate an uploaded image against the size limit and allowed formats.
///
/// The format is taken from the file contents, not from the browser's
/// claimed content type.
fn clean_image(
    errors: &mut FormErrors,
    field: &str,
    file: &UploadedFile,
    config: &UploadConfig,
) -> Option<ImageUpload> {
    if file.data.is_empty() {
        errors.add(field, messages::EMPTY_FILE);
        return None;
    }
    if file.data.len() as u64 > config.max_image_size {
        errors.add(field, messages::image_too_large(config.max_image_size));
        return None;
    }
    match sniff_image_type(&file.data) {
        Some(kind) if config.is_type_allowed(kind) => Some(ImageUpload {
            file_name: file.file_name.clone(),
            content_type: kind.to_string(),
            data: file.data.clone(),
        }),
        _ => {
            errors.add(field, messages::INVALID_IMAGE);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    pub(crate) const PNG: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

    fn file(data: &[u8]) -> UploadedFile {
        UploadedFile {
            file_name: "a.png".to_string(),
            content_type: "image/png".to_string(),
            data: data.to_vec(),
        }
    }

    #[test]
    fn test_form_errors() {
        let mut errors = FormErrors::new();
        assert!(errors.is_empty());

        errors.add("title", messages::REQUIRED);
        errors.add_non_field(messages::LOGIN_FAILED);

        assert!(!errors.is_empty());
        assert!(errors.has("title"));
        assert_eq!(errors.get("title"), &[messages::REQUIRED.to_string()]);
        assert!(errors.get("text").is_empty());
        assert_eq!(errors.non_field().len(), 1);

        errors.clear();
        assert!(errors.is_empty());
    }

    #[test]
    fn test_max_length_message() {
        assert_eq!(
            messages::max_length(50, 51),
            "Убедитесь, что это значение содержит не более 50 символов (сейчас 51)."
        );
    }

    #[test]
    fn test_image_too_large_message() {
        assert_eq!(
            messages::image_too_large(5 * 1024 * 1024),
            "Размер файла изображения превышает 5 мегабайт"
        );
    }

    #[test]
    fn test_clean_required_trims() {
        let mut errors = FormErrors::new();
        assert_eq!(clean_required(&mut errors, "f", "  x "), Some("x".to_string()));
        assert_eq!(clean_required(&mut errors, "f", "   "), None);
        assert_eq!(errors.get("f"), &[messages::REQUIRED.to_string()]);
    }

    #[test]
    fn test_username_validation() {
        assert!(is_valid_username("ivan.petrov+news@site_1-x"));
        assert!(is_valid_username("Иван"));
        assert!(!is_valid_username("ivan petrov"));
        assert!(!is_valid_username("ivan!"));
        assert!(!is_valid_username(""));
    }

    #[test]
    fn test_email_validation() {
        assert!(is_valid_email("user@example.com"));
        assert!(is_valid_email("first.last+tag@mail.example.ru"));
        assert!(is_valid_email("user@localhost"));
        assert!(!is_valid_email("@localhost"));
        assert!(!is_valid_email("user@otherhost"));
        assert!(!is_valid_email("user example.com"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("user@.com"));
        assert!(!is_valid_email("us er@example.com"));
    }

    #[test]
    fn test_sniff_image_type() {
        assert_eq!(sniff_image_type(PNG), Some("image/png"));
        assert_eq!(sniff_image_type(&[0xFF, 0xD8, 0xFF, 0xE0]), Some("image/jpeg"));
        assert_eq!(sniff_image_type(b"GIF89a...."), Some("image/gif"));
        assert_eq!(sniff_image_type(b"RIFF\0\0\0\0WEBPVP8 "), Some("image/webp"));
        assert_eq!(sniff_image_type(b"BM\0\0"), Some("image/bmp"));
        assert_eq!(sniff_image_type(b"%PDF-1.7"), None);
        assert_eq!(sniff_image_type(b""), None);
    }

    #[test]
    fn test_clean_image() {
        let config = UploadConfig::default();
        let mut errors = FormErrors::new();

        let image = clean_image(&mut errors, "image", &file(PNG), &config).expect("valid image");
        assert_eq!(image.content_type, "image/png");
        assert!(errors.is_empty());

        assert!(clean_image(&mut errors, "image", &file(b"not an image"), &config).is_none());
        assert_eq!(errors.get("image"), &[messages::INVALID_IMAGE.to_string()]);

        errors.clear();
        assert!(clean_image(&mut errors, "image", &file(b""), &config).is_none());
        assert_eq!(errors.get("image"), &[messages::EMPTY_FILE.to_string()]);
    }

    #[test]
    fn test_clean_image_rejects_disallowed_format() {
        let config = UploadConfig {
            allowed_types: vec!["image/jpeg".to_string()],
            ..Default::default()
        };
        let mut errors = FormErrors::new();

        assert!(clean_image(&mut errors, "image", &file(PNG), &config).is_none());
        assert!(errors.has("image"));
    }

    #[test]
    fn test_clean_image_size_limit() {
        let config = UploadConfig::default();
        let limit = config.max_image_size as usize;

        let mut at_limit = PNG.to_vec();
        at_limit.resize(limit, 0);
        let mut errors = FormErrors::new();
        assert!(clean_image(&mut errors, "image", &file(&at_limit), &config).is_some());

        let mut over = PNG.to_vec();
        over.resize(limit + 1, 0);
        assert!(clean_image(&mut errors, "image", &file(&over), &config).is_none());
        assert_eq!(
            errors.get("image"),
            &["Размер файла изображения превышает 5 мегабайт".to_string()]
        );
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(50))]

        #[test]
        fn property_usernames_from_allowed_charset_are_valid(name in "[a-zA-Z0-9@.+_-]{1,150}") {
            prop_assert!(is_valid_username(&name));
        }

        #[test]
        fn property_usernames_with_forbidden_chars_are_invalid(
            prefix in "[a-z]{0,10}",
            bad in "[ !#$%&*/:;<=>?]",
            suffix in "[a-z]{0,10}"
        ) {
            let name = format!("{}{}{}", prefix, bad, suffix);
            prop_assert!(!is_valid_username(&name));
        }

        #[test]
        fn property_max_length_is_counted_in_characters(len in 0usize..120) {
            let mut errors = FormErrors::new();
            let value = "ж".repeat(len);
            let ok = check_max_length(&mut errors, "title", &value, 50);
            prop_assert_eq!(ok, len <= 50);
            prop_assert_eq!(errors.has("title"), len > 50);
        }
    }
}
