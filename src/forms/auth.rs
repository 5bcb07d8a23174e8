//! Registration and login forms

use super::{
    check_max_length, clean_required, is_valid_email, is_valid_username, messages, FieldView,
    FormData, FormErrors, FormView,
};
use crate::models::{CreateUserInput, EMAIL_MAX_LENGTH, NAME_MAX_LENGTH};

/// Sign-up form: username, names, optional email and a confirmed password
#[derive(Debug, Clone, Default)]
pub struct UserRegistrationForm {
    username: String,
    first_name: String,
    last_name: String,
    email: String,
    password: String,
    password2: String,
    errors: FormErrors,
}

impl UserRegistrationForm {
    /// Empty form for a GET request
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_data(data: &FormData) -> Self {
        Self {
            username: data.value("username"),
            first_name: data.value("first_name"),
            last_name: data.value("last_name"),
            email: data.value("email"),
            password: data.value("password"),
            password2: data.value("password2"),
            errors: FormErrors::new(),
        }
    }

    /// Validate the submission; `None` means errors were recorded
    pub fn clean(&mut self) -> Option<CreateUserInput> {
        self.errors.clear();
        let errors = &mut self.errors;

        let username = clean_required(errors, "username", &self.username);
        if let Some(username) = &username {
            if check_max_length(errors, "username", username, NAME_MAX_LENGTH)
                && !is_valid_username(username)
            {
                errors.add("username", messages::INVALID_USERNAME);
            }
        }

        let first_name = self.first_name.trim().to_string();
        check_max_length(errors, "first_name", &first_name, NAME_MAX_LENGTH);
        let last_name = self.last_name.trim().to_string();
        check_max_length(errors, "last_name", &last_name, NAME_MAX_LENGTH);

        let email = self.email.trim().to_string();
        if !email.is_empty()
            && check_max_length(errors, "email", &email, EMAIL_MAX_LENGTH)
            && !is_valid_email(&email)
        {
            errors.add("email", messages::INVALID_EMAIL);
        }

        // Passwords are not trimmed.
        if self.password.is_empty() {
            errors.add("password", messages::REQUIRED);
        }
        if self.password2.is_empty() {
            errors.add("password2", messages::REQUIRED);
        } else if !self.password.is_empty() && self.password != self.password2 {
            errors.add("password2", messages::PASSWORD_MISMATCH);
        }

        if !self.errors.is_empty() {
            return None;
        }

        Some(CreateUserInput {
            username: username?,
            first_name,
            last_name,
            email,
            password: self.password.clone(),
            is_superuser: false,
        })
    }

    /// Report a username that the database already holds
    pub fn username_taken(&mut self) {
        self.errors.add("username", messages::USERNAME_TAKEN);
    }

    pub fn errors(&self) -> &FormErrors {
        &self.errors
    }

    /// Passwords are never echoed back.
    pub fn view(&self) -> FormView {
        let e = &self.errors;
        FormView {
            fields: vec![
                FieldView::new("username", "Имя пользователя", "text")
                    .value(&self.username)
                    .max_length(NAME_MAX_LENGTH)
                    .errors(e),
                FieldView::new("first_name", "Имя", "text")
                    .value(&self.first_name)
                    .max_length(NAME_MAX_LENGTH)
                    .optional()
                    .errors(e),
                FieldView::new("last_name", "Фамилия", "text")
                    .value(&self.last_name)
                    .max_length(NAME_MAX_LENGTH)
                    .optional()
                    .errors(e),
                FieldView::new("email", "Адрес электронной почты", "email")
                    .value(&self.email)
                    .max_length(EMAIL_MAX_LENGTH)
                    .optional()
                    .errors(e),
                FieldView::new("password", "Пароль", "password").errors(e),
                FieldView::new("password2", "Повторите пароль", "password").errors(e),
            ],
            non_field_errors: e.non_field().to_vec(),
            is_multipart: false,
        }
    }
}

/// Sign-in form
#[derive(Debug, Clone, Default)]
pub struct UserLoginForm {
    username: String,
    password: String,
    errors: FormErrors,
}

impl UserLoginForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_data(data: &FormData) -> Self {
        Self {
            username: data.value("username"),
            password: data.value("password"),
            errors: FormErrors::new(),
        }
    }

    /// Both fields required; returns `(username, password)`
    pub fn clean(&mut self) -> Option<(String, String)> {
        self.errors.clear();

        let username = clean_required(&mut self.errors, "username", &self.username);
        if self.password.is_empty() {
            self.errors.add("password", messages::REQUIRED);
        }

        match username {
            Some(username) if self.errors.is_empty() => Some((username, self.password.clone())),
            _ => None,
        }
    }

    /// Record a failed authentication
    pub fn invalid_credentials(&mut self) {
        self.errors.add_non_field(messages::LOGIN_FAILED);
    }

    pub fn errors(&self) -> &FormErrors {
        &self.errors
    }

    pub fn view(&self) -> FormView {
        let e = &self.errors;
        FormView {
            fields: vec![
                FieldView::new("username", "Имя пользователя", "text")
                    .value(&self.username)
                    .max_length(NAME_MAX_LENGTH)
                    .errors(e),
                FieldView::new("password", "Пароль", "password").errors(e),
            ],
            non_field_errors: e.non_field().to_vec(),
            is_multipart: false,
        }
    }
}
