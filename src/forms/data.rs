//! Submitted form data
//!
//! [`FormData`] is an axum extractor accepting both
//! `application/x-www-form-urlencoded` and `multipart/form-data` bodies.
//! Repeated keys are kept, which multi-select fields rely on.

use axum::{
    extract::{FromRequest, Multipart, Request},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Form,
};
use std::collections::HashMap;

/// A file part of a multipart submission
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

/// Text values and files of a submitted form
#[derive(Debug, Clone, Default)]
pub struct FormData {
    values: HashMap<String, Vec<String>>,
    files: HashMap<String, UploadedFile>,
}

impl FormData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder used by tests and by the extractor
    pub fn with_value(mut self, name: &str, value: impl Into<String>) -> Self {
        self.push_value(name, value.into());
        self
    }

    pub fn with_file(mut self, name: &str, file: UploadedFile) -> Self {
        self.files.insert(name.to_string(), file);
        self
    }

    fn push_value(&mut self, name: &str, value: String) {
        self.values.entry(name.to_string()).or_default().push(value);
    }

    /// Last value submitted under `name`, or an empty string
    pub fn value(&self, name: &str) -> String {
        self.values
            .get(name)
            .and_then(|v| v.last())
            .cloned()
            .unwrap_or_default()
    }

    /// Every value submitted under `name`
    pub fn values(&self, name: &str) -> Vec<String> {
        self.values.get(name).cloned().unwrap_or_default()
    }

    pub fn file(&self, name: &str) -> Option<&UploadedFile> {
        self.files.get(name)
    }

    pub fn take_file(&mut self, name: &str) -> Option<UploadedFile> {
        self.files.remove(name)
    }

    async fn from_multipart(mut multipart: Multipart) -> Result<Self, FormDataRejection> {
        let mut data = Self::new();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| FormDataRejection(e.body_text()))?
        {
            let name = field.name().unwrap_or("").to_string();

            match field.file_name().map(str::to_string) {
                Some(file_name) => {
                    let content_type = field
                        .content_type()
                        .map(str::to_string)
                        .unwrap_or_else(|| "application/octet-stream".to_string());
                    let bytes = field
                        .bytes()
                        .await
                        .map_err(|e| FormDataRejection(e.body_text()))?;

                    // Browsers send an empty, unnamed part for an untouched file input.
                    if file_name.is_empty() && bytes.is_empty() {
                        continue;
                    }

                    data.files.insert(
                        name,
                        UploadedFile {
                            file_name,
                            content_type,
                            data: bytes.to_vec(),
                        },
                    );
                }
                None => {
                    let text = field
                        .text()
                        .await
                        .map_err(|e| FormDataRejection(e.body_text()))?;
                    data.push_value(&name, text);
                }
            }
        }

        Ok(data)
    }
}

impl<S> FromRequest<S> for FormData
where
    S: Send + Sync,
{
    type Rejection = FormDataRejection;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_ascii_lowercase();

        if content_type.starts_with("multipart/form-data") {
            let multipart = Multipart::from_request(req, state)
                .await
                .map_err(|e| FormDataRejection(e.body_text()))?;
            return Self::from_multipart(multipart).await;
        }

        if content_type.starts_with("application/x-www-form-urlencoded") {
            let Form(pairs) = Form::<Vec<(String, String)>>::from_request(req, state)
                .await
                .map_err(|e| FormDataRejection(e.body_text()))?;
            let mut data = Self::new();
            for (name, value) in pairs {
                data.push_value(&name, value);
            }
            return Ok(data);
        }

        // Any other body is treated as a submission with no fields.
        Ok(Self::new())
    }
}

/// Malformed form body
#[derive(Debug)]
pub struct FormDataRejection(pub String);

impl IntoResponse for FormDataRejection {
    fn into_response(self) -> Response {
        tracing::debug!("Rejected form body: {}", self.0);
        (StatusCode::BAD_REQUEST, crate::web::error::BAD_REQUEST).into_response()
    }
}
