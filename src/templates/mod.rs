//! Template engine
//!
//! HTML pages are rendered with Tera. The default templates are embedded in
//! the binary; a directory configured as `templates.path` may replace any of
//! them by providing a file with the same relative name.

use anyhow::{Context, Result};
use rust_embed::RustEmbed;
use serde::Serialize;
use std::collections::BTreeMap;
use std::error::Error as StdError;
use std::fs;
use std::path::Path;
use tera::{Context as TeraContext, Tera};

use crate::models::User;

mod error;

pub use error::TemplateError;

/// Default templates shipped with the binary
#[derive(RustEmbed)]
#[folder = "templates/"]
#[include = "*.html"]
struct DefaultTemplates;

/// Renders the site's pages
pub struct TemplateEngine {
    tera: Tera,
}

impl TemplateEngine {
    /// Load the embedded templates, then any overrides from `override_path`
    pub fn new(override_path: Option<&Path>) -> Result<Self> {
        let tera = Self::load(override_path)?;

        tracing::debug!(
            "Loaded {} templates (override directory: {:?})",
            tera.get_template_names().count(),
            override_path
        );

        Ok(Self { tera })
    }

    fn load(override_path: Option<&Path>) -> Result<Tera> {
        let mut templates: BTreeMap<String, String> = BTreeMap::new();

        for name in DefaultTemplates::iter() {
            let Some(file) = DefaultTemplates::get(&name) else {
                continue;
            };
            let content = String::from_utf8(file.data.into_owned())
                .map_err(|_| TemplateError::InvalidEncoding(name.to_string()))?;
            templates.insert(name.to_string(), content);
        }

        if let Some(dir) = override_path {
            if !dir.is_dir() {
                return Err(TemplateError::DirectoryNotFound(dir.display().to_string()).into());
            }
            collect_templates_from_dir(dir, dir, &mut templates)?;
        }

        let mut tera = Tera::default();
        tera.set_escape_fn(escape_html);
        // Adding them together lets Tera resolve `extends` in any order.
        tera.add_raw_templates(templates)
            .map_err(|e| TemplateError::Render(error_chain(&e)))?;
        Ok(tera)
    }

    pub fn render(&self, template: &str, context: &TeraContext) -> Result<String> {
        self.tera.render(template, context).map_err(|e| {
            TemplateError::Render(format!(
                "Failed to render '{}': {}",
                template,
                error_chain(&e)
            ))
            .into()
        })
    }

    /// Render a page with the variables every page receives
    pub fn render_page(
        &self,
        template: &str,
        context: &TeraContext,
        vars: &StandardTemplateVars,
    ) -> Result<String> {
        let mut full_context = context.clone();
        full_context.insert("site_name", &vars.site_name);
        full_context.insert("user", &vars.user);
        self.render(template, &full_context)
    }

    pub fn has_template(&self, template: &str) -> bool {
        self.tera.get_template_names().any(|name| name == template)
    }
}

/// HTML escaping that leaves `/` alone so URLs stay readable in attributes
fn escape_html(input: &str) -> String {
    let mut output = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => output.push_str("&amp;"),
            '<' => output.push_str("&lt;"),
            '>' => output.push_str("&gt;"),
            '"' => output.push_str("&quot;"),
            '\'' => output.push_str("&#x27;"),
            _ => output.push(c),
        }
    }
    output
}

fn error_chain(e: &tera::Error) -> String {
    let mut message = e.to_string();
    let mut source = e.source();
    while let Some(s) = source {
        message.push_str(&format!("\n  Caused by: {}", s));
        source = s.source();
    }
    message
}

/// Collect `.html` files below `current_path`, keyed by their path relative to `base_path`
fn collect_templates_from_dir(
    base_path: &Path,
    current_path: &Path,
    templates: &mut BTreeMap<String, String>,
) -> Result<()> {
    for entry in fs::read_dir(current_path)
        .with_context(|| format!("Failed to read template directory: {:?}", current_path))?
    {
        let path = entry?.path();

        if path.is_dir() {
            collect_templates_from_dir(base_path, &path, templates)?;
        } else if path.extension().is_some_and(|ext| ext == "html") {
            let relative_path = path
                .strip_prefix(base_path)
                .context("Failed to get relative template path")?;
            let name = relative_path.to_string_lossy().replace('\\', "/");

            let content = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read template: {:?}", path))?;

            templates.insert(name, content);
        }
    }

    Ok(())
}

/// Variables injected into every page
#[derive(Debug, Clone, Serialize)]
pub struct StandardTemplateVars {
    pub site_name: String,
    pub user: TemplateUser,
}

impl StandardTemplateVars {
    pub fn new(site_name: impl Into<String>, user: Option<&User>) -> Self {
        Self {
            site_name: site_name.into(),
            user: user.map(TemplateUser::from).unwrap_or_else(TemplateUser::anonymous),
        }
    }
}

/// The visitor as the templates see it
#[derive(Debug, Clone, Default, Serialize)]
pub struct TemplateUser {
    pub is_authenticated: bool,
    pub id: Option<i64>,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    /// Full name, or the username when no name is set
    pub display_name: String,
    pub is_superuser: bool,
}

impl TemplateUser {
    pub fn anonymous() -> Self {
        Self::default()
    }
}

impl From<&User> for TemplateUser {
    fn from(user: &User) -> Self {
        Self {
            is_authenticated: true,
            id: Some(user.id),
            username: user.username.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            display_name: user.full_name(),
            is_superuser: user.is_superuser,
        }
    }
}
