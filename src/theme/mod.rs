//! Theme engine
//!
//! This module provides template rendering using Tera.
//! Features:
//! - Default theme embedded in the binary
//! - Optional template directory overriding embedded templates by name
//! - Page shell variables shared by every page (navbar, language switcher, footer)
//! - `animate()` template function for scroll-triggered fade-in sections
//! - `localize` filter prefixing internal links with the page locale

use anyhow::{Context, Result};
use chrono::Datelike;
use rust_embed::RustEmbed;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use tera::{Context as TeraContext, Tera, Value};

use crate::auth::SessionUser;
use crate::models::Locale;
use crate::services::i18n::Translations;
use crate::services::markdown::localize_href;

mod error;
#[cfg(test)]
mod tests;

pub use error::ThemeError;

/// Templates of the default theme
#[derive(RustEmbed)]
#[folder = "themes/default/"]
#[include = "*.html"]
struct DefaultTheme;

/// Where the loaded templates came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThemeSource {
    Embedded,
    /// Embedded templates with overrides from this directory
    Directory(PathBuf),
}

/// Theme engine for rendering templates
pub struct ThemeEngine {
    tera: Tera,
    source: ThemeSource,
}

impl ThemeEngine {
    /// Create a theme engine
    ///
    /// Templates found under `override_path` replace embedded templates with
    /// the same relative name; new names are added.
    pub fn new(override_path: Option<&Path>) -> Result<Self> {
        let mut templates: BTreeMap<String, String> = embedded_templates()?;

        let source = match override_path {
            Some(dir) => {
                if !dir.is_dir() {
                    return Err(ThemeError::NotFound(dir.display().to_string()).into());
                }
                let mut overrides = Vec::new();
                collect_templates_from_dir(dir, dir, &mut overrides)?;
                tracing::info!("Loaded {} template overrides from {:?}", overrides.len(), dir);
                templates.extend(overrides);
                ThemeSource::Directory(dir.to_path_buf())
            }
            None => ThemeSource::Embedded,
        };

        let mut tera = Tera::default();
        tera.add_raw_templates(templates)
            .map_err(ThemeError::from)
            .context("Failed to load theme templates")?;
        register_helpers(&mut tera);

        Ok(Self { tera, source })
    }

    pub fn source(&self) -> &ThemeSource {
        &self.source
    }

    /// Whether the theme has a template with this name
    pub fn has_template(&self, template: &str) -> bool {
        self.tera.get_template_names().any(|name| name == template)
    }

    /// Render a template with a Tera context
    pub fn render(&self, template: &str, context: &TeraContext) -> Result<String, ThemeError> {
        if !self.has_template(template) {
            return Err(ThemeError::NotFound(template.to_string()));
        }
        self.tera.render(template, context).map_err(|e| {
            let err = ThemeError::from(e);
            tracing::error!("Failed to render '{}': {}", template, err);
            err
        })
    }

    /// Render a page template with the shared page shell variables
    pub fn render_page(
        &self,
        template: &str,
        shell: &PageShell,
        context: &TeraContext,
    ) -> Result<String, ThemeError> {
        let mut full_context = TeraContext::from_serialize(shell)?;
        full_context.extend(context.clone());
        self.render(template, &full_context)
    }

    /// Minimal error page used when the theme itself cannot render
    pub fn simple_error_page(message: &str) -> String {
        format!(
            "<!DOCTYPE html><html><head><meta charset=\"utf-8\"><title>Error</title></head>\
             <body><h1>Something went wrong</h1><p>{}</p><p><a href=\"/\">Home</a></p></body></html>",
            crate::services::markdown::html_escape(message)
        )
    }
}

fn embedded_templates() -> Result<BTreeMap<String, String>> {
    let mut templates = BTreeMap::new();
    for name in DefaultTheme::iter() {
        let file = DefaultTheme::get(&name)
            .ok_or_else(|| ThemeError::NotFound(name.to_string()))?;
        let content = String::from_utf8(file.data.into_owned())
            .with_context(|| format!("Template is not UTF-8: {}", name))?;
        templates.insert(name.replace('\\', "/"), content);
    }
    Ok(templates)
}

/// Collect `.html` templates below `current_path`, named relative to `base_path`
fn collect_templates_from_dir(
    base_path: &Path,
    current_path: &Path,
    templates: &mut Vec<(String, String)>,
) -> Result<()> {
    for entry in fs::read_dir(current_path)? {
        let entry = entry?;
        let path = entry.path();

        if path.is_dir() {
            collect_templates_from_dir(base_path, &path, templates)?;
        } else if path.extension().map_or(false, |ext| ext == "html") {
            let relative_path = path
                .strip_prefix(base_path)
                .map_err(|_| ThemeError::TemplateError("Failed to get relative path".to_string()))?;

            // Forward slashes on every platform
            let template_name = relative_path.to_string_lossy().replace('\\', "/");

            let content = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read template: {:?}", path))?;

            templates.push((template_name, content));
        }
    }

    Ok(())
}

fn register_helpers(tera: &mut Tera) {
    tera.register_function("animate", animate_function);
    tera.register_filter("localize", localize_filter);
}

/// `{{ animate(delay=150, class="card") | safe }}`
///
/// Attributes for an element that fades in the first time it scrolls into
/// view. `static/js/animate.js` adds `is-visible` once and stops observing.
fn animate_function(args: &HashMap<String, Value>) -> tera::Result<Value> {
    let delay = match args.get("delay") {
        None => 0,
        Some(value) => value
            .as_u64()
            .ok_or_else(|| tera::Error::msg("animate(): `delay` must be a non-negative integer"))?,
    };
    let extra_class = args
        .get("class")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|c| !c.is_empty());

    let class = match extra_class {
        Some(extra) => format!("animate-on-scroll {}", crate::services::markdown::html_escape(extra)),
        None => "animate-on-scroll".to_string(),
    };
    let mut attrs = format!("class=\"{}\" data-animate", class);
    if delay > 0 {
        attrs.push_str(&format!(" style=\"transition-delay: {}ms\"", delay));
    }
    Ok(Value::String(attrs))
}

/// `{{ "/blog" | localize(locale=locale) }}`
fn localize_filter(value: &Value, args: &HashMap<String, Value>) -> tera::Result<Value> {
    let href = value
        .as_str()
        .ok_or_else(|| tera::Error::msg("localize: value must be a string"))?;
    let locale = args
        .get("locale")
        .and_then(Value::as_str)
        .and_then(Locale::parse)
        .unwrap_or(Locale::DEFAULT);
    Ok(Value::String(localize_href(href, locale)))
}

/// Entry of the language switcher
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LanguageLink {
    pub code: String,
    pub label: String,
    pub url: String,
    pub active: bool,
}

/// Navbar entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavLink {
    pub label: String,
    pub url: String,
    pub active: bool,
}

/// Variables every page template receives
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageShell {
    pub site_name: String,
    /// Locale code, e.g. `ja`
    pub locale: String,
    pub html_lang: String,
    /// UI strings resolved for the locale
    pub t: BTreeMap<String, String>,
    pub nav: Vec<NavLink>,
    pub languages: Vec<LanguageLink>,
    pub current_user: Option<SessionUser>,
    /// Navbar account links, passed through `localize` by the templates
    pub login_url: String,
    pub dashboard_url: String,
    pub request_path: String,
    pub year: i32,
}

impl PageShell {
    /// Build the shell for a page
    ///
    /// `url_for` maps every locale to the equivalent of the current page in
    /// that locale, feeding the language switcher.
    pub fn new<F>(
        site_name: &str,
        locale: Locale,
        translations: &Translations,
        request_path: &str,
        current_user: Option<SessionUser>,
        url_for: F,
    ) -> Self
    where
        F: Fn(Locale) -> String,
    {
        let languages = Locale::ALL
            .into_iter()
            .map(|l| LanguageLink {
                code: l.code().to_string(),
                label: l.label().to_string(),
                url: url_for(l),
                active: l == locale,
            })
            .collect();

        let nav = [("nav_home", ""), ("nav_blog", "/blog")]
            .into_iter()
            .map(|(key, suffix)| {
                let url = format!("/{}{}", locale.code(), suffix);
                let active = if suffix.is_empty() {
                    request_path == url
                } else {
                    request_path == url || request_path.starts_with(&format!("{}/", url))
                };
                NavLink {
                    label: translations.t(locale, key).to_string(),
                    url,
                    active,
                }
            })
            .collect();

        Self {
            site_name: site_name.to_string(),
            locale: locale.code().to_string(),
            html_lang: locale.html_lang().to_string(),
            t: translations.bundle(locale),
            nav,
            languages,
            current_user,
            login_url: "/login".to_string(),
            dashboard_url: "/dashboard".to_string(),
            request_path: request_path.to_string(),
            year: chrono::Utc::now().year(),
        }
    }

    /// Replace the default `/login` and `/dashboard` navbar targets
    pub fn with_account_links(mut self, login_url: &str, dashboard_url: &str) -> Self {
        self.login_url = login_url.to_string();
        self.dashboard_url = dashboard_url.to_string();
        self
    }
}
