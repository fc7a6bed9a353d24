//! Tests for the theme engine

use super::*;
use crate::content::ContentStore;
use crate::services::i18n::UI_KEYS;
use std::fs;
use tempfile::TempDir;
use tera::Context as TeraContext;

fn shell(locale: Locale, user: Option<SessionUser>) -> PageShell {
    let store = ContentStore::embedded().unwrap();
    PageShell::new(
        "OddsPress",
        locale,
        store.translations(),
        &format!("/{}/blog", locale.code()),
        user,
        |l| format!("/{}/blog", l.code()),
    )
}

/// Helper to create an override directory with a replaced not-found page
fn create_override_dir(dir: &Path) {
    fs::create_dir_all(dir.join("partials")).unwrap();
    fs::write(
        dir.join("not_found.html"),
        r#"{% extends "base.html" %}
{% block content %}<p class="custom">{{ t.not_found_title }}</p>{% endblock content %}"#,
    )
    .unwrap();
    fs::write(dir.join("extra.html"), "<em>{{ site_name }}</em>").unwrap();
    fs::write(dir.join("partials/footer.html"), "<footer>custom footer</footer>").unwrap();
    fs::write(dir.join("notes.txt"), "ignored").unwrap();
}

#[test]
fn test_embedded_theme_has_page_templates() {
    let engine = ThemeEngine::new(None).unwrap();
    assert_eq!(engine.source(), &ThemeSource::Embedded);
    for name in [
        "base.html",
        "index.html",
        "blog.html",
        "post.html",
        "not_found.html",
        "macros.html",
        "partials/navbar.html",
        "partials/footer.html",
    ] {
        assert!(engine.has_template(name), "missing {}", name);
    }
}

#[test]
fn test_render_not_found_page() {
    let engine = ThemeEngine::new(None).unwrap();
    let mut context = TeraContext::new();
    context.insert("missing_post", &true);
    let html = engine
        .render_page("not_found.html", &shell(Locale::De, None), &context)
        .unwrap();

    assert!(html.contains("<html lang=\"de\">"));
    assert!(html.contains("Artikel nicht gefunden"));
    assert!(html.contains("href=\"/de\""));
    // Anonymous visitors get the login button
    assert!(html.contains("href=\"/de/login\""));
}

#[test]
fn test_render_generic_not_found_page() {
    let engine = ThemeEngine::new(None).unwrap();
    let mut context = TeraContext::new();
    context.insert("missing_post", &false);
    let html = engine
        .render_page("not_found.html", &shell(Locale::De, None), &context)
        .unwrap();

    assert!(html.contains("Seite nicht gefunden"));
    assert!(!html.contains("Artikel nicht gefunden"));
}

#[test]
fn test_templates_only_read_known_ui_keys() {
    let key_pattern = regex::Regex::new(r"\bt\.([a-z_]+)").unwrap();
    for name in DefaultTheme::iter() {
        let file = DefaultTheme::get(&name).unwrap();
        let source = std::str::from_utf8(&file.data).unwrap();
        for capture in key_pattern.captures_iter(source) {
            let key = &capture[1];
            assert!(UI_KEYS.contains(&key), "{} reads unknown key t.{}", name, key);
        }
    }
}

#[test]
fn test_account_links_are_localized() {
    let engine = ThemeEngine::new(None).unwrap();
    let page = shell(Locale::Ja, None).with_account_links("/signin", "https://app.example.com");
    let html = engine
        .render_page("not_found.html", &page, &TeraContext::new())
        .unwrap();
    assert!(html.contains("href=\"/ja/signin\""));

    let user = SessionUser {
        id: "u1".to_string(),
        email: None,
    };
    let page = shell(Locale::Ja, Some(user)).with_account_links("/signin", "https://app.example.com");
    let html = engine
        .render_page("not_found.html", &page, &TeraContext::new())
        .unwrap();
    assert!(html.contains("href=\"https://app.example.com\""));
}

#[test]
fn test_navbar_for_signed_in_reader() {
    let engine = ThemeEngine::new(None).unwrap();
    let user = SessionUser {
        id: "u1".to_string(),
        email: Some("reader@example.com".to_string()),
    };
    let html = engine
        .render_page("not_found.html", &shell(Locale::Es, Some(user)), &TeraContext::new())
        .unwrap();

    assert!(html.contains("href=\"/es/dashboard\""));
    assert!(!html.contains("href=\"/es/login\""));
}

#[test]
fn test_directory_overrides_embedded_templates() {
    let temp_dir = TempDir::new().unwrap();
    create_override_dir(temp_dir.path());

    let engine = ThemeEngine::new(Some(temp_dir.path())).unwrap();
    assert_eq!(
        engine.source(),
        &ThemeSource::Directory(temp_dir.path().to_path_buf())
    );
    assert!(engine.has_template("extra.html"));
    assert!(!engine.has_template("notes.txt"));

    let html = engine
        .render_page("not_found.html", &shell(Locale::En, None), &TeraContext::new())
        .unwrap();
    assert!(html.contains("<p class=\"custom\">Article not found</p>"));
    assert!(html.contains("custom footer"));
    // Untouched templates still come from the embedded theme
    assert!(html.contains("id=\"mobile-menu\""));
}

#[test]
fn test_missing_override_dir_is_an_error() {
    let temp_dir = TempDir::new().unwrap();
    assert!(ThemeEngine::new(Some(&temp_dir.path().join("absent"))).is_err());
}

#[test]
fn test_broken_override_is_an_error() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("index.html"), "{% if %}").unwrap();
    assert!(ThemeEngine::new(Some(temp_dir.path())).is_err());
}

#[test]
fn test_render_missing_template() {
    let engine = ThemeEngine::new(None).unwrap();
    let err = engine.render("nope.html", &TeraContext::new()).unwrap_err();
    assert!(matches!(err, ThemeError::NotFound(name) if name == "nope.html"));
}

#[test]
fn test_animate_function() {
    let mut args = HashMap::new();
    assert_eq!(
        animate_function(&args).unwrap(),
        Value::String("class=\"animate-on-scroll\" data-animate".to_string())
    );

    args.insert("delay".to_string(), Value::from(200));
    args.insert("class".to_string(), Value::from(" post-card "));
    assert_eq!(
        animate_function(&args).unwrap(),
        Value::String(
            "class=\"animate-on-scroll post-card\" data-animate style=\"transition-delay: 200ms\""
                .to_string()
        )
    );

    args.insert("delay".to_string(), Value::from(-5));
    assert!(animate_function(&args).is_err());
}

#[test]
fn test_animate_escapes_class() {
    let mut args = HashMap::new();
    args.insert("class".to_string(), Value::from("a\" onload=\"x"));
    let attrs = animate_function(&args).unwrap();
    assert!(!attrs.as_str().unwrap().contains("\" onload"));
}

#[test]
fn test_localize_filter() {
    let mut args = HashMap::new();
    args.insert("locale".to_string(), Value::from("pt"));
    assert_eq!(
        localize_filter(&Value::from("/blog"), &args).unwrap(),
        Value::from("/pt/blog")
    );
    assert_eq!(
        localize_filter(&Value::from("https://example.com"), &args).unwrap(),
        Value::from("https://example.com")
    );

    // Unknown locale falls back to English
    args.insert("locale".to_string(), Value::from("xx"));
    assert_eq!(
        localize_filter(&Value::from("/blog"), &args).unwrap(),
        Value::from("/en/blog")
    );

    assert!(localize_filter(&Value::from(3), &HashMap::new()).is_err());
}

#[test]
fn test_page_shell_navigation() {
    let shell = shell(Locale::Ja, None);

    assert_eq!(shell.locale, "ja");
    assert_eq!(shell.html_lang, "ja");
    assert_eq!(shell.languages.len(), Locale::ALL.len());
    let active: Vec<&str> = shell
        .languages
        .iter()
        .filter(|l| l.active)
        .map(|l| l.code.as_str())
        .collect();
    assert_eq!(active, vec!["ja"]);
    assert_eq!(shell.languages[1].url, "/es/blog");

    let nav: Vec<(&str, bool)> = shell
        .nav
        .iter()
        .map(|n| (n.url.as_str(), n.active))
        .collect();
    assert_eq!(nav, vec![("/ja", false), ("/ja/blog", true)]);
    assert_eq!(shell.nav[1].label, "ブログ");
}

#[test]
fn test_simple_error_page_escapes_message() {
    let html = ThemeEngine::simple_error_page("<script>");
    assert!(html.contains("&lt;script&gt;"));
}
