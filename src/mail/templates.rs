//! Welcome email rendering.
//!
//! Produces a self-contained HTML document plus a plain-text fallback from the
//! askama templates under `templates/`. The only side effects are reading the
//! optional logo from disk and taking the current year for the footer.

use std::io;
use std::path::{Path, PathBuf};

use askama::Template;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{Datelike, Utc};

use super::MailError;

const TAGLINE: &str = "Laboratory Information Management System";

/// Fields shown to a newly created user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WelcomeTemplateInput {
    pub user_name: String,
    pub email: String,
    pub password: String,
    pub role: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedEmail {
    pub html: String,
    pub text: String,
}

pub struct TemplateRenderer {
    brand: String,
    logo_path: PathBuf,
}

impl TemplateRenderer {
    pub fn new(brand: impl Into<String>, logo_path: impl Into<PathBuf>) -> Self {
        Self {
            brand: brand.into(),
            logo_path: logo_path.into(),
        }
    }

    pub fn render_welcome(&self, input: &WelcomeTemplateInput) -> Result<RenderedEmail, MailError> {
        Ok(RenderedEmail {
            html: self.welcome_html(input)?,
            text: self.welcome_text(input)?,
        })
    }

    /// Plain-text body. Values are inserted as given.
    pub fn welcome_text(&self, input: &WelcomeTemplateInput) -> Result<String, MailError> {
        let text = WelcomeText {
            brand: &self.brand,
            user_name: &input.user_name,
            email: &input.email,
            password: &input.password,
            role: &input.role,
        }
        .render()?;
        Ok(text.trim_end().to_string())
    }

    pub fn welcome_html(&self, input: &WelcomeTemplateInput) -> Result<String, MailError> {
        let html = WelcomeHtml {
            brand: &self.brand,
            tagline: TAGLINE,
            logo: read_logo(&self.logo_path),
            monogram: monogram(&self.brand),
            user_name: &input.user_name,
            email: &input.email,
            password: &input.password,
            role: input.role.to_uppercase(),
            year: Utc::now().year(),
        }
        .render()?;
        Ok(html)
    }
}

/// HTML part. Every value except the logo data URI is escaped.
#[derive(Template)]
#[template(path = "welcome.html")]
struct WelcomeHtml<'a> {
    brand: &'a str,
    tagline: &'a str,
    /// Inline logo as a data URI; the monogram is shown when absent.
    logo: Option<String>,
    monogram: String,
    user_name: &'a str,
    email: &'a str,
    password: &'a str,
    role: String,
    year: i32,
}

#[derive(Template)]
#[template(path = "welcome.txt")]
struct WelcomeText<'a> {
    brand: &'a str,
    user_name: &'a str,
    email: &'a str,
    password: &'a str,
    role: &'a str,
}

fn read_logo(path: &Path) -> Option<String> {
    match std::fs::read(path) {
        Ok(bytes) => Some(format!("data:image/png;base64,{}", STANDARD.encode(bytes))),
        Err(err) if err.kind() == io::ErrorKind::NotFound => None,
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "Could not load logo for email");
            None
        }
    }
}

/// Capital letters of the brand ("NattyGas Lab" -> "NGL").
fn monogram(brand: &str) -> String {
    let capitals: String = brand.chars().filter(|c| c.is_uppercase()).collect();
    if capitals.is_empty() {
        brand.chars().take(1).flat_map(char::to_uppercase).collect()
    } else {
        capitals
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn input() -> WelcomeTemplateInput {
        WelcomeTemplateInput {
            user_name: "Ada Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            password: "Temp-1234".to_string(),
            role: "technician".to_string(),
        }
    }

    fn renderer_without_logo() -> TemplateRenderer {
        TemplateRenderer::new("NattyGas Lab", "/nonexistent/images/logo.png")
    }

    #[test]
    fn test_html_contains_fields() {
        let html = renderer_without_logo().welcome_html(&input()).unwrap();

        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("Hello Ada Lovelace!"));
        assert!(html.contains("ada@example.com"));
        assert!(html.contains("Temp-1234"));
        assert!(html.contains("<strong>TECHNICIAN</strong>"));
        assert!(html.contains("Getting Started"));
        assert!(html.contains("Important Security Notice"));
        assert!(html.contains(&format!("&copy; {} NattyGas Lab", Utc::now().year())));
    }

    #[test]
    fn test_text_contains_fields() {
        let text = renderer_without_logo().welcome_text(&input()).unwrap();

        assert!(text.starts_with("Welcome to NattyGas Lab!"));
        assert!(text.contains("Ada Lovelace"));
        assert!(text.contains("Email: ada@example.com"));
        assert!(text.contains("Password: Temp-1234"));
        assert!(text.contains("Role: technician"));
        assert!(text.ends_with("Please change your password after first login."));
    }

    #[test]
    fn test_missing_logo_falls_back_to_monogram() {
        let html = renderer_without_logo().welcome_html(&input()).unwrap();

        assert!(html.contains(r#"<div class="logo-placeholder">NGL</div>"#));
        assert!(!html.contains("data:image/png;base64,"));
    }

    #[test]
    fn test_logo_is_inlined_when_present() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logo.png");
        fs::write(&path, b"\x89PNG fake").unwrap();

        let html = TemplateRenderer::new("NattyGas Lab", &path).welcome_html(&input()).unwrap();

        let expected = format!("data:image/png;base64,{}", STANDARD.encode(b"\x89PNG fake"));
        assert!(html.contains(&expected));
        assert!(html.contains(r#"alt="NattyGas Lab Logo""#));
        assert!(!html.contains("logo-placeholder\">"));
    }

    #[test]
    fn test_user_values_are_escaped_in_html_only() {
        let mut hostile = input();
        hostile.user_name = "<script>alert('x')</script>".to_string();
        hostile.password = "a&b\"c".to_string();

        let rendered = renderer_without_logo().render_welcome(&hostile).unwrap();

        assert!(!rendered.html.contains("<script>"));
        assert!(rendered.html.contains("&lt;script&gt;alert("));
        assert!(rendered.html.contains("a&amp;b"));
        assert!(!rendered.html.contains("b\"c"));
        assert!(rendered.text.contains("<script>alert('x')</script>"));
    }

    #[test]
    fn test_same_input_same_output() {
        let renderer = renderer_without_logo();
        assert_eq!(
            renderer.render_welcome(&input()).unwrap(),
            renderer.render_welcome(&input()).unwrap()
        );
    }

    #[test]
    fn test_monogram() {
        assert_eq!(monogram("NattyGas Lab"), "NGL");
        assert_eq!(monogram("acme"), "A");
        assert_eq!(monogram(""), "");
    }
}
