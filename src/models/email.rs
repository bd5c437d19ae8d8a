use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::de::{self, Deserializer, IgnoredAny, MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::mail::WelcomeTemplateInput;

pub const MISSING_FIELDS: &str = "Missing required fields: to, subject";
pub const INVALID_ADDRESS: &str = "Invalid email address";
pub const MISSING_USER_DATA: &str =
    "Missing required userData fields: userName, email, password, role";

static ADDRESS_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("address pattern is valid")
});

/// `local@domain.tld` with no whitespace and a single `@`.
pub fn is_valid_address(address: &str) -> bool {
    ADDRESS_PATTERN.is_match(address)
}

/// Template selector carried in the `type` field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailKind {
    Welcome,
    Other,
}

impl EmailKind {
    pub fn from_name(name: &str) -> Self {
        match name {
            "welcome" => EmailKind::Welcome,
            _ => EmailKind::Other,
        }
    }
}

/// Account details for the welcome template
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserData {
    #[serde(default, deserialize_with = "loose_string")]
    pub user_name: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub password: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub role: Option<String>,
}

impl UserData {
    fn into_template_input(self) -> Result<WelcomeTemplateInput> {
        match (
            present(self.user_name),
            present(self.email),
            present(self.password),
            present(self.role),
        ) {
            (Some(user_name), Some(email), Some(password), Some(role)) => {
                Ok(WelcomeTemplateInput {
                    user_name,
                    email,
                    password,
                    role,
                })
            }
            _ => Err(AppError::BadRequest(MISSING_USER_DATA.to_string())),
        }
    }
}

/// Body of `POST /api/send-email`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailRequest {
    #[serde(default, deserialize_with = "loose_string")]
    pub to: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub subject: Option<String>,
    pub text: Option<String>,
    pub html: Option<String>,
    #[serde(rename = "type", default, deserialize_with = "loose_kind")]
    pub kind: Option<EmailKind>,
    pub user_data: Option<UserData>,
}

/// What goes into the mail body once the request is accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmailContent {
    /// Caller-supplied bodies, forwarded untouched.
    Raw {
        text: Option<String>,
        html: Option<String>,
    },
    /// Rendered from the welcome template; caller bodies are discarded.
    Welcome(WelcomeTemplateInput),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedEmail {
    pub to: String,
    pub subject: String,
    pub content: EmailContent,
}

impl EmailRequest {
    /// Check required fields, then the recipient shape, then welcome data.
    pub fn validate(self) -> Result<ValidatedEmail> {
        let (to, subject) = match (present(self.to), present(self.subject)) {
            (Some(to), Some(subject)) => (to, subject),
            _ => return Err(AppError::BadRequest(MISSING_FIELDS.to_string())),
        };

        if !is_valid_address(&to) {
            return Err(AppError::BadRequest(INVALID_ADDRESS.to_string()));
        }

        let content = match (self.kind, self.user_data) {
            (Some(EmailKind::Welcome), Some(user)) => {
                EmailContent::Welcome(user.into_template_input()?)
            }
            _ => EmailContent::Raw {
                text: self.text,
                html: self.html,
            },
        };

        Ok(ValidatedEmail {
            to,
            subject,
            content,
        })
    }
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Stand-in for objects and arrays sent where a string belongs. It never
/// passes the address check.
const CONTAINER_PLACEHOLDER: &str = "[object Object]";

/// Read any value where a string is expected so validation, not the body
/// extractor, decides the outcome. Null, `false`, zero and empty strings are
/// absent; other scalars become their text form.
fn loose_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_any(LooseStringVisitor)
}

fn loose_kind<'de, D>(deserializer: D) -> std::result::Result<Option<EmailKind>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(loose_string(deserializer)?.map(|name| EmailKind::from_name(&name)))
}

struct LooseStringVisitor;

impl<'de> Visitor<'de> for LooseStringVisitor {
    type Value = Option<String>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("any value")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<Self::Value, E> {
        Ok(Some(v.to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> std::result::Result<Self::Value, E> {
        Ok(Some(v))
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> std::result::Result<Self::Value, E> {
        Ok(v.then(|| "true".to_string()))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<Self::Value, E> {
        Ok((v != 0).then(|| v.to_string()))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<Self::Value, E> {
        Ok((v != 0).then(|| v.to_string()))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> std::result::Result<Self::Value, E> {
        Ok((v != 0.0 && !v.is_nan()).then(|| v.to_string()))
    }

    fn visit_none<E: de::Error>(self) -> std::result::Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_unit<E: de::Error>(self) -> std::result::Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_some<D>(self, deserializer: D) -> std::result::Result<Self::Value, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(self)
    }

    fn visit_seq<A>(self, mut seq: A) -> std::result::Result<Self::Value, A::Error>
    where
        A: SeqAccess<'de>,
    {
        while seq.next_element::<IgnoredAny>()?.is_some() {}
        Ok(Some(CONTAINER_PLACEHOLDER.to_string()))
    }

    fn visit_map<A>(self, mut map: A) -> std::result::Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        while map.next_entry::<IgnoredAny, IgnoredAny>()?.is_some() {}
        Ok(Some(CONTAINER_PLACEHOLDER.to_string()))
    }
}

/// Response after a successful send
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendEmailResponse {
    pub success: bool,
    pub message: String,
    pub message_id: String,
    pub timestamp: String,
}
