use crate::config::ConfigError;
use tracing::warn;

pub const CHAT_SUFFIX: &str = "@c.us";

/// Digest recipients and the identities allowed to issue commands.
#[derive(Debug, Clone, Default)]
pub struct RecipientDirectory {
    recipients: Vec<String>,
    admins: Vec<String>,
}

impl RecipientDirectory {
    pub fn new(recipients: Vec<String>, admins: Vec<String>) -> Self {
        if admins.is_empty() {
            warn!("No authorized identities configured; inbound commands will be ignored");
        }
        Self { recipients, admins }
    }

    pub fn recipients(&self) -> &[String] {
        &self.recipients
    }

    pub fn admins(&self) -> &[String] {
        &self.admins
    }

    pub fn is_authorized(&self, sender: &str) -> bool {
        self.admins.iter().any(|admin| admin == sender)
    }

    pub fn first_admin(&self) -> Option<&str> {
        self.admins.first().map(String::as_str)
    }
}

/// Normalize a configured identity. Phone numbers may carry `+`, spaces,
/// dashes, dots or parentheses and get the chat suffix appended; values that
/// already contain `@` are taken as full identities.
pub fn normalize_identity(key: &'static str, raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim();
    if trimmed.contains('@') {
        return Ok(trimmed.to_string());
    }

    let digits: String = trimmed
        .chars()
        .filter(|c| !matches!(c, '+' | ' ' | '-' | '.' | '(' | ')'))
        .collect();

    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(ConfigError::Invalid {
            key,
            value: raw.to_string(),
            reason: "expected a phone number or a full chat id".to_string(),
        });
    }
    Ok(format!("{}{}", digits, CHAT_SUFFIX))
}

/// Parse a comma separated identity list, skipping empty items and repeats.
pub fn parse_identity_list(key: &'static str, raw: &str) -> Result<Vec<String>, ConfigError> {
    let mut identities = Vec::new();
    for item in raw.split(',').map(str::trim).filter(|item| !item.is_empty()) {
        let identity = normalize_identity(key, item)?;
        if !identities.contains(&identity) {
            identities.push(identity);
        }
    }
    Ok(identities)
}
