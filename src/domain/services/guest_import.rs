use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid")
});

static PHONE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\+?[\d\s\-()]+$").expect("phone pattern is valid")
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportedGuest {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// Every problem found in a batch, one `Line N: ...` entry per offending line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportError {
    pub errors: Vec<String>,
}

impl fmt::Display for ImportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.errors.join("; "))
    }
}

impl std::error::Error for ImportError {}

pub fn is_valid_email(value: &str) -> bool {
    EMAIL_RE.is_match(value)
}

/// Accepts `+`, digits, spaces, hyphens and parentheses, with at least one digit.
pub fn is_valid_phone(value: &str) -> bool {
    PHONE_RE.is_match(value) && value.chars().any(|c| c.is_ascii_digit())
}

fn looks_like_phone(token: &str) -> bool {
    token.chars().all(|c| c.is_ascii_digit() || matches!(c, '+' | ' ' | '-' | '(' | ')'))
}

/// Parses pasted or uploaded `name, contact, contact` lines.
///
/// Blank lines are skipped and do not count toward line numbers. Either the
/// whole batch parses or every error is reported together.
pub fn parse_guests(input: &str) -> Result<Vec<ImportedGuest>, ImportError> {
    let mut guests = Vec::new();
    let mut errors = Vec::new();

    for (index, line) in input.lines().map(str::trim).filter(|l| !l.is_empty()).enumerate() {
        let line_no = index + 1;
        match parse_line(line) {
            Ok(guest) => guests.push(guest),
            Err(message) => errors.push(format!("Line {}: {}", line_no, message)),
        }
    }

    if errors.is_empty() {
        Ok(guests)
    } else {
        Err(ImportError { errors })
    }
}

fn parse_line(line: &str) -> Result<ImportedGuest, String> {
    let mut tokens = line.split(',').map(str::trim);
    let name = tokens.next().unwrap_or_default().to_string();

    let mut email = None;
    let mut phone = None;
    let mut unrecognized = None;

    for token in tokens.take(2).filter(|t| !t.is_empty()) {
        if token.contains('@') {
            email = Some(token.to_string());
        } else if looks_like_phone(token) {
            phone = Some(token.to_string());
        } else {
            unrecognized = Some(token.to_string());
        }
    }

    if name.is_empty() {
        return Err("Name is required".to_string());
    }

    // an unclassifiable token with no usable contact is reported as a bad email
    if email.is_none() && phone.is_none() {
        if let Some(token) = unrecognized {
            return Err(format!("Invalid email '{}'", token));
        }
        return Err("Email or phone is required".to_string());
    }

    if let Some(email) = &email {
        if !is_valid_email(email) {
            return Err(format!("Invalid email '{}'", email));
        }
    }

    if let Some(phone) = &phone {
        if !is_valid_phone(phone) {
            return Err(format!("Invalid phone '{}'", phone));
        }
    }

    Ok(ImportedGuest { name, email, phone })
}
