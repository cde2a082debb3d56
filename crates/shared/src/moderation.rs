//! Content classification for outgoing messages.
//!
//! Rules are evaluated in priority order and the first match decides the
//! outcome. Patterns are case-insensitive and anchored on word boundaries
//! so that short tokens do not fire inside longer words ("emailed" is not
//! "email").

use std::sync::LazyLock;

use regex_lite::Regex;

use crate::models::{Action, Classification};

pub const REASON_EXTERNAL_PAYMENT: &str = "External payment methods not allowed";
pub const REASON_EXTERNAL_PLATFORM: &str = "External communication platforms not allowed";
pub const REASON_CONTACT_INFO: &str = "Sharing external contact information not allowed";
pub const REASON_PHONE_NUMBER: &str = "Sharing phone numbers not allowed";
pub const REASON_PROMOTIONAL: &str = "Suspicious promotional content";

/// A compiled pattern with the action it triggers.
#[derive(Debug, Clone)]
pub struct Rule {
    regex: Regex,
    action: Action,
    reason: String,
}

impl Rule {
    pub fn new(pattern: &str, action: Action, reason: impl Into<String>) -> Result<Self, regex_lite::Error> {
        Ok(Self {
            regex: Regex::new(pattern)?,
            action,
            reason: reason.into(),
        })
    }

    pub fn action(&self) -> Action {
        self.action
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }

    pub fn matches(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }

    fn outcome(&self) -> Classification {
        match self.action {
            Action::None => Classification::clean(),
            Action::Warn => Classification {
                allowed: true,
                warning: Some(self.reason.clone()),
                action: Action::Warn,
            },
            Action::Block => Classification {
                allowed: false,
                warning: Some(self.reason.clone()),
                action: Action::Block,
            },
        }
    }
}

// Ten or more digits, allowing common separators between them.
const LONG_DIGITS: &str = r"(?:\d[\s().\-]{0,2}){9}\d";
const ADDRESS: &str = r"[\w.+\-]*@[\w\-]+";

// `s` lets the context windows span line breaks.
static DEFAULT_MODERATOR: LazyLock<Moderator> = LazyLock::new(|| {
    Moderator::new(vec![
        rule(
            r"(?i)\b(?:pay\s*pal|western\s+union|money\s*transfers?|wire\s+transfers?|venmo|cash\s*app|zelle)\b",
            Action::Block,
            REASON_EXTERNAL_PAYMENT,
        ),
        rule(
            r"(?i)\b(?:whats\s*app|telegram|skype|discord|signal\s+app)\b",
            Action::Warn,
            REASON_EXTERNAL_PLATFORM,
        ),
        rule(
            &format!(r"(?is)\be-?mail\b.{{0,40}}{ADDRESS}|{ADDRESS}.{{0,40}}\be-?mail\b"),
            Action::Block,
            REASON_CONTACT_INFO,
        ),
        rule(
            &format!(r"(?is)\bphone\b.{{0,40}}{LONG_DIGITS}|{LONG_DIGITS}.{{0,40}}\bphone\b"),
            Action::Block,
            REASON_PHONE_NUMBER,
        ),
        rule(
            r"(?is)\bfree\b.{0,30}\btrials?\b",
            Action::Warn,
            REASON_PROMOTIONAL,
        ),
    ])
});

fn rule(pattern: &str, action: Action, reason: &str) -> Rule {
    match Rule::new(pattern, action, reason) {
        Ok(rule) => rule,
        Err(e) => panic!("invalid built-in moderation pattern {pattern:?}: {e}"),
    }
}

/// An ordered rule table.
#[derive(Debug, Clone)]
pub struct Moderator {
    rules: Vec<Rule>,
}

impl Default for Moderator {
    fn default() -> Self {
        DEFAULT_MODERATOR.clone()
    }
}

impl Moderator {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// First matching rule wins; later rules are not consulted.
    pub fn classify(&self, text: &str) -> Classification {
        self.rules
            .iter()
            .find(|r| r.matches(text))
            .map(Rule::outcome)
            .unwrap_or_else(Classification::clean)
    }

    /// Checks every rule and reports the most severe action. Among rules of
    /// equal severity the earlier one supplies the reason.
    pub fn classify_strictest(&self, text: &str) -> Classification {
        let mut strictest: Option<&Rule> = None;
        for rule in self.rules.iter().filter(|r| r.matches(text)) {
            match strictest {
                Some(current) if current.action >= rule.action => {}
                _ => strictest = Some(rule),
            }
        }
        strictest
            .map(Rule::outcome)
            .unwrap_or_else(Classification::clean)
    }
}

/// Classify with the built-in rule table.
pub fn classify(text: &str) -> Classification {
    DEFAULT_MODERATOR.classify(text)
}
