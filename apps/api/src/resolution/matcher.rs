//! Stage 1: deterministic matching of field labels against profile data.
//!
//! Pure: no I/O, no generative calls. Built-in rules are tried in order and the
//! first rule whose pattern matches decides the profile attribute. If that rule
//! yields nothing, custom fields are searched for a label contained in the
//! field label.

use crate::models::{DetectedField, UserProfile};
use crate::scanner::label::clean_label;

/// Lowercased, marker-free, whitespace-collapsed label. Idempotent.
pub fn normalize_label(raw: &str) -> String {
    clean_label(raw).to_lowercase()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileAttr {
    FirstName,
    LastName,
    FullName,
    Email,
    Phone,
    LinkedIn,
    Portfolio,
    Location,
    Salary,
    JobTitle,
    Company,
}

impl ProfileAttr {
    fn value(self, profile: &UserProfile) -> String {
        match self {
            ProfileAttr::FirstName => profile.first_name.clone(),
            ProfileAttr::LastName => profile.last_name.clone(),
            ProfileAttr::FullName => profile.full_name(),
            ProfileAttr::Email => profile.email.clone(),
            ProfileAttr::Phone => profile.phone.clone(),
            ProfileAttr::LinkedIn => profile.linkedin.clone(),
            ProfileAttr::Portfolio => profile.portfolio.clone(),
            ProfileAttr::Location => profile.location.clone(),
            ProfileAttr::Salary => profile.expected_salary.clone(),
            ProfileAttr::JobTitle => profile.current_title.clone(),
            ProfileAttr::Company => profile.latest_company().unwrap_or_default().to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Pattern {
    /// Label equals one of these.
    Exact(&'static [&'static str]),
    /// Label contains one of these.
    Contains(&'static [&'static str]),
    /// Label contains `needle` but none of `unless`.
    ContainsUnless {
        needle: &'static str,
        unless: &'static str,
    },
}

impl Pattern {
    fn matches(self, label: &str) -> bool {
        match self {
            Pattern::Exact(options) => options.contains(&label),
            Pattern::Contains(needles) => needles.iter().any(|n| label.contains(n)),
            Pattern::ContainsUnless { needle, unless } => {
                label.contains(needle) && !label.contains(unless)
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct MatchRule {
    pattern: Pattern,
    attr: ProfileAttr,
}

const RULES: &[MatchRule] = &[
    MatchRule {
        pattern: Pattern::Exact(&["first name", "firstname"]),
        attr: ProfileAttr::FirstName,
    },
    MatchRule {
        pattern: Pattern::Exact(&["last name", "lastname"]),
        attr: ProfileAttr::LastName,
    },
    MatchRule {
        pattern: Pattern::Exact(&["full name", "fullname", "name"]),
        attr: ProfileAttr::FullName,
    },
    MatchRule {
        pattern: Pattern::Contains(&["email", "e-mail"]),
        attr: ProfileAttr::Email,
    },
    MatchRule {
        pattern: Pattern::Contains(&["phone", "mobile"]),
        attr: ProfileAttr::Phone,
    },
    MatchRule {
        pattern: Pattern::Contains(&["linkedin"]),
        attr: ProfileAttr::LinkedIn,
    },
    MatchRule {
        pattern: Pattern::Contains(&["portfolio", "website"]),
        attr: ProfileAttr::Portfolio,
    },
    MatchRule {
        pattern: Pattern::Exact(&["location", "city", "address", "current location"]),
        attr: ProfileAttr::Location,
    },
    MatchRule {
        pattern: Pattern::Contains(&["salary"]),
        attr: ProfileAttr::Salary,
    },
    MatchRule {
        pattern: Pattern::Contains(&["job title"]),
        attr: ProfileAttr::JobTitle,
    },
    // A bare "company" means the current employer; "company name" is usually
    // asked about the hiring company and left to the fallback.
    MatchRule {
        pattern: Pattern::ContainsUnless {
            needle: "company",
            unless: "name",
        },
        attr: ProfileAttr::Company,
    },
];

/// The first built-in rule whose pattern matches the normalized label.
pub fn rule_for(normalized: &str) -> Option<ProfileAttr> {
    RULES
        .iter()
        .find(|r| r.pattern.matches(normalized))
        .map(|r| r.attr)
}

/// Resolves one label to a profile value. `None` when nothing matched or the
/// matched profile attribute is empty.
pub fn deterministic_value(label: &str, profile: &UserProfile) -> Option<String> {
    let normalized = normalize_label(label);

    let from_rule = rule_for(&normalized)
        .map(|attr| attr.value(profile))
        .filter(|v| !v.trim().is_empty());
    if from_rule.is_some() {
        return from_rule;
    }

    profile
        .custom_fields
        .iter()
        .filter(|cf| !cf.value.trim().is_empty())
        .find(|cf| {
            let custom_label = normalize_label(&cf.label);
            !custom_label.is_empty() && normalized.contains(&custom_label)
        })
        .map(|cf| cf.value.clone())
}

/// Annotates every field with its deterministic match, resetting any earlier
/// prediction. Matched fields get `confidence = 1`.
pub fn match_fields(fields: Vec<DetectedField>, profile: &UserProfile) -> Vec<DetectedField> {
    fields
        .into_iter()
        .map(|mut field| {
            let value = deterministic_value(&field.name, profile);
            field.confidence = u8::from(value.is_some());
            field.predicted_value = value;
            field.is_ai_generated = None;
            field
        })
        .collect()
}
