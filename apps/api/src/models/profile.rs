use serde::{Deserialize, Serialize};

/// Minimum resume length (in chars) before its text is worth sending as grounding.
const MIN_RESUME_CONTENT_LEN: usize = 5;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Experience {
    pub id: String,
    pub company: String,
    pub title: String,
    pub start_date: String,
    pub end_date: String,
    pub description: String,
    pub current: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Education {
    pub id: String,
    pub institution: String,
    pub degree: String,
    pub major: String,
    pub graduation_date: String,
}

/// A user-defined `{label, value}` override, checked after the built-in rules
/// and before any generative call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CustomField {
    pub id: String,
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Resume {
    pub id: String,
    pub name: String,
    /// Raw text content.
    pub content: String,
    pub is_active: bool,
}

/// The stored personal profile. Supplied fully materialized by the caller.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserProfile {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub linkedin: String,
    pub portfolio: String,
    pub location: String,

    pub current_title: String,
    pub years_of_experience: f64,
    pub expected_salary: String,
    pub notice_period: String,

    pub experience: Vec<Experience>,
    pub education: Vec<Education>,
    pub skills: Vec<String>,
    pub custom_fields: Vec<CustomField>,

    pub resumes: Vec<Resume>,
}

impl UserProfile {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    /// The resume whose text grounds generative answers. At most one is active.
    pub fn active_resume(&self) -> Option<&Resume> {
        self.resumes.iter().find(|r| r.is_active)
    }

    /// True when an active resume carries enough text to extract facts from.
    pub fn has_usable_resume(&self) -> bool {
        self.active_resume()
            .map(|r| r.content.trim().chars().count() > MIN_RESUME_CONTENT_LEN)
            .unwrap_or(false)
    }

    /// Makes `id` the only active resume. Unknown ids leave the profile untouched.
    pub fn set_active_resume(&mut self, id: &str) -> bool {
        if !self.resumes.iter().any(|r| r.id == id) {
            return false;
        }
        for resume in &mut self.resumes {
            resume.is_active = resume.id == id;
        }
        true
    }

    /// Appends a resume. Only the first resume added to an empty list starts active.
    pub fn add_resume(
        &mut self,
        id: impl Into<String>,
        name: impl Into<String>,
        content: impl Into<String>,
    ) {
        let is_active = self.resumes.is_empty();
        self.resumes.push(Resume {
            id: id.into(),
            name: name.into(),
            content: content.into(),
            is_active,
        });
    }

    /// Company of the first listed work-experience entry.
    pub fn latest_company(&self) -> Option<&str> {
        self.experience
            .first()
            .map(|e| e.company.as_str())
            .filter(|c| !c.is_empty())
    }

    /// Plain-text profile summary used as grounding context for generation.
    pub fn summary_text(&self) -> String {
        let education = self
            .education
            .iter()
            .map(|e| format!("{} from {}", e.degree, e.institution))
            .collect::<Vec<_>>()
            .join(", ");

        let custom_details = self
            .custom_fields
            .iter()
            .map(|f| format!("{}: {}", f.label, f.value))
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            "Name: {name}\n\
             Email: {email}\n\
             Phone: {phone}\n\
             Location: {location}\n\
             LinkedIn: {linkedin}\n\
             Portfolio: {portfolio}\n\
             Title: {title}\n\
             Experience: {years} years\n\
             Skills: {skills}\n\
             Education: {education}\n\
             \n\
             Additional Details (High Priority):\n\
             {custom_details}",
            name = self.full_name(),
            email = self.email,
            phone = self.phone,
            location = self.location,
            linkedin = self.linkedin,
            portfolio = self.portfolio,
            title = self.current_title,
            years = self.years_of_experience,
            skills = self.skills.join(", "),
        )
    }
}
