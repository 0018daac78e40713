pub mod ai_config;
pub mod field;
pub mod handlers;
pub mod profile;

pub use ai_config::{AiConfig, TokenUsage};
pub use field::{DetectedField, FieldType};
pub use profile::UserProfile;
