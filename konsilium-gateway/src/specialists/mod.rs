pub mod agent;
pub mod categorize;
pub mod profiles;

pub use agent::{
    ContextSource, DISCLAIMER, EMPTY_QUESTION_REPLY, GuidelineRetriever, SpecialistAgent,
};
pub use categorize::{CategoryRule, GENERIC_HEADER, categorize};
pub use profiles::{SpecialistProfile, builtin_profiles};
