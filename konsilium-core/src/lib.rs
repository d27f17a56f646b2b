//! Shared configuration and message types for KONSILIUM.

pub mod config;
pub mod message;

pub use config::{
    ConfigError, ConsultationSettings, GatewaySettings, GenerationSettings, GuidelineSource,
    KnowledgeSettings, Settings, load_dotenv,
};
pub use message::{ChatMessage, GenerationOptions, MessageRole};
