//! The specialist answering pipeline: retrieval, grounded generation and
//! answer post-processing.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use konsilium_core::{ChatMessage, GenerationOptions};
use konsilium_knowledge::{KnowledgeEngine, KnowledgeError};

use super::categorize::{GENERIC_HEADER, categorize};
use super::profiles::SpecialistProfile;
use crate::providers::{Provider, ProviderError};

/// Fixed disclaimer appended to every medical answer.
pub const DISCLAIMER: &str = "\n\n⚠️ **Medical disclaimer**: This information \
is provided for educational purposes only. Always consult a qualified \
healthcare professional for diagnosis and treatment decisions.";

pub const EMPTY_QUESTION_REPLY: &str = "Please provide a question.";

/// Where a specialist gets its grounding context from. The production
/// implementation searches the guideline index; tests substitute stubs.
#[async_trait]
pub trait ContextSource: Send + Sync {
    async fn build_context(&self, question: &str) -> Result<String, KnowledgeError>;
}

/// Index-backed context source, pinned to one domain tag.
pub struct GuidelineRetriever {
    engine: Arc<KnowledgeEngine>,
    domain: String,
}

impl GuidelineRetriever {
    pub fn new(engine: Arc<KnowledgeEngine>, domain: impl Into<String>) -> Self {
        Self {
            engine,
            domain: domain.into(),
        }
    }
}

#[async_trait]
impl ContextSource for GuidelineRetriever {
    async fn build_context(&self, question: &str) -> Result<String, KnowledgeError> {
        self.engine.build_context(question, &self.domain).await
    }
}

/// One domain specialist: persona prompt, retrieval source and the shared
/// generation provider.
pub struct SpecialistAgent {
    profile: SpecialistProfile,
    provider: Arc<dyn Provider>,
    retriever: Arc<dyn ContextSource>,
    options: GenerationOptions,
    disclaimer_on_error: bool,
}

impl SpecialistAgent {
    pub fn new(
        profile: SpecialistProfile,
        provider: Arc<dyn Provider>,
        retriever: Arc<dyn ContextSource>,
        options: GenerationOptions,
        disclaimer_on_error: bool,
    ) -> Self {
        Self {
            profile,
            provider,
            retriever,
            options,
            disclaimer_on_error,
        }
    }

    pub fn key(&self) -> &str {
        self.profile.key
    }

    pub fn display_name(&self) -> &str {
        self.profile.display_name
    }

    pub fn domain(&self) -> &str {
        self.profile.domain
    }

    /// Produce a formatted answer. Never fails: provider and retrieval
    /// errors are folded into a readable answer so one specialist's outage
    /// cannot abort a multi-specialist consultation.
    pub async fn answer(&self, question: &str) -> String {
        if question.trim().is_empty() {
            return EMPTY_QUESTION_REPLY.to_string();
        }

        let context = match self.retriever.build_context(question).await {
            Ok(context) => {
                if context.is_empty() {
                    info!("No relevant context found in {} guidelines", self.profile.key);
                } else {
                    info!("Retrieved context from {} guidelines", self.profile.key);
                }
                context
            }
            Err(e) => {
                warn!("Context retrieval failed for {}: {e}", self.profile.key);
                String::new()
            }
        };

        let user_message = if context.is_empty() {
            format!("Question: {question}\n\nProvide a comprehensive, evidence-based medical response:")
        } else {
            format!(
                "{context}\n\nQuestion: {question}\n\nBased on the guideline \
                 excerpts above, provide a comprehensive medical response:"
            )
        };

        match self
            .provider
            .generate(
                Some(self.profile.system_prompt),
                &[ChatMessage::user(user_message)],
                &self.options,
            )
            .await
        {
            Ok(answer) => {
                let header = categorize(question, self.profile.rules);
                format!("{header}\n\n{answer}{DISCLAIMER}")
            }
            Err(e) => self.failure_answer(&e),
        }
    }

    /// Failure text is wrapped with the generic header. The disclaimer is
    /// only attached when configured: it belongs to medical content, not to
    /// error messages.
    fn failure_answer(&self, err: &ProviderError) -> String {
        warn!("{} generation failed: {err}", self.profile.display_name);
        let reason = if err.is_connectivity() {
            format!(
                "{} cannot reach its language model right now: {err}",
                self.profile.display_name
            )
        } else {
            format!(
                "{} failed to generate a response: {err}",
                self.profile.display_name
            )
        };

        let mut answer = format!("{GENERIC_HEADER}\n\n{reason}");
        if self.disclaimer_on_error {
            answer.push_str(DISCLAIMER);
        }
        answer
    }
}
