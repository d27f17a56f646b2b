use std::sync::Arc;
use std::time::Duration;

use konsilium_core::{GenerationOptions, Settings};
use konsilium_knowledge::KnowledgeEngine;

use crate::consultations::ConsultationLog;
use crate::orchestrator::Orchestrator;
use crate::providers::Provider;
use crate::specialists::{GuidelineRetriever, SpecialistAgent, builtin_profiles};

/// Shared application state. Everything is constructed explicitly here and
/// handed to the router; there are no lazily-initialized globals.
pub struct AppState {
    pub settings: Settings,
    pub provider: Arc<dyn Provider>,
    pub knowledge: Arc<KnowledgeEngine>,
    pub specialists: Vec<Arc<SpecialistAgent>>,
    pub orchestrator: Orchestrator,
    pub consultations: ConsultationLog,
}

impl AppState {
    pub fn new(
        settings: Settings,
        provider: Arc<dyn Provider>,
        knowledge: Arc<KnowledgeEngine>,
    ) -> Self {
        let options = GenerationOptions {
            temperature: settings.generation.temperature,
            top_p: settings.generation.top_p,
            max_tokens: settings.generation.max_tokens,
        };

        let specialists: Vec<Arc<SpecialistAgent>> = builtin_profiles()
            .into_iter()
            .map(|profile| {
                let retriever = Arc::new(GuidelineRetriever::new(
                    Arc::clone(&knowledge),
                    profile.domain,
                ));
                Arc::new(SpecialistAgent::new(
                    profile,
                    Arc::clone(&provider),
                    retriever,
                    options.clone(),
                    settings.consultation.disclaimer_on_error,
                ))
            })
            .collect();

        let orchestrator = Orchestrator::new(
            Arc::clone(&provider),
            specialists.clone(),
            Duration::from_secs(settings.consultation.specialist_timeout_seconds),
            options,
        );

        Self {
            settings,
            provider,
            knowledge,
            specialists,
            orchestrator,
            consultations: ConsultationLog::default(),
        }
    }

    pub fn specialist(&self, key: &str) -> Option<&Arc<SpecialistAgent>> {
        self.specialists.iter().find(|agent| agent.key() == key)
    }
}
