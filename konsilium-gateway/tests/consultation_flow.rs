use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use konsilium_core::{ChatMessage, GenerationOptions};
use konsilium_knowledge::KnowledgeError;

use konsilium_gateway::orchestrator::{
    ConsultationStatus, Orchestrator, SYNTHESIS_FALLBACK, SpecialistOutcome,
};
use konsilium_gateway::providers::{Provider, ProviderError};
use konsilium_gateway::specialists::{
    ContextSource, DISCLAIMER, EMPTY_QUESTION_REPLY, GENERIC_HEADER, SpecialistAgent, profiles,
};

struct FixedProvider {
    reply: &'static str,
}

#[async_trait]
impl Provider for FixedProvider {
    fn name(&self) -> &str {
        "fixed"
    }
    fn model(&self) -> &str {
        "fixed"
    }
    async fn generate(
        &self,
        _system: Option<&str>,
        _messages: &[ChatMessage],
        _options: &GenerationOptions,
    ) -> Result<String, ProviderError> {
        Ok(self.reply.to_string())
    }
    async fn health(&self) -> Result<(), ProviderError> {
        Ok(())
    }
}

struct FailingProvider;

#[async_trait]
impl Provider for FailingProvider {
    fn name(&self) -> &str {
        "failing"
    }
    fn model(&self) -> &str {
        "failing"
    }
    async fn generate(
        &self,
        _system: Option<&str>,
        _messages: &[ChatMessage],
        _options: &GenerationOptions,
    ) -> Result<String, ProviderError> {
        Err(ProviderError::Api {
            status: 500,
            message: "model exploded".to_string(),
        })
    }
    async fn health(&self) -> Result<(), ProviderError> {
        Err(ProviderError::NoContent)
    }
}

/// Simulates a provider call that outlives the specialist timeout.
struct HangingProvider;

#[async_trait]
impl Provider for HangingProvider {
    fn name(&self) -> &str {
        "hanging"
    }
    fn model(&self) -> &str {
        "hanging"
    }
    async fn generate(
        &self,
        _system: Option<&str>,
        _messages: &[ChatMessage],
        _options: &GenerationOptions,
    ) -> Result<String, ProviderError> {
        tokio::time::sleep(Duration::from_secs(5)).await;
        Ok("too late".to_string())
    }
    async fn health(&self) -> Result<(), ProviderError> {
        Ok(())
    }
}

struct StubContext {
    context: &'static str,
}

#[async_trait]
impl ContextSource for StubContext {
    async fn build_context(&self, _question: &str) -> Result<String, KnowledgeError> {
        Ok(self.context.to_string())
    }
}

struct FailingContext;

#[async_trait]
impl ContextSource for FailingContext {
    async fn build_context(&self, _question: &str) -> Result<String, KnowledgeError> {
        Err(KnowledgeError::Embedding("embedder down".to_string()))
    }
}

fn agent(provider: Arc<dyn Provider>, retriever: Arc<dyn ContextSource>) -> SpecialistAgent {
    SpecialistAgent::new(
        profiles::bladder(),
        provider,
        retriever,
        GenerationOptions::default(),
        false,
    )
}

fn grounded() -> Arc<dyn ContextSource> {
    Arc::new(StubContext {
        context: "Based on the following medical guidelines:\n\n[Reference 1 - x.txt, page 3]:\nBCG.",
    })
}

fn ungrounded() -> Arc<dyn ContextSource> {
    Arc::new(StubContext { context: "" })
}

#[tokio::test]
async fn blank_question_short_circuits() {
    // A provider that would fail proves neither retrieval nor generation
    // ran.
    let agent = agent(Arc::new(FailingProvider), Arc::new(FailingContext));
    assert_eq!(agent.answer("   ").await, EMPTY_QUESTION_REPLY);
    assert_eq!(agent.answer("").await, EMPTY_QUESTION_REPLY);
}

#[tokio::test]
async fn every_successful_answer_ends_with_the_disclaimer() {
    let agent = agent(Arc::new(FixedProvider { reply: "An answer." }), grounded());

    for question in [
        "What are the symptoms?",            // diagnosis
        "Is BCG therapy effective?",         // treatment
        "How can I lower my risk?",          // prevention
        "Tell me something about bladders.", // generic
    ] {
        let answer = agent.answer(question).await;
        assert!(
            answer.ends_with(DISCLAIMER),
            "missing disclaimer for {question:?}"
        );
        assert!(answer.contains("An answer."));
    }
}

#[tokio::test]
async fn category_header_prefixes_the_answer() {
    let agent = agent(Arc::new(FixedProvider { reply: "An answer." }), grounded());
    let answer = agent.answer("Is BCG therapy effective?").await;
    assert!(answer.starts_with("💊 **Treatment Information**"));
}

#[tokio::test]
async fn failure_answers_carry_the_generic_header_but_no_disclaimer() {
    let agent = agent(Arc::new(FailingProvider), grounded());
    let answer = agent.answer("Is BCG therapy effective?").await;

    assert!(answer.starts_with(GENERIC_HEADER));
    assert!(answer.contains("model exploded"));
    assert!(
        !answer.ends_with(DISCLAIMER),
        "error text is not medical content"
    );
}

#[tokio::test]
async fn disclaimer_on_error_is_a_configuration_point() {
    let agent = SpecialistAgent::new(
        profiles::bladder(),
        Arc::new(FailingProvider),
        grounded(),
        GenerationOptions::default(),
        true,
    );
    let answer = agent.answer("Is BCG therapy effective?").await;
    assert!(answer.ends_with(DISCLAIMER));
}

#[tokio::test]
async fn empty_retrieval_still_produces_a_grounded_looking_answer() {
    let agent = agent(Arc::new(FixedProvider { reply: "Ungrounded answer." }), ungrounded());
    let answer = agent.answer("What are the symptoms?").await;
    assert!(!answer.is_empty());
    assert!(answer.contains("Ungrounded answer."));
    assert!(answer.ends_with(DISCLAIMER));
}

#[tokio::test]
async fn retrieval_failure_degrades_to_ungrounded_generation() {
    let agent = agent(
        Arc::new(FixedProvider { reply: "Still answered." }),
        Arc::new(FailingContext),
    );
    let answer = agent.answer("What are the symptoms?").await;
    assert!(answer.contains("Still answered."));
    assert!(answer.ends_with(DISCLAIMER));
}

#[tokio::test]
async fn one_specialist_timing_out_never_affects_its_sibling() {
    let slow = Arc::new(SpecialistAgent::new(
        profiles::bladder(),
        Arc::new(HangingProvider),
        ungrounded(),
        GenerationOptions::default(),
        false,
    ));
    let fast = Arc::new(SpecialistAgent::new(
        profiles::prostate(),
        Arc::new(FixedProvider { reply: "Prostate answer." }),
        ungrounded(),
        GenerationOptions::default(),
        false,
    ));

    let orchestrator = Orchestrator::new(
        Arc::new(FixedProvider { reply: "Combined summary." }),
        vec![slow, fast],
        Duration::from_millis(100),
        GenerationOptions::default(),
    );

    let consultation = orchestrator.consult("Blood in urine, what now?").await;
    assert_eq!(consultation.reports.len(), 2);

    let bladder = &consultation.reports[0];
    assert_eq!(bladder.specialist, "bladder");
    match &bladder.outcome {
        SpecialistOutcome::Failed { error } => assert!(error.contains("timed out")),
        SpecialistOutcome::Answered { .. } => panic!("slow specialist should time out"),
    }

    let prostate = &consultation.reports[1];
    match &prostate.outcome {
        SpecialistOutcome::Answered { answer } => assert!(answer.contains("Prostate answer.")),
        SpecialistOutcome::Failed { error } => panic!("fast specialist failed: {error}"),
    }

    // A partial specialist failure is not a consultation failure.
    assert_eq!(consultation.status, ConsultationStatus::Complete);
    assert_eq!(consultation.synthesis, "Combined summary.");
}

#[tokio::test]
async fn failed_synthesis_still_returns_individual_answers() {
    let specialists = vec![
        Arc::new(SpecialistAgent::new(
            profiles::bladder(),
            Arc::new(FixedProvider { reply: "Bladder answer." }),
            ungrounded(),
            GenerationOptions::default(),
            false,
        )),
        Arc::new(SpecialistAgent::new(
            profiles::prostate(),
            Arc::new(FixedProvider { reply: "Prostate answer." }),
            ungrounded(),
            GenerationOptions::default(),
            false,
        )),
    ];

    let orchestrator = Orchestrator::new(
        Arc::new(FailingProvider),
        specialists,
        Duration::from_secs(5),
        GenerationOptions::default(),
    );

    let consultation = orchestrator.consult("Blood in urine, what now?").await;
    assert_eq!(consultation.status, ConsultationStatus::Partial);
    assert_eq!(consultation.synthesis, SYNTHESIS_FALLBACK);
    assert!(consultation.reports.iter().all(|report| matches!(
        report.outcome,
        SpecialistOutcome::Answered { .. }
    )));
}
