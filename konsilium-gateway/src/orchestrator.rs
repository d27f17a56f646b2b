//! Multi-specialist consultation: concurrent fan-out, then a synthesis pass
//! that merges every specialist's answer into one narrative.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, info};

use konsilium_core::{ChatMessage, GenerationOptions};

use crate::providers::{Provider, ProviderError};
use crate::specialists::SpecialistAgent;

pub const SYNTHESIS_FALLBACK: &str = "Synthesis is unavailable right now. \
Please refer to the individual specialist answers.";

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SpecialistOutcome {
    Answered { answer: String },
    Failed { error: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct SpecialistReport {
    pub specialist: String,
    pub display_name: String,
    #[serde(flatten)]
    pub outcome: SpecialistOutcome,
    pub elapsed_ms: u64,
    pub finished_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsultationStatus {
    /// Every stage completed, including synthesis.
    Complete,
    /// Synthesis failed; the individual answers still stand.
    Partial,
}

#[derive(Debug, Clone, Serialize)]
pub struct Consultation {
    pub question: String,
    pub reports: Vec<SpecialistReport>,
    pub synthesis: String,
    pub status: ConsultationStatus,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

pub struct Orchestrator {
    provider: Arc<dyn Provider>,
    specialists: Vec<Arc<SpecialistAgent>>,
    specialist_timeout: Duration,
    options: GenerationOptions,
}

impl Orchestrator {
    pub fn new(
        provider: Arc<dyn Provider>,
        specialists: Vec<Arc<SpecialistAgent>>,
        specialist_timeout: Duration,
        options: GenerationOptions,
    ) -> Self {
        Self {
            provider,
            specialists,
            specialist_timeout,
            options,
        }
    }

    pub fn specialists(&self) -> &[Arc<SpecialistAgent>] {
        &self.specialists
    }

    /// Fan the question out to every specialist concurrently, wait for all
    /// of them to settle, then synthesize. One specialist timing out or
    /// failing never cancels its siblings, and a failed synthesis still
    /// returns everything gathered so far.
    pub async fn consult(&self, question: &str) -> Consultation {
        let started_at = Utc::now();
        info!("Consultation started: {}", preview(question));

        let handles: Vec<_> = self
            .specialists
            .iter()
            .map(|agent| {
                let agent = Arc::clone(agent);
                let question = question.to_string();
                let limit = self.specialist_timeout;
                tokio::spawn(async move {
                    let clock = Instant::now();
                    let result = tokio::time::timeout(limit, agent.answer(&question)).await;
                    (result, clock.elapsed())
                })
            })
            .collect();

        let joined = futures::future::join_all(handles).await;

        let mut reports = Vec::with_capacity(joined.len());
        for (agent, outcome) in self.specialists.iter().zip(joined) {
            let (outcome, elapsed) = match outcome {
                Ok((Ok(answer), elapsed)) => (SpecialistOutcome::Answered { answer }, elapsed),
                // A timed-out task keeps running detached until its provider
                // call returns; at this scale that leak is accepted.
                Ok((Err(_), elapsed)) => (
                    SpecialistOutcome::Failed {
                        error: format!(
                            "timed out after {} seconds",
                            self.specialist_timeout.as_secs()
                        ),
                    },
                    elapsed,
                ),
                Err(join_err) => (
                    SpecialistOutcome::Failed {
                        error: format!("specialist task failed: {join_err}"),
                    },
                    Duration::ZERO,
                ),
            };
            if let SpecialistOutcome::Failed { error } = &outcome {
                error!("{} consultation failed: {error}", agent.display_name());
            }
            reports.push(SpecialistReport {
                specialist: agent.key().to_string(),
                display_name: agent.display_name().to_string(),
                outcome,
                elapsed_ms: elapsed.as_millis() as u64,
                finished_at: Utc::now(),
            });
        }

        let (synthesis, status) = match self.synthesize(question, &reports).await {
            Ok(synthesis) => (synthesis, ConsultationStatus::Complete),
            Err(e) => {
                error!("Synthesis generation failed: {e}");
                (SYNTHESIS_FALLBACK.to_string(), ConsultationStatus::Partial)
            }
        };

        Consultation {
            question: question.to_string(),
            reports,
            synthesis,
            status,
            started_at,
            finished_at: Utc::now(),
        }
    }

    async fn synthesize(
        &self,
        question: &str,
        reports: &[SpecialistReport],
    ) -> Result<String, ProviderError> {
        let prompt = synthesis_prompt(question, reports);
        self.provider
            .generate(None, &[ChatMessage::user(prompt)], &self.options)
            .await
    }
}

/// The synthesis prompt embeds the question and every specialist's
/// answer-or-error text, so the merged narrative can attribute points and
/// acknowledge gaps.
fn synthesis_prompt(question: &str, reports: &[SpecialistReport]) -> String {
    let mut prompt = String::from(
        "You are a medical AI that consolidates the findings of several \
         specialist consultations into one answer for the patient.\n\n",
    );
    prompt.push_str(&format!("**Patient question:**\n{question}\n\n"));

    for report in reports {
        let text = match &report.outcome {
            SpecialistOutcome::Answered { answer } => answer.clone(),
            SpecialistOutcome::Failed { error } => format!("(no answer available: {error})"),
        };
        prompt.push_str(&format!("**{} opinion:**\n{text}\n\n", report.display_name));
    }

    prompt.push_str(
        "**Instructions:**\n\
         1. Provide one consolidated answer that helps the patient.\n\
         2. Summarize each specialist's key points, attributed by name.\n\
         3. Mention additional considerations the specialists did not cover.\n\
         4. Close with a combined disclaimer emphasizing consultation with \
         qualified medical professionals.\n",
    );
    prompt
}

fn preview(question: &str) -> String {
    question.chars().take(80).collect()
}
