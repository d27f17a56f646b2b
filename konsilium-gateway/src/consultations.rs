//! In-memory consultation records with an append-only progress log.
//!
//! Records live for the life of the server process; loss on restart is
//! acceptable for this service.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::orchestrator::Consultation;

#[derive(Debug, Clone, Serialize)]
pub struct ProgressEvent {
    pub at: DateTime<Utc>,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConsultationRecord {
    pub id: Uuid,
    pub question: String,
    /// Strictly append-only, in wall-clock order of occurrence.
    pub events: Vec<ProgressEvent>,
    pub result: Option<Consultation>,
}

#[derive(Default)]
pub struct ConsultationLog {
    records: RwLock<HashMap<Uuid, ConsultationRecord>>,
}

impl ConsultationLog {
    pub async fn begin(&self, question: &str) -> Uuid {
        let id = Uuid::new_v4();
        let record = ConsultationRecord {
            id,
            question: question.to_string(),
            events: Vec::new(),
            result: None,
        };
        self.records.write().await.insert(id, record);
        id
    }

    pub async fn append(&self, id: Uuid, message: impl Into<String>) {
        if let Some(record) = self.records.write().await.get_mut(&id) {
            record.events.push(ProgressEvent {
                at: Utc::now(),
                message: message.into(),
            });
        }
    }

    pub async fn finish(&self, id: Uuid, result: Consultation) {
        if let Some(record) = self.records.write().await.get_mut(&id) {
            record.result = Some(result);
        }
    }

    pub async fn get(&self, id: Uuid) -> Option<ConsultationRecord> {
        self.records.read().await.get(&id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn events_append_in_order() {
        let log = ConsultationLog::default();
        let id = log.begin("Blood in urine, what now?").await;
        log.append(id, "consultation started").await;
        log.append(id, "querying 2 specialists").await;
        log.append(id, "synthesis complete").await;

        let record = log.get(id).await.expect("record exists");
        let messages: Vec<&str> = record.events.iter().map(|e| e.message.as_str()).collect();
        assert_eq!(
            messages,
            vec![
                "consultation started",
                "querying 2 specialists",
                "synthesis complete"
            ]
        );
        assert!(record.result.is_none());
    }

    #[tokio::test]
    async fn unknown_id_is_none() {
        let log = ConsultationLog::default();
        assert!(log.get(Uuid::new_v4()).await.is_none());
    }
}
