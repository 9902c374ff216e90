use crate::core::RevisionChannel;
use crate::domain::ports::RevisionContext;
use crate::utils::error::{PlannerError, Result};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::path::Path;
use tokio::sync::mpsc;

/// Replays revisions recorded in a JSON file: a single object is one
/// revision, an array is a sequence of revisions applied in order.
#[derive(Debug, Default)]
pub struct FileRevisionChannel {
    pending: VecDeque<serde_json::Value>,
}

impl FileRevisionChannel {
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = tokio::fs::read_to_string(path.as_ref()).await?;
        Self::from_json_str(&content)
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(content)?;
        let pending = match value {
            serde_json::Value::Array(items) => items.into(),
            serde_json::Value::Object(_) => VecDeque::from([value]),
            other => {
                return Err(PlannerError::InvalidRevision {
                    message: format!("revision file must hold an object or an array, got {}", other),
                })
            }
        };
        Ok(Self { pending })
    }

    pub fn remaining(&self) -> usize {
        self.pending.len()
    }
}

#[async_trait]
impl RevisionChannel for FileRevisionChannel {
    async fn next_revision(&mut self, context: &RevisionContext) -> Result<Option<serde_json::Value>> {
        let next = self.pending.pop_front();
        if next.is_some() {
            tracing::debug!(
                project_id = %context.project_id,
                remaining = self.pending.len(),
                "Replaying recorded revision"
            );
        }
        Ok(next)
    }
}

/// Receives revisions pushed by an interactive surface until every sender
/// is dropped.
pub struct StreamRevisionChannel {
    receiver: mpsc::Receiver<serde_json::Value>,
    contexts: Option<mpsc::UnboundedSender<RevisionContext>>,
}

impl StreamRevisionChannel {
    pub fn new(buffer: usize) -> (mpsc::Sender<serde_json::Value>, Self) {
        let (sender, receiver) = mpsc::channel(buffer);
        (
            sender,
            Self {
                receiver,
                contexts: None,
            },
        )
    }

    /// Forwards the context shown before each revision to `sink`.
    pub fn with_context_sink(mut self, sink: mpsc::UnboundedSender<RevisionContext>) -> Self {
        self.contexts = Some(sink);
        self
    }
}

#[async_trait]
impl RevisionChannel for StreamRevisionChannel {
    async fn next_revision(&mut self, context: &RevisionContext) -> Result<Option<serde_json::Value>> {
        if let Some(sink) = &self.contexts {
            sink.send(context.clone()).ok();
        }
        Ok(self.receiver.recv().await)
    }
}
