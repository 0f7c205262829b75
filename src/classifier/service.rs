use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::{
    domain::{Message, Prediction, TransformError},
    model::ClassifierArtifact,
};

#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("classifier artifact unavailable: {reason}")]
    ArtifactUnavailable { reason: String },
    #[error(transparent)]
    Transform(#[from] TransformError),
}

#[derive(Debug)]
enum ModelState {
    Ready {
        artifact: ClassifierArtifact,
        path: PathBuf,
        loaded_at: DateTime<Utc>,
    },
    Unavailable {
        path: PathBuf,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ModelStatus {
    Ready {
        path: String,
        vocabulary_size: usize,
        loaded_at: DateTime<Utc>,
    },
    Unavailable {
        path: String,
        reason: String,
    },
}

/// Shared handle over the loaded artifact. Cloning is cheap; every clone
/// reads the same immutable model.
#[derive(Debug, Clone)]
pub struct ClassifierService {
    state: Arc<ModelState>,
    max_input_bytes: usize,
}

impl ClassifierService {
    /// Loads the artifact at `path`. A load failure is logged here, once, and
    /// leaves the service in the unavailable state.
    pub fn load(path: &Path, max_input_bytes: usize) -> Self {
        match ClassifierArtifact::load(path) {
            Ok(artifact) => {
                tracing::info!(
                    target: "model",
                    path = %path.display(),
                    vocabulary = artifact.vocabulary_size(),
                    "classifier artifact loaded"
                );
                Self::ready(artifact, path, max_input_bytes)
            }
            Err(err) => {
                tracing::error!(
                    target: "model",
                    path = %path.display(),
                    error = %err,
                    "failed to load classifier artifact; classification disabled"
                );
                Self::unavailable(path, err.to_string(), max_input_bytes)
            }
        }
    }

    pub fn ready(artifact: ClassifierArtifact, path: &Path, max_input_bytes: usize) -> Self {
        Self {
            state: Arc::new(ModelState::Ready {
                artifact,
                path: path.to_path_buf(),
                loaded_at: Utc::now(),
            }),
            max_input_bytes,
        }
    }

    pub fn unavailable(path: &Path, reason: impl Into<String>, max_input_bytes: usize) -> Self {
        Self {
            state: Arc::new(ModelState::Unavailable {
                path: path.to_path_buf(),
                reason: reason.into(),
            }),
            max_input_bytes,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(*self.state, ModelState::Ready { .. })
    }

    pub fn status(&self) -> ModelStatus {
        match &*self.state {
            ModelState::Ready {
                artifact,
                path,
                loaded_at,
            } => ModelStatus::Ready {
                path: path.display().to_string(),
                vocabulary_size: artifact.vocabulary_size(),
                loaded_at: *loaded_at,
            },
            ModelState::Unavailable { path, reason } => ModelStatus::Unavailable {
                path: path.display().to_string(),
                reason: reason.clone(),
            },
        }
    }

    pub fn classify(&self, text: &str) -> Result<Prediction, ClassifyError> {
        self.classify_email(None, text)
    }

    /// Subject and body given separately; see [`Message::compose`].
    pub fn classify_email(
        &self,
        subject: Option<&str>,
        body: &str,
    ) -> Result<Prediction, ClassifyError> {
        let artifact = self.artifact()?;
        self.check_size(subject.map_or(0, str::len) + body.len())?;
        let message = Message::compose(subject, body)?;
        Ok(self.run(artifact, &message))
    }

    /// Classifies the contents of an uploaded text file.
    pub fn classify_bytes(&self, bytes: &[u8]) -> Result<Prediction, ClassifyError> {
        let artifact = self.artifact()?;
        self.check_size(bytes.len())?;
        let message = Message::from_bytes(bytes)?;
        Ok(self.run(artifact, &message))
    }

    fn artifact(&self) -> Result<&ClassifierArtifact, ClassifyError> {
        match &*self.state {
            ModelState::Ready { artifact, .. } => Ok(artifact),
            ModelState::Unavailable { reason, .. } => Err(ClassifyError::ArtifactUnavailable {
                reason: reason.clone(),
            }),
        }
    }

    fn check_size(&self, len: usize) -> Result<(), TransformError> {
        if len > self.max_input_bytes {
            return Err(TransformError::TooLarge {
                len,
                limit: self.max_input_bytes,
            });
        }
        Ok(())
    }

    fn run(&self, artifact: &ClassifierArtifact, message: &Message) -> Prediction {
        let prediction = artifact.predict(message);
        tracing::debug!(
            target: "classifier",
            bytes = message.byte_len(),
            label = %prediction.label,
            confidence = prediction.confidence_percent(),
            "message classified"
        );
        prediction
    }
}
