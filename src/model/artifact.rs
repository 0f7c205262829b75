use std::{fs, path::Path};

use serde::Deserialize;

use crate::domain::{Label, Message, Prediction};

use super::{
    error::ArtifactError,
    naive_bayes::MultinomialNb,
    vectorizer::{FeatureVector, TfIdfVectorizer},
};

pub const SUPPORTED_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ArtifactFile {
    format_version: u32,
    vectorizer: TfIdfVectorizer,
    model: MultinomialNb,
}

/// The fitted vectorizer and classifier pair. Immutable once loaded.
#[derive(Debug)]
pub struct ClassifierArtifact {
    vectorizer: TfIdfVectorizer,
    model: MultinomialNb,
}

impl ClassifierArtifact {
    pub fn load(path: &Path) -> Result<Self, ArtifactError> {
        let raw = fs::read_to_string(path).map_err(|source| ArtifactError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, ArtifactError> {
        let file: ArtifactFile = serde_json::from_str(raw)?;
        if file.format_version != SUPPORTED_FORMAT_VERSION {
            return Err(ArtifactError::UnsupportedVersion {
                found: file.format_version,
                expected: SUPPORTED_FORMAT_VERSION,
            });
        }
        file.vectorizer.validate()?;
        file.model.validate(file.vectorizer.vocabulary_size())?;
        Ok(Self {
            vectorizer: file.vectorizer,
            model: file.model.sorted_by_class(),
        })
    }

    pub fn vocabulary_size(&self) -> usize {
        self.vectorizer.vocabulary_size()
    }

    pub fn vectorize(&self, message: &Message) -> FeatureVector {
        self.vectorizer.transform(message.as_str())
    }

    pub fn predict(&self, message: &Message) -> Prediction {
        let features = self.vectorize(message);
        let score = self.model.predict(&features);
        Prediction {
            // validate() pins the class set to {0, 1}
            label: Label::from_class(score.class).unwrap_or(Label::NotSpam),
            confidence: score.probability,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    const FIXTURE: &str = include_str!(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/tests/fixtures/inbox_model.json"
    ));

    const TINY: &str = r#"{
        "format_version": 1,
        "vectorizer": {
            "vocabulary": {"prize": 0, "meeting": 1},
            "idf": [1.0, 1.0]
        },
        "model": {
            "classes": [0, 1],
            "class_log_prior": [-0.6931471805599453, -0.6931471805599453],
            "feature_log_prob": [[-2.0, -0.2], [-0.2, -2.0]]
        }
    }"#;

    #[test]
    fn loads_fixture_from_disk() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/inbox_model.json");
        let artifact = ClassifierArtifact::load(&path).unwrap();
        assert_eq!(artifact.vocabulary_size(), 80);
    }

    #[test]
    fn vectorizer_defaults_apply() {
        let artifact = ClassifierArtifact::from_json(TINY).unwrap();
        let message = Message::new("PRIZE prize").unwrap();
        let features = artifact.vectorize(&message);
        assert_eq!(features.entries(), &[(0, 1.0)]);

        let prediction = artifact.predict(&message);
        assert_eq!(prediction.label, Label::Spam);
    }

    #[test]
    fn fixture_predicts_reference_probabilities() {
        let artifact = ClassifierArtifact::from_json(FIXTURE).unwrap();
        let spam = artifact.predict(
            &Message::new("Subject: You won a prize! Click here to claim your $10,000 now!")
                .unwrap(),
        );
        assert_eq!(spam.label, Label::Spam);
        assert!((spam.confidence - 0.835_606_704_792_619_6).abs() < 1e-9);
    }

    #[test]
    fn class_order_in_file_does_not_matter() {
        let raw = TINY
            .replacen("\"classes\": [0, 1]", "\"classes\": [1, 0]", 1)
            .replacen("[[-2.0, -0.2], [-0.2, -2.0]]", "[[-0.2, -2.0], [-2.0, -0.2]]", 1);
        let artifact = ClassifierArtifact::from_json(&raw).unwrap();
        let reference = ClassifierArtifact::from_json(TINY).unwrap();
        for text in ["prize", "meeting", "prize meeting"] {
            let message = Message::new(text).unwrap();
            assert_eq!(artifact.predict(&message), reference.predict(&message), "{text}");
        }
        // equal scores resolve to not_spam
        let tie = artifact.predict(&Message::new("prize meeting").unwrap());
        assert_eq!(tie.label, Label::NotSpam);
    }

    #[test]
    fn extreme_log_probabilities_keep_confidence_finite() {
        let raw = r#"{
            "format_version": 1,
            "vectorizer": {"vocabulary": {"prize": 0, "meeting": 1}, "idf": [1.0, 1.0]},
            "model": {
                "classes": [0, 1],
                "class_log_prior": [-1e308, -1e308],
                "feature_log_prob": [[-1e308, -1e308], [-1e308, -1e308]]
            }
        }"#;
        let artifact = ClassifierArtifact::from_json(raw).unwrap();
        let prediction = artifact.predict(&Message::new("prize prize").unwrap());
        assert!(prediction.confidence.is_finite());
        assert_eq!(prediction.confidence_percent(), 50.0);
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ClassifierArtifact::load(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, ArtifactError::Io { .. }));
    }

    #[test]
    fn corrupt_file_is_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"\x80\x04\x95 not json").unwrap();
        let err = ClassifierArtifact::load(file.path()).unwrap_err();
        // non-UTF-8 bytes fail while reading, plain garbage while parsing
        assert!(matches!(err, ArtifactError::Io { .. } | ArtifactError::Parse(_)));

        let err = ClassifierArtifact::from_json("{\"model\": {}}").unwrap_err();
        assert!(matches!(err, ArtifactError::Parse(_)));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let raw = TINY.replacen("\"format_version\": 1,", "\"format_version\": 1, \"extra\": true,", 1);
        assert!(matches!(
            ClassifierArtifact::from_json(&raw),
            Err(ArtifactError::Parse(_))
        ));
    }

    #[test]
    fn unsupported_version_is_rejected() {
        let raw = TINY.replacen("\"format_version\": 1", "\"format_version\": 7", 1);
        let err = ClassifierArtifact::from_json(&raw).unwrap_err();
        assert!(matches!(
            err,
            ArtifactError::UnsupportedVersion { found: 7, expected: 1 }
        ));
    }

    #[test]
    fn shape_mismatch_is_invalid() {
        let raw = TINY.replacen("[[-2.0, -0.2], [-0.2, -2.0]]", "[[-2.0], [-0.2]]", 1);
        let err = ClassifierArtifact::from_json(&raw).unwrap_err();
        assert!(matches!(err, ArtifactError::Invalid(_)));
    }
}
