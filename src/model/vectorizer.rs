//! TF-IDF transform over a vocabulary frozen at training time.

use std::{
    borrow::Cow,
    collections::{BTreeMap, HashMap, HashSet},
};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

use super::error::ArtifactError;

// Words of two or more characters; punctuation and single letters are dropped.
static TOKEN_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b\w\w+\b").expect("valid token regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Norm {
    L1,
    #[default]
    L2,
    None,
}

/// Sparse feature vector: `(index, weight)` pairs sorted by index, zero weights omitted.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeatureVector {
    dimension: usize,
    entries: Vec<(usize, f64)>,
}

impl FeatureVector {
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn entries(&self) -> &[(usize, f64)] {
        &self.entries
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TfIdfVectorizer {
    #[serde(default = "default_lowercase")]
    lowercase: bool,
    #[serde(default)]
    sublinear_tf: bool,
    #[serde(default)]
    norm: Norm,
    vocabulary: HashMap<String, usize>,
    idf: Vec<f64>,
}

fn default_lowercase() -> bool {
    true
}

impl TfIdfVectorizer {
    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary.len()
    }

    pub(crate) fn validate(&self) -> Result<(), ArtifactError> {
        let size = self.vocabulary.len();
        if size == 0 {
            return Err(ArtifactError::invalid("vectorizer vocabulary is empty"));
        }
        if self.idf.len() != size {
            return Err(ArtifactError::invalid(format!(
                "vectorizer has {} idf weights for {} vocabulary terms",
                self.idf.len(),
                size
            )));
        }
        if let Some(weight) = self.idf.iter().find(|w| !w.is_finite()) {
            return Err(ArtifactError::invalid(format!(
                "vectorizer idf contains non-finite weight {weight}"
            )));
        }

        let mut seen = HashSet::with_capacity(size);
        for (term, &idx) in &self.vocabulary {
            if idx >= size {
                return Err(ArtifactError::invalid(format!(
                    "vocabulary term {term:?} has index {idx} outside 0..{size}"
                )));
            }
            if !seen.insert(idx) {
                return Err(ArtifactError::invalid(format!(
                    "vocabulary index {idx} is assigned to more than one term"
                )));
            }
        }
        Ok(())
    }

    pub fn transform(&self, text: &str) -> FeatureVector {
        let text = if self.lowercase {
            Cow::Owned(text.to_lowercase())
        } else {
            Cow::Borrowed(text)
        };

        let mut counts: BTreeMap<usize, f64> = BTreeMap::new();
        for token in TOKEN_REGEX.find_iter(&text) {
            if let Some(&idx) = self.vocabulary.get(token.as_str()) {
                *counts.entry(idx).or_insert(0.0) += 1.0;
            }
        }

        let mut entries: Vec<(usize, f64)> = counts
            .into_iter()
            .map(|(idx, tf)| {
                let tf = if self.sublinear_tf { 1.0 + tf.ln() } else { tf };
                (idx, tf * self.idf[idx])
            })
            .filter(|(_, weight)| *weight != 0.0)
            .collect();
        normalize(&mut entries, self.norm);

        FeatureVector {
            dimension: self.vocabulary.len(),
            entries,
        }
    }
}

fn normalize(entries: &mut [(usize, f64)], norm: Norm) {
    let length = match norm {
        Norm::L1 => entries.iter().map(|(_, w)| w.abs()).sum::<f64>(),
        Norm::L2 => entries.iter().map(|(_, w)| w * w).sum::<f64>().sqrt(),
        Norm::None => return,
    };
    if length > 0.0 {
        for (_, weight) in entries.iter_mut() {
            *weight /= length;
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn vectorizer(terms: &[&str], idf: &[f64], norm: Norm) -> TfIdfVectorizer {
        TfIdfVectorizer {
            lowercase: true,
            sublinear_tf: false,
            norm,
            vocabulary: terms
                .iter()
                .enumerate()
                .map(|(idx, term)| (term.to_string(), idx))
                .collect(),
            idf: idf.to_vec(),
        }
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-12,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn tokens_are_lowercased_and_counted() {
        let v = vectorizer(&["prize", "claim"], &[1.0, 1.0], Norm::None);
        let features = v.transform("PRIZE! Claim your prize");
        assert_eq!(features.dimension(), 2);
        assert_eq!(features.entries(), &[(0, 2.0), (1, 1.0)]);
    }

    #[test]
    fn single_characters_and_unknown_words_are_ignored() {
        let v = vectorizer(&["won", "10am"], &[1.0, 1.0], Norm::None);
        let features = v.transform("I won a $ at 10AM! x y z");
        assert_eq!(features.entries(), &[(0, 1.0), (1, 1.0)]);

        assert!(v.transform("nothing relevant here").entries().is_empty());
    }

    #[test]
    fn apostrophes_split_words() {
        let v = vectorizer(&["don", "forget"], &[1.0, 1.0], Norm::None);
        let features = v.transform("Don’t forget");
        assert_eq!(features.entries(), &[(0, 1.0), (1, 1.0)]);
    }

    #[test]
    fn idf_weights_then_l2_normalizes() {
        let v = vectorizer(&["cash", "now"], &[3.0, 4.0], Norm::L2);
        let features = v.transform("cash now");
        let entries = features.entries();
        assert_close(entries[0].1, 0.6);
        assert_close(entries[1].1, 0.8);
    }

    #[test]
    fn l1_norm_sums_to_one() {
        let v = vectorizer(&["cash", "now"], &[1.0, 3.0], Norm::L1);
        let features = v.transform("cash now");
        let total: f64 = features.entries().iter().map(|(_, w)| w).sum();
        assert_close(total, 1.0);
        assert_close(features.entries()[1].1, 0.75);
    }

    #[test]
    fn sublinear_tf_dampens_repeats() {
        let mut v = vectorizer(&["free"], &[1.0], Norm::None);
        v.sublinear_tf = true;
        let features = v.transform("free free free");
        assert_close(features.entries()[0].1, 1.0 + 3f64.ln());
    }

    #[test]
    fn case_is_kept_when_lowercase_disabled() {
        let mut v = vectorizer(&["Prize"], &[1.0], Norm::None);
        v.lowercase = false;
        assert_eq!(v.transform("Prize prize").entries(), &[(0, 1.0)]);
    }

    #[test]
    fn validate_rejects_mismatched_idf() {
        let v = vectorizer(&["a1", "b2"], &[1.0], Norm::L2);
        assert!(matches!(v.validate(), Err(ArtifactError::Invalid(_))));
    }

    #[test]
    fn validate_rejects_out_of_range_and_duplicate_indices() {
        let mut v = vectorizer(&["aa", "bb"], &[1.0, 1.0], Norm::L2);
        v.vocabulary.insert("bb".into(), 5);
        assert!(v.validate().is_err());

        v.vocabulary.insert("bb".into(), 0);
        assert!(v.validate().is_err());
    }

    #[test]
    fn validate_rejects_empty_vocabulary_and_nan() {
        let v = vectorizer(&[], &[], Norm::L2);
        assert!(v.validate().is_err());

        let v = vectorizer(&["aa"], &[f64::NAN], Norm::L2);
        assert!(v.validate().is_err());
    }
}
