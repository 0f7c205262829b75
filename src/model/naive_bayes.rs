//! Multinomial Naive Bayes scoring over pre-fitted log probabilities.

use serde::Deserialize;

use super::{error::ArtifactError, vectorizer::FeatureVector};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MultinomialNb {
    classes: Vec<u8>,
    class_log_prior: Vec<f64>,
    feature_log_prob: Vec<Vec<f64>>,
}

/// Winning class and its posterior probability.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassScore {
    pub class: u8,
    pub probability: f64,
}

impl MultinomialNb {
    pub(crate) fn validate(&self, n_features: usize) -> Result<(), ArtifactError> {
        let mut classes = self.classes.clone();
        classes.sort_unstable();
        if classes != [0, 1] {
            return Err(ArtifactError::invalid(format!(
                "model classes must be exactly [0, 1], found {:?}",
                self.classes
            )));
        }
        if self.class_log_prior.len() != self.classes.len() {
            return Err(ArtifactError::invalid(format!(
                "model has {} class priors for {} classes",
                self.class_log_prior.len(),
                self.classes.len()
            )));
        }
        if self.feature_log_prob.len() != self.classes.len() {
            return Err(ArtifactError::invalid(format!(
                "model has {} feature rows for {} classes",
                self.feature_log_prob.len(),
                self.classes.len()
            )));
        }
        for (row, probs) in self.feature_log_prob.iter().enumerate() {
            if probs.len() != n_features {
                return Err(ArtifactError::invalid(format!(
                    "feature row {row} has {} columns, vectorizer produces {n_features}",
                    probs.len()
                )));
            }
        }
        let all_finite = self
            .class_log_prior
            .iter()
            .chain(self.feature_log_prob.iter().flatten())
            .all(|v| v.is_finite());
        if !all_finite {
            return Err(ArtifactError::invalid(
                "model contains non-finite log probabilities",
            ));
        }
        Ok(())
    }

    pub fn joint_log_likelihood(&self, features: &FeatureVector) -> Vec<f64> {
        debug_assert!(
            self.feature_log_prob
                .iter()
                .all(|row| row.len() == features.dimension())
        );
        self.class_log_prior
            .iter()
            .zip(&self.feature_log_prob)
            .map(|(prior, log_probs)| {
                prior
                    + features
                        .entries()
                        .iter()
                        .map(|&(idx, weight)| weight * log_probs[idx])
                        .sum::<f64>()
            })
            .collect()
    }

    /// Puts the classes in ascending order, permuting priors and feature rows
    /// with them, so index 0 is always class 0. Expects a validated model.
    pub(crate) fn sorted_by_class(mut self) -> Self {
        let mut order: Vec<usize> = (0..self.classes.len()).collect();
        order.sort_by_key(|&idx| self.classes[idx]);
        self.classes = order.iter().map(|&idx| self.classes[idx]).collect();
        self.class_log_prior = order.iter().map(|&idx| self.class_log_prior[idx]).collect();
        self.feature_log_prob = order
            .iter()
            .map(|&idx| std::mem::take(&mut self.feature_log_prob[idx]))
            .collect();
        self
    }

    /// Posterior probability of each class, in class order.
    pub fn predict_proba(&self, features: &FeatureVector) -> Vec<f64> {
        let jll = self.joint_log_likelihood(features);
        // Huge weights can overflow every class score to infinity; the priors
        // are finite after validation.
        softmax(&jll)
            .or_else(|| softmax(&self.class_log_prior))
            .unwrap_or_else(|| vec![1.0 / jll.len() as f64; jll.len()])
    }

    /// Arg-max class. On a tie the lower class wins, so class 0 (`not_spam`)
    /// once the model is sorted.
    pub fn predict(&self, features: &FeatureVector) -> ClassScore {
        let proba = self.predict_proba(features);
        let mut best = 0;
        for (idx, p) in proba.iter().enumerate().skip(1) {
            if *p > proba[best] {
                best = idx;
            }
        }
        ClassScore {
            class: self.classes[best],
            probability: proba[best],
        }
    }
}

/// `None` when the scores have no finite maximum or contain NaN.
fn softmax(log_scores: &[f64]) -> Option<Vec<f64>> {
    let max = log_scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !max.is_finite() || log_scores.iter().any(|v| v.is_nan()) {
        return None;
    }
    let exps: Vec<f64> = log_scores.iter().map(|v| (v - max).exp()).collect();
    let total: f64 = exps.iter().sum();
    Some(exps.into_iter().map(|e| e / total).collect())
}
