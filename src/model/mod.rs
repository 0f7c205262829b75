pub mod artifact;
pub mod error;
pub mod naive_bayes;
pub mod vectorizer;

pub use artifact::ClassifierArtifact;
