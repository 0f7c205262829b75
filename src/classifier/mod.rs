pub mod service;

pub use service::{ClassifierService, ClassifyError, ModelStatus};
