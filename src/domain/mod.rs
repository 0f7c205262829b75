pub mod message;
pub mod prediction;

pub use message::{Message, TransformError};
pub use prediction::{Label, Prediction};
