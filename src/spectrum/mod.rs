pub mod magnitude;
pub mod pipeline;
pub mod settings;
pub mod smoothing;
pub mod transform;
