//! gradekit-core: grading engine for exam submissions.
//!
//! Scores multiple-choice answers by exact match and short answers with a
//! weighted heuristic (similarity, length, key concepts, relevance), produces
//! per-question feedback, and routes requests between the standard backend
//! and an optional model-backed enhanced backend with transparent fallback.

pub mod backend;
pub mod batch;
pub mod engine;
pub mod enhanced;
pub mod error;
pub mod feedback;
pub mod mcq;
pub mod model;
pub mod parser;
pub mod quality;
pub mod report;
pub mod similarity;
pub mod statistics;
pub mod text;
pub mod traits;

pub use backend::{BackendSelector, EvaluationMode};
pub use engine::{evaluate, StandardEvaluator};
pub use enhanced::{EnhancedEvaluator, JudgeSettings};
pub use error::GradingError;
