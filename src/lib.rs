pub mod animator;
pub mod client;
pub mod config;
pub mod controller;
pub mod model;
pub mod renderer;
pub mod validator;
pub mod view;

pub use animator::{AnimationSteps, ScoreAnimator, ScoreDisplay};
pub use client::{AnalysisBackend, AnalysisClient, AnalysisError};
pub use config::Config;
pub use controller::{FormController, Submission, Ticket, UiState};
pub use model::{AnalysisRequest, AnalysisResult, EvidenceFactor};
pub use renderer::{render, EvidenceItem, Polarity, ReportModel, ScoreBucket};
pub use validator::{classify, AddressShape, FieldValidator, FormField};
pub use view::{FormView, Page};
