//! Learning-style assessment engine.
//!
//! Users play four short interactive activities (memory challenge, problem
//! solving, audio-visual, reading/writing). Each finished activity yields a
//! metric bundle that is scored into a four-dimensional learning-type vector;
//! once all four are in, the dominant dimension becomes the user's primary
//! learning type. Persistence is best-effort and never blocks the flow.

pub mod activities;
pub mod classifier;
pub mod config;
pub mod engine;
pub mod error;
pub mod logging;
pub mod persistence;
pub mod profile;
pub mod scoring;
pub mod types;

pub use activities::ActivityEvent;
pub use classifier::{classify, Classification};
pub use config::AssessmentConfig;
pub use engine::{AssessmentEngine, AssessmentPhase};
pub use error::{AssessmentError, AssessmentResult};
pub use persistence::{HttpProfileService, InMemoryProfileService, ProfileService};
pub use profile::ScoredUpdate;
pub use types::{
    ActivityResult, ActivityType, LearningType, LearningTypeScores, UserLearningProfile,
};
