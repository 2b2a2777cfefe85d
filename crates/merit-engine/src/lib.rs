//! The achievement lifecycle engine: access policy plus the consistency
//! coordinator that keeps the two backing stores in step.
//!
//! Callers interact with [`Coordinator`] only; the stores and collaborators
//! are injected at construction and never reached around.

pub mod coordinator;
pub mod policy;

pub use coordinator::{
  AchievementRecord, AchievementSummary, Coordinator, HistoryEvent, NewAchievement,
};
pub use policy::AccessPolicy;
