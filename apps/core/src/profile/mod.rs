//! # Profile Module
//!
//! The per-user aggregate (`model`) and the rules that fold visits into it (`tracker`).

pub mod model;
pub mod tracker;

pub use model::{
    BehaviorPattern, ContentFormat, ContentPreference, EvolutionEntry, FocusShare, ForgetReport,
    Interest, InteractionStyle, PatternSnapshot, PersonalityEstimate, PersonalityTrait,
    PreferenceCategory, SessionLength, TimeOfDay, UserProfile,
};
pub use tracker::{InterestTracker, ReanalysisSummary};
