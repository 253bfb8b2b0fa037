pub mod ranking;
pub mod scoring;
pub mod validate;

mod types;

pub use types::{
	Assignment, Candidate, Creator, CreatorAnalysis, CreatorMatch, MatchResponse, ScoreBreakdown,
	TargetAudience,
};
