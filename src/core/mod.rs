//! Core data types shared by every pipeline stage.
//!
//! Nothing in this module performs I/O.

pub mod document;
pub mod query;
pub mod report;

pub use document::{Chunk, Document, RankedContext, ScoredChunk, SearchHit, render_contexts};
pub use query::{ParamBounds, Query, ReportType, RunParams, Tone};
pub use report::{AgentProfile, Report, ReportSection, RunStats, Subtopic};
