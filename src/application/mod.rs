//! Jobs and applications.
//!
//! The chat core depends on this module for application lookup: status,
//! the two participants, and per-user clear watermarks.

mod job;
mod repository;
mod types;

pub use job::JobRepository;
pub use repository::ApplicationRepository;
pub use types::{
    Application, ApplicationContext, ApplicationStatus, AppliedJob, ChatEnabledApplication,
    ClearMark, Job, NewJob, ParticipantRole,
};
