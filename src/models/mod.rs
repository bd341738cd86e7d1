//! Records and request/response schemas shared by the handlers.

pub mod project;
pub mod submission;

pub use project::{sort_by_order, Project, ProjectList, ProjectStatus};
pub use submission::{
    ResumeRef, SubmissionList, SubmissionStatus, Submission, SubmitRequest, SubmitResponse,
    DEFAULT_SERVICE,
};
