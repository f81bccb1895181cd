pub mod interview;
pub mod resume;

pub use interview::{InterviewGuide, InterviewType};
pub use resume::ResumeRecord;
