pub mod cleaner_job;
pub mod cleaner_job_file;
pub mod duplicate_group;
pub mod enums;
pub mod hidden_folder;
pub mod hidden_size_rule;
pub mod indexed_file;
pub mod scan_directory;
pub mod selection_preference;
pub mod selection_session;

pub use enums::{
	CleanerJobCategory, CleanerJobFileStatus, CleanerJobStatus, DuplicateGroupStatus,
	HiddenCategory, SelectionSessionStatus,
};
