//! Small helpers shared by every crate in the pipeline: an I/O error wrapper
//! that keeps the offending path attached, a UTC-assuming timestamp parser
//! for ambiguous EXIF/legacy strings, and a rolling rate window used by the
//! discovery worker's status record.

pub mod error;
pub mod rate;
pub mod time;

pub use error::FileIOError;
