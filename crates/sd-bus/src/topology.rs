//! Topic and queue names (spec §4.2). One logical topic fans out to two
//! durable, named, per-worker queues; each completion topic has exactly one
//! consumer queue.

pub const FILE_DISCOVERED_EXCHANGE: &str = "file-discovered";
pub const METADATA_QUEUE: &str = "file-discovered.metadata-worker";
pub const THUMBNAIL_QUEUE: &str = "file-discovered.thumbnail-worker";

pub const METADATA_EXTRACTED_QUEUE: &str = "metadata-extracted";
pub const THUMBNAIL_GENERATED_QUEUE: &str = "thumbnail-generated";
