pub mod chapter;
pub mod event;
pub mod metadata;
pub mod outcome;
pub mod range;

pub use chapter::{parse_chapter_number, sanitize_file_name, sort_chapters, ChapterDescriptor};
pub use event::{LogLevel, ProgressEvent};
pub use metadata::{ChapterMetadata, SearchHit};
pub use outcome::{BatchResult, Outcome};
pub use range::{select_chapters, select_range, ChapterRange};
