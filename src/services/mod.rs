pub mod metadata_writer;
pub mod site;
pub mod source;

pub use metadata_writer::MetadataWriter;
pub use site::Site;
pub use source::{build_http_client, KakalotSource, MangaSource};
