pub mod extrema_archive;

pub use extrema_archive::{ConfiguredArchive, ExtremaArchive, JsonLinesArchive, MemoryArchive};
