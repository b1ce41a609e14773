pub mod facade;
pub mod hash_cache;
pub mod metadata_cache;
pub mod worker;

pub use facade::FileStatusFacade;
pub use hash_cache::{default_algorithm, HashCache};
pub use metadata_cache::{MetadataCache, MetadataCacheStats, MetadataEntry};
pub use worker::{MetadataReader, MetadataWorker, ReaderError, WorkerCallbacks, WorkerResult};
