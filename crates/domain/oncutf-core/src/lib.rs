pub mod filename;
pub mod path;
pub mod records;
pub mod rename;
pub mod state;
pub mod validators;
pub mod value;

pub use path::{canonicalize, is_canonical, validate_relative_path, CanonicalPath};
pub use records::{
    HashRecord, MetadataKind, MetadataRecord, OperationKind, OperationSummary, PathId, PathRecord,
    RenameBatch, RenameEntry, StoreStats, DEFAULT_HASH_ALGORITHM,
};
pub use rename::{
    ConflictResolution, ExecutionItem, ExecutionResult, NamePair, PreviewResult, ValidationItem,
    ValidationResult,
};
pub use state::{reduce, DomainEvent, RenameState, StateManager};
pub use validators::validate_rotation;
pub use value::{
    canonical_json, strip_flags, with_synthesized_flags, MetadataValue, Payload,
    EXTENDED_FLAG_KEY, MODIFIED_FLAG_KEY,
};
