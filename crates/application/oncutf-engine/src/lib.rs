pub mod batch;
pub mod engine;
pub mod execute;
pub mod history;
pub mod modules;
pub mod post_transform;
pub mod preview;
pub mod snapshot;
pub mod validate;

pub use batch::{workers_and_batch_size_for, BatchProcessor, BatchStats};
pub use engine::RenameEngine;
pub use execute::{ConflictCallback, ExecutionEngine, FilenameValidator};
pub use history::RenameHistory;
pub use modules::{CounterModule, HashFieldModule, MetadataFieldModule, ModuleCategory, ModuleContext, RenameModule, TextModule};
pub use post_transform::{CaseStyle, PostTransform, SeparatorStyle};
pub use preview::PreviewEngine;
pub use snapshot::{SnapshotManager, SnapshotStatus};
pub use validate::ValidationEngine;
