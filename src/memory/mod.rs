//! The observation journal pipeline: entries, priority, sanitization,
//! audit trail, Observer/Reflector compression, and context assembly.

pub mod anchor;
pub mod audit;
pub mod context_builder;
pub mod entry;
pub mod journal;
pub mod manager;
pub mod observer;
pub mod priority;
pub mod reflector;
pub mod sanitizer;

pub use anchor::Anchor;
pub use audit::{AuditChain, AuditEntry, AuditSource};
pub use context_builder::ContextBuilder;
pub use entry::ObservationEntry;
pub use journal::ObservationJournal;
pub use manager::{ContextManager, ContextManagerConfig};
pub use observer::Observer;
pub use priority::{Priority, RelativeLag};
pub use reflector::Reflector;
pub use sanitizer::{SanitizeResult, Sanitizer};
