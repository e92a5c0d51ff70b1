//! Data models for the migrator.
//!
//! This module contains the domain models shared by the clients and the
//! transfer engine:
//! - TargetRecord / RecordKind
//! - AttachmentDescriptor / StagedFile
//! - KeyRange

pub mod attachment;
pub mod record;

pub use attachment::{AttachmentDescriptor, StagedFile};
pub use record::{KeyRange, RecordKind, TargetRecord};
