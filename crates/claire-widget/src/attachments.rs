//! Working set of file references waiting to be sent

use uuid::Uuid;

use crate::types::{AttachmentKind, AttachmentRef};

/// A file as reported by the host's file picker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRef {
    pub name: String,
    pub size_bytes: u64,
}

impl FileRef {
    pub fn new(name: impl Into<String>, size_bytes: u64) -> Self {
        Self {
            name: name.into(),
            size_bytes,
        }
    }
}

/// Ordered attachments staged for the next send.
///
/// No size or type limits are enforced here.
#[derive(Debug, Default)]
pub struct AttachmentStager {
    staged: Vec<AttachmentRef>,
}

impl AttachmentStager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append files as attachments of `kind`, returning the new references
    pub fn stage(
        &mut self,
        files: impl IntoIterator<Item = FileRef>,
        kind: AttachmentKind,
    ) -> Vec<AttachmentRef> {
        let added: Vec<AttachmentRef> = files
            .into_iter()
            .map(|file| AttachmentRef {
                id: Uuid::new_v4(),
                kind,
                display_name: file.name,
                size_bytes: file.size_bytes,
            })
            .collect();
        self.staged.extend(added.iter().cloned());
        added
    }

    /// Remove one attachment. Unknown ids are ignored.
    pub fn unstage(&mut self, id: Uuid) -> Option<AttachmentRef> {
        let index = self.staged.iter().position(|a| a.id == id)?;
        Some(self.staged.remove(index))
    }

    /// Take every staged attachment, leaving the stager empty
    pub fn drain(&mut self) -> Vec<AttachmentRef> {
        std::mem::take(&mut self.staged)
    }

    /// Currently staged attachments, in staging order
    pub fn staged(&self) -> &[AttachmentRef] {
        &self.staged
    }

    pub fn len(&self) -> usize {
        self.staged.len()
    }

    pub fn is_empty(&self) -> bool {
        self.staged.is_empty()
    }

    /// Sum of staged sizes
    pub fn total_bytes(&self) -> u64 {
        self.staged.iter().map(|a| a.size_bytes).sum()
    }
}
