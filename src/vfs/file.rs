//! Open-file table entries
//!
//! A fixed-capacity pool of file slots. A slot is free iff its
//! descriptor is zero; live descriptors are `FILES_FD_BASE + index`
//! and stay stable for the life of the open file. The full path is
//! kept for the duplicate-open guard: an exact byte compare, so two
//! distinct paths can never shadow each other the way a bare path
//! hash could.

use crate::config::CFG_PATH_MAX;
use crate::types::{Fd, FileId};

#[derive(Clone, Copy)]
pub(crate) struct OpenFile {
    /// Descriptor, 0 while the slot is free
    pub fd: Fd,
    /// Backend-opaque file token
    pub file: FileId,
    /// Index of the owning mount-table entry
    pub mount: usize,
    path: [u8; CFG_PATH_MAX],
    path_len: u8,
}

impl OpenFile {
    pub const EMPTY: OpenFile = OpenFile {
        fd: 0,
        file: 0,
        mount: 0,
        path: [0; CFG_PATH_MAX],
        path_len: 0,
    };

    #[inline]
    pub fn is_free(&self) -> bool {
        self.fd == 0
    }

    /// Return the slot to the free pool
    pub fn clear(&mut self) {
        *self = Self::EMPTY;
    }

    /// Record the path used to open this file; `path` must fit in
    /// `CFG_PATH_MAX` (checked by the dispatcher before commit)
    pub fn set_path(&mut self, path: &str) {
        let bytes = path.as_bytes();
        self.path[..bytes.len()].copy_from_slice(bytes);
        self.path_len = bytes.len() as u8;
    }

    /// Exact-path duplicate-open check
    pub fn path_matches(&self, path: &str) -> bool {
        &self.path[..self.path_len as usize] == path.as_bytes()
    }
}
