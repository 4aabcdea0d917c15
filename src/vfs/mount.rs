//! Mount table entries and drive-letter path rules
//!
//! Every mounted backend is reachable through a single-character,
//! case-sensitive drive letter: `"R:"` names the drive itself,
//! `"R:/..."` names a file or directory on it.

use super::backend::Backend;

/// One registered backend
#[derive(Clone, Copy)]
pub(crate) struct MountEntry<'a> {
    /// Drive letter byte, unique across mounted entries
    pub drive: u8,
    pub backend: &'a dyn Backend,
}

/// Drive letter of a bare drive reference (`"X:"` plus anything),
/// `None` if the shape is invalid
pub(crate) fn drive_letter(path: &str) -> Option<u8> {
    let bytes = path.as_bytes();
    if bytes.len() >= 2 && bytes[1] == b':' {
        Some(bytes[0])
    } else {
        None
    }
}

/// Drive letter of a full path (`"X:/..."`, at least four characters),
/// `None` if the shape is invalid
pub(crate) fn full_path_drive(path: &str) -> Option<u8> {
    let bytes = path.as_bytes();
    if bytes.len() >= 4 && bytes[1] == b':' && bytes[2] == b'/' {
        Some(bytes[0])
    } else {
        None
    }
}
