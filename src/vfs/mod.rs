//! Virtual filesystem dispatcher
//!
//! Presents one flat descriptor and path namespace over any number of
//! pluggable backends. A path like `"R:/boot.cfg"` is resolved through
//! the mount table to a [`Backend`], descriptor operations are resolved
//! through the bounded open-file table, and every call is forwarded
//! through the backend trait.
//!
//! The registry is an explicitly owned object: construct it once
//! (typically as a `static`), call [`Vfs::init`], and pass it to every
//! caller. One dispatcher-wide [`Mutex`] guards both tables, so mounts
//! and file operations may be issued from either core.
//!
//! [`Mutex`]: crate::sync::Mutex

pub mod backend;
mod file;
mod mount;

pub use backend::Backend;

use core::cell::UnsafeCell;

use crate::config::{CFG_MAX_MOUNTS, CFG_MAX_OPEN_FILES, CFG_PATH_MAX, FILES_FD_BASE};
use crate::error::{VfsError, VfsResult};
use crate::sync::Mutex;
use crate::types::{Fd, Mode, SeekWhence};

use file::OpenFile;
use mount::MountEntry;

struct VfsState<'a> {
    mounts: [Option<MountEntry<'a>>; CFG_MAX_MOUNTS],
    files: [OpenFile; CFG_MAX_OPEN_FILES],
}

impl<'a> VfsState<'a> {
    /// Linear scan of the mount table by drive letter
    fn mount_of(&self, drive: u8) -> Option<(usize, &'a dyn Backend)> {
        self.mounts
            .iter()
            .enumerate()
            .find_map(|(index, entry)| match entry {
                Some(m) if m.drive == drive => Some((index, m.backend)),
                _ => None,
            })
    }

    /// Linear scan of the open-file table by descriptor
    fn file_index(&self, fd: Fd) -> Option<usize> {
        if fd < FILES_FD_BASE || fd >= FILES_FD_BASE + CFG_MAX_OPEN_FILES as Fd {
            return None;
        }
        self.files.iter().position(|f| !f.is_free() && f.fd == fd)
    }

    /// Backend serving an open file; the entry's mount is always live
    /// because unmount force-closes its files first
    fn backend_of(&self, index: usize) -> VfsResult<&'a dyn Backend> {
        match self.mounts[self.files[index].mount] {
            Some(m) => Ok(m.backend),
            None => Err(VfsError::BadFd),
        }
    }
}

/// VFS registry: mount table plus open-file table
pub struct Vfs<'a> {
    state: UnsafeCell<VfsState<'a>>,
    lock: Mutex,
}

// The interior state is only touched under `lock`, and backends are
// required to be Sync by the trait bound.
unsafe impl Sync for Vfs<'_> {}
unsafe impl Send for Vfs<'_> {}

impl<'a> Vfs<'a> {
    /// Create an empty registry; [`Vfs::init`] must run before use
    pub const fn new() -> Self {
        Vfs {
            state: UnsafeCell::new(VfsState {
                mounts: [None; CFG_MAX_MOUNTS],
                files: [OpenFile::EMPTY; CFG_MAX_OPEN_FILES],
            }),
            lock: Mutex::new(),
        }
    }

    /// Claim the dispatcher lock's hardware spinlock
    pub fn init(&self) {
        self.lock.init();
    }

    fn with_lock<R>(&self, f: impl FnOnce(&mut VfsState<'a>) -> R) -> R {
        self.lock.enter_blocking();
        let result = f(unsafe { &mut *self.state.get() });
        self.lock.exit();
        result
    }

    /// Register `backend` under the drive letter of `path` (`"X:"`)
    ///
    /// Runs the backend's `init` hook, then `mount`. The entry is
    /// committed only when both succeed, so a failed mount leaves no
    /// trace in the table.
    pub fn mount(&self, path: &str, backend: &'a dyn Backend) -> VfsResult<()> {
        let drive = mount::drive_letter(path).ok_or(VfsError::NoEntry)?;
        self.with_lock(|st| {
            if st.mount_of(drive).is_some() {
                crate::error!("vfs: drive {} already mounted", drive);
                return Err(VfsError::NoMemory);
            }
            let slot = st
                .mounts
                .iter_mut()
                .position(|m| m.is_none())
                .ok_or(VfsError::NoMemory)?;
            backend.init()?;
            backend.mount()?;
            st.mounts[slot] = Some(MountEntry { drive, backend });
            crate::trace!("vfs: mounted drive {}", drive);
            Ok(())
        })
    }

    /// Unregister the backend mounted under the drive letter of `path`
    ///
    /// Force-closes every open file belonging to the mount before the
    /// backend's `unmount` hook runs; the entry is removed from the
    /// table regardless of the hook's result.
    pub fn unmount(&self, path: &str) -> VfsResult<()> {
        let drive = mount::drive_letter(path).ok_or(VfsError::NoEntry)?;
        self.with_lock(|st| {
            let (index, backend) = st.mount_of(drive).ok_or(VfsError::NoEntry)?;
            for f in st.files.iter_mut() {
                if !f.is_free() && f.mount == index {
                    let _ = backend.close(f.file);
                    f.clear();
                }
            }
            let result = backend.unmount();
            st.mounts[index] = None;
            crate::trace!("vfs: unmounted drive {}", drive);
            result
        })
    }

    /// Open `path` (`"X:/..."`) and return its descriptor
    ///
    /// A path that is already open is refused: the guard prevents two
    /// descriptors from aliasing one backend resource.
    pub fn open(&self, path: &str, flags: u32, mode: Mode) -> VfsResult<Fd> {
        let drive = mount::full_path_drive(path).ok_or(VfsError::NoEntry)?;
        if path.len() > CFG_PATH_MAX {
            return Err(VfsError::NoEntry);
        }
        self.with_lock(|st| {
            if st
                .files
                .iter()
                .any(|f| !f.is_free() && f.path_matches(path))
            {
                crate::error!("vfs: path already open");
                return Err(VfsError::Access);
            }
            let (index, backend) = st.mount_of(drive).ok_or(VfsError::NoEntry)?;
            let slot = st
                .files
                .iter()
                .position(|f| f.is_free())
                .ok_or(VfsError::NoMemory)?;
            let file = backend.open(path, flags, mode)?;
            let entry = &mut st.files[slot];
            entry.fd = FILES_FD_BASE + slot as Fd;
            entry.file = file;
            entry.mount = index;
            entry.set_path(path);
            Ok(entry.fd)
        })
    }

    /// Close a descriptor
    ///
    /// The table slot is returned to the free pool even when the
    /// backend's close hook fails, so a failed close never leaks a
    /// descriptor.
    pub fn close(&self, fd: Fd) -> VfsResult<()> {
        self.with_lock(|st| {
            let index = st.file_index(fd).ok_or(VfsError::BadFd)?;
            let backend = st.backend_of(index)?;
            let result = backend.close(st.files[index].file);
            st.files[index].clear();
            result
        })
    }

    /// Read from a descriptor into `buf`
    pub fn read(&self, fd: Fd, buf: &mut [u8]) -> VfsResult<usize> {
        self.with_lock(|st| {
            let index = st.file_index(fd).ok_or(VfsError::BadFd)?;
            let backend = st.backend_of(index)?;
            backend.read(st.files[index].file, buf)
        })
    }

    /// Write `buf` to a descriptor
    pub fn write(&self, fd: Fd, buf: &[u8]) -> VfsResult<usize> {
        self.with_lock(|st| {
            let index = st.file_index(fd).ok_or(VfsError::BadFd)?;
            let backend = st.backend_of(index)?;
            backend.write(st.files[index].file, buf)
        })
    }

    /// Reposition a descriptor's file cursor
    pub fn seek(&self, fd: Fd, offset: i64, whence: SeekWhence) -> VfsResult<i64> {
        self.with_lock(|st| {
            let index = st.file_index(fd).ok_or(VfsError::BadFd)?;
            let backend = st.backend_of(index)?;
            backend.seek(st.files[index].file, offset, whence)
        })
    }

    /// Create a directory at `path` (`"X:/..."`)
    pub fn mkdir(&self, path: &str, mode: Mode) -> VfsResult<()> {
        let drive = mount::full_path_drive(path).ok_or(VfsError::NoEntry)?;
        self.with_lock(|st| {
            let (_, backend) = st.mount_of(drive).ok_or(VfsError::NoEntry)?;
            backend.mkdir(path, mode)
        })
    }
}

impl Default for Vfs<'_> {
    fn default() -> Self {
        Self::new()
    }
}
