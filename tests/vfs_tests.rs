//! Host tests for the VFS dispatcher
//!
//! A RAM-backed stub backend stands in for the real filesystem
//! backends; the dispatcher's mutex runs on the host port, so the
//! tests serialize on one guard like the locking tests do.

use std::collections::HashMap;
use std::sync::{Mutex as StdMutex, MutexGuard};

use picolayer::error::{VfsError, VfsResult};
use picolayer::types::{oflag, FileId, Mode, SeekWhence};
use picolayer::vfs::{Backend, Vfs};

static SERIAL: StdMutex<()> = StdMutex::new(());

fn serial() -> MutexGuard<'static, ()> {
    let guard = SERIAL.lock().unwrap_or_else(|e| e.into_inner());
    picolayer::port::set_core_id(0);
    guard
}

// ============ RAM stub backend ============

struct RamHandle {
    name: String,
    pos: usize,
}

#[derive(Default)]
struct RamState {
    files: HashMap<String, Vec<u8>>,
    dirs: Vec<String>,
    handles: Vec<Option<RamHandle>>,
    mounted: bool,
}

#[derive(Default)]
struct RamBackend {
    state: StdMutex<RamState>,
}

impl Backend for RamBackend {
    fn mount(&self) -> VfsResult<()> {
        self.state.lock().unwrap().mounted = true;
        Ok(())
    }

    fn unmount(&self) -> VfsResult<()> {
        self.state.lock().unwrap().mounted = false;
        Ok(())
    }

    fn open(&self, path: &str, flags: u32, _mode: Mode) -> VfsResult<FileId> {
        let mut st = self.state.lock().unwrap();
        if !st.files.contains_key(path) {
            if flags & oflag::CREAT == 0 {
                return Err(VfsError::NoEntry);
            }
            st.files.insert(path.to_string(), Vec::new());
        } else if flags & oflag::TRUNC != 0 {
            st.files.insert(path.to_string(), Vec::new());
        }
        let handle = RamHandle {
            name: path.to_string(),
            pos: 0,
        };
        st.handles.push(Some(handle));
        Ok(st.handles.len() - 1)
    }

    fn close(&self, file: FileId) -> VfsResult<()> {
        let mut st = self.state.lock().unwrap();
        match st.handles.get_mut(file) {
            Some(slot) if slot.is_some() => {
                *slot = None;
                Ok(())
            }
            _ => Err(VfsError::BadFd),
        }
    }

    fn read(&self, file: FileId, buf: &mut [u8]) -> VfsResult<usize> {
        let mut st = self.state.lock().unwrap();
        let (name, pos) = match st.handles.get(file) {
            Some(Some(h)) => (h.name.clone(), h.pos),
            _ => return Err(VfsError::BadFd),
        };
        let data = st.files.get(&name).ok_or(VfsError::NoEntry)?;
        let n = buf.len().min(data.len().saturating_sub(pos));
        buf[..n].copy_from_slice(&data[pos..pos + n]);
        if let Some(Some(h)) = st.handles.get_mut(file) {
            h.pos += n;
        }
        Ok(n)
    }

    fn write(&self, file: FileId, buf: &[u8]) -> VfsResult<usize> {
        let mut st = self.state.lock().unwrap();
        let (name, pos) = match st.handles.get(file) {
            Some(Some(h)) => (h.name.clone(), h.pos),
            _ => return Err(VfsError::BadFd),
        };
        let data = st.files.get_mut(&name).ok_or(VfsError::NoEntry)?;
        if data.len() < pos + buf.len() {
            data.resize(pos + buf.len(), 0);
        }
        data[pos..pos + buf.len()].copy_from_slice(buf);
        if let Some(Some(h)) = st.handles.get_mut(file) {
            h.pos += buf.len();
        }
        Ok(buf.len())
    }

    fn seek(&self, file: FileId, offset: i64, whence: SeekWhence) -> VfsResult<i64> {
        let mut st = self.state.lock().unwrap();
        let (name, pos) = match st.handles.get(file) {
            Some(Some(h)) => (h.name.clone(), h.pos),
            _ => return Err(VfsError::BadFd),
        };
        let len = st.files.get(&name).ok_or(VfsError::NoEntry)?.len() as i64;
        let new_pos = match whence {
            SeekWhence::Set => offset,
            SeekWhence::Cur => pos as i64 + offset,
            SeekWhence::End => len + offset,
        };
        if new_pos < 0 {
            return Err(VfsError::InvalidArg);
        }
        if let Some(Some(h)) = st.handles.get_mut(file) {
            h.pos = new_pos as usize;
        }
        Ok(new_pos)
    }

    fn mkdir(&self, path: &str, _mode: Mode) -> VfsResult<()> {
        let mut st = self.state.lock().unwrap();
        if st.dirs.iter().any(|d| d == path) {
            return Err(VfsError::Exists);
        }
        st.dirs.push(path.to_string());
        Ok(())
    }
}

/// Backend that implements nothing beyond `mount` and `open`; used to
/// exercise the absent-hook error paths
struct MinimalBackend;

impl Backend for MinimalBackend {
    fn mount(&self) -> VfsResult<()> {
        Ok(())
    }

    fn open(&self, _path: &str, _flags: u32, _mode: Mode) -> VfsResult<FileId> {
        Ok(0)
    }
}

/// Backend whose close hook always fails; used to prove the dispatcher
/// clears the slot anyway
struct FailingCloseBackend;

impl Backend for FailingCloseBackend {
    fn mount(&self) -> VfsResult<()> {
        Ok(())
    }

    fn open(&self, _path: &str, _flags: u32, _mode: Mode) -> VfsResult<FileId> {
        Ok(7)
    }

    fn close(&self, _file: FileId) -> VfsResult<()> {
        Err(VfsError::Io)
    }
}

fn fresh_vfs() -> Vfs<'static> {
    let vfs = Vfs::new();
    vfs.init();
    vfs
}

// ============ Tests ============

mod mount_tests {
    use super::*;

    #[test]
    fn test_open_without_mount() {
        let _guard = serial();
        let vfs = fresh_vfs();
        assert_eq!(vfs.open("Z:/x", oflag::CREAT, 0), Err(VfsError::NoEntry));
    }

    #[test]
    fn test_mount_then_open() {
        let _guard = serial();
        let ram = RamBackend::default();
        let vfs = Vfs::new();
        vfs.init();

        assert_eq!(vfs.mount("Z:", &ram), Ok(()));
        let fd = vfs.open("Z:/x", oflag::CREAT, 0).unwrap();
        assert!(fd >= picolayer::config::FILES_FD_BASE);
        assert_eq!(vfs.close(fd), Ok(()));
        assert_eq!(vfs.unmount("Z:"), Ok(()));
    }

    #[test]
    fn test_mount_path_shapes() {
        let _guard = serial();
        let ram = RamBackend::default();
        let vfs = Vfs::new();
        vfs.init();

        assert_eq!(vfs.mount("R", &ram), Err(VfsError::NoEntry));
        assert_eq!(vfs.mount("", &ram), Err(VfsError::NoEntry));
        assert_eq!(vfs.mount("R:", &ram), Ok(()));

        // Drive letters are case-sensitive single characters
        assert_eq!(vfs.open("r:/a", oflag::CREAT, 0), Err(VfsError::NoEntry));
    }

    #[test]
    fn test_duplicate_mount_refused() {
        let _guard = serial();
        let ram = RamBackend::default();
        let vfs = Vfs::new();
        vfs.init();

        assert_eq!(vfs.mount("R:", &ram), Ok(()));
        assert_eq!(vfs.mount("R:", &ram), Err(VfsError::NoMemory));
    }

    #[test]
    fn test_mount_table_exhaustion() {
        let _guard = serial();
        let ram = RamBackend::default();
        let vfs = Vfs::new();
        vfs.init();

        for name in ["A:", "B:", "C:", "D:"] {
            assert_eq!(vfs.mount(name, &ram), Ok(()));
        }
        assert_eq!(vfs.mount("E:", &ram), Err(VfsError::NoMemory));

        // Unmounting frees the slot
        assert_eq!(vfs.unmount("B:"), Ok(()));
        assert_eq!(vfs.mount("E:", &ram), Ok(()));
    }

    #[test]
    fn test_unmount_unknown_drive() {
        let _guard = serial();
        let vfs = fresh_vfs();
        assert_eq!(vfs.unmount("Q:"), Err(VfsError::NoEntry));
    }

    #[test]
    fn test_unmount_force_closes_files() {
        let _guard = serial();
        let ram = RamBackend::default();
        let vfs = Vfs::new();
        vfs.init();

        vfs.mount("R:", &ram).unwrap();
        let fd = vfs.open("R:/live.txt", oflag::CREAT, 0).unwrap();

        assert_eq!(vfs.unmount("R:"), Ok(()));

        // The descriptor died with the mount
        assert_eq!(vfs.close(fd), Err(VfsError::BadFd));
        // And the backend saw the close: no handle leaked
        assert!(ram
            .state
            .lock()
            .unwrap()
            .handles
            .iter()
            .all(|h| h.is_none()));
    }
}

mod file_tests {
    use picolayer::config::{CFG_MAX_OPEN_FILES, CFG_PATH_MAX, FILES_FD_BASE};

    use super::*;

    #[test]
    fn test_duplicate_open_guard() {
        let _guard = serial();
        let ram = RamBackend::default();
        let vfs = Vfs::new();
        vfs.init();
        vfs.mount("R:", &ram).unwrap();

        let fd = vfs.open("R:/a.txt", oflag::CREAT, 0).unwrap();
        let second = vfs.open("R:/a.txt", oflag::CREAT, 0);
        assert!(second.is_err());
        assert!(second.unwrap_err().errno() < 0);

        // A different path is unaffected, and closing releases the guard
        vfs.open("R:/b.txt", oflag::CREAT, 0).unwrap();
        vfs.close(fd).unwrap();
        let reopened = vfs.open("R:/a.txt", 0, 0).unwrap();
        vfs.close(reopened).unwrap();
    }

    #[test]
    fn test_descriptor_lifecycle_and_reuse() {
        let _guard = serial();
        let ram = RamBackend::default();
        let vfs = Vfs::new();
        vfs.init();
        vfs.mount("R:", &ram).unwrap();

        let mut fds = Vec::new();
        for i in 0..CFG_MAX_OPEN_FILES {
            let fd = vfs.open(&format!("R:/f{}", i), oflag::CREAT, 0).unwrap();
            assert_eq!(fd, FILES_FD_BASE + i as i32);
            fds.push(fd);
        }

        // Table full
        assert_eq!(
            vfs.open("R:/overflow", oflag::CREAT, 0),
            Err(VfsError::NoMemory)
        );

        // Freeing one slot allows exactly one more open, reusing the fd
        let victim = fds[2];
        vfs.close(victim).unwrap();
        assert_eq!(vfs.open("R:/again", oflag::CREAT, 0), Ok(victim));
        assert_eq!(
            vfs.open("R:/overflow", oflag::CREAT, 0),
            Err(VfsError::NoMemory)
        );
    }

    #[test]
    fn test_descriptor_range_checks() {
        let _guard = serial();
        let ram = RamBackend::default();
        let vfs = Vfs::new();
        vfs.init();
        vfs.mount("R:", &ram).unwrap();

        let mut buf = [0u8; 4];
        // Standard streams and out-of-range values never reach a backend
        assert_eq!(vfs.read(0, &mut buf), Err(VfsError::BadFd));
        assert_eq!(vfs.close(2), Err(VfsError::BadFd));
        assert_eq!(vfs.write(99, b"x"), Err(VfsError::BadFd));
        // In-range but not open
        assert_eq!(vfs.close(FILES_FD_BASE + 1), Err(VfsError::BadFd));
    }

    #[test]
    fn test_round_trip() {
        let _guard = serial();
        let ram = RamBackend::default();
        let vfs = Vfs::new();
        vfs.init();
        vfs.mount("R:", &ram).unwrap();

        let fd = vfs.open("R:/data.bin", oflag::CREAT, 0).unwrap();
        let payload = b"hello, flash";
        assert_eq!(vfs.write(fd, payload), Ok(payload.len()));

        assert_eq!(vfs.seek(fd, 0, SeekWhence::Set), Ok(0));
        let mut buf = [0u8; 32];
        assert_eq!(vfs.read(fd, &mut buf), Ok(payload.len()));
        assert_eq!(&buf[..payload.len()], payload);

        // Cursor is now at the end
        assert_eq!(vfs.read(fd, &mut buf), Ok(0));
        vfs.close(fd).unwrap();
    }

    #[test]
    fn test_seek_whence() {
        let _guard = serial();
        let ram = RamBackend::default();
        let vfs = Vfs::new();
        vfs.init();
        vfs.mount("R:", &ram).unwrap();

        let fd = vfs.open("R:/s.bin", oflag::CREAT, 0).unwrap();
        vfs.write(fd, b"0123456789").unwrap();

        assert_eq!(vfs.seek(fd, -4, SeekWhence::End), Ok(6));
        let mut buf = [0u8; 2];
        assert_eq!(vfs.read(fd, &mut buf), Ok(2));
        assert_eq!(&buf, b"67");

        assert_eq!(vfs.seek(fd, -2, SeekWhence::Cur), Ok(6));
        assert_eq!(vfs.seek(fd, -100, SeekWhence::Set), Err(VfsError::InvalidArg));
        vfs.close(fd).unwrap();
    }

    #[test]
    fn test_backend_error_propagates() {
        let _guard = serial();
        let ram = RamBackend::default();
        let vfs = Vfs::new();
        vfs.init();
        vfs.mount("R:", &ram).unwrap();

        // No CREAT, file absent: the backend's NoEntry passes through
        assert_eq!(vfs.open("R:/missing", 0, 0), Err(VfsError::NoEntry));
    }

    #[test]
    fn test_failed_close_still_frees_slot() {
        let _guard = serial();
        let failing = FailingCloseBackend;
        let vfs = Vfs::new();
        vfs.init();
        vfs.mount("F:", &failing).unwrap();

        let fd = vfs.open("F:/x", 0, 0).unwrap();
        assert_eq!(vfs.close(fd), Err(VfsError::Io));
        // Slot was cleared regardless of the backend failure
        assert_eq!(vfs.close(fd), Err(VfsError::BadFd));
        let fd2 = vfs.open("F:/x", 0, 0).unwrap();
        assert_eq!(fd2, fd);
    }

    #[test]
    fn test_absent_hooks() {
        let _guard = serial();
        let minimal = MinimalBackend;
        let vfs = Vfs::new();
        vfs.init();
        vfs.mount("M:", &minimal).unwrap();

        let fd = vfs.open("M:/x", 0, 0).unwrap();
        let mut buf = [0u8; 4];
        assert_eq!(vfs.read(fd, &mut buf), Err(VfsError::BadFd));
        assert_eq!(vfs.write(fd, b"x"), Err(VfsError::BadFd));
        assert_eq!(vfs.seek(fd, 0, SeekWhence::Set), Err(VfsError::BadFd));
        assert_eq!(vfs.mkdir("M:/d", 0), Err(VfsError::Access));

        // close hook is absent too, but the slot is still reclaimed
        assert_eq!(vfs.close(fd), Err(VfsError::BadFd));
        assert_eq!(vfs.open("M:/x", 0, 0), Ok(fd));
    }

    #[test]
    fn test_mkdir() {
        let _guard = serial();
        let ram = RamBackend::default();
        let vfs = Vfs::new();
        vfs.init();
        vfs.mount("R:", &ram).unwrap();

        assert_eq!(vfs.mkdir("R:/logs", 0), Ok(()));
        assert_eq!(vfs.mkdir("R:/logs", 0), Err(VfsError::Exists));
        assert_eq!(vfs.mkdir("Q:/logs", 0), Err(VfsError::NoEntry));
        assert_eq!(vfs.mkdir("R:", 0), Err(VfsError::NoEntry));
    }

    #[test]
    fn test_path_shape_and_length() {
        let _guard = serial();
        let ram = RamBackend::default();
        let vfs = Vfs::new();
        vfs.init();
        vfs.mount("R:", &ram).unwrap();

        // Too short / malformed for full-path resolution
        assert_eq!(vfs.open("R:", oflag::CREAT, 0), Err(VfsError::NoEntry));
        assert_eq!(vfs.open("R:x", oflag::CREAT, 0), Err(VfsError::NoEntry));
        assert_eq!(vfs.open("R:/", oflag::CREAT, 0), Err(VfsError::NoEntry));
        assert_eq!(vfs.open("/ab", oflag::CREAT, 0), Err(VfsError::NoEntry));

        // Longer than the open-file table can record
        let long = format!("R:/{}", "x".repeat(CFG_PATH_MAX));
        assert_eq!(vfs.open(&long, oflag::CREAT, 0), Err(VfsError::NoEntry));
    }
}
