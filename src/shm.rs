//! Anonymous shared-memory allocation for pixel buffers.
//!
//! Buffers handed to the compositor are backed by POSIX shared memory: a
//! randomly named object opened with `O_EXCL` and unlinked immediately, so
//! the open descriptor is the only reference left. Name collisions are
//! retried up to [`NAME_ATTEMPTS`] times; resizing retries interrupted
//! syscalls. The open and resize steps are injectable so the retry logic is
//! testable without touching `/dev/shm`.

use std::ffi::{CStr, CString};
use std::io;
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd};

use rand::distributions::Alphanumeric;
use rand::Rng;

use crate::error::ClientError;

/// Upper bound on randomized-name collisions before giving up.
pub const NAME_ATTEMPTS: u32 = 100;

fn random_name() -> CString {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..6).map(|_| rng.sample(Alphanumeric) as char).collect();
    CString::new(format!("/tessera-{suffix}")).unwrap()
}

fn shm_open_excl(name: &CStr) -> io::Result<OwnedFd> {
    let fd = unsafe {
        libc::shm_open(
            name.as_ptr(),
            libc::O_RDWR | libc::O_CREAT | libc::O_EXCL,
            0o600 as libc::mode_t,
        )
    };
    if fd < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(unsafe { OwnedFd::from_raw_fd(fd) })
}

/// Runs the create-retry loop with an injected opener.
///
/// Only an already-exists failure consumes an attempt and retries with a
/// fresh name; any other failure aborts immediately.
fn open_anonymous_with<F>(mut open: F) -> Result<OwnedFd, ClientError>
where
    F: FnMut(&CStr) -> io::Result<OwnedFd>,
{
    for _ in 0..NAME_ATTEMPTS {
        let name = random_name();
        match open(&name) {
            Ok(fd) => return Ok(fd),
            Err(err) if err.raw_os_error() == Some(libc::EEXIST) => continue,
            Err(err) => return Err(ClientError::AllocationFailed(err)),
        }
    }
    Err(ClientError::NameExhaustion(NAME_ATTEMPTS))
}

/// Creates an unnamed shared-memory descriptor of size zero.
pub fn open_anonymous() -> Result<OwnedFd, ClientError> {
    open_anonymous_with(|name| {
        let fd = shm_open_excl(name)?;
        // Unlink right away; the descriptor is the only reference left.
        unsafe { libc::shm_unlink(name.as_ptr()) };
        Ok(fd)
    })
}

/// Runs a resize operation, retrying interrupted syscalls.
fn resize_with<F>(mut resize: F) -> Result<(), ClientError>
where
    F: FnMut() -> io::Result<()>,
{
    loop {
        match resize() {
            Ok(()) => return Ok(()),
            Err(err) if err.raw_os_error() == Some(libc::EINTR) => continue,
            Err(err) => return Err(ClientError::AllocationFailed(err)),
        }
    }
}

/// Allocates anonymous shared memory of the given size.
///
/// On resize failure the descriptor is closed before the error is returned.
pub fn allocate(len: usize) -> Result<OwnedFd, ClientError> {
    let fd = open_anonymous()?;
    resize_with(|| {
        let rc = unsafe { libc::ftruncate(fd.as_raw_fd(), len as libc::off_t) };
        if rc < 0 {
            Err(io::Error::last_os_error())
        } else {
            Ok(())
        }
    })?;
    Ok(fd)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::{Read, Seek, SeekFrom, Write};
    use std::path::Path;

    #[test]
    fn test_allocate_sizes_object_and_leaves_no_name_behind() {
        if !Path::new("/dev/shm").is_dir() {
            return;
        }
        let fd = allocate(4096).unwrap();
        let file = File::from(fd);
        assert_eq!(file.metadata().unwrap().len(), 4096);

        let leaked: Vec<_> = std::fs::read_dir("/dev/shm")
            .unwrap()
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.file_name())
            .filter(|name| name.to_string_lossy().starts_with("tessera-"))
            .collect();
        assert!(leaked.is_empty(), "shm names left behind: {leaked:?}");
    }

    #[test]
    fn test_allocations_are_independent_objects() {
        if !Path::new("/dev/shm").is_dir() {
            return;
        }
        let mut first = File::from(allocate(16).unwrap());
        let mut second = File::from(allocate(16).unwrap());
        first.write_all(b"tessera").unwrap();

        let mut contents = [0u8; 7];
        second.seek(SeekFrom::Start(0)).unwrap();
        second.read_exact(&mut contents).unwrap();
        assert_eq!(contents, [0u8; 7], "writes must not alias across objects");
    }

    #[test]
    fn test_name_exhaustion_after_bounded_attempts() {
        let mut attempts = 0u32;
        let result = open_anonymous_with(|_| {
            attempts += 1;
            Err(io::Error::from_raw_os_error(libc::EEXIST))
        });
        match result {
            Err(ClientError::NameExhaustion(n)) => assert_eq!(n, NAME_ATTEMPTS),
            other => panic!("expected NameExhaustion, got {other:?}"),
        }
        assert_eq!(attempts, NAME_ATTEMPTS);
    }

    #[test]
    fn test_collision_retries_with_fresh_name() {
        let mut seen = Vec::new();
        let fd = open_anonymous_with(|name| {
            seen.push(name.to_owned());
            if seen.len() < 3 {
                Err(io::Error::from_raw_os_error(libc::EEXIST))
            } else {
                Ok(OwnedFd::from(tempfile::tempfile()?))
            }
        })
        .unwrap();
        drop(fd);

        assert_eq!(seen.len(), 3);
        assert_ne!(seen[0], seen[1], "collision must draw a new name");
    }

    #[test]
    fn test_non_collision_error_is_not_retried() {
        let mut attempts = 0u32;
        let result = open_anonymous_with(|_| {
            attempts += 1;
            Err(io::Error::from_raw_os_error(libc::EACCES))
        });
        assert!(matches!(result, Err(ClientError::AllocationFailed(_))));
        assert_eq!(attempts, 1);
    }

    #[test]
    fn test_resize_retries_interrupted_calls() {
        let mut calls = 0u32;
        let result = resize_with(|| {
            calls += 1;
            if calls < 3 {
                Err(io::Error::from_raw_os_error(libc::EINTR))
            } else {
                Ok(())
            }
        });
        assert!(result.is_ok());
        assert_eq!(calls, 3);
    }

    #[test]
    fn test_resize_failure_is_reported() {
        let result = resize_with(|| Err(io::Error::from_raw_os_error(libc::ENOSPC)));
        assert!(matches!(result, Err(ClientError::AllocationFailed(_))));
    }
}
