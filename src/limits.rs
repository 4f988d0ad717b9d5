// SPDX-License-Identifier: MIT
// Copyright 2025. Thomas Bertschinger

use std::io;

/// Descriptors kept free for stdio, the logger and whatever else the process has open.
const FD_HEADROOM: u64 = 64;

/// The descriptor limit a run of `num_connections` connections asks for.
pub fn fd_limit_for(num_connections: usize) -> u64 {
    (num_connections as u64).saturating_add(FD_HEADROOM)
}

/// Raise the soft limit on open file descriptors to at least `wanted`, capped at the hard limit.
///
/// Returns the soft limit in effect afterwards.
#[cfg(unix)]
pub fn raise_fd_limit(wanted: u64) -> io::Result<u64> {
    let mut limit = libc::rlimit {
        rlim_cur: 0,
        rlim_max: 0,
    };

    // SAFETY: `limit` is a valid, writable rlimit.
    if unsafe { libc::getrlimit(libc::RLIMIT_NOFILE, &mut limit) } != 0 {
        return Err(io::Error::last_os_error());
    }

    let wanted = wanted as libc::rlim_t;
    if limit.rlim_cur >= wanted {
        return Ok(limit.rlim_cur as u64);
    }

    limit.rlim_cur = if limit.rlim_max == libc::RLIM_INFINITY {
        wanted
    } else {
        wanted.min(limit.rlim_max)
    };

    // SAFETY: `limit` was filled in by getrlimit and only the soft limit was raised, never past the
    // hard one.
    if unsafe { libc::setrlimit(libc::RLIMIT_NOFILE, &limit) } != 0 {
        return Err(io::Error::last_os_error());
    }

    Ok(limit.rlim_cur as u64)
}

#[cfg(not(unix))]
pub fn raise_fd_limit(wanted: u64) -> io::Result<u64> {
    Ok(wanted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headroom_is_added() {
        assert_eq!(fd_limit_for(0), FD_HEADROOM);
        assert_eq!(fd_limit_for(100), 100 + FD_HEADROOM);
    }

    #[test]
    fn huge_counts_saturate() {
        assert_eq!(fd_limit_for(usize::MAX), u64::MAX);
    }

    #[cfg(unix)]
    #[test]
    fn already_high_enough_is_left_alone() {
        let current = raise_fd_limit(0).unwrap();
        assert!(current > 0);
        assert_eq!(raise_fd_limit(1).unwrap(), current);
    }

    #[cfg(unix)]
    #[test]
    fn raising_never_lowers() {
        let before = raise_fd_limit(0).unwrap();
        let after = raise_fd_limit(before.saturating_add(16)).unwrap();
        assert!(after >= before);
    }
}
