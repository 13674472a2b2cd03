use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Resolves and validates the client executable before any client starts.
///
/// A bare program name (no path separator) is looked up on `PATH`.
pub fn resolve_executable(executable: &Path) -> Result<PathBuf> {
    let resolved = if is_bare_name(executable) {
        which(executable).ok_or_else(|| Error::ExecutableNotFound(executable.to_path_buf()))?
    } else {
        executable.to_path_buf()
    };

    let meta = std::fs::metadata(&resolved).map_err(|err| match err.kind() {
        std::io::ErrorKind::NotFound => Error::ExecutableNotFound(resolved.clone()),
        _ => Error::Io(err),
    })?;

    if !meta.is_file() {
        return Err(Error::ExecutableNotFile(resolved));
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt as _;
        if meta.permissions().mode() & 0o111 == 0 {
            return Err(Error::ExecutableNotInvocable(resolved));
        }
    }

    Ok(resolved)
}

fn is_bare_name(path: &Path) -> bool {
    path.components().count() == 1 && path.parent().is_some_and(|p| p.as_os_str().is_empty())
}

fn which(cmd: &Path) -> Option<PathBuf> {
    let path = std::env::var_os("PATH")?;
    std::env::split_paths(&path).find_map(|dir| {
        let candidate = dir.join(cmd);
        if candidate.is_file() {
            return Some(candidate);
        }

        #[cfg(windows)]
        {
            let candidate = candidate.with_extension("exe");
            if candidate.is_file() {
                return Some(candidate);
            }
        }

        None
    })
}
