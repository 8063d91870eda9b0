use std::path::{Path, PathBuf};

/// Key the persisted session is stored under.
pub const SESSION_STORAGE_KEY: &str = "auth-storage";

/// Home directory from HOME (unix) or USERPROFILE (windows).
pub fn home_dir() -> Option<PathBuf> {
    std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .ok()
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
}

#[inline]
pub fn console_root(home: &Path) -> PathBuf { home.join(".dicri") }

#[inline]
pub fn session_file_in(home: &Path) -> PathBuf { console_root(home).join(format!("{}.json", SESSION_STORAGE_KEY)) }

/// Default session file; falls back to the working directory when no home is known.
pub fn default_session_file() -> PathBuf {
    match home_dir() {
        Some(h) => session_file_in(&h),
        None => PathBuf::from(format!("{}.json", SESSION_STORAGE_KEY)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_file_layout() {
        let p = session_file_in(Path::new("/home/ana"));
        assert_eq!(p, PathBuf::from("/home/ana/.dicri/auth-storage.json"));
    }
}
