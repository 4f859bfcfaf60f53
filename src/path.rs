//! Virtual device path helpers.
//!
//! Paths are plain `/`-separated strings rooted at `/` (`/ext/nfc/card.nfc`).
//! Synthetic application listings use the `/app:<id>` prefix.

/// Mount prefix of the external storage.
pub const EXT_PATH: &str = "/ext";
/// Prefix of synthetic application paths.
pub const APP_PREFIX: &str = "/app:";
/// Root marker used when nothing else along a path exists.
pub const ROOT: &str = "/";

/// Filename without its parent path.
pub fn basename(path: &str) -> &str {
    path.rfind('/').map(|i| &path[i + 1..]).unwrap_or(path)
}

/// Parent directory, `/` for top-level entries.
pub fn dirname(path: &str) -> &str {
    match path.rfind('/') {
        Some(0) => ROOT,
        Some(i) => &path[..i],
        None => ".",
    }
}

pub fn join_path(base: &str, name: &str) -> String {
    if base.ends_with('/') {
        format!("{}{}", base, name)
    } else {
        format!("{}/{}", base, name)
    }
}

/// Drop the last segment in place. Returns `false` once `/` is reached.
pub fn trim_last_segment(path: &mut String) -> bool {
    if path.as_str() == ROOT || path.is_empty() {
        return false;
    }
    match path.rfind('/') {
        Some(0) | None => {
            path.clear();
            path.push('/');
        }
        Some(i) => path.truncate(i),
    }
    true
}

/// Extension of the last segment including the dot, if any.
/// Dotfiles without a second dot have no extension.
pub fn extension(path: &str) -> Option<&str> {
    let name = basename(path);
    match name.rfind('.') {
        Some(0) | None => None,
        Some(i) => Some(&name[i..]),
    }
}

/// True if `path` is `dir` itself or lives somewhere below it.
pub fn is_under(path: &str, dir: &str) -> bool {
    let dir = dir.trim_end_matches('/');
    if dir.is_empty() {
        return path.starts_with('/');
    }
    path == dir || (path.starts_with(dir) && path[dir.len()..].starts_with('/'))
}

pub fn is_app_path(path: &str) -> bool {
    path.starts_with(APP_PREFIX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basename() {
        assert_eq!(basename("/ext/nfc/card.nfc"), "card.nfc");
        assert_eq!(basename("card.nfc"), "card.nfc");
        assert_eq!(basename("/"), "");
    }

    #[test]
    fn test_dirname() {
        assert_eq!(dirname("/ext/nfc/card.nfc"), "/ext/nfc");
        assert_eq!(dirname("/ext"), "/");
        assert_eq!(dirname("card.nfc"), ".");
    }

    #[test]
    fn test_join_path() {
        assert_eq!(join_path("/ext", "nfc"), "/ext/nfc");
        assert_eq!(join_path("/", "ext"), "/ext");
    }

    #[test]
    fn trim_walks_up_to_root() {
        let mut p = String::from("/ext/nfc/cards");
        assert!(trim_last_segment(&mut p));
        assert_eq!(p, "/ext/nfc");
        assert!(trim_last_segment(&mut p));
        assert_eq!(p, "/ext");
        assert!(trim_last_segment(&mut p));
        assert_eq!(p, "/");
        assert!(!trim_last_segment(&mut p));
        assert_eq!(p, "/");
    }

    #[test]
    fn extension_of_last_segment() {
        assert_eq!(extension("/ext/subghz/gate.sub"), Some(".sub"));
        assert_eq!(extension("/ext/a.tar.gz"), Some(".gz"));
        assert_eq!(extension("/ext/.hidden"), None);
        assert_eq!(extension("/ext/readme"), None);
    }

    #[test]
    fn is_under_respects_segment_boundaries() {
        assert!(is_under("/ext/badusb/demo.txt", "/ext/badusb"));
        assert!(is_under("/ext/badusb", "/ext/badusb/"));
        assert!(!is_under("/ext/badusb2/demo.txt", "/ext/badusb"));
        assert!(!is_under("/ext/nfc/x.txt", "/ext/badusb"));
    }

    #[test]
    fn app_prefix() {
        assert!(is_app_path("/app:u2f/U2F Token"));
        assert!(!is_app_path("/ext/apps/u2f.fap"));
    }
}
