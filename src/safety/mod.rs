use std::path::{Component, Path};

/// A deploy file name must be exactly one plain path component, so every
/// staged file stays directly inside its scratch directory.
pub fn file_name_is_allowed(name: &str) -> bool {
    if name.is_empty() || name.contains(['/', '\\', '\0']) {
        return false;
    }
    let mut comps = Path::new(name).components();
    matches!((comps.next(), comps.next()), (Some(Component::Normal(_)), None))
}

/// Returns true if `program` resolves to an executable on `PATH`
/// (or is an existing path itself).
pub fn program_is_available(program: &str) -> bool {
    which::which(program).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_names_pass() {
        for n in ["index.html", "style.css", "script.js", "favicon.ico", ".well-known"] {
            assert!(file_name_is_allowed(n), "{n}");
        }
    }

    #[test]
    fn traversal_and_nesting_fail() {
        for n in ["", ".", "..", "../evil.html", "a/b.html", "/etc/passwd", "a\\b", "x\0y"] {
            assert!(!file_name_is_allowed(n), "{n:?}");
        }
    }

    #[cfg(unix)]
    #[test]
    fn shell_is_available() {
        assert!(program_is_available("sh"));
        assert!(!program_is_available("definitely-not-a-real-tool-4711"));
    }
}
