use std::path::{Component, Path, PathBuf};

/// Make `path` absolute against `base` and fold `.`/`..` lexically.
///
/// Symlinks are not resolved, so two spellings of the same file compare
/// equal only when they normalize to the same text.
pub fn absolute_path(path: &Path, base: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    };
    normalize_lexically(&joined)
}

pub fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            // `..` at the root stays at the root.
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other.as_os_str()),
        }
    }
    if out.as_os_str().is_empty() {
        out.push(".");
    }
    out
}

pub fn display_path(path: &Path, base: Option<&Path>) -> String {
    if let Some(base) = base {
        if let Ok(relative) = path.strip_prefix(base) {
            return relative.display().to_string();
        }
    }
    path.display().to_string()
}

pub fn first_line(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes)
        .trim()
        .lines()
        .next()
        .unwrap_or_default()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absolute_path_folds_dot_segments() {
        let base = Path::new("/work/proj");
        assert_eq!(
            absolute_path(Path::new("./Sub Dir/../App/Info.plist"), base),
            PathBuf::from("/work/proj/App/Info.plist")
        );
    }

    #[test]
    fn absolute_path_keeps_absolute_input() {
        let base = Path::new("/work/proj");
        assert_eq!(
            absolute_path(Path::new("/abs/./CustomName.plist"), base),
            PathBuf::from("/abs/CustomName.plist")
        );
    }

    #[test]
    fn parent_dir_does_not_escape_root() {
        assert_eq!(
            normalize_lexically(Path::new("/../a")),
            PathBuf::from("/a")
        );
    }

    #[test]
    fn project_parent_resolves_to_folder() {
        assert_eq!(
            normalize_lexically(Path::new("/work/App.xcodeproj/..")),
            PathBuf::from("/work")
        );
    }

    #[test]
    fn first_line_skips_leading_blank_output() {
        assert_eq!(first_line(b"\n  error: boom\nmore\n"), "error: boom");
        assert_eq!(first_line(b""), "");
    }
}
