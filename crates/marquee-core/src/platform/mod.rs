use std::io;
use std::path::{Component, Path, PathBuf};

#[cfg(unix)]
pub fn symlink_file(target: &Path, link: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
pub fn symlink_file(target: &Path, link: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_file(target, link)
}

/// `target` expressed relative to the directory `base`. Both paths should be
/// absolute. Paths on different roots (another drive) are returned as is.
pub fn relative_path(target: &Path, base: &Path) -> PathBuf {
    let target_parts: Vec<Component> = target.components().collect();
    let base_parts: Vec<Component> = base.components().collect();

    let common = target_parts
        .iter()
        .zip(base_parts.iter())
        .take_while(|(a, b)| a == b)
        .count();
    if common == 0 {
        return target.to_path_buf();
    }

    let mut relative = PathBuf::new();
    for _ in common..base_parts.len() {
        relative.push("..");
    }
    for part in &target_parts[common..] {
        relative.push(part.as_os_str());
    }
    relative
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_sibling_tree() {
        let rel = relative_path(
            Path::new("/media/in/Movie.2021.mkv"),
            Path::new("/media/Movie (2021)"),
        );
        assert_eq!(rel, PathBuf::from("../in/Movie.2021.mkv"));
    }

    #[test]
    fn test_relative_nested_deeper() {
        let rel = relative_path(
            Path::new("/media/in/show/S01E01.mkv"),
            Path::new("/media/Show (2019)/Season 01"),
        );
        assert_eq!(rel, PathBuf::from("../../in/show/S01E01.mkv"));
    }

    #[test]
    fn test_relative_same_directory() {
        let rel = relative_path(Path::new("/media/a.mkv"), Path::new("/media"));
        assert_eq!(rel, PathBuf::from("a.mkv"));
    }
}
