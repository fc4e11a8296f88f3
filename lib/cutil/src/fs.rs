//! File system utilities for image folders: extension filtering, sorted
//! directory listings and file names.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

/// Checks whether `path` ends in one of `extensions`, ignoring case.
///
/// Extensions are given without the leading dot.
///
/// # Examples
///
/// ```
/// use cutil::fs::has_extension;
///
/// assert!(has_extension("road/IMG_01.JPG", &["jpg", "png"]));
/// assert!(!has_extension("notes.txt", &["jpg", "png"]));
/// assert!(!has_extension("jpg", &["jpg"]));
/// ```
pub fn has_extension(path: impl AsRef<Path>, extensions: &[impl AsRef<str>]) -> bool {
    match path.as_ref().extension().and_then(|ext| ext.to_str()) {
        Some(ext) => extensions
            .iter()
            .any(|allowed| allowed.as_ref().eq_ignore_ascii_case(ext)),
        None => false,
    }
}

/// Lists the regular files directly inside `dir` whose extension is in
/// `extensions`, sorted by path.
///
/// The listing is not recursive.
///
/// # Examples
///
/// ```no_run
/// use cutil::fs::list_files_with_extensions;
///
/// let images = list_files_with_extensions("Images", &["png", "jpg", "jpeg"]).unwrap();
/// println!("{} images", images.len());
/// ```
pub fn list_files_with_extensions(
    dir: impl AsRef<Path>,
    extensions: &[impl AsRef<str>],
) -> io::Result<Vec<PathBuf>> {
    let mut files = vec![];

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }

        let path = entry.path();
        if has_extension(&path, extensions) {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}

/// Checks if a file exists at the given path.
///
/// Returns `true` if the path exists and is a file, `false` otherwise.
pub fn file_exist(path: impl AsRef<Path>) -> bool {
    match fs::metadata(path) {
        Ok(md) => md.is_file(),
        _ => false,
    }
}

/// Extracts the file name from a path.
///
/// Returns an empty string if the path has no file name.
///
/// # Examples
///
/// ```
/// use cutil::fs::file_name;
///
/// assert_eq!(file_name("/path/to/file.txt"), "file.txt");
/// assert_eq!(file_name("/path/to/directory/"), "directory");
/// ```
pub fn file_name(path: impl AsRef<Path>) -> String {
    path.as_ref()
        .file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string()
}

/// Builds `dir/<prefix><file name of path>`.
///
/// # Examples
///
/// ```
/// use cutil::fs::prefixed_path;
/// use std::path::Path;
///
/// assert_eq!(
///     prefixed_path("in/road.png", "out", "rain_"),
///     Path::new("out/rain_road.png")
/// );
/// ```
pub fn prefixed_path(path: impl AsRef<Path>, dir: impl AsRef<Path>, prefix: &str) -> PathBuf {
    dir.as_ref()
        .join(format!("{prefix}{}", file_name(path)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_has_extension() {
        assert!(has_extension("a.png", &["png"]));
        assert!(has_extension("a.PNG", &["png"]));
        assert!(has_extension("a.Jpeg", &["jpg", "jpeg"]));
        assert!(!has_extension("a.png.bak", &["png"]));
        assert!(!has_extension("png", &["png"]));
        assert!(!has_extension("a.webp", &["png", "jpg"]));
    }

    #[test]
    fn test_list_files_with_extensions() -> io::Result<()> {
        let temp_dir = tempdir()?;

        for name in ["c.jpg", "a.PNG", "b.jpeg", "notes.txt", "d.bmp"] {
            fs::write(temp_dir.path().join(name), b"x")?;
        }
        fs::create_dir(temp_dir.path().join("nested.png"))?;
        fs::write(temp_dir.path().join("nested.png").join("e.png"), b"x")?;

        let files = list_files_with_extensions(temp_dir.path(), &["png", "jpg", "jpeg"])?;
        let names: Vec<String> = files.iter().map(file_name).collect();

        assert_eq!(names, vec!["a.PNG", "b.jpeg", "c.jpg"]);
        Ok(())
    }

    #[test]
    fn test_list_missing_dir() {
        let temp_dir = tempdir().unwrap();
        assert!(list_files_with_extensions(temp_dir.path().join("missing"), &["png"]).is_err());
    }

    #[test]
    fn test_file_exist() {
        let temp_dir = tempdir().unwrap();
        let file_path = temp_dir.path().join("test.txt");

        assert!(!file_exist(&file_path));

        fs::write(&file_path, "test").unwrap();
        assert!(file_exist(&file_path));

        assert!(!file_exist(temp_dir.path()));
    }

    #[test]
    fn test_file_name() {
        assert_eq!(file_name("/path/to/file.txt"), "file.txt");
        assert_eq!(file_name("file.txt"), "file.txt");
        assert_eq!(file_name("/path/to/directory/"), "directory");
        assert_eq!(file_name(""), "");
    }

    #[test]
    fn test_prefixed_path() {
        assert_eq!(
            prefixed_path("/data/Images/p1.jpg", "/out/Night", "night_d_"),
            PathBuf::from("/out/Night/night_d_p1.jpg")
        );
        assert_eq!(
            prefixed_path("p1.jpg", "low_speed", ""),
            PathBuf::from("low_speed/p1.jpg")
        );
    }
}
