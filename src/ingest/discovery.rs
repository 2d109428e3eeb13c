//! Library layout discovery. The source tree is one level of `YYYY-MM`
//! bucket directories, each holding flat media files.

use anyhow::Result;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// One bucket directory and the files directly inside it.
#[derive(Debug, Clone)]
pub struct DirectoryListing {
    pub subdir: String,
    pub path: PathBuf,
    pub files: Vec<String>,
}

/// List every subdirectory of `root` with its files, both sorted by name
/// for consistent ordering.
pub fn list_directories(root: &Path) -> Result<Vec<DirectoryListing>> {
    let mut listings = Vec::new();

    for entry in WalkDir::new(root)
        .min_depth(1)
        .max_depth(1)
        .follow_links(false)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        if !entry.file_type().is_dir() {
            continue;
        }
        let path = entry.path().to_path_buf();
        let subdir = entry.file_name().to_string_lossy().to_string();

        let mut files: Vec<String> = WalkDir::new(&path)
            .min_depth(1)
            .max_depth(1)
            .follow_links(false)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.file_name().to_string_lossy().to_string())
            .collect();
        files.sort();

        listings.push(DirectoryListing { subdir, path, files });
    }

    listings.sort_by(|a, b| a.subdir.cmp(&b.subdir));
    Ok(listings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use tempfile::tempdir;

    #[test]
    fn lists_buckets_with_their_files() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("2024-01")).unwrap();
        fs::create_dir(dir.path().join("2024-02")).unwrap();
        File::create(dir.path().join("2024-01/b.png")).unwrap();
        File::create(dir.path().join("2024-01/a.gif")).unwrap();
        File::create(dir.path().join("2024-02/c.png")).unwrap();
        // loose file at the root is not a bucket
        File::create(dir.path().join("stray.png")).unwrap();

        let listings = list_directories(dir.path()).unwrap();
        assert_eq!(listings.len(), 2);
        assert_eq!(listings[0].subdir, "2024-01");
        assert_eq!(listings[0].files, vec!["a.gif", "b.png"]);
        assert_eq!(listings[1].files, vec!["c.png"]);
    }

    #[test]
    fn empty_root_yields_no_listings() {
        let dir = tempdir().unwrap();
        assert!(list_directories(dir.path()).unwrap().is_empty());
    }
}
