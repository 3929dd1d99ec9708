//! The directory-listing service payload: a recursive walk serialized as
//! JSON. Listings of similar trees share most of their bytes, which makes
//! them a natural corpus for dictionary compression.

use std::path::{Component, Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FileEntry {
    /// Path relative to the listing root, with forward slashes.
    pub path: String,
    pub size: u64,
    pub is_dir: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ListResponse {
    pub root: String,
    pub entries: Vec<FileEntry>,
}

/// Walk `root` up to `max_depth` levels deep (0 lists only the root's own
/// entries). Entries come back sorted by path so the same tree always
/// serializes to the same bytes. Unreadable subdirectories are skipped, not
/// fatal.
pub fn list_dir(root: &Path, max_depth: u32) -> anyhow::Result<ListResponse> {
    let mut entries = Vec::new();
    walk(root, root, 0, max_depth, &mut entries)
        .with_context(|| format!("listing {:?}", root))?;
    entries.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(ListResponse {
        root: root.display().to_string(),
        entries,
    })
}

fn walk(
    root: &Path,
    dir: &Path,
    depth: u32,
    max_depth: u32,
    entries: &mut Vec<FileEntry>,
) -> anyhow::Result<()> {
    let read = match std::fs::read_dir(dir) {
        Ok(read) => read,
        // Top-level failures are errors; deeper ones (permissions, races)
        // just prune the branch.
        Err(e) if depth == 0 => return Err(e.into()),
        Err(_) => return Ok(()),
    };
    for entry in read {
        let entry = match entry {
            Ok(entry) => entry,
            Err(_) => continue,
        };
        let meta = match entry.metadata() {
            Ok(meta) => meta,
            Err(_) => continue,
        };
        let rel = entry
            .path()
            .strip_prefix(root)
            .map(relative_string)
            .unwrap_or_else(|_| entry.file_name().to_string_lossy().into_owned());
        let is_dir = meta.is_dir();
        entries.push(FileEntry {
            path: rel,
            size: if is_dir { 0 } else { meta.len() },
            is_dir,
        });
        if is_dir && depth < max_depth {
            walk(root, &entry.path(), depth + 1, max_depth, entries)?;
        }
    }
    Ok(())
}

fn relative_string(path: &Path) -> String {
    let parts: Vec<String> = path
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    parts.join("/")
}

/// Reject request paths that could escape the served root.
pub fn sanitize_request_path(path: &str) -> anyhow::Result<PathBuf> {
    let path = Path::new(path);
    if path.is_absolute() {
        anyhow::bail!("absolute paths are not served");
    }
    for component in path.components() {
        match component {
            Component::Normal(_) | Component::CurDir => {}
            _ => anyhow::bail!("path {:?} escapes the served root", path),
        }
    }
    Ok(path.to_path_buf())
}

/// One serialized listing per immediate subdirectory, plus the root itself.
/// Enough responses to train a dictionary on, drawn from the tree actually
/// being served.
pub fn response_samples(root: &Path, max_depth: u32) -> anyhow::Result<Vec<Vec<u8>>> {
    let mut samples = vec![serde_json::to_vec(&list_dir(root, max_depth)?)?];
    for entry in std::fs::read_dir(root)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            let listing = list_dir(&entry.path(), max_depth.saturating_sub(1))?;
            samples.push(serde_json::to_vec(&listing)?);
        }
    }
    Ok(samples)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_tree(name: &str) -> PathBuf {
        let root = std::env::temp_dir().join(format!("dictwire_listing_{name}"));
        let _ = std::fs::remove_dir_all(&root);
        std::fs::create_dir_all(root.join("sub/deeper")).unwrap();
        std::fs::write(root.join("b.txt"), b"bb").unwrap();
        std::fs::write(root.join("a.txt"), b"a").unwrap();
        std::fs::write(root.join("sub/c.txt"), b"ccc").unwrap();
        std::fs::write(root.join("sub/deeper/d.txt"), b"dddd").unwrap();
        root
    }

    #[test]
    fn entries_are_sorted_and_relative() {
        let root = scratch_tree("sorted");
        let listing = list_dir(&root, 8).unwrap();
        let paths: Vec<&str> = listing.entries.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(
            paths,
            ["a.txt", "b.txt", "sub", "sub/c.txt", "sub/deeper", "sub/deeper/d.txt"]
        );
        assert_eq!(listing.entries[0].size, 1);
        assert!(listing.entries[2].is_dir);
        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn depth_zero_stays_at_the_top() {
        let root = scratch_tree("depth");
        let listing = list_dir(&root, 0).unwrap();
        let paths: Vec<&str> = listing.entries.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, ["a.txt", "b.txt", "sub"]);
        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn missing_root_is_an_error() {
        assert!(list_dir(Path::new("/nonexistent/dictwire"), 1).is_err());
    }

    #[test]
    fn request_paths_cannot_escape() {
        assert!(sanitize_request_path("sub/deeper").is_ok());
        assert!(sanitize_request_path("").is_ok());
        assert!(sanitize_request_path("/etc").is_err());
        assert!(sanitize_request_path("../secrets").is_err());
        assert!(sanitize_request_path("sub/../../secrets").is_err());
    }

    #[test]
    fn response_samples_cover_root_and_subdirectories() {
        let root = scratch_tree("samples");
        let samples = response_samples(&root, 4).unwrap();
        // One for the root, one per immediate subdirectory.
        assert_eq!(samples.len(), 2);
        for sample in &samples {
            serde_json::from_slice::<ListResponse>(sample).unwrap();
        }
        let sub: ListResponse = serde_json::from_slice(&samples[1]).unwrap();
        let paths: Vec<&str> = sub.entries.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, ["c.txt", "deeper", "deeper/d.txt"]);
        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn listing_round_trips_through_json() {
        let root = scratch_tree("json");
        let listing = list_dir(&root, 8).unwrap();
        let bytes = serde_json::to_vec(&listing).unwrap();
        let back: ListResponse = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(back, listing);
        let _ = std::fs::remove_dir_all(&root);
    }
}
