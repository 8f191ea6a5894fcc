//! Zip archive extraction
//!
//! User-added packages are usually distributed as `.zip` files whose single
//! top-level folder holds `info.json`. Extraction validates every entry path
//! to prevent directory traversal.

use crate::LoaderResult;
use modex_core::error::ModexError;
use std::fs;
use std::io::{Read, Seek};
use std::path::{Component, Path, PathBuf};
use zip::ZipArchive;

/// Extract a zip archive into `dest_dir`. `origin` names the archive in errors.
pub fn extract_zip<R: Read + Seek>(reader: R, dest_dir: &Path, origin: &str) -> LoaderResult<()> {
    let archive_error = |message: String| ModexError::Archive {
        path: origin.to_string(),
        message,
    };

    let mut archive = ZipArchive::new(reader).map_err(|e| archive_error(e.to_string()))?;

    fs::create_dir_all(dest_dir)
        .map_err(|e| ModexError::io(format!("Failed to create {}", dest_dir.display()), e))?;

    for index in 0..archive.len() {
        let mut entry = archive
            .by_index(index)
            .map_err(|e| archive_error(e.to_string()))?;

        let entry_name = entry.name().to_string();
        let safe_path = validate_extract_path(Path::new(&entry_name), dest_dir)
            .map_err(archive_error)?;

        if entry.is_dir() {
            fs::create_dir_all(&safe_path)
                .map_err(|e| ModexError::io(format!("Failed to create {}", safe_path.display()), e))?;
            continue;
        }

        if let Some(parent) = safe_path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| ModexError::io(format!("Failed to create {}", parent.display()), e))?;
        }

        let mut file = fs::File::create(&safe_path)
            .map_err(|e| ModexError::io(format!("Failed to create {}", safe_path.display()), e))?;
        std::io::copy(&mut entry, &mut file)
            .map_err(|e| ModexError::io(format!("Failed to extract {}", entry_name), e))?;

        #[cfg(unix)]
        if let Some(mode) = entry.unix_mode() {
            use std::os::unix::fs::PermissionsExt;
            let _ = fs::set_permissions(&safe_path, fs::Permissions::from_mode(mode));
        }
    }

    Ok(())
}

/// Directory of an extracted archive that holds `manifest`: the archive root
/// itself, or its single top-level folder.
pub fn locate_package_root(extracted: &Path, manifest: &str) -> Option<PathBuf> {
    if extracted.join(manifest).is_file() {
        return Some(extracted.to_path_buf());
    }

    let mut candidates = fs::read_dir(extracted)
        .ok()?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_dir() && path.join(manifest).is_file());

    let first = candidates.next()?;
    match candidates.next() {
        Some(_) => None,
        None => Some(first),
    }
}

/// Validate extraction path to prevent directory traversal
fn validate_extract_path(entry_path: &Path, dest_dir: &Path) -> Result<PathBuf, String> {
    let mut safe_path = dest_dir.to_path_buf();

    for component in entry_path.components() {
        match component {
            Component::Normal(name) => safe_path.push(name),
            Component::CurDir => continue,
            Component::ParentDir => {
                return Err(format!("directory traversal: {}", entry_path.display()));
            }
            Component::RootDir | Component::Prefix(_) => {
                return Err(format!("absolute path: {}", entry_path.display()));
            }
        }
    }

    if safe_path == dest_dir {
        return Err(format!("empty entry name: '{}'", entry_path.display()));
    }

    Ok(safe_path)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use zip::write::FileOptions;
    use zip::ZipWriter;

    /// Build an in-memory zip from `(name, contents)` pairs; names ending in
    /// `/` become directories.
    pub(crate) fn build_zip(entries: &[(&str, &str)]) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, contents) in entries {
            if name.ends_with('/') {
                writer.add_directory(*name, FileOptions::default()).unwrap();
            } else {
                writer.start_file(*name, FileOptions::default()).unwrap();
                writer.write_all(contents.as_bytes()).unwrap();
            }
        }
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn test_extract_simple_zip() {
        let temp_dir = tempfile::tempdir().unwrap();
        let dest = temp_dir.path().join("extract");
        let data = build_zip(&[
            ("mymod_1.0.0/", ""),
            ("mymod_1.0.0/info.json", r#"{"name":"mymod"}"#),
            ("mymod_1.0.0/prototypes/item.lua", "return {}"),
        ]);

        extract_zip(Cursor::new(data), &dest, "mymod_1.0.0.zip").unwrap();

        let manifest = dest.join("mymod_1.0.0").join("info.json");
        assert_eq!(fs::read_to_string(manifest).unwrap(), r#"{"name":"mymod"}"#);
        assert!(dest.join("mymod_1.0.0/prototypes/item.lua").is_file());
    }

    #[test]
    fn test_extract_rejects_garbage() {
        let temp_dir = tempfile::tempdir().unwrap();
        let err = extract_zip(Cursor::new(b"not a zip".to_vec()), temp_dir.path(), "bad.zip")
            .unwrap_err();
        assert!(matches!(err, ModexError::Archive { ref path, .. } if path == "bad.zip"));
    }

    #[test]
    fn test_validate_extract_path() {
        let dest = Path::new("/tmp/dest");
        assert_eq!(
            validate_extract_path(Path::new("a/./b.lua"), dest).unwrap(),
            PathBuf::from("/tmp/dest/a/b.lua")
        );
        assert!(validate_extract_path(Path::new("../escape.lua"), dest).is_err());
        assert!(validate_extract_path(Path::new("a/../../escape.lua"), dest).is_err());
        assert!(validate_extract_path(Path::new("/etc/passwd"), dest).is_err());
        assert!(validate_extract_path(Path::new("."), dest).is_err());
    }

    #[test]
    fn test_locate_package_root() {
        let temp_dir = tempfile::tempdir().unwrap();
        let root = temp_dir.path();

        assert_eq!(locate_package_root(root, "info.json"), None);

        fs::create_dir_all(root.join("mymod_1.0.0")).unwrap();
        fs::write(root.join("mymod_1.0.0/info.json"), "{}").unwrap();
        assert_eq!(
            locate_package_root(root, "info.json"),
            Some(root.join("mymod_1.0.0"))
        );

        fs::create_dir_all(root.join("second")).unwrap();
        fs::write(root.join("second/info.json"), "{}").unwrap();
        assert_eq!(locate_package_root(root, "info.json"), None);

        fs::write(root.join("info.json"), "{}").unwrap();
        assert_eq!(locate_package_root(root, "info.json"), Some(root.to_path_buf()));
    }
}
