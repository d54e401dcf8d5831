//! Archive extraction for downloaded PHP builds.

use std::path::{Path, PathBuf};

use anyhow::Context;
use flate2::read::GzDecoder;
use tar::Archive;

use crate::errors::{PhpvmError, Result};

/// Unpacks a downloaded archive into the directory that contains it.
///
/// Arguments are validated before any I/O. A single top-level folder shared
/// by all entries is stripped, and files in `bin/` are made executable.
///
/// # Errors
///
/// - `InvalidArgument` if the archive path or version is empty
/// - `NotFound` if the archive does not exist
/// - `ExtractionFailed` for any failure while unpacking
pub fn extract(archive_path: &Path, version: &str) -> Result<PathBuf> {
    if archive_path.as_os_str().is_empty() {
        return Err(PhpvmError::invalid_argument("archive path must not be empty"));
    }
    if version.trim().is_empty() {
        return Err(PhpvmError::invalid_argument("version must not be empty"));
    }
    if !archive_path.exists() {
        return Err(PhpvmError::not_found(archive_path));
    }

    let dest_dir = archive_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();

    extract_tar_gz(archive_path, &dest_dir)
        .and_then(|()| set_executable_permissions(&dest_dir))
        .map_err(|e| PhpvmError::extraction_failed(version, format!("{e:#}")))?;

    Ok(dest_dir)
}

/// Extracts a tar.gz archive to the destination directory.
///
/// If all archive entries share a common root folder, it is stripped during
/// extraction (`php-8.1.2/bin/php` becomes `bin/php`).
fn extract_tar_gz(archive_path: &Path, dest_dir: &Path) -> anyhow::Result<()> {
    std::fs::create_dir_all(dest_dir)
        .with_context(|| format!("Failed to create directory: {}", dest_dir.display()))?;

    let strip_prefix = find_common_root_folder(archive_path)?;

    let file = std::fs::File::open(archive_path)
        .with_context(|| format!("Failed to open archive: {}", archive_path.display()))?;
    let mut archive = Archive::new(GzDecoder::new(file));

    for entry in archive
        .entries()
        .with_context(|| format!("Failed to read tar entries: {}", archive_path.display()))?
    {
        let mut entry = entry
            .with_context(|| format!("Failed to read tar entry: {}", archive_path.display()))?;

        let entry_path = entry
            .path()
            .context("Failed to get entry path")?
            .into_owned();

        // Reject parent directory references and absolute paths.
        if entry_path.is_absolute()
            || entry_path
                .components()
                .any(|c| matches!(c, std::path::Component::ParentDir))
        {
            anyhow::bail!(
                "Refusing to extract path with parent directory or absolute reference: {}",
                entry_path.display()
            );
        }

        let relative_path = match strip_prefix {
            Some(ref prefix) => match entry_path.strip_prefix(prefix) {
                Ok(p) if p.as_os_str().is_empty() => continue,
                Ok(p) => p.to_path_buf(),
                Err(_) => entry_path.clone(),
            },
            None => entry_path.clone(),
        };

        let output_path = dest_dir.join(&relative_path);

        if entry.header().entry_type().is_dir() {
            std::fs::create_dir_all(&output_path).with_context(|| {
                format!("Failed to create directory: {}", output_path.display())
            })?;
        } else {
            if let Some(parent) = output_path.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
            }
            entry
                .unpack(&output_path)
                .with_context(|| format!("Failed to extract: {}", output_path.display()))?;
        }
    }

    Ok(())
}

/// Finds a root folder shared by every entry.
///
/// Only reported when at least one entry is nested below it, so a flat
/// archive with a single file is not mistaken for a wrapper folder.
fn find_common_root_folder(archive_path: &Path) -> anyhow::Result<Option<PathBuf>> {
    let file = std::fs::File::open(archive_path)
        .with_context(|| format!("Failed to open archive: {}", archive_path.display()))?;
    let mut archive = Archive::new(GzDecoder::new(file));

    let mut common_root: Option<PathBuf> = None;
    let mut has_nested_entries = false;

    for entry in archive
        .entries()
        .with_context(|| format!("Failed to read tar entries: {}", archive_path.display()))?
    {
        let entry = entry
            .with_context(|| format!("Failed to read tar entry: {}", archive_path.display()))?;
        let path = entry.path().context("Failed to get entry path")?;

        if path.components().count() > 1 {
            has_nested_entries = true;
        }

        let Some(first_component) = path.components().next() else {
            continue;
        };
        let root = PathBuf::from(first_component.as_os_str());

        match &common_root {
            None => common_root = Some(root),
            Some(existing) if existing != &root => return Ok(None),
            Some(_) => {}
        }
    }

    Ok(if has_nested_entries { common_root } else { None })
}

/// Sets mode `0755` on every file in `dir/bin` (Unix only).
#[cfg(unix)]
fn set_executable_permissions(dir: &Path) -> anyhow::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let bin_dir = dir.join("bin");
    if !bin_dir.exists() {
        return Ok(());
    }

    let entries = std::fs::read_dir(&bin_dir)
        .with_context(|| format!("Failed to read bin directory: {}", bin_dir.display()))?;
    for entry in entries {
        let path = entry.context("Failed to read directory entry")?.path();
        if path.is_file() {
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
                .with_context(|| format!("Failed to set permissions: {}", path.display()))?;
        }
    }
    Ok(())
}

#[cfg(windows)]
#[allow(clippy::unnecessary_wraps)]
fn set_executable_permissions(_dir: &Path) -> anyhow::Result<()> {
    Ok(())
}


#[cfg(test)]
mod tests {
    use super::fixtures::{write_php_build, write_raw_entry_tar_gz, write_tar_gz};
    use super::*;
    use assert_fs::TempDir;

    #[test]
    fn strips_single_root_folder_into_version_dir() {
        let temp = TempDir::new().expect("temp dir");
        let archive = temp.path().join("8.1.2").join("php-8.1.2.tar.gz");
        write_php_build(&archive, "8.1.2");

        let dest = extract(&archive, "8.1.2").expect("Should extract");

        assert_eq!(dest, temp.path().join("8.1.2"));
        assert!(dest.join("bin").join("php").is_file());
        assert!(dest.join("lib").join("php.ini-development").is_file());
        assert!(!dest.join("php-8.1.2").exists());
    }

    #[test]
    fn flat_archive_keeps_layout() {
        let temp = TempDir::new().expect("temp dir");
        let archive = temp.path().join("v").join("php-v.tar.gz");
        write_tar_gz(
            &archive,
            &[
                ("bin/php", b"x".as_slice(), 0o755),
                ("lib/ext.so", b"y".as_slice(), 0o644),
            ],
        );

        let dest = extract(&archive, "v").expect("Should extract");

        assert!(dest.join("bin/php").is_file());
        assert!(dest.join("lib/ext.so").is_file());
    }

    #[test]
    fn empty_arguments_are_rejected_before_io() {
        let err = extract(Path::new(""), "8.1.2").unwrap_err();
        assert!(matches!(err, PhpvmError::InvalidArgument { .. }));

        let temp = TempDir::new().expect("temp dir");
        let archive = temp.path().join("php.tar.gz");
        std::fs::write(&archive, b"x").expect("write");
        let err = extract(&archive, "  ").unwrap_err();
        assert!(matches!(err, PhpvmError::InvalidArgument { .. }));
    }

    #[test]
    fn missing_archive_is_not_found() {
        let temp = TempDir::new().expect("temp dir");
        let archive = temp.path().join("php-8.1.2.tar.gz");
        let err = extract(&archive, "8.1.2").unwrap_err();
        assert!(matches!(err, PhpvmError::NotFound { ref path } if path == &archive));
    }

    #[test]
    fn corrupt_archive_is_extraction_failed_with_version() {
        let temp = TempDir::new().expect("temp dir");
        let archive = temp.path().join("php-8.1.2.tar.gz");
        std::fs::write(&archive, b"this is not gzip").expect("write");

        let err = extract(&archive, "8.1.2").unwrap_err();
        match err {
            PhpvmError::ExtractionFailed { version, .. } => assert_eq!(version, "8.1.2"),
            other => panic!("Expected ExtractionFailed, got {other:?}"),
        }
    }

    #[test]
    fn parent_dir_entry_is_rejected_without_escaping() {
        let temp = TempDir::new().expect("temp dir");
        let archive = temp.path().join("8.1.2").join("php-8.1.2.tar.gz");
        write_raw_entry_tar_gz(&archive, "../escape", b"outside");

        let err = extract(&archive, "8.1.2").unwrap_err();

        match err {
            PhpvmError::ExtractionFailed { version, message } => {
                assert_eq!(version, "8.1.2");
                assert!(message.contains("../escape"), "{message}");
            }
            other => panic!("Expected ExtractionFailed, got {other:?}"),
        }
        assert!(!temp.path().join("escape").exists());
        let entries: Vec<_> = std::fs::read_dir(temp.path())
            .expect("read")
            .filter_map(std::result::Result::ok)
            .map(|e| e.file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from("8.1.2")]);
    }

    #[cfg(unix)]
    #[test]
    fn absolute_entry_is_rejected() {
        let temp = TempDir::new().expect("temp dir");
        let archive = temp.path().join("8.1.2").join("php-8.1.2.tar.gz");
        write_raw_entry_tar_gz(&archive, "/phpvm-absolute-entry", b"outside");

        let err = extract(&archive, "8.1.2").unwrap_err();

        assert!(matches!(err, PhpvmError::ExtractionFailed { .. }), "{err:?}");
        assert!(!Path::new("/phpvm-absolute-entry").exists());
        let version_dir: Vec<_> = std::fs::read_dir(temp.path().join("8.1.2"))
            .expect("read")
            .filter_map(std::result::Result::ok)
            .map(|e| e.file_name())
            .collect();
        assert_eq!(version_dir, vec![std::ffi::OsString::from("php-8.1.2.tar.gz")]);
    }

    #[test]
    fn find_common_root_ignores_flat_single_file() {
        let temp = TempDir::new().expect("temp dir");
        let archive = temp.path().join("flat.tar.gz");
        write_tar_gz(&archive, &[("php", b"x".as_slice(), 0o755)]);

        assert_eq!(find_common_root_folder(&archive).expect("scan"), None);
    }

    #[cfg(unix)]
    #[test]
    fn bin_files_become_executable() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().expect("temp dir");
        let archive = temp.path().join("8.2.0").join("php-8.2.0.tar.gz");
        write_php_build(&archive, "8.2.0");

        let dest = extract(&archive, "8.2.0").expect("Should extract");

        let mode = std::fs::metadata(dest.join("bin/php"))
            .expect("Should get metadata")
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o755);
    }
}
