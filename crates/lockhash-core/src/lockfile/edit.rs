//! In-place edits of `metadata.files` and atomic write-back.

use super::{LockError, LockFile};
use std::fs;
use std::path::{Path, PathBuf};
use toml_edit::{Item, TableLike, Value};

/// Temporary file suffix used before atomic rename.
const TEMP_SUFFIX: &str = ".part";

fn temp_path(final_path: &Path) -> PathBuf {
    let mut s = final_path.as_os_str().to_owned();
    s.push(TEMP_SUFFIX);
    PathBuf::from(s)
}

impl LockFile {
    fn files_item_mut(&mut self, package: &str) -> Result<&mut Item, LockError> {
        let missing = self.malformed(format!("no `metadata.files.{}` entry", package));
        self.doc
            .get_mut("metadata")
            .and_then(|m| m.get_mut("files"))
            .and_then(|f| f.get_mut(package))
            .ok_or(missing)
    }

    /// Replace the hash of entry `index` in `metadata.files.<package>`, keeping its formatting.
    pub fn set_hash(&mut self, package: &str, index: usize, hash: &str) -> Result<(), LockError> {
        let not_found = self.malformed(format!(
            "`metadata.files.{}` has no table entry #{}",
            package, index
        ));
        let files = self.files_item_mut(package)?;
        let entry: Option<&mut dyn TableLike> = match files {
            Item::Value(Value::Array(arr)) => arr
                .get_mut(index)
                .and_then(Value::as_inline_table_mut)
                .map(|t| t as &mut dyn TableLike),
            Item::ArrayOfTables(aot) => aot.get_mut(index).map(|t| t as &mut dyn TableLike),
            _ => None,
        };
        let entry = entry.ok_or(not_found)?;

        match entry.get_mut("hash").and_then(Item::as_value_mut) {
            Some(slot) => {
                let decor = slot.decor().clone();
                *slot = Value::from(hash);
                *slot.decor_mut() = decor;
            }
            None => {
                entry.insert("hash", toml_edit::value(hash));
            }
        }
        Ok(())
    }

    /// Delete entries of `metadata.files.<package>` by index, highest first so earlier
    /// indices stay valid. Duplicate indices are removed once.
    pub fn remove_entries(&mut self, package: &str, indices: &[usize]) -> Result<(), LockError> {
        let mut indices = indices.to_vec();
        indices.sort_unstable_by(|a, b| b.cmp(a));
        indices.dedup();

        let path = self.path.clone();
        let out_of_range = |index: usize| LockError::Malformed {
            path: path.clone(),
            reason: format!("`metadata.files.{}` has no entry #{}", package, index),
        };

        match self.files_item_mut(package)? {
            Item::Value(Value::Array(arr)) => {
                for index in indices {
                    if index >= arr.len() {
                        return Err(out_of_range(index));
                    }
                    arr.remove(index);
                }
            }
            Item::ArrayOfTables(aot) => {
                for index in indices {
                    if index >= aot.len() {
                        return Err(out_of_range(index));
                    }
                    aot.remove(index);
                }
            }
            _ => {
                return Err(LockError::Malformed {
                    path: path.clone(),
                    reason: format!("`metadata.files.{}` is not an array of tables", package),
                })
            }
        }
        Ok(())
    }

    /// Serialize and replace the lock file: write `<path>.part`, then rename over `<path>`.
    ///
    /// A symlinked lock file is replaced at its target, and the existing permission
    /// bits are carried over to the new file.
    pub fn write(&self) -> Result<(), LockError> {
        let target = fs::canonicalize(&self.path).unwrap_or_else(|_| self.path.clone());
        let tmp = temp_path(&target);
        let write_err = |source| LockError::Write {
            path: self.path.clone(),
            source,
        };
        fs::write(&tmp, self.doc.to_string()).map_err(write_err)?;
        let finalize = fs::metadata(&target)
            .and_then(|meta| fs::set_permissions(&tmp, meta.permissions()))
            .or_else(|e| match e.kind() {
                std::io::ErrorKind::NotFound => Ok(()),
                _ => Err(e),
            })
            .and_then(|()| fs::rename(&tmp, &target));
        if let Err(e) = finalize {
            let _ = fs::remove_file(&tmp);
            return Err(write_err(e));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{sample, SAMPLE};
    use super::*;

    #[test]
    fn set_hash_changes_only_that_value() {
        let mut lock = sample();
        lock.set_hash("foo", 0, "sha256:deadbeef").unwrap();
        let expected = SAMPLE.replace(
            r#"{file = "foo-1.0.tar.gz", hash = "md5:abcd"}"#,
            r#"{file = "foo-1.0.tar.gz", hash = "sha256:deadbeef"}"#,
        );
        assert_eq!(lock.to_string(), expected);
    }

    #[test]
    fn set_hash_unknown_entry_is_error() {
        let mut lock = sample();
        assert!(lock.set_hash("foo", 7, "sha256:00").is_err());
        assert!(lock.set_hash("nope", 0, "sha256:00").is_err());
    }

    #[test]
    fn remove_entries_descending_and_dedup() {
        let mut lock = sample();
        lock.remove_entries("foo", &[0, 1, 0]).unwrap();
        let entries = lock.file_entries().unwrap();
        let foo = &entries.iter().find(|(p, _)| p == "foo").unwrap().1;
        assert!(foo.is_empty());
        let bar = &entries.iter().find(|(p, _)| p == "bar").unwrap().1;
        assert_eq!(bar.len(), 1);
    }

    #[test]
    fn remove_first_entry_keeps_second() {
        let mut lock = sample();
        lock.remove_entries("foo", &[0]).unwrap();
        let out = lock.to_string();
        assert!(!out.contains("foo-1.0.tar.gz"));
        assert!(out.contains(r#"{file = "foo-1.0-py3-none-any.whl", hash = "sha256:0011"}"#));
        assert!(out.contains(r#"{file = "bar-2.1.tar.gz", hash = "md5:ef01"}"#));
    }

    #[test]
    fn remove_out_of_range_is_error() {
        let mut lock = sample();
        assert!(lock.remove_entries("bar", &[1]).is_err());
    }

    #[test]
    fn write_replaces_file_and_leaves_no_part() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("poetry.lock");
        fs::write(&path, SAMPLE).unwrap();

        let mut lock = LockFile::load(&path).unwrap();
        lock.set_hash("bar", 0, "sha256:beef").unwrap();
        lock.write().unwrap();

        let written = fs::read_to_string(&path).unwrap();
        assert!(written.contains(r#"{file = "bar-2.1.tar.gz", hash = "sha256:beef"}"#));
        assert!(!temp_path(&path).exists());
    }

    #[cfg(unix)]
    #[test]
    fn write_keeps_mode() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("poetry.lock");
        fs::write(&path, SAMPLE).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o640)).unwrap();

        let mut lock = LockFile::load(&path).unwrap();
        lock.set_hash("bar", 0, "sha256:beef").unwrap();
        lock.write().unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o640);
    }

    #[cfg(unix)]
    #[test]
    fn write_through_symlink_updates_target() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("shared.lock");
        let link = dir.path().join("poetry.lock");
        fs::write(&target, SAMPLE).unwrap();
        std::os::unix::fs::symlink(&target, &link).unwrap();

        let mut lock = LockFile::load(&link).unwrap();
        lock.set_hash("bar", 0, "sha256:beef").unwrap();
        lock.write().unwrap();

        assert!(fs::symlink_metadata(&link).unwrap().file_type().is_symlink());
        let written = fs::read_to_string(&target).unwrap();
        assert!(written.contains(r#"hash = "sha256:beef""#));
        assert!(!dir.path().join("shared.lock.part").exists());
    }

    #[test]
    fn temp_path_appends_part() {
        assert_eq!(
            temp_path(Path::new("/p/poetry.lock")),
            PathBuf::from("/p/poetry.lock.part")
        );
    }
}
