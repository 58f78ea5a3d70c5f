//! Read-only views over the lock document: legacy-hash entries and locked packages.

use super::{FileEntry, LockError, LockFile, LockedPackage, PackageSource, PendingUpdate};
use crate::checksum::FileHash;
use toml_edit::{Item, TableLike, Value};

/// Entries of a `metadata.files.<package>` value, as tables.
/// Poetry writes an inline array of inline tables; `[[metadata.files.<package>]]` is accepted too.
pub(super) fn entry_tables(item: &Item) -> Option<Vec<&dyn TableLike>> {
    match item {
        Item::Value(Value::Array(arr)) => arr
            .iter()
            .map(|v| v.as_inline_table().map(|t| t as &dyn TableLike))
            .collect(),
        Item::ArrayOfTables(aot) => Some(aot.iter().map(|t| t as &dyn TableLike).collect()),
        _ => None,
    }
}

fn str_field(table: &dyn TableLike, key: &str) -> Option<String> {
    table.get(key).and_then(Item::as_str).map(str::to_string)
}

impl LockFile {
    pub(super) fn files_table(&self) -> Result<Option<&dyn TableLike>, LockError> {
        let Some(metadata) = self.doc.get("metadata") else {
            return Ok(None);
        };
        let metadata = metadata
            .as_table_like()
            .ok_or_else(|| self.malformed("`metadata` is not a table"))?;
        match metadata.get("files") {
            None => Ok(None),
            Some(files) => files
                .as_table_like()
                .map(Some)
                .ok_or_else(|| self.malformed("`metadata.files` is not a table")),
        }
    }

    /// Every `metadata.files` entry, grouped per package key, in document order.
    pub fn file_entries(&self) -> Result<Vec<(String, Vec<FileEntry>)>, LockError> {
        let Some(files) = self.files_table()? else {
            return Ok(Vec::new());
        };
        let mut out = Vec::new();
        for (package, item) in files.iter() {
            let tables = entry_tables(item).ok_or_else(|| {
                self.malformed(format!(
                    "`metadata.files.{}` is not an array of tables",
                    package
                ))
            })?;
            let entries = tables
                .into_iter()
                .map(|t| FileEntry {
                    file: str_field(t, "file").unwrap_or_default(),
                    hash: str_field(t, "hash").unwrap_or_default(),
                })
                .collect();
            out.push((package.to_string(), entries));
        }
        Ok(out)
    }

    /// Entries that name a file and whose hash uses the legacy (`md5:`) algorithm.
    pub fn legacy_entries(&self) -> Result<Vec<PendingUpdate>, LockError> {
        let mut pending = Vec::new();
        for (package, entries) in self.file_entries()? {
            for (index, entry) in entries.into_iter().enumerate() {
                if entry.file.is_empty() {
                    continue;
                }
                let legacy = FileHash::parse(&entry.hash).is_some_and(|h| h.is_legacy());
                if !legacy {
                    continue;
                }
                pending.push(PendingUpdate {
                    package: package.clone(),
                    index,
                    entry,
                });
            }
        }
        Ok(pending)
    }

    /// All `[[package]]` tables. `name` and `version` are required.
    pub fn packages(&self) -> Result<Vec<LockedPackage>, LockError> {
        let Some(item) = self.doc.get("package") else {
            return Ok(Vec::new());
        };
        let tables: Vec<&dyn TableLike> = match item {
            Item::ArrayOfTables(aot) => aot.iter().map(|t| t as &dyn TableLike).collect(),
            _ => entry_tables(item)
                .ok_or_else(|| self.malformed("`package` is not an array of tables"))?,
        };

        let mut packages = Vec::with_capacity(tables.len());
        for (i, table) in tables.into_iter().enumerate() {
            let name = str_field(table, "name")
                .ok_or_else(|| self.malformed(format!("package #{} has no `name`", i)))?;
            let version = str_field(table, "version").ok_or_else(|| {
                self.malformed(format!("package `{}` has no `version`", name))
            })?;
            let source = table
                .get("source")
                .and_then(Item::as_table_like)
                .map(|s| PackageSource {
                    kind: str_field(s, "type"),
                    url: str_field(s, "url"),
                    reference: str_field(s, "reference"),
                });
            packages.push(LockedPackage {
                name,
                version,
                source,
            });
        }
        Ok(packages)
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::sample;
    use super::*;
    use std::path::Path;

    fn parse(text: &str) -> LockFile {
        LockFile::parse(Path::new("poetry.lock"), text).unwrap()
    }

    #[test]
    fn legacy_entries_only_md5() {
        let pending = sample().legacy_entries().unwrap();
        assert_eq!(pending.len(), 2);
        assert_eq!(pending[0].package, "foo");
        assert_eq!(pending[0].index, 0);
        assert_eq!(pending[0].entry.file, "foo-1.0.tar.gz");
        assert_eq!(pending[0].entry.hash, "md5:abcd");
        assert_eq!(pending[1].package, "bar");
        assert_eq!(pending[1].index, 0);
    }

    #[test]
    fn legacy_entries_skip_missing_file_or_hash() {
        let lock = parse(
            r#"
[metadata.files]
foo = [
    {hash = "md5:abcd"},
    {file = "foo-1.0.zip"},
    {file = "foo-1.0.tar.gz", hash = "MD5:abcd"},
    {file = "foo-1.0-py3-none-any.whl", hash = "md5:0f"},
]
"#,
        );
        let pending = lock.legacy_entries().unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].index, 3);
    }

    #[test]
    fn no_metadata_means_no_entries() {
        let lock = parse("[[package]]\nname = \"foo\"\nversion = \"1.0\"\n");
        assert!(lock.legacy_entries().unwrap().is_empty());
        let lock = parse("[metadata]\nlock-version = \"1.1\"\n");
        assert!(lock.legacy_entries().unwrap().is_empty());
    }

    #[test]
    fn array_of_tables_layout_accepted() {
        let lock = parse(
            r#"
[[metadata.files.foo]]
file = "foo-1.0.tar.gz"
hash = "md5:abcd"
"#,
        );
        let pending = lock.legacy_entries().unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].entry.file, "foo-1.0.tar.gz");
    }

    #[test]
    fn non_array_files_value_is_malformed() {
        let lock = parse("[metadata.files]\nfoo = \"oops\"\n");
        let err = lock.legacy_entries().unwrap_err();
        assert!(matches!(err, LockError::Malformed { .. }));
        assert!(err.to_string().contains("metadata.files.foo"));

        let lock = parse("[metadata.files]\nfoo = [\"a\", \"b\"]\n");
        assert!(lock.legacy_entries().is_err());

        let lock = parse("metadata = 3\n");
        assert!(lock.legacy_entries().is_err());
    }

    #[test]
    fn packages_with_and_without_source() {
        let packages = sample().packages().unwrap();
        assert_eq!(packages.len(), 2);
        assert_eq!(packages[0].name, "foo");
        assert_eq!(packages[0].version, "1.0");
        let source = packages[0].source.as_ref().unwrap();
        assert_eq!(source.kind.as_deref(), Some("legacy"));
        assert_eq!(source.url.as_deref(), Some("https://pypi.internal/simple"));
        assert_eq!(source.reference.as_deref(), Some("internal"));
        assert_eq!(packages[1].name, "bar");
        assert!(packages[1].source.is_none());
    }

    #[test]
    fn package_without_version_is_malformed() {
        let lock = parse("[[package]]\nname = \"foo\"\n");
        let err = lock.packages().unwrap_err();
        assert!(err.to_string().contains("package `foo` has no `version`"));

        let lock = parse("[[package]]\nversion = \"1.0\"\n");
        assert!(lock.packages().is_err());
    }
}
