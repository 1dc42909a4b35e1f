use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::ser::{SerializeMap, Serializer};
use thiserror::Error;
use tracing::warn;

use crate::store::{FileSignets, ProjectId, ProjectSignets};

/// Extension of per-project signet files inside the store directory.
pub const SIGNET_FILE_EXT: &str = "sigs";

const JSON_INDENT: &[u8] = b"    ";

/// 書籤檔案存取錯誤。 / Errors raised while reading or writing signet files.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("signet file IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid signet payload: {0}")]
    Parse(#[source] serde_json::Error),
    #[error("failed to serialize signets: {0}")]
    Serialize(#[source] serde_json::Error),
}

/// 解析 `{ 路徑: [行號] }` JSON。 / Decodes the `{ "path": [lines] }` JSON document.
///
/// Zero line numbers and files left without lines are dropped with a warning.
pub fn decode(bytes: &[u8]) -> Result<ProjectSignets, PersistenceError> {
    let raw: BTreeMap<PathBuf, Vec<u32>> =
        serde_json::from_slice(bytes).map_err(PersistenceError::Parse)?;

    let mut signets = ProjectSignets::new();
    for (path, lines) in raw {
        if lines.contains(&0) {
            warn!(path = %path.display(), "dropping line 0 from signet file");
        }
        let file = FileSignets::from_lines(lines);
        if file.is_empty() {
            warn!(path = %path.display(), "dropping file without signets");
            continue;
        }
        signets.insert_file(path, file);
    }
    Ok(signets)
}

/// 以四格縮排輸出 JSON。 / Encodes signets as pretty JSON with four-space indentation.
///
/// Paths that are not valid UTF-8 cannot be JSON keys; they are skipped with
/// a warning so the remaining files still persist.
pub fn encode(signets: &ProjectSignets) -> Result<Vec<u8>, PersistenceError> {
    let mut buffer = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(JSON_INDENT);
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
    serialize_entries(signets, &mut serializer).map_err(PersistenceError::Serialize)?;
    Ok(buffer)
}

fn serialize_entries<S>(signets: &ProjectSignets, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let mut map = serializer.serialize_map(None)?;
    for (path, lines) in signets.files() {
        let Some(key) = path.to_str() else {
            warn!(path = %path.display(), "skipping signets of a path that is not valid UTF-8");
            continue;
        };
        map.serialize_entry(key, lines)?;
    }
    map.end()
}

/// 專案書籤檔案的儲存目錄。 / Directory holding one signet file per project.
#[derive(Debug, Clone)]
pub struct SignetFileStore {
    root: PathBuf,
}

impl SignetFileStore {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// 專案對應的檔案路徑。 / Location of the signet file for `project`.
    pub fn path_for(&self, project: &ProjectId) -> PathBuf {
        self.root
            .join(format!("{}.{SIGNET_FILE_EXT}", project.as_str()))
    }

    /// 讀取專案檔案；不存在時回傳 `Ok(None)`。 / Reads the project's file, `Ok(None)` when absent.
    pub fn read(&self, project: &ProjectId) -> Result<Option<Vec<u8>>, PersistenceError> {
        let path = self.path_for(project);
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(PersistenceError::Io { path, source }),
        }
    }

    /// 寫入或刪除專案檔案。 / Writes the payload atomically, or deletes the file when `None`.
    pub fn write(&self, project: &ProjectId, payload: Option<&[u8]>) -> Result<(), PersistenceError> {
        let path = self.path_for(project);
        match payload {
            Some(bytes) => write_atomic(&path, bytes).map_err(|source| PersistenceError::Io {
                path: path.clone(),
                source,
            }),
            None => match fs::remove_file(&path) {
                Ok(()) => Ok(()),
                Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
                Err(source) => Err(PersistenceError::Io { path, source }),
            },
        }
    }

    pub fn exists(&self, project: &ProjectId) -> bool {
        self.path_for(project).is_file()
    }
}

/// 以臨時檔案搭配 rename 實現原子寫入。 / Writes through a temporary sibling followed by rename.
fn write_atomic(path: &Path, data: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp_path = path.with_extension("tmp");
    fs::write(&tmp_path, data)?;
    fs::rename(&tmp_path, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn encode_uses_four_space_indent_and_sorted_lines() {
        let mut signets = ProjectSignets::new();
        signets.replace(Path::new("/work/a.rs"), [20, 10]);
        let text = String::from_utf8(encode(&signets).unwrap()).unwrap();
        assert_eq!(text, "{\n    \"/work/a.rs\": [\n        10,\n        20\n    ]\n}");
    }

    #[test]
    fn decode_drops_zero_lines_and_empty_files() {
        let signets = decode(br#"{ "/a": [0, 3, 3, 1], "/b": [], "/c": [0] }"#).unwrap();
        assert_eq!(signets.lines(Path::new("/a")), vec![1, 3]);
        assert!(!signets.contains_file(Path::new("/b")));
        assert!(!signets.contains_file(Path::new("/c")));
    }

    #[test]
    fn decode_rejects_negative_lines() {
        let err = decode(br#"{ "/a": [-1] }"#).unwrap_err();
        assert!(matches!(err, PersistenceError::Parse(_)));
    }

    #[cfg(unix)]
    #[test]
    fn encode_skips_paths_that_are_not_utf8() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let mut signets = ProjectSignets::new();
        signets.replace(Path::new("/work/good.rs"), [3]);
        signets.replace(Path::new(OsStr::from_bytes(b"/work/bad\xff.rs")), [4]);
        let text = String::from_utf8(encode(&signets).unwrap()).unwrap();
        assert_eq!(text, "{\n    \"/work/good.rs\": [\n        3\n    ]\n}");
    }

    #[test]
    fn file_store_writes_reads_and_deletes() {
        let tmp = tempdir().unwrap();
        let files = SignetFileStore::new(tmp.path().join("store"));
        let project = ProjectId::new("demo");
        assert_eq!(files.path_for(&project), tmp.path().join("store").join("demo.sigs"));
        assert!(files.read(&project).unwrap().is_none());

        files.write(&project, Some(&b"{}"[..])).unwrap();
        assert_eq!(files.read(&project).unwrap().unwrap(), b"{}");
        assert!(files.exists(&project));

        files.write(&project, None).unwrap();
        assert!(!files.exists(&project));
        files.write(&project, None).unwrap();
    }
}
