use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::debug;

use crate::persistence::{self, PersistenceError};

/// 將編輯器的 0 起始列轉為 1 起始行號。 / Converts a 0-based editor row into a 1-based line.
pub fn row_to_line(row: u32) -> u32 {
    row.saturating_add(1)
}

/// 將 1 起始行號轉為編輯器列。 / Converts a 1-based line into a 0-based editor row.
pub fn line_to_row(line: u32) -> u32 {
    line.saturating_sub(1)
}

/// 專案識別碼。 / Opaque identifier of a project sharing one signet file.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProjectId(String);

impl ProjectId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// 由專案定義檔名稱推導識別碼。 / Derives the id from a project definition file
    /// (`/work/demo.sublime-project` becomes `demo`).
    pub fn from_project_file(path: &Path) -> Option<Self> {
        let stem = path.file_stem()?.to_str()?;
        if stem.trim().is_empty() {
            return None;
        }
        Some(Self(stem.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 單一檔案的書籤行號集合。 / Ordered, duplicate-free set of 1-based signet lines for one file.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FileSignets {
    lines: BTreeSet<u32>,
}

impl FileSignets {
    /// 由行號建立集合，忽略 0。 / Builds a set from 1-based lines; line 0 is ignored.
    pub fn from_lines(lines: impl IntoIterator<Item = u32>) -> Self {
        Self {
            lines: lines.into_iter().filter(|&line| line > 0).collect(),
        }
    }

    /// 加入書籤；已存在或行號為 0 時回傳 `false`。 / Inserts a line, returning false if present or zero.
    pub fn insert(&mut self, line: u32) -> bool {
        line > 0 && self.lines.insert(line)
    }

    pub fn remove(&mut self, line: u32) -> bool {
        self.lines.remove(&line)
    }

    /// 切換書籤並回傳新狀態。 / Toggles a line and returns whether it is now marked.
    pub fn toggle(&mut self, line: u32) -> bool {
        if self.lines.remove(&line) {
            false
        } else {
            self.insert(line)
        }
    }

    pub fn contains(&self, line: u32) -> bool {
        self.lines.contains(&line)
    }

    /// 嚴格大於指定行的第一個書籤。 / Smallest line strictly greater than `line`.
    pub fn next_after(&self, line: u32) -> Option<u32> {
        let start = line.checked_add(1)?;
        self.lines.range(start..).next().copied()
    }

    /// 嚴格小於指定行的最後一個書籤。 / Largest line strictly smaller than `line`.
    pub fn previous_before(&self, line: u32) -> Option<u32> {
        self.lines.range(..line).next_back().copied()
    }

    pub fn first(&self) -> Option<u32> {
        self.lines.first().copied()
    }

    pub fn last(&self) -> Option<u32> {
        self.lines.last().copied()
    }

    /// 以遞增順序列出。 / Iterates lines in ascending order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = u32> + '_ {
        self.lines.iter().copied()
    }

    /// 轉為編輯器列。 / Ascending 0-based rows, ready for drawing markers.
    pub fn rows(&self) -> Vec<u32> {
        self.iter().map(line_to_row).collect()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// 專案內各檔案的書籤。 / Signets of one project keyed by file path.
///
/// Files iterate in ascending path order and an entry never holds an empty
/// line set: emptied entries are pruned as soon as they become empty.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ProjectSignets {
    files: BTreeMap<PathBuf, FileSignets>,
}

impl ProjectSignets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn file(&self, path: &Path) -> Option<&FileSignets> {
        self.files.get(path)
    }

    /// 以路徑遞增順序列出檔案。 / Files in ascending path order.
    pub fn files(&self) -> impl DoubleEndedIterator<Item = (&Path, &FileSignets)> + '_ {
        self.files
            .iter()
            .map(|(path, signets)| (path.as_path(), signets))
    }

    /// Lines marked in `path`, ascending; empty when the file has none.
    pub fn lines(&self, path: &Path) -> Vec<u32> {
        self.files
            .get(path)
            .map(|signets| signets.iter().collect())
            .unwrap_or_default()
    }

    /// 切換指定行；清空的檔案會立即移除。 / Toggles `line` in `path`; an emptied entry is pruned at once.
    pub fn toggle(&mut self, path: &Path, line: u32) -> bool {
        let signets = self.files.entry(path.to_path_buf()).or_default();
        let marked = signets.toggle(line);
        if signets.is_empty() {
            self.files.remove(path);
        }
        marked
    }

    /// 以新的行號取代檔案內容。 / Replaces the lines of `path`; no lines removes the entry.
    pub fn replace(&mut self, path: &Path, lines: impl IntoIterator<Item = u32>) {
        let signets = FileSignets::from_lines(lines);
        if signets.is_empty() {
            self.files.remove(path);
        } else {
            self.files.insert(path.to_path_buf(), signets);
        }
    }

    pub(crate) fn insert_file(&mut self, path: PathBuf, signets: FileSignets) {
        if !signets.is_empty() {
            self.files.insert(path, signets);
        }
    }

    pub fn remove_file(&mut self, path: &Path) -> bool {
        self.files.remove(path).is_some()
    }

    /// 移除不存在的檔案與空集合。 / Drops files that no longer exist and empty entries.
    /// Returns the number of removed entries.
    pub fn prune<F>(&mut self, exists: F) -> usize
    where
        F: Fn(&Path) -> bool,
    {
        let before = self.files.len();
        self.files
            .retain(|path, signets| !signets.is_empty() && exists(path));
        before - self.files.len()
    }

    pub fn contains_file(&self, path: &Path) -> bool {
        self.files.contains_key(path)
    }

    /// Number of files with signets.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Total number of signets across all files.
    pub fn signet_count(&self) -> usize {
        self.files.values().map(FileSignets::len).sum()
    }
}

/// 所有專案的書籤。 / In-memory mapping of project to its signets.
#[derive(Debug, Default)]
pub struct SignetStore {
    projects: HashMap<ProjectId, ProjectSignets>,
}

impl SignetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 解析持久化內容並安裝至專案。 / Parses persisted bytes and installs them for `project`.
    ///
    /// On a parse failure the project is still installed, empty, and the
    /// error is returned so the caller can report it and carry on.
    pub fn load(
        &mut self,
        project: &ProjectId,
        persisted: &[u8],
    ) -> Result<&ProjectSignets, PersistenceError> {
        let (signets, outcome) = match persistence::decode(persisted) {
            Ok(signets) => (signets, Ok(())),
            Err(err) => (ProjectSignets::default(), Err(err)),
        };
        debug!(%project, files = signets.len(), "loaded project signets");
        let slot = self.projects.entry(project.clone()).or_default();
        *slot = signets;
        match outcome {
            Ok(()) => Ok(slot),
            Err(err) => Err(err),
        }
    }

    /// 修剪並序列化。 / Prunes `project` and serializes it.
    ///
    /// `Ok(None)` means the project holds no signets and its persisted file
    /// should be deleted; the empty project is dropped from the store too.
    pub fn save<F>(
        &mut self,
        project: &ProjectId,
        exists: F,
    ) -> Result<Option<Vec<u8>>, PersistenceError>
    where
        F: Fn(&Path) -> bool,
    {
        let Some(signets) = self.projects.get_mut(project) else {
            return Ok(None);
        };
        let pruned = signets.prune(exists);
        if pruned > 0 {
            debug!(%project, pruned, "pruned stale signet files");
        }
        if signets.is_empty() {
            self.projects.remove(project);
            return Ok(None);
        }
        persistence::encode(signets).map(Some)
    }

    /// 取得或建立專案。 / Returns the project entry, creating it empty when absent.
    pub fn ensure_project(&mut self, project: &ProjectId) -> &mut ProjectSignets {
        self.projects.entry(project.clone()).or_default()
    }

    pub fn project(&self, project: &ProjectId) -> Option<&ProjectSignets> {
        self.projects.get(project)
    }

    pub fn project_mut(&mut self, project: &ProjectId) -> Option<&mut ProjectSignets> {
        self.projects.get_mut(project)
    }

    pub fn contains_project(&self, project: &ProjectId) -> bool {
        self.projects.contains_key(project)
    }

    /// 切換 0 起始列上的書籤。 / Toggles the signet on a 0-based `row` and returns the new state.
    pub fn toggle(&mut self, project: &ProjectId, file: &Path, row: u32) -> bool {
        self.ensure_project(project).toggle(file, row_to_line(row))
    }

    pub fn clear_file(&mut self, project: &ProjectId, file: &Path) -> bool {
        self.projects
            .get_mut(project)
            .is_some_and(|signets| signets.remove_file(file))
    }

    pub fn clear_project(&mut self, project: &ProjectId) -> bool {
        self.projects.remove(project).is_some()
    }

    pub fn projects(&self) -> impl Iterator<Item = (&ProjectId, &ProjectSignets)> + '_ {
        self.projects.iter()
    }
}
