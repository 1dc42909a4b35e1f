use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// 由宿主編輯器提供的查詢介面。 / Queries the host editor answers on behalf of the core.
///
/// Rows are 0-based, as editors count them. Open files are reported in tab
/// order and each open file can report the rows its markers currently sit on.
pub trait EditorState {
    /// File shown in the focused view; `None` for scratch or unnamed views.
    fn active_file(&self) -> Option<PathBuf>;

    /// Cursor row of the focused view.
    fn cursor_row(&self) -> u32;

    /// Open files in tab order.
    fn open_files(&self) -> Vec<PathBuf>;

    /// Live marker rows of an open file, or `None` when the file is not open
    /// or the host cannot tell.
    fn marker_rows(&self, file: &Path) -> Option<Vec<u32>>;

    fn file_exists(&self, path: &Path) -> bool {
        path.is_file()
    }
}

/// 單一分頁的快照。 / One tab of an [`EditorSnapshot`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabSnapshot {
    pub path: PathBuf,
    pub markers: Option<Vec<u32>>,
}

/// 靜態的編輯器狀態。 / A fixed editor state for hosts without live views and for tests.
#[derive(Debug, Clone, Default)]
pub struct EditorSnapshot {
    tabs: Vec<TabSnapshot>,
    active: Option<PathBuf>,
    cursor_row: u32,
    existing: Option<HashSet<PathBuf>>,
}

impl EditorSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// 新增分頁，不帶即時標記。 / Appends a tab whose markers are taken from the store.
    pub fn with_tab(mut self, path: impl Into<PathBuf>) -> Self {
        self.tabs.push(TabSnapshot {
            path: path.into(),
            markers: None,
        });
        self
    }

    /// 新增帶即時標記列的分頁。 / Appends a tab reporting live marker rows.
    pub fn with_marked_tab(mut self, path: impl Into<PathBuf>, rows: Vec<u32>) -> Self {
        self.tabs.push(TabSnapshot {
            path: path.into(),
            markers: Some(rows),
        });
        self
    }

    /// 設定焦點檔案與游標列。 / Focuses `path` with the cursor on `row`.
    pub fn focused(mut self, path: impl Into<PathBuf>, row: u32) -> Self {
        self.active = Some(path.into());
        self.cursor_row = row;
        self
    }

    /// Treats exactly `paths` as existing on disk instead of probing the filesystem.
    pub fn assume_existing<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.existing = Some(paths.into_iter().map(Into::into).collect());
        self
    }

    pub fn tabs(&self) -> &[TabSnapshot] {
        &self.tabs
    }
}

impl EditorState for EditorSnapshot {
    fn active_file(&self) -> Option<PathBuf> {
        self.active.clone()
    }

    fn cursor_row(&self) -> u32 {
        self.cursor_row
    }

    fn open_files(&self) -> Vec<PathBuf> {
        self.tabs.iter().map(|tab| tab.path.clone()).collect()
    }

    fn marker_rows(&self, file: &Path) -> Option<Vec<u32>> {
        self.tabs
            .iter()
            .find(|tab| tab.path == file)
            .and_then(|tab| tab.markers.clone())
    }

    fn file_exists(&self, path: &Path) -> bool {
        match &self.existing {
            Some(existing) => existing.contains(path),
            None => path.is_file(),
        }
    }
}
