use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::editor::EditorState;
use crate::store::{row_to_line, ProjectId, SignetStore};

/// 宿主指派的視圖代號。 / Host-assigned identifier of an editor view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ViewId(u64);

impl ViewId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

/// 單一視圖的工作階段。 / Session state of one view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewSession {
    pub file: PathBuf,
    pub initialized: bool,
}

/// 同步視圖標記與書籤存放區。 / Keeps the store and live view markers converged.
///
/// Seeding happens at most once per view; the set of seeded views belongs to
/// the session, never to the persisted data.
#[derive(Debug, Default)]
pub struct SignetSync {
    sessions: HashMap<ViewId, ViewSession>,
}

impl SignetSync {
    pub fn new() -> Self {
        Self::default()
    }

    /// 首次開啟時取得要顯示的行號。 / Lines to draw the first time `view` shows `file`.
    ///
    /// Returns `None` when the view was already seeded, so refocusing a view
    /// never redraws its markers from stale persisted lines.
    pub fn seed_view(
        &mut self,
        store: &SignetStore,
        project: &ProjectId,
        view: ViewId,
        file: &Path,
    ) -> Option<Vec<u32>> {
        let session = self.sessions.entry(view).or_insert_with(|| ViewSession {
            file: file.to_path_buf(),
            initialized: false,
        });
        if session.initialized && session.file == file {
            return None;
        }
        session.file = file.to_path_buf();
        session.initialized = true;

        let lines = store
            .project(project)
            .map(|signets| signets.lines(file))
            .unwrap_or_default();
        debug!(view = view.get(), file = %file.display(), count = lines.len(), "seeded view");
        Some(lines)
    }

    pub fn is_seeded(&self, view: ViewId) -> bool {
        self.sessions
            .get(&view)
            .is_some_and(|session| session.initialized)
    }

    /// 視圖關閉時移除工作階段。 / Drops the session of a closed view.
    pub fn forget_view(&mut self, view: ViewId) -> Option<ViewSession> {
        self.sessions.remove(&view)
    }

    /// 以視圖目前的標記列取代檔案書籤。 / Replaces the file's lines with the view's current marker rows.
    ///
    /// No rows deletes the file entry. Returns the number of lines kept.
    pub fn reconcile(
        store: &mut SignetStore,
        project: &ProjectId,
        file: &Path,
        rows: &[u32],
    ) -> usize {
        let signets = store.ensure_project(project);
        signets.replace(file, rows.iter().copied().map(row_to_line));
        let kept = signets.file(file).map_or(0, |lines| lines.len());
        debug!(%project, file = %file.display(), kept, "reconciled view markers");
        kept
    }

    /// 對所有已播種的開啟檔案執行同步。 / Reconciles every open file that a seeded view shows.
    ///
    /// Views that were never seeded are skipped: their empty markers say
    /// nothing about the persisted lines. Files the editor reports as gone
    /// are pruned afterwards.
    pub fn reconcile_open_views(
        &self,
        store: &mut SignetStore,
        project: &ProjectId,
        editor: &dyn EditorState,
    ) -> usize {
        let mut reconciled = 0;
        for file in editor.open_files() {
            if !self.shows_seeded(&file) {
                continue;
            }
            if let Some(rows) = editor.marker_rows(&file) {
                Self::reconcile(store, project, &file, &rows);
                reconciled += 1;
            }
        }
        if let Some(signets) = store.project_mut(project) {
            let pruned = signets.prune(|path| editor.file_exists(path));
            if pruned > 0 {
                debug!(%project, pruned, "pruned signets of deleted files");
            }
        }
        reconciled
    }

    fn shows_seeded(&self, file: &Path) -> bool {
        self.sessions
            .values()
            .any(|session| session.initialized && session.file == file)
    }
}
