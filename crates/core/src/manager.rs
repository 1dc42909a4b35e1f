use std::path::Path;

use tracing::{debug, error, info, warn};

use crate::editor::EditorState;
use crate::navigation::{
    Direction, NavigationConfig, NavigationContext, NavigationEngine, NavigationTarget,
};
use crate::persistence::{PersistenceError, SignetFileStore};
use crate::picker::PickerList;
use crate::store::{line_to_row, ProjectId, ProjectSignets, SignetStore};
use crate::sync::{SignetSync, ViewId};

/// 書籤管理的入口。 / Entry point the host adapter drives from editor events and commands.
///
/// Owns the in-memory store, the per-view session state and the on-disk
/// file store. Every operation names the project it applies to.
#[derive(Debug)]
pub struct SignetManager {
    store: SignetStore,
    sync: SignetSync,
    files: SignetFileStore,
    engine: NavigationEngine,
}

impl SignetManager {
    pub fn new(files: SignetFileStore, config: NavigationConfig) -> Self {
        Self {
            store: SignetStore::new(),
            sync: SignetSync::new(),
            files,
            engine: NavigationEngine::new(config),
        }
    }

    pub fn store(&self) -> &SignetStore {
        &self.store
    }

    pub fn files(&self) -> &SignetFileStore {
        &self.files
    }

    pub fn config(&self) -> NavigationConfig {
        self.engine.config()
    }

    pub fn set_config(&mut self, config: NavigationConfig) {
        self.engine.set_config(config);
    }

    pub fn project(&self, project: &ProjectId) -> Option<&ProjectSignets> {
        self.store.project(project)
    }

    /// 開啟專案並載入書籤。 / Loads the project's signet file, starting empty when it is missing or unreadable.
    pub fn open_project(&mut self, project: &ProjectId) -> &ProjectSignets {
        match self.files.read(project) {
            Ok(Some(bytes)) => {
                if let Err(err) = self.store.load(project, &bytes) {
                    warn!(%project, error = %err, "ignoring unreadable signet file");
                }
            }
            Ok(None) => {
                info!(%project, "creating new signets file");
            }
            Err(err) => {
                warn!(%project, error = %err, "failed to read signet file");
            }
        }
        self.store.ensure_project(project)
    }

    /// 修剪後寫入或刪除檔案。 / Prunes the project and writes its file, or deletes it when empty.
    ///
    /// On failure the in-memory state is kept so a later save can retry.
    pub fn save_project(
        &mut self,
        project: &ProjectId,
        editor: &dyn EditorState,
    ) -> Result<(), PersistenceError> {
        if !self.store.contains_project(project) {
            debug!(%project, "project not loaded, nothing to save");
            return Ok(());
        }
        let outcome = self
            .store
            .save(project, |path| editor.file_exists(path))
            .and_then(|payload| {
                if payload.is_none() {
                    info!(%project, "removing empty signets file");
                }
                self.files.write(project, payload.as_deref())
            });
        if let Err(err) = &outcome {
            error!(%project, error = %err, "failed to save signets");
        }
        outcome
    }

    /// 關閉專案前同步所有視圖並儲存。 / Reconciles every open view, then saves.
    pub fn close_project(
        &mut self,
        project: &ProjectId,
        editor: &dyn EditorState,
    ) -> Result<(), PersistenceError> {
        self.sync
            .reconcile_open_views(&mut self.store, project, editor);
        self.save_project(project, editor)
    }

    /// 視圖首次顯示檔案。 / Rows to draw markers on when `view` first shows `file`.
    ///
    /// Scratch views (`file == None`) and already seeded views get `None`.
    pub fn view_opened(
        &mut self,
        project: &ProjectId,
        view: ViewId,
        file: Option<&Path>,
    ) -> Option<Vec<u32>> {
        let file = file?;
        let lines = self.sync.seed_view(&self.store, project, view, file)?;
        Some(lines.into_iter().map(line_to_row).collect())
    }

    /// 視圖失去焦點。 / Collects the view's markers into the store and saves.
    ///
    /// A view that was never seeded has drawn no markers, so its rows are ignored.
    pub fn view_deactivated(
        &mut self,
        project: &ProjectId,
        view: ViewId,
        file: &Path,
        rows: &[u32],
        editor: &dyn EditorState,
    ) -> Result<(), PersistenceError> {
        if !self.sync.is_seeded(view) {
            debug!(%project, view = view.get(), "view not seeded, keeping stored signets");
            return Ok(());
        }
        let had_signets = self
            .store
            .project(project)
            .is_some_and(|signets| signets.contains_file(file));
        if rows.is_empty() && !had_signets {
            return Ok(());
        }
        self.reconcile(project, file, rows);
        self.save_project(project, editor)
    }

    /// 視圖關閉。 / Collects the closing view's markers, saves, and forgets the view.
    pub fn view_closed(
        &mut self,
        project: &ProjectId,
        view: ViewId,
        file: &Path,
        rows: &[u32],
        editor: &dyn EditorState,
    ) -> Result<(), PersistenceError> {
        let outcome = self.view_deactivated(project, view, file, rows, editor);
        self.sync.forget_view(view);
        outcome
    }

    pub fn reconcile(&mut self, project: &ProjectId, file: &Path, rows: &[u32]) -> usize {
        SignetSync::reconcile(&mut self.store, project, file, rows)
    }

    /// 切換游標列上的書籤。 / Toggles the signet on a 0-based row; returns whether it is now set.
    pub fn toggle(&mut self, project: &ProjectId, file: &Path, row: u32) -> bool {
        let marked = self.store.toggle(project, file, row);
        debug!(%project, file = %file.display(), row, marked, "toggled signet");
        marked
    }

    pub fn clear_file(&mut self, project: &ProjectId, file: &Path) -> bool {
        self.store.clear_file(project, file)
    }

    /// 清除專案全部書籤並刪除檔案。 / Drops every signet of the project and deletes its file.
    pub fn clear_project(&mut self, project: &ProjectId) -> Result<(), PersistenceError> {
        self.store.clear_project(project);
        info!(%project, "cleared all signets");
        self.files.write(project, None)
    }

    /// 依目前位置計算下一個書籤。 / Computes the next signet from the editor's current position.
    ///
    /// Live marker rows of seeded views are collected first so shifted markers
    /// are honoured. `None` leaves the cursor where it is.
    pub fn navigate(
        &mut self,
        project: &ProjectId,
        direction: Direction,
        editor: &dyn EditorState,
    ) -> Option<NavigationTarget> {
        if !self.store.contains_project(project) {
            return None;
        }
        self.sync
            .reconcile_open_views(&mut self.store, project, editor);

        let signets = self.store.project(project)?;
        let open_files = editor.open_files();
        let current_file = editor.active_file();
        let context = NavigationContext {
            current_file: current_file.as_deref(),
            current_row: editor.cursor_row(),
            open_files: &open_files,
        };
        let target = self
            .engine
            .navigate(signets, &context, direction, |path| editor.file_exists(path));
        if let Some(found) = &target {
            debug!(
                %project,
                file = %found.file.display(),
                line = found.line,
                tier = ?found.tier,
                "navigating"
            );
        }
        target
    }

    /// 建立書籤選單。 / Flattens the project's signets for the picker.
    pub fn picker(&self, project: &ProjectId) -> PickerList {
        self.store
            .project(project)
            .map(PickerList::flatten)
            .unwrap_or_default()
    }
}
