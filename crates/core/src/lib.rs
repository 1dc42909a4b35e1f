//! Cross-file signet (line bookmark) engine: per-project storage, view
//! synchronisation, multi-file navigation and the picker list.
//! 跨檔案書籤引擎：專案儲存、視圖同步、跨檔導覽與選單。

pub mod editor;
pub mod manager;
pub mod navigation;
pub mod persistence;
pub mod picker;
pub mod store;
pub mod sync;

pub use editor::{EditorSnapshot, EditorState, TabSnapshot};
pub use manager::SignetManager;
pub use navigation::{
    Direction, NavigationConfig, NavigationContext, NavigationEngine, NavigationTarget,
    NavigationTier,
};
pub use persistence::{PersistenceError, SignetFileStore, SIGNET_FILE_EXT};
pub use picker::{PickerEntry, PickerList};
pub use store::{line_to_row, row_to_line, FileSignets, ProjectId, ProjectSignets, SignetStore};
pub use sync::{SignetSync, ViewId, ViewSession};
