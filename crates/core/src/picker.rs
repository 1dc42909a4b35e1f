use std::path::{Path, PathBuf};

use crate::navigation::{NavigationTarget, NavigationTier};
use crate::store::ProjectSignets;

/// 選單中的一個書籤。 / One selectable signet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickerEntry {
    pub file: PathBuf,
    /// 1-based line.
    pub line: u32,
}

impl PickerEntry {
    /// 顯示用標籤。 / Display label in `path:line` form.
    pub fn label(&self) -> String {
        format!("{}:{}", self.file.display(), self.line)
    }
}

/// 書籤選單快照。 / Snapshot of a project's signets, flattened for direct selection.
///
/// The list is taken once when the picker opens; later store mutations do
/// not affect it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PickerList {
    entries: Vec<PickerEntry>,
}

impl PickerList {
    /// 依檔案路徑、再依行號排列。 / Files in path order, then lines ascending.
    pub fn flatten(signets: &ProjectSignets) -> Self {
        let entries = signets
            .files()
            .flat_map(|(file, lines)| {
                lines.iter().map(move |line| PickerEntry {
                    file: file.to_path_buf(),
                    line,
                })
            })
            .collect();
        Self { entries }
    }

    pub fn entries(&self) -> &[PickerEntry] {
        &self.entries
    }

    pub fn labels(&self) -> Vec<String> {
        self.entries.iter().map(PickerEntry::label).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 取得選取的項目。 / Returns the selected entry.
    ///
    /// # Panics
    ///
    /// Panics when `index` is not smaller than [`PickerList::len`]; callers
    /// only pass indices of the list they displayed.
    pub fn resolve_selection(&self, index: usize) -> &PickerEntry {
        &self.entries[index]
    }

    /// 將選取轉為導覽目標。 / Turns a selection into a jump target, flagging files that are not open.
    ///
    /// # Panics
    ///
    /// Same precondition as [`PickerList::resolve_selection`].
    pub fn target(&self, index: usize, open_files: &[PathBuf]) -> NavigationTarget {
        let entry = self.resolve_selection(index);
        NavigationTarget {
            file: entry.file.clone(),
            line: entry.line,
            needs_open: !is_open(open_files, &entry.file),
            tier: NavigationTier::Picker,
        }
    }
}

fn is_open(open_files: &[PathBuf], file: &Path) -> bool {
    open_files.iter().any(|open| open == file)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project() -> ProjectSignets {
        let mut signets = ProjectSignets::new();
        signets.replace(Path::new("/work/b.rs"), [5]);
        signets.replace(Path::new("/work/a.rs"), [20, 10]);
        signets
    }

    #[test]
    fn flatten_orders_files_then_lines() {
        let list = PickerList::flatten(&project());
        assert_eq!(
            list.labels(),
            vec!["/work/a.rs:10", "/work/a.rs:20", "/work/b.rs:5"]
        );
    }

    #[test]
    fn selection_becomes_target() {
        let list = PickerList::flatten(&project());
        let open = vec![PathBuf::from("/work/a.rs")];

        let entry = list.resolve_selection(1);
        assert_eq!(entry.line, 20);

        let open_target = list.target(0, &open);
        assert!(!open_target.needs_open);
        assert_eq!(open_target.tier, NavigationTier::Picker);

        let closed_target = list.target(2, &open);
        assert_eq!(closed_target.file, PathBuf::from("/work/b.rs"));
        assert!(closed_target.needs_open);
    }

    #[test]
    #[should_panic]
    fn out_of_range_selection_panics() {
        PickerList::flatten(&ProjectSignets::new()).resolve_selection(0);
    }
}
