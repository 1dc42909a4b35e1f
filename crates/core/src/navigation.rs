use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::store::{line_to_row, row_to_line, FileSignets, ProjectSignets};

/// 導覽方向。 / Direction of a signet jump.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Next,
    Previous,
}

impl Direction {
    /// 檔案內的端點書籤。 / First line for `Next`, last line for `Previous`.
    fn edge(self, signets: &FileSignets) -> Option<u32> {
        match self {
            Direction::Next => signets.first(),
            Direction::Previous => signets.last(),
        }
    }

    /// 嚴格超過目前行的書籤。 / Closest line strictly beyond `line` in this direction.
    fn beyond(self, signets: &FileSignets, line: u32) -> Option<u32> {
        match self {
            Direction::Next => signets.next_after(line),
            Direction::Previous => signets.previous_before(line),
        }
    }
}

/// 導覽設定。 / Navigation switches taken from user settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationConfig {
    /// Walk across files; `false` keeps navigation inside the current file.
    pub nav_all_files: bool,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            nav_all_files: true,
        }
    }
}

/// 產生目標的階段。 / Which search step produced a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationTier {
    /// Strictly beyond the cursor in the current file.
    SameFile,
    /// Wrapped around inside the current file in single-file mode.
    SingleFileWrap,
    /// Next open tab in the direction of travel.
    OpenTab,
    /// A project file that is not open yet.
    ClosedFile,
    /// First open tab with signets, counted from the edge of the tab list.
    FirstOpenTab,
    /// Chosen directly from the picker.
    Picker,
}

/// 導覽目標。 / Where the host should move the cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationTarget {
    pub file: PathBuf,
    /// 1-based line.
    pub line: u32,
    /// The host must open the file and wait for it before jumping.
    pub needs_open: bool,
    pub tier: NavigationTier,
}

impl NavigationTarget {
    /// 0-based row for the host's goto.
    pub fn row(&self) -> u32 {
        line_to_row(self.line)
    }
}

/// 目前的編輯位置。 / Where the cursor is and which files are open.
#[derive(Debug, Clone, Copy)]
pub struct NavigationContext<'a> {
    pub current_file: Option<&'a Path>,
    pub current_row: u32,
    /// Open files in tab order.
    pub open_files: &'a [PathBuf],
}

impl NavigationContext<'_> {
    fn is_open(&self, path: &Path) -> bool {
        self.open_files.iter().any(|open| open == path)
    }
}

/// 四階段書籤導覽。 / Decides the next signet under the four-step fallback order.
///
/// 1. same file, strictly beyond the cursor (or wrap in single-file mode);
/// 2. open tabs after (before) the current one;
/// 3. project files that are not open, ascending (descending) by path;
/// 4. open tabs from the start (end) of the tab list.
#[derive(Debug, Clone, Copy, Default)]
pub struct NavigationEngine {
    config: NavigationConfig,
}

impl NavigationEngine {
    pub fn new(config: NavigationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> NavigationConfig {
        self.config
    }

    pub fn set_config(&mut self, config: NavigationConfig) {
        self.config = config;
    }

    /// 計算下一個目標；找不到時回傳 `None`。 / Computes the jump target, `None` when nothing qualifies.
    pub fn navigate<F>(
        &self,
        signets: &ProjectSignets,
        context: &NavigationContext<'_>,
        direction: Direction,
        exists: F,
    ) -> Option<NavigationTarget>
    where
        F: Fn(&Path) -> bool,
    {
        let current = context
            .current_file
            .and_then(|file| signets.file(file).map(|lines| (file, lines)));

        if let Some((file, lines)) = current {
            let line = row_to_line(context.current_row);
            if let Some(found) = direction.beyond(lines, line) {
                return Some(target(file, found, false, NavigationTier::SameFile));
            }
        }

        if !self.config.nav_all_files {
            let (file, lines) = current?;
            let found = direction.edge(lines)?;
            return Some(target(file, found, false, NavigationTier::SingleFileWrap));
        }

        let found = self
            .adjacent_tab(signets, context, direction)
            .or_else(|| closed_file(signets, context, direction, &exists))
            .or_else(|| first_open_tab(signets, context, direction));
        if found.is_none() {
            debug!(?direction, "no signet to navigate to");
        }
        found
    }

    fn adjacent_tab(
        &self,
        signets: &ProjectSignets,
        context: &NavigationContext<'_>,
        direction: Direction,
    ) -> Option<NavigationTarget> {
        let current = context.current_file?;
        let position = context.open_files.iter().position(|open| open == current)?;
        let candidates: Box<dyn Iterator<Item = &PathBuf> + '_> = match direction {
            Direction::Next => Box::new(context.open_files[position + 1..].iter()),
            Direction::Previous => Box::new(context.open_files[..position].iter().rev()),
        };
        edge_of_first_marked(signets, candidates, direction, NavigationTier::OpenTab)
    }
}

fn closed_file<F>(
    signets: &ProjectSignets,
    context: &NavigationContext<'_>,
    direction: Direction,
    exists: &F,
) -> Option<NavigationTarget>
where
    F: Fn(&Path) -> bool,
{
    let qualifies = |&(path, lines): &(&Path, &FileSignets)| {
        !lines.is_empty() && !context.is_open(path) && exists(path)
    };
    let found = match direction {
        Direction::Next => signets.files().find(qualifies),
        Direction::Previous => signets.files().rev().find(qualifies),
    };
    let (path, lines) = found?;
    let line = direction.edge(lines)?;
    Some(target(path, line, true, NavigationTier::ClosedFile))
}

fn first_open_tab(
    signets: &ProjectSignets,
    context: &NavigationContext<'_>,
    direction: Direction,
) -> Option<NavigationTarget> {
    let candidates: Box<dyn Iterator<Item = &PathBuf> + '_> = match direction {
        Direction::Next => Box::new(context.open_files.iter()),
        Direction::Previous => Box::new(context.open_files.iter().rev()),
    };
    edge_of_first_marked(signets, candidates, direction, NavigationTier::FirstOpenTab)
}

fn edge_of_first_marked<'a>(
    signets: &ProjectSignets,
    mut candidates: impl Iterator<Item = &'a PathBuf>,
    direction: Direction,
    tier: NavigationTier,
) -> Option<NavigationTarget> {
    candidates.find_map(|path| {
        let line = signets.file(path).and_then(|lines| direction.edge(lines))?;
        Some(target(path, line, false, tier))
    })
}

fn target(file: &Path, line: u32, needs_open: bool, tier: NavigationTier) -> NavigationTarget {
    NavigationTarget {
        file: file.to_path_buf(),
        line,
        needs_open,
        tier,
    }
}
