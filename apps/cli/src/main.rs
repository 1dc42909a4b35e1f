use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use signet_core::{
    Direction, EditorSnapshot, NavigationTarget, ProjectId, SignetFileStore, SignetManager,
};
use signet_settings::{SettingsStore, SignetSettings};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "signet-cli",
    about = "Inspect and edit per-project signets (line bookmarks)",
    author,
    version
)]
struct Cli {
    /// 書籤檔案目錄；預設取自設定。 / Directory holding signet files (defaults to the settings value).
    #[arg(long, global = true, value_name = "PATH")]
    store_dir: Option<PathBuf>,
    /// 設定檔路徑。 / Settings file to read.
    #[arg(long, global = true, value_name = "PATH")]
    settings: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 列出專案書籤。 / List every signet of the project as `path:line`.
    List(ProjectArgs),
    /// 切換一行書籤。 / Toggle the signet on a line.
    Toggle(ToggleArgs),
    /// 清除檔案或整個專案的書籤。 / Clear signets of one file or of the whole project.
    Clear(ClearArgs),
    /// 移除已刪除檔案的書籤。 / Drop signets of files that no longer exist.
    Prune(ProjectArgs),
    /// 跳至下一個書籤。 / Print the next signet from a position.
    Next(NavigateArgs),
    /// 跳至上一個書籤。 / Print the previous signet from a position.
    Prev(NavigateArgs),
    /// 依清單索引選取書籤。 / Resolve an entry of the `list` output by index.
    Pick(PickArgs),
}

#[derive(Args)]
struct ProjectArgs {
    /// 專案名稱。 / Project name.
    #[arg(long, conflicts_with = "project_file")]
    project: Option<String>,
    /// 專案定義檔；名稱取自檔名。 / Project definition file; the name is its file stem.
    #[arg(long, value_name = "PATH")]
    project_file: Option<PathBuf>,
}

#[derive(Args)]
struct ToggleArgs {
    #[command(flatten)]
    project: ProjectArgs,
    file: PathBuf,
    /// 1 起始行號。 / 1-based line.
    #[arg(value_parser = clap::value_parser!(u32).range(1..))]
    line: u32,
}

#[derive(Args)]
struct ClearArgs {
    #[command(flatten)]
    project: ProjectArgs,
    /// 只清除此檔案。 / Only clear this file.
    file: Option<PathBuf>,
}

#[derive(Args)]
struct NavigateArgs {
    #[command(flatten)]
    project: ProjectArgs,
    /// 目前檔案。 / File the cursor is in.
    #[arg(long)]
    file: Option<PathBuf>,
    /// 目前 1 起始行號。 / Current 1-based line.
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    line: u32,
    /// 依分頁順序列出的開啟檔案。 / Open files in tab order.
    #[arg(long = "open", value_name = "PATH")]
    open: Vec<PathBuf>,
}

#[derive(Args)]
struct PickArgs {
    #[command(flatten)]
    project: ProjectArgs,
    index: usize,
    /// 依分頁順序列出的開啟檔案。 / Open files in tab order.
    #[arg(long = "open", value_name = "PATH")]
    open: Vec<PathBuf>,
}

fn main() {
    init_logging();
    if let Err(err) = run() {
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_env("SIGNET_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn run() -> Result<()> {
    let Cli {
        store_dir,
        settings,
        command,
    } = Cli::parse();
    let settings = load_settings(settings)?;
    let store_dir = match store_dir {
        Some(dir) => resolve_input_path(&dir)?,
        None => settings.resolved_store_dir(),
    };
    let mut manager = SignetManager::new(SignetFileStore::new(&store_dir), settings.navigation());

    match command {
        Commands::List(args) => execute_list(&mut manager, &args),
        Commands::Toggle(args) => execute_toggle(&mut manager, args),
        Commands::Clear(args) => execute_clear(&mut manager, args),
        Commands::Prune(args) => execute_prune(&mut manager, &args),
        Commands::Next(args) => execute_navigate(&mut manager, args, Direction::Next),
        Commands::Prev(args) => execute_navigate(&mut manager, args, Direction::Previous),
        Commands::Pick(args) => execute_pick(&mut manager, args),
    }
}

fn load_settings(path: Option<PathBuf>) -> Result<SignetSettings> {
    let path = match path {
        Some(path) => resolve_input_path(&path)?,
        None => match dirs::config_dir() {
            Some(dir) => dir.join("signets").join("settings.json"),
            None => return Ok(SignetSettings::default()),
        },
    };
    let store = SettingsStore::load(&path)
        .with_context(|| format!("failed to load settings from {}", path.display()))?;
    Ok(store.settings().clone())
}

fn resolve_project(args: &ProjectArgs) -> Result<ProjectId> {
    match (&args.project, &args.project_file) {
        (Some(name), _) if !name.trim().is_empty() => Ok(ProjectId::new(name.trim())),
        (Some(_), _) => bail!("project name must not be empty"),
        (None, Some(file)) => ProjectId::from_project_file(file)
            .ok_or_else(|| anyhow!("cannot derive a project name from {}", file.display())),
        (None, None) => bail!("either --project or --project-file is required"),
    }
}

fn open(manager: &mut SignetManager, args: &ProjectArgs) -> Result<ProjectId> {
    let project = resolve_project(args)?;
    manager.open_project(&project);
    Ok(project)
}

fn save(manager: &mut SignetManager, project: &ProjectId) -> Result<()> {
    manager
        .save_project(project, &EditorSnapshot::new())
        .with_context(|| format!("failed to save signets of project {project}"))
}

fn execute_list(manager: &mut SignetManager, args: &ProjectArgs) -> Result<()> {
    let project = open(manager, args)?;
    for label in manager.picker(&project).labels() {
        println!("{label}");
    }
    Ok(())
}

fn execute_toggle(manager: &mut SignetManager, args: ToggleArgs) -> Result<()> {
    let project = open(manager, &args.project)?;
    let file = resolve_input_path(&args.file)?;
    if !file.is_file() {
        bail!("{} is not an existing file", file.display());
    }
    let marked = manager.toggle(&project, &file, signet_core::line_to_row(args.line));
    save(manager, &project)?;
    let verb = if marked { "Set" } else { "Cleared" };
    println!("{verb} signet at {}:{}", file.display(), args.line);
    Ok(())
}

fn execute_clear(manager: &mut SignetManager, args: ClearArgs) -> Result<()> {
    let project = open(manager, &args.project)?;
    match args.file {
        Some(file) => {
            let file = resolve_input_path(&file)?;
            if manager.clear_file(&project, &file) {
                save(manager, &project)?;
                println!("Cleared signets in {}", file.display());
            } else {
                println!("No signets in {}", file.display());
            }
        }
        None => {
            manager
                .clear_project(&project)
                .with_context(|| format!("failed to clear project {project}"))?;
            println!("Cleared all signets in project {project}");
        }
    }
    Ok(())
}

fn execute_prune(manager: &mut SignetManager, args: &ProjectArgs) -> Result<()> {
    let project = open(manager, args)?;
    let before = manager.project(&project).map_or(0, |signets| signets.len());
    save(manager, &project)?;
    let after = manager.project(&project).map_or(0, |signets| signets.len());
    println!("Pruned {} file(s); {after} remaining", before - after);
    Ok(())
}

fn execute_navigate(
    manager: &mut SignetManager,
    args: NavigateArgs,
    direction: Direction,
) -> Result<()> {
    let project = open(manager, &args.project)?;
    let mut editor = EditorSnapshot::new();
    for path in &args.open {
        editor = editor.with_tab(resolve_input_path(path)?);
    }
    if let Some(file) = &args.file {
        editor = editor.focused(resolve_input_path(file)?, signet_core::line_to_row(args.line));
    }

    match manager.navigate(&project, direction, &editor) {
        Some(target) => print_target(&target),
        None => println!("none"),
    }
    Ok(())
}

fn execute_pick(manager: &mut SignetManager, args: PickArgs) -> Result<()> {
    let project = open(manager, &args.project)?;
    let list = manager.picker(&project);
    if args.index >= list.len() {
        bail!(
            "index {} is out of range; project {project} has {} signet(s)",
            args.index,
            list.len()
        );
    }
    let open_files = args
        .open
        .iter()
        .map(|path| resolve_input_path(path))
        .collect::<Result<Vec<_>>>()?;
    print_target(&list.target(args.index, &open_files));
    Ok(())
}

fn print_target(target: &NavigationTarget) {
    let suffix = if target.needs_open { " (open)" } else { "" };
    println!("{}:{}{suffix}", target.file.display(), target.line);
}

fn resolve_input_path(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()
            .context("determine current directory")?
            .join(path))
    }
}
