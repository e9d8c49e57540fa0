//! Command-line driver for the repodrive disk interface.
//!
//! Seeds an in-memory repository from a local directory, attaches a session
//! to a share and runs one disk operation through the logging-wrapped disk
//! interface, exactly as an SMB server would.

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use repodrive_core::{ADMIN_USER, MemoryRepository, Permissions, Project, RepositoryContext};
use repodrive_mount::path_mapper;
use repodrive_smb::{
    AdminContext, DiskInterface, DomainStrippingTranslator, DriveConfig, FileInfo, FileStatus,
    IdentityTranslator, LoggingDiskInterface, OpenParams, RepositoryContextProvider,
    RepositoryDiskInterface, SearchAttributes, Session, ShareConfig,
};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

const READ_CHUNK: usize = 64 * 1024;

/// Expose a content repository through the SMB disk interface
#[derive(Parser, Debug)]
#[command(name = "repodrive", version, about)]
struct Args {
    /// Local directory to seed the repository from
    #[arg(short, long)]
    seed: Option<PathBuf>,

    /// JSON share configuration
    #[arg(short, long, env = "REPODRIVE_CONFIG")]
    config: Option<PathBuf>,

    /// Share to attach to (defaults to the first configured share)
    #[arg(long)]
    share: Option<String>,

    /// User to connect as; DOMAIN\user and user@realm forms are accepted
    #[arg(short, long, default_value = ADMIN_USER)]
    user: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List a directory or the entries matching a wildcard pattern
    Ls {
        #[arg(default_value = "\\")]
        path: String,
    },
    /// Print a file's content
    Cat { path: String },
    /// Show a file's metadata
    Stat { path: String },
    /// Upload a local file, replacing any existing content
    Put { local: PathBuf, remote: String },
    /// Rename or move an entry
    Mv { from: String, to: String },
    /// Delete a file or directory
    Rm { path: String },
    /// Create a directory
    Mkdir { path: String },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let share = select_share(args.config.as_deref(), args.share.as_deref())?;
    let repo = Arc::new(MemoryRepository::new());
    if let Some(seed) = &args.seed {
        let count = seed_repository(&repo, seed)?;
        tracing::info!(seed = %seed.display(), resources = count, "Seeded repository");
    }

    let user = DomainStrippingTranslator.translate(&args.user);
    if user != ADMIN_USER {
        repo.grant(
            &user,
            "/",
            Permissions::VIEW | Permissions::READ | Permissions::WRITE,
        );
    }

    let admin = AdminContext::new(RepositoryContext::new(ADMIN_USER, Project::offline()));
    let contexts = Arc::new(
        RepositoryContextProvider::new(
            repo,
            admin,
            Box::new(DomainStrippingTranslator),
            share,
        )
        .context("Failed to configure share")?,
    );
    let session = Session::new(1, args.user.clone());
    if !contexts.check_access(&session).is_allowed() {
        bail!("user '{}' may not attach to share '{}'", args.user, contexts.share().name);
    }

    let disk = LoggingDiskInterface::new(RepositoryDiskInterface::new(Arc::clone(&contexts)));
    let result = run(&disk, &session, args.command);
    contexts.end_session(session.id);
    result
}

fn select_share(config: Option<&Path>, name: Option<&str>) -> Result<ShareConfig> {
    let Some(path) = config else {
        return Ok(ShareConfig::new(name.unwrap_or("repodrive")));
    };
    let config = DriveConfig::load(path)?;
    let share = match name {
        Some(name) => config.share(name)?.clone(),
        None => config
            .shares
            .first()
            .cloned()
            .context("Configuration defines no shares")?,
    };
    Ok(share)
}

/// Mirrors a local tree into the repository. Returns the number of entries.
fn seed_repository(repo: &MemoryRepository, root: &Path) -> Result<usize> {
    let mut count = 0;
    for entry in WalkDir::new(root).min_depth(1).sort_by_file_name() {
        let entry = entry.with_context(|| format!("Failed to walk {}", root.display()))?;
        let relative = entry
            .path()
            .strip_prefix(root)
            .context("Walked outside the seed directory")?;
        let repo_path = format!(
            "/{}",
            relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/")
        );
        if entry.file_type().is_dir() {
            repo.seed_folder(&repo_path);
        } else if entry.file_type().is_file() {
            let content = fs::read(entry.path())
                .with_context(|| format!("Failed to read {}", entry.path().display()))?;
            repo.seed_file(&repo_path, &content);
        } else {
            continue;
        }
        count += 1;
    }
    Ok(count)
}

fn run<D: DiskInterface>(disk: &D, session: &Session, command: Command) -> Result<()> {
    match command {
        Command::Ls { path } => {
            let search_path = if path_mapper::has_wildcards(&path)
                || path_mapper::ends_with_separator(&path)
            {
                path
            } else {
                format!("{path}\\")
            };
            let cursor = disk.start_search(session, &search_path, SearchAttributes::everything())?;
            for info in cursor {
                print_entry(&info);
            }
        }
        Command::Cat { path } => {
            let mut file = disk.open_file(session, &OpenParams::new(path))?;
            let mut stdout = std::io::stdout().lock();
            let mut buf = vec![0u8; READ_CHUNK];
            let mut offset = 0u64;
            while let Some(read) =
                disk.read_file(session, &mut file, &mut buf, 0, READ_CHUNK, offset)?
            {
                stdout.write_all(&buf[..read])?;
                offset += read as u64;
            }
            stdout.flush()?;
            disk.close_file(session, &mut file)?;
        }
        Command::Stat { path } => match disk.get_file_information(session, &path)? {
            Some(info) => print_stat(&info),
            None => bail!("{path}: not found"),
        },
        Command::Put { local, remote } => {
            let content = fs::read(&local)
                .with_context(|| format!("Failed to read {}", local.display()))?;
            let params = OpenParams::new(remote.clone());
            let mut file = match disk.file_exists(session, &remote) {
                FileStatus::FileExists => disk.open_file(session, &params)?,
                FileStatus::DirectoryExists => bail!("{remote}: is a directory"),
                FileStatus::NotExist => disk.create_file(session, &params)?,
            };
            disk.truncate_file(session, &mut file, 0)?;
            let written = disk.write_file(session, &mut file, &content, 0, content.len(), 0)?;
            disk.close_file(session, &mut file)?;
            println!("{remote}: {written} bytes");
        }
        Command::Mv { from, to } => {
            disk.rename_file(session, &from, &to)?;
            if let Some(info) = disk.get_file_information(session, &to)? {
                print_entry(&info);
            }
        }
        Command::Rm { path } => match disk.file_exists(session, &path) {
            FileStatus::DirectoryExists => disk.delete_directory(session, &path)?,
            FileStatus::FileExists => disk.delete_file(session, &path)?,
            FileStatus::NotExist => bail!("{path}: not found"),
        },
        Command::Mkdir { path } => {
            let mut dir = disk.create_directory(session, &OpenParams::directory(path))?;
            disk.close_file(session, &mut dir)?;
        }
    }
    Ok(())
}

fn print_entry(info: &FileInfo) {
    let kind = if info.is_directory() { 'd' } else { '-' };
    let access = if info.is_read_only() { 'r' } else { 'w' };
    println!("{kind}{access} {:>10} {}", info.size, info.name);
}

fn print_stat(info: &FileInfo) {
    println!("name:     {}", info.name);
    println!("size:     {}", info.size);
    println!("kind:     {}", if info.is_directory() { "directory" } else { "file" });
    println!("readonly: {}", info.is_read_only());
    println!("id:       {:#018x}", info.file_id);
    println!("created:  {}", unix_seconds(info.creation_time));
    println!("modified: {}", unix_seconds(info.last_write_time));
    println!("changed:  {}", unix_seconds(info.change_time));
}

fn unix_seconds(time: SystemTime) -> u64 {
    time.duration_since(UNIX_EPOCH).map_or(0, |d| d.as_secs())
}
