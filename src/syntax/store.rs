//! Syntax Reference Store
//!
//! File-backed syntax references layered over the built-ins:
//! - Loading priority: built-in < user-global < workspace
//! - Explicit initialize / reload / invalidate
//! - Optional file watching for live reload

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::{RwLock, mpsc};

use super::SyntaxLookup;
use super::registry::{builtin_references, builtin_sources};
use super::schema::{SyntaxFile, SyntaxReference, reference_key};
use crate::config::Config;

/// Loading priority of a reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ReferencePriority {
    BuiltIn = 0,
    UserGlobal = 1,
    Workspace = 2,
}

impl ReferencePriority {
    pub fn label(self) -> &'static str {
        match self {
            ReferencePriority::BuiltIn => "built-in",
            ReferencePriority::UserGlobal => "user",
            ReferencePriority::Workspace => "workspace",
        }
    }
}

/// A loaded reference with its source and priority
#[derive(Debug, Clone)]
pub struct LoadedReference {
    pub reference: SyntaxReference,
    pub priority: ReferencePriority,
    pub source_path: Option<PathBuf>,
}

type ReferenceMap = HashMap<String, LoadedReference>;

/// Events from the file watcher
#[derive(Debug)]
enum WatcherEvent {
    ReferenceFileChanged(PathBuf),
    WatcherError(notify::Error),
}

/// Shared, reloadable syntax reference store
pub struct SyntaxStore {
    references: Arc<RwLock<ReferenceMap>>,
    /// Directories in ascending priority; the first is user-global
    reference_dirs: Vec<PathBuf>,
    _watcher: Option<RecommendedWatcher>,
}

impl SyntaxStore {
    pub fn new(config: &Config) -> Self {
        Self::with_dirs(config.syntax_dirs.clone())
    }

    pub fn with_dirs(reference_dirs: Vec<PathBuf>) -> Self {
        Self {
            references: Arc::new(RwLock::new(builtin_map())),
            reference_dirs,
            _watcher: None,
        }
    }

    /// `<config_dir>/mermaid-agent/syntax` then `./.mermaid-agent/syntax`
    pub fn default_reference_dirs() -> Result<Vec<PathBuf>> {
        let mut dirs = Vec::new();

        if let Some(config_dir) = dirs::config_dir() {
            dirs.push(config_dir.join("mermaid-agent").join("syntax"));
        }

        let workspace_dir = std::env::current_dir()
            .context("Failed to resolve current directory")?
            .join(".mermaid-agent")
            .join("syntax");
        dirs.push(workspace_dir);

        Ok(dirs)
    }

    pub fn reference_dirs(&self) -> &[PathBuf] {
        &self.reference_dirs
    }

    /// Load built-ins and every reference directory, returns the entry count
    pub async fn initialize(&self) -> usize {
        let count = self.reload().await;
        log::info!("Loaded {} syntax references", count);
        count
    }

    /// Re-read all sources and swap the shared map
    pub async fn reload(&self) -> usize {
        let loaded = load_all(&self.reference_dirs).await;
        let count = loaded.len();
        *self.references.write().await = loaded;
        count
    }

    /// Drop file-loaded entries back to their built-in state
    ///
    /// `None` resets the whole store; a type without a built-in disappears.
    pub async fn invalidate(&self, diagram_type: Option<&str>) {
        let mut references = self.references.write().await;
        match diagram_type {
            None => *references = builtin_map(),
            Some(name) => {
                let key = reference_key(name);
                match builtin_map().remove(&key) {
                    Some(builtin) => {
                        references.insert(key, builtin);
                    }
                    None => {
                        references.remove(&key);
                    }
                }
            }
        }
    }

    /// Reload whenever a `*.toml` file changes in an existing reference dir
    pub async fn watch(&mut self) -> Result<()> {
        let (tx, mut rx) = mpsc::unbounded_channel();

        let mut watcher = RecommendedWatcher::new(
            move |res: Result<Event, notify::Error>| match res {
                Ok(event) => {
                    if let EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_) =
                        event.kind
                    {
                        for path in event.paths.into_iter().filter(|p| is_toml(p)) {
                            let _ = tx.send(WatcherEvent::ReferenceFileChanged(path));
                        }
                    }
                }
                Err(e) => {
                    let _ = tx.send(WatcherEvent::WatcherError(e));
                }
            },
            notify::Config::default().with_poll_interval(Duration::from_secs(1)),
        )
        .context("Failed to create syntax reference watcher")?;

        for dir in self.reference_dirs.iter().filter(|dir| dir.is_dir()) {
            watcher
                .watch(dir, RecursiveMode::NonRecursive)
                .with_context(|| format!("Failed to watch {}", dir.display()))?;
        }
        self._watcher = Some(watcher);

        let references = Arc::clone(&self.references);
        let reference_dirs = self.reference_dirs.clone();
        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                match event {
                    WatcherEvent::ReferenceFileChanged(path) => {
                        log::info!("Syntax reference changed: {}", path.display());
                        let loaded = load_all(&reference_dirs).await;
                        *references.write().await = loaded;
                    }
                    WatcherEvent::WatcherError(e) => {
                        log::error!("Syntax reference watcher error: {}", e);
                    }
                }
            }
        });

        Ok(())
    }

    pub async fn get(&self, diagram_type: &str) -> Option<LoadedReference> {
        let references = self.references.read().await;
        references.get(&reference_key(diagram_type)).cloned()
    }

    /// All loaded references, sorted by diagram type
    pub async fn list(&self) -> Vec<LoadedReference> {
        let references = self.references.read().await;
        let mut loaded: Vec<LoadedReference> = references.values().cloned().collect();
        loaded.sort_by(|a, b| a.reference.diagram_type.cmp(&b.reference.diagram_type));
        loaded
    }

    /// Write the embedded references into `dir`, keeping existing files
    ///
    /// Returns the paths that were written.
    pub async fn export_builtin(dir: &Path) -> Result<Vec<PathBuf>> {
        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("Failed to create directory: {}", dir.display()))?;

        let mut written = Vec::new();
        for (file_name, content) in builtin_sources() {
            let path = dir.join(file_name);
            if tokio::fs::try_exists(&path).await.unwrap_or(false) {
                log::info!("Keeping existing {}", path.display());
                continue;
            }
            tokio::fs::write(&path, content)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            written.push(path);
        }
        Ok(written)
    }
}

#[async_trait::async_trait]
impl SyntaxLookup for SyntaxStore {
    async fn lookup(&self, diagram_type: &str) -> Option<SyntaxReference> {
        self.get(diagram_type).await.map(|loaded| loaded.reference)
    }
}

fn builtin_map() -> ReferenceMap {
    builtin_references()
        .into_iter()
        .map(|reference| {
            (
                reference.diagram_type.clone(),
                LoadedReference {
                    reference,
                    priority: ReferencePriority::BuiltIn,
                    source_path: None,
                },
            )
        })
        .collect()
}

fn is_toml(path: &Path) -> bool {
    path.extension().and_then(|s| s.to_str()) == Some("toml")
}

/// Built-ins plus every directory, first directory user-global, later ones workspace
async fn load_all(reference_dirs: &[PathBuf]) -> ReferenceMap {
    let mut references = builtin_map();

    for (i, dir) in reference_dirs.iter().enumerate() {
        let priority = if i == 0 {
            ReferencePriority::UserGlobal
        } else {
            ReferencePriority::Workspace
        };
        if let Err(e) = load_directory(dir, priority, &mut references).await {
            log::error!("{:#}", e);
        }
    }

    references
}

async fn load_directory(
    dir: &Path,
    priority: ReferencePriority,
    references: &mut ReferenceMap,
) -> Result<()> {
    if !dir.is_dir() {
        return Ok(());
    }

    let mut entries = tokio::fs::read_dir(dir)
        .await
        .with_context(|| format!("Failed to read syntax directory: {}", dir.display()))?;

    // Sorted so that same-priority duplicates resolve the same way every time
    let mut paths = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if is_toml(&path) {
            paths.push(path);
        }
    }
    paths.sort();

    for path in paths {
        if let Err(e) = load_file(&path, priority, references).await {
            log::error!("Failed to load syntax reference {}: {:#}", path.display(), e);
        }
    }

    Ok(())
}

async fn load_file(
    path: &Path,
    priority: ReferencePriority,
    references: &mut ReferenceMap,
) -> Result<()> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read syntax file: {}", path.display()))?;

    let file: SyntaxFile = toml::from_str(&content)
        .with_context(|| format!("Failed to parse syntax TOML: {}", path.display()))?;
    let reference = SyntaxReference::from(file);

    let should_load = match references.get(&reference.diagram_type) {
        Some(existing) => priority >= existing.priority,
        None => true,
    };

    if should_load {
        log::debug!(
            "Loaded {} reference from {}",
            reference.diagram_type,
            path.display()
        );
        references.insert(
            reference.diagram_type.clone(),
            LoadedReference {
                reference,
                priority,
                source_path: Some(path.to_path_buf()),
            },
        );
    }

    Ok(())
}
