//! Fixed, versioned catalog mapping logical items to file locations.
//!
//! A [`DesiredItem`] (the core file set, a plugin, or a theme) expands
//! deterministically into one or more [`CatalogEntry`] values pairing a
//! remote location with a local path under the oh-my-zsh root. The tables
//! are static: resolving never touches the filesystem or the network.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::error::CatalogError;
use crate::zshrc::Declaration;

/// Version of the catalog tables. Bumped whenever the file layout mapping
/// changes shape.
pub const CATALOG_VERSION: u32 = 1;

/// Default remote source of truth for catalog content.
pub const DEFAULT_REMOTE_BASE: &str = "https://raw.githubusercontent.com/ohmyzsh/ohmyzsh/master";

/// Library and support files that every installation carries.
const CORE_FILES: &[&str] = &[
    "oh-my-zsh.sh",
    "lib/completion.zsh",
    "lib/history.zsh",
    "lib/key-bindings.zsh",
    "lib/termcap.zsh",
    "tools/upgrade.sh",
    "tools/install.sh",
    "tools/uninstall.sh",
];

/// Known plugins and their file sets. A plugin may carry more than one file
/// (completion definitions ship next to the plugin script).
const PLUGINS: &[(&str, &[&str])] = &[
    ("git", &["plugins/git/git.plugin.zsh"]),
    ("z", &["plugins/z/z.plugin.zsh"]),
    (
        "docker",
        &[
            "plugins/docker/docker.plugin.zsh",
            "plugins/docker/completions/_docker",
        ],
    ),
    ("fzf", &["plugins/fzf/fzf.plugin.zsh"]),
    ("history", &["plugins/history/history.plugin.zsh"]),
    ("sudo", &["plugins/sudo/sudo.plugin.zsh"]),
    (
        "extract",
        &["plugins/extract/extract.plugin.zsh", "plugins/extract/_extract"],
    ),
    (
        "colored-man-pages",
        &["plugins/colored-man-pages/colored-man-pages.plugin.zsh"],
    ),
    (
        "command-not-found",
        &["plugins/command-not-found/command-not-found.plugin.zsh"],
    ),
    ("web-search", &["plugins/web-search/web-search.plugin.zsh"]),
];

/// Known themes; each maps to a single `themes/<name>.zsh-theme` file.
const THEMES: &[&str] = &[
    "robbyrussell",
    "agnoster",
    "af-magic",
    "bira",
    "candy",
    "gnzh",
    "simple",
];

/// Kind of a logical item in the desired set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemKind {
    /// The fixed library/support file set.
    Core,
    /// A named plugin.
    Plugin,
    /// A named theme.
    Theme,
}

impl ItemKind {
    /// Lowercase word for error messages and audit output.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Core => "core",
            Self::Plugin => "plugin",
            Self::Theme => "theme",
        }
    }
}

/// A logical item the user's configuration declares should be present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesiredItem {
    /// What kind of item this is.
    pub kind: ItemKind,
    /// Item name (`"core"` for the core set).
    pub name: String,
}

impl DesiredItem {
    /// The core library/support file set.
    #[must_use]
    pub fn core() -> Self {
        Self {
            kind: ItemKind::Core,
            name: "core".to_string(),
        }
    }

    /// A named plugin.
    #[must_use]
    pub fn plugin(name: &str) -> Self {
        Self {
            kind: ItemKind::Plugin,
            name: name.to_string(),
        }
    }

    /// A named theme.
    #[must_use]
    pub fn theme(name: &str) -> Self {
        Self {
            kind: ItemKind::Theme,
            name: name.to_string(),
        }
    }
}

/// One (remote location, local path) pair derived from a [`DesiredItem`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    /// Kind of the item this entry belongs to.
    pub kind: ItemKind,
    /// Path relative to both the remote base and the local root.
    pub rel: String,
    /// Full remote URI for the canonical content.
    pub remote_location: String,
    /// Absolute local path under the oh-my-zsh root.
    pub local_path: PathBuf,
}

impl CatalogEntry {
    fn new(kind: ItemKind, rel: &str, root: &Path, remote_base: &str) -> Self {
        Self {
            kind,
            rel: rel.to_string(),
            remote_location: format!("{remote_base}/{rel}"),
            local_path: root.join(rel),
        }
    }
}

/// Result of resolving a full desired set.
#[derive(Debug, Default)]
pub struct Resolution {
    /// Resolved entries: core files first, then plugins in declared order,
    /// then the theme.
    pub entries: Vec<CatalogEntry>,
    /// Per-item resolution failures (unknown plugins/themes). Non-fatal.
    pub unknown: Vec<CatalogError>,
}

/// Resolve a single desired item into its catalog entries.
///
/// # Errors
///
/// Returns [`CatalogError::UnknownItem`] when a plugin or theme name has no
/// catalog mapping.
pub fn resolve_item(
    item: &DesiredItem,
    root: &Path,
    remote_base: &str,
) -> Result<Vec<CatalogEntry>, CatalogError> {
    match item.kind {
        ItemKind::Core => Ok(CORE_FILES
            .iter()
            .map(|rel| CatalogEntry::new(ItemKind::Core, rel, root, remote_base))
            .collect()),
        ItemKind::Plugin => PLUGINS
            .iter()
            .find(|(name, _)| *name == item.name)
            .map(|(_, files)| {
                files
                    .iter()
                    .map(|rel| CatalogEntry::new(ItemKind::Plugin, rel, root, remote_base))
                    .collect()
            })
            .ok_or_else(|| CatalogError::UnknownItem {
                kind: "plugin",
                name: item.name.clone(),
            }),
        ItemKind::Theme => THEMES
            .iter()
            .find(|name| **name == item.name)
            .map(|name| {
                vec![CatalogEntry::new(
                    ItemKind::Theme,
                    &format!("themes/{name}.zsh-theme"),
                    root,
                    remote_base,
                )]
            })
            .ok_or_else(|| CatalogError::UnknownItem {
                kind: "theme",
                name: item.name.clone(),
            }),
    }
}

/// Expand a declaration into the ordered desired-item list: core first,
/// plugins in declared order, theme last.
#[must_use]
pub fn desired_items(decl: &Declaration) -> Vec<DesiredItem> {
    let mut items = vec![DesiredItem::core()];
    items.extend(decl.plugins.iter().map(|p| DesiredItem::plugin(p)));
    if let Some(theme) = &decl.theme {
        items.push(DesiredItem::theme(theme));
    }
    items
}

/// Resolve a full declaration against the catalog.
///
/// Unknown items are collected in [`Resolution::unknown`] and do not stop
/// the remaining items from resolving.
///
/// # Errors
///
/// Returns [`CatalogError::DuplicateTarget`] if two desired items claim the
/// same local path — a configuration error, never silently resolved.
pub fn resolve_all(
    decl: &Declaration,
    root: &Path,
    remote_base: &str,
) -> Result<Resolution, CatalogError> {
    let mut resolution = Resolution::default();
    let mut seen: HashSet<PathBuf> = HashSet::new();

    for item in desired_items(decl) {
        match resolve_item(&item, root, remote_base) {
            Ok(entries) => {
                for entry in entries {
                    if !seen.insert(entry.local_path.clone()) {
                        return Err(CatalogError::DuplicateTarget {
                            path: entry.local_path,
                        });
                    }
                    resolution.entries.push(entry);
                }
            }
            Err(e) => resolution.unknown.push(e),
        }
    }
    Ok(resolution)
}
