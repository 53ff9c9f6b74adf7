//! Desired-state declaration reader for the user's `.zshrc`.
//!
//! A tolerant line scanner, not a shell parser: it recognizes the two
//! declaration markers (`plugins=( ... )` and `ZSH_THEME=...`) and ignores
//! everything else. This is an intentional scope limit — the reader never
//! evaluates shell expressions. Marker-bearing lines that cannot be parsed
//! are collected in [`Declaration::ignored`] for diagnostics.

use std::path::Path;

use crate::error::DeclarationError;

/// Desired items declared in a shell configuration file.
///
/// Built once per invocation, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Declaration {
    /// Declared plugin names, duplicates collapsed, first-occurrence order.
    pub plugins: Vec<String>,
    /// Declared theme, last assignment wins (shell "last write wins").
    pub theme: Option<String>,
    /// Marker-bearing lines the scanner recognized but could not parse.
    pub ignored: Vec<String>,
}

/// Read and scan the declaration file at `path`.
///
/// # Errors
///
/// - [`DeclarationError::Missing`] if the file does not exist.
/// - [`DeclarationError::Io`] if it exists but cannot be read.
/// - [`DeclarationError::Malformed`] if neither marker appears anywhere in
///   the file.
pub fn read(path: &Path) -> Result<Declaration, DeclarationError> {
    if !path.exists() {
        return Err(DeclarationError::Missing {
            path: path.to_path_buf(),
        });
    }
    let content = std::fs::read_to_string(path).map_err(|source| DeclarationError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse(&content).ok_or_else(|| DeclarationError::Malformed {
        path: path.to_path_buf(),
    })
}

/// Scan declaration content from a string.
///
/// Returns `None` when no `plugins=(` or `ZSH_THEME=` marker is present at
/// all; otherwise a best-effort [`Declaration`].
///
/// # Examples
///
/// ```
/// use omzmini::zshrc::parse;
///
/// let decl = parse("plugins=(git z git)\nZSH_THEME=\"robbyrussell\"\n").unwrap();
/// assert_eq!(decl.plugins, ["git", "z"]);
/// assert_eq!(decl.theme.as_deref(), Some("robbyrussell"));
/// ```
#[must_use]
pub fn parse(content: &str) -> Option<Declaration> {
    let mut decl = Declaration::default();
    let mut markers = 0usize;

    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with('#') {
            continue;
        }
        if trimmed.starts_with("plugins=(") {
            markers += 1;
            match parse_plugin_list(trimmed) {
                Some(names) => {
                    for name in names {
                        if !decl.plugins.iter().any(|p| p == &name) {
                            decl.plugins.push(name);
                        }
                    }
                }
                None => decl.ignored.push(trimmed.to_string()),
            }
        } else if trimmed.starts_with("ZSH_THEME=") {
            markers += 1;
            match parse_theme(trimmed) {
                Some(theme) => decl.theme = Some(theme),
                None => decl.ignored.push(trimmed.to_string()),
            }
        }
    }

    (markers > 0).then_some(decl)
}

/// Extract whitespace-separated plugin names from a `plugins=( ... )` line.
///
/// Returns `None` for a marker with no closing parenthesis on the same line
/// (multi-line arrays are out of scope for the scanner).
fn parse_plugin_list(line: &str) -> Option<Vec<String>> {
    let inner = line.strip_prefix("plugins=(")?;
    let (inner, _) = inner.split_once(')')?;
    Some(inner.split_whitespace().map(ToString::to_string).collect())
}

/// Extract the theme name from a `ZSH_THEME=...` line.
///
/// Accepts double-quoted, single-quoted, and bare values. Returns `None`
/// for empty values or values containing shell substitution.
fn parse_theme(line: &str) -> Option<String> {
    let value = line.strip_prefix("ZSH_THEME=")?;
    // Drop any trailing comment on a bare value.
    let value = value.split(" #").next().unwrap_or(value).trim();
    let name = if let Some(rest) = value.strip_prefix('"') {
        rest.split('"').next()?
    } else if let Some(rest) = value.strip_prefix('\'') {
        rest.split('\'').next()?
    } else {
        value
    };
    if name.is_empty() || name.contains('$') {
        return None;
    }
    Some(name.to_string())
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    // -----------------------------------------------------------------------
    // parse: plugins
    // -----------------------------------------------------------------------

    #[test]
    fn parse_plugins_in_declared_order() {
        let decl = parse("plugins=(git z docker)\n").expect("markers present");
        assert_eq!(decl.plugins, ["git", "z", "docker"]);
        assert_eq!(decl.theme, None);
    }

    #[test]
    fn parse_collapses_duplicates_keeping_first_occurrence() {
        let decl = parse("plugins=(git z git sudo z)\n").expect("markers present");
        assert_eq!(decl.plugins, ["git", "z", "sudo"]);
    }

    #[test]
    fn parse_merges_repeated_plugin_lines() {
        let decl = parse("plugins=(git)\nplugins=(z git)\n").expect("markers present");
        assert_eq!(decl.plugins, ["git", "z"]);
    }

    #[test]
    fn parse_empty_plugin_list() {
        let decl = parse("plugins=()\n").expect("marker present");
        assert!(decl.plugins.is_empty());
        assert!(decl.ignored.is_empty());
    }

    #[test]
    fn parse_unclosed_plugin_list_is_ignored_not_fatal() {
        let decl = parse("plugins=(git z\nZSH_THEME=\"bira\"\n").expect("markers present");
        assert!(decl.plugins.is_empty());
        assert_eq!(decl.ignored, ["plugins=(git z"]);
        assert_eq!(decl.theme.as_deref(), Some("bira"));
    }

    // -----------------------------------------------------------------------
    // parse: theme
    // -----------------------------------------------------------------------

    #[test]
    fn parse_double_quoted_theme() {
        let decl = parse("ZSH_THEME=\"robbyrussell\"\n").expect("marker present");
        assert_eq!(decl.theme.as_deref(), Some("robbyrussell"));
    }

    #[test]
    fn parse_single_quoted_theme() {
        let decl = parse("ZSH_THEME='agnoster'\n").expect("marker present");
        assert_eq!(decl.theme.as_deref(), Some("agnoster"));
    }

    #[test]
    fn parse_bare_theme() {
        let decl = parse("ZSH_THEME=af-magic\n").expect("marker present");
        assert_eq!(decl.theme.as_deref(), Some("af-magic"));
    }

    #[test]
    fn parse_last_theme_assignment_wins() {
        let decl =
            parse("ZSH_THEME=\"robbyrussell\"\nZSH_THEME=\"agnoster\"\n").expect("markers");
        assert_eq!(decl.theme.as_deref(), Some("agnoster"));
    }

    #[test]
    fn parse_theme_with_substitution_is_ignored() {
        let decl = parse("ZSH_THEME=\"$RANDOM_THEME\"\nplugins=(git)\n").expect("markers");
        assert_eq!(decl.theme, None);
        assert_eq!(decl.ignored, ["ZSH_THEME=\"$RANDOM_THEME\""]);
    }

    // -----------------------------------------------------------------------
    // parse: tolerance
    // -----------------------------------------------------------------------

    #[test]
    fn parse_skips_comments_and_unrelated_lines() {
        let content = "# plugins=(should not count)\n\
                       export PATH=$PATH:/usr/local/bin\n\
                       plugins=(git)\n\
                       alias ll='ls -la'\n";
        let decl = parse(content).expect("marker present");
        assert_eq!(decl.plugins, ["git"]);
        assert!(decl.ignored.is_empty());
    }

    #[test]
    fn parse_no_markers_at_all() {
        assert_eq!(parse("export EDITOR=vim\nalias g=git\n"), None);
        assert_eq!(parse(""), None);
    }

    #[test]
    fn parse_handles_indented_markers() {
        let decl = parse("  plugins=(git)\n\tZSH_THEME=\"candy\"\n").expect("markers");
        assert_eq!(decl.plugins, ["git"]);
        assert_eq!(decl.theme.as_deref(), Some("candy"));
    }

    // -----------------------------------------------------------------------
    // read
    // -----------------------------------------------------------------------

    #[test]
    fn read_missing_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = read(&dir.path().join(".zshrc")).expect_err("should be missing");
        assert!(matches!(err, DeclarationError::Missing { .. }));
    }

    #[test]
    fn read_malformed_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let rc = dir.path().join(".zshrc");
        std::fs::write(&rc, "export EDITOR=vim\n").expect("write");
        let err = read(&rc).expect_err("should be malformed");
        assert!(matches!(err, DeclarationError::Malformed { .. }));
    }

    #[test]
    fn read_valid_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let rc = dir.path().join(".zshrc");
        std::fs::write(&rc, "plugins=(git z)\nZSH_THEME=\"robbyrussell\"\n").expect("write");
        let decl = read(&rc).expect("read");
        assert_eq!(decl.plugins, ["git", "z"]);
        assert_eq!(decl.theme.as_deref(), Some("robbyrussell"));
    }
}
