// Shared helpers for integration tests.
//
// Provides a temporary-directory-backed environment (managed root, config
// directory, declaration file) and an in-memory fetcher so each integration
// test can exercise the full inspect/plan/apply pipeline without network
// access or filesystem boilerplate.
//
// Used by all integration test binaries that declare `mod common;`.
#![allow(dead_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use omzmini::catalog::{self, DesiredItem};
use omzmini::context::{Context, Paths};
use omzmini::error::FetchError;
use omzmini::fetch::Fetcher;
use omzmini::zshrc::Declaration;

/// Remote base URL used by all integration tests.
pub const BASE: &str = "https://remote.test/omz";

/// In-memory fetcher serving a fixed URL-to-content map.
///
/// Unmapped URLs fail with [`FetchError::Failed`]. Call counts are shared
/// through an [`Arc`], so a clone kept outside the [`Context`] still
/// observes fetches made through the boxed copy.
#[derive(Debug, Clone, Default)]
pub struct StaticFetcher {
    responses: HashMap<String, Vec<u8>>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl StaticFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map `url` to `body`.
    #[must_use]
    pub fn with(mut self, url: &str, body: &[u8]) -> Self {
        self.responses.insert(url.to_string(), body.to_vec());
        self
    }

    /// Remove the mapping for `url` so fetches of it fail.
    #[must_use]
    pub fn without(mut self, url: &str) -> Self {
        self.responses.remove(url);
        self
    }

    /// Total number of fetch calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.lock().expect("calls lock").len()
    }

    /// Number of fetch calls made for `url`.
    pub fn calls_for(&self, url: &str) -> usize {
        self.calls
            .lock()
            .expect("calls lock")
            .iter()
            .filter(|u| u.as_str() == url)
            .count()
    }
}

impl Fetcher for StaticFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        self.calls.lock().expect("calls lock").push(url.to_string());
        self.responses
            .get(url)
            .cloned()
            .ok_or_else(|| FetchError::Failed {
                url: url.to_string(),
                reason: "404 not found".to_string(),
            })
    }
}

/// Canonical content served for a catalog relative path in tests.
pub fn remote_content(rel: &str) -> Vec<u8> {
    format!("# canonical {rel}\n").into_bytes()
}

/// A fetcher serving canonical content for the core set plus the given
/// plugins and theme.
pub fn canonical_fetcher(plugins: &[&str], theme: Option<&str>) -> StaticFetcher {
    let mut fetcher = StaticFetcher::new();
    let root = PathBuf::from("/unused");

    let mut items = vec![DesiredItem::core()];
    items.extend(plugins.iter().map(|p| DesiredItem::plugin(p)));
    if let Some(t) = theme {
        items.push(DesiredItem::theme(t));
    }

    for item in items {
        for entry in catalog::resolve_item(&item, &root, BASE).expect("known item") {
            fetcher = fetcher.with(&entry.remote_location, &remote_content(&entry.rel));
        }
    }
    fetcher
}

/// An isolated environment backed by a [`tempfile::TempDir`]: managed root,
/// config directory, and declaration file all live inside it.
pub struct TestEnv {
    pub dir: tempfile::TempDir,
}

impl TestEnv {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("create temp dir"),
        }
    }

    /// Resolved paths inside the temporary directory.
    pub fn paths(&self) -> Paths {
        Paths {
            root: self.dir.path().join("omz"),
            zshrc: self.dir.path().join("zshrc"),
            config_dir: self.dir.path().join("config"),
        }
    }

    /// Managed root directory.
    pub fn root(&self) -> PathBuf {
        self.paths().root
    }

    /// Write the declaration file.
    pub fn write_zshrc(&self, content: &str) {
        std::fs::write(self.paths().zshrc, content).expect("write zshrc");
    }

    /// Read the declaration back as a parsed [`Declaration`].
    pub fn declaration(&self) -> Declaration {
        omzmini::zshrc::read(&self.paths().zshrc).expect("read declaration")
    }

    /// Build a [`Context`] over this environment with the given fetcher.
    pub fn context(&self, fetcher: StaticFetcher, dry_run: bool) -> Context {
        Context::new(
            self.paths(),
            BASE.to_string(),
            Box::new(fetcher),
            true,
            dry_run,
        )
        .expect("build context")
    }

    /// Local path of a catalog relative path under the managed root.
    pub fn local(&self, rel: &str) -> PathBuf {
        rel.split('/').fold(self.root(), |p, seg| p.join(seg))
    }

    /// Read a managed file as a string.
    pub fn read_local(&self, rel: &str) -> String {
        std::fs::read_to_string(self.local(rel)).expect("read managed file")
    }

    /// Audit log lines written so far, empty when the log does not exist.
    pub fn audit_lines(&self) -> Vec<String> {
        let path = self.paths().audit_file();
        if !path.exists() {
            return Vec::new();
        }
        std::fs::read_to_string(path)
            .expect("read audit log")
            .lines()
            .map(String::from)
            .collect()
    }
}

/// Run the full inspect/plan/apply pipeline once, the way `sync` does.
pub fn run_sync(env: &TestEnv, ctx: &mut Context) -> omzmini::apply::ApplyReport {
    let declaration = env.declaration();
    let resolution =
        catalog::resolve_all(&declaration, &ctx.paths.root, &ctx.remote_base).expect("resolve");
    let states = omzmini::state::inspect(
        &resolution.entries,
        &ctx.pins,
        ctx.fetcher.as_ref(),
        &mut ctx.cache,
    );
    let plan = omzmini::plan::build(&states);
    omzmini::apply::run(
        &plan,
        ctx.fetcher.as_ref(),
        &mut ctx.cache,
        &ctx.audit,
        &mut ctx.hashes,
        ctx.dry_run,
    )
}

/// Run the restore pipeline once, the way `restore` does.
pub fn run_restore(env: &TestEnv, ctx: &mut Context) -> omzmini::apply::ApplyReport {
    let declaration = env.declaration();
    let resolution =
        catalog::resolve_all(&declaration, &ctx.paths.root, &ctx.remote_base).expect("resolve");
    let states = omzmini::state::inspect(
        &resolution.entries,
        &ctx.pins,
        ctx.fetcher.as_ref(),
        &mut ctx.cache,
    );
    let plan = omzmini::plan::build_restore(&states);
    omzmini::apply::run(
        &plan,
        ctx.fetcher.as_ref(),
        &mut ctx.cache,
        &ctx.audit,
        &mut ctx.hashes,
        ctx.dry_run,
    )
}
