//! Path-keyed asset store with an explicit load/dispose lifecycle

use crate::backend::{HeadlessBackend, NativeBackend};
use crate::config::AssetSettings;
use crate::decoder;
use crate::types::{
    AudioHandle, ImageHandle, RawFile, Resource, ResourceKind, ShaderHandle, XmlElement,
};
use crate::walker::{self, WalkOptions};
use chancellor_core::Result;
use log::{debug, error, info, warn};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Why a typed lookup came back empty
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error("Asset not found: {0}")]
    NotFound(String),

    #[error("Asset {path} is {found}, not {expected}")]
    TypeMismatch {
        path: String,
        expected: ResourceKind,
        found: ResourceKind,
    },
}

/// Lifecycle state of a store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreState<'a> {
    Empty,
    Loaded { root: &'a Path },
}

/// A file that had a recognized extension but degraded to `RawFile`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DegradedAsset {
    pub path: String,
    pub reason: String,
}

/// Summary of one `load_assets` call
#[derive(Debug, Clone, Serialize)]
pub struct LoadReport {
    pub root: PathBuf,
    pub files: usize,
    pub counts: BTreeMap<ResourceKind, usize>,
    pub degraded: Vec<DegradedAsset>,
    /// Native handles released from the previous mapping before it was replaced
    pub released: usize,
}

impl LoadReport {
    fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            files: 0,
            counts: BTreeMap::new(),
            degraded: Vec::new(),
            released: 0,
        }
    }

    pub fn count(&self, kind: ResourceKind) -> usize {
        self.counts.get(&kind).copied().unwrap_or(0)
    }

    /// True when no file degraded because of a decode failure
    pub fn is_clean(&self) -> bool {
        self.degraded.is_empty()
    }
}

/// Cache of decoded assets keyed by `/`-joined path relative to the load root.
///
/// The store is the only owner of the native handles it holds. Lookups hand out
/// borrows, so they cannot outlive the next `load_assets` or `dispose` call.
pub struct AssetStore<B: NativeBackend = HeadlessBackend> {
    backend: B,
    assets: HashMap<String, Resource>,
    root: Option<PathBuf>,
    options: WalkOptions,
}

impl AssetStore<HeadlessBackend> {
    /// Store backed by a [`HeadlessBackend`]
    pub fn headless() -> Self {
        Self::with_backend(HeadlessBackend::new())
    }
}

impl Default for AssetStore<HeadlessBackend> {
    fn default() -> Self {
        Self::headless()
    }
}

impl<B: NativeBackend> AssetStore<B> {
    pub fn with_backend(backend: B) -> Self {
        Self {
            backend,
            assets: HashMap::new(),
            root: None,
            options: WalkOptions::default(),
        }
    }

    pub fn with_options(mut self, options: WalkOptions) -> Self {
        self.options = options;
        self
    }

    /// Store whose walk options come from configuration
    pub fn from_settings(backend: B, settings: &AssetSettings) -> Self {
        Self::with_backend(backend).with_options(settings.walk_options())
    }

    /// Scan `root` and replace the current mapping with its decoded files.
    ///
    /// Native handles of the previous mapping are released before any new file
    /// is uploaded. If `root` is missing nothing changes and `RootNotFound` is
    /// returned. Files that fail to decode are stored as `RawFile`.
    pub fn load_assets<P: AsRef<Path>>(&mut self, root: P) -> Result<LoadReport> {
        let root = root.as_ref();
        info!("Loading assets from: {}", root.display());

        let entries = walker::walk(root, &self.options).inspect_err(|e| {
            error!("{}", e);
        })?;

        let mut report = LoadReport::new(root);
        report.released = self.release_all();

        let mut assets = HashMap::with_capacity(entries.len());
        for entry in entries {
            let resource = match decoder::convert(&entry, &mut self.backend) {
                Ok(resource) => resource,
                Err(e) => {
                    warn!("Could not convert {}: {}", entry.relative_path, e);
                    report.degraded.push(DegradedAsset {
                        path: entry.relative_path.clone(),
                        reason: e.to_string(),
                    });
                    Resource::Raw(RawFile::new(&entry.location))
                }
            };

            debug!("Loaded asset: {} ({})", entry.relative_path, resource.kind());
            *report.counts.entry(resource.kind()).or_insert(0) += 1;
            report.files += 1;
            assets.insert(entry.relative_path, resource);
        }

        self.assets = assets;
        self.root = Some(root.to_path_buf());

        info!(
            "Loaded {} assets ({} degraded)",
            report.files,
            report.degraded.len()
        );
        Ok(report)
    }

    /// Release every native handle and empty the mapping. Safe to call repeatedly.
    pub fn dispose(&mut self) {
        if self.root.is_none() && self.assets.is_empty() {
            return;
        }

        let released = self.release_all();
        self.root = None;
        info!("Disposed asset store ({} native resources released)", released);
    }

    fn release_all(&mut self) -> usize {
        let mut released = 0;
        for (path, resource) in self.assets.drain() {
            if let Some(handle) = resource.into_native() {
                debug!("Releasing {} ({} #{})", path, handle.kind(), handle.id());
                self.backend.release(handle);
                released += 1;
            }
        }
        released
    }

    /// Resource at `path`, whatever its kind
    pub fn get(&self, path: &str) -> Option<&Resource> {
        self.assets.get(path)
    }

    /// Resource at `path`, provided it has the expected kind
    pub fn lookup(&self, path: &str, expected: ResourceKind) -> std::result::Result<&Resource, LookupError> {
        let resource = self
            .assets
            .get(path)
            .ok_or_else(|| LookupError::NotFound(path.to_string()))?;

        if resource.kind() != expected {
            return Err(LookupError::TypeMismatch {
                path: path.to_string(),
                expected,
                found: resource.kind(),
            });
        }
        Ok(resource)
    }

    fn typed<'a, T: ?Sized>(
        &'a self,
        path: &str,
        expected: ResourceKind,
        pick: impl FnOnce(&'a Resource) -> Option<&'a T>,
    ) -> Option<&'a T> {
        match self.lookup(path, expected) {
            Ok(resource) => pick(resource),
            Err(e @ LookupError::TypeMismatch { .. }) => {
                error!("{}", e);
                None
            }
            Err(e @ LookupError::NotFound(_)) => {
                debug!("{}", e);
                None
            }
        }
    }

    pub fn get_image(&self, path: &str) -> Option<&ImageHandle> {
        self.typed(path, ResourceKind::Image, Resource::as_image)
    }

    pub fn get_audio(&self, path: &str) -> Option<&AudioHandle> {
        self.typed(path, ResourceKind::AudioClip, Resource::as_audio)
    }

    pub fn get_shader(&self, path: &str) -> Option<&ShaderHandle> {
        self.typed(path, ResourceKind::ShaderProgram, Resource::as_shader)
    }

    pub fn get_text(&self, path: &str) -> Option<&str> {
        self.typed(path, ResourceKind::TextBlob, Resource::as_text)
    }

    pub fn get_json(&self, path: &str) -> Option<&serde_json::Value> {
        self.typed(path, ResourceKind::JsonValue, Resource::as_json)
    }

    pub fn get_xml(&self, path: &str) -> Option<&XmlElement> {
        self.typed(path, ResourceKind::XmlValue, Resource::as_xml)
    }

    pub fn get_raw(&self, path: &str) -> Option<&RawFile> {
        self.typed(path, ResourceKind::RawFile, Resource::as_raw)
    }

    /// The whole mapping
    pub fn all(&self) -> &HashMap<String, Resource> {
        &self.assets
    }

    /// Sorted paths of every resource of `kind`
    pub fn paths_of_kind(&self, kind: ResourceKind) -> Vec<&str> {
        let mut paths: Vec<&str> = self
            .assets
            .iter()
            .filter(|(_, r)| r.kind() == kind)
            .map(|(p, _)| p.as_str())
            .collect();
        paths.sort_unstable();
        paths
    }

    pub fn contains(&self, path: &str) -> bool {
        self.assets.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    pub fn state(&self) -> StoreState<'_> {
        match &self.root {
            Some(root) => StoreState::Loaded { root },
            None => StoreState::Empty,
        }
    }

    /// Root of the current mapping, if loaded
    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }
}

impl<B: NativeBackend> Drop for AssetStore<B> {
    fn drop(&mut self) {
        self.dispose();
    }
}
