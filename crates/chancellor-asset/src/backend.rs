//! Native resource backend: turns decoded CPU data into native handles and releases them

use crate::decoder::{DecodedAudio, DecodedImage, DecodedShader};
use crate::types::ResourceKind;
use std::collections::{HashMap, HashSet};
use thiserror::Error;

/// Opaque reference to a resource owned by the native backend.
///
/// Not `Clone`: whoever holds the handle value is the one who releases it,
/// and inside the store that is always the store itself.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct NativeHandle {
    kind: ResourceKind,
    id: u64,
}

impl NativeHandle {
    /// Mint a handle. Backends call this when an upload succeeds.
    pub fn new(kind: ResourceKind, id: u64) -> Self {
        Self { kind, id }
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn id(&self) -> u64 {
        self.id
    }
}

/// Errors a backend reports when it cannot create a native resource
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("{kind} resources are not supported by this backend")]
    Unsupported { kind: ResourceKind },

    #[error("{kind} upload rejected: {reason}")]
    Rejected { kind: ResourceKind, reason: String },
}

/// The native side of the asset store (GPU textures, audio buffers, shader programs).
///
/// Upload methods receive the relative asset path for labelling.
pub trait NativeBackend {
    fn upload_texture(
        &mut self,
        path: &str,
        image: &DecodedImage,
    ) -> Result<NativeHandle, BackendError>;

    fn upload_sound(
        &mut self,
        path: &str,
        audio: &DecodedAudio,
    ) -> Result<NativeHandle, BackendError>;

    fn link_shader(
        &mut self,
        path: &str,
        shader: &DecodedShader,
    ) -> Result<NativeHandle, BackendError>;

    /// Release a handle previously returned by one of the upload methods
    fn release(&mut self, handle: NativeHandle);
}

impl<B: NativeBackend + ?Sized> NativeBackend for Box<B> {
    fn upload_texture(
        &mut self,
        path: &str,
        image: &DecodedImage,
    ) -> Result<NativeHandle, BackendError> {
        (**self).upload_texture(path, image)
    }

    fn upload_sound(
        &mut self,
        path: &str,
        audio: &DecodedAudio,
    ) -> Result<NativeHandle, BackendError> {
        (**self).upload_sound(path, audio)
    }

    fn link_shader(
        &mut self,
        path: &str,
        shader: &DecodedShader,
    ) -> Result<NativeHandle, BackendError> {
        (**self).link_shader(path, shader)
    }

    fn release(&mut self, handle: NativeHandle) {
        (**self).release(handle)
    }
}

/// Backend that needs no GPU or audio device.
///
/// Hands out sequential ids, keeps the set of live handles, and counts uploads
/// and releases so callers can check that nothing leaks.
#[derive(Debug, Default)]
pub struct HeadlessBackend {
    next_id: u64,
    live: HashMap<u64, (ResourceKind, String)>,
    rejected: HashSet<ResourceKind>,
    uploads: usize,
    releases: usize,
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse every upload of `kind`, as a machine without that device would
    pub fn rejecting(mut self, kind: ResourceKind) -> Self {
        self.rejected.insert(kind);
        self
    }

    /// Number of handles uploaded and not yet released
    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    pub fn live_of_kind(&self, kind: ResourceKind) -> usize {
        self.live.values().filter(|(k, _)| *k == kind).count()
    }

    pub fn is_live(&self, id: u64) -> bool {
        self.live.contains_key(&id)
    }

    /// Asset path the live handle was uploaded for
    pub fn label(&self, id: u64) -> Option<&str> {
        self.live.get(&id).map(|(_, label)| label.as_str())
    }

    pub fn uploads(&self) -> usize {
        self.uploads
    }

    pub fn releases(&self) -> usize {
        self.releases
    }

    fn allocate(&mut self, kind: ResourceKind, path: &str) -> Result<NativeHandle, BackendError> {
        if self.rejected.contains(&kind) {
            return Err(BackendError::Unsupported { kind });
        }

        self.next_id += 1;
        self.uploads += 1;
        self.live.insert(self.next_id, (kind, path.to_string()));
        Ok(NativeHandle::new(kind, self.next_id))
    }
}

impl NativeBackend for HeadlessBackend {
    fn upload_texture(
        &mut self,
        path: &str,
        image: &DecodedImage,
    ) -> Result<NativeHandle, BackendError> {
        let expected = image.width as usize * image.height as usize * 4;
        if image.pixels.len() != expected {
            return Err(BackendError::Rejected {
                kind: ResourceKind::Image,
                reason: format!(
                    "expected {} bytes of RGBA8 data, got {}",
                    expected,
                    image.pixels.len()
                ),
            });
        }
        self.allocate(ResourceKind::Image, path)
    }

    fn upload_sound(
        &mut self,
        path: &str,
        _audio: &DecodedAudio,
    ) -> Result<NativeHandle, BackendError> {
        self.allocate(ResourceKind::AudioClip, path)
    }

    fn link_shader(
        &mut self,
        path: &str,
        shader: &DecodedShader,
    ) -> Result<NativeHandle, BackendError> {
        // No driver to compile against; naga is the closest available check
        if let Err(reason) = shader.validate() {
            log::warn!("Shader {} not validated, linking anyway: {}", path, reason);
        }
        self.allocate(ResourceKind::ShaderProgram, path)
    }

    fn release(&mut self, handle: NativeHandle) {
        match self.live.remove(&handle.id) {
            Some(_) => self.releases += 1,
            None => log::error!(
                "Release of unknown {} handle #{} ignored",
                handle.kind,
                handle.id
            ),
        }
    }
}
