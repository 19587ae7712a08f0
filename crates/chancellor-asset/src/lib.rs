//! Chancellor Asset - Directory-scanning asset store
//!
//! Walks an asset directory, decodes every file by extension into a typed
//! resource, and caches the result by `/`-joined relative path. Images, sounds
//! and shaders are handed to a [`NativeBackend`] and released exactly once when
//! the store is disposed or reloaded.

mod backend;
pub mod config;
mod dds;
pub mod decoder;
pub mod global;
mod store;
mod types;
pub mod walker;

pub use backend::{BackendError, HeadlessBackend, NativeBackend, NativeHandle};
pub use config::{AssetSettings, ChancellorConfig};
pub use decoder::{DecodeError, DecodedAudio, DecodedImage, DecodedShader, Payload};
pub use store::{AssetStore, DegradedAsset, LoadReport, LookupError, StoreState};
pub use types::{
    AudioHandle, ImageHandle, RawFile, Resource, ResourceKind, ShaderHandle, ShaderStage,
    XmlElement,
};
pub use walker::{WalkEntry, WalkOptions};
