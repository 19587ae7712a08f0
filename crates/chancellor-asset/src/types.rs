//! Resource type definitions

use crate::backend::NativeHandle;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Kinds of resources the store can hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Image,
    #[serde(rename = "audio")]
    AudioClip,
    #[serde(rename = "shader")]
    ShaderProgram,
    #[serde(rename = "json")]
    JsonValue,
    #[serde(rename = "xml")]
    XmlValue,
    #[serde(rename = "text")]
    TextBlob,
    #[serde(rename = "raw")]
    RawFile,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 7] = [
        ResourceKind::Image,
        ResourceKind::AudioClip,
        ResourceKind::ShaderProgram,
        ResourceKind::JsonValue,
        ResourceKind::XmlValue,
        ResourceKind::TextBlob,
        ResourceKind::RawFile,
    ];

    /// Short lowercase name, also accepted by `FromStr`
    pub fn name(self) -> &'static str {
        match self {
            ResourceKind::Image => "image",
            ResourceKind::AudioClip => "audio",
            ResourceKind::ShaderProgram => "shader",
            ResourceKind::JsonValue => "json",
            ResourceKind::XmlValue => "xml",
            ResourceKind::TextBlob => "text",
            ResourceKind::RawFile => "raw",
        }
    }

    /// Whether resources of this kind own a native handle that must be released
    pub fn is_native(self) -> bool {
        matches!(
            self,
            ResourceKind::Image | ResourceKind::AudioClip | ResourceKind::ShaderProgram
        )
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

impl FromStr for ResourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ResourceKind::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                format!(
                    "unknown resource kind '{}'; valid values: image, audio, shader, json, xml, text, raw",
                    s
                )
            })
    }
}

/// A decoded image living in a native texture
#[derive(Debug, PartialEq, Eq)]
pub struct ImageHandle {
    width: u32,
    height: u32,
    native: NativeHandle,
}

impl ImageHandle {
    pub(crate) fn new(width: u32, height: u32, native: NativeHandle) -> Self {
        Self {
            width,
            height,
            native,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn native(&self) -> &NativeHandle {
        &self.native
    }
}

/// A decoded sound living in a native audio buffer
#[derive(Debug, PartialEq, Eq)]
pub struct AudioHandle {
    sample_rate: u32,
    frames: usize,
    native: NativeHandle,
}

impl AudioHandle {
    pub(crate) fn new(sample_rate: u32, frames: usize, native: NativeHandle) -> Self {
        Self {
            sample_rate,
            frames,
            native,
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn frames(&self) -> usize {
        self.frames
    }

    /// Playback length at the native sample rate
    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.frames as f64 / self.sample_rate as f64)
    }

    pub fn native(&self) -> &NativeHandle {
        &self.native
    }
}

/// Pipeline stage a shader was compiled for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    pub(crate) fn to_naga(self) -> naga::ShaderStage {
        match self {
            ShaderStage::Vertex => naga::ShaderStage::Vertex,
            ShaderStage::Fragment => naga::ShaderStage::Fragment,
        }
    }
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => f.write_str("vertex"),
            ShaderStage::Fragment => f.write_str("fragment"),
        }
    }
}

/// A compiled shader program living in the native backend
#[derive(Debug, PartialEq, Eq)]
pub struct ShaderHandle {
    stage: ShaderStage,
    native: NativeHandle,
}

impl ShaderHandle {
    pub(crate) fn new(stage: ShaderStage, native: NativeHandle) -> Self {
        Self { stage, native }
    }

    pub fn stage(&self) -> ShaderStage {
        self.stage
    }

    pub fn native(&self) -> &NativeHandle {
        &self.native
    }
}

/// Generic XML element tree
///
/// Text content is the concatenation of the element's direct text nodes with
/// surrounding whitespace trimmed; whitespace-only text becomes `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct XmlElement {
    pub name: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<XmlElement>,
}

impl XmlElement {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(|v| v.as_str())
    }

    /// First direct child with the given tag name
    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.children.iter().find(|c| c.name == name)
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlElement> {
        self.children.iter().filter(move |c| c.name == name)
    }
}

/// A file kept by path only, because it was not recognized or failed to decode
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFile {
    path: PathBuf,
}

impl RawFile {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Location of the file on disk
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// One decoded asset
#[derive(Debug, PartialEq)]
pub enum Resource {
    Image(ImageHandle),
    Audio(AudioHandle),
    Shader(ShaderHandle),
    Json(serde_json::Value),
    Xml(XmlElement),
    Text(String),
    Raw(RawFile),
}

impl Resource {
    pub fn kind(&self) -> ResourceKind {
        match self {
            Resource::Image(_) => ResourceKind::Image,
            Resource::Audio(_) => ResourceKind::AudioClip,
            Resource::Shader(_) => ResourceKind::ShaderProgram,
            Resource::Json(_) => ResourceKind::JsonValue,
            Resource::Xml(_) => ResourceKind::XmlValue,
            Resource::Text(_) => ResourceKind::TextBlob,
            Resource::Raw(_) => ResourceKind::RawFile,
        }
    }

    pub fn is_native(&self) -> bool {
        self.kind().is_native()
    }

    pub fn as_image(&self) -> Option<&ImageHandle> {
        match self {
            Resource::Image(image) => Some(image),
            _ => None,
        }
    }

    pub fn as_audio(&self) -> Option<&AudioHandle> {
        match self {
            Resource::Audio(audio) => Some(audio),
            _ => None,
        }
    }

    pub fn as_shader(&self) -> Option<&ShaderHandle> {
        match self {
            Resource::Shader(shader) => Some(shader),
            _ => None,
        }
    }

    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            Resource::Json(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_xml(&self) -> Option<&XmlElement> {
        match self {
            Resource::Xml(element) => Some(element),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Resource::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_raw(&self) -> Option<&RawFile> {
        match self {
            Resource::Raw(raw) => Some(raw),
            _ => None,
        }
    }

    /// Give up the native handle, if any. Only the store calls this, on disposal.
    pub(crate) fn into_native(self) -> Option<NativeHandle> {
        match self {
            Resource::Image(image) => Some(image.native),
            Resource::Audio(audio) => Some(audio.native),
            Resource::Shader(shader) => Some(shader.native),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_round_trips_through_name() {
        for kind in ResourceKind::ALL {
            assert_eq!(kind.name().parse::<ResourceKind>().unwrap(), kind);
        }
        assert_eq!("IMAGE".parse::<ResourceKind>().unwrap(), ResourceKind::Image);
        assert!("mesh".parse::<ResourceKind>().is_err());
    }

    #[test]
    fn test_kind_serde_names() {
        let json = serde_json::to_string(&ResourceKind::ShaderProgram).unwrap();
        assert_eq!(json, r#""shader""#);
        let kind: ResourceKind = serde_json::from_str(r#""audio""#).unwrap();
        assert_eq!(kind, ResourceKind::AudioClip);
    }

    #[test]
    fn test_native_kinds() {
        let native: Vec<_> = ResourceKind::ALL
            .into_iter()
            .filter(|k| k.is_native())
            .collect();
        assert_eq!(
            native,
            vec![
                ResourceKind::Image,
                ResourceKind::AudioClip,
                ResourceKind::ShaderProgram
            ]
        );
    }

    #[test]
    fn test_accessors_match_only_their_variant() {
        let text = Resource::Text("hello".to_string());
        assert_eq!(text.kind(), ResourceKind::TextBlob);
        assert_eq!(text.as_text(), Some("hello"));
        assert!(text.as_json().is_none());
        assert!(text.as_raw().is_none());

        let raw = Resource::Raw(RawFile::new("/tmp/blob.bin"));
        assert_eq!(raw.as_raw().unwrap().path(), Path::new("/tmp/blob.bin"));
        assert!(raw.as_text().is_none());
        assert!(raw.into_native().is_none());
    }

    #[test]
    fn test_native_handle_moves_out_on_disposal() {
        let image = Resource::Image(ImageHandle::new(
            4,
            2,
            NativeHandle::new(ResourceKind::Image, 9),
        ));
        assert!(image.is_native());
        let handle = image.into_native().unwrap();
        assert_eq!(handle.id(), 9);
        assert_eq!(handle.kind(), ResourceKind::Image);
    }

    #[test]
    fn test_audio_duration() {
        let audio = AudioHandle::new(48_000, 24_000, NativeHandle::new(ResourceKind::AudioClip, 1));
        assert_eq!(audio.duration(), Duration::from_millis(500));

        let silent = AudioHandle::new(0, 10, NativeHandle::new(ResourceKind::AudioClip, 2));
        assert_eq!(silent.duration(), Duration::ZERO);
    }

    #[test]
    fn test_xml_lookup_helpers() {
        let mut attributes = BTreeMap::new();
        attributes.insert("id".to_string(), "hero".to_string());
        let root = XmlElement {
            name: "sprites".to_string(),
            attributes: BTreeMap::new(),
            text: None,
            children: vec![
                XmlElement {
                    name: "sprite".to_string(),
                    attributes,
                    text: Some("idle.png".to_string()),
                    children: vec![],
                },
                XmlElement {
                    name: "sprite".to_string(),
                    ..Default::default()
                },
            ],
        };

        assert_eq!(root.child("sprite").unwrap().attr("id"), Some("hero"));
        assert_eq!(root.children_named("sprite").count(), 2);
        assert!(root.child("sound").is_none());
    }
}
