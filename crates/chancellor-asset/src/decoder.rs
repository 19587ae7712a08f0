//! Extension-based decoding of asset files into resources
//!
//! Decoding happens in two steps: [`decode`] turns bytes into CPU-side data
//! without touching the backend, and [`convert`] reads a walked file, decodes
//! it, and uploads native-backed payloads. Every failure is a [`DecodeError`],
//! which the store turns into a `RawFile` entry.

use crate::backend::{BackendError, NativeBackend};
use crate::dds;
use crate::types::{
    AudioHandle, ImageHandle, RawFile, Resource, ResourceKind, ShaderHandle, ShaderStage,
    XmlElement,
};
use crate::walker::WalkEntry;
use kira::sound::static_sound::StaticSoundData;
use std::io::Cursor;
use thiserror::Error;

/// Why a file with a recognized extension could not be decoded
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("could not read file: {0}")]
    Read(#[from] std::io::Error),

    #[error("invalid image: {0}")]
    Image(String),

    #[error("invalid JSON: {0}")]
    Json(String),

    #[error("invalid audio: {0}")]
    Audio(String),

    #[error("invalid shader source: {0}")]
    Shader(String),

    #[error("text is not valid UTF-8: {0}")]
    Text(String),

    #[error("invalid XML: {0}")]
    Xml(String),

    #[error("native upload failed: {0}")]
    Upload(#[from] BackendError),
}

/// RGBA8 pixels ready for texture upload
#[derive(Debug, Clone)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

/// Fully decoded PCM audio
pub struct DecodedAudio {
    pub sample_rate: u32,
    pub frames: usize,
    pub data: StaticSoundData,
}

/// GLSL source for one pipeline stage, compiled by the backend at link time
#[derive(Debug, Clone)]
pub struct DecodedShader {
    pub stage: ShaderStage,
    pub source: String,
}

impl DecodedShader {
    /// Parse and validate the source with naga's GLSL front end.
    ///
    /// naga only accepts `#version 440` and newer, so a failure here does not
    /// mean a GL driver would reject the shader.
    pub fn validate(&self) -> Result<naga::valid::ModuleInfo, String> {
        let mut frontend = naga::front::glsl::Frontend::default();
        let options = naga::front::glsl::Options::from(self.stage.to_naga());
        let module = frontend
            .parse(&options, &self.source)
            .map_err(|e| format!("{} stage: {}", self.stage, e))?;

        naga::valid::Validator::new(
            naga::valid::ValidationFlags::all(),
            naga::valid::Capabilities::all(),
        )
        .validate(&module)
        .map_err(|e| format!("{} stage: {}", self.stage, e))
    }
}

/// CPU-side result of decoding one file
pub enum Payload {
    Image(DecodedImage),
    Audio(DecodedAudio),
    Shader(DecodedShader),
    Json(serde_json::Value),
    Xml(XmlElement),
    Text(String),
}

/// Lower-cased substring after the last `.` of the file name
pub fn extension_of(path: &str) -> Option<String> {
    let file_name = path.rsplit('/').next().unwrap_or(path);
    let (_, ext) = file_name.rsplit_once('.')?;
    if ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Resource kind an extension (already lower-cased) dispatches to
pub fn kind_for_extension(ext: &str) -> ResourceKind {
    match ext {
        "png" | "jpg" | "jpeg" | "bmp" | "tga" | "gif" | "dds" | "hdr" => ResourceKind::Image,
        "json" => ResourceKind::JsonValue,
        "wav" | "mp3" | "ogg" => ResourceKind::AudioClip,
        "glsl" | "vert" | "frag" => ResourceKind::ShaderProgram,
        "txt" => ResourceKind::TextBlob,
        "xml" => ResourceKind::XmlValue,
        _ => ResourceKind::RawFile,
    }
}

/// Kind a path will be decoded as
pub fn kind_for_path(path: &str) -> ResourceKind {
    extension_of(path)
        .map(|ext| kind_for_extension(&ext))
        .unwrap_or(ResourceKind::RawFile)
}

/// Decode `bytes` according to the extension of `path`.
///
/// Returns `Ok(None)` for files that are always kept raw (unrecognized extensions).
pub fn decode(path: &str, bytes: &[u8]) -> Result<Option<Payload>, DecodeError> {
    let Some(ext) = extension_of(path) else {
        return Ok(None);
    };

    let payload = match kind_for_extension(&ext) {
        ResourceKind::Image => Payload::Image(decode_image(&ext, bytes)?),
        ResourceKind::JsonValue => Payload::Json(
            serde_json::from_slice(strip_bom(bytes))
                .map_err(|e| DecodeError::Json(e.to_string()))?,
        ),
        ResourceKind::AudioClip => Payload::Audio(decode_audio(bytes)?),
        ResourceKind::ShaderProgram => Payload::Shader(decode_shader(&ext, bytes)?),
        ResourceKind::TextBlob => Payload::Text(
            String::from_utf8(bytes.to_vec()).map_err(|e| DecodeError::Text(e.to_string()))?,
        ),
        ResourceKind::XmlValue => Payload::Xml(decode_xml(bytes)?),
        ResourceKind::RawFile => return Ok(None),
    };

    Ok(Some(payload))
}

/// Read, decode and upload one walked file.
///
/// Unrecognized files become `RawFile` without being read.
pub fn convert<B: NativeBackend + ?Sized>(
    entry: &WalkEntry,
    backend: &mut B,
) -> Result<Resource, DecodeError> {
    if kind_for_path(&entry.relative_path) == ResourceKind::RawFile {
        return Ok(Resource::Raw(RawFile::new(&entry.location)));
    }

    let bytes = std::fs::read(&entry.location)?;
    match decode(&entry.relative_path, &bytes)? {
        Some(payload) => upload(&entry.relative_path, payload, backend),
        None => Ok(Resource::Raw(RawFile::new(&entry.location))),
    }
}

/// Hand native-backed payloads to the backend; other payloads pass through
pub fn upload<B: NativeBackend + ?Sized>(
    path: &str,
    payload: Payload,
    backend: &mut B,
) -> Result<Resource, DecodeError> {
    let resource = match payload {
        Payload::Image(image) => {
            let native = backend.upload_texture(path, &image)?;
            Resource::Image(ImageHandle::new(image.width, image.height, native))
        }
        Payload::Audio(audio) => {
            let native = backend.upload_sound(path, &audio)?;
            Resource::Audio(AudioHandle::new(audio.sample_rate, audio.frames, native))
        }
        Payload::Shader(shader) => {
            let native = backend.link_shader(path, &shader)?;
            Resource::Shader(ShaderHandle::new(shader.stage, native))
        }
        Payload::Json(value) => Resource::Json(value),
        Payload::Xml(element) => Resource::Xml(element),
        Payload::Text(text) => Resource::Text(text),
    };
    Ok(resource)
}

fn strip_bom(bytes: &[u8]) -> &[u8] {
    bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes)
}

fn decode_image(ext: &str, bytes: &[u8]) -> Result<DecodedImage, DecodeError> {
    let rgba = if ext == "dds" {
        dds::decode(bytes).map_err(DecodeError::Image)?
    } else {
        // TGA has no magic number, so trust the extension before sniffing
        match image::ImageFormat::from_extension(ext) {
            Some(format) => image::load_from_memory_with_format(bytes, format),
            None => image::load_from_memory(bytes),
        }
        .map_err(|e| DecodeError::Image(e.to_string()))?
        .to_rgba8()
    };

    let (width, height) = rgba.dimensions();
    Ok(DecodedImage {
        width,
        height,
        pixels: rgba.into_raw(),
    })
}

fn decode_audio(bytes: &[u8]) -> Result<DecodedAudio, DecodeError> {
    let data = StaticSoundData::from_cursor(Cursor::new(bytes.to_vec()))
        .map_err(|e| DecodeError::Audio(e.to_string()))?;
    Ok(DecodedAudio {
        sample_rate: data.sample_rate,
        frames: data.frames.len(),
        data,
    })
}

fn decode_shader(ext: &str, bytes: &[u8]) -> Result<DecodedShader, DecodeError> {
    let source = std::str::from_utf8(strip_bom(bytes))
        .map_err(|e| DecodeError::Shader(format!("source is not UTF-8: {}", e)))?;

    let stage = match ext {
        "vert" => ShaderStage::Vertex,
        "frag" => ShaderStage::Fragment,
        _ => guess_stage(source),
    };

    Ok(DecodedShader {
        stage,
        source: source.to_string(),
    })
}

/// Stage of a `.glsl` file: vertex if it writes `gl_Position` or declares
/// vertex attributes, fragment otherwise. Line comments are ignored.
fn guess_stage(source: &str) -> ShaderStage {
    let is_vertex = source
        .lines()
        .map(|line| line.split("//").next().unwrap_or_default().trim())
        .any(|line| line.contains("gl_Position") || line.starts_with("attribute "));

    if is_vertex {
        ShaderStage::Vertex
    } else {
        ShaderStage::Fragment
    }
}

fn decode_xml(bytes: &[u8]) -> Result<XmlElement, DecodeError> {
    let source = std::str::from_utf8(bytes).map_err(|e| DecodeError::Xml(e.to_string()))?;
    let options = roxmltree::ParsingOptions {
        allow_dtd: true,
        ..Default::default()
    };
    let document = roxmltree::Document::parse_with_options(source, options)
        .map_err(|e| DecodeError::Xml(e.to_string()))?;
    Ok(xml_element(document.root_element()))
}

fn xml_element(node: roxmltree::Node<'_, '_>) -> XmlElement {
    let attributes = node
        .attributes()
        .map(|a| (qualified_name(node, a.namespace(), a.name()), a.value().to_string()))
        .collect();

    let mut text = String::new();
    let mut children = Vec::new();
    for child in node.children() {
        if child.is_element() {
            children.push(xml_element(child));
        } else if child.is_text() {
            text.push_str(child.text().unwrap_or_default());
        }
    }

    let text = text.trim();
    XmlElement {
        name: qualified_name(node, node.tag_name().namespace(), node.tag_name().name()),
        attributes,
        text: (!text.is_empty()).then(|| text.to_string()),
        children,
    }
}

/// `prefix:local` when the namespace is bound to a prefix, `local` otherwise
fn qualified_name(node: roxmltree::Node<'_, '_>, namespace: Option<&str>, local: &str) -> String {
    match namespace.and_then(|uri| node.lookup_prefix(uri)) {
        Some(prefix) if !prefix.is_empty() => format!("{}:{}", prefix, local),
        _ => local.to_string(),
    }
}
