//! Scene documents.
//!
//! Both document syntaxes are read into the same [`Node`] tree, and a single
//! interpreter in [`parser`] turns that tree into a [`Scene`].

pub mod json;
pub mod markup;
pub mod parser;

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::error::DocumentError;
use crate::scene::Scene;

pub use parser::{build_scene, ParseContext};

/// One element of a scene document: a tag, its string properties and its
/// nested elements.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Node {
    pub name: String,
    pub props: BTreeMap<String, String>,
    pub children: Vec<Node>,
}

impl Node {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_prop(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.props.insert(key.into(), value.into());
        self
    }

    pub fn with_child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    /// Tag name as used for dispatch.
    pub fn tag(&self) -> String {
        self.name.to_ascii_lowercase()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.props.get(key).map(String::as_str)
    }

    /// The first alias present on the node, with its value.
    fn first<'k>(&self, keys: &[&'k str]) -> Option<(&'k str, &str)> {
        keys.iter().find_map(|&key| self.get(key).map(|value| (key, value)))
    }

    pub fn has(&self, keys: &[&str]) -> bool {
        self.first(keys).is_some()
    }

    pub fn string(&self, keys: &[&str]) -> Option<&str> {
        self.first(keys).map(|(_, value)| value)
    }

    /// Reads the first present alias as a float. An unparsable value falls
    /// back to `default` rather than trying the next alias.
    pub fn float(&self, keys: &[&str], default: f32) -> f32 {
        let Some((key, value)) = self.first(keys) else {
            return default;
        };
        match value.trim().parse::<f32>() {
            Ok(v) => v,
            Err(_) => {
                log::warn!("<{}> {}={:?} is not a number, using {}", self.name, key, value, default);
                default
            }
        }
    }

    /// Like [`Node::float`], for integer properties. Integral floats such as
    /// `32.0` are accepted.
    pub fn int(&self, keys: &[&str], default: i64) -> i64 {
        let Some((key, value)) = self.first(keys) else {
            return default;
        };
        let value = value.trim();
        if let Ok(v) = value.parse::<i64>() {
            return v;
        }
        match value.parse::<f64>() {
            Ok(v) if v.fract() == 0.0 => v as i64,
            _ => {
                log::warn!("<{}> {}={:?} is not an integer, using {}", self.name, key, value, default);
                default
            }
        }
    }

    /// Parses a number list such as `"1 0 0"` or `"1, 0, 0"`.
    pub fn floats(&self, key: &str) -> Option<Result<Vec<f32>, DocumentError>> {
        let value = self.get(key)?;
        Some(
            value
                .split(|c: char| c.is_whitespace() || c == ',')
                .filter(|part| !part.is_empty())
                .map(|part| {
                    part.parse::<f32>().map_err(|_| {
                        DocumentError::invalid_node(&self.name, format!("{key}: {part:?} is not a number"))
                    })
                })
                .collect(),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Markup,
    Json,
}

impl Format {
    /// Picks a format from the file extension, then from the first
    /// non-blank character of the content.
    pub fn detect(path: &Path, text: &str) -> Option<Self> {
        let extension = path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("json") => return Some(Format::Json),
            Some("xml") => return Some(Format::Markup),
            _ => {}
        }
        match text.trim_start().chars().next()? {
            '<' => Some(Format::Markup),
            '{' | '[' => Some(Format::Json),
            _ => None,
        }
    }
}

/// Reads the top-level scene nodes of a document.
pub fn read_nodes(text: &str, format: Format) -> Result<Vec<Node>, DocumentError> {
    match format {
        Format::Markup => Ok(markup::parse(text).map(parser::scene_nodes)?),
        Format::Json => json::parse(text),
    }
}

/// Builds a scene from document text. Shader paths resolve against `base_dir`.
pub fn parse_str(text: &str, format: Format, base_dir: &Path) -> Result<Scene, DocumentError> {
    let nodes = read_nodes(text, format)?;
    let mut context = ParseContext::new(base_dir);
    Ok(build_scene(&nodes, &mut context))
}

/// Loads a scene document, detecting its format. `None` when the file cannot
/// be read or is not a scene document.
pub fn load(path: impl AsRef<Path>) -> Option<Scene> {
    load_with_format(path, None)
}

pub fn load_with_format(path: impl AsRef<Path>, format: Option<Format>) -> Option<Scene> {
    let path = path.as_ref();
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) => {
            log::warn!("Failed to read scene {}: {}", path.display(), e);
            return None;
        }
    };
    let Some(format) = format.or_else(|| Format::detect(path, &text)) else {
        log::warn!("{} is neither a markup nor a json scene", path.display());
        return None;
    };
    let base_dir = path.parent().unwrap_or_else(|| Path::new(""));
    match parse_str(&text, format, base_dir) {
        Ok(scene) => {
            log::info!("Loaded scene {} ({} meshes)", path.display(), scene.meshes.len());
            Some(scene)
        }
        Err(e) => {
            log::warn!("Failed to parse scene {}: {}", path.display(), e);
            None
        }
    }
}
