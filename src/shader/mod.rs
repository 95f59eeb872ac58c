mod attribute;
mod layout;
mod uniform;

pub use attribute::AttributeType;
pub use layout::{ShaderLayout, VertexAttribute, VertexBufferDesc};
pub use uniform::UniformValue;

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::error::ShaderError;
use crate::renderer::{ProgramId, RenderBackend};

/// A vertex/fragment source pair, its introspected layout and the uniform
/// values assigned to it.
///
/// Uniform values live on the CPU side until the shader is flushed to a
/// backend, so a shader can be configured before any program exists.
#[derive(Debug)]
pub struct Shader {
    vertex_source: String,
    fragment_source: String,
    layout: Arc<ShaderLayout>,
    values: BTreeMap<String, UniformValue>,
    pending: BTreeSet<String>,
    program: Option<ProgramId>,
    compile_failed: bool,
}

impl Shader {
    pub fn from_sources(vertex_source: impl Into<String>, fragment_source: impl Into<String>) -> Self {
        let vertex_source = vertex_source.into();
        let fragment_source = fragment_source.into();
        let layout = Arc::new(ShaderLayout::from_sources(&vertex_source, &fragment_source));
        Self {
            vertex_source,
            fragment_source,
            layout,
            values: BTreeMap::new(),
            pending: BTreeSet::new(),
            program: None,
            compile_failed: false,
        }
    }

    pub fn load(vertex_path: impl AsRef<Path>, fragment_path: impl AsRef<Path>) -> Result<Self> {
        let vertex_path = vertex_path.as_ref();
        let fragment_path = fragment_path.as_ref();
        let vertex_source = fs::read_to_string(vertex_path)
            .with_context(|| format!("Failed to read vertex shader {}", vertex_path.display()))?;
        let fragment_source = fs::read_to_string(fragment_path)
            .with_context(|| format!("Failed to read fragment shader {}", fragment_path.display()))?;
        log::info!(
            "Loaded shader {} + {}",
            vertex_path.display(),
            fragment_path.display()
        );
        Ok(Self::from_sources(vertex_source, fragment_source))
    }

    pub fn layout(&self) -> &Arc<ShaderLayout> {
        &self.layout
    }

    /// Floats per vertex expected by this shader.
    pub fn attribute_size(&self) -> usize {
        self.layout.stride()
    }

    pub fn vertex_source(&self) -> &str {
        &self.vertex_source
    }

    pub fn fragment_source(&self) -> &str {
        &self.fragment_source
    }

    /// Assigns a declared uniform. Values for undeclared names or of the wrong
    /// type are rejected and the stored value is left untouched.
    pub fn set(&mut self, name: &str, value: impl Into<UniformValue>) -> Result<(), ShaderError> {
        let value = value.into();
        let declared = self
            .layout
            .uniform(name)
            .ok_or_else(|| ShaderError::UnknownUniform(name.to_string()))?;
        if !value.fits(declared) {
            return Err(ShaderError::UniformTypeMismatch {
                name: name.to_string(),
                expected: declared,
                found: value.attribute_type(),
            });
        }
        self.values.insert(name.to_string(), value);
        self.pending.insert(name.to_string());
        Ok(())
    }

    /// Last value assigned to `name`, if it has the requested type.
    pub fn get<T: TryFrom<UniformValue>>(&self, name: &str) -> Option<T> {
        self.values.get(name).and_then(|v| T::try_from(*v).ok())
    }

    pub fn value(&self, name: &str) -> Option<&UniformValue> {
        self.values.get(name)
    }

    pub fn program(&self) -> Option<ProgramId> {
        self.program
    }

    /// Compiles and links through `backend` on first use.
    ///
    /// A failed build is logged and remembered; the shader then stays without a
    /// program and draws that use it are skipped.
    pub fn compile(&mut self, backend: &mut dyn RenderBackend) -> Option<ProgramId> {
        if self.program.is_some() || self.compile_failed {
            return self.program;
        }
        match backend.compile_program(&self.vertex_source, &self.fragment_source) {
            Ok(program) => {
                log::debug!("Compiled shader program {:?}", program);
                self.program = Some(program);
                self.pending = self.values.keys().cloned().collect();
            }
            Err(e) => {
                log::error!("Error: {}", e);
                self.compile_failed = true;
            }
        }
        self.program
    }

    /// Sends uniforms assigned since the last flush.
    pub fn flush_uniforms(&mut self, backend: &mut dyn RenderBackend) {
        let Some(program) = self.program else {
            return;
        };
        for name in std::mem::take(&mut self.pending) {
            if let Some(value) = self.values.get(&name) {
                backend.set_uniform(program, &name, value);
            }
        }
    }

    pub fn release(&mut self, backend: &mut dyn RenderBackend) {
        if let Some(program) = self.program.take() {
            backend.delete_program(program);
        }
        self.compile_failed = false;
    }
}
