//! The boundary between the scene runtime and a graphics API.
//!
//! The runtime decides what has to reach the GPU (a compiled program, one
//! interleaved float vertex buffer, one `u32` index buffer, uniform values and
//! a single indexed draw). A [`RenderBackend`] decides how.

use std::collections::HashMap;

use crate::error::{ShaderError, ShaderStage};
use crate::shader::UniformValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgramId(pub u32);

pub trait RenderBackend {
    fn compile_program(&mut self, vertex_source: &str, fragment_source: &str) -> Result<ProgramId, ShaderError>;

    /// Replaces the bound vertex and index buffers.
    fn upload(&mut self, layout: wgpu::VertexBufferLayout<'_>, vertices: &[u8], indices: &[u8]);

    fn set_uniform(&mut self, program: ProgramId, name: &str, value: &UniformValue);

    fn draw_indexed(&mut self, program: ProgramId, index_count: u32);

    fn delete_program(&mut self, program: ProgramId);
}

#[derive(Debug, Clone, PartialEq)]
pub struct UploadRecord {
    pub array_stride: wgpu::BufferAddress,
    pub attribute_count: usize,
    pub vertex_bytes: usize,
    pub index_bytes: usize,
}

/// A backend without a device. Sources get a structural check instead of a
/// real compile, and every call is recorded for inspection.
#[derive(Debug, Default)]
pub struct HeadlessBackend {
    next_program: u32,
    pub live_programs: Vec<ProgramId>,
    pub uploads: Vec<UploadRecord>,
    pub uniforms: HashMap<(ProgramId, String), UniformValue>,
    pub draws: Vec<(ProgramId, u32)>,
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn check_stage(stage: ShaderStage, source: &str) -> Result<(), ShaderError> {
        let mut depth = 0i64;
        for c in source.chars() {
            match c {
                '{' => depth += 1,
                '}' => depth -= 1,
                _ => {}
            }
            if depth < 0 {
                break;
            }
        }
        if depth != 0 {
            return Err(ShaderError::Compile {
                stage,
                log: "unbalanced braces".to_string(),
            });
        }
        if !source.contains("main") {
            return Err(ShaderError::Compile {
                stage,
                log: "missing entry point `main`".to_string(),
            });
        }
        Ok(())
    }
}

impl RenderBackend for HeadlessBackend {
    fn compile_program(&mut self, vertex_source: &str, fragment_source: &str) -> Result<ProgramId, ShaderError> {
        Self::check_stage(ShaderStage::Vertex, vertex_source)?;
        Self::check_stage(ShaderStage::Fragment, fragment_source)?;
        self.next_program += 1;
        let program = ProgramId(self.next_program);
        self.live_programs.push(program);
        Ok(program)
    }

    fn upload(&mut self, layout: wgpu::VertexBufferLayout<'_>, vertices: &[u8], indices: &[u8]) {
        self.uploads.push(UploadRecord {
            array_stride: layout.array_stride,
            attribute_count: layout.attributes.len(),
            vertex_bytes: vertices.len(),
            index_bytes: indices.len(),
        });
    }

    fn set_uniform(&mut self, program: ProgramId, name: &str, value: &UniformValue) {
        self.uniforms.insert((program, name.to_string()), *value);
    }

    fn draw_indexed(&mut self, program: ProgramId, index_count: u32) {
        self.draws.push((program, index_count));
    }

    fn delete_program(&mut self, program: ProgramId) {
        self.live_programs.retain(|p| *p != program);
        self.uniforms.retain(|(p, _), _| *p != program);
    }
}
