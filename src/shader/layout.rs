//! Vertex layout discovery from shader source text.
//!
//! Each line is tokenized and split into `;`-terminated statements, which are
//! then classified. A per-vertex input is a statement carrying a
//! `layout(location = N)` qualifier, the `in` storage keyword, a type keyword
//! and a variable name. A uniform is a statement carrying the `uniform`
//! keyword, a type keyword and a name. Text after the last `;` of a line is
//! not a statement.
//!
//! Type keywords only match whole tokens, so `mat2` never matches inside
//! `mat2x3` and `vec3` never matches inside an identifier like `myvec3`.
//! Offsets are assigned in declaration order; sources are expected to declare
//! their inputs in ascending location order.

use std::collections::BTreeMap;

use super::attribute::AttributeType;

const FLOAT_BYTES: u64 = std::mem::size_of::<f32>() as u64;

/// One per-vertex input discovered in the vertex stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexAttribute {
    pub location: u32,
    pub ty: AttributeType,
    /// Offset from the start of a vertex, in floats.
    pub offset: usize,
}

/// The vertex layout and uniform table of one shader program.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShaderLayout {
    attributes: Vec<(String, VertexAttribute)>,
    uniforms: BTreeMap<String, AttributeType>,
    stride: usize,
}

#[derive(Debug, Clone, PartialEq)]
enum Token<'s> {
    Ident(&'s str),
    Number(u32),
    Punct(char),
}

fn tokenize(line: &str) -> Vec<Token<'_>> {
    let line = match line.find("//") {
        Some(comment) => &line[..comment],
        None => line,
    };

    let mut tokens = Vec::new();
    let bytes = line.as_bytes();
    let mut pos = 0;
    while pos < bytes.len() {
        let c = bytes[pos] as char;
        if c.is_ascii_whitespace() {
            pos += 1;
        } else if c.is_ascii_alphabetic() || c == '_' {
            let start = pos;
            while pos < bytes.len() && (bytes[pos].is_ascii_alphanumeric() || bytes[pos] == b'_') {
                pos += 1;
            }
            tokens.push(Token::Ident(&line[start..pos]));
        } else if c.is_ascii_digit() {
            let start = pos;
            while pos < bytes.len() && bytes[pos].is_ascii_digit() {
                pos += 1;
            }
            // Overlong literals are not valid locations anyway.
            if let Ok(value) = line[start..pos].parse() {
                tokens.push(Token::Number(value));
            }
        } else {
            tokens.push(Token::Punct(c));
            pos += 1;
            // Skip the remaining bytes of a multi-byte character.
            while pos < bytes.len() && !line.is_char_boundary(pos) {
                pos += 1;
            }
        }
    }
    tokens
}

fn has_ident(tokens: &[Token<'_>], word: &str) -> bool {
    tokens.iter().any(|t| matches!(t, Token::Ident(w) if *w == word))
}

fn position_of_ident(tokens: &[Token<'_>], word: &str) -> Option<usize> {
    tokens.iter().position(|t| matches!(t, Token::Ident(w) if *w == word))
}

/// Finds the first type keyword at or after `from` and the declared names that
/// follow it, up to the terminating `;`.
fn typed_declaration<'s>(tokens: &[Token<'s>], from: usize) -> Option<(AttributeType, Vec<&'s str>)> {
    let semicolon = from + tokens.get(from..)?.iter().position(|t| *t == Token::Punct(';'))?;
    let (type_pos, ty) = tokens[from..semicolon]
        .iter()
        .enumerate()
        .find_map(|(i, t)| match t {
            Token::Ident(w) => AttributeType::from_keyword(w).map(|ty| (from + i, ty)),
            _ => None,
        })?;

    let mut names = Vec::new();
    let mut expect_name = true;
    let mut depth = 0usize;
    for token in &tokens[type_pos + 1..semicolon] {
        match token {
            Token::Punct('[') => depth += 1,
            Token::Punct(']') => depth = depth.saturating_sub(1),
            Token::Punct(',') if depth == 0 => expect_name = true,
            Token::Punct('=') if depth == 0 => expect_name = false,
            Token::Ident(name) if expect_name && depth == 0 => {
                names.push(*name);
                expect_name = false;
            }
            _ => {}
        }
    }

    if names.is_empty() {
        None
    } else {
        Some((ty, names))
    }
}

fn location_of(tokens: &[Token<'_>], layout_pos: usize) -> Option<u32> {
    let rest = &tokens[layout_pos..];
    let explicit = rest.windows(3).find_map(|w| match w {
        [Token::Ident("location"), Token::Punct('='), Token::Number(n)] => Some(*n),
        _ => None,
    });
    explicit.or_else(|| {
        rest.iter().find_map(|t| match t {
            Token::Number(n) => Some(*n),
            _ => None,
        })
    })
}

impl ShaderLayout {
    /// Scans both stages. Inputs are only read from the vertex stage, uniforms from both.
    pub fn from_sources(vertex_source: &str, fragment_source: &str) -> Self {
        let mut layout = ShaderLayout::default();
        for line in vertex_source.lines() {
            layout.scan_line(line, true);
        }
        for line in fragment_source.lines() {
            layout.scan_line(line, false);
        }
        log::debug!(
            "resolved shader layout: {} attributes, stride {}, {} uniforms",
            layout.attributes.len(),
            layout.stride,
            layout.uniforms.len()
        );
        layout
    }

    fn scan_line(&mut self, line: &str, vertex_stage: bool) {
        let tokens = tokenize(line);
        for statement in tokens.split_inclusive(|t| *t == Token::Punct(';')) {
            self.scan_statement(statement, vertex_stage);
        }
    }

    fn scan_statement(&mut self, tokens: &[Token<'_>], vertex_stage: bool) {
        if let Some(uniform_pos) = position_of_ident(tokens, "uniform") {
            if let Some((ty, names)) = typed_declaration(tokens, uniform_pos + 1) {
                for name in names {
                    self.uniforms.entry(name.to_string()).or_insert(ty);
                }
            }
            return;
        }

        if !vertex_stage || !has_ident(tokens, "in") {
            return;
        }
        let Some(layout_pos) = position_of_ident(tokens, "layout") else {
            return;
        };
        let Some(location) = location_of(tokens, layout_pos) else {
            return;
        };
        let Some(in_pos) = position_of_ident(tokens, "in") else {
            return;
        };
        let Some((ty, names)) = typed_declaration(tokens, in_pos + 1) else {
            return;
        };

        // A layout qualifier binds exactly one variable.
        let name = names[0];
        if self.attribute(name).is_some() {
            log::warn!("vertex input `{name}` declared twice, keeping the first declaration");
            return;
        }
        self.attributes.push((
            name.to_string(),
            VertexAttribute {
                location,
                ty,
                offset: self.stride,
            },
        ));
        self.stride += ty.component_count();
    }

    /// Floats per vertex: the sum of all input component counts.
    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn attribute(&self, name: &str) -> Option<&VertexAttribute> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, attribute)| attribute)
    }

    /// Inputs in declaration order.
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &VertexAttribute)> {
        self.attributes.iter().map(|(n, a)| (n.as_str(), a))
    }

    pub fn attribute_name(&self, location: u32) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(_, a)| a.location == location)
            .map(|(n, _)| n.as_str())
    }

    pub fn uniform(&self, name: &str) -> Option<AttributeType> {
        self.uniforms.get(name).copied()
    }

    pub fn uniforms(&self) -> &BTreeMap<String, AttributeType> {
        &self.uniforms
    }

    /// Describes the interleaved float buffer for a wgpu pipeline.
    pub fn vertex_buffer_desc(&self) -> VertexBufferDesc {
        let mut attributes = Vec::new();
        for (_, attribute) in &self.attributes {
            let columns = attribute.ty.columns();
            let rows = attribute.ty.component_count() / columns;
            let format = match rows {
                2 => wgpu::VertexFormat::Float32x2,
                3 => wgpu::VertexFormat::Float32x3,
                4 => wgpu::VertexFormat::Float32x4,
                _ => wgpu::VertexFormat::Float32,
            };
            for column in 0..columns {
                attributes.push(wgpu::VertexAttribute {
                    format,
                    offset: (attribute.offset + column * rows) as u64 * FLOAT_BYTES,
                    shader_location: attribute.location + column as u32,
                });
            }
        }
        VertexBufferDesc {
            array_stride: self.stride as u64 * FLOAT_BYTES,
            attributes,
        }
    }
}

/// Owned form of a `wgpu::VertexBufferLayout`.
#[derive(Debug, Clone, PartialEq)]
pub struct VertexBufferDesc {
    pub array_stride: wgpu::BufferAddress,
    pub attributes: Vec<wgpu::VertexAttribute>,
}

impl VertexBufferDesc {
    pub fn layout(&self) -> wgpu::VertexBufferLayout<'_> {
        wgpu::VertexBufferLayout {
            array_stride: self.array_stride,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &self.attributes,
        }
    }
}
