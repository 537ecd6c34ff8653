use std::borrow::Cow;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use wgpu::{Device, ShaderModule};

use crate::error::RenderError;

pub type ShaderId = usize;

pub const TILE_SHADER_SOURCE: &str = include_str!("../shader/tile.wgsl");

/// Where a shader's WGSL comes from.
#[derive(Debug, Clone)]
pub enum WgslSource {
    Embedded(&'static str),
    File(PathBuf),
}

impl WgslSource {
    pub fn load(&self) -> Result<Cow<'static, str>, RenderError> {
        match self {
            WgslSource::Embedded(source) => Ok(Cow::Borrowed(source)),
            WgslSource::File(path) => std::fs::read_to_string(path)
                .map(Cow::Owned)
                .map_err(|source| RenderError::ShaderIo {
                    path: path.clone(),
                    source,
                }),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Shader {
    name: String,
    vertex_entry: String,
    fragment_entry: String,

    handle: Arc<ShaderModule>,
}

impl Shader {
    pub fn handle(&self) -> Arc<ShaderModule> {
        self.handle.clone()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn vertex_entry(&self) -> &str {
        &self.vertex_entry
    }

    pub fn fragment_entry(&self) -> &str {
        &self.fragment_entry
    }
}

#[derive(Debug, Clone)]
pub struct ShaderBuilder {
    name: String,
    source: WgslSource,

    vertex_entry: String,
    fragment_entry: String,
}

impl ShaderBuilder {
    pub fn embedded(name: &str, source: &'static str) -> Self {
        Self {
            name: name.to_string(),
            source: WgslSource::Embedded(source),
            vertex_entry: "vs_main".to_string(),
            fragment_entry: "fs_main".to_string(),
        }
    }

    /// Names the shader after the file name of `path`.
    pub fn file(path: &Path) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self {
            name,
            source: WgslSource::File(path.to_owned()),
            vertex_entry: "vs_main".to_string(),
            fragment_entry: "fs_main".to_string(),
        }
    }

    pub fn name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn vertex_entry(mut self, entry_point: &str) -> Self {
        self.vertex_entry = entry_point.to_string();
        self
    }

    pub fn fragment_entry(mut self, entry_point: &str) -> Self {
        self.fragment_entry = entry_point.to_string();
        self
    }

    pub fn build(self, device: &Device) -> Result<Shader, RenderError> {
        let ShaderBuilder {
            name,
            source,
            vertex_entry,
            fragment_entry,
        } = self;

        let wgsl = source.load()?;
        let handle = Arc::new(device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(&name),
            source: wgpu::ShaderSource::Wgsl(wgsl),
        }));
        log::debug!("compiled shader {}", name);

        Ok(Shader {
            name,
            vertex_entry,
            fragment_entry,
            handle,
        })
    }
}

#[derive(Default)]
pub struct ShaderLibrary {
    shaders: Vec<Shader>,
}

impl ShaderLibrary {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn get(&self, id: ShaderId) -> Option<&Shader> {
        self.shaders.get(id)
    }

    pub fn len(&self) -> usize {
        self.shaders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shaders.is_empty()
    }
}

#[derive(Default)]
pub struct ShaderLibraryBuilder {
    builders: Vec<ShaderBuilder>,
}

impl ShaderLibraryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    // add can't use the usual chained builder form as the caller needs the
    // ShaderId (index within the library) back.
    pub fn add(&mut self, builder: ShaderBuilder) -> ShaderId {
        self.builders.push(builder);
        self.builders.len() - 1
    }

    pub fn build(self, device: &Device) -> Result<ShaderLibrary, RenderError> {
        Ok(ShaderLibrary {
            shaders: self
                .builders
                .into_iter()
                .map(|b| b.build(device))
                .collect::<Result<_, _>>()?,
        })
    }
}

// Module creation needs a device, so these only cover the parts that don't.
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_builder_defaults() {
        let builder = ShaderBuilder::file(&PathBuf::from("shader/tile.wgsl"));
        assert_eq!(builder.name, "tile.wgsl");
        assert_eq!(builder.vertex_entry, "vs_main");
        assert_eq!(builder.fragment_entry, "fs_main");
    }

    #[test]
    fn builder_overrides() {
        let builder = ShaderBuilder::embedded("tiles", TILE_SHADER_SOURCE)
            .name("Joblin")
            .vertex_entry("main2")
            .fragment_entry("frag2");
        assert_eq!(builder.name, "Joblin");
        assert_eq!(builder.vertex_entry, "main2");
        assert_eq!(builder.fragment_entry, "frag2");
    }

    #[test]
    fn library_ids_are_sequential() {
        let mut builder = ShaderLibraryBuilder::new();
        let first = builder.add(ShaderBuilder::embedded("a", TILE_SHADER_SOURCE));
        let second = builder.add(ShaderBuilder::file(&PathBuf::from("b.wgsl")));
        assert_eq!((first, second), (0, 1));
    }

    #[test]
    fn embedded_tile_shader_exposes_entry_points() {
        let source = WgslSource::Embedded(TILE_SHADER_SOURCE).load().expect("embedded");
        assert!(source.contains("fn vs_main"));
        assert!(source.contains("fn fs_main"));
        assert!(source.contains("@location(3) color"));
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = WgslSource::File(PathBuf::from("does/not/exist.wgsl"))
            .load()
            .unwrap_err();
        assert!(matches!(err, RenderError::ShaderIo { .. }));
        assert!(err.to_string().contains("exist.wgsl"));
    }
}
