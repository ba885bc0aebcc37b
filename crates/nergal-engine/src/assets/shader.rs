use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use super::cache::ResourceCache;
use super::error::CacheError;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct ProgramId(u32);

impl ProgramId {
    #[inline]
    pub fn get(self) -> u32 {
        self.0
    }
}

/// Compiled vertex and fragment modules for one `vertex|fragment` pair.
///
/// Entry points are `vs_main` and `fs_main`.
pub struct ShaderProgram {
    id: ProgramId,
    key: String,
    vertex: wgpu::ShaderModule,
    fragment: wgpu::ShaderModule,
}

impl fmt::Debug for ShaderProgram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShaderProgram")
            .field("id", &self.id)
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

impl ShaderProgram {
    #[inline]
    pub fn id(&self) -> ProgramId {
        self.id
    }

    #[inline]
    pub fn key(&self) -> &str {
        &self.key
    }

    #[inline]
    pub fn vertex(&self) -> &wgpu::ShaderModule {
        &self.vertex
    }

    #[inline]
    pub fn fragment(&self) -> &wgpu::ShaderModule {
        &self.fragment
    }
}

/// Cache key of a program: stage file names joined by `|`.
pub fn program_key(vertex: &str, fragment: &str, geometry: Option<&str>) -> String {
    match geometry {
        Some(g) => format!("{vertex}|{fragment}|{g}"),
        None => format!("{vertex}|{fragment}"),
    }
}

/// Returns the file named by an `#include "file"` (or `<file>`) line.
fn include_target(line: &str) -> Option<&str> {
    let rest = line.trim_start().strip_prefix("#include")?.trim();
    rest.strip_prefix('"')
        .and_then(|r| r.strip_suffix('"'))
        .or_else(|| rest.strip_prefix('<').and_then(|r| r.strip_suffix('>')))
        .map(str::trim)
        .filter(|name| !name.is_empty())
}

/// WGSL program cache with `#include` preprocessing.
///
/// Source files are resolved against `resource_dir` unless they were
/// registered in memory with [`ShaderCache::register_source`]. Loaded sources
/// stay cached independently of compiled programs.
pub struct ShaderCache {
    resource_dir: PathBuf,
    sources: HashMap<String, String>,
    keys: HashMap<String, ProgramId>,
    programs: ResourceCache<ProgramId, ShaderProgram>,
    next_id: u32,
}

impl fmt::Debug for ShaderCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShaderCache")
            .field("resource_dir", &self.resource_dir)
            .field("sources", &self.sources.len())
            .field("programs", &self.programs.len())
            .finish()
    }
}

impl ShaderCache {
    pub fn new(resource_dir: impl Into<PathBuf>) -> Self {
        Self {
            resource_dir: resource_dir.into(),
            sources: HashMap::new(),
            keys: HashMap::new(),
            programs: ResourceCache::new(),
            next_id: 1,
        }
    }

    #[inline]
    pub fn resource_dir(&self) -> &Path {
        &self.resource_dir
    }

    /// Makes `text` available under `name`, shadowing any file of that name.
    pub fn register_source(&mut self, name: &str, text: impl Into<String>) {
        self.sources.insert(name.to_owned(), text.into());
    }

    /// Returns the program for the given stages, compiling it on first use.
    pub fn get_program(
        &mut self,
        device: &wgpu::Device,
        vertex: &str,
        fragment: &str,
        geometry: Option<&str>,
    ) -> Result<Rc<ShaderProgram>, CacheError> {
        if let Some(name) = geometry {
            return Err(CacheError::UnsupportedStage { stage: "geometry", name: name.to_owned() });
        }

        let key = program_key(vertex, fragment, geometry);
        if let Some(program) = self.keys.get(&key).and_then(|&id| self.programs.get(id)) {
            return Ok(program);
        }

        let vertex_src = self.preprocess(vertex)?;
        let fragment_src = self.preprocess(fragment)?;

        let vertex_module = compile(device, vertex, vertex_src)?;
        let fragment_module = compile(device, fragment, fragment_src)?;

        let id = ProgramId(self.next_id);
        self.next_id += 1;

        let program = ShaderProgram {
            id,
            vertex: vertex_module,
            fragment: fragment_module,
            key: key.clone(),
        };
        log::debug!("compiled shader program {key} as #{}", id.0);

        self.keys.insert(key, id);
        Ok(self.programs.insert(id, program))
    }

    pub fn find(&self, id: ProgramId) -> Option<Rc<ShaderProgram>> {
        self.programs.get(id)
    }

    /// Expands `name` and its includes into a single source string.
    ///
    /// Every file is emitted at most once, so shared headers may be included
    /// from several places and include cycles terminate.
    pub fn preprocess(&mut self, name: &str) -> Result<String, CacheError> {
        let mut seen = HashSet::new();
        let mut out = String::new();
        self.expand(name, &mut seen, &mut out)?;
        Ok(out)
    }

    pub fn free(&mut self, id: ProgramId) {
        if self.programs.free(id).is_some() {
            self.keys.retain(|_, v| *v != id);
        }
    }

    pub fn free_all(&mut self) {
        let n = self.programs.free_all();
        self.keys.clear();
        log::debug!("freed {n} shader program(s)");
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.programs.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.programs.is_empty()
    }

    // ── private helpers ────────────────────────────────────────────────────

    fn expand(
        &mut self,
        name: &str,
        seen: &mut HashSet<String>,
        out: &mut String,
    ) -> Result<(), CacheError> {
        seen.insert(name.to_owned());
        let source = self.source(name)?.to_owned();

        for line in source.lines() {
            match include_target(line) {
                Some(include) => {
                    if !seen.contains(include) {
                        self.expand(include, seen, out)?;
                    }
                }
                None => {
                    out.push_str(line);
                    out.push('\n');
                }
            }
        }
        Ok(())
    }

    fn source(&mut self, name: &str) -> Result<&str, CacheError> {
        if !self.sources.contains_key(name) {
            let path = self.resource_dir.join(name);
            let text = std::fs::read_to_string(&path)
                .map_err(|source| CacheError::Io { path: path.clone(), source })?;
            log::trace!("loaded shader source {}", path.display());
            self.sources.insert(name.to_owned(), text);
        }
        Ok(self.sources.get(name).map(String::as_str).unwrap_or_default())
    }
}

/// Compiles one stage, turning WGSL validation failures into [`CacheError::Compile`].
fn compile(
    device: &wgpu::Device,
    label: &str,
    source: String,
) -> Result<wgpu::ShaderModule, CacheError> {
    let scope = device.push_error_scope(wgpu::ErrorFilter::Validation);
    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Wgsl(source.into()),
    });
    match pollster::block_on(scope.pop()) {
        None => Ok(module),
        Some(err) => {
            log::warn!("shader `{label}` failed to compile: {err}");
            Err(CacheError::Compile { name: label.to_owned(), message: err.to_string() })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_joins_stage_names() {
        assert_eq!(program_key("fx_default.wgsl", "fx_blur.wgsl", None), "fx_default.wgsl|fx_blur.wgsl");
        assert_eq!(program_key("a", "b", Some("c")), "a|b|c");
    }

    #[test]
    fn include_lines_are_recognised() {
        assert_eq!(include_target("#include \"common.wgsl\""), Some("common.wgsl"));
        assert_eq!(include_target("   #include <lib/noise.wgsl>"), Some("lib/noise.wgsl"));
        assert_eq!(include_target("// #include \"x\""), None);
        assert_eq!(include_target("#include \"\""), None);
        assert_eq!(include_target("let x = 1;"), None);
    }

    #[test]
    fn includes_expand_once() {
        let mut cache = ShaderCache::new("unused");
        cache.register_source("common.wgsl", "struct A { x: f32 };");
        cache.register_source("mid.wgsl", "#include \"common.wgsl\"\nfn mid() {}");
        cache.register_source(
            "main.wgsl",
            "#include \"common.wgsl\"\n#include \"mid.wgsl\"\nfn main() {}",
        );

        let out = cache.preprocess("main.wgsl").unwrap();
        assert_eq!(out.matches("struct A").count(), 1);
        assert_eq!(out, "struct A { x: f32 };\nfn mid() {}\nfn main() {}\n");
    }

    #[test]
    fn include_cycles_terminate() {
        let mut cache = ShaderCache::new("unused");
        cache.register_source("a.wgsl", "#include \"b.wgsl\"\nfn a() {}");
        cache.register_source("b.wgsl", "#include \"a.wgsl\"\nfn b() {}");
        let out = cache.preprocess("a.wgsl").unwrap();
        assert_eq!(out, "fn b() {}\nfn a() {}\n");
    }

    #[test]
    fn sources_load_from_resource_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("lib.wgsl"), "fn lib() {}\n").unwrap();
        std::fs::write(dir.path().join("main.wgsl"), "#include \"lib.wgsl\"\nfn main() {}\n").unwrap();

        let mut cache = ShaderCache::new(dir.path());
        let out = cache.preprocess("main.wgsl").unwrap();
        assert_eq!(out, "fn lib() {}\nfn main() {}\n");

        // Cached: removing the file does not matter anymore.
        std::fs::remove_file(dir.path().join("lib.wgsl")).unwrap();
        assert!(cache.preprocess("main.wgsl").is_ok());
    }

    #[test]
    fn compile_error_names_the_stage() {
        let err = CacheError::Compile { name: "broken.wgsl".into(), message: "expected `;`".into() };
        assert_eq!(err.to_string(), "shader `broken.wgsl` failed to compile: expected `;`");
    }

    #[test]
    fn invalid_wgsl_is_an_error_and_not_cached() {
        let Some((device, _queue)) = crate::device::headless::device() else { return };

        let mut cache = ShaderCache::new("unused");
        cache.register_source(
            "vs.wgsl",
            "@vertex fn vs_main() -> @builtin(position) vec4<f32> { return vec4<f32>(0.0); }",
        );
        cache.register_source("broken.wgsl", "@fragment fn fs_main( -> {");

        match cache.get_program(&device, "vs.wgsl", "broken.wgsl", None) {
            Err(CacheError::Compile { name, .. }) => assert_eq!(name, "broken.wgsl"),
            other => panic!("unexpected {other:?}"),
        }
        assert!(cache.is_empty());

        cache.register_source(
            "ok.wgsl",
            "@fragment fn fs_main() -> @location(0) vec4<f32> { return vec4<f32>(1.0); }",
        );
        let program = cache.get_program(&device, "vs.wgsl", "ok.wgsl", None).unwrap();
        assert_eq!(program.id().get(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn missing_include_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = ShaderCache::new(dir.path());
        cache.register_source("main.wgsl", "#include \"gone.wgsl\"");
        match cache.preprocess("main.wgsl") {
            Err(CacheError::Io { path, .. }) => assert!(path.ends_with("gone.wgsl")),
            other => panic!("unexpected {other:?}"),
        }
    }
}
