use std::fmt;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use image::{imageops, DynamicImage, ImageFormat, RgbaImage};

use crate::render::RenderCtx;

use super::cache::ResourceCache;
use super::error::CacheError;

/// 32-bit FNV-1a hash.
pub const fn fnv1a(bytes: &[u8]) -> u32 {
    let mut hash: u32 = 0x811c_9dc5;
    let mut i = 0;
    while i < bytes.len() {
        hash ^= bytes[i] as u32;
        hash = hash.wrapping_mul(0x0100_0193);
        i += 1;
    }
    hash
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct TextureId(u32);

impl TextureId {
    pub fn for_name(filename: &str) -> Self {
        Self(fnv1a(filename.as_bytes()))
    }

    #[inline]
    pub fn get(self) -> u32 {
        self.0
    }
}

/// Sampling setup applied when a texture is created.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub enum TextureProfile {
    Nearest,
    #[default]
    Linear,
    /// Linear filtering over a CPU-generated mip chain.
    MipMapped,
    /// `MipMapped` plus 16x anisotropic filtering.
    Anisotropic,
}

impl TextureProfile {
    #[inline]
    pub fn uses_mipmaps(self) -> bool {
        matches!(self, TextureProfile::MipMapped | TextureProfile::Anisotropic)
    }
}

/// Image container, chosen from the file extension.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum TextureFormat {
    Png,
    Jpeg,
    Bmp,
    Dds,
    Tga,
}

impl TextureFormat {
    pub fn from_path(path: &Path) -> Result<Self, CacheError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();

        let format = match extension.as_str() {
            "png" => Some(TextureFormat::Png),
            "jpg" | "jpeg" => Some(TextureFormat::Jpeg),
            "bmp" => Some(TextureFormat::Bmp),
            "dds" if cfg!(feature = "extended-formats") => Some(TextureFormat::Dds),
            "tga" if cfg!(feature = "extended-formats") => Some(TextureFormat::Tga),
            _ => None,
        };
        format.ok_or_else(|| CacheError::UnsupportedFormat { path: path.to_path_buf(), extension })
    }

    fn image_format(self) -> ImageFormat {
        match self {
            TextureFormat::Png => ImageFormat::Png,
            TextureFormat::Jpeg => ImageFormat::Jpeg,
            TextureFormat::Bmp => ImageFormat::Bmp,
            TextureFormat::Dds => ImageFormat::Dds,
            TextureFormat::Tga => ImageFormat::Tga,
        }
    }
}

/// Reads `path` and returns tightly packed RGBA8 pixels.
pub(crate) fn decode_rgba(path: &Path, flip_h: bool, flip_v: bool) -> Result<RgbaImage, CacheError> {
    let format = TextureFormat::from_path(path)?;
    let mut reader = image::ImageReader::open(path)
        .map_err(|source| CacheError::Io { path: path.to_path_buf(), source })?;
    reader.set_format(format.image_format());
    let decoded = reader
        .decode()
        .map_err(|source| CacheError::Decode { path: path.to_path_buf(), source })?;

    let mut rgba = match decoded {
        DynamicImage::ImageRgba8(img) => img,
        other => {
            log::warn!(
                "unexpected {:?} pixel format in {}, converting to RGBA8",
                other.color(),
                path.display()
            );
            other.to_rgba8()
        }
    };

    if flip_h {
        imageops::flip_horizontal_in_place(&mut rgba);
    }
    if flip_v {
        imageops::flip_vertical_in_place(&mut rgba);
    }
    Ok(rgba)
}

/// Base level followed by successively halved levels down to 1x1.
pub(crate) fn mip_chain(base: RgbaImage) -> Vec<RgbaImage> {
    let mut levels = vec![base];
    loop {
        let Some(last) = levels.last() else { break };
        let (w, h) = last.dimensions();
        if w <= 1 && h <= 1 {
            break;
        }
        let next = imageops::resize(
            last,
            (w / 2).max(1),
            (h / 2).max(1),
            imageops::FilterType::Triangle,
        );
        levels.push(next);
    }
    levels
}

/// A sampled 2D texture living on the GPU.
pub struct Texture {
    id: TextureId,
    name: String,
    width: u32,
    height: u32,
    profile: TextureProfile,
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    sampler: wgpu::Sampler,
}

impl fmt::Debug for Texture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Texture")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("size", &(self.width, self.height))
            .field("profile", &self.profile)
            .finish_non_exhaustive()
    }
}

impl Texture {
    /// Uploads `base` (plus a mip chain when the profile asks for one) and
    /// builds the matching sampler.
    pub(crate) fn upload(
        ctx: &RenderCtx<'_>,
        id: TextureId,
        name: &str,
        base: RgbaImage,
        profile: TextureProfile,
    ) -> Self {
        let (width, height) = base.dimensions();
        let levels = if profile.uses_mipmaps() { mip_chain(base) } else { vec![base] };

        let texture = ctx.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(name),
            size: wgpu::Extent3d { width, height, depth_or_array_layers: 1 },
            mip_level_count: levels.len() as u32,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        for (mip, level) in levels.iter().enumerate() {
            let (w, h) = level.dimensions();
            ctx.queue.write_texture(
                wgpu::TexelCopyTextureInfo {
                    texture: &texture,
                    mip_level: mip as u32,
                    origin: wgpu::Origin3d::ZERO,
                    aspect: wgpu::TextureAspect::All,
                },
                level.as_raw(),
                wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(4 * w),
                    rows_per_image: Some(h),
                },
                wgpu::Extent3d { width: w, height: h, depth_or_array_layers: 1 },
            );
        }

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = ctx.device.create_sampler(&sampler_descriptor(name, profile));

        Self {
            id,
            name: name.to_owned(),
            width,
            height,
            profile,
            texture,
            view,
            sampler,
        }
    }

    #[inline]
    pub fn id(&self) -> TextureId {
        self.id
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    #[inline]
    pub fn profile(&self) -> TextureProfile {
        self.profile
    }

    #[inline]
    pub fn texture(&self) -> &wgpu::Texture {
        &self.texture
    }

    #[inline]
    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    #[inline]
    pub fn sampler(&self) -> &wgpu::Sampler {
        &self.sampler
    }
}

fn sampler_descriptor(label: &str, profile: TextureProfile) -> wgpu::SamplerDescriptor<'_> {
    let (filter, mipmap_filter, anisotropy_clamp) = match profile {
        TextureProfile::Nearest => (wgpu::FilterMode::Nearest, wgpu::MipmapFilterMode::Nearest, 1),
        TextureProfile::Linear => (wgpu::FilterMode::Linear, wgpu::MipmapFilterMode::Nearest, 1),
        TextureProfile::MipMapped => (wgpu::FilterMode::Linear, wgpu::MipmapFilterMode::Linear, 1),
        TextureProfile::Anisotropic => (wgpu::FilterMode::Linear, wgpu::MipmapFilterMode::Linear, 16),
    };
    wgpu::SamplerDescriptor {
        label: Some(label),
        address_mode_u: wgpu::AddressMode::Repeat,
        address_mode_v: wgpu::AddressMode::Repeat,
        address_mode_w: wgpu::AddressMode::Repeat,
        mag_filter: filter,
        min_filter: filter,
        mipmap_filter,
        anisotropy_clamp,
        ..Default::default()
    }
}

/// Filename-keyed texture cache.
pub struct TextureCache {
    resource_dir: PathBuf,
    flip_h: bool,
    flip_v: bool,
    textures: ResourceCache<TextureId, Texture>,
}

impl fmt::Debug for TextureCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextureCache")
            .field("resource_dir", &self.resource_dir)
            .field("textures", &self.textures.len())
            .finish()
    }
}

impl TextureCache {
    pub fn new(resource_dir: impl Into<PathBuf>) -> Self {
        Self {
            resource_dir: resource_dir.into(),
            flip_h: false,
            flip_v: false,
            textures: ResourceCache::new(),
        }
    }

    /// Flips applied to textures loaded from now on.
    pub fn set_flip(&mut self, horizontal: bool, vertical: bool) {
        self.flip_h = horizontal;
        self.flip_v = vertical;
    }

    /// Returns the texture for `filename`, loading and uploading it on a miss.
    ///
    /// The profile only applies on creation; later lookups return the cached
    /// texture as it was first built.
    pub fn get(
        &mut self,
        ctx: &RenderCtx<'_>,
        filename: &str,
        profile: TextureProfile,
    ) -> Result<Rc<Texture>, CacheError> {
        let id = TextureId::for_name(filename);
        if let Some(existing) = self.textures.get(id) {
            if existing.name() != filename {
                log::warn!("texture id collision: `{filename}` and `{}`", existing.name());
            }
            return Ok(existing);
        }

        log::debug!("loading texture {filename}");
        let path = self.resource_dir.join(filename);
        let base = decode_rgba(&path, self.flip_h, self.flip_v)?;
        log::trace!("decoded {}x{} texture {filename}", base.width(), base.height());

        let texture = Texture::upload(ctx, id, filename, base, profile);
        Ok(self.textures.insert(id, texture))
    }

    pub fn find(&self, id: TextureId) -> Option<Rc<Texture>> {
        self.textures.get(id)
    }

    pub fn free(&mut self, id: TextureId) {
        self.textures.free(id);
    }

    pub fn free_all(&mut self) {
        let n = self.textures.free_all();
        log::debug!("freed {n} texture(s)");
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.textures.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }
}
