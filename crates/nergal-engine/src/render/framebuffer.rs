/// Format of every depth attachment created by the renderer.
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Offscreen color target with an optional depth attachment.
///
/// The color texture is both renderable and sampleable so that one pass can
/// read what the previous one wrote.
pub struct FrameBuffer {
    label: &'static str,
    color: wgpu::Texture,
    color_view: wgpu::TextureView,
    depth: Option<(wgpu::Texture, wgpu::TextureView)>,
    width: u32,
    height: u32,
    format: wgpu::TextureFormat,
}

impl FrameBuffer {
    pub fn new(
        device: &wgpu::Device,
        label: &'static str,
        width: u32,
        height: u32,
        format: wgpu::TextureFormat,
        with_depth: bool,
    ) -> Self {
        let (width, height) = (width.max(1), height.max(1));
        let (color, color_view) = create_color(device, label, width, height, format);
        let depth = with_depth.then(|| create_depth(device, label, width, height));
        Self {
            label,
            color,
            color_view,
            depth,
            width,
            height,
            format,
        }
    }

    /// Recreates the attachments when the size changed. Returns whether it did.
    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) -> bool {
        let (width, height) = (width.max(1), height.max(1));
        if self.width == width && self.height == height {
            return false;
        }

        let (color, color_view) = create_color(device, self.label, width, height, self.format);
        self.color = color;
        self.color_view = color_view;
        if self.depth.is_some() {
            self.depth = Some(create_depth(device, self.label, width, height));
        }
        self.width = width;
        self.height = height;
        log::debug!("{} resized to {width}x{height}", self.label);
        true
    }

    #[inline]
    pub fn view(&self) -> &wgpu::TextureView {
        &self.color_view
    }

    #[inline]
    pub fn texture(&self) -> &wgpu::Texture {
        &self.color
    }

    #[inline]
    pub fn depth_view(&self) -> Option<&wgpu::TextureView> {
        self.depth.as_ref().map(|(_, v)| v)
    }

    #[inline]
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    #[inline]
    pub fn format(&self) -> wgpu::TextureFormat {
        self.format
    }
}

/// Depth-only attachment used when the scene renders straight to the backbuffer.
pub struct DepthBuffer {
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
    width: u32,
    height: u32,
}

impl DepthBuffer {
    pub fn new(device: &wgpu::Device, width: u32, height: u32) -> Self {
        let (width, height) = (width.max(1), height.max(1));
        let (texture, view) = create_depth(device, "nergal backbuffer", width, height);
        Self {
            _texture: texture,
            view,
            width,
            height,
        }
    }

    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        if (self.width, self.height) != (width.max(1), height.max(1)) {
            *self = Self::new(device, width, height);
        }
    }

    #[inline]
    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }
}

fn create_color(
    device: &wgpu::Device,
    label: &str,
    width: u32,
    height: u32,
    format: wgpu::TextureFormat,
) -> (wgpu::Texture, wgpu::TextureView) {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    (texture, view)
}

fn create_depth(
    device: &wgpu::Device,
    label: &str,
    width: u32,
    height: u32,
) -> (wgpu::Texture, wgpu::TextureView) {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    (texture, view)
}
