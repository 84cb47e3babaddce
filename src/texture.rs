// 2D textures and sampler objects

use std::path::Path;

use bytemuck::{Pod, Zeroable};

use crate::backend::{BindTarget, ResourceKind};
use crate::context::{BindGuard, Context};
use crate::error::{GlazyError, Result};
use crate::handle::{GlHandle, Shared};

/// Pixel layout of an upload. Storage is always 8 bits per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TexelFormat {
    Rgb8,
    Rgba8,
}

impl TexelFormat {
    pub const fn internal_format(self) -> u32 {
        match self {
            TexelFormat::Rgb8 => glow::RGB8,
            TexelFormat::Rgba8 => glow::RGBA8,
        }
    }

    pub const fn gl_format(self) -> u32 {
        match self {
            TexelFormat::Rgb8 => glow::RGB,
            TexelFormat::Rgba8 => glow::RGBA,
        }
    }

    pub const fn bytes_per_texel(self) -> usize {
        match self {
            TexelFormat::Rgb8 => 3,
            TexelFormat::Rgba8 => 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureParameter {
    MinFilter,
    MagFilter,
    WrapS,
    WrapT,
}

impl TextureParameter {
    pub const fn gl_enum(self) -> u32 {
        match self {
            TextureParameter::MinFilter => glow::TEXTURE_MIN_FILTER,
            TextureParameter::MagFilter => glow::TEXTURE_MAG_FILTER,
            TextureParameter::WrapS => glow::TEXTURE_WRAP_S,
            TextureParameter::WrapT => glow::TEXTURE_WRAP_T,
        }
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Pod, Zeroable)]
pub struct Rgb8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Pod, Zeroable)]
pub struct Rgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgb8 {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl Rgba8 {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

/// A pixel type that can be uploaded as texture data.
pub trait Texel: Pod {
    const FORMAT: TexelFormat;
}

impl Texel for Rgb8 {
    const FORMAT: TexelFormat = TexelFormat::Rgb8;
}

impl Texel for Rgba8 {
    const FORMAT: TexelFormat = TexelFormat::Rgba8;
}

impl Texel for [u8; 3] {
    const FORMAT: TexelFormat = TexelFormat::Rgb8;
}

impl Texel for [u8; 4] {
    const FORMAT: TexelFormat = TexelFormat::Rgba8;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Filter {
    Nearest,
    Linear,
}

impl Filter {
    pub const fn gl_enum(self) -> u32 {
        match self {
            Filter::Nearest => glow::NEAREST,
            Filter::Linear => glow::LINEAR,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Wrap {
    Repeat,
    ClampToEdge,
    MirroredRepeat,
}

impl Wrap {
    pub const fn gl_enum(self) -> u32 {
        match self {
            Wrap::Repeat => glow::REPEAT,
            Wrap::ClampToEdge => glow::CLAMP_TO_EDGE,
            Wrap::MirroredRepeat => glow::MIRRORED_REPEAT,
        }
    }
}

#[derive(Debug)]
pub struct Texture {
    handle: GlHandle,
    width: u32,
    height: u32,
}

pub type SharedTexture = Shared<Texture>;

impl Texture {
    /// Upload `pixels`, row-major from the first row in memory, as a
    /// `width` x `height` texture.
    ///
    /// With `mipmap` the chain is generated and filtered trilinearly;
    /// without it the texture samples nearest, which suits pixel art.
    pub fn new<P: Texel>(
        ctx: &Context,
        pixels: &[P],
        width: u32,
        height: u32,
        mipmap: bool,
    ) -> Result<Self> {
        GlazyError::gl_int("texture width", u64::from(width))?;
        GlazyError::gl_int("texture height", u64::from(height))?;
        let expected = width as usize * height as usize;
        if width == 0 || height == 0 || pixels.len() != expected {
            return Err(GlazyError::InvalidTextureSize {
                width,
                height,
                expected,
                actual: pixels.len(),
            });
        }

        let handle = GlHandle::new(ctx, ResourceKind::Texture)?;
        ctx.checked("Texture::new", || {
            let _bound = ctx.bind(BindTarget::Texture2D { unit: 0 }, handle.id());
            let gl = ctx.gl();
            gl.tex_image_2d(width, height, P::FORMAT, bytemuck::cast_slice(pixels));
            if mipmap {
                gl.generate_mipmap();
                gl.tex_parameter(TextureParameter::MinFilter, glow::LINEAR_MIPMAP_LINEAR);
                gl.tex_parameter(TextureParameter::MagFilter, glow::LINEAR);
            } else {
                gl.tex_parameter(TextureParameter::MinFilter, glow::NEAREST);
                gl.tex_parameter(TextureParameter::MagFilter, glow::NEAREST);
            }
            Ok(())
        })?;

        log::debug!(
            "Created texture {} ({}x{}, {:?}, mipmap: {})",
            handle.id(),
            width,
            height,
            P::FORMAT,
            mipmap
        );
        Ok(Self {
            handle,
            width,
            height,
        })
    }

    /// Decode an image file and upload it as RGBA.
    pub fn from_image(ctx: &Context, path: impl AsRef<Path>, mipmap: bool) -> Result<Self> {
        let path = path.as_ref();
        let image = image::open(path)
            .map_err(|source| match source {
                image::ImageError::IoError(source) => GlazyError::Io {
                    path: path.to_path_buf(),
                    source,
                },
                source => GlazyError::Image {
                    path: path.to_path_buf(),
                    source,
                },
            })?
            .to_rgba8();
        let (width, height) = image.dimensions();
        let texels: &[Rgba8] = bytemuck::cast_slice(image.as_raw());
        Self::new(ctx, texels, width, height, mipmap)
    }

    pub fn id(&self) -> u32 {
        self.handle.id()
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Bind to texture unit `unit` for the guard's lifetime.
    pub fn bind(&self, unit: u32) -> BindGuard<'_> {
        self.handle
            .context()
            .bind(BindTarget::Texture2D { unit }, self.id())
    }

    pub fn release(&mut self) {
        self.handle.release();
    }
}

/// Sampling state that overrides a texture's own parameters on a unit.
#[derive(Debug)]
pub struct Sampler {
    handle: GlHandle,
}

impl Sampler {
    pub fn new(ctx: &Context) -> Result<Self> {
        Ok(Self {
            handle: GlHandle::new(ctx, ResourceKind::Sampler)?,
        })
    }

    pub fn id(&self) -> u32 {
        self.handle.id()
    }

    pub fn set_filter(&self, min: Filter, mag: Filter) -> &Self {
        let gl = self.handle.context().gl();
        gl.sampler_parameter(self.id(), TextureParameter::MinFilter, min.gl_enum());
        gl.sampler_parameter(self.id(), TextureParameter::MagFilter, mag.gl_enum());
        self
    }

    pub fn set_wrap(&self, s: Wrap, t: Wrap) -> &Self {
        let gl = self.handle.context().gl();
        gl.sampler_parameter(self.id(), TextureParameter::WrapS, s.gl_enum());
        gl.sampler_parameter(self.id(), TextureParameter::WrapT, t.gl_enum());
        self
    }

    pub fn bind_to_unit(&self, unit: u32) {
        self.handle.context().gl().bind_sampler(unit, self.id());
    }

    pub fn unbind(ctx: &Context, unit: u32) {
        ctx.gl().bind_sampler(unit, 0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::recording::Call;
    use crate::backend::RecordingBackend;

    fn setup() -> (RecordingBackend, Context) {
        let gl = RecordingBackend::new();
        let ctx = Context::new(gl.clone());
        (gl, ctx)
    }

    #[test]
    fn nearest_filtering_without_mipmaps() {
        let (gl, ctx) = setup();
        let pixels = vec![Rgb8::new(255, 0, 0); 4];
        let texture = Texture::new(&ctx, &pixels, 2, 2, false).unwrap();
        let calls = gl.calls();
        assert!(calls.contains(&Call::TexImage2D {
            texture: texture.id(),
            width: 2,
            height: 2,
            format: TexelFormat::Rgb8,
        }));
        assert!(calls.contains(&Call::TexParameter {
            texture: texture.id(),
            parameter: TextureParameter::MinFilter,
            value: glow::NEAREST,
        }));
        assert!(!calls.iter().any(|c| matches!(c, Call::GenerateMipmap { .. })));
        assert_eq!(gl.bound(BindTarget::Texture2D { unit: 0 }), 0);
    }

    #[test]
    fn mipmapped_textures_filter_trilinearly() {
        let (gl, ctx) = setup();
        let pixels = vec![Rgba8::new(1, 2, 3, 4); 8];
        let texture = Texture::new(&ctx, &pixels, 4, 2, true).unwrap();
        assert_eq!((texture.width(), texture.height()), (4, 2));
        let calls = gl.calls();
        assert!(calls.contains(&Call::GenerateMipmap {
            texture: texture.id()
        }));
        assert!(calls.contains(&Call::TexParameter {
            texture: texture.id(),
            parameter: TextureParameter::MinFilter,
            value: glow::LINEAR_MIPMAP_LINEAR,
        }));
    }

    #[test]
    fn pixel_count_must_match_dimensions() {
        let (gl, ctx) = setup();
        let err = Texture::new(&ctx, &[[0u8; 4]; 3], 2, 2, false).unwrap_err();
        assert!(matches!(
            err,
            GlazyError::InvalidTextureSize {
                expected: 4,
                actual: 3,
                ..
            }
        ));
        assert!(gl.live(ResourceKind::Texture).is_empty());

        let err = Texture::new::<[u8; 4]>(&ctx, &[], u32::MAX, 1, false).unwrap_err();
        assert!(matches!(err, GlazyError::OutOfRange { what: "texture width", .. }));
    }

    #[test]
    fn binding_to_a_unit_selects_it_first() {
        let (gl, ctx) = setup();
        let texture = Texture::new(&ctx, &[[9u8; 3]], 1, 1, false).unwrap();
        gl.clear_calls();
        {
            let _bound = texture.bind(2);
            assert_eq!(gl.bound(BindTarget::Texture2D { unit: 2 }), texture.id());
        }
        assert_eq!(
            gl.calls()[..2],
            [
                Call::ActiveTexture { unit: 2 },
                Call::Bind {
                    target: BindTarget::Texture2D { unit: 2 },
                    id: texture.id()
                },
            ]
        );
    }

    #[test]
    fn sampler_parameters_and_binding() {
        let (gl, ctx) = setup();
        let sampler = Sampler::new(&ctx).unwrap();
        sampler
            .set_filter(Filter::Linear, Filter::Nearest)
            .set_wrap(Wrap::ClampToEdge, Wrap::Repeat)
            .bind_to_unit(1);
        Sampler::unbind(&ctx, 1);
        let calls = gl.calls();
        assert!(calls.contains(&Call::SamplerParameter {
            sampler: sampler.id(),
            parameter: TextureParameter::WrapS,
            value: glow::CLAMP_TO_EDGE,
        }));
        assert!(calls.ends_with(&[
            Call::BindSampler {
                unit: 1,
                sampler: sampler.id()
            },
            Call::BindSampler { unit: 1, sampler: 0 },
        ]));
    }

    #[test]
    fn missing_image_is_an_io_error() {
        let (_gl, ctx) = setup();
        let err = Texture::from_image(&ctx, "no/such/texture.png", false).unwrap_err();
        assert!(matches!(err, GlazyError::Io { .. }));
    }
}
