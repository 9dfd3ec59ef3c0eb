// renderer/texture.rs
use bitflags::bitflags;
use wgpu::{AddressMode, FilterMode, TextureDimension};

use crate::renderer::device::TextureId;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TextureFlags: u32 {
        /// Allocate and generate the full mip chain.
        const MIPMAPPED = 1 << 0;
    }
}

impl Default for TextureFlags {
    fn default() -> Self {
        TextureFlags::MIPMAPPED
    }
}

/// Minification filter: a base filter plus an optional filter between mip
/// levels.  `mipmap: None` samples the base level only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MinFilter {
    pub filter: FilterMode,
    pub mipmap: Option<FilterMode>,
}

impl MinFilter {
    pub const NEAREST: Self = Self::new(FilterMode::Nearest, None);
    pub const LINEAR: Self = Self::new(FilterMode::Linear, None);
    pub const NEAREST_MIPMAP_NEAREST: Self =
        Self::new(FilterMode::Nearest, Some(FilterMode::Nearest));
    pub const NEAREST_MIPMAP_LINEAR: Self =
        Self::new(FilterMode::Nearest, Some(FilterMode::Linear));
    pub const LINEAR_MIPMAP_NEAREST: Self =
        Self::new(FilterMode::Linear, Some(FilterMode::Nearest));
    pub const LINEAR_MIPMAP_LINEAR: Self = Self::new(FilterMode::Linear, Some(FilterMode::Linear));

    pub const fn new(filter: FilterMode, mipmap: Option<FilterMode>) -> Self {
        Self { filter, mipmap }
    }

    pub fn uses_mipmaps(&self) -> bool {
        self.mipmap.is_some()
    }

    /// The equivalent filter for a texture without mip levels.
    pub fn without_mipmaps(self) -> Self {
        Self {
            mipmap: None,
            ..self
        }
    }
}

/// Sampling state last sent to the device for one texture object.
///
/// This is object state, not texture-unit state: it follows the texture to
/// whichever unit it is bound on.  `None` means the device value is unknown
/// and must be sent before it can be relied upon.  Only the texture-layer
/// binding code writes to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SamplerCache {
    pub min_filter: Option<MinFilter>,
    pub mag_filter: Option<FilterMode>,
    pub address_mode: Option<AddressMode>,
}

impl SamplerCache {
    /// State of a freshly created texture object.
    pub const DEVICE_DEFAULT: Self = Self {
        min_filter: Some(MinFilter::NEAREST_MIPMAP_LINEAR),
        mag_filter: Some(FilterMode::Linear),
        address_mode: Some(AddressMode::Repeat),
    };

    pub const UNKNOWN: Self = Self {
        min_filter: None,
        mag_filter: None,
        address_mode: None,
    };
}

#[derive(Debug)]
pub struct Texture {
    id: TextureId,
    name: String,
    dimension: TextureDimension,
    width: u32,
    height: u32,
    depth: u32,
    mip_levels: u32,
    flags: TextureFlags,
    pub(crate) sampler: SamplerCache,
}

impl Texture {
    pub(crate) fn new(
        id: TextureId,
        name: &str,
        dimension: TextureDimension,
        (width, height, depth): (u32, u32, u32),
        flags: TextureFlags,
    ) -> Self {
        let mip_levels = Self::mip_levels_for(flags, (width, height, depth));

        Self {
            id,
            name: name.to_owned(),
            dimension,
            width,
            height,
            depth,
            mip_levels,
            flags,
            sampler: SamplerCache::DEVICE_DEFAULT,
        }
    }

    /// Mip levels a texture of this size and these flags is created with.
    pub(crate) fn mip_levels_for(flags: TextureFlags, (width, height, depth): (u32, u32, u32)) -> u32 {
        if flags.contains(TextureFlags::MIPMAPPED) {
            Self::calculate_mip_levels(width, height.max(depth))
        } else {
            1
        }
    }

    /// Calculate the number of mip levels for a given texture size
    pub(crate) fn calculate_mip_levels(width: u32, height: u32) -> u32 {
        let max_dimension = width.max(height).max(1);
        u32::BITS - max_dimension.leading_zeros()
    }

    pub fn id(&self) -> TextureId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dimension(&self) -> TextureDimension {
        self.dimension
    }

    pub fn size(&self) -> (u32, u32, u32) {
        (self.width, self.height, self.depth)
    }

    pub fn mip_levels(&self) -> u32 {
        self.mip_levels
    }

    pub fn flags(&self) -> TextureFlags {
        self.flags
    }

    pub fn is_mipmapped(&self) -> bool {
        self.mip_levels > 1
    }

    pub fn sampler_cache(&self) -> &SamplerCache {
        &self.sampler
    }

    /// The min filter the device will actually be given for `requested`.
    pub fn effective_min_filter(&self, requested: MinFilter) -> MinFilter {
        if self.is_mipmapped() {
            requested
        } else {
            requested.without_mipmaps()
        }
    }
}

/// Texels for a `size`×`size` RGBA8 checkerboard with 1-texel squares.
pub(crate) fn checker_texels(size: u32, base: [u8; 4], checker: [u8; 4]) -> Vec<u8> {
    let mut texels: Vec<[u8; 4]> = Vec::with_capacity((size * size) as usize);
    for y in 0..size {
        for x in 0..size {
            texels.push(if (x + y) % 2 == 0 { base } else { checker });
        }
    }
    bytemuck::cast_slice(&texels).to_vec()
}
