//! DirectDraw Surface textures
//!
//! The container is parsed with `ddsfile`. Only the top mip level of the first
//! array layer is decoded. Supported layouts are 32-bit RGBA/BGRA and the
//! BC1-BC3 (DXT1/DXT3/DXT5) block formats that cover nearly every DDS asset.

use ddsfile::{D3DFormat, Dds, DxgiFormat};
use image::RgbaImage;
use std::io::Cursor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Layout {
    Rgba8,
    Bgra8,
    Bgrx8,
    Bc1,
    Bc2,
    Bc3,
}

impl Layout {
    fn of(dds: &Dds) -> Option<Self> {
        if let Some(format) = dds.get_d3d_format() {
            return match format {
                D3DFormat::A8B8G8R8 => Some(Layout::Rgba8),
                D3DFormat::A8R8G8B8 => Some(Layout::Bgra8),
                D3DFormat::X8R8G8B8 => Some(Layout::Bgrx8),
                D3DFormat::DXT1 => Some(Layout::Bc1),
                D3DFormat::DXT2 | D3DFormat::DXT3 => Some(Layout::Bc2),
                D3DFormat::DXT4 | D3DFormat::DXT5 => Some(Layout::Bc3),
                _ => None,
            };
        }

        match dds.get_dxgi_format()? {
            DxgiFormat::R8G8B8A8_UNorm | DxgiFormat::R8G8B8A8_UNorm_sRGB => Some(Layout::Rgba8),
            DxgiFormat::B8G8R8A8_UNorm | DxgiFormat::B8G8R8A8_UNorm_sRGB => Some(Layout::Bgra8),
            DxgiFormat::B8G8R8X8_UNorm | DxgiFormat::B8G8R8X8_UNorm_sRGB => Some(Layout::Bgrx8),
            DxgiFormat::BC1_UNorm | DxgiFormat::BC1_UNorm_sRGB => Some(Layout::Bc1),
            DxgiFormat::BC2_UNorm | DxgiFormat::BC2_UNorm_sRGB => Some(Layout::Bc2),
            DxgiFormat::BC3_UNorm | DxgiFormat::BC3_UNorm_sRGB => Some(Layout::Bc3),
            _ => None,
        }
    }

    fn block_bytes(self) -> Option<usize> {
        match self {
            Layout::Bc1 => Some(8),
            Layout::Bc2 | Layout::Bc3 => Some(16),
            _ => None,
        }
    }
}

/// Decode the top-level surface of a DDS file to RGBA8
pub(crate) fn decode(bytes: &[u8]) -> Result<RgbaImage, String> {
    let dds = Dds::read(Cursor::new(bytes)).map_err(|e| format!("DDS: {}", e))?;
    let (width, height) = (dds.get_width(), dds.get_height());
    if width == 0 || height == 0 {
        return Err("DDS: zero-sized surface".to_string());
    }

    let layout = Layout::of(&dds).ok_or_else(|| {
        format!(
            "DDS: unsupported pixel format (d3d {:?}, dxgi {:?})",
            dds.get_d3d_format(),
            dds.get_dxgi_format()
        )
    })?;

    let pixels = match layout.block_bytes() {
        Some(block) => decode_blocks(&dds.data, width, height, block, layout)?,
        None => decode_linear(&dds.data, width, height, layout)?,
    };

    RgbaImage::from_raw(width, height, pixels)
        .ok_or_else(|| "DDS: pixel buffer does not match dimensions".to_string())
}

fn decode_linear(data: &[u8], width: u32, height: u32, layout: Layout) -> Result<Vec<u8>, String> {
    let len = width as usize * height as usize * 4;
    let surface = data.get(..len).ok_or("DDS: file is cut short")?;

    let mut pixels = Vec::with_capacity(len);
    for texel in surface.chunks_exact(4) {
        let rgba = match layout {
            Layout::Rgba8 => [texel[0], texel[1], texel[2], texel[3]],
            Layout::Bgra8 => [texel[2], texel[1], texel[0], texel[3]],
            _ => [texel[2], texel[1], texel[0], 255],
        };
        pixels.extend_from_slice(&rgba);
    }
    Ok(pixels)
}

fn decode_blocks(
    data: &[u8],
    width: u32,
    height: u32,
    block_bytes: usize,
    layout: Layout,
) -> Result<Vec<u8>, String> {
    let (width, height) = (width as usize, height as usize);
    let blocks_x = width.div_ceil(4);
    let blocks_y = height.div_ceil(4);
    let surface = data
        .get(..blocks_x * blocks_y * block_bytes)
        .ok_or("DDS: file is cut short")?;

    let mut pixels = vec![0u8; width * height * 4];
    for (index, block) in surface.chunks_exact(block_bytes).enumerate() {
        let texels = match layout {
            Layout::Bc1 => bc1_block(block),
            Layout::Bc2 => bc2_block(block),
            _ => bc3_block(block),
        };

        let (bx, by) = (index % blocks_x * 4, index / blocks_x * 4);
        for (i, texel) in texels.iter().enumerate() {
            let (x, y) = (bx + i % 4, by + i / 4);
            if x < width && y < height {
                let at = (y * width + x) * 4;
                pixels[at..at + 4].copy_from_slice(texel);
            }
        }
    }
    Ok(pixels)
}

fn rgb565(c: u16) -> [u8; 3] {
    let r = ((c >> 11) & 0x1f) as u8;
    let g = ((c >> 5) & 0x3f) as u8;
    let b = (c & 0x1f) as u8;
    [(r << 3) | (r >> 2), (g << 2) | (g >> 4), (b << 3) | (b >> 2)]
}

fn mix(a: [u8; 3], b: [u8; 3], wa: u16, wb: u16) -> [u8; 4] {
    let total = wa + wb;
    let channel = |i: usize| ((a[i] as u16 * wa + b[i] as u16 * wb) / total) as u8;
    [channel(0), channel(1), channel(2), 255]
}

/// Color part of a BC1-BC3 block. `opaque` forces the four-color mode.
fn color_block(block: &[u8], opaque: bool) -> [[u8; 4]; 16] {
    let c0 = u16::from_le_bytes([block[0], block[1]]);
    let c1 = u16::from_le_bytes([block[2], block[3]]);
    let (e0, e1) = (rgb565(c0), rgb565(c1));

    let palette = if opaque || c0 > c1 {
        [
            [e0[0], e0[1], e0[2], 255],
            [e1[0], e1[1], e1[2], 255],
            mix(e0, e1, 2, 1),
            mix(e0, e1, 1, 2),
        ]
    } else {
        [
            [e0[0], e0[1], e0[2], 255],
            [e1[0], e1[1], e1[2], 255],
            mix(e0, e1, 1, 1),
            [0, 0, 0, 0],
        ]
    };

    let indices = u32::from_le_bytes([block[4], block[5], block[6], block[7]]);
    let mut texels = [[0u8; 4]; 16];
    for (i, texel) in texels.iter_mut().enumerate() {
        *texel = palette[((indices >> (2 * i)) & 0b11) as usize];
    }
    texels
}

fn bc1_block(block: &[u8]) -> [[u8; 4]; 16] {
    color_block(block, false)
}

fn bc2_block(block: &[u8]) -> [[u8; 4]; 16] {
    let mut texels = color_block(&block[8..], true);
    let alpha = u64::from_le_bytes([
        block[0], block[1], block[2], block[3], block[4], block[5], block[6], block[7],
    ]);
    for (i, texel) in texels.iter_mut().enumerate() {
        let a = ((alpha >> (4 * i)) & 0xf) as u8;
        texel[3] = a * 17;
    }
    texels
}

fn bc3_block(block: &[u8]) -> [[u8; 4]; 16] {
    let mut texels = color_block(&block[8..], true);
    let (a0, a1) = (block[0] as u16, block[1] as u16);

    let mut levels = [0u8; 8];
    levels[0] = a0 as u8;
    levels[1] = a1 as u8;
    if a0 > a1 {
        for i in 1..7u16 {
            levels[i as usize + 1] = (((7 - i) * a0 + i * a1) / 7) as u8;
        }
    } else {
        for i in 1..5u16 {
            levels[i as usize + 1] = (((5 - i) * a0 + i * a1) / 5) as u8;
        }
        levels[6] = 0;
        levels[7] = 255;
    }

    let mut bits = 0u64;
    for (i, byte) in block[2..8].iter().enumerate() {
        bits |= (*byte as u64) << (8 * i);
    }
    for (i, texel) in texels.iter_mut().enumerate() {
        texel[3] = levels[((bits >> (3 * i)) & 0b111) as usize];
    }
    texels
}

#[cfg(test)]
pub(crate) mod fixtures {
    use ddsfile::{D3DFormat, Dds, NewD3dParams};

    fn surface(width: u32, height: u32, format: D3DFormat, data: &[u8]) -> Vec<u8> {
        let mut dds = Dds::new_d3d(NewD3dParams {
            height,
            width,
            depth: None,
            format,
            mipmap_levels: None,
            caps2: None,
        })
        .unwrap();
        dds.data[..data.len()].copy_from_slice(data);

        let mut out = Vec::new();
        dds.write(&mut out).unwrap();
        out
    }

    /// Uncompressed A8R8G8B8 surface filled with one RGBA color
    pub fn argb_bytes(width: u32, height: u32, rgba: [u8; 4]) -> Vec<u8> {
        let texel = [rgba[2], rgba[1], rgba[0], rgba[3]];
        let data: Vec<u8> = texel.repeat((width * height) as usize);
        surface(width, height, D3DFormat::A8R8G8B8, &data)
    }

    /// DXT1 surface of solid pure red
    pub fn dxt1_red_bytes(width: u32, height: u32) -> Vec<u8> {
        let block = [0x00, 0xf8, 0x00, 0x00, 0, 0, 0, 0];
        let blocks = (width.div_ceil(4) * height.div_ceil(4)) as usize;
        surface(width, height, D3DFormat::DXT1, &block.repeat(blocks))
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn test_uncompressed_argb() {
        let image = decode(&argb_bytes(3, 2, [10, 20, 30, 40])).unwrap();
        assert_eq!(image.dimensions(), (3, 2));
        assert_eq!(image.get_pixel(2, 1).0, [10, 20, 30, 40]);
    }

    #[test]
    fn test_dxt1_solid_block() {
        let image = decode(&dxt1_red_bytes(4, 4)).unwrap();
        assert_eq!(image.dimensions(), (4, 4));
        assert!(image.pixels().all(|p| p.0 == [255, 0, 0, 255]));
    }

    #[test]
    fn test_dxt1_partial_blocks_are_cropped() {
        let image = decode(&dxt1_red_bytes(6, 5)).unwrap();
        assert_eq!(image.dimensions(), (6, 5));
        assert_eq!(image.get_pixel(5, 4).0, [255, 0, 0, 255]);
    }

    #[test]
    fn test_bc1_transparent_mode() {
        // c0 <= c1 selects the three-color mode; index 3 is transparent black
        let block = [0x00, 0x00, 0x1f, 0x00, 0xff, 0xff, 0xff, 0xff];
        let texels = bc1_block(&block);
        assert!(texels.iter().all(|t| *t == [0, 0, 0, 0]));
    }

    #[test]
    fn test_bc3_alpha_endpoints() {
        let mut block = [0u8; 16];
        block[0] = 255;
        block[1] = 0;
        // first texel index 1 (alpha1), rest index 0 (alpha0)
        block[2] = 0b001;
        let texels = bc3_block(&block);
        assert_eq!(texels[0][3], 0);
        assert_eq!(texels[1][3], 255);
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(decode(b"not a dds file").is_err());
        let mut truncated = dxt1_red_bytes(8, 8);
        truncated.truncate(truncated.len() - 8);
        assert!(decode(&truncated).is_err());
    }
}
