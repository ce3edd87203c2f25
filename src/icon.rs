use std::{fs::File, path::Path};

use png::{BitDepth, ColorType};

use crate::errors::{Error, Result};

/// Decoded bitmap stored as premultiplied `0xAARRGGBB` pixels, the layout
/// raqote draws from.
#[derive(Debug, Clone, PartialEq)]
pub struct Icon {
    pub width: i32,
    pub height: i32,
    pub data: Vec<u32>,
}

fn premultiplied_argb(r: u32, g: u32, b: u32, a: u32) -> u32 {
    let r = r * a / 255;
    let g = g * a / 255;
    let b = b * a / 255;
    b + (g << 8) + (r << 16) + (a << 24)
}

impl Icon {
    pub fn load(path: &Path) -> Result<Icon> {
        let decoder = png::Decoder::new(File::open(path)?);

        let mut reader = decoder.read_info()?;

        let mut buf = vec![0; reader.output_buffer_size()];

        let info = reader.next_frame(&mut buf)?;

        if info.bit_depth != BitDepth::Eight {
            return Err(Error::resource_load(format!(
                "{}: unsupported bit depth {:?}",
                path.display(),
                info.bit_depth
            )))
        }

        let data = match info.color_type {
            ColorType::Rgba => buf[..info.buffer_size()]
                .chunks_exact(4)
                .map(|px| premultiplied_argb(px[0].into(), px[1].into(), px[2].into(), px[3].into()))
                .collect(),
            ColorType::Rgb => buf[..info.buffer_size()]
                .chunks_exact(3)
                .map(|px| premultiplied_argb(px[0].into(), px[1].into(), px[2].into(), 255))
                .collect(),
            ColorType::GrayscaleAlpha => buf[..info.buffer_size()]
                .chunks_exact(2)
                .map(|px| premultiplied_argb(px[0].into(), px[0].into(), px[0].into(), px[1].into()))
                .collect(),
            other => {
                return Err(Error::resource_load(format!(
                    "{}: unsupported color type {:?}",
                    path.display(),
                    other
                )))
            },
        };

        Ok(Icon {
            width: info.width.try_into()?,
            height: info.height.try_into()?,
            data,
        })
    }
}
