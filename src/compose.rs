use std::path::Path;

use image::{DynamicImage, GenericImageView as _, Rgba, RgbaImage, imageops};

use crate::error::{GiflapseError, GiflapseResult};

/// Straight (non-premultiplied) RGBA8 view of the just-composited canvas.
/// `data.len() == width * height * 4`, row-major.
#[derive(Clone, Copy, Debug)]
pub struct ComposedFrame<'a> {
    pub width: u32,
    pub height: u32,
    pub data: &'a [u8],
}

/// Decode one source image from disk.
pub fn load_image(path: &Path) -> GiflapseResult<DynamicImage> {
    image::open(path)
        .map_err(|e| GiflapseError::decode(format!("decode image '{}': {e}", path.display())))
}

/// Read a file's intrinsic dimensions without decoding the pixel data.
pub fn probe_dimensions(path: &Path) -> GiflapseResult<(u32, u32)> {
    image::image_dimensions(path).map_err(|e| {
        GiflapseError::decode(format!("probe dimensions of '{}': {e}", path.display()))
    })
}

/// Fixed-size canvas every frame is drawn onto. The pixel buffer is reused
/// across frames; each [`Compositor::compose`] overwrites it completely.
pub struct Compositor {
    width: u32,
    height: u32,
    background: Option<[u8; 4]>,
    canvas: RgbaImage,
}

impl Compositor {
    pub fn new(width: u32, height: u32, background: Option<[u8; 4]>) -> GiflapseResult<Self> {
        if width == 0 || height == 0 {
            return Err(GiflapseError::validation(
                "canvas width/height must be non-zero",
            ));
        }
        Ok(Self {
            width,
            height,
            background,
            canvas: RgbaImage::new(width, height),
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Fill the canvas with the background (or clear it to transparent), then
    /// draw `image` at the origin stretched to the canvas dimensions.
    pub fn compose(&mut self, image: &DynamicImage) -> ComposedFrame<'_> {
        let fill = Rgba(self.background.unwrap_or([0, 0, 0, 0]));
        for px in self.canvas.pixels_mut() {
            *px = fill;
        }

        if image.dimensions() == (self.width, self.height) {
            imageops::overlay(&mut self.canvas, image, 0, 0);
        } else {
            let stretched =
                image.resize_exact(self.width, self.height, imageops::FilterType::Triangle);
            imageops::overlay(&mut self.canvas, &stretched, 0, 0);
        }

        ComposedFrame {
            width: self.width,
            height: self.height,
            data: self.canvas.as_raw(),
        }
    }
}
