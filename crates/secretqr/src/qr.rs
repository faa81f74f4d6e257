//! QR rendering for share URLs.
//!
//! A [`QrImage`] is encoded once and can then be shown three ways: as SVG in
//! the web Composer, as unicode blocks in a terminal, and as a padded PNG for
//! download. All of it is local; nothing here touches the network.

use std::io::Cursor;
use std::path::Path;

use image::{ImageFormat, Rgb, RgbImage};
use qrcode::render::{svg, unicode};
use qrcode::{Color, QrCode};
use tracing::debug;

use crate::error::{Error, Result};

const DARK: Rgb<u8> = Rgb([0, 0, 0]);
const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

/// A QR code for one piece of text (normally a share URL).
#[derive(Clone)]
pub struct QrImage {
    code: QrCode,
    data: String,
}

impl std::fmt::Debug for QrImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QrImage")
            .field("data", &self.data)
            .field("width", &self.code.width())
            .finish()
    }
}

impl QrImage {
    /// Encode `data` as a QR code.
    ///
    /// # Errors
    ///
    /// Returns an error if the data does not fit in any QR version.
    pub fn encode(data: &str) -> Result<Self> {
        let code = QrCode::new(data.as_bytes())?;
        debug!(width = code.width(), len = data.len(), "Encoded QR code");
        Ok(Self {
            code,
            data: data.to_string(),
        })
    }

    /// The encoded text.
    #[must_use]
    pub fn data(&self) -> &str {
        &self.data
    }

    /// Number of modules along one edge.
    #[must_use]
    pub fn modules(&self) -> usize {
        self.code.width()
    }

    /// Render as an SVG document at least `size` pixels wide, without margin.
    #[must_use]
    pub fn to_svg(&self, size: u32) -> String {
        self.code
            .render::<svg::Color<'_>>()
            .quiet_zone(false)
            .min_dimensions(size, size)
            .dark_color(svg::Color("#000000"))
            .light_color(svg::Color("#ffffff"))
            .build()
    }

    /// Render with unicode half blocks for a terminal.
    ///
    /// Colours are inverted so the code reads correctly on dark backgrounds,
    /// and the quiet zone is kept so scanners can find the edges.
    #[must_use]
    pub fn to_terminal(&self) -> String {
        self.code
            .render::<unicode::Dense1x2>()
            .dark_color(unicode::Dense1x2::Light)
            .light_color(unicode::Dense1x2::Dark)
            .build()
    }

    /// Rasterize the bare code, `module_px` pixels per module, no margin.
    ///
    /// # Errors
    ///
    /// Returns an error if `module_px` is zero or the image would be too large.
    pub fn to_raster(&self, module_px: u32) -> Result<RgbImage> {
        if module_px == 0 {
            return Err(Error::internal("module_px must be greater than 0"));
        }
        let modules = u32::try_from(self.code.width())
            .map_err(|_| Error::internal("QR code too wide"))?;
        let edge = modules
            .checked_mul(module_px)
            .ok_or_else(|| Error::internal("QR raster too large"))?;

        let colors = self.code.to_colors();
        let width = self.code.width();
        Ok(RgbImage::from_fn(edge, edge, |x, y| {
            let column = (x / module_px) as usize;
            let row = (y / module_px) as usize;
            match colors[row * width + column] {
                Color::Dark => DARK,
                Color::Light => WHITE,
            }
        }))
    }

    /// Rasterize and center the code on a white canvas with `padding_px` on
    /// every side.
    ///
    /// # Errors
    ///
    /// Returns an error if the raster cannot be produced.
    pub fn export(&self, module_px: u32, padding_px: u32) -> Result<RgbImage> {
        let raw = self.to_raster(module_px)?;
        let margin = padding_px
            .checked_mul(2)
            .ok_or_else(|| Error::internal("padding too large"))?;
        let width = raw
            .width()
            .checked_add(margin)
            .ok_or_else(|| Error::internal("exported image too large"))?;
        let height = raw
            .height()
            .checked_add(margin)
            .ok_or_else(|| Error::internal("exported image too large"))?;

        let mut canvas = RgbImage::from_pixel(width, height, WHITE);
        image::imageops::replace(
            &mut canvas,
            &raw,
            i64::from(padding_px),
            i64::from(padding_px),
        );
        Ok(canvas)
    }

    /// Export as PNG bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if rasterization or PNG encoding fails.
    pub fn png_bytes(&self, module_px: u32, padding_px: u32) -> Result<Vec<u8>> {
        let canvas = self.export(module_px, padding_px)?;
        let mut bytes = Vec::new();
        canvas.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
        Ok(bytes)
    }

    /// Export as a PNG file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if rasterization, encoding, or writing fails.
    pub fn write_png(&self, path: impl AsRef<Path>, module_px: u32, padding_px: u32) -> Result<()> {
        let path = path.as_ref();
        let canvas = self.export(module_px, padding_px)?;
        canvas.save_with_format(path, ImageFormat::Png)?;
        debug!(path = %path.display(), "Wrote QR image");
        Ok(())
    }
}
