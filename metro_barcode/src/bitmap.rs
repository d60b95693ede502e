use std::convert::TryInto;
use std::fmt;
use std::num::TryFromIntError;
use std::str::FromStr;


#[derive(Debug)]
pub enum BitmapError {
    IncorrectPixelCount { expected: usize, obtained: usize },
    DimensionConversion { dimension: &'static str, value: usize, target_type: &'static str, error: TryFromIntError },
    PngEncoding(png::EncodingError),
}
impl fmt::Display for BitmapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IncorrectPixelCount { expected, obtained }
                => write!(f, "incorrect pixel count; expected {}, obtained {}", expected, obtained),
            Self::DimensionConversion { dimension, value, target_type, error }
                => write!(f, "failed to convert {} ({}) to {}: {}", dimension, value, target_type, error),
            Self::PngEncoding(e)
                => write!(f, "PNG encoding failed: {}", e),
        }
    }
}
impl std::error::Error for BitmapError {
}


#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct ColorParseError(pub String);
impl fmt::Display for ColorParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid color {:?}; expected #RGB or #RRGGBB", self.0)
    }
}
impl std::error::Error for ColorParseError {
}


/// An opaque 8-bit-per-channel color.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Rgb(pub u8, pub u8, pub u8);
impl Rgb {
    pub const BLACK: Rgb = Rgb(0x00, 0x00, 0x00);
    pub const WHITE: Rgb = Rgb(0xFF, 0xFF, 0xFF);
}
impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }
}
impl FromStr for Rgb {
    type Err = ColorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ColorParseError(s.to_owned());
        let hex_color = s.strip_prefix('#').unwrap_or(s);
        if !hex_color.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(err());
        }

        if hex_color.len() == 6 {
            let r = u8::from_str_radix(&hex_color[0..2], 16).map_err(|_| err())?;
            let g = u8::from_str_radix(&hex_color[2..4], 16).map_err(|_| err())?;
            let b = u8::from_str_radix(&hex_color[4..6], 16).map_err(|_| err())?;
            Ok(Rgb(r, g, b))
        } else if hex_color.len() == 3 {
            // xyz -> xxyyzz
            let mut doubled = String::with_capacity(6);
            for c in hex_color.chars() {
                doubled.push(c);
                doubled.push(c);
            }
            doubled.parse().map_err(|_| err())
        } else {
            Err(err())
        }
    }
}


#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct BitmapRenderOptions {
    quiet_top_pixels: usize,
    quiet_left_pixels: usize,
    quiet_right_pixels: usize,
    quiet_bottom_pixels: usize,
    point_width_pixels: usize,
    point_height_pixels: usize,
}
impl BitmapRenderOptions {
    pub fn new() -> Self {
        Self {
            quiet_top_pixels: 16,
            quiet_left_pixels: 16,
            quiet_right_pixels: 16,
            quiet_bottom_pixels: 16,
            point_width_pixels: 4,
            point_height_pixels: 4,
        }
    }

    /// Options for square points of `point_pixels` with a quiet zone of `quiet_points` points on
    /// every side, which is how QR code sizes are usually specified.
    pub fn with_points(point_pixels: usize, quiet_points: usize) -> Self {
        let mut opts = Self::new();
        opts.set_point_dimensions_all(point_pixels);
        opts.set_quiet_all(point_pixels * quiet_points);
        opts
    }

    pub fn set_quiet_all(&mut self, new_quiet_pixels: usize) {
        self.quiet_top_pixels = new_quiet_pixels;
        self.quiet_left_pixels = new_quiet_pixels;
        self.quiet_right_pixels = new_quiet_pixels;
        self.quiet_bottom_pixels = new_quiet_pixels;
    }

    pub fn set_point_dimensions_all(&mut self, new_dim_pixels: usize) {
        self.point_width_pixels = new_dim_pixels;
        self.point_height_pixels = new_dim_pixels;
    }
}
impl Default for BitmapRenderOptions {
    fn default() -> Self { Self::new() }
}


/// A monochrome bitmap; `true` bits are dark (foreground) points.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct BarcodeBitmap {
    width: usize,
    height: usize,
    bits: Vec<bool>,
}
impl BarcodeBitmap {
    pub fn new(
        width: usize,
        height: usize,
        bits: Vec<bool>,
    ) -> Result<Self, BitmapError> {
        if width * height != bits.len() {
            return Err(BitmapError::IncorrectPixelCount { expected: width * height, obtained: bits.len() });
        }
        Ok(Self {
            width,
            height,
            bits,
        })
    }
    pub fn width(&self) -> usize { self.width }
    pub fn height(&self) -> usize { self.height }
    pub fn bits(&self) -> &[bool] { self.bits.as_slice() }

    pub fn is_dark(&self, x: usize, y: usize) -> bool {
        self.bits[y * self.width + x]
    }

    /// Converts the bitmap from bits to bytes. Bits within a byte are ordered depending on the
    /// `most_significant_first` argument: if `true`, they are ordered from most significant to
    /// least significant (as expected e.g. by PNG); if `false`, they are ordered from least to most
    /// significant. If the total number of bits is not divisible by 8, the remaining bits in the
    /// last byte are set to 0. This padding either happens once per row (if `pad_by_row` is `true`,
    /// as expected by PNG) or at the end of the whole image (if it is `false`).
    pub fn to_bytes(&self, most_significant_first: bool, pad_by_row: bool) -> Vec<u8> {
        let mut ret = Vec::with_capacity(self.bits.len() / 8 + self.height + 1);
        let mut cur_byte = 0u8;

        let mut bit_index = 0;
        for (i, b) in self.bits.iter().enumerate() {
            if *b {
                if most_significant_first {
                    cur_byte |= 1 << (7 - bit_index);
                } else {
                    cur_byte |= 1 << bit_index;
                }
            }
            if bit_index == 7 {
                ret.push(cur_byte);
                cur_byte = 0x00;
                bit_index = 0;
            } else if pad_by_row && i % self.width == (self.width - 1) {
                // last bit in the row => pad and flush
                ret.push(cur_byte);
                cur_byte = 0x00;
                bit_index = 0;
            } else {
                bit_index += 1;
            }
        }

        if !pad_by_row && self.bits.len() % 8 != 0 {
            // non-full byte at the end
            ret.push(cur_byte);
        }

        ret
    }

    /// Scales every point to the configured pixel size and surrounds the result with the quiet
    /// zone.
    pub fn render(&self, bitmap_opts: &BitmapRenderOptions) -> BarcodeBitmap {
        let new_width = bitmap_opts.quiet_left_pixels + bitmap_opts.point_width_pixels * self.width + bitmap_opts.quiet_right_pixels;
        let new_height = bitmap_opts.quiet_top_pixels + bitmap_opts.point_height_pixels * self.height + bitmap_opts.quiet_bottom_pixels;

        let quiet_row = vec![false; new_width];
        let mut rendered_pixels = Vec::with_capacity(new_width * new_height);

        for _ in 0..bitmap_opts.quiet_top_pixels {
            rendered_pixels.extend_from_slice(&quiet_row);
        }

        for y in 0..self.height {
            let row_start = y * self.width;

            let mut this_row = Vec::with_capacity(new_width);
            this_row.resize(bitmap_opts.quiet_left_pixels, false);
            for x in 0..self.width {
                for _ in 0..bitmap_opts.point_width_pixels {
                    this_row.push(self.bits[row_start + x]);
                }
            }
            this_row.resize(new_width, false);

            // output this row as many times as needed (point height)
            for _ in 0..bitmap_opts.point_height_pixels {
                rendered_pixels.extend_from_slice(&this_row);
            }
        }

        for _ in 0..bitmap_opts.quiet_bottom_pixels {
            rendered_pixels.extend_from_slice(&quiet_row);
        }

        // dimensions match by construction
        BarcodeBitmap {
            width: new_width,
            height: new_height,
            bits: rendered_pixels,
        }
    }

    /// Encodes the bitmap as a 1-bit indexed PNG with the given colors.
    pub fn to_png(&self, foreground: Rgb, background: Rgb) -> Result<Vec<u8>, BitmapError> {
        let mut png = Vec::new();

        let width_u32: u32 = self.width.try_into()
            .map_err(|e| BitmapError::DimensionConversion { dimension: "width", value: self.width, target_type: "u32", error: e })?;
        let height_u32: u32 = self.height.try_into()
            .map_err(|e| BitmapError::DimensionConversion { dimension: "height", value: self.height, target_type: "u32", error: e })?;

        let bitmap_bytes = self.to_bytes(true, true);

        {
            let mut png_encoder = png::Encoder::new(&mut png, width_u32, height_u32);
            png_encoder.set_color(png::ColorType::Indexed);
            png_encoder.set_depth(png::BitDepth::One);
            // index 0 = clear bit = background, index 1 = set bit = foreground
            png_encoder.set_palette(vec![
                background.0, background.1, background.2,
                foreground.0, foreground.1, foreground.2,
            ]);
            let mut writer = png_encoder.write_header()
                .map_err(BitmapError::PngEncoding)?;
            writer.write_image_data(&bitmap_bytes)
                .map_err(BitmapError::PngEncoding)?;
        }

        Ok(png)
    }
}
