use metro_barcode::bitmap::{BitmapRenderOptions, Rgb};
use metro_barcode::qr::qr_string_to_bitmap;
use metro_interface::errors::EncodingError;
use metro_interface::interfaces::{ImageEncoder, ImageOptions};


/// Renders text as a two-colour QR code PNG.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct QrPngEncoder;
impl ImageEncoder for QrPngEncoder {
    fn encode(&self, text: &str, options: &ImageOptions) -> Result<Vec<u8>, EncodingError> {
        let foreground: Rgb = options.foreground_color.parse()
            .map_err(|e| EncodingError(format!("foreground: {}", e)))?;
        let background: Rgb = options.background_color.parse()
            .map_err(|e| EncodingError(format!("background: {}", e)))?;
        if options.size_hint == 0 {
            return Err(EncodingError("module size must be at least one pixel".to_owned()));
        }

        let bitmap = qr_string_to_bitmap(text)
            .map_err(|e| EncodingError(e.to_string()))?;
        bitmap.render(&BitmapRenderOptions::with_points(options.size_hint, options.border_width))
            .to_png(foreground, background)
            .map_err(|e| EncodingError(e.to_string()))
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options_encode() {
        let png = QrPngEncoder.encode("ID: 1A2B3C4D", &ImageOptions::default()).unwrap();
        assert_eq!(&[0x89, b'P', b'N', b'G'], &png[0..4]);
    }

    fn decode_png_qr(png_bytes: &[u8]) -> String {
        let mut decoder = png::Decoder::new(png_bytes);
        decoder.set_transformations(png::Transformations::EXPAND);
        let mut reader = decoder.read_info().unwrap();
        let mut buf = vec![0; reader.output_buffer_size()];
        let info = reader.next_frame(&mut buf).unwrap();
        let samples = info.color_type.samples();

        let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(
            info.width as usize,
            info.height as usize,
            |x, y| buf[y * info.line_size + x * samples],
        );
        let grids = prepared.detect_grids();
        assert_eq!(1, grids.len());
        let (_meta, content) = grids[0].decode().unwrap();
        content
    }

    #[test]
    fn test_ticket_text_round_trip() {
        let text = "METRO RAIL TICKET\nID: 1A2B3C4D\nPassenger: Asha\nRoute: Ameerpet -> KPHB\n\
            Journey: Return\nClass: Premium\nPassengers: 2\nFare: Rs. 162\nIssued: 09:30 | 18-Oct";
        let png = QrPngEncoder.encode(text, &ImageOptions::default()).unwrap();
        assert_eq!(text, decode_png_qr(&png));
    }

    #[test]
    fn test_bad_color() {
        let options = ImageOptions {
            foreground_color: "navy".to_owned(),
            ..ImageOptions::default()
        };
        let err = QrPngEncoder.encode("hello", &options).unwrap_err();
        assert!(err.0.starts_with("foreground"));
    }

    #[test]
    fn test_zero_module_size() {
        let options = ImageOptions {
            size_hint: 0,
            ..ImageOptions::default()
        };
        assert!(QrPngEncoder.encode("hello", &options).is_err());
    }
}
