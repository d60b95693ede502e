use qrcode::QrCode;

use crate::BarcodeError;
use crate::bitmap::BarcodeBitmap;


/// Encodes the string into a QR code with one bit per module, without a quiet zone.
pub fn qr_string_to_bitmap(string: &str) -> Result<BarcodeBitmap, BarcodeError> {
    let qr = QrCode::new(string.as_bytes())
        .map_err(BarcodeError::QrEncoding)?;
    let qr_bits: Vec<bool> = qr.to_colors()
        .iter()
        .map(|c| c.select(true, false))
        .collect();

    BarcodeBitmap::new(
        qr.width(),
        qr_bits.len() / qr.width(),
        qr_bits,
    )
        .map_err(BarcodeError::Bitmap)
}
