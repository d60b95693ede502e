pub mod bitmap;
pub mod qr;


use std::fmt;

use crate::bitmap::BitmapError;


#[derive(Debug)]
pub enum BarcodeError {
    QrEncoding(qrcode::types::QrError),
    Bitmap(BitmapError),
}
impl fmt::Display for BarcodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::QrEncoding(e)
                => write!(f, "QR encoding error: {}", e),
            Self::Bitmap(e)
                => write!(f, "{}", e),
        }
    }
}
impl std::error::Error for BarcodeError {
}
impl From<BitmapError> for BarcodeError {
    fn from(e: BitmapError) -> Self {
        BarcodeError::Bitmap(e)
    }
}
