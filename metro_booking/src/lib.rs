pub mod desk;
pub mod fare;
pub mod qr;
pub mod session;
pub mod ticket;
pub mod validation;
