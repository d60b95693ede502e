pub mod errors;
pub mod interfaces;
pub mod model;
pub mod sync;
