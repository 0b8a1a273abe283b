pub mod lighting;
pub mod photo;
