//! Data Transfer Objects for REST request/response serialization.

pub mod device_class_dto;
pub mod volume_dto;

pub use device_class_dto::*;
pub use volume_dto::*;
