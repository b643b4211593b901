//! Modules layer - Infrastructure components for external integrations
//!
//! Contains the blob store client and the image generation vendor clients.

pub mod image_generation;
pub mod storage;
