//! Shared helpers for the integration tests.
#![allow(dead_code)]

pub mod bmff;
pub mod raw_heic;
pub mod synthetic;

use heifconv::CodecRegistry;

pub use raw_heic::RawHeicCodec;

/// Raw container adapter for `heic` plus the compiled-in raster codecs.
pub fn test_registry() -> CodecRegistry {
    let mut registry = CodecRegistry::none();
    #[cfg(feature = "jpeg")]
    {
        registry = registry.with_adapter(heifconv::codecs::JpegCodec);
    }
    #[cfg(feature = "png")]
    {
        registry = registry.with_adapter(heifconv::codecs::PngCodec);
    }
    registry.with_adapter(RawHeicCodec)
}
