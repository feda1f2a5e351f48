#![no_main]

use arbitrary::Arbitrary;
use heifconv::{CodecRegistry, DecodeRequest, Limits};
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Debug)]
struct Input<'a> {
    max_width: Option<u16>,
    max_height: Option<u16>,
    max_pixels: Option<u32>,
    data: &'a [u8],
}

fuzz_target!(|input: Input<'_>| {
    let limits = Limits {
        max_width: input.max_width.map(u64::from),
        max_height: input.max_height.map(u64::from),
        max_pixels: input.max_pixels.map(u64::from),
    };
    let registry = CodecRegistry::all();

    if let Ok(output) = DecodeRequest::new(input.data)
        .with_registry(&registry)
        .with_limits(&limits)
        .decode()
    {
        let (w, h) = (u64::from(output.width()), u64::from(output.height()));
        assert!(w > 0 && h > 0);
        assert!(limits.check_dimensions(w, h).is_ok());
    }
});
