#![no_main]

use heifconv::Container;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(container) = Container::from_bytes(data.to_vec()) else {
        return;
    };

    let ids = container.top_level_image_ids();
    assert_eq!(ids.len(), container.number_of_top_level_images());
    let unique: std::collections::HashSet<_> = ids.iter().collect();
    assert_eq!(unique.len(), ids.len());
    if let Some(primary) = container.primary_image_id() {
        assert!(ids.contains(&primary));
    }
    for &id in ids {
        if let Ok(handle) = container.image_handle(id) {
            assert_eq!(handle.id(), id);
            let _ = handle.item_type();
        }
    }
});
