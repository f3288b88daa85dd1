#![no_main]

use callstream::{CallAdapterFactory, ReturnType};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(s) = std::str::from_utf8(data) else {
        return;
    };

    let Ok(ty) = ReturnType::parse(s) else {
        return;
    };

    // Display output parses back to the same type.
    let again = ReturnType::parse(&ty.to_string()).unwrap();
    assert_eq!(ty, again);

    let _ = CallAdapterFactory::create().get(&ty);
});
