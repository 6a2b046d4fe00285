#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Pre-order walk over quick-xml events with the reference caps
    fuzzbound::fuzz_markup(data);
});
