#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Streaming pass over local headers, then the central-directory pass.
    // Inputs outside 4 bytes..1 MiB are rejected before any parsing.
    fuzzbound::fuzz_archive(data);
});
