#![no_main]

use fuzzbound::{ArchiveMode, Harness};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Central directory only, so corpus entries that fail the streaming
    // pass early still reach ZipArchive::new
    let _ = Harness::default().run_archive(data, ArchiveMode::Indexed);
});
