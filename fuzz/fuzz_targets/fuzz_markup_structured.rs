#![no_main]

use libfuzzer_sys::arbitrary::{Arbitrary, Result, Unstructured};
use libfuzzer_sys::fuzz_target;

#[derive(Debug)]
struct FuzzRun {
    max_chunk: usize,
    max_attributes: usize,
    max_nodes: Option<usize>,
    document: Vec<u8>,
}

impl<'a> Arbitrary<'a> for FuzzRun {
    fn arbitrary(u: &mut Unstructured<'a>) -> Result<Self> {
        // Small chunk sizes force quick-xml to resume across buffer
        // boundaries, which a single 64 KiB window never exercises
        let max_chunk = u.int_in_range(1..=512)?;
        let max_attributes = u.int_in_range(0..=100)?;
        let max_nodes = if u.arbitrary()? {
            Some(u.int_in_range(1..=1000)?)
        } else {
            None
        };
        let document = u.bytes(u.len())?.to_vec();
        Ok(FuzzRun {
            max_chunk,
            max_attributes,
            max_nodes,
            document,
        })
    }
}

fuzz_target!(|run: FuzzRun| {
    let limits = fuzzbound::Limits::new()
        .with_max_chunk(run.max_chunk)
        .with_max_attributes(run.max_attributes)
        .with_max_nodes(run.max_nodes);

    if let Some(report) = fuzzbound::Harness::new(limits)
        .run_markup(&run.document)
        .into_report()
    {
        assert!(report.stream.largest_chunk <= run.max_chunk);
        assert!(report.stream.bytes_served <= run.document.len() as u64);
    }
});
