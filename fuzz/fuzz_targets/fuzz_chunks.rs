#![no_main]

use chunked_csv::ReaderBuilder;
use libfuzzer_sys::fuzz_target;

// The first byte picks the chunk size. Any input must parse to the same
// result regardless of how it is chunked.
fuzz_target!(|data: &[u8]| {
    let (size, data) = match data.split_first() {
        Some((&size, data)) => (1 + size as usize, data),
        None => return,
    };
    for &strict in &[true, false] {
        let whole = ReaderBuilder::new().strict(strict).parse_bytes(data);
        let chunked = ReaderBuilder::new()
            .strict(strict)
            .chunk_size(size)
            .parse_bytes(data);
        match (whole, chunked) {
            (Ok(a), Ok(b)) => assert_eq!(a, b),
            (Err(a), Err(b)) => assert_eq!(a.to_string(), b.to_string()),
            (a, b) => panic!("chunking changed the result: {:?} vs {:?}", a, b),
        }
    }
});
