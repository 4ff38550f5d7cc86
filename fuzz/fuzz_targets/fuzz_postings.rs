#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Debug)]
struct Input {
    data: Vec<u8>,
    cap: Option<u16>,
}

fuzz_target!(|input: Input| {
    // Postings come from disk: malformed bytes must decode to an error, not a panic
    let cap = input.cap.map(usize::from);
    if let Ok(ids) = nasfind::utils::decode_postings(&input.data, cap) {
        assert!(ids.windows(2).all(|w| w[0] <= w[1]));
    }
});
