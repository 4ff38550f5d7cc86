#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // Parsing never rejects input, so it must never panic either
    let predicates = nasfind::query::parse(data);
    let _ = nasfind::query::FilesQuery::from_predicates(&predicates);
});
