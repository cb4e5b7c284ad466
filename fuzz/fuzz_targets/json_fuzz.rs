#![no_main]
use libfuzzer_sys::fuzz_target;
use oxibufr::bufr::MemoryVartable;
use oxibufr::io;

fuzz_target!(|data: &[u8]| {
    let mut table = MemoryVartable::builtin();
    let _ = io::read_table(data, &mut table);
    if let Ok(bulletin) = io::read_bulletin(data, &table) {
        let _ = bulletin.validate(&table);
    }
});
