#![no_main]
use libfuzzer_sys::fuzz_target;
use oxibufr::bufr::{Bulletin, MemoryVartable, Var, Varcode, Vartable};

fuzz_target!(|data: &[u8]| {
    // First byte sizes the subset, the rest is a descriptor program.
    // The interpreter must never panic, only return errors.
    let Some((&stored, rest)) = data.split_first() else {
        return;
    };
    // Only the first few replications may repeat more than once, so nested
    // groups cannot blow up the run time.
    let mut repeats = 0;
    let codes: Vec<Varcode> = rest
        .chunks_exact(2)
        .take(64)
        .map(|c| {
            let code = Varcode::from_raw(u16::from_be_bytes([c[0], c[1]]));
            if code.f() != 1 {
                return code;
            }
            repeats += 1;
            let y = if repeats <= 4 { code.y() % 4 } else { code.y().min(1) };
            Varcode::new(1, code.x() % 4, y)
        })
        .collect();

    let table = MemoryVartable::builtin();
    let temp = table.query(Varcode::new(0, 12, 101)).unwrap();
    let mut bulletin = Bulletin::new(codes);
    let subset = bulletin.obtain_subset();
    for i in 0..(stored % 16) {
        subset.store_variable(Var::with_int(temp.clone(), i32::from(i)));
    }

    let _ = bulletin.validate(&table);
    let _ = bulletin.print_structured(&table, std::io::sink());
});
