use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use oxibufr::bufr::{
    Bitmap, Bulletin, MemoryVartable, Opcodes, Var, VarFlags, VarInfo, Varcode, Vartable,
};
use std::io;
use std::sync::Arc;

const STATION: Varcode = Varcode::new(0, 1, 1);
const COUNT: Varcode = Varcode::new(0, 31, 1);
const TEMP: Varcode = Varcode::new(0, 12, 101);
const CONFIDENCE: Varcode = Varcode::new(0, 33, 7);

fn gen_values(n: usize, seed: u64) -> Vec<i32> {
    let mut s = seed;
    (0..n)
        .map(|_| {
            s = s.wrapping_mul(6364136223846793005).wrapping_add(1);
            25000 + ((s >> 33) % 5000) as i32
        })
        .collect()
}

fn bitmap_var(bits: &str) -> Var {
    let info = Arc::new(VarInfo {
        code: Varcode::new(2, 22, 0),
        desc: "DATA PRESENT BITMAP".into(),
        unit: "".into(),
        scale: 0,
        ref_val: 0,
        len: bits.len() as u32,
        bit_len: bits.len() as u32,
        flags: VarFlags::STRING,
    });
    Var::with_str(info, bits)
}

/// Station, a delayed run of `levels` temperatures, and a quality bitmap
/// over the temperatures with every other bit set.
fn gen_bulletin(t: &MemoryVartable, subsets: usize, levels: usize) -> Bulletin {
    let mut datadesc = vec![STATION, Varcode::new(1, 1, 0), COUNT, TEMP];
    datadesc.push(Varcode::new(2, 22, 0));
    datadesc.push(Varcode::new(1, 1, 0));
    datadesc.push(Varcode::new(0, 31, 2));
    datadesc.push(Varcode::new(0, 31, 31));
    datadesc.extend(std::iter::repeat_n(CONFIDENCE, levels.div_ceil(2)));

    let bits: String = (0..levels).map(|i| if i % 2 == 0 { '+' } else { '-' }).collect();
    let mut b = Bulletin::new(datadesc);
    for no in 0..subsets {
        let s = b.obtain_subset();
        s.store_variable(Var::with_int(t.query(STATION).unwrap(), no as i32));
        s.store_variable(Var::with_int(t.query(COUNT).unwrap(), levels as i32));
        for (i, v) in gen_values(levels, no as u64).into_iter().enumerate() {
            let mut var = Var::with_int(t.query(TEMP).unwrap(), v);
            if i % 2 == 0 {
                var.seta(Var::with_int(t.query(CONFIDENCE).unwrap(), 70));
            }
            s.store_variable(var);
        }
        s.store_variable(bitmap_var(&bits));
    }
    b
}

fn bench_validate(c: &mut Criterion) {
    let t = MemoryVartable::builtin();
    let mut g = c.benchmark_group("validate_subsets");
    for subsets in [16usize, 256, 4096] {
        let b = gen_bulletin(&t, subsets, 32);
        g.throughput(Throughput::Elements(subsets as u64));
        g.bench_with_input(BenchmarkId::from_parameter(subsets), &b, |bench, b| {
            bench.iter(|| black_box(b).validate(&t).unwrap());
        });
    }
    g.finish();
}

fn bench_print(c: &mut Criterion) {
    let t = MemoryVartable::builtin();
    let b = gen_bulletin(&t, 256, 32);
    c.bench_function("print_structured_256", |bench| {
        bench.iter(|| black_box(&b).print_structured(&t, io::sink()).unwrap());
    });
}

fn bench_bitmap_init(c: &mut Criterion) {
    let t = MemoryVartable::builtin();
    let mut g = c.benchmark_group("bitmap_init_vs_length");
    for len in [8usize, 128, 2048] {
        let subset: Vec<Var> = gen_values(len, 7)
            .into_iter()
            .map(|v| Var::with_int(t.query(TEMP).unwrap(), v))
            .collect();
        let bits: String = (0..len).map(|i| if i % 3 == 0 { '+' } else { '-' }).collect();
        let bitmap = bitmap_var(&bits);
        g.throughput(Throughput::Elements(len as u64));
        g.bench_with_input(BenchmarkId::from_parameter(len), &len, |bench, &len| {
            bench.iter(|| {
                let mut bm = Bitmap::new();
                bm.init(black_box(&bitmap), &subset, len, len).unwrap();
                black_box(bm.remaining().len());
            });
        });
    }
    g.finish();
}

fn bench_program_print(c: &mut Criterion) {
    let t = MemoryVartable::builtin();
    let b = gen_bulletin(&t, 1, 512);
    c.bench_function("program_print_512", |bench| {
        bench.iter(|| {
            let mut out = Vec::new();
            Opcodes::new(black_box(&b.datadesc)).print(&mut out).unwrap();
            black_box(out);
        });
    });
}

criterion_group!(
    benches,
    bench_validate,
    bench_print,
    bench_bitmap_init,
    bench_program_print
);
criterion_main!(benches);
