use criterion::{Criterion, criterion_group, criterion_main};
use dsp_loader::{
    BitCursor, Endian, FieldSign, LoadOptions, LoaderState, LocalSymbol, RelocationRecord,
    SectionInfo, SymbolTable, arch,
};
use std::hint::black_box;

fn codec_benchmark(c: &mut Criterion) {
    c.bench_function("codec:repack_unpack", |b| {
        let mut window = [0u8; 8];
        b.iter(|| {
            let mut cursor = BitCursor::new(&mut window, Endian::Little);
            cursor
                .repack(black_box(0x1234), 21, 7, FieldSign::Signed)
                .unwrap();
            black_box(cursor.unpack(21, 7, FieldSign::Signed));
        });
    });
}

fn relocate_benchmark(c: &mut Criterion) {
    let mut state = LoaderState::new(&arch::c6000::TARGET, LoadOptions::empty(), |_| {});
    state.set_symbols(SymbolTable::new((0..64).map(|i| {
        (
            format!("_sym{i}"),
            LocalSymbol {
                value: 0x1000 + i,
                delta: i,
                section: 1,
                class: 2,
            },
        )
    })));
    state.set_sections(vec![SectionInfo {
        name: ".text".into(),
        load_addr: 0,
        run_addr: 0x8000,
        size: 0x1000,
    }]);
    state.begin_section(0, 0).unwrap();

    let mut image = vec![0u8; 0x1000];
    let records: Vec<RelocationRecord> = (0..256u32)
        .map(|i| RelocationRecord {
            target_vaddr: (i % 64) * 4,
            reloc_type: arch::c6000::R_RELLONG,
            symbol_index: (i % 64) as i32,
            ..Default::default()
        })
        .collect();

    c.bench_function("relocate:assign_sweep", |b| {
        b.iter(|| {
            for record in &records {
                state.relocate(&mut image, record).unwrap();
            }
        });
    });
}

criterion_group!(benches, codec_benchmark, relocate_benchmark);
criterion_main!(benches);
