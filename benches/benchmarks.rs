use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use pospop::{
    dispatch::{families, Family, Scalar},
    Element,
};

fn bench_width<T: Element>(c: &mut Criterion, width: &str, family: &dyn Family) {
    let buf = (0..1u64 << 17)
        .map(|i| i.wrapping_mul(0x9e37_79b9_7f4a_7c15))
        .collect::<Vec<_>>();
    let buf: &[T] = bytemuck::cast_slice(&buf);
    let mut group = c.benchmark_group(format!("{}/{width}", family.name()));
    for size_pow2 in [4, 6, 8, 10, 12, 14, 16] {
        let size = 1usize << size_pow2;
        group.throughput(Throughput::Bytes((size * std::mem::size_of::<T>()) as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            let mut counts: T::Counts = bytemuck::Zeroable::zeroed();
            b.iter(|| T::count_with(family, &mut counts, &buf[..pessimize::hide(size)]));
        });
    }
}

pub fn criterion_benchmark(c: &mut Criterion) {
    let mut benchmarked: Vec<&dyn Family> = vec![&Scalar];
    benchmarked.extend(families().iter().copied().filter(|f| f.available()));
    for family in benchmarked {
        bench_width::<u8>(c, "count8", family);
        bench_width::<u16>(c, "count16", family);
        bench_width::<u32>(c, "count32", family);
        bench_width::<u64>(c, "count64", family);
    }
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
