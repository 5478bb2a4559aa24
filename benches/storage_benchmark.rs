//! Construction, observation and swap costs of results against `std::result::Result`

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use upshot::diag::ExtendedResult;
use upshot::*;

const REPS: u32 = 1024;

fn bench_construction(c: &mut Criterion) {
    c.bench_function("std_result_ok_u32", |b| {
        b.iter(|| {
            let mut sum = 0_u32;
            for n in 0..REPS {
                let r: Result<u32, String> = Ok(black_box(n));
                sum = sum.wrapping_add(*r.as_ref().unwrap_or(&0));
            }
            sum
        });
    });

    c.bench_function("basic_result_success_u32", |b| {
        b.iter(|| {
            let mut sum = 0_u32;
            for n in 0..REPS {
                let r = BasicResult::<u32, String>::success(black_box(n));
                sum = sum.wrapping_add(*r.value().unwrap_or(&0));
            }
            sum
        });
    });

    c.bench_function("basic_result_success_string", |b| {
        b.iter(|| BasicResult::<String, String>::success(black_box(String::from("payload"))));
    });

    c.bench_function("extended_result_failure", |b| {
        b.iter(|| ExtendedResult::<u32, &'static str>::failure(black_box("failed")));
    });
}

fn bench_observers(c: &mut Criterion) {
    let r = BasicResult::<u64, String>::failure("err".into());
    c.bench_function("status_has_error", |b| {
        b.iter(|| {
            let r = black_box(&r);
            (0..REPS).filter(|_| r.has_error()).count()
        });
    });

    c.bench_function("status_transition_table", |b| {
        b.iter(|| {
            let mut s = black_box(Status::None);
            for flag in StatusFlag::ALL {
                s = s.transition(flag, true).unwrap_or(s);
            }
            s
        });
    });
}

fn bench_swap(c: &mut Criterion) {
    let mut a = BasicResult::<u64, String>::success(1);
    let mut b = BasicResult::<u64, String>::failure("e".into());
    c.bench_function("swap_trivial", |bench| {
        bench.iter(|| black_box(&mut a).swap(black_box(&mut b)));
    });

    let mut a = BasicResult::<Vec<u8>, String>::success(vec![1; 64]);
    let mut b = BasicResult::<Vec<u8>, String>::success(vec![2; 64]);
    c.bench_function("swap_nontrivial", |bench| {
        bench.iter(|| black_box(&mut a).swap(black_box(&mut b)));
    });
    c.bench_function("strong_swap_nothrow", |bench| {
        bench.iter(|| black_box(&mut a).strong_swap(black_box(&mut b)));
    });
}

criterion_group!(benches, bench_construction, bench_observers, bench_swap);
criterion_main!(benches);
