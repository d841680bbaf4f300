use criterion::{criterion_group, criterion_main, Criterion};
use frost_core::Field;
use frost_secp256k1::{Secp256K1ScalarField, Secp256K1Sha256};
use mta_threshold_signatures::{
    crypto::lagrange::{compute_lagrange_coefficient, LagrangeInterpolator},
    ParticipantList,
};
use rand_core::OsRng;
use std::hint::black_box;

type C = Secp256K1Sha256;

fn bench_lagrange_computation(c: &mut Criterion) {
    let mut group = c.benchmark_group("Lagrange Computation");

    for degree in [10u32, 100].iter() {
        let ids = ParticipantList::range(*degree + 1).scalars::<C>();
        let point = Some(Secp256K1ScalarField::random(&mut OsRng));

        group.bench_with_input(
            format!("coefficients_degree_{}", degree),
            &(ids.clone(), point),
            |b, (ids, point)| {
                b.iter(|| {
                    for id in ids.iter() {
                        let coeff =
                            compute_lagrange_coefficient::<C>(ids, id, point.as_ref()).unwrap();
                        black_box(coeff);
                    }
                });
            },
        );

        // x = 0
        let ys: Vec<_> = ids
            .iter()
            .map(|_| Secp256K1ScalarField::random(&mut OsRng))
            .collect();
        let interpolator = LagrangeInterpolator::<C>::new(ids.clone(), ys).unwrap();
        group.bench_function(format!("evaluate_x0_degree_{}", degree), |b| {
            b.iter(|| black_box(interpolator.evaluate(None).unwrap()));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_lagrange_computation);
criterion_main!(benches);
