use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ledger_core::{ops, AccountId, Amount, Currency, Issue, MemoryLedger, TxContext};
use rust_decimal::Decimal;
use settlement::{flow_cross, ripple_calculate, FlowConfig, PathCompiler, PaymentRequest};

/// A book of `depth` one-unit offers at rising rates
fn deep_book(depth: i64) -> (MemoryLedger, AccountId, AccountId, Issue) {
    let mut ledger = MemoryLedger::default();
    let alice = AccountId::from_seed("alice");
    let bob = AccountId::from_seed("bob");
    let gateway = AccountId::from_seed("gateway");
    let usd = Issue::new(Currency::from_code("USD").unwrap(), gateway);
    for account in [alice, bob, gateway] {
        ops::create_account(&mut ledger, account, 1_000_000_000_000).unwrap();
    }
    ops::set_trust_line(&mut ledger, bob, gateway, usd.currency, Decimal::from(1_000_000))
        .unwrap();
    ops::set_trust_line(&mut ledger, alice, gateway, usd.currency, Decimal::from(1_000_000))
        .unwrap();
    for rate in 1..=depth {
        ops::create_offer(
            &mut ledger,
            gateway,
            Amount::xrp(rate * 10),
            Amount::iou(Decimal::TEN, usd),
        )
        .unwrap();
    }
    (ledger, alice, bob, usd)
}

fn bench_ripple_calculate(c: &mut Criterion) {
    let mut group = c.benchmark_group("ripple_calculate");
    for depth in [10i64, 100, 500] {
        let (ledger, alice, bob, usd) = deep_book(depth);
        let deliver = Amount::iou(Decimal::from(depth * 5), usd);
        let mut request = PaymentRequest::new(alice, bob, deliver);
        request.src_amount_max = Some(Amount::xrp(i64::MAX / 4));
        let config = FlowConfig::default();

        group.bench_with_input(BenchmarkId::from_parameter(depth), &request, |b, request| {
            b.iter(|| {
                let output = ripple_calculate(
                    &ledger,
                    black_box(request),
                    &PathCompiler,
                    &config,
                    &TxContext::default(),
                )
                .unwrap();
                black_box(output.actual_out)
            })
        });
    }
    group.finish();
}

fn bench_flow_cross(c: &mut Criterion) {
    let (ledger, alice, _, usd) = deep_book(100);
    let config = FlowConfig::default();
    let gets = Amount::xrp(50_000);
    let pays = Amount::iou(Decimal::from(1_000), usd);

    c.bench_function("flow_cross_100", |b| {
        b.iter(|| {
            let output = flow_cross(
                &ledger,
                alice,
                black_box(&gets),
                black_box(&pays),
                &config,
                &TxContext::default(),
            )
            .unwrap();
            black_box(output.amount_received)
        })
    });
}

criterion_group!(benches, bench_ripple_calculate, bench_flow_cross);
criterion_main!(benches);
