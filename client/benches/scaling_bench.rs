// Scaling and codec benchmarks for the ZENITH client.
//
// Covers the decimal scaler in both directions, principal text parsing
// and rendering, key-derived principal construction, and transfer body
// encoding. These are the pure paths a dashboard hits on every keystroke
// and every submission.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use zenith_client::identity::Principal;
use zenith_client::ledger::TransferArg;
use zenith_client::token::{Account, TokenAmount};

fn bench_amount_parse(c: &mut Criterion) {
    c.bench_function("amount/parse_integer", |b| {
        b.iter(|| TokenAmount::from_decimal("1500", 8));
    });

    c.bench_function("amount/parse_fractional", |b| {
        b.iter(|| TokenAmount::from_decimal("1.23456789", 8));
    });

    c.bench_function("amount/parse_truncating", |b| {
        b.iter(|| TokenAmount::from_decimal("0.123456789123456789", 8));
    });
}

fn bench_amount_parse_by_length(c: &mut Criterion) {
    let mut group = c.benchmark_group("amount/parse_by_length");

    for digits in [4usize, 12, 24, 38] {
        let whole = digits / 2;
        let frac = digits - whole;
        let input = format!("{}.{}", "9".repeat(whole), "9".repeat(frac));

        group.throughput(Throughput::Bytes(input.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(digits), &input, |b, input| {
            b.iter(|| TokenAmount::from_decimal(input, frac as u8).unwrap());
        });
    }

    group.finish();
}

fn bench_amount_display(c: &mut Criterion) {
    let amount = TokenAmount::new(123_456_789);

    c.bench_function("amount/display", |b| {
        b.iter(|| amount.display_decimal(8));
    });
}

fn bench_principal_parse(c: &mut Criterion) {
    c.bench_function("principal/parse", |b| {
        b.iter(|| Principal::from_text("ryjl3-tyaaa-aaaaa-aaaba-cai").unwrap());
    });
}

fn bench_principal_render(c: &mut Criterion) {
    let principal = Principal::from_text("ryjl3-tyaaa-aaaaa-aaaba-cai").unwrap();

    c.bench_function("principal/render", |b| {
        b.iter(|| principal.to_text());
    });
}

fn bench_self_authenticating(c: &mut Criterion) {
    let public_key = [7u8; 32];

    c.bench_function("principal/self_authenticating", |b| {
        b.iter(|| Principal::self_authenticating(&public_key));
    });
}

fn bench_transfer_encode(c: &mut Criterion) {
    let to = Principal::from_text("ryjl3-tyaaa-aaaaa-aaaba-cai").unwrap();
    let arg = TransferArg {
        to: Account::from(to),
        amount: TokenAmount::new(150_000_000),
        fee: Some(TokenAmount::new(10_000)),
        memo: Some(vec![0xAB; 32]),
        from_subaccount: None,
        created_at_time: Some(1_700_000_000_000_000_000),
    };

    c.bench_function("transfer/encode_body", |b| {
        b.iter(|| serde_json::to_value(&arg).unwrap());
    });
}

criterion_group!(
    benches,
    bench_amount_parse,
    bench_amount_parse_by_length,
    bench_amount_display,
    bench_principal_parse,
    bench_principal_render,
    bench_self_authenticating,
    bench_transfer_encode,
);
criterion_main!(benches);
