use criterion::{Criterion, black_box, criterion_group, criterion_main};

use tradepost_core::{Entity, EntityId, EntityKind};
use tradepost_events::{ChangeEvent, decode, encode};
use tradepost_infra::build_in_memory;

fn codec_benchmarks(c: &mut Criterion) {
    let event = ChangeEvent::created(Entity {
        id: EntityId::new(),
        kind: EntityKind::Supplier,
        name: "Acme Industrial Fasteners".to_string(),
        description: "bolts, washers and threaded rod".to_string(),
    });
    let bytes = encode(&event).unwrap();

    c.bench_function("codec/encode_created", |b| {
        b.iter(|| encode(black_box(&event)).unwrap())
    });

    c.bench_function("codec/decode_created", |b| {
        b.iter(|| decode(black_box(&bytes)).unwrap())
    });
}

fn orchestrator_benchmarks(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("orchestrator/create_in_memory", |b| {
        let services = rt.block_on(async { build_in_memory() });
        b.iter(|| {
            rt.block_on(async {
                services
                    .orchestrator
                    .create(EntityKind::Product, "Bolt", "M6 steel")
                    .await
                    .unwrap()
            })
        });
    });
}

criterion_group!(benches, codec_benchmarks, orchestrator_benchmarks);
criterion_main!(benches);
