use criterion::{Criterion, criterion_group, criterion_main};
use eflk::{Container, GroupContents, Header, ParameterRecord, TriggerRecord};
use std::hint::black_box;

fn synthetic_container(headers: usize, groups: usize, records_per_group: usize) -> Container {
    let mut container = Container::new(1);

    for h in 0..headers {
        let resource_groups = (0..groups)
            .map(|g| GroupContents {
                key: format!("Resource{}", g),
                name: format!("effect_{}", g),
                records: (0..records_per_group)
                    .map(|r| ParameterRecord {
                        name: format!("effect_{}_{}", g, r),
                        bone_name: "Root".to_owned(),
                        map_name: "stage01".to_owned(),
                        ..ParameterRecord::default()
                    })
                    .collect(),
            })
            .collect();

        let action_groups = (0..groups)
            .map(|g| GroupContents {
                key: format!("Action{}", g),
                name: format!("action_{}", g),
                records: (0..records_per_group)
                    .map(|r| TriggerRecord {
                        resource_name: format!("effect_{}", g),
                        bone_name: "Root".to_owned(),
                        delay: r as u32,
                        ..TriggerRecord::default()
                    })
                    .collect(),
            })
            .collect();

        let (header, _) =
            Header::from_groups(format!("header_{}", h), resource_groups, action_groups);
        container.insert_header(header);
    }

    container
}

fn criterion_benchmark(c: &mut Criterion) {
    let container = synthetic_container(8, 16, 8);
    let bytes = container.to_bytes().expect("Failed to encode benchmark container");

    c.bench_function("encode 8 headers", |b| {
        b.iter(|| black_box(&container).to_bytes().unwrap())
    });

    c.bench_function("decode 8 headers", |b| {
        b.iter(|| Container::from_bytes(black_box(&bytes)).unwrap())
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
