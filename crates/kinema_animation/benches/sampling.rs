use criterion::{black_box, criterion_group, criterion_main, Criterion};
use kinema_animation::{Animator, ControllerOptions, StaggerOptions};
use kinema_style::testing::MemoryTarget;
use kinema_style::{property_map, PropertyMap, PropertySet, PropertyValue};

fn bench_property_set(c: &mut Criterion) {
    let target = MemoryTarget::new()
        .with_value("opacity", "1")
        .with_value("background-color", "rgb(255, 0, 0)")
        .with_value("box-shadow", "0px 0px 0px rgba(0, 0, 0, 0)");
    let to = property_map([
        ("opacity", PropertyValue::from(0.0)),
        ("x", 120.0.into()),
        ("rotate", "45deg".into()),
        ("backgroundColor", "#00f".into()),
        ("boxShadow", "4px 8px 16px rgba(0, 0, 0, 0.4)".into()),
    ]);

    c.bench_function("property_set_read", |b| {
        b.iter(|| PropertySet::read(black_box(&target), &PropertyMap::new(), black_box(&to)))
    });

    let set = PropertySet::read(&target, &PropertyMap::new(), &to);
    c.bench_function("property_set_sample", |b| {
        b.iter(|| set.sample(black_box(0.37), false, false))
    });
}

fn bench_stagger_tick(c: &mut Criterion) {
    c.bench_function("stagger_100_targets_tick", |b| {
        b.iter_with_setup(
            || {
                let mut animator = Animator::with_defaults(ControllerOptions::new());
                for i in 0..100 {
                    animator.register_named(
                        "item",
                        MemoryTarget::new()
                            .with_value("opacity", "1")
                            .with_center(i as f64 * 10.0, 0.0),
                    );
                }
                animator.to(
                    "item",
                    property_map([("opacity", 0.0), ("y", 40.0)]),
                    ControllerOptions::new().stagger(StaggerOptions::each(0.02)),
                );
                animator
            },
            |mut animator| {
                for _ in 0..60 {
                    animator.tick(1.0 / 60.0);
                }
                animator
            },
        )
    });
}

criterion_group!(benches, bench_property_set, bench_stagger_tick);
criterion_main!(benches);
