//! Performance benchmarks for the synchronization engine.

use aerosync_engine::prelude::*;
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;

struct Bench {
    mode: EnumSetting<u8>,
    items: SettingMap<u32, i64, Bounds<i64>>,
}

impl Bench {
    fn with_items(count: u32, timers: &mut ManualTimers) -> Self {
        let mut bench = Self {
            mode: Setting::new(DiscreteSet::new(0..16), 0),
            items: SettingMap::new(),
        };
        let mut session = ChangeSession::new(ComponentKind::DebugSettings, timers);
        bench.items.set_supported_keys(0..count, &mut session);
        for key in 0..count {
            bench
                .items
                .confirm_with(key, Bounds::new(0, 1_000), 0, &mut session);
        }
        bench
    }
}

impl Component for Bench {
    fn kind(&self) -> ComponentKind {
        ComponentKind::DebugSettings
    }

    fn for_each_setting(&mut self, visit: &mut dyn FnMut(&mut dyn SettingControl)) {
        visit(&mut self.mode);
        self.items.for_each_setting(visit);
    }
}

fn bench_request_and_confirm(c: &mut Criterion) {
    let mut timers = ManualTimers::new();
    let mut setting: EnumSetting<u8> = Setting::new(DiscreteSet::new(0..16), 0);
    let mut next = 0u8;

    c.bench_function("request_then_confirm", |b| {
        b.iter(|| {
            next = (next + 1) % 16;
            let mut session = ChangeSession::new(ComponentKind::Camera, &mut timers);
            setting.request_change(black_box(next), |_| true, &mut session);
            setting.confirm(black_box(next), &mut session);
            session.finish()
        });
    });
}

fn bench_commit_fanout(c: &mut Criterion) {
    let mut group = c.benchmark_group("commit_fanout");
    for subscribers in [1usize, 8, 64] {
        let mut timers = ManualTimers::new();
        let mut registry = ComponentRegistry::new();
        registry.publish(Box::new(Bench::with_items(4, &mut timers)));
        let _subs: Vec<Subscription> = (0..subscribers)
            .map(|_| registry.subscribe(ComponentKind::DebugSettings, |c| {
                black_box(c.kind());
            }))
            .collect();

        group.bench_with_input(
            BenchmarkId::from_parameter(subscribers),
            &subscribers,
            |b, _| {
                b.iter(|| {
                    registry
                        .mark_dirty(ComponentKind::DebugSettings)
                        .and_then(|()| registry.commit(black_box(ComponentKind::DebugSettings)))
                });
            },
        );
    }
    group.finish();
}

fn bench_cancel_all_pending(c: &mut Criterion) {
    let mut group = c.benchmark_group("cancel_all_pending");
    for items in [8u32, 64, 512] {
        let mut timers = ManualTimers::new();
        let mut bench = Bench::with_items(items, &mut timers);

        group.bench_with_input(BenchmarkId::from_parameter(items), &items, |b, &items| {
            b.iter(|| {
                let mut session = ChangeSession::new(ComponentKind::DebugSettings, &mut timers);
                for key in 0..items {
                    bench.items.request_change(&key, 500, |_| true, &mut session);
                    bench.items.confirm(key, 0, &mut session);
                    bench.items.request_change(&key, 500, |_| true, &mut session);
                }
                black_box(cancel_all_pending(&mut bench, &mut session));
                for key in 0..items {
                    bench.items.confirm(key, 0, &mut session);
                }
            });
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_request_and_confirm,
    bench_commit_fanout,
    bench_cancel_all_pending
);
criterion_main!(benches);
