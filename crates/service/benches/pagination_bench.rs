use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use models::expense::NewExpense;
use service::storage::MemoryDocumentStore;
use service::ExpenseStore;

const OWNERS: [&str; 3] = ["a@x.com", "b@x.com", "c@x.com"];

fn trip(oseba: &str) -> NewExpense {
    NewExpense {
        naziv: "Sestanek".into(),
        datum_odhoda: "2024-10-27".into(),
        datum_prihoda: "2024-10-28".into(),
        kilometrina: 42.0,
        lokacija: "Ljubljana".into(),
        opis: String::new(),
        oseba: oseba.into(),
    }
}

fn bench_owner_pages(c: &mut Criterion) {
    let expenses = ExpenseStore::new(Arc::new(MemoryDocumentStore::new()));

    // seed outside of the benchmark using a tokio runtime
    let rt = tokio::runtime::Runtime::new().unwrap();
    let base = Utc.with_ymd_and_hms(2024, 10, 27, 8, 0, 0).unwrap();
    rt.block_on(async {
        for i in 0..2_000 {
            let owner = OWNERS[i as usize % OWNERS.len()];
            expenses.add_at(trip(owner), base + Duration::milliseconds(i)).await.unwrap();
        }
    });

    let emails = &OWNERS[..2];
    let mut group = c.benchmark_group("expenses_by_emails");
    for page in [1u32, 10, 60] {
        group.bench_with_input(BenchmarkId::new("numbered", page), &page, |b, &page| {
            b.iter(|| rt.block_on(expenses.get_by_emails(emails, 20, page)).unwrap());
        });
    }
    group.bench_function("cursor_walk", |b| {
        b.iter(|| {
            rt.block_on(async {
                let mut after: Option<String> = None;
                loop {
                    let p = expenses.get_by_emails_after(emails, 20, after.as_deref()).await.unwrap();
                    match p.next {
                        Some(next) => after = Some(next),
                        None => break,
                    }
                }
            })
        });
    });
    group.finish();
}

criterion_group!(benches, bench_owner_pages);
criterion_main!(benches);
