//! Criterion comparison of single-row SELECT latency for raw `rusqlite` vs. the
//! serial queue. Each iteration reuses the same seeded dataset so we focus on
//! dispatch overhead instead of storage effects.

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use rusqlite::{Connection, params};
use sqlkit::{SqlQueue, StepResult, Value};
use std::fs;
use std::hint::black_box;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};
use std::time::{Duration, Instant};

const LOOKUP_SQL: &str = "SELECT id, name, score, active FROM test WHERE id = ?";

/// Holds the reusable on-disk database path plus deterministic id workload.
struct Dataset {
    path: String,
    ids: Arc<Vec<i64>>,
}

// Prepare a shared SQLite file once so every variant hits identical data.
static DATASET: LazyLock<Dataset> = LazyLock::new(|| {
    let row_count = lookup_row_count();
    let path = PathBuf::from("benchmark_queue_single_lookup.db");
    prepare_sqlite_dataset(&path, row_count).expect("failed to prepare SQLite dataset");

    let mut ids: Vec<i64> = (1..=row_count as i64).collect();
    let mut rng = ChaCha8Rng::seed_from_u64(1_234_567_890);
    ids.shuffle(&mut rng);

    Dataset {
        path: path.to_string_lossy().into_owned(),
        ids: Arc::new(ids),
    }
});

/// Resolve how many lookups each iteration should perform.
fn lookup_row_count() -> usize {
    std::env::var("BENCH_LOOKUPS")
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(1000)
}

/// Create a fresh SQLite file with predictable contents for repeatable runs.
fn prepare_sqlite_dataset(path: &Path, row_count: usize) -> rusqlite::Result<()> {
    if path.exists() {
        fs::remove_file(path).map_err(|_| rusqlite::Error::InvalidPath(path.to_path_buf()))?;
    }

    let mut conn = Connection::open(path)?;
    conn.execute_batch(
        "
        PRAGMA journal_mode = WAL;
        CREATE TABLE test (
            id      INTEGER PRIMARY KEY,
            name    TEXT NOT NULL,
            score   REAL NOT NULL,
            active  INTEGER NOT NULL
        );
        ",
    )?;

    let transaction = conn.transaction()?;
    {
        let mut insert_stmt = transaction
            .prepare("INSERT INTO test (id, name, score, active) VALUES (?1, ?2, ?3, ?4)")?;

        for id in 1..=row_count as i64 {
            let name = format!("name-{id}");
            let score = id as f64 * 0.5;
            let active = id % 2 == 0;
            insert_stmt.execute(params![id, name, score, active])?;
        }
    }
    transaction.commit()?;

    Ok(())
}

/// Compact struct used in every variant to ensure identical decoding cost.
#[derive(Debug)]
struct BenchRow {
    id: i64,
    name: String,
    score: f64,
    active: bool,
}

impl BenchRow {
    fn from_rusqlite(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            score: row.get(2)?,
            active: row.get(3)?,
        })
    }

    fn from_row(row: &sqlkit::Row) -> Self {
        Self {
            id: row.value(0).expect("integer id column"),
            name: row.value(1).expect("text name column"),
            score: row.value(2).expect("real score column"),
            active: row.value(3).expect("boolean active column"),
        }
    }
}

/// Raw `rusqlite` baseline using a cached prepared statement on a single connection.
fn benchmark_rusqlite_direct(
    group: &mut criterion::BenchmarkGroup<'_, criterion::measurement::WallTime>,
) {
    let ids = Arc::clone(&DATASET.ids);
    let connection = Connection::open(&DATASET.path).expect("open sqlite connection");

    group.bench_function(BenchmarkId::new("rusqlite", ids.len()), |b| {
        b.iter_custom(|iters| {
            let mut stmt = connection
                .prepare_cached(LOOKUP_SQL)
                .expect("prepare select statement");
            let mut total = Duration::default();
            for _ in 0..iters {
                let start = Instant::now();
                for &id in ids.iter() {
                    let row = stmt
                        .query_row([id], BenchRow::from_rusqlite)
                        .expect("query row");
                    black_box(row);
                }
                total += start.elapsed();
            }
            total
        });
    });
}

/// One synchronous round trip through the worker per lookup.
fn benchmark_queue_per_lookup(
    group: &mut criterion::BenchmarkGroup<'_, criterion::measurement::WallTime>,
) {
    let ids = Arc::clone(&DATASET.ids);
    let queue = SqlQueue::open(DATASET.path.clone()).expect("open queue");

    group.bench_function(BenchmarkId::new("queue_per_lookup", ids.len()), |b| {
        b.iter_custom(|iters| {
            let mut total = Duration::default();
            for _ in 0..iters {
                let start = Instant::now();
                for &id in ids.iter() {
                    let rows = queue
                        .run_synchronously(move |conn| {
                            conn.prepare(LOOKUP_SQL)?
                                .reset_bind_step_all(&[Value::Integer(id)])
                        })
                        .expect("queue lookup");
                    black_box(BenchRow::from_row(&rows[0]));
                }
                total += start.elapsed();
            }
            total
        });
    });
}

/// Every lookup inside a single unit of work, reusing one statement.
fn benchmark_queue_batched(
    group: &mut criterion::BenchmarkGroup<'_, criterion::measurement::WallTime>,
) {
    let ids = Arc::clone(&DATASET.ids);
    let queue = SqlQueue::open(DATASET.path.clone()).expect("open queue");

    group.bench_function(BenchmarkId::new("queue_batched", ids.len()), |b| {
        b.iter_custom(|iters| {
            let mut total = Duration::default();
            for _ in 0..iters {
                let ids = Arc::clone(&ids);
                let start = Instant::now();
                queue
                    .run_synchronously(move |conn| {
                        let mut stmt = conn.prepare(LOOKUP_SQL)?;
                        for &id in ids.iter() {
                            if let StepResult::Row(row) =
                                stmt.reset_bind_step(&[Value::Integer(id)])?
                            {
                                black_box(BenchRow::from_row(&row));
                            }
                        }
                        Ok(())
                    })
                    .expect("queue batch");
                total += start.elapsed();
            }
            total
        });
    });
}

fn sqlite_single_row_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("queue_single_row_lookup");
    let lookup_count = DATASET.ids.len() as u64;
    group.throughput(Throughput::Elements(lookup_count));

    benchmark_rusqlite_direct(&mut group);
    benchmark_queue_per_lookup(&mut group);
    benchmark_queue_batched(&mut group);

    group.finish();
}

criterion_group!(benches, sqlite_single_row_lookup);
criterion_main!(benches);
