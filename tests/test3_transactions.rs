use sqlkit::prelude::*;

fn snapshot(queue: &SqlQueue) -> Result<Vec<Row>, SqlError> {
    queue.run_synchronously(|conn| conn.prepare("SELECT * FROM acct ORDER BY id")?.step_all())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

fn seeded() -> Result<SqlQueue, SqlError> {
    init_tracing();
    let queue = SqlQueue::open(":memory:")?;
    queue.run_synchronously(|conn| {
        conn.execute_batch(
            "CREATE TABLE acct (id INTEGER PRIMARY KEY, balance INTEGER NOT NULL CHECK (balance >= 0));
             INSERT INTO acct VALUES (1, 100), (2, 0);",
        )
    })?;
    Ok(queue)
}

fn transfer(conn: &Connection, amount: i64) -> SqlResult<()> {
    conn.execute("UPDATE acct SET balance = balance + ? WHERE id = 2", &params![amount])?;
    conn.execute("UPDATE acct SET balance = balance - ? WHERE id = 1", &params![amount])
}

#[test]
fn rollback_leaves_state_untouched() -> Result<(), SqlError> {
    let queue = seeded()?;
    let before = snapshot(&queue)?;
    let outcome = queue.transaction_synchronously(|conn| {
        transfer(conn, 60)?;
        conn.execute("DELETE FROM acct WHERE id = 2", &[])?;
        conn.execute("INSERT INTO acct VALUES (3, 5)", &[])?;
        Ok(TxOutcome::Rollback)
    })?;
    assert_eq!(outcome, TxOutcome::Rollback);
    assert_eq!(snapshot(&queue)?, before);
    Ok(())
}

#[test]
fn failing_work_rolls_back_and_surfaces_the_root_cause() -> Result<(), SqlError> {
    let queue = seeded()?;
    let before = snapshot(&queue)?;
    let err = queue
        .transaction_synchronously(|conn| {
            transfer(conn, 150)?;
            Ok(TxOutcome::Commit)
        })
        .expect_err("check constraint");
    assert!(matches!(err, SqlError::Step { .. }), "{err}");
    assert!(err.message().contains("CHECK"), "{}", err.message());
    assert_eq!(snapshot(&queue)?, before);
    Ok(())
}

#[test]
fn commit_keeps_every_write() -> Result<(), SqlError> {
    let queue = seeded()?;
    queue.transaction_synchronously(|conn| {
        transfer(conn, 40)?;
        Ok(TxOutcome::Commit)
    })?;
    let balances: Vec<_> = snapshot(&queue)?
        .iter()
        .map(|row| row.value_by_name::<i64>("balance"))
        .collect();
    assert_eq!(balances, vec![Some(60), Some(40)]);
    Ok(())
}

#[tokio::test]
async fn async_and_completion_variants_agree() -> Result<(), SqlError> {
    let queue = seeded()?;
    let outcome = queue
        .transaction_async(|conn| {
            transfer(conn, 10)?;
            Ok(TxOutcome::Commit)
        })
        .await?;
    assert!(outcome.is_commit());

    let (tx, rx) = tokio::sync::oneshot::channel();
    queue.transaction_with_completion(
        |conn| {
            transfer(conn, 1000)?;
            Ok(TxOutcome::Commit)
        },
        move |result| {
            let _ = tx.send(result);
        },
    );
    let result = rx.await.expect("completion runs");
    assert!(matches!(result, Err(SqlError::Step { .. })));

    let balances = queue
        .run_async(|conn| {
            let rows = conn.prepare("SELECT balance FROM acct ORDER BY id")?.step_all()?;
            Ok(rows.iter().map(|row| row.value::<i64>(0)).collect::<Vec<_>>())
        })
        .await?;
    assert_eq!(balances, vec![Some(90), Some(10)]);
    Ok(())
}

#[test]
fn exclusive_lock_blocks_a_second_writer() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("locked.db").to_string_lossy().into_owned();
    let holder = SqlQueue::open(path.clone())?;
    let other = SqlQueue::open(path)?;
    holder.run_synchronously(|conn| conn.execute_batch("CREATE TABLE t (x)"))?;

    let busy_code = holder.run_synchronously(move |conn| {
        let mut busy_code = None;
        conn.transaction(|conn| {
            conn.execute("INSERT INTO t VALUES (1)", &[])?;
            // A second connection cannot even begin while the lock is held.
            busy_code = other
                .transaction_synchronously(|_| Ok(TxOutcome::Commit))
                .err()
                .map(|err| err.code());
            Ok(TxOutcome::Commit)
        })?;
        Ok(busy_code)
    })?;
    assert_eq!(busy_code, Some(rusqlite::ffi::SQLITE_BUSY));

    let rows = holder.run_synchronously(|conn| conn.prepare("SELECT x FROM t")?.step_all())?;
    assert_eq!(rows.len(), 1);
    Ok(())
}
