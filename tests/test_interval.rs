use std::{
    sync::Arc,
    thread,
    time::{Duration, Instant},
};

use batchwriter::{BatchWriterConfig, BatchingWriter, BoxError, FlushHandler};
use parking_lot::Mutex;

struct TmpReceiver {
    flushed_at: Arc<Mutex<Vec<(Instant, Vec<u32>)>>>,
}

impl FlushHandler<u32> for TmpReceiver {
    fn flush(&self, batch: &[u32]) -> Result<(), BoxError> {
        self.flushed_at.lock().push((Instant::now(), batch.to_vec()));
        Ok(())
    }
}

#[test]
fn test_shorter_interval_takes_effect() {
    let flushed_at = Arc::new(Mutex::new(Vec::new()));
    let writer = BatchingWriter::builder()
        .flush_interval(Duration::from_secs(30))
        .handler(TmpReceiver {
            flushed_at: flushed_at.clone(),
        })
        .build()
        .unwrap();

    writer.write(1).unwrap();

    let reset_at = Instant::now();
    writer
        .reset_flush_interval(Duration::from_millis(200))
        .unwrap();
    assert_eq!(writer.flush_interval(), Duration::from_millis(200));

    thread::sleep(Duration::from_millis(600));

    let lock = flushed_at.lock();
    assert_eq!(lock.len(), 1);

    let (at, batch) = &lock[0];
    assert_eq!(batch, &vec![1]);

    let elapsed = at.duration_since(reset_at);
    assert!(elapsed >= Duration::from_millis(150), "{:?}", elapsed);
    assert!(elapsed < Duration::from_millis(500), "{:?}", elapsed);
}

#[test]
fn test_longer_interval_postpones_flush() {
    let flushed_at = Arc::new(Mutex::new(Vec::new()));
    let writer = BatchingWriter::builder()
        .flush_interval(Duration::from_millis(100))
        .handler(TmpReceiver {
            flushed_at: flushed_at.clone(),
        })
        .build()
        .unwrap();

    writer.reset_flush_interval(Duration::from_secs(30)).unwrap();
    writer.write(1).unwrap();

    thread::sleep(Duration::from_millis(400));
    assert!(flushed_at.lock().is_empty());

    writer.stop();
    assert_eq!(flushed_at.lock().len(), 1);
}

#[test]
fn test_zero_interval_is_paced() {
    let flushed_at = Arc::new(Mutex::new(Vec::new()));
    let writer = BatchingWriter::builder()
        .config(BatchWriterConfig {
            flush_interval: Duration::ZERO,
            settle_duration: Duration::from_millis(20),
            ..Default::default()
        })
        .handler(TmpReceiver {
            flushed_at: flushed_at.clone(),
        })
        .build()
        .unwrap();

    for i in 0..10 {
        writer.write(i).unwrap();
        thread::sleep(Duration::from_millis(5));
    }

    writer.stop();

    let lock = flushed_at.lock();
    assert!(lock.len() < 10, "{} flushes", lock.len());
    assert_eq!(
        lock.iter().flat_map(|(_, b)| b.iter().copied()).collect::<Vec<_>>(),
        (0..10).collect::<Vec<_>>()
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_periodic_flush_from_async_context() {
    let flushed_at = Arc::new(Mutex::new(Vec::new()));
    let writer = BatchingWriter::builder()
        .flush_interval(Duration::from_millis(50))
        .handler(TmpReceiver {
            flushed_at: flushed_at.clone(),
        })
        .build()
        .unwrap();

    writer.write(7).unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(flushed_at.lock().len(), 1);

    writer.write(8).unwrap();
    tokio::task::spawn_blocking(move || writer.stop())
        .await
        .unwrap();

    let batches = flushed_at
        .lock()
        .iter()
        .map(|(_, b)| b.clone())
        .collect::<Vec<_>>();
    assert_eq!(batches, vec![vec![7], vec![8]]);
}
