use std::time::Duration;

use batchwriter::{BatchingWriter, BoxError, FlushHandler};

#[derive(Debug, Clone)]
struct Metric {
    name: &'static str,
    value: f64,
}

struct StdoutSink;

impl FlushHandler<Metric> for StdoutSink {
    fn flush(&self, batch: &[Metric]) -> Result<(), BoxError> {
        println!("---> [metric; {}]", batch.len());
        for m in batch {
            println!("     {} = {}", m.name, m.value);
        }

        Ok(())
    }
}

fn main() -> Result<(), BoxError> {
    env_logger::init();

    let writer = BatchingWriter::builder()
        .buffer_size(4)
        .flush_interval(Duration::from_secs(1))
        .handler(StdoutSink)
        .build()?;

    for i in 0..6 {
        writer.write(Metric {
            name: "cpu",
            value: i as f64 * 0.5,
        })?;
    }

    std::thread::sleep(Duration::from_millis(1500));

    writer.write(Metric {
        name: "mem",
        value: 42.0,
    })?;
    writer.flush()?;

    writer.write(Metric {
        name: "disk",
        value: 0.25,
    })?;

    println!("stopping");
    writer.stop();
    println!("{:?}", writer.stats());

    Ok(())
}
