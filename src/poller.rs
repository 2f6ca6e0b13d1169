use std::{
    sync::Arc,
    thread::{self, JoinHandle},
    time::Duration,
};

use futures::FutureExt;
use tokio::{
    sync::{mpsc, oneshot, watch},
    time::{self, Instant, Interval, MissedTickBehavior},
};

use crate::{
    buffer::{Shared, Trigger},
    config::BatchWriterConfig,
    error::Error,
};

/// Receiving ends of the signals a writer handle sends its flusher.
pub(crate) struct Control {
    pub flush_rx: mpsc::Receiver<()>,
    pub close_rx: oneshot::Receiver<()>,
    pub interval_rx: watch::Receiver<Duration>,
    pub ready_tx: oneshot::Sender<()>,
}

enum Wakeup {
    Close,
    Tick,
    Flush,
    Interval,
}

/// Starts the flusher on its own thread, driven by a single threaded runtime
/// so that timers keep firing whatever the caller's runtime is doing.
pub(crate) fn spawn<T: Send + 'static>(
    shared: Arc<Shared<T>>,
    ctl: Control,
) -> Result<JoinHandle<()>, Error> {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()?;

    let handle = thread::Builder::new()
        .name(String::from("batchwriter-flusher"))
        .spawn(move || rt.block_on(flush_poller(shared, ctl)))?;

    Ok(handle)
}

fn periodic(cfg: &BatchWriterConfig, interval: Duration) -> Interval {
    let period = cfg.effective_period(interval);
    let mut ticker = time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}

async fn flush_poller<T: Send + 'static>(shared: Arc<Shared<T>>, ctl: Control) {
    let Control {
        mut flush_rx,
        close_rx,
        mut interval_rx,
        ready_tx,
    } = ctl;

    let mut close_rx = close_rx.fuse();
    let mut ticker = periodic(&shared.cfg, *interval_rx.borrow());

    let _ = ready_tx.send(());
    shared.logger.debug(format_args!("flusher started"));

    loop {
        // A dropped sender means every handle is gone: treat it as close.
        let wakeup = futures::select_biased! {
            _ = close_rx => Wakeup::Close,
            changed = interval_rx.changed().fuse() => match changed {
                Ok(()) => Wakeup::Interval,
                Err(_) => Wakeup::Close,
            },
            _ = ticker.tick().fuse() => Wakeup::Tick,
            req = flush_rx.recv().fuse() => match req {
                Some(()) => Wakeup::Flush,
                None => Wakeup::Close,
            },
        };

        match wakeup {
            Wakeup::Tick => shared.flush(Trigger::Periodic),
            Wakeup::Flush => shared.flush(Trigger::Requested),
            Wakeup::Interval => {
                let interval = *interval_rx.borrow();
                ticker = periodic(&shared.cfg, interval);
                shared
                    .logger
                    .debug(format_args!("flush interval reset to {:?}", interval));
            }
            Wakeup::Close => {
                shared.flush(Trigger::Drain);
                break;
            }
        }
    }

    shared.logger.debug(format_args!("flusher exited"));
}
