//! Sample producer on its own thread, feeding fixed-size windows through a
//! bounded queue. A full queue blocks the producer; nothing is dropped.

use anyhow::{anyhow, Result};
use std::sync::mpsc::{self, Receiver};
use std::thread::{self, JoinHandle};

/// Windows buffered ahead of the consumer.
pub const QUEUE_DEPTH: usize = 2;

pub struct Capture {
    receiver: Receiver<Vec<f32>>,
    producer: JoinHandle<usize>,
}

impl Capture {
    /// Stream `samples` as windows of `window` samples, the last one
    /// zero-padded.
    pub fn spawn(samples: Vec<f32>, window: usize) -> Result<Self> {
        let (sender, receiver) = mpsc::sync_channel(QUEUE_DEPTH);
        let producer = thread::Builder::new()
            .name("capture".into())
            .spawn(move || {
                let mut sent = 0;
                for chunk in samples.chunks(window.max(1)) {
                    let mut buffer = chunk.to_vec();
                    buffer.resize(window, 0.0);
                    if sender.send(buffer).is_err() {
                        log::debug!("Capture consumer hung up after {} windows", sent);
                        break;
                    }
                    sent += 1;
                }
                sent
            })?;
        Ok(Self { receiver, producer })
    }

    /// Blocks until the next window is ready; `None` once the input ends.
    pub fn next_window(&self) -> Option<Vec<f32>> {
        self.receiver.recv().ok()
    }

    /// Stop consuming and return how many windows the producer sent.
    pub fn finish(self) -> Result<usize> {
        drop(self.receiver);
        self.producer
            .join()
            .map_err(|_| anyhow!("Capture thread panicked"))
    }
}
