use crate::Comm;

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Barrier};
use std::thread;

enum Message {
    I64(Vec<i64>),
    F64(Vec<f64>),
}

// In-process ranks, one OS thread each, wired by a full matrix of channels.
//
// A channel exists for every ordered (source, destination) pair so messages
// between two ranks are received in the order they were sent.
pub struct ThreadComm {
    rank: usize,
    size: usize,
    senders: Vec<Sender<Message>>,     // indexed by destination
    receivers: Vec<Receiver<Message>>, // indexed by source
    barrier: Arc<Barrier>,
}

impl ThreadComm {
    /// Build the communicators of `nranks` connected ranks.
    pub fn create(nranks: usize) -> Vec<ThreadComm> {
        assert!(nranks > 0);

        let mut tx_grid: Vec<Vec<Sender<Message>>> = Vec::with_capacity(nranks);
        let mut rx_grid: Vec<Vec<Option<Receiver<Message>>>> = (0..nranks)
            .map(|_| (0..nranks).map(|_| None).collect())
            .collect();

        for src in 0..nranks {
            let mut row = Vec::with_capacity(nranks);

            for rx_row in rx_grid.iter_mut() {
                let (tx, rx) = mpsc::channel();
                row.push(tx);
                rx_row[src] = Some(rx);
            }

            tx_grid.push(row);
        }

        let barrier = Arc::new(Barrier::new(nranks));

        tx_grid
            .into_iter()
            .zip(rx_grid)
            .enumerate()
            .map(|(rank, (senders, receivers))| ThreadComm {
                rank,
                size: nranks,
                senders,
                receivers: receivers.into_iter().flatten().collect(),
                barrier: Arc::clone(&barrier),
            })
            .collect()
    }

    fn send(&self, dest: usize, msg: Message) {
        if self.senders[dest].send(msg).is_err() {
            panic!("rank {}: rank {} left the communicator", self.rank, dest);
        }
    }

    fn recv_i64(&self, source: usize) -> Vec<i64> {
        match self.receivers[source].recv() {
            Ok(Message::I64(v)) => v,
            Ok(Message::F64(_)) => panic!(
                "rank {}: expected integer message from rank {}",
                self.rank, source
            ),
            Err(_) => panic!("rank {}: rank {} left the communicator", self.rank, source),
        }
    }

    fn recv_f64(&self, source: usize) -> Vec<f64> {
        match self.receivers[source].recv() {
            Ok(Message::F64(v)) => v,
            Ok(Message::I64(_)) => panic!(
                "rank {}: expected floating-point message from rank {}",
                self.rank, source
            ),
            Err(_) => panic!("rank {}: rank {} left the communicator", self.rank, source),
        }
    }
}

impl Comm for ThreadComm {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.size
    }

    fn barrier(&self) {
        self.barrier.wait();
    }

    fn all_sum_f64(&self, local: &[f64]) -> Vec<f64> {
        for dest in (0..self.size).filter(|&r| r != self.rank) {
            self.send(dest, Message::F64(local.to_vec()));
        }

        // accumulate in rank order so every rank gets bitwise identical sums
        let mut sum = vec![0.0; local.len()];

        for source in 0..self.size {
            let part = if source == self.rank {
                local.to_vec()
            } else {
                self.recv_f64(source)
            };

            for (s, p) in sum.iter_mut().zip(part.iter()) {
                *s += *p;
            }
        }

        sum
    }

    fn all_sum_i64(&self, local: &[i64]) -> Vec<i64> {
        for dest in (0..self.size).filter(|&r| r != self.rank) {
            self.send(dest, Message::I64(local.to_vec()));
        }

        let mut sum = vec![0; local.len()];

        for source in 0..self.size {
            let part = if source == self.rank {
                local.to_vec()
            } else {
                self.recv_i64(source)
            };

            for (s, p) in sum.iter_mut().zip(part.iter()) {
                *s += *p;
            }
        }

        sum
    }

    fn ring_i64(&self, buf: &[i64], visit: &mut dyn FnMut(&[i64])) {
        visit(buf);

        let next = (self.rank + 1) % self.size;
        let prev = (self.rank + self.size - 1) % self.size;

        let mut current = buf.to_vec();

        for _ in 1..self.size {
            self.send(next, Message::I64(current));
            current = self.recv_i64(prev);
            visit(&current);
        }
    }
}

/// Run `f` on `nranks` in-process ranks and collect the per-rank results in
/// rank order.
pub fn run_ranks<R, F>(nranks: usize, f: F) -> Vec<R>
where
    R: Send,
    F: Fn(ThreadComm) -> R + Sync,
{
    let comms = ThreadComm::create(nranks);

    thread::scope(|s| {
        let handles: Vec<_> = comms
            .into_iter()
            .map(|comm| {
                let f = &f;
                s.spawn(move || f(comm))
            })
            .collect();

        handles
            .into_iter()
            .map(|h| match h.join() {
                Ok(r) => r,
                Err(e) => std::panic::resume_unwind(e),
            })
            .collect()
    })
}
