//! Collective communication between the ranks of a spatially decomposed run.
//!
//! Every backend provides the same small set of synchronous collectives:
//! global sums, a barrier, and a ring pass in which every rank's buffer
//! visits every rank exactly once.

mod thread;
pub use thread::*;

#[cfg(feature = "mpi")]
mod mpi;
#[cfg(feature = "mpi")]
pub use mpi::*;

pub trait Comm {
    fn rank(&self) -> usize;

    fn size(&self) -> usize;

    fn barrier(&self);

    /// Element-wise sum over all ranks; every rank receives the same result.
    fn all_sum_f64(&self, local: &[f64]) -> Vec<f64>;

    fn all_sum_i64(&self, local: &[i64]) -> Vec<i64>;

    /// Pass `buf` around the ring of ranks.
    ///
    /// `visit` is called once with this rank's own buffer, then once with the
    /// buffer of every other rank as it arrives from the left neighbour
    /// (rank-1, rank-2, ...). After `size() - 1` passes every rank has seen
    /// every buffer.
    fn ring_i64(&self, buf: &[i64], visit: &mut dyn FnMut(&[i64]));

    fn is_root(&self) -> bool {
        self.rank() == 0
    }

    fn all_sum_scalar_f64(&self, local: f64) -> f64 {
        self.all_sum_f64(&[local])[0]
    }

    fn all_sum_scalar_i64(&self, local: i64) -> i64 {
        self.all_sum_i64(&[local])[0]
    }
}

/// Single-rank communicator.
#[derive(Debug, Default, Clone, Copy)]
pub struct SerialComm;

impl SerialComm {
    pub fn new() -> SerialComm {
        SerialComm
    }
}

impl Comm for SerialComm {
    fn rank(&self) -> usize {
        0
    }

    fn size(&self) -> usize {
        1
    }

    fn barrier(&self) {}

    fn all_sum_f64(&self, local: &[f64]) -> Vec<f64> {
        local.to_vec()
    }

    fn all_sum_i64(&self, local: &[i64]) -> Vec<i64> {
        local.to_vec()
    }

    fn ring_i64(&self, buf: &[i64], visit: &mut dyn FnMut(&[i64])) {
        visit(buf);
    }
}

#[test]
fn test_serial_comm() {
    let comm = SerialComm::new();

    assert!(comm.is_root());
    assert_eq!(comm.size(), 1);
    assert_eq!(comm.all_sum_f64(&[1.5, 2.5]), vec![1.5, 2.5]);
    assert_eq!(comm.all_sum_scalar_i64(7), 7);

    let mut seen = Vec::new();
    comm.ring_i64(&[1, 2, 3], &mut |b| seen.extend_from_slice(b));
    assert_eq!(seen, vec![1, 2, 3]);
}
