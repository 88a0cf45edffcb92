use crate::Comm;

use mpi_sys::*;
use std::os::raw::*;
use std::ptr;

pub trait MPIDataType {
    fn get_mpi_data_type() -> MpiDatatype;
}

impl MPIDataType for f64 {
    fn get_mpi_data_type() -> MpiDatatype {
        MPI_DOUBLE
    }
}

impl MPIDataType for i64 {
    fn get_mpi_data_type() -> MpiDatatype {
        MPI_LONG_LONG
    }
}

pub fn init() -> i32 {
    unsafe { MPI_Init(ptr::null(), ptr::null()) }
}

pub fn finalize() -> i32 {
    unsafe { MPI_Finalize() }
}

pub fn comm_rank(comm: MpiComm) -> i32 {
    let mut rank = 0;
    unsafe { MPI_Comm_rank(comm, &mut rank) };
    rank
}

pub fn comm_size(comm: MpiComm) -> i32 {
    let mut size = 0;
    unsafe { MPI_Comm_size(comm, &mut size) };
    size
}

pub fn all_reduce_sum<T: MPIDataType + Default + Clone>(sbuf: &[T], comm: MpiComm) -> Vec<T> {
    let mut dbuf = vec![T::default(); sbuf.len()];

    unsafe {
        MPI_Allreduce(
            sbuf.as_ptr() as *const c_void,
            dbuf.as_mut_ptr() as *mut c_void,
            sbuf.len() as i32,
            T::get_mpi_data_type(),
            MPI_SUM,
            comm,
        );
    }

    dbuf
}

pub fn sendrecv_scalar<T: MPIDataType + Default>(
    sbuf: &T,
    dest: i32,
    source: i32,
    tag: i32,
    comm: MpiComm,
) -> T {
    let mut rbuf = T::default();

    unsafe {
        let mut status: MPI_Status = Default::default();

        MPI_Sendrecv(
            sbuf as *const T as *const c_void,
            1,
            T::get_mpi_data_type(),
            dest,
            tag,
            &mut rbuf as *mut T as *mut c_void,
            1,
            T::get_mpi_data_type(),
            source,
            tag,
            comm,
            &mut status,
        );
    }

    rbuf
}

pub fn sendrecv_slice<T: MPIDataType>(
    sbuf: &[T],
    rbuf: &mut [T],
    dest: i32,
    source: i32,
    tag: i32,
    comm: MpiComm,
) -> i32 {
    unsafe {
        let mut status: MPI_Status = Default::default();

        MPI_Sendrecv(
            sbuf.as_ptr() as *const c_void,
            sbuf.len() as i32,
            T::get_mpi_data_type(),
            dest,
            tag,
            rbuf.as_mut_ptr() as *mut c_void,
            rbuf.len() as i32,
            T::get_mpi_data_type(),
            source,
            tag,
            comm,
            &mut status,
        )
    }
}

const RING_TAG: i32 = 4;

/// Communicator over MPI_COMM_WORLD. `init()` must have been called.
#[derive(Debug, Clone, Copy)]
pub struct MpiWorld {
    comm: MpiComm,
    rank: usize,
    size: usize,
}

impl MpiWorld {
    pub fn new() -> MpiWorld {
        MpiWorld {
            comm: MPI_COMM_WORLD,
            rank: comm_rank(MPI_COMM_WORLD) as usize,
            size: comm_size(MPI_COMM_WORLD) as usize,
        }
    }
}

impl Comm for MpiWorld {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.size
    }

    fn barrier(&self) {
        unsafe { MPI_Barrier(self.comm) };
    }

    fn all_sum_f64(&self, local: &[f64]) -> Vec<f64> {
        all_reduce_sum(local, self.comm)
    }

    fn all_sum_i64(&self, local: &[i64]) -> Vec<i64> {
        all_reduce_sum(local, self.comm)
    }

    fn ring_i64(&self, buf: &[i64], visit: &mut dyn FnMut(&[i64])) {
        visit(buf);

        let next = ((self.rank + 1) % self.size) as i32;
        let prev = ((self.rank + self.size - 1) % self.size) as i32;

        let mut current = buf.to_vec();

        for _ in 1..self.size {
            // sizes first, the buffers differ in length between ranks
            let nrecv: i64 =
                sendrecv_scalar(&(current.len() as i64), next, prev, RING_TAG, self.comm);

            let mut incoming = vec![0i64; nrecv as usize];
            sendrecv_slice(&current, &mut incoming, next, prev, RING_TAG, self.comm);

            current = incoming;
            visit(&current);
        }
    }
}
