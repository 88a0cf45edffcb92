#![allow(non_snake_case, non_camel_case_types, non_upper_case_globals)]
use std::os::raw::*;

pub type MpiComm = c_int;
pub type MpiDatatype = c_int;
pub type MpiOp = c_int;

pub const MPI_SUM: MpiOp = 0x58000003;

pub const MPI_COMM_WORLD: MpiComm = 0x44000000;

pub const MPI_DOUBLE: MpiDatatype = 0x4c00080b;
pub const MPI_LONG_LONG_INT: MpiDatatype = 0x4c000809;
pub const MPI_LONG_LONG: MpiDatatype = MPI_LONG_LONG_INT;

#[repr(C)]
#[derive(Default)]
pub struct MPI_Status {
    count: c_int,
    cancelled: c_int,
    mpi_source: c_int,
    mpi_tag: c_int,
    mpi_error: c_int,
}

#[link(name = "mpich", kind = "dylib")]
extern "C" {
    pub fn MPI_Init(argc: *const c_int, argv: *const c_char) -> c_int;

    pub fn MPI_Finalize() -> c_int;

    pub fn MPI_Comm_rank(comm: MpiComm, rank: *mut c_int) -> c_int;

    pub fn MPI_Comm_size(comm: MpiComm, size: *mut c_int) -> c_int;

    pub fn MPI_Barrier(comm: MpiComm) -> c_int;

    pub fn MPI_Allreduce(
        sendbuf: *const c_void,
        recvbuf: *mut c_void,
        count: c_int,
        datatype: MpiDatatype,
        op: MpiOp,
        comm: MpiComm,
    ) -> c_int;

    pub fn MPI_Sendrecv(
        sendbuf: *const c_void,
        sendcount: c_int,
        sendtype: MpiDatatype,
        dest: c_int,
        sendtag: c_int,
        recvbuf: *mut c_void,
        recvcount: c_int,
        recvtype: MpiDatatype,
        source: c_int,
        recvtag: c_int,
        comm: MpiComm,
        status: *mut MPI_Status,
    ) -> c_int;
}
