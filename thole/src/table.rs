// Symmetric-by-convention table indexed by two atom types, 1-based.
#[derive(Debug, Clone, PartialEq)]
pub struct PairTable<T> {
    n: usize,
    data: Vec<T>,
}

impl<T: Copy> PairTable<T> {
    pub fn new(ntypes: usize, init: T) -> PairTable<T> {
        let n = ntypes + 1;

        PairTable {
            n,
            data: vec![init; n * n],
        }
    }

    pub fn ntypes(&self) -> usize {
        self.n - 1
    }

    pub fn get(&self, i: usize, j: usize) -> T {
        self.data[i * self.n + j]
    }

    pub fn set(&mut self, i: usize, j: usize, val: T) {
        self.data[i * self.n + j] = val;
    }

    /// Copy `[i][j]` into `[j][i]`.
    pub fn mirror(&mut self, i: usize, j: usize) {
        let val = self.get(i, j);
        self.set(j, i, val);
    }
}
