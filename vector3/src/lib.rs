mod vector3_f64;
pub use vector3_f64::*;

///////////////////////////////////////////////////

#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Vector3<T> {
    pub x: T,
    pub y: T,
    pub z: T,
}

impl<T: num_traits::identities::Zero + Copy> Vector3<T> {
    #[inline]
    pub fn new(x: T, y: T, z: T) -> Self {
        Vector3 { x, y, z }
    }

    #[inline]
    pub fn zeros() -> Vector3<T> {
        Vector3 {
            x: T::zero(),
            y: T::zero(),
            z: T::zero(),
        }
    }

    pub fn to_array(&self) -> [T; 3] {
        [self.x, self.y, self.z]
    }

    pub fn from_slice(s: &[T]) -> Vector3<T> {
        Vector3 {
            x: s[0],
            y: s[1],
            z: s[2],
        }
    }

    #[inline]
    pub fn set_zeros(&mut self) {
        self.x = T::zero();
        self.y = T::zero();
        self.z = T::zero();
    }

    // Component by Cartesian index, 0 = x, 1 = y, 2 = z.
    #[inline]
    pub fn get(&self, idim: usize) -> T {
        match idim {
            0 => self.x,
            1 => self.y,
            _ => self.z,
        }
    }

    #[inline]
    pub fn set(&mut self, idim: usize, val: T) {
        match idim {
            0 => self.x = val,
            1 => self.y = val,
            _ => self.z = val,
        }
    }
}
