use std::fmt;
use std::ops::{Add, AddAssign, Div, Mul, MulAssign, Neg, Sub, SubAssign};

use crate::Vector3;

pub type Vector3f64 = Vector3<f64>;

impl Vector3f64 {
    pub fn dot_product(&self, other: &Vector3f64) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn norm2(&self) -> f64 {
        self.norm2_squared().sqrt()
    }

    pub fn norm2_squared(&self) -> f64 {
        self.x * self.x + self.y * self.y + self.z * self.z
    }

    // (xx, yy, zz, xy, xz, yz) of the outer product with another vector
    pub fn outer_voigt(&self, other: &Vector3f64) -> [f64; 6] {
        [
            self.x * other.x,
            self.y * other.y,
            self.z * other.z,
            self.x * other.y,
            self.x * other.z,
            self.y * other.z,
        ]
    }
}

impl Add<Vector3f64> for Vector3f64 {
    type Output = Vector3f64;

    fn add(self, rhs: Vector3f64) -> Vector3f64 {
        Vector3f64 {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
            z: self.z + rhs.z,
        }
    }
}

impl Sub<Vector3f64> for Vector3f64 {
    type Output = Vector3f64;

    fn sub(self, rhs: Vector3f64) -> Vector3f64 {
        Vector3f64 {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
            z: self.z - rhs.z,
        }
    }
}

impl AddAssign<Vector3f64> for Vector3f64 {
    fn add_assign(&mut self, rhs: Vector3f64) {
        self.x += rhs.x;
        self.y += rhs.y;
        self.z += rhs.z;
    }
}

impl SubAssign<Vector3f64> for Vector3f64 {
    fn sub_assign(&mut self, rhs: Vector3f64) {
        self.x -= rhs.x;
        self.y -= rhs.y;
        self.z -= rhs.z;
    }
}

impl Neg for Vector3f64 {
    type Output = Vector3f64;

    fn neg(self) -> Vector3f64 {
        Vector3f64::new(-self.x, -self.y, -self.z)
    }
}

impl Mul<Vector3f64> for Vector3f64 {
    type Output = f64;

    fn mul(self, rhs: Vector3f64) -> f64 {
        self.x * rhs.x + self.y * rhs.y + self.z * rhs.z
    }
}

impl Mul<f64> for Vector3f64 {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self {
        Vector3f64::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Mul<Vector3f64> for f64 {
    type Output = Vector3f64;

    fn mul(self, rhs: Vector3f64) -> Vector3f64 {
        Vector3f64::new(self * rhs.x, self * rhs.y, self * rhs.z)
    }
}

impl MulAssign<f64> for Vector3f64 {
    fn mul_assign(&mut self, rhs: f64) {
        self.x *= rhs;
        self.y *= rhs;
        self.z *= rhs;
    }
}

impl Div<f64> for Vector3f64 {
    type Output = Self;

    fn div(self, rhs: f64) -> Self {
        Vector3f64::new(self.x / rhs, self.y / rhs, self.z / rhs)
    }
}

impl fmt::Display for Vector3f64 {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {} {}", self.x, self.y, self.z)
    }
}
