//! Homogeneous 3x3 / 4x4 matrix algebra.
//!
//! Matrices are `nalgebra` static matrices indexed row-major as `m[(row, col)]`.
//! Determinant and inverse are written out explicitly so that a singular
//! camera orientation is reported as `None` instead of producing NaN.
use nalgebra::{Matrix3, Matrix4, SMatrix, Vector3};

/// Rotation axis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

/// Transform builder and matrix operations
pub struct Transform;

impl Transform {
    pub fn identity() -> Matrix4<f64> {
        Matrix4::identity()
    }

    /// Rotation about `axis` by `angle` radians.
    ///
    /// The cosine/sine block is written into an identity matrix at the
    /// rows/columns orthogonal to the axis.
    pub fn rotation(axis: Axis, angle: f64) -> Matrix4<f64> {
        let mut m = Matrix4::identity();
        write_rotation_block(&mut m, axis, angle);
        m
    }

    /// 3x3 variant of [`Transform::rotation`].
    pub fn rotation3(axis: Axis, angle: f64) -> Matrix3<f64> {
        let mut m = Matrix3::identity();
        write_rotation_block(&mut m, axis, angle);
        m
    }

    /// Identity with `v` written into the last column.
    pub fn translation(v: &Vector3<f64>) -> Matrix4<f64> {
        let mut m = Matrix4::identity();
        m[(0, 3)] = v.x;
        m[(1, 3)] = v.y;
        m[(2, 3)] = v.z;
        m
    }

    /// `Rz · Ry · Rx` orientation from angles in radians.
    pub fn orientation3(angle_x: f64, angle_y: f64, angle_z: f64) -> Matrix3<f64> {
        let rz = Self::rotation3(Axis::Z, angle_z);
        let ry = Self::rotation3(Axis::Y, angle_y);
        let rx = Self::rotation3(Axis::X, angle_x);
        Self::multiply(&Self::multiply(&rz, &ry), &rx)
    }

    /// `A · B` by plain accumulation.
    pub fn multiply<const N: usize>(
        a: &SMatrix<f64, N, N>,
        b: &SMatrix<f64, N, N>,
    ) -> SMatrix<f64, N, N> {
        SMatrix::<f64, N, N>::from_fn(|i, j| (0..N).map(|k| a[(i, k)] * b[(k, j)]).sum())
    }

    pub fn scalar_multiply<const N: usize>(m: &SMatrix<f64, N, N>, a: f64) -> SMatrix<f64, N, N> {
        SMatrix::<f64, N, N>::from_fn(|i, j| m[(i, j)] * a)
    }

    /// Applies `m` to the homogeneous point `(x, y, z, 1)` and returns the top
    /// three rows. This is an affine transform; the fourth row is ignored.
    pub fn vector_multiply(m: &Matrix4<f64>, p: &Vector3<f64>) -> Vector3<f64> {
        let a = [p.x, p.y, p.z, 1.0];
        let row = |i: usize| (0..4).map(|j| m[(i, j)] * a[j]).sum::<f64>();
        Vector3::new(row(0), row(1), row(2))
    }

    pub fn vector_multiply3(m: &Matrix3<f64>, p: &Vector3<f64>) -> Vector3<f64> {
        let a = [p.x, p.y, p.z];
        let row = |i: usize| (0..3).map(|j| m[(i, j)] * a[j]).sum::<f64>();
        Vector3::new(row(0), row(1), row(2))
    }

    pub fn determinant3(m: &Matrix3<f64>) -> f64 {
        let m = |i: usize, j: usize| m[(i, j)];
        m(0, 0) * m(1, 1) * m(2, 2)
            + m(0, 1) * m(1, 2) * m(2, 0)
            + m(0, 2) * m(1, 0) * m(2, 1)
            - m(0, 0) * m(1, 2) * m(2, 1)
            - m(0, 1) * m(1, 0) * m(2, 2)
            - m(0, 2) * m(1, 1) * m(2, 0)
    }

    /// Full 24-term expansion of the 4x4 determinant.
    pub fn determinant(m: &Matrix4<f64>) -> f64 {
        let m = |i: usize, j: usize| m[(i, j)];
        m(0, 0) * m(1, 1) * m(2, 2) * m(3, 3)
            + m(0, 0) * m(1, 2) * m(2, 3) * m(3, 1)
            + m(0, 0) * m(1, 3) * m(2, 1) * m(3, 2)
            + m(0, 1) * m(1, 0) * m(2, 3) * m(3, 2)
            + m(0, 1) * m(1, 2) * m(2, 0) * m(3, 3)
            + m(0, 1) * m(1, 3) * m(2, 2) * m(3, 0)
            + m(0, 2) * m(1, 0) * m(2, 1) * m(3, 3)
            + m(0, 2) * m(1, 1) * m(2, 3) * m(3, 0)
            + m(0, 2) * m(1, 3) * m(2, 0) * m(3, 1)
            + m(0, 3) * m(1, 0) * m(2, 2) * m(3, 1)
            + m(0, 3) * m(1, 1) * m(2, 0) * m(3, 2)
            + m(0, 3) * m(1, 2) * m(2, 1) * m(3, 0)
            - m(0, 0) * m(1, 1) * m(2, 3) * m(3, 2)
            - m(0, 0) * m(1, 2) * m(2, 1) * m(3, 3)
            - m(0, 0) * m(1, 3) * m(2, 2) * m(3, 1)
            - m(0, 1) * m(1, 0) * m(2, 2) * m(3, 3)
            - m(0, 1) * m(1, 2) * m(2, 3) * m(3, 0)
            - m(0, 1) * m(1, 3) * m(2, 0) * m(3, 2)
            - m(0, 2) * m(1, 0) * m(2, 3) * m(3, 1)
            - m(0, 2) * m(1, 1) * m(2, 0) * m(3, 3)
            - m(0, 2) * m(1, 3) * m(2, 1) * m(3, 0)
            - m(0, 3) * m(1, 0) * m(2, 1) * m(3, 2)
            - m(0, 3) * m(1, 1) * m(2, 2) * m(3, 0)
            - m(0, 3) * m(1, 2) * m(2, 0) * m(3, 1)
    }

    /// Adjugate scaled by `1 / det`. Returns `None` when the determinant is exactly zero.
    pub fn inverse(m: &Matrix4<f64>) -> Option<Matrix4<f64>> {
        let det = Self::determinant(m);
        if det == 0.0 || !det.is_finite() {
            return None;
        }
        let m = |i: usize, j: usize| m[(i, j)];
        let mut adj = Matrix4::zeros();

        adj[(0, 0)] = m(1, 1) * m(2, 2) * m(3, 3)
            + m(1, 2) * m(2, 3) * m(3, 1)
            + m(1, 3) * m(2, 1) * m(3, 2)
            - m(1, 1) * m(2, 3) * m(3, 2)
            - m(1, 2) * m(2, 1) * m(3, 3)
            - m(1, 3) * m(2, 2) * m(3, 1);
        adj[(0, 1)] = m(0, 1) * m(2, 3) * m(3, 2)
            + m(0, 2) * m(2, 1) * m(3, 3)
            + m(0, 3) * m(2, 2) * m(3, 1)
            - m(0, 1) * m(2, 2) * m(3, 3)
            - m(0, 2) * m(2, 3) * m(3, 1)
            - m(0, 3) * m(2, 1) * m(3, 2);
        adj[(0, 2)] = m(0, 1) * m(1, 2) * m(3, 3)
            + m(0, 2) * m(1, 3) * m(3, 1)
            + m(0, 3) * m(1, 1) * m(3, 2)
            - m(0, 1) * m(1, 3) * m(3, 2)
            - m(0, 2) * m(1, 1) * m(3, 3)
            - m(0, 3) * m(1, 2) * m(3, 1);
        adj[(0, 3)] = m(0, 1) * m(1, 3) * m(2, 2)
            + m(0, 2) * m(1, 1) * m(2, 3)
            + m(0, 3) * m(1, 2) * m(2, 1)
            - m(0, 1) * m(1, 2) * m(2, 3)
            - m(0, 2) * m(1, 3) * m(2, 1)
            - m(0, 3) * m(1, 1) * m(2, 2);

        adj[(1, 0)] = m(1, 0) * m(2, 3) * m(3, 2)
            + m(1, 2) * m(2, 0) * m(3, 3)
            + m(1, 3) * m(2, 2) * m(3, 0)
            - m(1, 0) * m(2, 2) * m(3, 3)
            - m(1, 2) * m(2, 3) * m(3, 0)
            - m(1, 3) * m(2, 0) * m(3, 2);
        adj[(1, 1)] = m(0, 0) * m(2, 2) * m(3, 3)
            + m(0, 2) * m(2, 3) * m(3, 0)
            + m(0, 3) * m(2, 0) * m(3, 2)
            - m(0, 0) * m(2, 3) * m(3, 2)
            - m(0, 2) * m(2, 0) * m(3, 3)
            - m(0, 3) * m(2, 2) * m(3, 0);
        adj[(1, 2)] = m(0, 0) * m(1, 3) * m(3, 2)
            + m(0, 2) * m(1, 0) * m(3, 3)
            + m(0, 3) * m(1, 2) * m(3, 0)
            - m(0, 0) * m(1, 2) * m(3, 3)
            - m(0, 2) * m(1, 3) * m(3, 0)
            - m(0, 3) * m(1, 0) * m(3, 2);
        adj[(1, 3)] = m(0, 0) * m(1, 2) * m(2, 3)
            + m(0, 2) * m(1, 3) * m(2, 0)
            + m(0, 3) * m(1, 0) * m(2, 2)
            - m(0, 0) * m(1, 3) * m(2, 2)
            - m(0, 2) * m(1, 0) * m(2, 3)
            - m(0, 3) * m(1, 2) * m(2, 0);

        adj[(2, 0)] = m(1, 0) * m(2, 1) * m(3, 3)
            + m(1, 1) * m(2, 3) * m(3, 0)
            + m(1, 3) * m(2, 0) * m(3, 1)
            - m(1, 0) * m(2, 3) * m(3, 1)
            - m(1, 1) * m(2, 0) * m(3, 3)
            - m(1, 3) * m(2, 1) * m(3, 0);
        adj[(2, 1)] = m(0, 0) * m(2, 3) * m(3, 1)
            + m(0, 1) * m(2, 0) * m(3, 3)
            + m(0, 3) * m(2, 1) * m(3, 0)
            - m(0, 0) * m(2, 1) * m(3, 3)
            - m(0, 1) * m(2, 3) * m(3, 0)
            - m(0, 3) * m(2, 0) * m(3, 1);
        adj[(2, 2)] = m(0, 0) * m(1, 1) * m(3, 3)
            + m(0, 1) * m(1, 3) * m(3, 0)
            + m(0, 3) * m(1, 0) * m(3, 1)
            - m(0, 0) * m(1, 3) * m(3, 1)
            - m(0, 1) * m(1, 0) * m(3, 3)
            - m(0, 3) * m(1, 1) * m(3, 0);
        adj[(2, 3)] = m(0, 0) * m(1, 3) * m(2, 1)
            + m(0, 1) * m(1, 0) * m(2, 3)
            + m(0, 3) * m(1, 1) * m(2, 0)
            - m(0, 0) * m(1, 1) * m(2, 3)
            - m(0, 1) * m(1, 3) * m(2, 0)
            - m(0, 3) * m(1, 0) * m(2, 1);

        adj[(3, 0)] = m(1, 0) * m(2, 2) * m(3, 1)
            + m(1, 1) * m(2, 0) * m(3, 2)
            + m(1, 2) * m(2, 1) * m(3, 0)
            - m(1, 0) * m(2, 1) * m(3, 2)
            - m(1, 1) * m(2, 2) * m(3, 0)
            - m(1, 2) * m(2, 0) * m(3, 1);
        adj[(3, 1)] = m(0, 0) * m(2, 1) * m(3, 2)
            + m(0, 1) * m(2, 2) * m(3, 0)
            + m(0, 2) * m(2, 0) * m(3, 1)
            - m(0, 0) * m(2, 2) * m(3, 1)
            - m(0, 1) * m(2, 0) * m(3, 2)
            - m(0, 2) * m(2, 1) * m(3, 0);
        adj[(3, 2)] = m(0, 0) * m(1, 2) * m(3, 1)
            + m(0, 1) * m(1, 0) * m(3, 2)
            + m(0, 2) * m(1, 1) * m(3, 0)
            - m(0, 0) * m(1, 1) * m(3, 2)
            - m(0, 1) * m(1, 2) * m(3, 0)
            - m(0, 2) * m(1, 0) * m(3, 1);
        adj[(3, 3)] = m(0, 0) * m(1, 1) * m(2, 2)
            + m(0, 1) * m(1, 2) * m(2, 0)
            + m(0, 2) * m(1, 0) * m(2, 1)
            - m(0, 0) * m(1, 2) * m(2, 1)
            - m(0, 1) * m(1, 0) * m(2, 2)
            - m(0, 2) * m(1, 1) * m(2, 0);

        Some(Self::scalar_multiply(&adj, 1.0 / det))
    }

    pub fn inverse3(m: &Matrix3<f64>) -> Option<Matrix3<f64>> {
        let det = Self::determinant3(m);
        if det == 0.0 || !det.is_finite() {
            return None;
        }
        let m = |i: usize, j: usize| m[(i, j)];
        let adj = Matrix3::new(
            m(1, 1) * m(2, 2) - m(1, 2) * m(2, 1),
            m(0, 2) * m(2, 1) - m(0, 1) * m(2, 2),
            m(0, 1) * m(1, 2) - m(0, 2) * m(1, 1),
            m(1, 2) * m(2, 0) - m(1, 0) * m(2, 2),
            m(0, 0) * m(2, 2) - m(0, 2) * m(2, 0),
            m(0, 2) * m(1, 0) - m(0, 0) * m(1, 2),
            m(1, 0) * m(2, 1) - m(1, 1) * m(2, 0),
            m(0, 1) * m(2, 0) - m(0, 0) * m(2, 1),
            m(0, 0) * m(1, 1) - m(0, 1) * m(1, 0),
        );
        Some(Self::scalar_multiply(&adj, 1.0 / det))
    }
}

fn write_rotation_block<const N: usize>(m: &mut SMatrix<f64, N, N>, axis: Axis, angle: f64) {
    let (sin, cos) = angle.sin_cos();
    let (a, b) = match axis {
        Axis::X => (1, 2),
        Axis::Y => (2, 0),
        Axis::Z => (0, 1),
    };
    // Y takes its pair in (z, x) order: [0][2] = sin, [2][0] = -sin.
    m[(a, a)] = cos;
    m[(a, b)] = -sin;
    m[(b, a)] = sin;
    m[(b, b)] = cos;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    fn assert_matrix_eq<const N: usize>(a: &SMatrix<f64, N, N>, b: &SMatrix<f64, N, N>) {
        for i in 0..N {
            for j in 0..N {
                assert!(
                    (a[(i, j)] - b[(i, j)]).abs() < 1e-9,
                    "mismatch at ({i}, {j}): {} vs {}",
                    a[(i, j)],
                    b[(i, j)]
                );
            }
        }
    }

    #[test]
    fn test_identity_rotation() {
        let matrix = Transform::rotation(Axis::X, 0.0);
        assert_matrix_eq(&matrix, &Transform::identity());
    }

    #[test]
    fn test_rotation_blocks() {
        let rx = Transform::rotation(Axis::X, FRAC_PI_2);
        assert!((rx[(1, 2)] + 1.0).abs() < 1e-12);
        assert!((rx[(2, 1)] - 1.0).abs() < 1e-12);

        let ry = Transform::rotation(Axis::Y, FRAC_PI_2);
        assert!((ry[(0, 2)] - 1.0).abs() < 1e-12);
        assert!((ry[(2, 0)] + 1.0).abs() < 1e-12);

        let rz = Transform::rotation(Axis::Z, FRAC_PI_2);
        assert!((rz[(0, 1)] + 1.0).abs() < 1e-12);
        assert!((rz[(1, 0)] - 1.0).abs() < 1e-12);

        // Z rotation by 90 degrees maps x onto y.
        let v = Transform::vector_multiply(&rz, &Vector3::new(1.0, 0.0, 0.0));
        assert!((v - Vector3::new(0.0, 1.0, 0.0)).norm() < 1e-12);
    }

    #[test]
    fn test_multiply_matches_nalgebra() {
        let a = Transform::rotation(Axis::Y, 0.4);
        let b = Transform::translation(&Vector3::new(1.0, -2.0, 3.5));
        assert_matrix_eq(&Transform::multiply(&a, &b), &(a * b));
    }

    #[test]
    fn test_translation_moves_points() {
        let t = Transform::translation(&Vector3::new(1.0, 2.0, 3.0));
        let v = Transform::vector_multiply(&t, &Vector3::new(1.0, 1.0, 1.0));
        assert_eq!(v, Vector3::new(2.0, 3.0, 4.0));
    }

    #[test]
    fn test_determinant() {
        assert!((Transform::determinant(&Transform::identity()) - 1.0).abs() < 1e-12);
        let scaled = Transform::scalar_multiply(&Transform::identity(), 2.0);
        assert!((Transform::determinant(&scaled) - 16.0).abs() < 1e-12);

        let m = Matrix4::new(
            3.0, 2.0, 0.0, 1.0, //
            4.0, 0.0, 1.0, 2.0, //
            3.0, 0.0, 2.0, 1.0, //
            9.0, 2.0, 3.0, 1.0,
        );
        assert!((Transform::determinant(&m) - m.determinant()).abs() < 1e-9);
        let m3 = Matrix3::new(2.0, 0.0, 1.0, 1.0, 3.0, 2.0, 1.0, 1.0, 2.0);
        assert!((Transform::determinant3(&m3) - 6.0).abs() < 1e-12);
    }

    #[test]
    fn test_inverse_round_trip() {
        let m = Transform::multiply(
            &Transform::multiply(
                &Transform::multiply(
                    &Transform::rotation(Axis::Z, 0.3),
                    &Transform::rotation(Axis::Y, -1.1),
                ),
                &Transform::rotation(Axis::X, 2.0),
            ),
            &Transform::translation(&Vector3::new(0.5, -4.0, 7.5)),
        );
        let inv = Transform::inverse(&m).expect("rotation-translation is invertible");
        assert_matrix_eq(&Transform::multiply(&m, &inv), &Transform::identity());
        assert_matrix_eq(&Transform::multiply(&inv, &m), &Transform::identity());
    }

    #[test]
    fn test_singular_has_no_inverse() {
        let mut m = Transform::identity();
        m[(2, 2)] = 0.0;
        assert!(Transform::inverse(&m).is_none());
        assert!(Transform::inverse(&Matrix4::zeros()).is_none());
        assert!(Transform::inverse3(&Matrix3::zeros()).is_none());
    }

    #[test]
    fn test_inverse3_round_trip() {
        let m = Transform::orientation3(0.2, 0.7, -0.4);
        let inv = Transform::inverse3(&m).expect("rotation is invertible");
        assert_matrix_eq(&Transform::multiply(&m, &inv), &Matrix3::identity());
    }
}
