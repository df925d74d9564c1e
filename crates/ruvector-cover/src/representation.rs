//! Block-matrix generators for representation covers.
//!
//! A [`MatrixGenerator`] draws one fixed-size real orthogonal block per base
//! edge. Replacing the unit entries of a simple base graph with such blocks
//! (see [`build_matrix_cover`](crate::cover::build_matrix_cover)) realises
//! the cover associated with a group representation instead of a
//! permutation action.

use nalgebra::DMatrix;
use rand::Rng;

/// Capability: draw a `block_size x block_size` block.
pub trait MatrixGenerator {
    /// Side length of every block this generator produces.
    fn block_size(&self) -> usize;

    /// Draw one block.
    fn generate<R: Rng + ?Sized>(&self, rng: &mut R) -> DMatrix<f64>;

    /// Short generator name for logs.
    fn name(&self) -> &'static str;
}

/// The 4-dimensional real irreducible representation of the quaternion
/// group `Q8`.
///
/// Each draw is one of the eight signed basis matrices `±1, ±i, ±j, ±k`
/// with equal probability.
#[derive(Debug, Clone)]
pub struct QuaternionRepresentation {
    elements: [DMatrix<f64>; 8],
}

impl QuaternionRepresentation {
    /// Build the eight group elements.
    pub fn new() -> Self {
        #[rustfmt::skip]
        let one = DMatrix::from_row_slice(4, 4, &[
            1.0, 0.0, 0.0, 0.0,
            0.0, 1.0, 0.0, 0.0,
            0.0, 0.0, 1.0, 0.0,
            0.0, 0.0, 0.0, 1.0,
        ]);
        #[rustfmt::skip]
        let i = DMatrix::from_row_slice(4, 4, &[
            0.0, -1.0, 0.0,  0.0,
            1.0,  0.0, 0.0,  0.0,
            0.0,  0.0, 0.0, -1.0,
            0.0,  0.0, 1.0,  0.0,
        ]);
        #[rustfmt::skip]
        let j = DMatrix::from_row_slice(4, 4, &[
            0.0,  0.0, -1.0, 0.0,
            0.0,  0.0,  0.0, 1.0,
            1.0,  0.0,  0.0, 0.0,
            0.0, -1.0,  0.0, 0.0,
        ]);
        #[rustfmt::skip]
        let k = DMatrix::from_row_slice(4, 4, &[
            0.0, 0.0,  0.0, -1.0,
            0.0, 0.0, -1.0,  0.0,
            0.0, 1.0,  0.0,  0.0,
            1.0, 0.0,  0.0,  0.0,
        ]);

        Self {
            elements: [
                one.clone(),
                -one,
                i.clone(),
                -i,
                j.clone(),
                -j,
                k.clone(),
                -k,
            ],
        }
    }

    /// The eight group elements in the order `1, -1, i, -i, j, -j, k, -k`.
    pub fn elements(&self) -> &[DMatrix<f64>] {
        &self.elements
    }
}

impl Default for QuaternionRepresentation {
    fn default() -> Self {
        Self::new()
    }
}

impl MatrixGenerator for QuaternionRepresentation {
    fn block_size(&self) -> usize {
        4
    }

    fn generate<R: Rng + ?Sized>(&self, rng: &mut R) -> DMatrix<f64> {
        self.elements[rng.gen_range(0..self.elements.len())].clone()
    }

    fn name(&self) -> &'static str {
        "quaternion"
    }
}

/// `true` if `block` is square and `block^T * block` is the identity within
/// `tol` (entrywise).
pub fn is_orthogonal(block: &DMatrix<f64>, tol: f64) -> bool {
    if !block.is_square() {
        return false;
    }
    let gram = block.transpose() * block;
    let n = block.nrows();
    (0..n).all(|r| {
        (0..n).all(|c| {
            let expected = if r == c { 1.0 } else { 0.0 };
            (gram[(r, c)] - expected).abs() <= tol
        })
    })
}
