//! Shape representation and index algebra.
//!
//! Shapes are row-major like NumPy:
//! - `()` or `[]` is a scalar
//! - `(n,)` or `[n]` is a vector of length n
//! - `(m, n)` or `[m, n]` is an m x n matrix
//! - `[n, d, d]` is a stack of n matrices of size d x d
//!
//! A [`SliceSpec`] describes a rectangular sub-range of a shape as a flat
//! offset plus an extent and stride per dimension. It never holds data.

use std::fmt;

use crate::error::{CvxError, Result};

/// Extents of a row-major arena or of a view into one.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct Shape(Vec<usize>);

impl Shape {
    /// The zero-dimensional shape of a single entry.
    pub fn scalar() -> Self {
        Shape(vec![])
    }

    /// One dimension of length `n`.
    pub fn vector(n: usize) -> Self {
        Shape(vec![n])
    }

    /// An `m x n` matrix.
    pub fn matrix(m: usize, n: usize) -> Self {
        Shape(vec![m, n])
    }

    /// Arbitrary extents, outermost first.
    pub fn from_dims(dims: impl Into<Vec<usize>>) -> Self {
        Shape(dims.into())
    }

    /// Total number of elements (1 for a scalar).
    pub fn size(&self) -> usize {
        self.0.iter().product::<usize>()
    }

    /// Number of dimensions.
    pub fn ndim(&self) -> usize {
        self.0.len()
    }

    /// Extents, outermost first.
    pub fn dims(&self) -> &[usize] {
        &self.0
    }

    pub fn is_scalar(&self) -> bool {
        self.0.is_empty()
    }

    /// Leading extent, treating a scalar as `1 x 1` and a vector as a column.
    pub fn rows(&self) -> usize {
        self.0.first().copied().unwrap_or(1)
    }

    /// Second extent, or 1 when there is none.
    pub fn cols(&self) -> usize {
        self.0.get(1).copied().unwrap_or(1)
    }

    /// Whether a `rows x cols` constant matrix lines up with this shape.
    ///
    /// Only shapes with at most two dimensions can match a matrix.
    pub fn matches_matrix(&self, rows: usize, cols: usize) -> bool {
        self.ndim() <= 2 && self.rows() == rows && self.cols() == cols
    }

    /// Row-major strides of this shape.
    pub fn strides(&self) -> Vec<usize> {
        let mut strides = vec![1; self.0.len()];
        for i in (0..self.0.len().saturating_sub(1)).rev() {
            strides[i] = strides[i + 1] * self.0[i + 1];
        }
        strides
    }

    /// Flat row-major offset of a coordinate tuple.
    pub fn flat_offset(&self, coords: &[usize]) -> Result<usize> {
        if coords.len() != self.ndim() {
            return Err(CvxError::shape_mismatch(
                format!("{} coordinates", self.ndim()),
                format!("{} coordinates", coords.len()),
            ));
        }
        let mut offset = 0;
        for ((&c, &dim), stride) in coords.iter().zip(&self.0).zip(self.strides()) {
            if c >= dim {
                return Err(CvxError::out_of_range(format!("{:?}", coords), self));
            }
            offset += c * stride;
        }
        Ok(offset)
    }

    /// Coordinate tuple of a flat row-major offset.
    pub fn coords_of(&self, offset: usize) -> Result<Vec<usize>> {
        if offset >= self.size() {
            return Err(CvxError::out_of_range(offset, self.size()));
        }
        let mut rest = offset;
        Ok(self
            .strides()
            .into_iter()
            .map(|stride| {
                let c = rest / stride;
                rest %= stride;
                c
            })
            .collect())
    }

    /// Select the half-open box `[start, end)` of this shape.
    ///
    /// Fails with `ShapeMismatch` when the tuples do not have one entry per
    /// dimension and with `IndexOutOfRange` when `end` exceeds the shape or a
    /// dimension would be empty.
    pub fn slice(&self, start: &[usize], end: &[usize]) -> Result<SliceSpec> {
        if start.len() != self.ndim() || end.len() != self.ndim() {
            return Err(CvxError::shape_mismatch(
                format!("{} coordinates", self.ndim()),
                format!("start {:?}, end {:?}", start, end),
            ));
        }
        for ((&s, &e), &dim) in start.iter().zip(end).zip(&self.0) {
            if e > dim || s >= e {
                return Err(CvxError::out_of_range(
                    format!("[{:?}, {:?})", start, end),
                    self,
                ));
            }
        }

        let strides = self.strides();
        let offset = start.iter().zip(&strides).map(|(s, st)| s * st).sum();
        let extents: Vec<usize> = start.iter().zip(end).map(|(s, e)| e - s).collect();

        Ok(SliceSpec {
            offset,
            shape: Shape(extents.clone()),
            extents,
            strides,
        })
    }
}

impl fmt::Debug for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Shape({:?})", self.0)
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.as_slice() {
            [] => write!(f, "()"),
            [n] => write!(f, "({},)", n),
            dims => {
                let parts: Vec<String> = dims.iter().map(|d| d.to_string()).collect();
                write!(f, "({})", parts.join(", "))
            }
        }
    }
}

impl From<()> for Shape {
    fn from(_: ()) -> Self {
        Shape::scalar()
    }
}

impl From<usize> for Shape {
    fn from(n: usize) -> Self {
        Shape::vector(n)
    }
}

impl From<(usize, usize)> for Shape {
    fn from((m, n): (usize, usize)) -> Self {
        Shape::matrix(m, n)
    }
}

impl From<(usize, usize, usize)> for Shape {
    fn from((a, b, c): (usize, usize, usize)) -> Self {
        Shape(vec![a, b, c])
    }
}

impl From<Vec<usize>> for Shape {
    fn from(dims: Vec<usize>) -> Self {
        Shape(dims)
    }
}

impl From<&[usize]> for Shape {
    fn from(dims: &[usize]) -> Self {
        Shape(dims.to_vec())
    }
}

impl<const N: usize> From<[usize; N]> for Shape {
    fn from(dims: [usize; N]) -> Self {
        Shape(dims.to_vec())
    }
}

/// A strided view over a row-major shape.
///
/// `extents` and `strides` describe which flat offsets are selected; `shape`
/// is the logical shape the selection is presented as. A reshape changes only
/// `shape`, never the selected offsets or their order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SliceSpec {
    offset: usize,
    extents: Vec<usize>,
    strides: Vec<usize>,
    shape: Shape,
}

impl SliceSpec {
    /// A view selecting all of `shape`.
    pub fn full(shape: &Shape) -> Self {
        SliceSpec {
            offset: 0,
            extents: shape.dims().to_vec(),
            strides: shape.strides(),
            shape: shape.clone(),
        }
    }

    /// Flat offset of the first selected element.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Extent of the selection in each dimension of the underlying shape.
    pub fn extents(&self) -> &[usize] {
        &self.extents
    }

    /// Strides of the underlying shape.
    pub fn strides(&self) -> &[usize] {
        &self.strides
    }

    /// Logical shape of the view.
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Number of selected elements.
    pub fn size(&self) -> usize {
        self.extents.iter().product()
    }

    /// Whether the selected offsets form one unbroken range.
    ///
    /// An empty selection counts as contiguous.
    pub fn is_contiguous(&self) -> bool {
        if self.size() == 0 {
            return true;
        }
        let last: usize = self
            .extents
            .iter()
            .zip(&self.strides)
            .map(|(e, s)| (e - 1) * s)
            .sum();
        last + 1 == self.size()
    }

    /// Reinterpret the selection under a new logical shape of equal size.
    pub fn reshape(&self, shape: impl Into<Shape>) -> Result<SliceSpec> {
        let shape = shape.into();
        if shape.size() != self.size() {
            return Err(CvxError::shape_mismatch(
                format!("{} elements", self.size()),
                format!("{} ({} elements)", shape, shape.size()),
            ));
        }
        Ok(SliceSpec {
            shape,
            ..self.clone()
        })
    }

    /// Flat offsets of the selected elements, in row-major order of the view.
    pub fn flat_indices(&self) -> FlatIndices<'_> {
        FlatIndices {
            spec: self,
            counter: vec![0; self.extents.len()],
            remaining: self.size(),
        }
    }
}

/// Iterator over the flat offsets selected by a [`SliceSpec`].
#[derive(Debug, Clone)]
pub struct FlatIndices<'a> {
    spec: &'a SliceSpec,
    counter: Vec<usize>,
    remaining: usize,
}

impl Iterator for FlatIndices<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;

        let current = self.spec.offset
            + self
                .counter
                .iter()
                .zip(&self.spec.strides)
                .map(|(c, s)| c * s)
                .sum::<usize>();

        // Odometer step, innermost dimension first
        for dim in (0..self.counter.len()).rev() {
            self.counter[dim] += 1;
            if self.counter[dim] < self.spec.extents[dim] {
                break;
            }
            self.counter[dim] = 0;
        }

        Some(current)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for FlatIndices<'_> {}
