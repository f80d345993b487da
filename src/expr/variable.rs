//! Block variables and slices.
//!
//! A [`ConeBlockVariable`] is `n` stacked `d x d` matrices, each constrained to
//! the PSD cone, stored as one row-major arena of `n * d * d` entries. A
//! [`Slice`] is an offset/stride descriptor into that arena plus a logical
//! shape; it shares the variable's metadata and never touches numeric data.

use std::fmt;
use std::sync::Arc;

use super::expression::ProblemId;
use super::shape::{FlatIndices, Shape, SliceSpec};
use crate::constraints::Domain;
use crate::error::{CvxError, Result};

/// Metadata of a declared block variable.
#[derive(Debug)]
pub(crate) struct VariableData {
    /// Problem that declared the variable.
    pub owner: ProblemId,
    /// Declaration index within the owning problem.
    pub index: usize,
    /// Offset of the first entry in the problem's flat solution vector.
    pub offset: usize,
    /// Optional name for display.
    pub name: Option<String>,
    /// Number of stacked blocks.
    pub blocks: usize,
    /// Dimension of each square block.
    pub dim: usize,
    /// Full shape `[blocks, dim, dim]`.
    pub shape: Shape,
}

/// Handle to `n` stacked `d x d` PSD matrix variables.
///
/// Cloning the handle is cheap; all clones refer to the same declaration.
#[derive(Clone)]
pub struct ConeBlockVariable(Arc<VariableData>);

impl ConeBlockVariable {
    pub(crate) fn new(
        owner: ProblemId,
        index: usize,
        offset: usize,
        name: Option<String>,
        blocks: usize,
        dim: usize,
    ) -> Self {
        ConeBlockVariable(Arc::new(VariableData {
            owner,
            index,
            offset,
            name,
            blocks,
            dim,
            shape: Shape::from([blocks, dim, dim]),
        }))
    }

    /// Problem that owns this variable.
    pub fn owner(&self) -> ProblemId {
        self.0.owner
    }

    /// Declaration index within the owning problem.
    pub fn index(&self) -> usize {
        self.0.index
    }

    /// Offset of this variable in the flat solution vector.
    pub fn offset(&self) -> usize {
        self.0.offset
    }

    /// Optional name.
    pub fn name(&self) -> Option<&str> {
        self.0.name.as_deref()
    }

    /// Number of blocks `n`.
    pub fn blocks(&self) -> usize {
        self.0.blocks
    }

    /// Block dimension `d`.
    pub fn dim(&self) -> usize {
        self.0.dim
    }

    /// Shape `[n, d, d]`.
    pub fn shape(&self) -> &Shape {
        &self.0.shape
    }

    /// Number of scalar entries, `n * d * d`.
    pub fn size(&self) -> usize {
        self.0.shape.size()
    }

    /// Cone domain the variable was declared in.
    pub fn domain(&self) -> Domain {
        Domain::InPsdCone {
            dim: self.0.dim,
            count: self.0.blocks,
        }
    }

    /// Check whether two handles refer to the same declaration.
    pub fn same_as(&self, other: &ConeBlockVariable) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// The whole variable as a `[n, d, d]` slice.
    pub fn all(&self) -> Slice {
        Slice {
            var: self.clone(),
            spec: SliceSpec::full(&self.0.shape),
        }
    }

    /// Select the box `[start, end)` of the `[n, d, d]` arena.
    pub fn slice(&self, start: &[usize], end: &[usize]) -> Result<Slice> {
        Ok(Slice {
            var: self.clone(),
            spec: self.0.shape.slice(start, end)?,
        })
    }

    /// Block `j` as a `d x d` slice.
    ///
    /// # Example
    ///
    /// ```
    /// use sdpmodel::prelude::*;
    ///
    /// let mut problem = Problem::new("blocks");
    /// let x = problem.cone_block_variable(3, 2).unwrap();
    /// let x1 = x.block(1).unwrap();
    /// assert_eq!(x1.offset(), 4);
    /// assert_eq!(x1.shape(), &Shape::matrix(2, 2));
    /// ```
    pub fn block(&self, j: usize) -> Result<Slice> {
        let d = self.0.dim;
        if j >= self.0.blocks {
            return Err(CvxError::out_of_range(
                format!("block {}", j),
                format!("{} blocks", self.0.blocks),
            ));
        }
        self.slice(&[j, 0, 0], &[j + 1, d, d])?.reshape((d, d))
    }

    /// Entry `(s1, s2)` of block `j` as a scalar slice.
    pub fn element(&self, j: usize, s1: usize, s2: usize) -> Result<Slice> {
        self.0.shape.flat_offset(&[j, s1, s2])?;
        self.slice(&[j, s1, s2], &[j + 1, s1 + 1, s2 + 1])?
            .reshape(Shape::scalar())
    }

    /// Coordinates `(j, s, s)` of every diagonal entry, ordered by `(j, s)`.
    pub fn pick_diagonal(&self) -> Vec<[usize; 3]> {
        let d = self.0.dim;
        (0..self.0.blocks * d).map(|p| [p / d, p % d, p % d]).collect()
    }

    /// Flat offsets (within this variable) of a list of `(j, s1, s2)` coordinates.
    pub fn pick(&self, coords: &[[usize; 3]]) -> Result<Vec<usize>> {
        coords
            .iter()
            .map(|c| self.0.shape.flat_offset(c))
            .collect()
    }

    pub(crate) fn label(&self) -> String {
        match &self.0.name {
            Some(name) => name.clone(),
            None => format!("X{}", self.0.index),
        }
    }
}

impl fmt::Debug for ConeBlockVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConeBlockVariable")
            .field("name", &self.label())
            .field("owner", &self.0.owner)
            .field("shape", &self.0.shape)
            .finish()
    }
}

/// A non-owning view into a [`ConeBlockVariable`].
#[derive(Debug, Clone)]
pub struct Slice {
    var: ConeBlockVariable,
    spec: SliceSpec,
}

impl Slice {
    /// The variable this slice views.
    pub fn variable(&self) -> &ConeBlockVariable {
        &self.var
    }

    /// Offset and stride descriptor.
    pub fn spec(&self) -> &SliceSpec {
        &self.spec
    }

    /// Logical shape.
    pub fn shape(&self) -> &Shape {
        self.spec.shape()
    }

    /// Number of entries.
    pub fn size(&self) -> usize {
        self.spec.size()
    }

    /// Flat offset of the first entry within the variable.
    pub fn offset(&self) -> usize {
        self.spec.offset()
    }

    /// Whether the entries form one unbroken range of the variable.
    pub fn is_contiguous(&self) -> bool {
        self.spec.is_contiguous()
    }

    /// Reinterpret under a new shape with the same number of entries.
    pub fn reshape(&self, shape: impl Into<Shape>) -> Result<Slice> {
        Ok(Slice {
            var: self.var.clone(),
            spec: self.spec.reshape(shape)?,
        })
    }

    /// Flat offsets within the variable, in row-major order of the view.
    pub fn flat_indices(&self) -> FlatIndices<'_> {
        self.spec.flat_indices()
    }
}
