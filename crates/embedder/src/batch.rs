//! Embedding batch result type and shape validation.

/// A batch of generated vectors, flattened row-major.
///
/// `data` holds `n_vectors * dim` floats; vector `i` occupies
/// `data[i * dim .. (i + 1) * dim]`, positionally corresponding to
/// input `i`.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingBatch {
    pub n_vectors: usize,
    pub dim: usize,
    pub data: Vec<f32>,
}

/// Ways a batch can fail shape validation. An invalid batch is
/// discarded without being written.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum BatchShapeError {
    #[error("batch contains no vectors")]
    Empty,

    #[error("batch has zero dimension")]
    ZeroDim,

    #[error("data length {actual} does not equal n_vectors * dim = {expected}")]
    DataLenMismatch { expected: usize, actual: usize },

    #[error("row {row} has dimension {actual}, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        actual: usize,
    },
}

impl EmbeddingBatch {
    /// Build a batch by flattening per-row vectors, rejecting empty or
    /// ragged input.
    pub fn from_rows(rows: Vec<Vec<f32>>) -> Result<Self, BatchShapeError> {
        let n_vectors = rows.len();
        if n_vectors == 0 {
            return Err(BatchShapeError::Empty);
        }
        let dim = rows[0].len();
        if dim == 0 {
            return Err(BatchShapeError::ZeroDim);
        }

        let mut data = Vec::with_capacity(n_vectors * dim);
        for (row, vector) in rows.into_iter().enumerate() {
            if vector.len() != dim {
                return Err(BatchShapeError::RaggedRow {
                    row,
                    expected: dim,
                    actual: vector.len(),
                });
            }
            data.extend_from_slice(&vector);
        }

        Ok(Self {
            n_vectors,
            dim,
            data,
        })
    }

    /// Validate the batch invariant: nonzero count, nonzero dimension,
    /// and a data buffer of exactly `n_vectors * dim` floats.
    pub fn validate(&self) -> Result<(), BatchShapeError> {
        if self.n_vectors == 0 {
            return Err(BatchShapeError::Empty);
        }
        if self.dim == 0 {
            return Err(BatchShapeError::ZeroDim);
        }
        let expected = self.n_vectors * self.dim;
        if self.data.len() != expected {
            return Err(BatchShapeError::DataLenMismatch {
                expected,
                actual: self.data.len(),
            });
        }
        Ok(())
    }

    /// Slice out vector `i`.
    ///
    /// Callers must `validate()` first; the slice bounds assume the
    /// batch invariant holds.
    pub fn vector(&self, i: usize) -> &[f32] {
        &self.data[i * self.dim..(i + 1) * self.dim]
    }
}
