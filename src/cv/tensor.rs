use anyhow::{Context, Result, anyhow};
use log::debug;
use opencv::core::Mat;
use opencv::prelude::*;

/// Read-only, bounds checked view over a dense `f32` tensor.
pub struct TensorView<'a> {
    dims: Vec<usize>,
    strides: Vec<usize>,
    data: &'a [f32],
}

impl<'a> TensorView<'a> {
    pub fn new(dims: &[i32], data: &'a [f32]) -> Result<Self> {
        let dims = dims
            .iter()
            .map(|&d| usize::try_from(d).map_err(|_| anyhow!("Negative tensor dimension {}", d)))
            .collect::<Result<Vec<usize>>>()?;

        let len: usize = dims.iter().product();
        if dims.is_empty() || len != data.len() {
            return Err(anyhow!(
                "Tensor shape {:?} does not match {} elements",
                dims,
                data.len()
            ));
        }

        // Row-major strides
        let mut strides: Vec<usize> = vec![1; dims.len()];
        for i in (0..dims.len() - 1).rev() {
            strides[i] = strides[i + 1] * dims[i + 1];
        }

        debug!("Tensor view {:?} with strides {:?}", dims, strides);
        Ok(Self {
            dims,
            strides,
            data,
        })
    }

    /// Views the output blob of a network forward pass.
    pub fn from_mat(mat: &'a Mat) -> Result<Self> {
        let dims = mat.mat_size();
        let data = mat
            .data_typed::<f32>()
            .context("Model output is not a continuous f32 tensor")?;
        Self::new(&dims, data)
    }

    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    pub fn get(&self, indices: &[usize]) -> Result<f32> {
        self.validate_indices(indices)?;
        let offset = self.calculate_offset(indices);
        self.data.get(offset).copied().context("Index out of bounds")
    }

    fn validate_indices(&self, indices: &[usize]) -> Result<()> {
        if indices.len() != self.dims.len() {
            return Err(anyhow!(
                "Invalid index dimensions: expected {}, got {}",
                self.dims.len(),
                indices.len()
            ));
        }

        indices.iter().enumerate().try_for_each(|(i, &idx)| {
            if idx >= self.dims[i] {
                Err(anyhow!(
                    "Index {} out of bounds for dimension {} (0..{})",
                    idx,
                    i,
                    self.dims[i]
                ))
            } else {
                Ok(())
            }
        })
    }

    fn calculate_offset(&self, indices: &[usize]) -> usize {
        indices
            .iter()
            .zip(&self.strides)
            .map(|(&idx, &stride)| idx * stride)
            .sum()
    }
}
