//! Coefficient plane storage.
//!
//! All planes of one encode/decode share a single contiguous
//! allocation; per-plane slices partition it. Coefficients are `i16`
//! at image stride `width`.

use crate::error::SqzError;

pub struct PlaneSet {
    coefficients: Vec<i16>,
    width: usize,
    height: usize,
    count: usize,
}

impl PlaneSet {
    pub fn new(width: usize, height: usize, count: usize) -> Result<Self, SqzError> {
        let size = width * height * count;
        let mut coefficients = Vec::new();
        coefficients
            .try_reserve_exact(size)
            .map_err(|_| SqzError::NotEnoughMemory)?;
        coefficients.resize(size, 0);
        Ok(Self {
            coefficients,
            width,
            height,
            count,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn count(&self) -> usize {
        self.count
    }

    /// Coefficients of one plane, `width * height` long.
    pub fn plane(&self, index: usize) -> &[i16] {
        let size = self.width * self.height;
        &self.coefficients[index * size..(index + 1) * size]
    }

    pub fn plane_mut(&mut self, index: usize) -> &mut [i16] {
        let size = self.width * self.height;
        &mut self.coefficients[index * size..(index + 1) * size]
    }

    /// The whole shared allocation, planes back to back.
    pub fn all(&self) -> &[i16] {
        &self.coefficients
    }

    pub fn all_mut(&mut self) -> &mut [i16] {
        &mut self.coefficients
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_planes_partition_one_allocation() {
        let mut planes = PlaneSet::new(4, 3, 3).unwrap();
        assert_eq!(planes.all().len(), 36);
        planes.plane_mut(1)[0] = 7;
        assert_eq!(planes.all()[12], 7);
        assert_eq!(planes.plane(0).iter().all(|&c| c == 0), true);
        assert_eq!(planes.plane(2).len(), 12);
    }
}
