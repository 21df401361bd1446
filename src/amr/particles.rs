use super::refine::RefinementRatio;
use crate::extent::Extent;

/// Physical placement of an AMR hierarchy: the origin and the level 0 spacing. Finer
/// levels divide the spacing by the refinement factor.
#[derive(Debug, Clone, PartialEq)]
pub struct AmrGeometry {
    pub origin: [f64; 3],
    pub spacing: [f64; 3],
    pub ratio: RefinementRatio,
}

impl AmrGeometry {
    pub fn new(origin: [f64; 3], spacing: [f64; 3], ratio: RefinementRatio) -> Self {
        Self {
            origin,
            spacing,
            ratio,
        }
    }

    pub fn spacing_at_level(&self, level: usize) -> [f64; 3] {
        let factor = f64::from(self.ratio.factor(0, level));
        self.spacing.map(|h| h / factor)
    }

    /// `[x_min, x_max, y_min, y_max, z_min, z_max]` of a point extent at `level`
    pub fn bounds(&self, extent: &Extent, level: usize) -> [f64; 6] {
        let spacing = self.spacing_at_level(level);
        let mut bounds = [0.0; 6];
        for axis in 0..3 {
            let a = self.origin[axis] + f64::from(extent.start(axis)) * spacing[axis];
            let b = self.origin[axis] + f64::from(extent.end(axis)) * spacing[axis];
            bounds[2 * axis] = a.min(b);
            bounds[2 * axis + 1] = a.max(b);
        }
        bounds
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Block {
    level: usize,
    extent: Extent,
    bounds: [f64; 6],
    particles: Vec<[f64; 3]>,
}

/// Point particles binned into the blocks of an AMR hierarchy.
///
/// A particle belongs to the finest block whose bounds contain it. Blocks on the same
/// level are searched in the order they were added.
#[derive(Debug, Clone, PartialEq)]
pub struct ParticleContainer {
    geometry: AmrGeometry,
    blocks: Vec<Block>,
    unassigned: Vec<[f64; 3]>,
}

impl ParticleContainer {
    pub fn new(geometry: AmrGeometry) -> Self {
        Self {
            geometry,
            blocks: Vec::new(),
            unassigned: Vec::new(),
        }
    }

    pub fn geometry(&self) -> &AmrGeometry {
        &self.geometry
    }

    /// add a block and return its id. Particles already inserted are not rebinned.
    pub fn add_block(&mut self, level: usize, extent: Extent) -> usize {
        let bounds = self.geometry.bounds(&extent, level);
        self.blocks.push(Block {
            level,
            extent,
            bounds,
            particles: Vec::new(),
        });
        self.blocks.len() - 1
    }

    pub fn num_blocks(&self) -> usize {
        self.blocks.len()
    }

    pub fn block_extent(&self, block: usize) -> Option<Extent> {
        self.blocks.get(block).map(|block| block.extent)
    }

    pub fn block_level(&self, block: usize) -> Option<usize> {
        self.blocks.get(block).map(|block| block.level)
    }

    /// the block a particle at `x` would be placed in
    pub fn locate(&self, x: [f64; 3]) -> Option<usize> {
        let mut found: Option<usize> = None;
        for (id, block) in self.blocks.iter().enumerate() {
            if !contains(&block.bounds, x) {
                continue;
            }
            match found {
                Some(current) if self.blocks[current].level >= block.level => (),
                _ => found = Some(id),
            }
        }
        found
    }

    /// Insert a particle and return the block it was placed in. Particles outside of
    /// every block are kept aside and counted by [`ParticleContainer::num_unassigned`].
    pub fn insert(&mut self, x: [f64; 3]) -> Option<usize> {
        match self.locate(x) {
            Some(id) => {
                self.blocks[id].particles.push(x);
                Some(id)
            }
            None => {
                log::trace!("particle at {:?} is outside of every block", x);
                self.unassigned.push(x);
                None
            }
        }
    }

    pub fn extend<I: IntoIterator<Item = [f64; 3]>>(&mut self, particles: I) {
        for particle in particles {
            self.insert(particle);
        }
    }

    pub fn particles(&self, block: usize) -> &[[f64; 3]] {
        self.blocks
            .get(block)
            .map(|block| block.particles.as_slice())
            .unwrap_or(&[])
    }

    pub fn num_particles_in_block(&self, block: usize) -> usize {
        self.particles(block).len()
    }

    pub fn num_particles_at_level(&self, level: usize) -> usize {
        self.blocks
            .iter()
            .filter(|block| block.level == level)
            .map(|block| block.particles.len())
            .sum()
    }

    /// total number of particles, including the unassigned ones
    pub fn num_particles(&self) -> usize {
        self.blocks.iter().map(|block| block.particles.len()).sum::<usize>() + self.unassigned.len()
    }

    pub fn num_unassigned(&self) -> usize {
        self.unassigned.len()
    }
}

fn contains(bounds: &[f64; 6], x: [f64; 3]) -> bool {
    (0..3).all(|axis| bounds[2 * axis] <= x[axis] && x[axis] <= bounds[2 * axis + 1])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finest_block_wins() {
        let geometry = AmrGeometry::new([0.0; 3], [1.0; 3], RefinementRatio::Constant(2));
        let mut particles = ParticleContainer::new(geometry);
        let coarse = particles.add_block(0, Extent::new(0, 4, 0, 4, 0, 0));
        let fine = particles.add_block(1, Extent::new(2, 6, 2, 6, 0, 0));

        assert_eq!(particles.geometry().spacing_at_level(1), [0.5; 3]);
        assert_eq!(particles.insert([0.5, 0.5, 0.0]), Some(coarse));
        assert_eq!(particles.insert([2.0, 2.0, 0.0]), Some(fine));
        assert_eq!(particles.insert([5.0, 0.0, 0.0]), None);

        assert_eq!(particles.num_particles_at_level(0), 1);
        assert_eq!(particles.num_particles_at_level(1), 1);
        assert_eq!(particles.num_unassigned(), 1);
        assert_eq!(particles.num_particles(), 3);
    }
}
