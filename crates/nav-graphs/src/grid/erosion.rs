use super::GridGraph;

impl GridGraph {
    /// Erodes the walkable area of `[xmin, xmax) x [zmin, zmax)`, clamped to the lattice.
    ///
    /// Each iteration marks walkable nodes missing any orthogonal connection. Without
    /// tags they become unwalkable; with tags the rings get `first_tag + iteration`.
    /// Tag settings are validated by `scan`; here an invalid combination is a no-op.
    pub fn erode_walkable_area(&mut self, xmin: i32, zmin: i32, xmax: i32, zmax: i32) {
        let (width, depth) = (self.width(), self.depth());
        let xmin = xmin.clamp(0, width);
        let xmax = xmax.clamp(0, width);
        let zmin = zmin.clamp(0, depth);
        let zmax = zmax.clamp(0, depth);

        let iterations = self.settings.erode_iterations;
        if !self.settings.erosion_use_tags {
            for _ in 0..iterations {
                for z in zmin..zmax {
                    for x in xmin..xmax {
                        let node = &mut self.nodes[(z * width + x) as usize];
                        if node.data.walkable && !has_all_orthogonal(node.connections) {
                            node.data.walkable = false;
                        }
                    }
                }
                for z in zmin..zmax {
                    for x in xmin..xmax {
                        self.calculate_connections(x, z);
                    }
                }
            }
            return;
        }

        let first = self.settings.erosion_first_tag as u32;
        if iterations + first > nav_core::MAX_TAG as u32 || first == 0 {
            tracing::warn!(iterations, first_tag = first, "Skipping erosion with invalid tag range");
            return;
        }

        let offsets = self.layout.neighbour_offsets;
        for it in 0..iterations {
            let ring = first + it;
            for z in zmin..zmax {
                for x in xmin..xmax {
                    let index = (z * width + x) as usize;
                    let node = &self.nodes[index];
                    let tag = node.data.tag as u32;

                    if node.data.walkable && tag >= first && tag < ring {
                        let mask = node.connections;
                        for (dir, offset) in offsets.iter().enumerate().take(4) {
                            if (mask >> dir) & 1 == 0 {
                                continue;
                            }
                            let other = &mut self.nodes[(index as i32 + offset) as usize];
                            let other_tag = other.data.tag as u32;
                            if other_tag > ring || other_tag < first {
                                other.data.tag = ring as u8;
                            }
                        }
                    } else if node.data.walkable && it == 0 && !has_all_orthogonal(node.connections) {
                        self.nodes[index].data.tag = ring as u8;
                    }
                }
            }
        }
    }
}

fn has_all_orthogonal(mask: u8) -> bool {
    mask & 0b1111 == 0b1111
}
