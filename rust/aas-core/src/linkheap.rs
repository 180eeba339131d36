//! Entity-in-area linkage: a fixed-size free-list pool of link nodes
//! (`linkheap`) plus a per-area head-pointer table
//! (`arealinkedentities`). This is the one piece of mutable Sampler
//! state — everything else in [`crate::world`] is read-only after load.

const DEFAULT_LINK_HEAP_SIZE: usize = 6144;

#[derive(Clone, Copy, Debug)]
struct LinkNode {
    entity: u32,
    area: i32,
    next_in_area: Option<u32>,
    next_free: Option<u32>,
}

/// Free-list intrusive pool indexed by `LinkIndex` rather than raw
/// pointers (§9).
pub struct LinkHeap {
    nodes: Vec<LinkNode>,
    free_head: Option<u32>,
    area_heads: Vec<Option<u32>>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LinkIndex(pub u32);

impl LinkHeap {
    pub fn new(num_areas: usize) -> Self {
        Self::with_capacity(DEFAULT_LINK_HEAP_SIZE, num_areas)
    }

    pub fn with_capacity(capacity: usize, num_areas: usize) -> Self {
        let mut nodes = Vec::with_capacity(capacity);
        for i in 0..capacity {
            nodes.push(LinkNode {
                entity: 0,
                area: 0,
                next_in_area: None,
                next_free: if i + 1 < capacity {
                    Some((i + 1) as u32)
                } else {
                    None
                },
            });
        }
        LinkHeap {
            free_head: if capacity > 0 { Some(0) } else { None },
            nodes,
            area_heads: vec![None; num_areas + 1],
        }
    }

    /// Link `entity` into `area`. Returns `None` if the heap is
    /// exhausted (a capacity error per §7: the new linkage is lost, not
    /// fatal).
    pub fn link(&mut self, entity: u32, area: i32) -> Option<LinkIndex> {
        let idx = self.free_head?;
        self.free_head = self.nodes[idx as usize].next_free;

        let area_idx = area as usize;
        if area_idx >= self.area_heads.len() {
            self.area_heads.resize(area_idx + 1, None);
        }
        let prev_head = self.area_heads[area_idx];
        self.nodes[idx as usize] = LinkNode {
            entity,
            area,
            next_in_area: prev_head,
            next_free: None,
        };
        self.area_heads[area_idx] = Some(idx);
        Some(LinkIndex(idx))
    }

    pub fn unlink(&mut self, link: LinkIndex) {
        let area_idx = self.nodes[link.0 as usize].area as usize;
        let mut cursor = self.area_heads.get(area_idx).copied().flatten();
        let mut prev: Option<u32> = None;
        while let Some(cur) = cursor {
            let next = self.nodes[cur as usize].next_in_area;
            if cur == link.0 {
                match prev {
                    Some(p) => self.nodes[p as usize].next_in_area = next,
                    None => self.area_heads[area_idx] = next,
                }
                break;
            }
            prev = Some(cur);
            cursor = next;
        }
        self.nodes[link.0 as usize].next_free = self.free_head;
        self.free_head = Some(link.0);
    }

    pub fn entities_in_area(&self, area: i32) -> Vec<u32> {
        let mut out = Vec::new();
        let area_idx = area as usize;
        let mut cursor = self.area_heads.get(area_idx).copied().flatten();
        while let Some(cur) = cursor {
            out.push(self.nodes[cur as usize].entity);
            cursor = self.nodes[cur as usize].next_in_area;
        }
        out
    }

    pub fn capacity(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_exhausted(&self) -> bool {
        self.free_head.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn link_and_unlink_round_trip() {
        let mut heap = LinkHeap::with_capacity(4, 2);
        let l1 = heap.link(10, 1).unwrap();
        let l2 = heap.link(20, 1).unwrap();
        assert_eq!(heap.entities_in_area(1).len(), 2);
        heap.unlink(l1);
        assert_eq!(heap.entities_in_area(1), vec![20]);
        heap.unlink(l2);
        assert!(heap.entities_in_area(1).is_empty());
    }

    #[test]
    fn exhaustion_is_reported_not_panicked() {
        let mut heap = LinkHeap::with_capacity(1, 1);
        assert!(heap.link(1, 1).is_some());
        assert!(heap.link(2, 1).is_none());
        assert!(heap.is_exhausted());
    }
}
