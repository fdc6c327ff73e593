use cw_manifold::{DomainOrder, Frame};
use tracing::debug;

/// Greedy covering: drops every frame whose domain lies inside the domain of
/// another retained frame.
///
/// A candidate contained in an already selected domain is skipped; selected
/// frames contained in the candidate's domain are evicted before it is added.
/// Incomparable domains are all kept. Survivors appear in input order.
pub fn select_min_frames<'a, O>(
    frames: impl IntoIterator<Item = &'a Frame>,
    order: &O,
) -> Vec<&'a Frame>
where
    O: DomainOrder + ?Sized,
{
    let mut selected: Vec<&'a Frame> = Vec::new();
    let mut considered = 0usize;
    for candidate in frames {
        considered += 1;
        if selected
            .iter()
            .any(|kept| order.is_subset(candidate.domain, kept.domain))
        {
            continue;
        }
        selected.retain(|kept| !order.is_subset(kept.domain, candidate.domain));
        selected.push(candidate);
    }
    debug!(considered, selected = selected.len(), "selected covering frames");
    selected
}

#[cfg(test)]
mod tests {
    use super::*;
    use cw_core::{DomainId, FrameId};
    use cw_manifold::Manifold;

    fn frame(id: u64, domain: DomainId) -> Frame {
        Frame {
            id: FrameId::from_raw(id),
            domain,
            name: format!("e{id}"),
        }
    }

    fn ids(frames: &[&Frame]) -> Vec<u64> {
        frames.iter().map(|f| f.id.as_raw()).collect()
    }

    #[test]
    fn nested_domains_keep_the_larger() {
        let mut m = Manifold::new(2, "M");
        let d2 = m.open_subset(m.root(), "D2").unwrap();
        let d1 = m.open_subset(d2, "D1").unwrap();
        let frames = vec![frame(0, d1), frame(1, d2)];
        assert_eq!(ids(&select_min_frames(&frames, &m)), vec![1]);
        let reversed = vec![frame(1, d2), frame(0, d1)];
        assert_eq!(ids(&select_min_frames(&reversed, &m)), vec![1]);
    }

    #[test]
    fn incomparable_domains_are_all_kept() {
        let mut m = Manifold::new(2, "M");
        let u = m.open_subset(m.root(), "U").unwrap();
        let v = m.open_subset(m.root(), "V").unwrap();
        m.declare_overlap(u, v).unwrap();
        let frames = vec![frame(0, u), frame(1, v)];
        assert_eq!(ids(&select_min_frames(&frames, &m)), vec![0, 1]);
    }

    #[test]
    fn same_domain_keeps_first_frame() {
        let m = Manifold::new(2, "M");
        let frames = vec![frame(4, m.root()), frame(2, m.root())];
        assert_eq!(ids(&select_min_frames(&frames, &m)), vec![4]);
    }

    #[test]
    fn eviction_preserves_input_order() {
        let mut m = Manifold::new(2, "M");
        let u = m.open_subset(m.root(), "U").unwrap();
        let w = m.open_subset(u, "W").unwrap();
        let v = m.open_subset(m.root(), "V").unwrap();
        let frames = vec![frame(0, w), frame(1, v), frame(2, u)];
        assert_eq!(ids(&select_min_frames(&frames, &m)), vec![1, 2]);
    }
}
