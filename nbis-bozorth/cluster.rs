//! Growing geometrically consistent clusters of associations.

use crate::compat::Association;
use crate::pairs::{Point, angle_distance, normalize_degrees};
use crate::params::BozorthParams;

/// A one-to-one probe/gallery point mapping supported by a set of
/// associations.
#[derive(Debug, Clone)]
pub struct Cluster {
    probe_to_gallery: Vec<Option<u16>>,
    gallery_to_probe: Vec<Option<u16>>,
    links: Vec<(u16, u16)>,
    edges: usize,
    rot_sin: f64,
    rot_cos: f64,
}

impl Cluster {
    fn new(probe_points: usize, gallery_points: usize) -> Self {
        Self {
            probe_to_gallery: vec![None; probe_points],
            gallery_to_probe: vec![None; gallery_points],
            links: Vec::new(),
            edges: 0,
            rot_sin: 0.0,
            rot_cos: 0.0,
        }
    }

    /// Associations absorbed so far.
    pub fn edges(&self) -> usize {
        self.edges
    }

    pub fn links(&self) -> &[(u16, u16)] {
        &self.links
    }

    fn consistent_link(&self, p: u16, g: u16) -> bool {
        let fwd = self.probe_to_gallery[p as usize];
        let back = self.gallery_to_probe[g as usize];
        fwd.is_none_or(|x| x == g) && back.is_none_or(|x| x == p)
    }

    fn has_link(&self, p: u16, g: u16) -> bool {
        self.probe_to_gallery[p as usize] == Some(g)
    }

    /// True when `a` maps no point against the cluster and shares a point
    /// with it.
    pub fn accepts(&self, a: &Association) -> bool {
        self.consistent_link(a.probe.0, a.gallery.0)
            && self.consistent_link(a.probe.1, a.gallery.1)
            && (self.has_link(a.probe.0, a.gallery.0) || self.has_link(a.probe.1, a.gallery.1))
    }

    fn link(&mut self, p: u16, g: u16) {
        if self.probe_to_gallery[p as usize].is_none() {
            self.probe_to_gallery[p as usize] = Some(g);
            self.gallery_to_probe[g as usize] = Some(p);
            self.links.push((p, g));
        }
    }

    pub fn add(&mut self, a: &Association) {
        self.link(a.probe.0, a.gallery.0);
        self.link(a.probe.1, a.gallery.1);
        self.edges += 1;
        let (s, c) = a.rotation.to_radians().sin_cos();
        self.rot_sin += s;
        self.rot_cos += c;
    }

    /// Mean rotation of the absorbed associations, degrees.
    pub fn rotation(&self) -> f64 {
        normalize_degrees(self.rot_sin.atan2(self.rot_cos).to_degrees())
    }

    /// Mean offset of gallery points from rotated probe points.
    pub fn translation(&self, rotation: f64, probe: &[Point], gallery: &[Point]) -> (f64, f64) {
        if self.links.is_empty() {
            return (0.0, 0.0);
        }
        let (s, c) = rotation.to_radians().sin_cos();
        let (mut tx, mut ty) = (0.0, 0.0);
        for &(p, g) in &self.links {
            let a = probe[p as usize];
            let b = gallery[g as usize];
            tx += b.x - (c * a.x - s * a.y);
            ty += b.y - (s * a.x + c * a.y);
        }
        let n = self.links.len() as f64;
        (tx / n, ty / n)
    }

    fn mapping_agrees(&self, other: &Cluster) -> bool {
        other.links.iter().all(|&(p, g)| self.consistent_link(p, g))
    }

    fn absorb(&mut self, other: &Cluster) {
        for &(p, g) in &other.links {
            self.link(p, g);
        }
        self.edges += other.edges;
        self.rot_sin += other.rot_sin;
        self.rot_cos += other.rot_cos;
    }
}

/// Assign associations, in order, to the first cluster that accepts them,
/// opening a new cluster when none does and the limit allows.
pub fn grow_clusters(
    associations: &[Association],
    probe_points: usize,
    gallery_points: usize,
    max_clusters: usize,
) -> Vec<Cluster> {
    let mut clusters: Vec<Cluster> = Vec::new();
    for a in associations {
        if let Some(c) = clusters.iter_mut().find(|c| c.accepts(a)) {
            c.add(a);
            continue;
        }
        if clusters.len() < max_clusters {
            let mut c = Cluster::new(probe_points, gallery_points);
            if c.consistent_link(a.probe.0, a.gallery.0) && c.consistent_link(a.probe.1, a.gallery.1)
            {
                c.add(a);
                clusters.push(c);
            }
        }
    }
    clusters
}

/// Largest cluster plus every sufficiently large cluster that agrees with it
/// on rotation, translation and point mapping. Returns the combined edge count.
pub fn combine_clusters(
    mut clusters: Vec<Cluster>,
    probe: &[Point],
    gallery: &[Point],
    params: &BozorthParams,
) -> usize {
    // Stable: equal sizes keep creation order.
    clusters.sort_by(|a, b| b.edges.cmp(&a.edges));
    let mut iter = clusters.into_iter();
    let Some(mut best) = iter.next() else {
        return 0;
    };
    let rotation = best.rotation();
    let (bx, by) = best.translation(rotation, probe, gallery);

    for c in iter {
        if c.edges < params.min_bonus_cluster {
            continue;
        }
        if angle_distance(c.rotation(), rotation) > params.angle_tol {
            continue;
        }
        let (tx, ty) = c.translation(rotation, probe, gallery);
        if ((tx - bx).powi(2) + (ty - by).powi(2)).sqrt() > params.translation_tol {
            continue;
        }
        if best.mapping_agrees(&c) {
            best.absorb(&c);
        }
    }
    best.edges
}
