//! Triangulations of irregular 2D sample sets.

use crate::{ensure, error::Result, fail};
use delaunator;
use std::collections::HashMap;

#[cfg(feature = "serialization")]
use serde::Serialize;

/// Service producing a triangulation of a 2D point set.
pub trait Triangulator: Send + Sync {
    /// Triangulates the given points.
    ///
    /// # Returns
    ///
    /// Triangles as triples of point indices. Points that are not covered by
    /// any triangle are allowed.
    fn triangulate(&self, points: &[[f64; 2]]) -> Result<Vec<[usize; 3]>>;
}

/// Delaunay triangulator backed by the `delaunator` crate.
#[derive(Clone, Copy, Debug, Default)]
pub struct DelaunatorTriangulator;

impl Triangulator for DelaunatorTriangulator {
    fn triangulate(&self, points: &[[f64; 2]]) -> Result<Vec<[usize; 3]>> {
        ensure!(
            points.len() >= 3,
            InvalidGrid,
            "triangulation needs at least 3 points, got {}",
            points.len()
        );
        let delaunator_points: Vec<delaunator::Point> = points
            .iter()
            .map(|p| delaunator::Point { x: p[0], y: p[1] })
            .collect();

        let triangulation = delaunator::triangulate(&delaunator_points);

        Ok(triangulation
            .triangles
            .chunks_exact(3)
            .map(|triangle| [triangle[0], triangle[1], triangle[2]])
            .collect())
    }
}

/// Triangulation of a point set with the adjacency structures needed for
/// point location and neighbor queries.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize))]
pub struct Delaunay {
    /// Point indices of the vertices of each triangle.
    tri: Vec<[usize; 3]>,
    /// Triangles containing each point.
    vertices: Vec<Vec<usize>>,
    /// Triangle across edge `j` (from vertex `j` to vertex `j + 1`) of each triangle.
    walk: Vec<[Option<usize>; 3]>,
    /// Global number of edge `j` of each triangle.
    edges: Vec<[usize; 3]>,
    num_edges: usize,
}

impl Delaunay {
    /// Triangulates the given points with the given triangulator.
    pub fn triangulate(points: &[[f64; 2]], triangulator: &dyn Triangulator) -> Result<Self> {
        let tri = triangulator.triangulate(points)?;
        ensure!(
            !tri.is_empty(),
            InvalidGrid,
            "triangulation of {} points has no triangles (points may be collinear)",
            points.len()
        );
        let delaunay = Self::from_triangles(tri, points.len())?;
        log::debug!(
            "Triangulated {} points into {} triangles with {} edges",
            points.len(),
            delaunay.tri.len(),
            delaunay.num_edges
        );
        Ok(delaunay)
    }

    /// Builds the adjacency structures for an existing list of triangles.
    ///
    /// # Parameters
    ///
    /// - `tri`: Triangles as triples of point indices.
    /// - `num_points`: Number of points being triangulated.
    ///
    /// # Returns
    ///
    /// A `Result` which is either:
    ///
    /// - `Ok`: Contains the new `Delaunay`.
    /// - `Err`: `InvalidGrid` if a triangle refers to a missing point, repeats
    /// a vertex, or an edge is shared by more than two triangles.
    pub fn from_triangles(tri: Vec<[usize; 3]>, num_points: usize) -> Result<Self> {
        let mut vertices = vec![Vec::new(); num_points];
        for (t, triangle) in tri.iter().enumerate() {
            for &vertex in triangle {
                ensure!(
                    vertex < num_points,
                    InvalidGrid,
                    "triangle {} refers to point {} of {}",
                    t,
                    vertex,
                    num_points
                );
                vertices[vertex].push(t);
            }
            ensure!(
                triangle[0] != triangle[1]
                    && triangle[1] != triangle[2]
                    && triangle[2] != triangle[0],
                InvalidGrid,
                "triangle {} has repeated vertices",
                t
            );
        }

        let mut walk = vec![[None; 3]; tri.len()];
        let mut edges = vec![[0; 3]; tri.len()];
        let mut edge_owners: HashMap<(usize, usize), (usize, usize, usize)> = HashMap::new();
        for (t, triangle) in tri.iter().enumerate() {
            for j in 0..3 {
                let (a, b) = (triangle[j], triangle[(j + 1) % 3]);
                let key = (a.min(b), a.max(b));
                match edge_owners.get(&key).copied() {
                    Some((other_t, other_j, edge)) => {
                        if walk[other_t][other_j].is_some() {
                            fail!(
                                InvalidGrid,
                                "edge ({}, {}) is shared by more than two triangles",
                                key.0,
                                key.1
                            );
                        }
                        walk[other_t][other_j] = Some(t);
                        walk[t][j] = Some(other_t);
                        edges[t][j] = edge;
                    }
                    None => {
                        let edge = edge_owners.len();
                        edge_owners.insert(key, (t, j, edge));
                        edges[t][j] = edge;
                    }
                }
            }
        }
        let num_edges = edge_owners.len();

        Ok(Self {
            tri,
            vertices,
            walk,
            edges,
            num_edges,
        })
    }

    pub fn triangles(&self) -> &[[usize; 3]] {
        &self.tri
    }

    pub fn num_triangles(&self) -> usize {
        self.tri.len()
    }

    pub fn num_points(&self) -> usize {
        self.vertices.len()
    }

    /// Returns the triangles having the given point as a vertex.
    pub fn vertex_triangles(&self, point: usize) -> &[usize] {
        &self.vertices[point]
    }

    /// Returns the triangles across the three edges of each triangle.
    pub fn walk(&self) -> &[[Option<usize>; 3]] {
        &self.walk
    }

    pub fn edges(&self) -> &[[usize; 3]] {
        &self.edges
    }

    pub fn num_edges(&self) -> usize {
        self.num_edges
    }

    /// Returns, for each point, the sorted indices of all other points that
    /// share a triangle with it.
    pub fn neighbors(&self) -> Vec<Vec<usize>> {
        self.vertices
            .iter()
            .enumerate()
            .map(|(point, triangles)| {
                let mut neighbors: Vec<usize> = triangles
                    .iter()
                    .flat_map(|&t| self.tri[t].iter().copied())
                    .filter(|&vertex| vertex != point)
                    .collect();
                neighbors.sort_unstable();
                neighbors.dedup();
                neighbors
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {

    use super::*;

    fn square() -> Delaunay {
        Delaunay::from_triangles(vec![[0, 1, 2], [2, 1, 3]], 4).unwrap()
    }

    #[test]
    fn walk_links_cross_shared_edges() {
        let delaunay = square();
        assert_eq!(delaunay.walk()[0], [None, Some(1), None]);
        assert_eq!(delaunay.walk()[1], [Some(0), None, None]);
        assert_eq!(delaunay.num_edges(), 5);
        assert_eq!(delaunay.edges()[0][1], delaunay.edges()[1][0]);
        assert_eq!(delaunay.vertex_triangles(1), &[0, 1]);
        assert_eq!(delaunay.vertex_triangles(3), &[1]);
    }

    #[test]
    fn neighbors_come_from_shared_triangles() {
        let neighbors = square().neighbors();
        assert_eq!(neighbors[0], vec![1, 2]);
        assert_eq!(neighbors[1], vec![0, 2, 3]);
        assert_eq!(neighbors[3], vec![1, 2]);
    }

    #[test]
    fn invalid_triangles_are_rejected() {
        assert!(Delaunay::from_triangles(vec![[0, 1, 4]], 4).is_err());
        assert!(Delaunay::from_triangles(vec![[0, 1, 1]], 4).is_err());
        assert!(
            Delaunay::from_triangles(vec![[0, 1, 2], [1, 0, 3], [0, 1, 4]], 5).is_err()
        );
    }

    #[test]
    fn delaunator_covers_square() {
        let points = [[0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [1.0, 1.0]];
        let delaunay = Delaunay::triangulate(&points, &DelaunatorTriangulator).unwrap();
        assert_eq!(delaunay.num_triangles(), 2);
        assert_eq!(delaunay.num_points(), 4);
        assert_eq!(delaunay.num_edges(), 5);

        let collinear = [[0.0, 0.0], [1.0, 1.0], [2.0, 2.0]];
        assert!(Delaunay::triangulate(&collinear, &DelaunatorTriangulator).is_err());
    }
}
