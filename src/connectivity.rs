use crate::arrays::Array2D;
use assume::assume;
use multiversion::multiversion;

/// Label of cells outside of the image or the block grid. Never equal to a superpixel label.
pub const OUTSIDE: u32 = u32::MAX;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Axis {
    /// The pair is `(x, y)` and `(x + 1, y)`.
    Horizontal,
    /// The pair is `(x, y)` and `(x, y + 1)`.
    Vertical,
}

/// Which cell of the pair is moved.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Side {
    /// The first cell moves to the label of the second one.
    Forward,
    /// The second cell moves to the label of the first one.
    Backward,
}

/// Labels around a pair of neighboring cells: 3 rows by 4 columns for a horizontal pair,
/// 4 rows by 3 columns for a vertical pair. The first cell of the pair is at window position
/// `(1, 1)`.
#[derive(Clone, Debug)]
pub struct PairWindow {
    axis: Axis,
    cells: [u32; 12],
}

impl PairWindow {
    /// Collects the window around the pair starting at `(x, y)`. `label` returns `None` outside of
    /// the grid.
    #[inline(always)]
    pub fn gather<F>(axis: Axis, x: usize, y: usize, label: F) -> PairWindow
    where
        F: Fn(usize, usize) -> Option<u32>,
    {
        let (cols, rows) = Self::shape(axis);
        let mut cells = [OUTSIDE; 12];
        for r in 0..rows {
            for c in 0..cols {
                if let (Some(cx), Some(cy)) = ((x + c).checked_sub(1), (y + r).checked_sub(1)) {
                    cells[r * cols + c] = label(cx, cy).unwrap_or(OUTSIDE);
                }
            }
        }
        PairWindow { axis, cells }
    }

    /// Window of the labels of an `Array2D`.
    pub fn from_labels(axis: Axis, x: usize, y: usize, labels: &Array2D<u32>) -> PairWindow {
        Self::gather(axis, x, y, |cx, cy| labels.get(cx, cy).copied())
    }

    #[inline(always)]
    fn shape(axis: Axis) -> (usize, usize) {
        match axis {
            Axis::Horizontal => (4, 3),
            Axis::Vertical => (3, 4),
        }
    }

    #[inline(always)]
    fn cell(&self, c: usize, r: usize) -> u32 {
        let (cols, _) = Self::shape(self.axis);
        self.cells[r * cols + c]
    }

    pub fn axis(&self) -> Axis {
        self.axis
    }

    /// Label of the first cell of the pair.
    #[inline(always)]
    pub fn first(&self) -> u32 {
        self.cell(1, 1)
    }

    /// Label of the second cell of the pair.
    #[inline(always)]
    pub fn second(&self) -> u32 {
        match self.axis {
            Axis::Horizontal => self.cell(2, 1),
            Axis::Vertical => self.cell(1, 2),
        }
    }

    /// The 3x3 neighborhood of the cell that moves on `side`, as `[row][column]`.
    #[inline(always)]
    pub fn neighborhood(&self, side: Side) -> [[u32; 3]; 3] {
        let (dc, dr) = match (self.axis, side) {
            (_, Side::Forward) => (0, 0),
            (Axis::Horizontal, Side::Backward) => (1, 0),
            (Axis::Vertical, Side::Backward) => (0, 1),
        };
        std::array::from_fn(|r| std::array::from_fn(|c| self.cell(c + dc, r + dr)))
    }

    /// Number of window cells outside of the pair itself carrying `label`.
    #[inline(always)]
    pub fn prior(&self, label: u32) -> u32 {
        let (cols, _) = Self::shape(self.axis);
        let pair = match self.axis {
            Axis::Horizontal => [cols + 1, cols + 2],
            Axis::Vertical => [cols + 1, 2 * cols + 1],
        };
        self.cells
            .iter()
            .enumerate()
            .filter(|(i, l)| **l == label && !pair.contains(i))
            .count() as u32
    }
}

/// Returns `true` when moving the center cell of the 3x3 neighborhood `w` out of its label would
/// disconnect that label.
///
/// For a horizontal forward move the center goes to its right neighbor, for a backward move to
/// its left neighbor (vertical: below and above). The rules only look at the neighborhood, so
/// they reject some moves that would not disconnect anything.
pub fn check_split(w: &[[u32; 3]; 3], axis: Axis, side: Side) -> bool {
    let [[a11, a12, a13], [a21, a22, a23], [a31, a32, a33]] = *w;
    match (axis, side) {
        (Axis::Horizontal, Side::Forward) => {
            (a22 != a21 && a22 == a12 && a22 == a32)
                || (a22 != a11 && a22 == a12 && a22 == a21)
                || (a22 != a31 && a22 == a32 && a22 == a21)
        }
        (Axis::Horizontal, Side::Backward) => {
            (a22 != a23 && a22 == a12 && a22 == a32)
                || (a22 != a13 && a22 == a12 && a22 == a23)
                || (a22 != a33 && a22 == a32 && a22 == a23)
        }
        (Axis::Vertical, Side::Forward) => {
            (a22 != a12 && a22 == a21 && a22 == a23)
                || (a22 != a11 && a22 == a21 && a22 == a12)
                || (a22 != a13 && a22 == a23 && a22 == a12)
        }
        (Axis::Vertical, Side::Backward) => {
            (a22 != a32 && a22 == a21 && a22 == a23)
                || (a22 != a31 && a22 == a21 && a22 == a32)
                || (a22 != a33 && a22 == a23 && a22 == a32)
        }
    }
}

pub struct DisjointSet {
    parents: Vec<u32>,
}

impl DisjointSet {
    pub fn new(size: u32) -> Self {
        assert!(size > 0, "Size must be larger than zero.");
        assert!(size < u32::MAX, "Size must be smaller than {}", u32::MAX);
        DisjointSet {
            parents: (0..size).collect(),
        }
    }

    /// Joins the sets of both nodes. The root of every set is its smallest node.
    #[inline]
    pub fn merge(&mut self, node_i: u32, node_j: u32) {
        let mut root_x = node_i as usize;
        let mut root_y = node_j as usize;
        let mut parent_x = self.parents[root_x];
        let mut parent_y = self.parents[root_y];
        while parent_x != parent_y {
            if parent_x > parent_y {
                assume!(unsafe: root_x < self.parents.len(), "root: {root_x} > {}", self.parents.len());
                if root_x as u32 == parent_x {
                    self.parents[root_x] = parent_y;
                    break;
                }
                let z = parent_x as usize;
                parent_x = self.parents[z];
                self.parents[root_x] = parent_y;
                root_x = z;
            } else {
                assume!(unsafe: root_y < self.parents.len(), "root: {root_y} > {}", self.parents.len());
                if root_y as u32 == parent_y {
                    self.parents[root_y] = parent_x;
                    break;
                }
                let z = parent_y as usize;
                parent_y = self.parents[z];
                self.parents[root_y] = parent_x;
                root_y = z;
            }
        }
    }

    /// Numbers the sets `0..` in the order of their smallest node and returns the number of every
    /// node together with the number of sets.
    pub fn flatten(&self) -> (Vec<u32>, u32) {
        let mut assignment = vec![u32::MAX; self.parents.len()];
        let mut num_components = 0;
        for (i, parent) in self.parents.iter().enumerate() {
            let parent = *parent as usize;
            if parent < i {
                assume!(unsafe: parent < assignment.len(), "parent: {parent} > {}", assignment.len());
                // parents are always smaller, so they are numbered already
                assignment[i] = assignment[parent];
            } else {
                assignment[i] = num_components;
                num_components += 1;
            }
        }
        (assignment, num_components)
    }
}

#[multiversion(targets = "simd")]
pub fn assign_disjoint_set(labels: &Array2D<u32>) -> DisjointSet {
    let mut cc_set = DisjointSet::new(labels.data.len() as u32);
    for (x, pair) in labels.get_row(0).windows(2).enumerate() {
        if pair[0] == pair[1] {
            cc_set.merge(x as u32, x as u32 + 1);
        }
    }
    for row_num in 1..labels.height {
        let mut index_u = labels.get_index(0, row_num);
        let mut index_up_u = labels.get_index(0, row_num - 1);
        if labels.data[index_u] == labels.data[index_up_u] {
            cc_set.merge(index_up_u as u32, index_u as u32);
        }
        let mut left_label = labels.data[index_u];
        index_u += 1;
        index_up_u += 1;
        for _ in 1..labels.width {
            let label = labels.data[index_u];
            let label_up = labels.data[index_up_u];
            if label == left_label {
                cc_set.merge((index_u - 1) as u32, index_u as u32);
                if label_up == label {
                    cc_set.merge((index_u - 1) as u32, index_up_u as u32);
                }
            } else if label_up == label {
                cc_set.merge(index_u as u32, index_up_u as u32);
            }
            index_u += 1;
            index_up_u += 1;
            left_label = label;
        }
    }
    cc_set
}

/// Gives every 4-connected component its own label, numbered `0..` in raster order of the first
/// pixel of the component.
///
/// Returns how many more components there are than distinct labels before the relabelling, i.e.
/// how many superpixels were split into several pieces.
pub fn relabel_connected(labels: &mut Array2D<u32>) -> usize {
    if labels.data.is_empty() {
        return 0;
    }
    let mut distinct = labels.data.to_vec();
    distinct.sort_unstable();
    distinct.dedup();
    let (assignment, num_components) = assign_disjoint_set(labels).flatten();
    for (label, component) in labels.data.iter_mut().zip(assignment) {
        *label = component;
    }
    num_components as usize - distinct.len()
}
