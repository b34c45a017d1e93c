/// MNA rows of a two-terminal device; `None` marks the ground terminal.
///
/// Produces the symmetric four-entry pattern shared by conductances and
/// capacitances: `+1` on both diagonals, `-1` on both off-diagonals, with
/// ground rows and columns omitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodePairStamp {
    pub pos: Option<usize>,
    pub neg: Option<usize>,
}

impl NodePairStamp {
    pub fn new(pos: Option<usize>, neg: Option<usize>) -> Self {
        Self { pos, neg }
    }

    /// `(row, col, sign)` entries of the pattern.
    pub fn entries(&self) -> Vec<(usize, usize, f64)> {
        let mut entries = Vec::with_capacity(4);
        if let Some(pos) = self.pos {
            entries.push((pos, pos, 1.0));
        }
        if let Some(neg) = self.neg {
            entries.push((neg, neg, 1.0));
        }
        if let (Some(pos), Some(neg)) = (self.pos, self.neg) {
            entries.push((pos, neg, -1.0));
            entries.push((neg, pos, -1.0));
        }
        entries
    }

    /// `(row, sign)` pairs for a current injected from `pos` to `neg` through
    /// the device, as seen on the right-hand side.
    pub fn injection(&self) -> Vec<(usize, f64)> {
        let mut pattern = Vec::with_capacity(2);
        if let Some(pos) = self.pos {
            pattern.push((pos, -1.0));
        }
        if let Some(neg) = self.neg {
            pattern.push((neg, 1.0));
        }
        pattern
    }
}

/// MNA rows of a device with its own branch-current unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeBranchPairStamp {
    pub pos: Option<usize>,
    pub neg: Option<usize>,
    pub branch: usize,
}

impl NodeBranchPairStamp {
    pub fn new(pos: Option<usize>, neg: Option<usize>, branch: usize) -> Self {
        Self { pos, neg, branch }
    }

    /// `(row, col, sign)` entries coupling the branch current into the KCL
    /// rows and the terminal voltages into the branch row.
    pub fn incidence(&self) -> Vec<(usize, usize, f64)> {
        let mut entries = Vec::with_capacity(4);
        if let Some(pos) = self.pos {
            // (pos, branch), (branch, pos)
            entries.push((pos, self.branch, 1.0));
            entries.push((self.branch, pos, 1.0));
        }
        if let Some(neg) = self.neg {
            // (neg, branch), (branch, neg)
            entries.push((neg, self.branch, -1.0));
            entries.push((self.branch, neg, -1.0));
        }
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grounded_pair_keeps_one_diagonal() {
        assert_eq!(NodePairStamp::new(Some(2), None).entries(), vec![(2, 2, 1.0)]);
        assert_eq!(NodePairStamp::new(None, Some(0)).injection(), vec![(0, 1.0)]);
    }

    #[test]
    fn incidence_is_symmetric() {
        let stamp = NodeBranchPairStamp::new(Some(0), Some(1), 4);
        let entries = stamp.incidence();
        for (row, col, sign) in &entries {
            assert!(entries.contains(&(*col, *row, *sign)));
        }
        assert_eq!(entries.len(), 4);
    }
}
