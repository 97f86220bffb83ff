use serde::{ser::SerializeStruct, Deserialize, Deserializer, Serialize};

use crate::errors::BoundaryError;

/// Axis-aligned rectangular range of cell indices in `D` dimensions.
///
/// Both corners are inclusive, ie. a box with `lo = [0, 0]` and `hi = [3, 1]` contains
/// `4 * 2 = 8` cells. Apart from the explicitly [empty](IndexBox::empty) box, every box
/// satisfies `hi[a] >= lo[a]` for all axes.
///
/// ```
/// # use gridcalc_concepts::IndexBox;
/// let ibox = IndexBox::new([0, 0, 0], [3, 3, 3])?;
/// assert_eq!(ibox.dimensions(), [4, 4, 4]);
/// assert_eq!(ibox.n_cells(), 64);
/// assert!(ibox.contains(&[3, 0, 2]));
/// assert!(!ibox.contains(&[4, 0, 2]));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct IndexBox<const D: usize> {
    lo: [i64; D],
    hi: [i64; D],
}

impl<const D: usize> IndexBox<D> {
    /// Construct a new box from its lower and upper (inclusive) corner.
    pub fn new(lo: impl Into<[i64; D]>, hi: impl Into<[i64; D]>) -> Result<Self, BoundaryError> {
        let lo: [i64; D] = lo.into();
        let hi: [i64; D] = hi.into();
        for a in 0..D {
            if hi[a] < lo[a] {
                return Err(BoundaryError(format!(
                    "Upper corner {:?} must not be below lower corner {:?} in axis {}",
                    hi, lo, a
                )));
            }
        }
        Ok(Self { lo, hi })
    }

    /// Construct the box spanning `n_cells[a]` cells in every axis starting at the origin.
    pub fn from_dimensions(n_cells: impl Into<[usize; D]>) -> Result<Self, BoundaryError> {
        let n_cells: [usize; D] = n_cells.into();
        if n_cells.iter().any(|&n| n == 0) {
            return Err(BoundaryError(format!(
                "Every axis needs at least one cell but got dimensions {:?}",
                n_cells
            )));
        }
        Self::new([0; D], core::array::from_fn(|a| n_cells[a] as i64 - 1))
    }

    /// The explicitly empty box which contains no cells.
    pub fn empty() -> Self {
        Self {
            lo: [0; D],
            hi: [-1; D],
        }
    }

    /// Returns true if the box does not contain any cell.
    pub fn is_empty(&self) -> bool {
        (0..D).any(|a| self.hi[a] < self.lo[a])
    }

    /// Lower inclusive corner
    pub fn lo(&self) -> [i64; D] {
        self.lo
    }

    /// Upper inclusive corner
    pub fn hi(&self) -> [i64; D] {
        self.hi
    }

    /// Number of cells along each axis `hi - lo + 1`.
    pub fn dimensions(&self) -> [usize; D] {
        core::array::from_fn(|a| (self.hi[a] - self.lo[a] + 1).max(0) as usize)
    }

    /// Total number of cells contained in this box.
    pub fn n_cells(&self) -> usize {
        self.dimensions().iter().product()
    }

    /// Checks if the given index lies inside of the box.
    #[inline]
    pub fn contains(&self, index: &[i64; D]) -> bool {
        (0..D).all(|a| self.lo[a] <= index[a] && index[a] <= self.hi[a])
    }

    /// Checks if the other box lies completely inside of this box.
    ///
    /// The empty box is contained in every box.
    pub fn contains_box(&self, other: &Self) -> bool {
        other.is_empty() || (self.contains(&other.lo) && self.contains(&other.hi))
    }

    /// Grows the box by `n` cells in every direction.
    /// Negative values shrink the box.
    pub fn grow(&self, n: i64) -> Self {
        if self.is_empty() {
            return *self;
        }
        let mut res = *self;
        for a in 0..D {
            res.lo[a] -= n;
            res.hi[a] += n;
        }
        res
    }

    /// Translates the box by `n` cells along axis `dir`.
    pub fn shift(&self, dir: usize, n: i64) -> Self {
        let mut res = *self;
        res.lo[dir] += n;
        res.hi[dir] += n;
        res
    }

    /// Returns the sub-box restricted to `lo..=hi` in axis `dir`.
    ///
    /// The result is clipped to the original box and may be [empty](IndexBox::empty).
    pub fn restrict_axis(&self, dir: usize, lo: i64, hi: i64) -> Self {
        let mut res = *self;
        res.lo[dir] = res.lo[dir].max(lo);
        res.hi[dir] = res.hi[dir].min(hi);
        if res.is_empty() {
            Self::empty()
        } else {
            res
        }
    }

    /// Calculates the cells which are shared by both boxes.
    pub fn intersection(&self, other: &Self) -> Option<Self> {
        let lo = core::array::from_fn(|a| self.lo[a].max(other.lo[a]));
        let hi = core::array::from_fn(|a| self.hi[a].min(other.hi[a]));
        let res = Self { lo, hi };
        if res.is_empty() {
            None
        } else {
            Some(res)
        }
    }

    /// Iterates over all cells of the box in lexicographic order with axis `0` varying fastest.
    ///
    /// ```
    /// # use gridcalc_concepts::IndexBox;
    /// let ibox = IndexBox::new([0, 5], [1, 6])?;
    /// let cells: Vec<_> = ibox.cells().collect();
    /// assert_eq!(cells, vec![[0, 5], [1, 5], [0, 6], [1, 6]]);
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn cells(&self) -> BoxCells<D> {
        BoxCells {
            lo: self.lo,
            hi: self.hi,
            next: if self.is_empty() { None } else { Some(self.lo) },
        }
    }

    /// Iterates over the starting cells of all pencils of the box.
    ///
    /// A pencil is the row of cells along axis `0`.
    /// Every yielded index has `index[0] == lo[0]` and the caller is responsible
    /// for running over the `dimensions()[0]` cells of the pencil.
    ///
    /// ```
    /// # use gridcalc_concepts::IndexBox;
    /// let ibox = IndexBox::new([2, 0, 0], [9, 1, 2])?;
    /// assert_eq!(ibox.pencils().count(), 6);
    /// assert!(ibox.pencils().all(|start| start[0] == 2));
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn pencils(&self) -> BoxCells<D> {
        if self.is_empty() {
            return Self::empty().cells();
        }
        let mut outer = *self;
        outer.hi[0] = outer.lo[0];
        outer.cells()
    }
}

impl<const D: usize> core::fmt::Display for IndexBox<D> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "[{:?} .. {:?}]", self.lo, self.hi)
    }
}

/// Iterator over the cells of an [IndexBox], see [IndexBox::cells].
#[derive(Clone, Debug)]
pub struct BoxCells<const D: usize> {
    lo: [i64; D],
    hi: [i64; D],
    next: Option<[i64; D]>,
}

impl<const D: usize> Iterator for BoxCells<D> {
    type Item = [i64; D];

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        let mut following = current;
        let mut exhausted = true;
        for a in 0..D {
            if following[a] < self.hi[a] {
                following[a] += 1;
                exhausted = false;
                break;
            }
            following[a] = self.lo[a];
        }
        self.next = if exhausted { None } else { Some(following) };
        Some(current)
    }
}

#[derive(Deserialize)]
#[serde(rename(deserialize = "IndexBox"))]
struct __IndexBoxSerde {
    lo: Vec<i64>,
    hi: Vec<i64>,
}

impl<const D: usize> Serialize for IndexBox<D> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("IndexBox", 2)?;
        state.serialize_field("lo", &self.lo[..])?;
        state.serialize_field("hi", &self.hi[..])?;
        state.end()
    }
}

impl<'de, const D: usize> Deserialize<'de> for IndexBox<D> {
    fn deserialize<De>(deserializer: De) -> Result<Self, De::Error>
    where
        De: Deserializer<'de>,
    {
        use serde::de::Error;
        let s = __IndexBoxSerde::deserialize(deserializer)?;
        let lo: [i64; D] = s.lo.try_into().map_err(|v: Vec<i64>| {
            De::Error::invalid_length(v.len(), &"as many lower corner entries as dimensions")
        })?;
        let hi: [i64; D] = s.hi.try_into().map_err(|v: Vec<i64>| {
            De::Error::invalid_length(v.len(), &"as many upper corner entries as dimensions")
        })?;
        let empty = Self::empty();
        if lo == empty.lo && hi == empty.hi {
            return Ok(empty);
        }
        Self::new(lo, hi).map_err(De::Error::custom)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn reject_inverted_corners() {
        assert!(IndexBox::new([0, 0], [3, -1]).is_err());
        assert!(IndexBox::new([0, 0], [0, 0]).is_ok());
        assert!(IndexBox::<3>::from_dimensions([4, 0, 4]).is_err());
    }

    #[test]
    fn empty_box() {
        let ibox = IndexBox::<3>::empty();
        assert!(ibox.is_empty());
        assert_eq!(ibox.n_cells(), 0);
        assert_eq!(ibox.cells().count(), 0);
        assert_eq!(ibox.pencils().count(), 0);
        assert_eq!(ibox.grow(2), ibox);
    }

    #[test]
    fn cells_are_lexicographic_and_restartable() {
        let ibox = IndexBox::new([-1, 2, 0], [1, 3, 1]).unwrap();
        let first: Vec<_> = ibox.cells().collect();
        let second: Vec<_> = ibox.cells().collect();
        assert_eq!(first, second);
        assert_eq!(first.len(), ibox.n_cells());
        assert_eq!(first[0], [-1, 2, 0]);
        assert_eq!(first[1], [0, 2, 0]);
        assert_eq!(first[3], [-1, 3, 0]);
        assert_eq!(*first.last().unwrap(), [1, 3, 1]);
        assert!(first.iter().all(|c| ibox.contains(c)));
    }

    #[test]
    fn pencils_cover_all_cells() {
        let ibox = IndexBox::new([0, 0, 0], [4, 2, 3]).unwrap();
        let len = ibox.dimensions()[0] as i64;
        let cells: Vec<_> = ibox
            .pencils()
            .flat_map(|start| (0..len).map(move |i| [start[0] + i, start[1], start[2]]))
            .collect();
        assert_eq!(cells, ibox.cells().collect::<Vec<_>>());
    }

    #[test]
    fn grow_shift_restrict_intersect() {
        let ibox = IndexBox::new([0, 0], [3, 3]).unwrap();
        let grown = ibox.grow(1);
        assert_eq!(grown.lo(), [-1, -1]);
        assert_eq!(grown.hi(), [4, 4]);
        assert!(grown.contains_box(&ibox));
        assert!(!ibox.contains_box(&grown));

        let shifted = ibox.shift(1, 4);
        assert_eq!(shifted.lo(), [0, 4]);
        assert_eq!(ibox.intersection(&shifted), None);
        assert_eq!(
            grown.intersection(&shifted),
            Some(IndexBox::new([0, 4], [3, 4]).unwrap())
        );

        let slab = ibox.restrict_axis(1, 2, 10);
        assert_eq!(slab.lo(), [0, 2]);
        assert_eq!(slab.hi(), [3, 3]);
        assert!(ibox.restrict_axis(1, 5, 10).is_empty());
    }

    #[test]
    fn serialize_index_box() {
        use serde_test::{assert_tokens, Token};
        let ibox = IndexBox::new([0, -1], [3, 7]).unwrap();
        let tokens = [
            Token::Struct {
                name: "IndexBox",
                len: 2,
            },
            Token::Str("lo"),
            Token::Seq { len: Some(2) },
            Token::I64(0),
            Token::I64(-1),
            Token::SeqEnd,
            Token::Str("hi"),
            Token::Seq { len: Some(2) },
            Token::I64(3),
            Token::I64(7),
            Token::SeqEnd,
            Token::StructEnd,
        ];
        assert_tokens(&ibox, &tokens);
    }

    #[test]
    fn deserialize_rejects_wrong_dimension() {
        use serde_test::{assert_de_tokens_error, Token};
        assert_de_tokens_error::<IndexBox<3>>(
            &[
                Token::Struct {
                    name: "IndexBox",
                    len: 2,
                },
                Token::Str("lo"),
                Token::Seq { len: Some(2) },
                Token::I64(0),
                Token::I64(0),
                Token::SeqEnd,
                Token::Str("hi"),
                Token::Seq { len: Some(2) },
                Token::I64(1),
                Token::I64(1),
                Token::SeqEnd,
                Token::StructEnd,
            ],
            "invalid length 2, expected as many lower corner entries as dimensions",
        );
    }
}
