//! Hierarchical verse addresses and their ordering.
//!
//! A [`Location`] is an ordered integer path, most significant component
//! first: `[3, 2]` is chapter 3, verse 2, while a bare `[3]` addresses
//! chapter 3 as a whole. Depth varies per source. Range comparison is
//! lexicographic over the shared-length prefix, and a shorter location
//! compares equal to any longer one it prefixes; that rule is what lets a
//! chapter-level bound capture every verse inside the chapter.

use core::cmp::Ordering;
use core::fmt;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Ordered integer path addressing a unit of text.
///
/// `==` is exact component-wise identity; the range order that treats a
/// shared prefix as equal lives in [`Location::compare`]. The two
/// deliberately disagree (`[3]` prefixes `[3, 5]`, so `compare` says equal
/// while `==` says distinct), which is why this type does not implement
/// `Ord`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Location(SmallVec<[u32; 4]>);

impl Location {
    /// The empty location. Compares equal to everything under
    /// [`Location::compare`]; used as the "same as start" range end.
    pub fn new() -> Self {
        Self(SmallVec::new())
    }

    /// Build a location from explicit components.
    pub fn from_slice(components: &[u32]) -> Self {
        Self(SmallVec::from_slice(components))
    }

    /// Components, most significant first.
    pub fn components(&self) -> &[u32] {
        &self.0
    }

    /// Number of components ("depth").
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when no components are present.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Copy of the component at `index`, if present.
    pub fn component(&self, index: usize) -> Option<u32> {
        self.0.get(index).copied()
    }

    /// This location extended by one more component.
    pub fn child(&self, component: u32) -> Self {
        let mut path = self.0.clone();
        path.push(component);
        Self(path)
    }

    /// Range order: lexicographic over the shared-length prefix.
    ///
    /// Locations of different depth that agree on the shared prefix are
    /// `Equal`. Consistent under reversal: `a.compare(b)` is always the
    /// inverse of `b.compare(a)`.
    pub fn compare(&self, other: &Self) -> Ordering {
        for (a, b) in self.0.iter().zip(&other.0) {
            match a.cmp(b) {
                Ordering::Equal => continue,
                unequal => return unequal,
            }
        }
        Ordering::Equal
    }

    /// The next sibling address: last component incremented by one.
    ///
    /// Used to synthesize an artificial "next verse" bound when a source
    /// has no further data of its own.
    pub fn successor(&self) -> Self {
        let mut path = self.0.clone();
        match path.last_mut() {
            Some(last) => *last += 1,
            None => path.push(1),
        }
        Self(path)
    }
}

impl fmt::Display for Location {
    /// Dotted form, e.g. `3.2`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for component in &self.0 {
            if !first {
                f.write_str(".")?;
            }
            write!(f, "{component}")?;
            first = false;
        }
        Ok(())
    }
}

impl From<&[u32]> for Location {
    fn from(components: &[u32]) -> Self {
        Self::from_slice(components)
    }
}

impl<const N: usize> From<[u32; N]> for Location {
    fn from(components: [u32; N]) -> Self {
        Self::from_slice(&components)
    }
}

impl FromIterator<u32> for Location {
    fn from_iter<I: IntoIterator<Item = u32>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Which of a source's two aligned text streams a module reads.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// The canonical stream (the original-language text).
    #[default]
    Primary,
    /// The aligned translation stream.
    Secondary,
}

/// One cached verse: dotted index, parsed address, raw text.
///
/// Produced once per fetch and read-only afterwards; per-source stores keep
/// these sorted by location.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VerseRecord {
    /// Dotted rendering of `location`, e.g. `"3.2"`.
    pub index: String,
    /// Hierarchical address of this verse.
    pub location: Location,
    /// Raw verse text as fetched.
    pub data: String,
}

impl VerseRecord {
    /// Build a record; the dotted index is derived from the location.
    pub fn new(location: Location, data: impl Into<String>) -> Self {
        Self {
            index: location.to_string(),
            location,
            data: data.into(),
        }
    }
}
