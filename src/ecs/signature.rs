//! Component signatures
//!
//! A signature is a fixed-width bitset over component type slots. It is used
//! both for the set of components an entity currently owns and for the set a
//! system requires.

use std::fmt;

/// Number of distinct component types a coordinator can register.
pub const MAX_COMPONENTS: usize = 32;

/// Component type identifier, assigned sequentially at registration.
pub type ComponentType = u8;

#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Signature(u32);

impl Signature {
    pub const EMPTY: Self = Self(0);

    pub fn new() -> Self {
        Self::EMPTY
    }

    /// Builder form of `set(index, true)`.
    pub fn with(mut self, index: ComponentType) -> Self {
        self.set(index, true);
        self
    }

    pub fn set(&mut self, index: ComponentType, value: bool) {
        let bit = Self::bit(index);
        if value {
            self.0 |= bit;
        } else {
            self.0 &= !bit;
        }
    }

    pub fn set_all(&mut self, value: bool) {
        self.0 = if value { u32::MAX } else { 0 };
    }

    pub fn get(&self, index: ComponentType) -> bool {
        self.0 & Self::bit(index) != 0
    }

    /// True when every bit set in `required` is also set in `actual`.
    ///
    /// The test is one-directional: extra bits in `actual` are ignored.
    pub fn is_subset(required: Signature, actual: Signature) -> bool {
        required.0 & !actual.0 == 0
    }

    pub fn count(&self) -> u32 {
        self.0.count_ones()
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = ComponentType> + '_ {
        (0..MAX_COMPONENTS as ComponentType).filter(move |&index| self.get(index))
    }

    fn bit(index: ComponentType) -> u32 {
        assert!(
            (index as usize) < MAX_COMPONENTS,
            "component index {index} out of range"
        );
        1 << index
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({:#034b})", self.0)
    }
}

impl FromIterator<ComponentType> for Signature {
    fn from_iter<I: IntoIterator<Item = ComponentType>>(iter: I) -> Self {
        iter.into_iter().fold(Signature::new(), Signature::with)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_clear() {
        let mut sig = Signature::new();
        assert!(sig.is_empty());

        sig.set(3, true);
        sig.set(31, true);
        assert!(sig.get(3));
        assert!(sig.get(31));
        assert!(!sig.get(4));
        assert_eq!(sig.count(), 2);

        sig.set(3, false);
        assert!(!sig.get(3));
        assert_eq!(sig.iter().collect::<Vec<_>>(), vec![31]);

        sig.set_all(true);
        assert_eq!(sig.count(), MAX_COMPONENTS as u32);
        sig.set_all(false);
        assert_eq!(sig, Signature::EMPTY);
    }

    #[test]
    fn test_subset_is_one_directional() {
        let required = Signature::new().with(0).with(1);
        let actual = Signature::new().with(0).with(1).with(5);

        assert!(Signature::is_subset(required, actual));
        assert!(!Signature::is_subset(actual, required));
        assert!(!Signature::is_subset(required, Signature::new().with(0)));
        assert!(Signature::is_subset(Signature::EMPTY, Signature::EMPTY));
    }

    #[test]
    fn test_equality_is_exact() {
        let a: Signature = [1, 2].into_iter().collect();
        let b = Signature::new().with(2).with(1);
        assert_eq!(a, b);
        assert_ne!(a, b.with(3));
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_index_past_width_panics() {
        Signature::new().set(MAX_COMPONENTS as ComponentType, true);
    }
}
