// src/domain/sequence/traversal.rs
//
// Lazy walks over a container in sequence order.
//
// Both iterators look children up by position one step at a time, so a
// caller that stops early (e.g. "nearest preceding numbered entry") never
// materializes the whole order. A walk ends at the first missing position.

use super::Sequenced;

/// Children in ascending sequence order, starting at position 1
pub struct Forward<'a, T> {
    children: &'a [T],
    next: u32,
}

/// Children in descending sequence order, strictly before a bound
pub struct Backward<'a, T> {
    children: &'a [T],
    next: u32,
}

pub fn forward<T: Sequenced>(children: &[T]) -> Forward<'_, T> {
    Forward { children, next: 1 }
}

/// Walk from `before - 1` down to position 1
pub fn backward_from<T: Sequenced>(children: &[T], before: u32) -> Backward<'_, T> {
    Backward {
        children,
        next: before.saturating_sub(1),
    }
}

fn at<T: Sequenced>(children: &[T], position: u32) -> Option<&T> {
    children
        .iter()
        .find(|child| child.sequence_number() == position)
}

impl<'a, T: Sequenced> Iterator for Forward<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        let child = at(self.children, self.next)?;
        self.next += 1;
        Some(child)
    }
}

impl<'a, T: Sequenced> Iterator for Backward<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next == 0 {
            return None;
        }

        let child = at(self.children, self.next)?;
        self.next -= 1;
        Some(child)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::sequence::engine::tests::container;

    #[test]
    fn test_forward_visits_in_order() {
        let mut children = container(4);
        children.reverse();

        let positions: Vec<u32> = forward(&children).map(|c| c.sequence_number()).collect();

        assert_eq!(positions, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_backward_is_bounded() {
        let children = container(5);

        let positions: Vec<u32> = backward_from(&children, 4)
            .map(|c| c.sequence_number())
            .collect();

        assert_eq!(positions, vec![3, 2, 1]);
    }

    #[test]
    fn test_backward_from_first_is_empty() {
        let children = container(3);

        assert_eq!(backward_from(&children, 1).count(), 0);
        assert_eq!(backward_from(&children, 0).count(), 0);
    }

    #[test]
    fn test_walk_is_lazy() {
        let children = container(10);
        let mut walk = backward_from(&children, 11);

        assert_eq!(walk.next().map(|c| c.sequence_number()), Some(10));
        assert_eq!(walk.next().map(|c| c.sequence_number()), Some(9));
    }

    #[test]
    fn test_forward_stops_at_gap() {
        let mut children = container(3);
        children[1].position = 7;

        assert_eq!(forward(&children).count(), 1);
    }
}
