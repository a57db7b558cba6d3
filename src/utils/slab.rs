//! Arena of task frames addressed by stable handles.

use std::fmt;

/// Stable handle to a slot in a [`Slab`].
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct FrameId(usize);

impl fmt::Debug for FrameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

pub(crate) struct Slab<T> {
    items: Vec<Option<T>>,
    free: Vec<usize>,
}

impl<T> Slab<T> {
    pub(crate) fn new(size: usize) -> Self {
        let items = (0..size).map(|_| None).collect();
        // Popped from the back, so low indices are handed out first.
        let free = (0..size).rev().collect();

        Self { items, free }
    }

    /// Releases the slot and hands its value back.
    ///
    /// # Panics
    /// Panics if the slot was already released.
    pub(crate) fn remove(&mut self, id: FrameId) -> T {
        let item = self
            .items
            .get_mut(id.0)
            .and_then(Option::take)
            .unwrap_or_else(|| panic!("task frame {id:?} released twice"));

        self.free.push(id.0);

        item
    }

    pub(crate) fn insert(&mut self, item: T) -> FrameId {
        self.insert_with(|_| item)
    }

    /// Inserts a value built from the handle it is about to occupy.
    pub(crate) fn insert_with(&mut self, build: impl FnOnce(FrameId) -> T) -> FrameId {
        let index = if let Some(i) = self.free.pop() {
            i
        } else {
            let len = self.items.len();
            let new_len = if len == 0 { 1 } else { 2 * len };

            self.items.extend((len..new_len).map(|_| None));
            self.free.extend(((len + 1)..new_len).rev());

            len
        };

        self.items[index] = Some(build(FrameId(index)));

        FrameId(index)
    }

    pub(crate) fn get(&self, id: FrameId) -> &T {
        self.items[id.0]
            .as_ref()
            .unwrap_or_else(|| panic!("task frame {id:?} used after release"))
    }

    pub(crate) fn get_mut(&mut self, id: FrameId) -> &mut T {
        self.items[id.0]
            .as_mut()
            .unwrap_or_else(|| panic!("task frame {id:?} used after release"))
    }

    pub(crate) fn len(&self) -> usize {
        self.items.len() - self.free.len()
    }
}
