//! Per-page activation registry.

use crate::PageId;
use std::collections::HashMap;
use tracing::{debug, info};

/// Something that can be uninstalled from a page.
pub trait Teardown {
    fn teardown(&mut self);
}

/// Maps each page to its live instrumentation. Replaces the "already injected"
/// marker and stashed cleanup function a page would otherwise carry.
#[derive(Debug)]
pub struct ActivationRegistry<T: Teardown> {
    entries: HashMap<PageId, T>,
}

impl<T: Teardown> Default for ActivationRegistry<T> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<T: Teardown> ActivationRegistry<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tear down any prior instance for `page`, then install a new one.
    ///
    /// The prior instance is torn down even when `install` fails; the page is
    /// left uninstrumented in that case.
    pub fn activate<F, E>(&mut self, page: PageId, install: F) -> Result<&mut T, E>
    where
        F: FnOnce() -> Result<T, E>,
    {
        if let Some(mut prior) = self.entries.remove(&page) {
            debug!(target: "lifecycle", %page, "prior_activation_torn_down");
            prior.teardown();
        }
        let instance = install()?;
        info!(target: "lifecycle", %page, "page_activated");
        Ok(self.entries.entry(page).or_insert(instance))
    }

    /// Remove and tear down. Returns whether the page was instrumented.
    pub fn deactivate(&mut self, page: PageId) -> bool {
        match self.entries.remove(&page) {
            Some(mut instance) => {
                instance.teardown();
                info!(target: "lifecycle", %page, "page_deactivated");
                true
            }
            None => false,
        }
    }

    pub fn is_instrumented(&self, page: PageId) -> bool {
        self.entries.contains_key(&page)
    }

    pub fn get_mut(&mut self, page: PageId) -> Option<&mut T> {
        self.entries.get_mut(&page)
    }

    pub fn get(&self, page: PageId) -> Option<&T> {
        self.entries.get(&page)
    }

    /// Tear down every page (process exit).
    pub fn deactivate_all(&mut self) -> usize {
        let pages: Vec<PageId> = self.entries.keys().copied().collect();
        pages.into_iter().filter(|p| self.deactivate(*p)).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    struct Counted(Rc<Cell<u32>>);

    impl Teardown for Counted {
        fn teardown(&mut self) {
            self.0.set(self.0.get() + 1);
        }
    }

    #[test]
    fn reactivation_tears_down_prior_exactly_once() {
        let first = Rc::new(Cell::new(0));
        let second = Rc::new(Cell::new(0));
        let mut reg = ActivationRegistry::new();
        let page = PageId(1);
        reg.activate::<_, ()>(page, || Ok(Counted(first.clone())))
            .unwrap();
        reg.activate::<_, ()>(page, || Ok(Counted(second.clone())))
            .unwrap();
        assert_eq!(first.get(), 1);
        assert_eq!(second.get(), 0);
        assert!(reg.is_instrumented(page));
    }

    #[test]
    fn failed_install_leaves_page_uninstrumented() {
        let first = Rc::new(Cell::new(0));
        let mut reg = ActivationRegistry::new();
        let page = PageId(3);
        reg.activate::<_, ()>(page, || Ok(Counted(first.clone())))
            .unwrap();
        let res = reg.activate(page, || Err::<Counted, _>("no document"));
        assert!(res.is_err());
        assert_eq!(first.get(), 1);
        assert!(!reg.is_instrumented(page));
    }

    #[test]
    fn deactivate_is_idempotent() {
        let hits = Rc::new(Cell::new(0));
        let mut reg = ActivationRegistry::new();
        let page = PageId(2);
        reg.activate::<_, ()>(page, || Ok(Counted(hits.clone())))
            .unwrap();
        assert!(reg.deactivate(page));
        assert!(!reg.deactivate(page));
        assert_eq!(hits.get(), 1);
    }
}
