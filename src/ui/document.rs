use dashmap::{DashMap, DashSet};
use std::sync::Arc;
use tracing::trace;

/// Class marking an element as hidden
pub const HIDDEN_CLASS: &str = "hidden";

/// A UI region identified by a stable id, carrying a set of class markers
#[derive(Debug)]
pub struct Element {
    id: String,
    classes: DashSet<String>,
}

impl Element {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            classes: DashSet::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn add_class(&self, class: &str) {
        self.classes.insert(class.to_string());
    }

    pub fn remove_class(&self, class: &str) {
        self.classes.remove(class);
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.contains(class)
    }

    pub fn is_hidden(&self) -> bool {
        self.has_class(HIDDEN_CLASS)
    }

    /// Add or remove the hidden marker
    pub fn set_hidden(&self, hidden: bool) {
        if hidden {
            self.add_class(HIDDEN_CLASS);
        } else {
            self.remove_class(HIDDEN_CLASS);
        }
        trace!(element = %self.id, hidden, "Visibility applied");
    }

    pub fn classes(&self) -> Vec<String> {
        let mut classes: Vec<String> = self.classes.iter().map(|c| c.key().clone()).collect();
        classes.sort();
        classes
    }
}

/// The set of elements currently attached to one page
#[derive(Debug, Default)]
pub struct Document {
    elements: DashMap<String, Arc<Element>>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach an element, replacing any element with the same id
    pub fn mount(&self, element: Element) -> Arc<Element> {
        let element = Arc::new(element);
        self.elements
            .insert(element.id().to_string(), Arc::clone(&element));
        element
    }

    /// Detach an element
    pub fn unmount(&self, id: &str) -> Option<Arc<Element>> {
        self.elements.remove(id).map(|(_, element)| element)
    }

    pub fn get_element_by_id(&self, id: &str) -> Option<Arc<Element>> {
        self.elements.get(id).map(|e| Arc::clone(e.value()))
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}
