use crate::monkey::object::Object;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

// Lexically chained scopes. Children share their parent through Rc, parents
// never reference children, so the chain is acyclic. Absence of a name is an
// Option, not an error; callers decide what a miss means.
#[derive(Debug, Default)]
pub struct Environment {
    store: HashMap<String, Object>,
    outer: Option<Rc<RefCell<Environment>>>,
}

impl Environment {
    pub fn new() -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Environment {
            store: HashMap::new(),
            outer: None,
        }))
    }

    pub fn new_enclosed(outer: Rc<RefCell<Environment>>) -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Environment {
            store: HashMap::new(),
            outer: Some(outer),
        }))
    }

    pub fn get(&self, name: &str) -> Option<Object> {
        match self.store.get(name) {
            Some(value) => Some(value.clone()),
            None => match &self.outer {
                Some(outer) => outer.borrow().get(name),
                None => None,
            },
        }
    }

    // Bindings always land in the innermost scope; outer bindings can only
    // be shadowed, never reassigned.
    pub fn set(&mut self, name: impl Into<String>, value: Object) {
        self.store.insert(name.into(), value);
    }
}
