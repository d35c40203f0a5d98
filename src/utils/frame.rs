use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;

pub struct Frame<K, V> {
    scopes: Vec<HashMap<K, V>>,
}

impl<K: Hash + Eq, V: Copy> Frame<K, V> {
    pub fn new() -> Self {
        Frame {
            scopes: vec![HashMap::new()],
        }
    }

    pub fn with_child<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        self.scopes.push(HashMap::new());
        let out = f(self);
        self.scopes.pop();
        out
    }

    pub fn lookup<Q>(&self, name: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(name).copied())
    }

    pub fn assoc(&mut self, name: K, value: V) -> Option<V> {
        self.scopes
            .last_mut()
            .and_then(|scope| scope.insert(name, value))
    }
}

impl<K: Hash + Eq, V: Copy> Default for Frame<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn child_scopes_shadow_and_expire() {
        let mut frame = Frame::new();
        frame.assoc("x".to_string(), 1);
        let inner = frame.with_child(|frame| {
            assert_eq!(frame.lookup("x"), Some(1));
            frame.assoc("x".to_string(), 2);
            frame.assoc("y".to_string(), 3);
            (frame.lookup("x"), frame.lookup("y"))
        });
        assert_eq!(inner, (Some(2), Some(3)));
        assert_eq!(frame.lookup("x"), Some(1));
        assert_eq!(frame.lookup("y"), None);
        assert_eq!(frame.assoc("x".to_string(), 4), Some(1));
    }
}
