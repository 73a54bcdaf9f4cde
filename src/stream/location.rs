use std::cell::RefCell;
use std::path::Path;

enum Segment {
    File(String),
    Key(String),
    Index(usize),
}

thread_local! {
    static TRAIL: RefCell<Vec<Segment>> = const { RefCell::new(Vec::new()) };
}

/// Guard that pushes one segment onto the per-thread debug trail and pops it
/// when dropped.
#[must_use = "the segment is popped as soon as the guard is dropped"]
pub struct Location {
    _private: (),
}

impl Location {
    pub fn file(path: &Path) -> Self {
        Self::push(Segment::File(path.display().to_string()))
    }

    pub fn key(key: &str) -> Self {
        Self::push(Segment::Key(key.to_string()))
    }

    pub fn index(index: usize) -> Self {
        Self::push(Segment::Index(index))
    }

    fn push(segment: Segment) -> Self {
        TRAIL.with(|trail| trail.borrow_mut().push(segment));
        Self { _private: () }
    }
}

impl Drop for Location {
    fn drop(&mut self) {
        TRAIL.with(|trail| {
            trail.borrow_mut().pop();
        });
    }
}

/// The joined trail, e.g. `Data/Scenes/Main.scene.json::Entities[1].Name`.
pub fn location() -> String {
    TRAIL.with(|trail| {
        let trail = trail.borrow();
        if trail.is_empty() {
            return "(root)".to_string();
        }
        let mut out = String::new();
        let mut after_file = false;
        for segment in trail.iter() {
            match segment {
                Segment::File(path) => {
                    if !out.is_empty() {
                        out.push_str(" > ");
                    }
                    out.push_str(path);
                    out.push_str("::");
                    after_file = true;
                }
                Segment::Key(key) => {
                    if !out.is_empty() && !after_file {
                        out.push('.');
                    }
                    out.push_str(key);
                    after_file = false;
                }
                Segment::Index(index) => {
                    out.push_str(&format!("[{index}]"));
                    after_file = false;
                }
            }
        }
        out
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_files_keys_and_indices() {
        let _file = Location::file(Path::new("scene.json"));
        let _entities = Location::key("Entities");
        let _first = Location::index(1);
        let _name = Location::key("Name");
        assert_eq!(location(), "scene.json::Entities[1].Name");
    }

    #[test]
    fn guards_pop_on_drop() {
        {
            let _outer = Location::key("Outer");
            {
                let _inner = Location::key("Inner");
                assert_eq!(location(), "Outer.Inner");
            }
            assert_eq!(location(), "Outer");
        }
        assert_eq!(location(), "(root)");
    }
}
