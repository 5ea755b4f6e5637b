use parking_lot::RwLock;

/// Navigation state supplied by the embedder.
///
/// The dispatcher reads it fresh on every invocation so the base context
/// always reflects where the action was actually triggered.
pub trait NavigationPort: Send + Sync {
    fn current_path(&self) -> String;
    fn page_title(&self) -> String;
}

/// Settable navigation state for tests, the demo CLI, and embedders that
/// push navigation changes in.
pub struct StaticNav {
    location: RwLock<(String, String)>,
}

impl StaticNav {
    pub fn new(path: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            location: RwLock::new((path.into(), title.into())),
        }
    }

    pub fn navigate(&self, path: impl Into<String>, title: impl Into<String>) {
        *self.location.write() = (path.into(), title.into());
    }
}

impl NavigationPort for StaticNav {
    fn current_path(&self) -> String {
        self.location.read().0.clone()
    }

    fn page_title(&self) -> String {
        self.location.read().1.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn navigate_updates_both_fields() {
        let nav = StaticNav::new("/home", "Homepage");
        nav.navigate("/contact", "Contact Us");
        assert_eq!(nav.current_path(), "/contact");
        assert_eq!(nav.page_title(), "Contact Us");
    }
}
