/// Stack of visited locations, the console's browser history.
///
/// Guard redirects use `replace` so a denied location never stays in the
/// stack, and `back` can never land on it again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct History {
    entries: Vec<String>,
    reload_epoch: u64,
}

impl History {
    pub fn new<S: Into<String>>(initial: S) -> Self {
        Self { entries: vec![initial.into()], reload_epoch: 0 }
    }

    /// Current location including any query string.
    pub fn location(&self) -> &str {
        self.entries.last().map(|s| s.as_str()).unwrap_or("/")
    }

    /// Current path without query or fragment.
    pub fn path(&self) -> &str { path_of(self.location()) }

    pub fn push<S: Into<String>>(&mut self, location: S) {
        self.entries.push(location.into());
    }

    pub fn replace<S: Into<String>>(&mut self, location: S) {
        match self.entries.last_mut() {
            Some(top) => *top = location.into(),
            None => self.entries.push(location.into()),
        }
    }

    /// Pop the current entry. Returns the new location, or None at the bottom.
    pub fn back(&mut self) -> Option<&str> {
        if self.entries.len() <= 1 { return None; }
        self.entries.pop();
        Some(self.location())
    }

    /// Document reload onto `location`: the stack collapses to one entry and
    /// the reload epoch moves so view state keyed on it is dropped.
    pub fn hard_reset<S: Into<String>>(&mut self, location: S) {
        self.entries.clear();
        self.entries.push(location.into());
        self.reload_epoch += 1;
    }

    pub fn reload_epoch(&self) -> u64 { self.reload_epoch }

    pub fn entries(&self) -> &[String] { &self.entries }

    pub fn len(&self) -> usize { self.entries.len() }

    pub fn is_empty(&self) -> bool { self.entries.is_empty() }
}

impl Default for History {
    fn default() -> Self { History::new("/") }
}

/// Strip query string and fragment from a location.
pub fn path_of(location: &str) -> &str {
    let end = location.find(|c: char| c == '?' || c == '#').unwrap_or(location.len());
    &location[..end]
}

/// Value of `key` in the location's query string, percent-decoded.
pub fn query_param(location: &str, key: &str) -> Option<String> {
    let q = location.split_once('?')?.1;
    let q = q.split('#').next().unwrap_or("");
    q.split('&').find_map(|pair| {
        let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
        if k == key {
            urlencoding::decode(v).ok().map(|s| s.into_owned())
        } else {
            None
        }
    })
}
