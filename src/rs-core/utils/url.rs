use std::fmt::Display;

/// Abstraction allowing to help with the handling of URLs
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Url {
    inner: String,
}

impl Url {
    pub fn new(url: String) -> Self {
        Self { inner: url }
    }

    /// Build the websocket endpoint of a segment channel from its namespace.
    ///
    /// A namespace which is already an absolute URL is kept as is, otherwise it is
    /// considered to be `host[:port]/namespace` and prefixed by the websocket scheme
    /// corresponding to the page's own scheme.
    pub fn websocket_endpoint(namespace: &str, secure_page: bool) -> Self {
        if is_absolute_url(namespace.as_bytes()) {
            Url::new(namespace.to_owned())
        } else {
            let scheme = if secure_page { "wss" } else { "ws" };
            Url::new(format!("{}://{}", scheme, namespace))
        }
    }

    pub fn get_ref(&self) -> &str {
        self.inner.as_str()
    }

    /// Returns the last path segment of the URL, without query string or fragment.
    pub fn filename(&self) -> &str {
        let hash_idx = self.inner.find('#');
        let parsed = match hash_idx {
            Some(idx) => &self.inner[0..idx],
            None => &self.inner,
        };
        let query_idx = parsed.find('?');
        let parsed = match query_idx {
            Some(idx) => &parsed[0..idx],
            None => parsed,
        };
        let last_slash = parsed.rfind('/');
        match last_slash {
            Some(idx) => &parsed[idx + 1..],
            None => parsed,
        }
    }

    /// Returns the extension of the URL's filename, without the dot.
    ///
    /// Returns an empty string if there's none.
    pub fn extension(&self) -> &str {
        let filename = self.filename();
        let last_dot = filename.rfind('.');
        match last_dot {
            Some(idx) => &filename[idx + 1..],
            None => "",
        }
    }

    /// Returns `true` if the URL's filename ends with the given extension (given without the
    /// dot), ignoring ASCII case.
    pub fn has_extension(&self, ext: &str) -> bool {
        self.extension().eq_ignore_ascii_case(ext)
    }
}

impl Display for Url {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.get_ref())
    }
}

fn is_absolute_url(bytes: &[u8]) -> bool {
    let mut offset = 0;
    loop {
        if bytes.len() < offset + 1 {
            return false;
        }
        if bytes[offset].is_ascii_alphabetic() {
            offset += 1;
            continue;
        } else if bytes[offset] == b':' {
            if offset == 0 {
                return false;
            }
            offset += 1;
            break;
        } else {
            break;
        }
    }

    if bytes.len() < offset + 2 {
        false
    } else {
        &bytes[offset..offset + 2] == b"//"
    }
}
