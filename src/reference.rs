//! URI-or-fragment references (`$ref`, `$schema`, document locations).
//!
//! A [`Reference`] is either a full absolute URL or a relative reference that
//! still needs a base. Relative references are kept verbatim and only become
//! URLs through [`Reference::inherit`]. The fragment, when present, is always
//! read as a JSON Pointer into the referenced document.
use std::fmt;
use std::path::Path;

use percent_encoding::percent_decode_str;
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum ReferenceError {
    #[error("invalid reference `{reference}`: {reason}")]
    Invalid { reference: String, reason: String },

    #[error("cannot resolve reference `{reference}` against base `{base}`: {reason}")]
    Inheritance {
        base: String,
        reference: String,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Repr {
    Absolute(Url),
    Relative(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Reference {
    repr: Repr,
}

// ------------------------------- Parsing --------------------------------- //

impl Reference {
    pub fn parse(raw: &str) -> Result<Self, ReferenceError> {
        let repr = match Url::parse(raw) {
            Ok(url) => Repr::Absolute(url),
            Err(url::ParseError::RelativeUrlWithoutBase) => Repr::Relative(raw.to_string()),
            Err(error) => {
                return Err(ReferenceError::Invalid {
                    reference: raw.to_string(),
                    reason: error.to_string(),
                });
            }
        };
        let reference = Self { repr };
        // fragment must be a usable JSON Pointer (or empty)
        reference.try_pointer()?;
        Ok(reference)
    }

    /// Reference for a top-level document location: an absolute URL, or a
    /// filesystem path (relative paths resolve against the working directory)
    /// with an optional `#fragment` kept on the resulting `file://` URL.
    pub fn for_location(location: &str) -> Result<Self, ReferenceError> {
        let invalid = |reason: String| ReferenceError::Invalid {
            reference: location.to_string(),
            reason,
        };
        match Url::parse(location) {
            // single-letter "schemes" are Windows drive letters, not URLs
            Ok(url) if url.scheme().len() > 1 => return Self::parse(location),
            Ok(_) | Err(url::ParseError::RelativeUrlWithoutBase) => {}
            Err(error) => return Err(invalid(error.to_string())),
        }
        if location.contains("://") {
            return Err(invalid("malformed URL".to_string()));
        }

        let (file, fragment) = match location.split_once('#') {
            Some((file, fragment)) => (file, Some(fragment)),
            None => (location, None),
        };
        let path = Path::new(file);
        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            let cwd = std::env::current_dir()
                .map_err(|error| invalid(format!("cannot read working directory: {error}")))?;
            cwd.join(path)
        };
        let mut url = Url::from_file_path(&absolute)
            .map_err(|()| invalid("not a valid file path".to_string()))?;
        url.set_fragment(fragment);
        Self::parse(url.as_str())
    }

    pub fn from_url(url: Url) -> Self {
        Self { repr: Repr::Absolute(url) }
    }
}

// ------------------------------- Queries --------------------------------- //

impl Reference {
    /// True when the reference is a complete absolute URL and needs no base.
    pub fn has_full_url(&self) -> bool {
        matches!(self.repr, Repr::Absolute(_))
    }

    pub fn url(&self) -> Option<&Url> {
        match &self.repr {
            Repr::Absolute(url) => Some(url),
            Repr::Relative(_) => None,
        }
    }

    /// Fragment-stripped form of an absolute reference. This is the identity
    /// of the document it points into.
    pub fn canonical(&self) -> Option<Url> {
        self.url().map(|url| {
            let mut url = url.clone();
            url.set_fragment(None);
            url
        })
    }

    fn raw_fragment(&self) -> Option<&str> {
        match &self.repr {
            Repr::Absolute(url) => url.fragment(),
            Repr::Relative(raw) => raw.split_once('#').map(|(_, fragment)| fragment),
        }
    }

    fn try_pointer(&self) -> Result<String, ReferenceError> {
        let Some(fragment) = self.raw_fragment() else {
            return Ok(String::new());
        };
        let decoded = percent_decode_str(fragment)
            .decode_utf8()
            .map_err(|error| ReferenceError::Invalid {
                reference: self.to_string(),
                reason: format!("fragment is not valid UTF-8: {error}"),
            })?;
        if !decoded.is_empty() && !decoded.starts_with('/') {
            return Err(ReferenceError::Invalid {
                reference: self.to_string(),
                reason: "fragment is not a JSON Pointer".to_string(),
            });
        }
        Ok(decoded.into_owned())
    }

    /// The fragment as a decoded JSON Pointer; empty means the whole document.
    pub fn pointer(&self) -> String {
        // validated in `parse`
        self.try_pointer().unwrap_or_default()
    }
}

// ------------------------------ Inheritance ------------------------------- //

impl Reference {
    /// Resolve `child` against `self`. Absolute children win outright.
    pub fn inherit(&self, child: &Reference) -> Result<Reference, ReferenceError> {
        let raw_child = match &child.repr {
            Repr::Absolute(_) => return Ok(child.clone()),
            Repr::Relative(raw) => raw,
        };
        let base = match &self.repr {
            Repr::Absolute(url) => url,
            Repr::Relative(raw) => {
                return Err(ReferenceError::Inheritance {
                    base: raw.clone(),
                    reference: raw_child.clone(),
                    reason: "base reference is not absolute".to_string(),
                });
            }
        };
        let joined = base.join(raw_child).map_err(|error| ReferenceError::Inheritance {
            base: base.to_string(),
            reference: raw_child.clone(),
            reason: error.to_string(),
        })?;
        Ok(Self::from_url(joined))
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.repr {
            Repr::Absolute(url) => write!(f, "{url}"),
            Repr::Relative(raw) => write!(f, "{raw}"),
        }
    }
}

// ------------------------------- Tests ------------------------------------ //
