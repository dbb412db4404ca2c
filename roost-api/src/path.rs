//! # Actor Path Module
//!
//! ## Key Concepts
//! - Address: the protocol/system (and optional host/port) an actor lives under
//! - ActorPath: hierarchical name of an actor plus the uid of one incarnation
//!
//! ## Path Format
//! `protocol://system[@host[:port]]/user/parent/child[#uid]`
//!
//! ## Equality
//! `==` and `Hash` are structural (address, elements, uid). Addressing by a
//! path whose uid is not yet known uses [`ActorPath::matches`], where uid `0`
//! matches any incarnation of the same element sequence.

use std::fmt::{self, Display};
use std::ops::Div;

use crate::errors::ActorError;
use crate::types::ActorResult;

/// The uid of a path that has not been bound to an incarnation.
pub const UNDEFINED_UID: u64 = 0;

/// Location of an actor system.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Address {
    protocol: String,
    system: String,
    host: Option<String>,
    port: Option<u16>,
}

impl Address {
    /// Creates a local-scope address.
    pub fn new(protocol: impl Into<String>, system: impl Into<String>) -> Self {
        Self {
            protocol: protocol.into(),
            system: system.into(),
            host: None,
            port: None,
        }
    }

    /// Creates an address with a network location.
    pub fn with_location(
        protocol: impl Into<String>,
        system: impl Into<String>,
        host: impl Into<String>,
        port: u16,
    ) -> Self {
        Self {
            protocol: protocol.into(),
            system: system.into(),
            host: Some(host.into()),
            port: Some(port),
        }
    }

    pub fn protocol(&self) -> &str {
        &self.protocol
    }

    pub fn system(&self) -> &str {
        &self.system
    }

    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    pub fn port(&self) -> Option<u16> {
        self.port
    }

    /// True when the address carries no network location.
    pub fn has_local_scope(&self) -> bool {
        self.host.is_none()
    }
}

impl Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", self.protocol, self.system)?;
        if let Some(host) = &self.host {
            write!(f, "@{}", host)?;
        }
        if let Some(port) = self.port {
            write!(f, ":{}", port)?;
        }
        Ok(())
    }
}

/// # Actor Path
///
/// Immutable hierarchical address of an actor. The root path has no elements.
/// Child paths are built with `/`:
///
/// ```rust
/// use roost_api::path::{ActorPath, Address};
///
/// let root = ActorPath::root(Address::new("roost", "demo"));
/// let worker = (&root / "user" / "worker").with_uid(7);
/// assert_eq!(worker.to_string(), "roost://demo/user/worker");
/// assert_eq!(worker.to_serialization_format(), "roost://demo/user/worker#7");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ActorPath {
    address: Address,
    elements: Vec<String>,
    uid: u64,
}

impl ActorPath {
    /// Root path of an address.
    pub fn root(address: Address) -> Self {
        Self {
            address,
            elements: Vec::new(),
            uid: UNDEFINED_UID,
        }
    }

    /// Builds a path from an address and already validated elements.
    pub fn from_elements<I, S>(address: Address, elements: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            address,
            elements: elements.into_iter().map(Into::into).collect(),
            uid: UNDEFINED_UID,
        }
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn elements(&self) -> &[String] {
        &self.elements
    }

    pub fn uid(&self) -> u64 {
        self.uid
    }

    /// Last element, or the empty string for the root.
    pub fn name(&self) -> &str {
        self.elements.last().map(String::as_str).unwrap_or("")
    }

    pub fn is_root(&self) -> bool {
        self.elements.is_empty()
    }

    /// Child path with an undefined uid.
    pub fn child(&self, name: impl Into<String>) -> Self {
        let mut elements = self.elements.clone();
        elements.push(name.into());
        Self {
            address: self.address.clone(),
            elements,
            uid: UNDEFINED_UID,
        }
    }

    /// Same path stamped with the uid of one incarnation.
    pub fn with_uid(&self, uid: u64) -> Self {
        Self {
            address: self.address.clone(),
            elements: self.elements.clone(),
            uid,
        }
    }

    /// Parent path, `None` for the root.
    pub fn parent(&self) -> Option<Self> {
        if self.is_root() {
            return None;
        }
        Some(Self {
            address: self.address.clone(),
            elements: self.elements[..self.elements.len() - 1].to_vec(),
            uid: UNDEFINED_UID,
        })
    }

    pub fn root_path(&self) -> Self {
        Self::root(self.address.clone())
    }

    /// Addressing equality: an undefined uid on either side matches any uid.
    pub fn matches(&self, other: &ActorPath) -> bool {
        self.address == other.address
            && self.elements == other.elements
            && (self.uid == UNDEFINED_UID || other.uid == UNDEFINED_UID || self.uid == other.uid)
    }

    /// `/user/a/b`, or `/` for the root.
    pub fn to_string_without_address(&self) -> String {
        if self.elements.is_empty() {
            return "/".to_string();
        }
        let mut out = String::new();
        for element in &self.elements {
            out.push('/');
            out.push_str(element);
        }
        out
    }

    /// Full path including `#uid` when the uid is defined.
    pub fn to_serialization_format(&self) -> String {
        if self.uid == UNDEFINED_UID {
            self.to_string()
        } else {
            format!("{}#{}", self, self.uid)
        }
    }

    /// Checks that a string can be used as a single path element.
    pub fn validate_element(name: &str) -> ActorResult<()> {
        let valid = !name.is_empty()
            && !name.contains(['/', '#', ' '])
            && !name.chars().any(char::is_control);
        if valid {
            Ok(())
        } else {
            Err(ActorError::InvalidActorName(name.to_string()))
        }
    }

    /// Parses `protocol://system[@host[:port]]/elements[#uid]`.
    pub fn parse(input: &str) -> ActorResult<Self> {
        let invalid = || ActorError::InvalidPath(input.to_string());

        let (protocol, rest) = input.split_once("://").ok_or_else(invalid)?;
        if protocol.is_empty() {
            return Err(invalid());
        }
        let (authority, path) = match rest.find('/') {
            Some(idx) => (&rest[..idx], &rest[idx..]),
            None => (rest, ""),
        };
        let address = match authority.split_once('@') {
            None if !authority.is_empty() => Address::new(protocol, authority),
            Some((system, location)) if !system.is_empty() => {
                let (host, port) = location.rsplit_once(':').ok_or_else(invalid)?;
                let port = port.parse::<u16>().map_err(|_| invalid())?;
                if host.is_empty() {
                    return Err(invalid());
                }
                Address::with_location(protocol, system, host, port)
            }
            _ => return Err(invalid()),
        };

        let mut root = ActorPath::root(address);
        root.append_elements(path).map_err(|_| invalid())?;
        Ok(root)
    }

    /// Appends the elements of an absolute, address-less path such as
    /// `/user/a/b#3` to this path.
    pub fn descendant(&self, relative: &str) -> ActorResult<Self> {
        let mut path = self.clone();
        path.uid = UNDEFINED_UID;
        path.append_elements(relative)
            .map_err(|_| ActorError::InvalidPath(relative.to_string()))?;
        Ok(path)
    }

    fn append_elements(&mut self, path: &str) -> Result<(), ()> {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let last = segments.len().saturating_sub(1);
        for (idx, segment) in segments.into_iter().enumerate() {
            let (name, uid) = match segment.split_once('#') {
                Some((name, uid)) if idx == last => {
                    (name, uid.parse::<u64>().map_err(|_| ())?)
                }
                Some(_) => return Err(()),
                None => (segment, UNDEFINED_UID),
            };
            ActorPath::validate_element(name).map_err(|_| ())?;
            self.elements.push(name.to_string());
            self.uid = uid;
        }
        Ok(())
    }
}

impl Display for ActorPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.address, self.to_string_without_address())
    }
}

impl Div<&str> for &ActorPath {
    type Output = ActorPath;

    fn div(self, name: &str) -> ActorPath {
        self.child(name)
    }
}

impl Div<&str> for ActorPath {
    type Output = ActorPath;

    fn div(mut self, name: &str) -> ActorPath {
        self.elements.push(name.to_string());
        self.uid = UNDEFINED_UID;
        self
    }
}
