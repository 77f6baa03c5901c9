use crate::error::{Error, ErrorKind, Result};
use crate::kind::Kind;
use crate::normalize::normalize;
use exn::ResultExt;
use std::fmt::{Debug, Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// Joins the kind and the normalized key. Never produced by [`normalize()`],
/// never part of a [`Kind`] name.
pub const SEPARATOR: char = '/';
/// Number of digest bytes kept in an [`AddressableHash`].
pub const HASH_BYTES: usize = 16;
/// Length of the hex-encoded [`AddressableHash`].
pub const HASH_LEN: usize = HASH_BYTES * 2;

/// Stable, provider-independent key for one logical title within one kind.
///
/// # Examples
///
/// ```
/// use mediadex_identity::{Identity, Kind};
/// let a = Identity::new(Kind::Manga, "One Piece");
/// let b = Identity::new(Kind::Manga, "one   piece!!");
/// assert_eq!(a, b);
/// assert_eq!(a.as_str(), "manga/one piece");
/// assert_ne!(a, Identity::new(Kind::Anime, "One Piece"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "String", into = "String")
)]
pub struct Identity {
    kind: Kind,
    value: String,
}
impl Identity {
    /// Derive the identity of a title of the given kind.
    pub fn new(kind: Kind, name: impl AsRef<str>) -> Self {
        Self::from_key(kind, &normalize(name))
    }

    fn from_key(kind: Kind, key: &str) -> Self {
        Self {
            kind,
            value: format!("{}{}{}", kind.as_str(), SEPARATOR, key),
        }
    }

    /// Parse the string form of an identity (`kind/key`).
    ///
    /// The key must already be normalized; an identity is never built from a
    /// raw title by parsing, use [`Identity::new`] for that.
    pub fn parse(s: impl AsRef<str>) -> Result<Self> {
        let s = s.as_ref();
        let malformed = || ErrorKind::MalformedIdentity(s.to_string());
        let Some((kind, key)) = s.split_once(SEPARATOR) else {
            exn::bail!(malformed());
        };
        let kind = kind.parse::<Kind>().or_raise(malformed)?;
        if normalize(key) != key {
            exn::bail!(malformed());
        }
        Ok(Self::from_key(kind, key))
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    /// The normalized title, without the kind prefix.
    pub fn key(&self) -> &str {
        &self.value[self.kind.as_str().len() + SEPARATOR.len_utf8()..]
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }

    /// The fixed-length digest of this identity.
    pub fn hash(&self) -> AddressableHash {
        AddressableHash::of(self)
    }
}
impl Display for Identity {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.value)
    }
}
impl AsRef<str> for Identity {
    fn as_ref(&self) -> &str {
        &self.value
    }
}
impl FromStr for Identity {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
impl TryFrom<String> for Identity {
    type Error = Error;
    fn try_from(value: String) -> Result<Self> {
        Self::parse(value)
    }
}
impl From<Identity> for String {
    fn from(value: Identity) -> Self {
        value.value
    }
}

/// Fixed-length, deterministic digest of an [`Identity`].
///
/// The first [`HASH_BYTES`] bytes of the BLAKE3 hash of the identity string,
/// hex-encoded to [`HASH_LEN`] lowercase characters. Not a security boundary:
/// it only has to be stable across processes and platforms and short enough
/// for constrained external tokens.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "String", into = "String")
)]
pub struct AddressableHash([u8; HASH_BYTES]);
impl AddressableHash {
    pub fn of(identity: &Identity) -> Self {
        let digest = blake3::hash(identity.as_str().as_bytes());
        let mut bytes = [0u8; HASH_BYTES];
        bytes.copy_from_slice(&digest.as_bytes()[..HASH_BYTES]);
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; HASH_BYTES] {
        &self.0
    }
}
impl Display for AddressableHash {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        for byte in self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}
impl Debug for AddressableHash {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "AddressableHash({self})")
    }
}
impl FromStr for AddressableHash {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self> {
        let malformed = || ErrorKind::MalformedHash(s.to_string());
        if s.len() != HASH_LEN || !s.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b)) {
            exn::bail!(malformed());
        }
        let mut bytes = [0u8; HASH_BYTES];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&s[i * 2..i * 2 + 2], 16).or_raise(malformed)?;
        }
        Ok(Self(bytes))
    }
}
impl TryFrom<String> for AddressableHash {
    type Error = Error;
    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}
impl From<AddressableHash> for String {
    fn from(value: AddressableHash) -> Self {
        value.to_string()
    }
}
impl From<&Identity> for AddressableHash {
    fn from(identity: &Identity) -> Self {
        Self::of(identity)
    }
}

/// A reference to a title, by identity or by addressable hash.
///
/// Parsing is unambiguous: identities always contain a [`SEPARATOR`], hashes
/// never do.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ContentRef {
    Identity(Identity),
    Hash(AddressableHash),
}
impl ContentRef {
    /// The addressable hash this reference resolves through.
    pub fn hash(&self) -> AddressableHash {
        match self {
            ContentRef::Identity(identity) => identity.hash(),
            ContentRef::Hash(hash) => *hash,
        }
    }
}
impl FromStr for ContentRef {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if !s.contains(SEPARATOR) {
            return Ok(Self::Hash(s.parse()?));
        }
        Ok(Self::Identity(Identity::parse(s)?))
    }
}
impl Display for ContentRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            ContentRef::Identity(identity) => Display::fmt(identity, f),
            ContentRef::Hash(hash) => Display::fmt(hash, f),
        }
    }
}
impl From<Identity> for ContentRef {
    fn from(value: Identity) -> Self {
        Self::Identity(value)
    }
}
impl From<&Identity> for ContentRef {
    fn from(value: &Identity) -> Self {
        Self::Identity(value.clone())
    }
}
impl From<AddressableHash> for ContentRef {
    fn from(value: AddressableHash) -> Self {
        Self::Hash(value)
    }
}
