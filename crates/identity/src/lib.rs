//! Provider-independent identities for catalog titles.
//!
//! Every title seen through any provider is addressed by an [`Identity`]: the
//! content [`Kind`] joined to the [normalized](normalize()) title. Two
//! providers listing "One Piece" and "one   piece!!" as manga produce the same
//! identity, while the anime of the same name does not.
//!
//! Identities are variable-length and human readable. Wherever one has to be
//! embedded in a length-constrained external token (button IDs, message
//! footers, subscription keys) the fixed-length [`AddressableHash`] is used
//! instead. [`ContentRef`] accepts either form.

pub mod error;
mod identity;
mod kind;
mod normalize;

pub use crate::identity::{AddressableHash, ContentRef, HASH_BYTES, HASH_LEN, Identity, SEPARATOR};
pub use crate::kind::Kind;
pub use crate::normalize::normalize;
