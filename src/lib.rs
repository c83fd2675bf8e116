//! transport header carrier for rpc messages
//!
//! Request and response metadata travels over transports that disagree
//! on header casing. HTTP-derived transports treat header names
//! case-insensitively, while others have to preserve the exact casing,
//! be it for interoperability or because the names are part of a signature.
//!
//! [`Headers`] carries both kinds of headers side by side:
//!
//! - canonical headers, inserted with [`Headers::with`], are keyed by
//!   their [canonicalized](canonicalize_header_key) name;
//! - raw headers, inserted with [`Headers::with_raw`], are keyed by
//!   the exact name given, and are never touched by a transport.
//!
//! A canonical header always takes precedence over a raw header
//! with the same canonical name.
//!
//! ```
//! use rama_transport_headers::Headers;
//!
//! let headers = Headers::new()
//!     .with("Rpc-Caller", "billing")
//!     .with_raw("X-Amz-Signature", "0a1b2c");
//!
//! assert_eq!(Some("billing"), headers.get("rpc-caller"));
//! assert_eq!(Some("0a1b2c"), headers.get("X-Amz-Signature"));
//! assert_eq!(None, headers.get("x-amz-signature"));
//!
//! // transports which do not care about provenance use the merged view
//! assert_eq!(2, headers.all_items().len());
//! ```
//!
//! # Rama
//!
//! Crate used by `rama` transports and `rama` crate authors alike.
//!
//! Learn more about `rama`:
//!
//! - Github: <https://github.com/plabayo/rama>
//! - Book: <https://ramaproxy.org/book/>

#![doc(
    html_favicon_url = "https://raw.githubusercontent.com/plabayo/rama/main/docs/img/old_logo.png"
)]
#![doc(html_logo_url = "https://raw.githubusercontent.com/plabayo/rama/main/docs/img/old_logo.png")]
#![cfg_attr(docsrs, feature(doc_auto_cfg, doc_cfg))]
#![cfg_attr(not(test), warn(clippy::print_stdout, clippy::dbg_macro))]

mod key;
#[doc(inline)]
pub use key::canonicalize_header_key;

mod items;
#[doc(inline)]
pub use items::{HeaderItems, HeaderItemsIter};

mod headers;
#[doc(inline)]
pub use headers::Headers;

#[cfg(feature = "hyperium")]
mod hyperium;
#[cfg(feature = "hyperium")]
#[doc(inline)]
pub use hyperium::HeaderMapConversionError;
