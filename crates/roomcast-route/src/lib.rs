//! Route resolution for roomcast.
//!
//! A [`RouteTable`] maps an application path to a [`RouteDescriptor`]:
//! which template renders it, which stored records it shows, and which
//! client-side controllers go with it.
//!
//! Two kinds of route are supported:
//!
//! - **Literal** paths such as `/home`, matched exactly.
//! - **Pattern** paths, any path starting with `^`, compiled as regular
//!   expressions. A field value of the form `$1` is replaced by that
//!   capture group.
//!
//! ```rust
//! use roomcast_route::{RouteDescriptor, RouteTable};
//!
//! let mut routes = RouteTable::new();
//! routes.insert("/home", RouteDescriptor::new().with("template", "home")).unwrap();
//! routes
//!     .insert(
//!         r"^/user/(\d+)$",
//!         RouteDescriptor::new()
//!             .with("template", "user")
//!             .with("table", "users")
//!             .with("key", "$1"),
//!     )
//!     .unwrap();
//!
//! assert_eq!(routes.resolve("/home").template(), Some("home"));
//! assert_eq!(routes.resolve("/user/42").key(), Some("42"));
//! assert!(routes.resolve("/nowhere").is_empty());
//! ```

mod descriptor;
mod error;
mod table;

pub use descriptor::{RouteDescriptor, RouteEntry, field};
pub use error::RouteError;
pub use table::RouteTable;
