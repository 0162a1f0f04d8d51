//! Domain models held in the browser session.

pub mod cart;
pub mod identity;
pub mod session;

pub use cart::{Cart, CartError, CartLine};
pub use identity::{Identity, Profile};
pub use session::keys as session_keys;
