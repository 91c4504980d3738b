//! The world model (component B): users, channels, and the relational
//! invariants between them
//!
//! Both entity kinds are read-only from the outside — every field is
//! private with a getter, and neither type offers a setter. Mutation is
//! exclusively the dispatcher's job ([`crate::client::Client::dispatch`]).
//! Rather than raising a runtime error on assignment, the type system simply
//! never offers the assignment in the first place. Command helpers on
//! `Client` (`set_self_mute`, `join_channel`, ...) build and send a message;
//! they never touch these structs directly — the authoritative update
//! always arrives back from the server.

mod channel;
mod user;

pub use channel::Channel;
pub use user::User;
