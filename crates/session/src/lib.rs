//! The production session: the single logical actor that owns a
//! project's shot book, drives lifecycle transitions through the
//! generation collaborator, enforces the one-slot generation gate, and
//! pushes state to the vault.

pub mod collab;
pub mod events;
pub mod gate;
pub mod session;
