//! Transition-based parser core for layered semantic graphs.
//!
//! A configurable action source (an oracle during training, a learned classifier during
//! inference) drives a [`state::State`] one transition at a time, from a sequence of tokens to
//! a fully structured [`passage::graph::Passage`]: a terminals layer plus a structural layer of
//! non-terminals, edges, remote edges, and linkage groups.
//!
//! ```text
//! tokens -> State::from_tokens -> loop { assert_valid; transition } until Finish -> create_passage
//! ```

pub mod action;
pub mod config;
pub mod edge;
pub mod error;
mod intern;
pub mod node;
pub mod passage;
pub mod state;
pub mod tag;

pub use action::{Action, ActionKind, GoldRef};
pub use config::Options;
pub use edge::{Edge, EdgeIndex};
pub use error::{ActionError, ParserWarning, StructuralFault};
pub use node::Node;
pub use passage::graph::{OutputTarget, Passage};
pub use state::{ActionSource, GoldPassage, ScriptedActions, State};
pub use tag::{EdgeTag, TerminalTag};
