//! Probabilistic state-transition models for component reliability.
//!
//! A [`StateModel`] is a discrete-time Markov chain with a designated initial
//! state, an absorbing success state and an absorbing error state. Calls into
//! other components are expressed as [`Interface`]s: a pair of transitions
//! whose probabilities are the callee's (still unknown) reliability and its
//! complement.
//!
//! Models are built incrementally, state by state and transition by
//! transition. Creation order is observable: the textual rendering lists
//! states and their outgoing transitions exactly in the order they were
//! created.
//!
//! The [`ParametricModelChecker`] trait is the boundary to whatever turns a
//! model into a reliability formula. [`AcyclicModelChecker`] implements it for
//! models whose only cycles are absorbing self-loops.

pub mod checker;
pub mod error;
pub mod model;
pub mod render;
pub mod state;
pub mod transition;

pub use checker::{AcyclicModelChecker, ParametricModelChecker};
pub use error::{CheckerError, ModelError};
pub use model::{Interface, StateModel};
pub use state::{State, StateId, ERROR_LABEL, INITIAL_LABEL, SUCCESS_LABEL};
pub use transition::{Transition, TransitionId, TransitionKind};
