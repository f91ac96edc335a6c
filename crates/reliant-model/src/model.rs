//! The probabilistic state model container.

use std::collections::HashMap;

use serde::Serialize;
use tracing::debug;

use crate::error::ModelError;
use crate::state::{State, StateId, ERROR_LABEL, INITIAL_LABEL, SUCCESS_LABEL};
use crate::transition::{Transition, TransitionId, TransitionKind};

/// A call from one model into another component's model.
///
/// Entering `entry` runs the callee: with probability `<callee>` control
/// continues at `normal_exit`, with probability `1-<callee>` it continues at
/// `failure_exit`.
#[derive(Debug, Clone, Serialize)]
pub struct Interface {
    pub callee: String,
    pub entry: StateId,
    pub normal_exit: StateId,
    pub failure_exit: StateId,
    pub success_transition: TransitionId,
    pub failure_transition: TransitionId,
}

impl PartialEq for Interface {
    /// Interfaces compare by shape; the callee name does not count.
    fn eq(&self, other: &Self) -> bool {
        self.entry == other.entry
            && self.normal_exit == other.normal_exit
            && self.failure_exit == other.failure_exit
    }
}

impl Eq for Interface {}

/// A discrete-time probabilistic state model with success and error states.
#[derive(Debug, Clone, Serialize)]
pub struct StateModel {
    variable_name: String,
    states: Vec<State>,
    transitions: Vec<Transition>,
    interfaces: Vec<Interface>,
    initial: Option<StateId>,
    success: Option<StateId>,
    error: Option<StateId>,
    #[serde(skip)]
    labels: HashMap<String, StateId>,
}

impl StateModel {
    /// Create an empty model whose states render as `<variable_name>=<index>`.
    pub fn new(variable_name: impl Into<String>) -> Self {
        Self {
            variable_name: variable_name.into(),
            states: Vec::new(),
            transitions: Vec::new(),
            interfaces: Vec::new(),
            initial: None,
            success: None,
            error: None,
            labels: HashMap::new(),
        }
    }

    /// The namespace prefix used when rendering states.
    pub fn variable_name(&self) -> &str {
        &self.variable_name
    }

    /// Rename the model. Existing states pick up the new prefix.
    pub fn set_variable_name(&mut self, name: impl Into<String>) {
        self.variable_name = name.into();
        for state in &mut self.states {
            state.variable_name = self.variable_name.clone();
        }
    }

    // --- State construction ---

    /// Create an unlabeled state. The first state created becomes the
    /// initial state.
    pub fn create_state(&mut self) -> StateId {
        self.push_state(None)
    }

    /// Create a labeled state, retrievable through [`state_by_label`].
    ///
    /// Labels are not required to be unique; lookup returns the most recently
    /// created state with that label.
    ///
    /// [`state_by_label`]: StateModel::state_by_label
    pub fn create_labeled_state(&mut self, label: impl Into<String>) -> StateId {
        self.push_state(Some(label.into()))
    }

    /// Create the initial state. Fails if the model already has one.
    pub fn create_initial_state(&mut self) -> Result<StateId, ModelError> {
        if let Some(existing) = self.initial {
            return Err(ModelError::InitialStateExists {
                model: self.variable_name.clone(),
                existing,
            });
        }
        Ok(self.push_state(Some(INITIAL_LABEL.to_string())))
    }

    /// Create the success state. Fails if the model already has one.
    pub fn create_success_state(&mut self) -> Result<StateId, ModelError> {
        if let Some(existing) = self.success {
            return Err(ModelError::SuccessStateExists {
                model: self.variable_name.clone(),
                existing,
            });
        }
        Ok(self.ensure_success_state())
    }

    /// Create the error state. Fails if the model already has one.
    pub fn create_error_state(&mut self) -> Result<StateId, ModelError> {
        if let Some(existing) = self.error {
            return Err(ModelError::ErrorStateExists {
                model: self.variable_name.clone(),
                existing,
            });
        }
        Ok(self.ensure_error_state())
    }

    /// Return the success state, creating it on first use.
    pub fn ensure_success_state(&mut self) -> StateId {
        match self.success {
            Some(id) => id,
            None => {
                let id = self.push_state(Some(SUCCESS_LABEL.to_string()));
                self.success = Some(id);
                id
            }
        }
    }

    /// Return the error state, creating it on first use.
    pub fn ensure_error_state(&mut self) -> StateId {
        match self.error {
            Some(id) => id,
            None => {
                let id = self.push_state(Some(ERROR_LABEL.to_string()));
                self.error = Some(id);
                id
            }
        }
    }

    fn push_state(&mut self, label: Option<String>) -> StateId {
        let index = self.states.len();
        if let Some(label) = &label {
            self.labels.insert(label.clone(), index);
        }
        if self.initial.is_none() {
            self.initial = Some(index);
        }
        self.states
            .push(State::new(index, label, &self.variable_name));
        index
    }

    // --- Transition construction ---

    /// Record a transition. Both endpoints must be states of this model.
    pub fn create_transition(
        &mut self,
        source: StateId,
        target: StateId,
        action: impl Into<String>,
        probability: impl Into<String>,
    ) -> Result<TransitionId, ModelError> {
        self.push_transition(source, target, action.into(), probability.into(), TransitionKind::Plain)
    }

    /// Record a call into the model identified by `callee`.
    ///
    /// Emits `entry → normal_exit` with probability `<callee>` and
    /// `entry → failure_exit` with probability `1-<callee>`.
    pub fn create_interface(
        &mut self,
        callee: &str,
        entry: StateId,
        normal_exit: StateId,
        failure_exit: StateId,
    ) -> Result<&Interface, ModelError> {
        self.check_state(failure_exit)?;
        let success_transition = self.push_transition(
            entry,
            normal_exit,
            format!("interface_success_{callee}"),
            callee.to_string(),
            TransitionKind::InterfaceSuccess,
        )?;
        let failure_transition = self.push_transition(
            entry,
            failure_exit,
            format!("interface_error_{callee}"),
            format!("1-{callee}"),
            TransitionKind::InterfaceFailure,
        )?;
        debug!(model = %self.variable_name, callee, entry, "created interface");
        let index = self.interfaces.len();
        self.interfaces.push(Interface {
            callee: callee.to_string(),
            entry,
            normal_exit,
            failure_exit,
            success_transition,
            failure_transition,
        });
        Ok(&self.interfaces[index])
    }

    fn push_transition(
        &mut self,
        source: StateId,
        target: StateId,
        action: String,
        probability: String,
        kind: TransitionKind,
    ) -> Result<TransitionId, ModelError> {
        self.check_state(source)?;
        self.check_state(target)?;
        let id = self.transitions.len();
        self.transitions.push(Transition {
            id,
            source,
            target,
            action,
            probability,
            kind,
        });
        Ok(id)
    }

    fn check_state(&self, state: StateId) -> Result<(), ModelError> {
        if state < self.states.len() {
            Ok(())
        } else {
            Err(ModelError::UnknownState {
                model: self.variable_name.clone(),
                state,
            })
        }
    }

    // --- Queries ---

    /// All states in creation order.
    pub fn states(&self) -> &[State] {
        &self.states
    }

    /// A state by index.
    pub fn state(&self, id: StateId) -> Option<&State> {
        self.states.get(id)
    }

    /// All transitions in creation order.
    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    /// Outgoing transitions of a state, in creation order.
    pub fn outgoing(&self, state: StateId) -> impl Iterator<Item = &Transition> {
        self.transitions.iter().filter(move |t| t.source == state)
    }

    /// All interfaces in creation order.
    pub fn interfaces(&self) -> &[Interface] {
        &self.interfaces
    }

    pub fn initial_state(&self) -> Option<StateId> {
        self.initial
    }

    pub fn success_state(&self) -> Option<StateId> {
        self.success
    }

    pub fn error_state(&self) -> Option<StateId> {
        self.error
    }

    /// The most recently created state with the given label.
    pub fn state_by_label(&self, label: &str) -> Option<StateId> {
        self.labels.get(label).copied()
    }

    /// The first transition carrying the given action name.
    pub fn transition_by_action(&self, action: &str) -> Option<&Transition> {
        self.transitions.iter().find(|t| t.action == action)
    }

    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    pub fn transition_count(&self) -> usize {
        self.transitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

impl PartialEq for StateModel {
    /// Structural equality: same states (index and label), same outgoing
    /// transitions per state in the same order, same interface shapes.
    /// Variable names, action names and callee names are ignored.
    fn eq(&self, other: &Self) -> bool {
        if self.states != other.states
            || self.initial != other.initial
            || self.success != other.success
            || self.error != other.error
            || self.interfaces != other.interfaces
        {
            return false;
        }
        self.states
            .iter()
            .all(|s| self.outgoing(s.index).eq(other.outgoing(s.index)))
    }
}

impl Eq for StateModel {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_model() {
        let model = StateModel::new("x");
        assert!(model.is_empty());
        assert_eq!(model.initial_state(), None);
        assert_eq!(model.transition_count(), 0);
    }

    #[test]
    fn first_state_becomes_initial() {
        let mut model = StateModel::new("x");
        let s = model.create_state();
        assert_eq!(s, 0);
        assert_eq!(model.initial_state(), Some(0));
        assert_eq!(model.state(s).unwrap().variable_name, "x");
    }

    #[test]
    fn states_are_indexed_in_sequence() {
        let mut model = StateModel::new("x");
        let ids: Vec<_> = (0..5).map(|_| model.create_state()).collect();
        assert_eq!(ids, vec![0, 1, 2, 3, 4]);
        assert_eq!(model.initial_state(), Some(0));
    }

    #[test]
    fn labeled_states_and_lookup() {
        let mut model = StateModel::new("x");
        let s0 = model.create_labeled_state("init");
        let s1 = model.create_labeled_state("success");
        let s2 = model.create_labeled_state("error");

        assert_eq!(model.state_by_label("init"), Some(s0));
        assert_eq!(model.state_by_label("success"), Some(s1));
        assert_eq!(model.state_by_label("error"), Some(s2));
        assert_eq!(model.initial_state(), Some(s0));
    }

    #[test]
    fn duplicate_label_last_write_wins() {
        let mut model = StateModel::new("x");
        model.create_labeled_state("dup");
        let second = model.create_labeled_state("dup");
        assert_eq!(model.state_by_label("dup"), Some(second));
    }

    #[test]
    fn second_initial_state_is_an_error() {
        let mut model = StateModel::new("x");
        model.create_initial_state().unwrap();
        let err = model.create_initial_state().unwrap_err();
        assert!(matches!(err, ModelError::InitialStateExists { existing: 0, .. }));
    }

    #[test]
    fn initial_state_after_plain_state_is_an_error() {
        let mut model = StateModel::new("x");
        model.create_state();
        assert!(model.create_initial_state().is_err());
    }

    #[test]
    fn success_and_error_are_singletons() {
        let mut model = StateModel::new("x");
        model.create_initial_state().unwrap();
        let success = model.create_success_state().unwrap();
        let error = model.create_error_state().unwrap();

        assert!(model.create_success_state().is_err());
        assert!(model.create_error_state().is_err());
        assert_eq!(model.ensure_success_state(), success);
        assert_eq!(model.ensure_error_state(), error);
        assert_eq!(model.state_count(), 3);
        assert_eq!(model.state_by_label(SUCCESS_LABEL), Some(success));
        assert_eq!(model.state_by_label(ERROR_LABEL), Some(error));
    }

    #[test]
    fn transitions_by_action() {
        let mut model = StateModel::new("x");
        let s0 = model.create_labeled_state("init");
        let s1 = model.create_labeled_state("sucess");
        let s2 = model.create_labeled_state("error");
        model.create_transition(s0, s1, "alpha", "rAlpha").unwrap();
        model.create_transition(s0, s2, "alpha_error", "1-rAlpha").unwrap();

        let t1 = model.transition_by_action("alpha").unwrap();
        assert_eq!(t1.probability, "rAlpha");
        assert_eq!((t1.source, t1.target), (s0, s1));

        let t2 = model.transition_by_action("alpha_error").unwrap();
        assert_eq!(t2.probability, "1-rAlpha");
        assert_eq!((t2.source, t2.target), (s0, s2));
    }

    #[test]
    fn transition_to_foreign_state_fails() {
        let mut model = StateModel::new("x");
        let s0 = model.create_state();
        let err = model.create_transition(s0, 7, "a", "0.5").unwrap_err();
        assert_eq!(
            err,
            ModelError::UnknownState {
                model: "x".into(),
                state: 7
            }
        );
        assert_eq!(model.transition_count(), 0);
    }

    #[test]
    fn interface_creates_success_and_failure_transitions() {
        let mut model = StateModel::new("s");
        let init = model.create_initial_state().unwrap();
        let error = model.create_error_state().unwrap();
        let next = model.create_state();

        let iface = model.create_interface("F", init, next, error).unwrap().clone();
        assert_eq!(iface.callee, "F");

        let out: Vec<_> = model.outgoing(init).collect();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].probability, "F");
        assert_eq!(out[0].target, next);
        assert_eq!(out[0].kind, TransitionKind::InterfaceSuccess);
        assert_eq!(out[1].probability, "1-F");
        assert_eq!(out[1].target, error);
        assert_eq!(out[1].kind, TransitionKind::InterfaceFailure);
    }

    #[test]
    fn rename_updates_states() {
        let mut model = StateModel::new("a");
        model.create_state();
        model.set_variable_name("b");
        assert_eq!(model.states()[0].variable_name, "b");
    }

    fn build_equivalent(var: &str, callee: &str, action: &str) -> StateModel {
        let mut m = StateModel::new(var);
        let init = m.create_initial_state().unwrap();
        let success = m.create_success_state().unwrap();
        let error = m.create_error_state().unwrap();

        let mut source = init;
        let mut target = m.create_state();
        m.create_transition(source, target, action, "0.999").unwrap();
        m.create_transition(source, error, format!("!{action}"), "0.001").unwrap();

        source = target;
        target = m.create_state();
        let interface_error = m.create_state();
        m.create_interface(callee, source, target, interface_error).unwrap();
        m.create_transition(interface_error, error, "error_ground", "1").unwrap();

        source = target;
        m.create_transition(source, success, format!("{action}_return"), "0.999").unwrap();
        m.create_transition(source, error, format!("!{action}_return"), "0.001").unwrap();
        m
    }

    #[test]
    fn structural_equality_ignores_names() {
        let m1 = build_equivalent("s", "F", "persist");
        let m2 = build_equivalent("v", "G", "msg");

        assert_eq!(m1.states()[0], m2.states()[0]);
        assert_ne!(m1.states()[1], m2.states()[2]);
        assert_eq!(m1.states(), m2.states());
        assert_eq!(m1, m2);
    }

    #[test]
    fn structural_equality_sees_probabilities() {
        let m1 = build_equivalent("s", "F", "persist");
        let mut m2 = build_equivalent("s", "F", "persist");
        let extra = m2.create_state();
        let init = m2.initial_state().unwrap();
        m2.create_transition(init, extra, "x", "0.5").unwrap();
        assert_ne!(m1, m2);

        let mut a = StateModel::new("s");
        let a0 = a.create_state();
        let a1 = a.create_state();
        a.create_transition(a0, a1, "t", "0.9").unwrap();
        let mut b = StateModel::new("s");
        let b0 = b.create_state();
        let b1 = b.create_state();
        b.create_transition(b0, b1, "t", "0.8").unwrap();
        assert_ne!(a, b);
    }
}
