//! Sequence diagram to state model transformation.
//!
//! A sequence `e1, e2, ..., en` becomes a chain of fresh states, each one
//! the source of the transitions for its element and the continuation of
//! the element before it. The chain is built from the tail: the continuation
//! of `en` is the success state (or, inside an alternative branch, the state
//! following the fragment).
//!
//! Optional fragments become nodes of their own. The enclosing model calls
//! them through an interface whose failure exit is its error state, and the
//! embedded diagram is queued and transformed after the enclosing one.

use std::collections::{HashMap, VecDeque};

use reliant_expr::{format_decimal, round_half_up};
use reliant_model::{StateId, StateModel};
use tracing::{debug, warn};

use crate::diagram::{DiagramElement, Fragment, FragmentKind, Message, MessageKind, SequenceDiagram};
use crate::error::GraphError;
use crate::graph::DependencyGraph;
use crate::node::{validate_node_id, NodeId, RdgNode};

/// Decimal places kept for message and branch probabilities.
const PRECISION: u32 = 4;

/// Action name of the transitions leaving an alternative fragment.
const ALTERNATIVE_ACTION: &str = "alt";

/// Turns sequence diagrams into RDG nodes.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiagramTransformer;

impl DiagramTransformer {
    pub fn new() -> Self {
        Self
    }

    /// Transform `diagram` and every optional sub-diagram it embeds into
    /// nodes of `graph`, returning the id of the node built for `diagram`.
    ///
    /// Node ids are diagram names; unnamed diagrams get a fresh `n<k>` id.
    /// Nodes are added to the graph only once the whole transformation
    /// has succeeded.
    pub fn transform(
        &self,
        graph: &mut DependencyGraph,
        diagram: &SequenceDiagram,
    ) -> Result<NodeId, GraphError> {
        let mut build = Build {
            graph: &mut *graph,
            queue: VecDeque::new(),
            reserved: HashMap::new(),
        };
        let root = build.reserve(diagram)?;

        let mut built = Vec::new();
        while let Some((id, sub)) = build.queue.pop_front() {
            built.push(build.node(id, sub)?);
        }

        for node in built {
            graph.add_node(node)?;
        }
        debug!(root = %root, nodes = graph.len(), "transformed diagram");
        Ok(root)
    }
}

/// State of one `transform` call.
struct Build<'g, 'd> {
    graph: &'g mut DependencyGraph,
    /// Diagrams whose ids are reserved but whose models are not built yet.
    queue: VecDeque<(NodeId, &'d SequenceDiagram)>,
    reserved: HashMap<NodeId, &'d SequenceDiagram>,
}

impl<'g, 'd> Build<'g, 'd> {
    /// Reserve the node id for `diagram` and queue it. An identical diagram
    /// reserved earlier under the same name is shared instead.
    fn reserve(&mut self, diagram: &'d SequenceDiagram) -> Result<NodeId, GraphError> {
        let id = if diagram.name.is_empty() {
            self.fresh_id()
        } else {
            validate_node_id(&diagram.name)?;
            diagram.name.clone()
        };
        if self.graph.contains(&id) {
            return Err(GraphError::DuplicateNode(id));
        }
        if let Some(existing) = self.reserved.get(&id) {
            if **existing == *diagram {
                debug!(id = %id, "sharing identical sub-diagram");
                return Ok(id);
            }
            return Err(GraphError::DuplicateNode(id));
        }
        self.reserved.insert(id.clone(), diagram);
        self.queue.push_back((id.clone(), diagram));
        Ok(id)
    }

    /// Generated ids come from the graph's counter, so they stay unique
    /// across transformations into the same graph.
    fn fresh_id(&mut self) -> NodeId {
        loop {
            let id = self.graph.next_id();
            if !self.reserved.contains_key(&id) {
                return id;
            }
        }
    }

    fn node(&mut self, id: NodeId, diagram: &'d SequenceDiagram) -> Result<RdgNode, GraphError> {
        let mut model = StateModel::new(format!("{id}_s"));
        let initial = model.create_initial_state()?;
        let error = model.create_error_state()?;

        let mut dependencies = Vec::new();
        let entry = self.sequence(
            &mut model,
            &diagram.name,
            &diagram.elements,
            None,
            error,
            &mut dependencies,
        )?;
        model.create_transition(initial, entry, "", format_decimal(1.0))?;

        debug!(
            id = %id,
            states = model.state_count(),
            transitions = model.transition_count(),
            "built state model"
        );
        let mut node = RdgNode::new(id, &diagram.guard, model);
        for dependency in dependencies {
            node.add_dependency(dependency);
        }
        Ok(node)
    }

    /// Build the chain for `elements`, returning its entry state.
    ///
    /// `continuation` is where the chain ends; `None` means the success
    /// state. Only alternative branches recurse.
    fn sequence(
        &mut self,
        model: &mut StateModel,
        diagram: &str,
        elements: &'d [DiagramElement],
        continuation: Option<StateId>,
        error: StateId,
        dependencies: &mut Vec<NodeId>,
    ) -> Result<StateId, GraphError> {
        let mut target = match continuation {
            Some(state) => state,
            None => model.ensure_success_state(),
        };

        for element in elements.iter().rev() {
            let source = model.create_state();
            match element {
                DiagramElement::Message(message) => {
                    emit_message(model, message, source, target, error)?;
                }
                DiagramElement::Fragment(fragment) => match fragment.kind {
                    FragmentKind::Optional => {
                        let callee = self.optional(diagram, fragment)?;
                        model.create_interface(&callee, source, target, error)?;
                        dependencies.push(callee);
                    }
                    FragmentKind::Alternative => {
                        if fragment.diagrams.is_empty() {
                            return Err(empty_fragment(diagram, fragment));
                        }
                        let probability = format_decimal(round_half_up(
                            1.0 / fragment.diagrams.len() as f64,
                            PRECISION,
                        ));
                        for branch in &fragment.diagrams {
                            let entry = self.sequence(
                                model,
                                &branch.name,
                                &branch.elements,
                                Some(target),
                                error,
                                dependencies,
                            )?;
                            model.create_transition(
                                source,
                                entry,
                                ALTERNATIVE_ACTION,
                                probability.clone(),
                            )?;
                        }
                    }
                },
            }
            target = source;
        }
        Ok(target)
    }

    fn optional(&mut self, diagram: &str, fragment: &'d Fragment) -> Result<NodeId, GraphError> {
        let Some(embedded) = fragment.diagrams.first() else {
            return Err(empty_fragment(diagram, fragment));
        };
        if fragment.diagrams.len() > 1 {
            warn!(
                diagram,
                ignored = fragment.diagrams.len() - 1,
                "optional fragment embeds more than one diagram; using the first"
            );
        }
        self.reserve(embedded)
    }
}

/// `source → target` with the rounded success probability, plus
/// `source → error` with its complement. The complement is taken from the
/// rounded value so the two edges always sum to exactly one. Zero-probability
/// edges are never emitted.
///
/// Replies always succeed, so only call messages have their probability
/// range-checked.
fn emit_message(
    model: &mut StateModel,
    message: &Message,
    source: StateId,
    target: StateId,
    error: StateId,
) -> Result<(), GraphError> {
    match message.kind {
        MessageKind::Reply => {
            model.create_transition(source, target, message.name.as_str(), format_decimal(1.0))?;
        }
        MessageKind::Synchronous | MessageKind::Asynchronous => {
            if !(0.0..=1.0).contains(&message.probability) {
                return Err(GraphError::InvalidProbability {
                    message: message.name.clone(),
                    value: message.probability,
                });
            }
            let reliability = round_half_up(message.probability, PRECISION);
            let complement = round_half_up(1.0 - reliability, PRECISION);
            if reliability != 0.0 {
                model.create_transition(
                    source,
                    target,
                    message.name.as_str(),
                    format_decimal(reliability),
                )?;
            }
            if complement != 0.0 {
                model.create_transition(
                    source,
                    error,
                    message.name.as_str(),
                    format_decimal(complement),
                )?;
            }
        }
    }
    Ok(())
}

fn empty_fragment(diagram: &str, fragment: &Fragment) -> GraphError {
    GraphError::EmptyFragment {
        diagram: diagram.to_string(),
        kind: fragment.kind.as_str().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reliant_model::{Transition, TransitionKind};

    fn transform(diagram: &SequenceDiagram) -> (DependencyGraph, NodeId) {
        let mut graph = DependencyGraph::new();
        let id = DiagramTransformer::new()
            .transform(&mut graph, diagram)
            .unwrap();
        (graph, id)
    }

    fn outgoing(model: &StateModel, state: StateId) -> Vec<&Transition> {
        model.outgoing(state).collect()
    }

    fn mass(transitions: &[&Transition]) -> f64 {
        transitions
            .iter()
            .map(|t| t.probability.parse::<f64>().unwrap())
            .sum()
    }

    /// The state the initial state leads into.
    fn entry(model: &StateModel) -> StateId {
        let initial = model.initial_state().unwrap();
        outgoing(model, initial)[0].target
    }

    #[test]
    fn single_message() {
        let (graph, id) = transform(&SequenceDiagram::new("BSN").message("m", 0.95));
        assert_eq!(id, "BSN");
        let model = &graph.node("BSN").unwrap().model;
        let success = model.success_state().unwrap();
        let error = model.error_state().unwrap();

        let edges = outgoing(model, entry(model));
        assert_eq!(edges.len(), 2);
        assert_eq!((edges[0].target, edges[0].probability.as_str()), (success, "0.95"));
        assert_eq!((edges[1].target, edges[1].probability.as_str()), (error, "0.05"));
        assert!((mass(&edges) - 1.0).abs() < 1e-12);

        let expected = "BSN_s=0(init) ---  / 1.0 ---> BSN_s=3\n\
                        BSN_s=3 --- m / 0.95 ---> BSN_s=2(success)\n\
                        BSN_s=3 --- m / 0.05 ---> BSN_s=1(fail)\n";
        assert_eq!(model.to_string(), expected);
    }

    #[test]
    fn messages_chain_in_document_order() {
        let (graph, _) = transform(
            &SequenceDiagram::new("BSN")
                .message("first", 0.9)
                .message("second", 0.8),
        );
        let model = &graph.node("BSN").unwrap().model;
        let first = outgoing(model, entry(model));
        assert_eq!(first[0].action, "first");
        let second = outgoing(model, first[0].target);
        assert_eq!(second[0].action, "second");
        assert_eq!(second[0].target, model.success_state().unwrap());
    }

    #[test]
    fn certain_and_impossible_messages_skip_zero_edges() {
        let (graph, _) = transform(&SequenceDiagram::new("A").message("m", 1.0));
        let model = &graph.node("A").unwrap().model;
        let edges = outgoing(model, entry(model));
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].probability, "1.0");

        let (graph, _) = transform(&SequenceDiagram::new("B").message("m", 0.0));
        let model = &graph.node("B").unwrap().model;
        let edges = outgoing(model, entry(model));
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].target, model.error_state().unwrap());
        assert_eq!(edges[0].probability, "1.0");

        // Rounds to 1.0, so no complement edge.
        let (graph, _) = transform(&SequenceDiagram::new("C").message("m", 0.99999));
        let model = &graph.node("C").unwrap().model;
        assert_eq!(outgoing(model, entry(model)).len(), 1);
    }

    #[test]
    fn half_way_probabilities_keep_unit_mass() {
        for (p, success, failure) in [
            (0.12345, "0.1235", "0.8765"),
            (0.45555, "0.4556", "0.5444"),
            (0.00005, "0.0001", "0.9999"),
        ] {
            let (graph, _) = transform(&SequenceDiagram::new("A").message("m", p));
            let model = &graph.node("A").unwrap().model;
            let edges = outgoing(model, entry(model));
            let probabilities: Vec<_> = edges.iter().map(|e| e.probability.as_str()).collect();
            assert_eq!(probabilities, [success, failure], "p = {p}");
            assert!((mass(&edges) - 1.0).abs() < 1e-12, "p = {p}");
        }
    }

    #[test]
    fn reply_is_a_single_certain_step() {
        let (graph, _) = transform(
            &SequenceDiagram::new("A").message_of_kind("ack", MessageKind::Reply, 0.5),
        );
        let model = &graph.node("A").unwrap().model;
        let edges = outgoing(model, entry(model));
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].probability, "1.0");
        assert_eq!(edges[0].target, model.success_state().unwrap());

        // The probability of a reply is never used, so it is not checked.
        let (graph, _) = transform(
            &SequenceDiagram::new("B").message_of_kind("ack", MessageKind::Reply, 2.0),
        );
        let model = &graph.node("B").unwrap().model;
        assert_eq!(outgoing(model, entry(model))[0].probability, "1.0");
    }

    #[test]
    fn alternative_splits_evenly() {
        let (graph, _) = transform(&SequenceDiagram::new("BSN").alternative(vec![
            SequenceDiagram::new("left").message("x", 0.9),
            SequenceDiagram::new("right").message("y", 0.8),
        ]));
        let model = &graph.node("BSN").unwrap().model;
        let edges = outgoing(model, entry(model));
        assert_eq!(edges.len(), 2);
        for edge in &edges {
            assert_eq!(edge.action, "alt");
            assert_eq!(edge.probability, "0.5");
        }
        assert!((mass(&edges) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn three_way_alternative_rounds_each_branch() {
        let branches = (0..3)
            .map(|i| SequenceDiagram::new(format!("b{i}")).message("m", 0.9))
            .collect();
        let (graph, _) = transform(&SequenceDiagram::new("A").alternative(branches));
        let model = &graph.node("A").unwrap().model;
        let edges = outgoing(model, entry(model));
        assert_eq!(edges.len(), 3);
        assert!(edges.iter().all(|e| e.probability == "0.3333"));
    }

    #[test]
    fn alternative_branches_rejoin_the_continuation() {
        let (graph, _) = transform(
            &SequenceDiagram::new("A")
                .alternative(vec![
                    SequenceDiagram::new("left").message("x", 0.9),
                    SequenceDiagram::new("empty"),
                ])
                .message("after", 0.7),
        );
        let model = &graph.node("A").unwrap().model;
        let decision = entry(model);
        let edges = outgoing(model, decision);

        // The empty branch goes straight to the state of the next message.
        let after = edges[1].target;
        assert_eq!(outgoing(model, after)[0].action, "after");
        let left = outgoing(model, edges[0].target);
        assert_eq!(left[0].target, after);
    }

    #[test]
    fn optional_fragment_becomes_a_dependency() {
        let (graph, root) = transform(
            &SequenceDiagram::new("BSN")
                .message("m1", 0.99)
                .optional(
                    SequenceDiagram::new("D")
                        .with_guard("SPO2")
                        .message("persist", 0.999),
                ),
        );
        assert_eq!(graph.dependencies_of(&root).unwrap(), ["D".to_string()]);
        assert_eq!(graph.presence_condition("D").unwrap(), "SPO2");
        assert_eq!(graph.presence_condition("BSN").unwrap(), "true");

        let model = &graph.node("BSN").unwrap().model;
        let interface = &model.interfaces()[0];
        assert_eq!(interface.callee, "D");
        assert_eq!(interface.failure_exit, model.error_state().unwrap());
        assert_eq!(interface.normal_exit, model.success_state().unwrap());

        let failure = &model.transitions()[interface.failure_transition];
        assert_eq!(failure.kind, TransitionKind::InterfaceFailure);
        assert_eq!(failure.probability, "1-D");
        assert_eq!(failure.target, model.error_state().unwrap());

        let nested = &graph.node("D").unwrap().model;
        assert_eq!(nested.variable_name(), "D_s");
        assert!(nested.transition_by_action("persist").is_some());
    }

    #[test]
    fn nested_optionals_are_queued() {
        let (graph, root) = transform(
            &SequenceDiagram::new("BSN").optional(
                SequenceDiagram::new("Oxygen")
                    .with_guard("SPO2")
                    .optional(SequenceDiagram::new("Sqlite").with_guard("SQLite").message("q", 0.9)),
            ),
        );
        let closure: Vec<_> = graph
            .transitive_closure(&root)
            .unwrap()
            .iter()
            .map(|n| n.id.clone())
            .collect();
        assert_eq!(closure, vec!["Sqlite", "Oxygen", "BSN"]);
    }

    #[test]
    fn deep_nesting_does_not_recurse() {
        let mut diagram = SequenceDiagram::new("d0").message("m", 0.9);
        for depth in 1..500 {
            diagram = SequenceDiagram::new(format!("d{depth}"))
                .with_guard(format!("F{depth}"))
                .optional(diagram);
        }
        let (graph, root) = transform(&diagram);
        assert_eq!(graph.len(), 500);
        assert_eq!(graph.transitive_closure(&root).unwrap().len(), 500);
    }

    #[test]
    fn unnamed_diagrams_get_generated_ids() {
        let (graph, root) = transform(
            &SequenceDiagram::new("")
                .optional(SequenceDiagram::new("").with_guard("A").message("m", 0.5)),
        );
        assert_eq!(root, "n0");
        assert_eq!(graph.dependencies_of("n0").unwrap(), ["n1".to_string()]);
        assert_eq!(graph.presence_condition("n1").unwrap(), "A");
    }

    #[test]
    fn generated_ids_do_not_repeat_across_calls() {
        let mut graph = DependencyGraph::new();
        let transformer = DiagramTransformer::new();
        let first = transformer
            .transform(&mut graph, &SequenceDiagram::new(""))
            .unwrap();
        let second = transformer
            .transform(&mut graph, &SequenceDiagram::new(""))
            .unwrap();
        assert_eq!(first, "n0");
        assert_eq!(second, "n1");
        assert_eq!(graph.next_id(), "n2");
    }

    #[test]
    fn identical_sub_diagrams_are_shared() {
        let sqlite = SequenceDiagram::new("Sqlite").with_guard("SQLite").message("q", 0.9);
        let (graph, _) = transform(
            &SequenceDiagram::new("BSN")
                .optional(SequenceDiagram::new("Oxygen").optional(sqlite.clone()))
                .optional(SequenceDiagram::new("Temp").optional(sqlite)),
        );
        assert_eq!(graph.len(), 4);
        assert_eq!(graph.dependencies_of("Oxygen").unwrap(), ["Sqlite".to_string()]);
        assert_eq!(graph.dependencies_of("Temp").unwrap(), ["Sqlite".to_string()]);
    }

    #[test]
    fn conflicting_names_fail_without_touching_the_graph() {
        let mut graph = DependencyGraph::new();
        let diagram = SequenceDiagram::new("BSN")
            .optional(SequenceDiagram::new("D").message("a", 0.9))
            .optional(SequenceDiagram::new("D").message("b", 0.8));
        let err = DiagramTransformer::new()
            .transform(&mut graph, &diagram)
            .unwrap_err();
        assert_eq!(err, GraphError::DuplicateNode("D".into()));
        assert!(graph.is_empty());

        let mut graph = DependencyGraph::new();
        DiagramTransformer::new()
            .transform(&mut graph, &SequenceDiagram::new("BSN"))
            .unwrap();
        assert_eq!(
            DiagramTransformer::new().transform(&mut graph, &SequenceDiagram::new("BSN")),
            Err(GraphError::DuplicateNode("BSN".into()))
        );
    }

    #[test]
    fn invalid_inputs_are_rejected() {
        let mut graph = DependencyGraph::new();
        let transformer = DiagramTransformer::new();
        assert!(matches!(
            transformer.transform(&mut graph, &SequenceDiagram::new("A").message("m", 1.5)),
            Err(GraphError::InvalidProbability { .. })
        ));
        assert!(matches!(
            transformer.transform(&mut graph, &SequenceDiagram::new("A").message("m", f64::NAN)),
            Err(GraphError::InvalidProbability { .. })
        ));
        assert!(matches!(
            transformer.transform(&mut graph, &SequenceDiagram::new("A").alternative(vec![])),
            Err(GraphError::EmptyFragment { .. })
        ));
        assert!(graph.is_empty());
    }

    #[test]
    fn diagram_names_must_be_formula_identifiers() {
        let transformer = DiagramTransformer::new();
        for name in ["true", "false", "Oxygen-Sensor", "Oxygen Sensor", "_pc0", "1abc"] {
            let mut graph = DependencyGraph::new();
            let diagram = SequenceDiagram::new("BSN").message("m", 0.9).optional(
                SequenceDiagram::new(name)
                    .with_guard("SPO2")
                    .message("read", 0.5),
            );
            assert!(
                matches!(
                    transformer.transform(&mut graph, &diagram),
                    Err(GraphError::InvalidNodeId { ref id, .. }) if id == name
                ),
                "{name:?} should be rejected"
            );
            assert!(graph.is_empty());
        }

        let mut graph = DependencyGraph::new();
        assert!(matches!(
            transformer.transform(&mut graph, &SequenceDiagram::new("false")),
            Err(GraphError::InvalidNodeId { .. })
        ));
    }

    #[test]
    fn empty_diagram_goes_straight_to_success() {
        let (graph, _) = transform(&SequenceDiagram::new("A"));
        let model = &graph.node("A").unwrap().model;
        assert_eq!(entry(model), model.success_state().unwrap());
    }

    #[test]
    fn renamed_diagrams_build_equal_models() {
        let build = |name: &str| {
            SequenceDiagram::new(name)
                .message("m1", 0.9)
                .alternative(vec![
                    SequenceDiagram::new("x").message("m2", 0.8),
                    SequenceDiagram::new("y"),
                ])
                .message("m3", 0.7)
        };
        let (first, _) = transform(&build("First"));
        let (second, _) = transform(&build("Second"));
        let a = &first.node("First").unwrap().model;
        let b = &second.node("Second").unwrap().model;
        assert_eq!(a, b);
        assert_ne!(a.to_string(), b.to_string());
    }
}
