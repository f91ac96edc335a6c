//! Text and Graphviz renderings of a state model.
//!
//! The text form lists, for every state in creation order, each outgoing
//! transition in creation order:
//!
//! ```text
//! sSqlite=0(init) --- persist / 0.999 ---> sSqlite=3
//! ```

use std::fmt::{self, Write as _};

use crate::model::StateModel;
use crate::transition::TransitionKind;

impl fmt::Display for StateModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for state in self.states() {
            for t in self.outgoing(state.index) {
                // Endpoints were validated on creation.
                let Some(target) = self.state(t.target) else {
                    continue;
                };
                writeln!(
                    f,
                    "{state} --- {} / {} ---> {target}",
                    t.action, t.probability
                )?;
            }
        }
        Ok(())
    }
}

impl StateModel {
    /// Render the model as a Graphviz digraph.
    pub fn to_dot(&self) -> String {
        let mut out = String::new();
        let name = if self.variable_name().is_empty() {
            "model"
        } else {
            self.variable_name()
        };
        let _ = writeln!(out, "digraph \"{}\" {{", escape(name));
        let _ = writeln!(out, "    rankdir=LR;");

        for state in self.states() {
            let shape = if Some(state.index) == self.success_state() {
                "doublecircle"
            } else if Some(state.index) == self.error_state() {
                "Msquare"
            } else {
                "circle"
            };
            let label = match &state.label {
                Some(l) => format!("{}\\n{}", state.index, escape(l)),
                None => state.index.to_string(),
            };
            let _ = writeln!(
                out,
                "    s{} [shape={shape}, label=\"{label}\"];",
                state.index
            );
        }

        for t in self.transitions() {
            let style = match t.kind {
                TransitionKind::Plain => "solid",
                TransitionKind::InterfaceSuccess | TransitionKind::InterfaceFailure => "dashed",
            };
            let label = if t.action.is_empty() {
                escape(&t.probability)
            } else {
                format!("{} / {}", escape(&t.action), escape(&t.probability))
            };
            let _ = writeln!(
                out,
                "    s{} -> s{} [style={style}, label=\"{label}\"];",
                t.source, t.target
            );
        }

        out.push_str("}\n");
        out
    }
}

fn escape(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}
