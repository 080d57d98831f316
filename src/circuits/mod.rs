// src/circuits/mod.rs

//! Defines structures for representing and building ordered sequences of
//! operations (`qmfield::operations::Operation`).

use crate::core::QubitId;
use crate::operations::Operation;
use std::collections::BTreeSet;
use std::fmt;

/// An ordered sequence of operations applied to a set of qubits.
///
/// Analogy: a much reduced `qiskit.QuantumCircuit` carrying only the gates
/// the field configuration circuit uses.
#[derive(Clone, PartialEq)]
pub struct Circuit {
    /// The unique set of qubits involved across all operations, kept sorted
    /// so that register layout is independent of insertion order.
    qubits: BTreeSet<QubitId>,

    /// The ordered sequence of operations defining the circuit's logic.
    operations: Vec<Operation>,
}

impl Circuit {
    /// Creates a new, empty circuit.
    pub fn new() -> Self {
        Self {
            qubits: BTreeSet::new(),
            operations: Vec::new(),
        }
    }

    /// Adds a single operation to the end of the circuit's sequence,
    /// registering every qubit it mentions.
    pub fn add_operation(&mut self, op: Operation) {
        for qubit in op.involved_qubits() {
            self.qubits.insert(qubit);
        }
        self.operations.push(op);
    }

    /// Adds multiple operations from an iterator to the end of the circuit's sequence.
    pub fn add_operations<I>(&mut self, ops: I)
    where
        I: IntoIterator<Item = Operation>,
    {
        for op in ops {
            self.add_operation(op);
        }
    }

    /// Returns the sorted set of qubits involved in this circuit.
    pub fn qubits(&self) -> &BTreeSet<QubitId> {
        &self.qubits
    }

    /// Returns a slice containing the ordered sequence of operations in this circuit.
    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    /// Returns the total number of operations defined in the circuit.
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    /// Returns `true` if the circuit contains no operations.
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Qubits listed by `Measure` operations, in first-seen order.
    pub fn measured_qubits(&self) -> Vec<QubitId> {
        let mut seen = Vec::new();
        for op in &self.operations {
            if let Operation::Measure { targets } = op {
                for q in targets {
                    if !seen.contains(q) {
                        seen.push(*q);
                    }
                }
            }
        }
        seen
    }
}

impl Default for Circuit {
    fn default() -> Self {
        Self::new()
    }
}

//-------------------------------------------------------------------------
// Circuit Builder
//-------------------------------------------------------------------------

/// A helper struct for programmatically constructing `Circuit` instances using method chaining.
pub struct CircuitBuilder {
    circuit: Circuit,
}

impl CircuitBuilder {
    /// Creates a new, empty CircuitBuilder.
    pub fn new() -> Self {
        Self {
            circuit: Circuit::new(),
        }
    }

    /// Adds a single operation to the circuit being built.
    pub fn add_op(mut self, op: Operation) -> Self {
        self.circuit.add_operation(op);
        self
    }

    /// Adds multiple operations from an iterator to the circuit being built.
    pub fn add_ops<I>(mut self, ops: I) -> Self
    where
        I: IntoIterator<Item = Operation>,
    {
        self.circuit.add_operations(ops);
        self
    }

    /// Finalizes the construction process and returns the built `Circuit`.
    pub fn build(self) -> Circuit {
        self.circuit
    }
}

impl Default for CircuitBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// One time step of the diagram, e.g. `─Rz─`; every gate symbol fits in two columns.
fn cell(symbol: &str) -> String {
    format!("─{:─<2}─", symbol)
}

impl fmt::Display for Circuit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rows: Vec<QubitId> = self.qubits.iter().copied().collect();
        writeln!(
            f,
            "qmfield::Circuit[{} operations on {} qubits]",
            self.operations.len(),
            rows.len()
        )?;
        if self.operations.is_empty() {
            return Ok(());
        }

        let steps = self.operations.len();
        let mut grid = vec![vec![cell(""); steps]; rows.len()];
        // links[r][t]: a vertical wire joins row r and row r + 1 at step t.
        let mut links = vec![vec![false; steps]; rows.len()];

        for (t, op) in self.operations.iter().enumerate() {
            for qubit in op.involved_qubits() {
                if let Ok(r) = rows.binary_search(&qubit) {
                    grid[r][t] = cell(op.symbol());
                }
            }
            if let Operation::ControlledFlip { control, target } = op {
                if let (Ok(c), Ok(g)) = (rows.binary_search(control), rows.binary_search(target)) {
                    grid[c][t] = cell("@");
                    for row in links.iter_mut().take(c.max(g)).skip(c.min(g)) {
                        row[t] = true;
                    }
                }
            }
        }

        let label_width = rows.iter().map(|q| q.to_string().len()).max().unwrap_or(0) + 2;
        for (r, qubit) in rows.iter().enumerate() {
            writeln!(f, "{:<width$}{}", format!("{}: ", qubit), grid[r].concat(), width = label_width)?;
            if r + 1 < rows.len() {
                let wires: String = links[r].iter().map(|&l| if l { " │  " } else { "    " }).collect();
                writeln!(f, "{}{}", " ".repeat(label_width), wires.trim_end())?;
            }
        }
        Ok(())
    }
}

// Keep the Debug impl delegating to Display
impl fmt::Debug for Circuit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
