use std::collections::VecDeque;

use miette::Result;

use crate::error;
use crate::instruction::Instruction;
use crate::program::{Program, IMPLICIT_ENTRY};
use crate::trace::{NullTracer, Tracer};

/// Machine state for a single run: addressable memory, the two value queues
/// and the hand.
pub struct RunState {
    /// Cells may be empty. Grows (destructively) only through COPYTO.
    mem: Vec<Option<i64>>,
    /// Values waiting to be taken, front first.
    input: VecDeque<i64>,
    /// Every value produced so far, in production order.
    output: Vec<i64>,
    /// The sole accumulator.
    hand: Option<i64>,
    halted: bool,
}

/// What an executed instruction asks the pass loop to do next.
enum Ctrl {
    Continue,
    Switch(String),
    Halt,
}

impl RunState {
    fn new(input: Vec<i64>, memory: Vec<Option<i64>>) -> Self {
        RunState {
            mem: memory,
            input: VecDeque::from(input),
            output: Vec::new(),
            hand: None,
            halted: false,
        }
    }

    pub fn output(&self) -> &[i64] {
        &self.output
    }

    pub fn hand(&self) -> Option<i64> {
        self.hand
    }

    pub fn memory(&self) -> &[Option<i64>] {
        &self.mem
    }

    /// Input not yet consumed, front first.
    pub fn input(&self) -> &VecDeque<i64> {
        &self.input
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// Read a cell for arithmetic. Both a missing and an empty cell are
    /// faults here; only COPYFROM tolerates emptiness.
    fn read(&self, instr: &Instruction, cell: usize) -> Result<i64> {
        match self.mem.get(cell) {
            None => Err(error::runtime_cell_out_of_range(instr, cell, self.mem.len())),
            Some(None) => Err(error::runtime_cell_empty(instr, cell)),
            Some(Some(val)) => Ok(*val),
        }
    }

    fn take_input(&mut self) -> Ctrl {
        match self.input.pop_front() {
            Some(val) => {
                self.hand = Some(val);
                Ctrl::Continue
            }
            // Nothing left to take: the machine stops mid-pass.
            None => {
                self.hand = None;
                Ctrl::Halt
            }
        }
    }

    fn put_output(&mut self) -> Ctrl {
        // An empty hand outputs nothing, and that is not an error.
        let Some(val) = self.hand.take() else {
            return Ctrl::Continue;
        };
        self.output.push(val);
        if self.input.is_empty() {
            // The last required value has been produced.
            Ctrl::Halt
        } else {
            Ctrl::Continue
        }
    }

    fn add(&mut self, instr: &Instruction, cell: usize) -> Result<Ctrl> {
        if let Some(hand) = self.hand {
            self.hand = Some(hand.wrapping_add(self.read(instr, cell)?));
        }
        Ok(Ctrl::Continue)
    }

    fn sub(&mut self, instr: &Instruction, cell: usize) -> Result<Ctrl> {
        if let Some(hand) = self.hand {
            self.hand = Some(hand.wrapping_sub(self.read(instr, cell)?));
        }
        Ok(Ctrl::Continue)
    }

    fn copy_to(&mut self, cell: usize) -> Ctrl {
        if cell >= self.mem.len() {
            // Growing reallocates from scratch; earlier cells are dropped.
            // Existing programs rely on this.
            self.mem = vec![None; cell + 1];
        }
        self.mem[cell] = self.hand;
        Ctrl::Continue
    }

    fn copy_from(&mut self, instr: &Instruction, cell: usize) -> Result<Ctrl> {
        match self.mem.get(cell) {
            Some(val) => {
                self.hand = *val;
                Ok(Ctrl::Continue)
            }
            None => Err(error::runtime_cell_out_of_range(instr, cell, self.mem.len())),
        }
    }
}

/// Owns the program, the machine state and the trace hook for one run.
pub struct RunEnvironment {
    program: Program,
    state: RunState,
    tracer: Box<dyn Tracer>,
}

impl RunEnvironment {
    pub fn new(program: Program, input: Vec<i64>, memory: Vec<Option<i64>>) -> Self {
        RunEnvironment {
            program,
            state: RunState::new(input, memory),
            tracer: Box::new(NullTracer),
        }
    }

    /// Replace the trace hook. Tracing is observational only.
    pub fn with_tracer(mut self, tracer: Box<dyn Tracer>) -> Self {
        self.tracer = tracer;
        self
    }

    pub fn state(&self) -> &RunState {
        &self.state
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    /// Drive the machine until it halts. Each pass executes the active
    /// subroutine top to bottom; a taken jump abandons the rest of the pass
    /// and starts over in the target. Memory faults abort the run.
    pub fn run(&mut self) -> Result<&RunState> {
        let mut current = self.program.entry().unwrap_or(IMPLICIT_ENTRY).to_owned();

        while !self.state.halted {
            let Some(routine) = self.program.subroutine(&current) else {
                self.tracer
                    .diagnostic(&format!("subroutine not found: {current}"));
                self.state.halted = true;
                break;
            };

            let mut switch = None;
            for instr in routine {
                self.tracer.instruction(&current, instr);
                let ctrl = step(&self.program, &mut self.state, self.tracer.as_mut(), instr)
                    .map_err(|report| report.wrap_err(format!("in subroutine `{current}`")))?;
                match ctrl {
                    Ctrl::Continue => {}
                    Ctrl::Switch(dest) => {
                        switch = Some(dest);
                        break;
                    }
                    Ctrl::Halt => {
                        self.state.halted = true;
                        break;
                    }
                }
            }

            match switch {
                Some(dest) => current = dest,
                // Ran out of instructions with nowhere to go.
                None => self.state.halted = true,
            }
        }

        Ok(&self.state)
    }
}

/// Dispatch one instruction to its handler.
fn step(
    program: &Program,
    state: &mut RunState,
    tracer: &mut dyn Tracer,
    instr: &Instruction,
) -> Result<Ctrl> {
    let ctrl = match instr {
        Instruction::Input => state.take_input(),
        Instruction::Output => state.put_output(),
        Instruction::Add { cell } => state.add(instr, *cell)?,
        Instruction::Sub { cell } => state.sub(instr, *cell)?,
        Instruction::CopyTo { cell } => state.copy_to(*cell),
        Instruction::CopyFrom { cell } => state.copy_from(instr, *cell)?,
        Instruction::Jump { dest } => jump(program, tracer, dest, true),
        Instruction::JumpIfZero { dest } => jump(program, tracer, dest, state.hand == Some(0)),
        Instruction::JumpIfNeg { dest } => {
            jump(program, tracer, dest, state.hand.is_some_and(|hand| hand < 0))
        }
    };
    Ok(ctrl)
}

/// Target validity is checked before the condition, so a dangling target is
/// reported even when the branch is not taken.
fn jump(program: &Program, tracer: &mut dyn Tracer, dest: &str, take: bool) -> Ctrl {
    if !program.declares(dest) {
        tracer.diagnostic(&format!("subroutine not found: {dest}"));
        return Ctrl::Continue;
    }
    if take {
        Ctrl::Switch(dest.to_owned())
    } else {
        Ctrl::Continue
    }
}
