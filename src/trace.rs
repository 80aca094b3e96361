use colored::Colorize;

use crate::instruction::Instruction;

/// Observer for engine execution. Purely advisory: implementations see every
/// executed instruction but cannot influence state or control flow.
pub trait Tracer {
    /// Called right before an instruction executes.
    fn instruction(&mut self, routine: &str, instr: &Instruction);
    /// Recoverable runtime complaints, like a jump to an unknown subroutine.
    fn diagnostic(&mut self, message: &str);
}

/// Discards everything.
pub struct NullTracer;

impl Tracer for NullTracer {
    fn instruction(&mut self, _routine: &str, _instr: &Instruction) {}
    fn diagnostic(&mut self, _message: &str) {}
}

/// Prints to stderr, so traces never mix with program output.
pub struct TermTracer;

impl Tracer for TermTracer {
    fn instruction(&mut self, routine: &str, instr: &Instruction) {
        eprintln!("{:>12} {instr}", routine.dimmed());
    }

    fn diagnostic(&mut self, message: &str) {
        eprintln!("{:>12} {message}", "warning".yellow().bold());
    }
}
