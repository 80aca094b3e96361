use std::ops::Range;

use miette::{miette, LabeledSpan, Report, Severity};

use crate::instruction::{Instruction, Opcode};

// Parse errors

pub fn parse_unknown_mnemonic(span: Range<usize>, src: &str, mnemonic: &str) -> Report {
    miette!(
        severity = Severity::Error,
        code = "parse::mnemonic",
        help = "available instructions are INPUT, OUTPUT, ADD, SUB, COPYTO, COPYFROM, JUMP, JUMPIFZERO and JUMPIFNEG.",
        labels = vec![LabeledSpan::at(span, "unknown instruction")],
        "Encountered an unknown instruction `{mnemonic}`.",
    )
    .with_source_code(src.to_owned())
}

pub fn parse_empty_label(span: Range<usize>, src: &str) -> Report {
    miette!(
        severity = Severity::Error,
        code = "parse::label",
        help = "subroutine labels are written as `Name:`.",
        labels = vec![LabeledSpan::at(span, "missing name")],
        "Encountered a label with no name.",
    )
    .with_source_code(src.to_owned())
}

pub fn parse_missing_operand(span: Range<usize>, src: &str, opcode: Opcode) -> Report {
    let (help, what) = operand_shape(opcode);
    miette!(
        severity = Severity::Error,
        code = "parse::operand",
        help = help,
        labels = vec![LabeledSpan::at(span, "missing operand")],
        "Instruction {opcode} expects {what}.",
    )
    .with_source_code(src.to_owned())
}

pub fn parse_stray_operand(span: Range<usize>, src: &str, opcode: Opcode) -> Report {
    miette!(
        severity = Severity::Error,
        code = "parse::operand",
        help = "write the bare mnemonic on a line of its own.",
        labels = vec![LabeledSpan::at(span, "unexpected operand")],
        "Instruction {opcode} takes no operand.",
    )
    .with_source_code(src.to_owned())
}

pub fn parse_bad_index(span: Range<usize>, src: &str, opcode: Opcode) -> Report {
    miette!(
        severity = Severity::Error,
        code = "parse::operand",
        help = "memory cell indices are non-negative base-10 integers.",
        labels = vec![LabeledSpan::at(span, "not a cell index")],
        "Expected a valid memory cell index for {opcode}.",
    )
    .with_source_code(src.to_owned())
}

fn operand_shape(opcode: Opcode) -> (&'static str, &'static str) {
    match opcode {
        Opcode::Jump | Opcode::JumpIfZero | Opcode::JumpIfNeg => (
            "jump instructions name a subroutine, like `JUMP(Loop)`.",
            "a subroutine name",
        ),
        _ => (
            "memory instructions take a cell index, like `COPYTO(0)`.",
            "a memory cell index",
        ),
    }
}

// Runtime errors

pub fn runtime_cell_out_of_range(instr: &Instruction, cell: usize, len: usize) -> Report {
    miette!(
        severity = Severity::Error,
        code = "run::bounds",
        help = "memory only grows when COPYTO writes past the end.",
        "Memory fault: `{instr}` touched cell {cell}, but memory holds {len} cells.",
    )
}

pub fn runtime_cell_empty(instr: &Instruction, cell: usize) -> Report {
    miette!(
        severity = Severity::Error,
        code = "run::empty_cell",
        help = "write the cell with COPYTO before reading it.",
        "Memory fault: `{instr}` read cell {cell}, which holds nothing.",
    )
}
