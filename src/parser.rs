use std::str::FromStr;

use miette::Result;

use crate::error;
use crate::instruction::{Instruction, Opcode};
use crate::program::{Program, IMPLICIT_ENTRY};

/// Strip the longest shared leading indentation and surrounding blank lines,
/// so literal program blocks embedded in indented contexts parse as-is.
fn dedent(src: &str) -> String {
    let mut prefix: Option<&str> = None;
    for line in src.lines() {
        if line.trim().is_empty() {
            continue;
        }
        let indent = &line[..line.len() - line.trim_start().len()];
        prefix = Some(match prefix {
            None => indent,
            Some(common) => {
                let shared = common
                    .char_indices()
                    .zip(indent.chars())
                    .take_while(|((_, a), b)| a == b)
                    .last()
                    .map_or(0, |((at, ch), _)| at + ch.len_utf8());
                &common[..shared]
            }
        });
    }

    let prefix = prefix.unwrap_or("");
    let mut out = String::with_capacity(src.len());
    for line in src.lines() {
        out.push_str(line.strip_prefix(prefix).unwrap_or(line));
        out.push('\n');
    }
    out.trim().to_owned()
}

/// Builds the subroutine table from source, line by line. Lines are labels
/// (`Name:`), instructions with an operand (`ADD(0)`) or bare mnemonics.
pub struct ProgramParser {
    /// Dedented copy of the source; diagnostic spans index into this.
    src: String,
    program: Program,
}

impl ProgramParser {
    pub fn new(source: &str) -> Self {
        ProgramParser {
            src: dedent(source),
            program: Program::new(),
        }
    }

    /// Consume the parser to produce the finished table. Fails on the first
    /// malformed line.
    pub fn parse(self) -> Result<Program> {
        let ProgramParser { src, mut program } = self;
        // Most recently declared subroutine. Instructions seen before any
        // label collect under the implicit entry.
        let mut current: Option<String> = None;
        let mut offs = 0usize;

        for line in src.lines() {
            let trimmed = line.trim();
            let lead = offs + (line.len() - line.trim_start().len());
            offs += line.len() + 1;

            if trimmed.is_empty() {
                continue;
            }

            // A colon anywhere makes this a label line; text after the colon
            // has always been discarded by this format.
            if let Some((name, _)) = trimmed.split_once(':') {
                if name.is_empty() {
                    return Err(error::parse_empty_label(lead..lead + trimmed.len(), &src));
                }
                program.declare(name);
                program.set_entry(name);
                current = Some(name.to_owned());
                continue;
            }

            let instr = parse_instruction(trimmed, lead, &src)?;
            let routine = current.get_or_insert_with(|| {
                program.declare(IMPLICIT_ENTRY);
                program.set_entry(IMPLICIT_ENTRY);
                IMPLICIT_ENTRY.to_owned()
            });
            program.push(routine, instr);
        }

        Ok(program)
    }
}

/// Split one trimmed line into mnemonic and optional operand text, then type
/// the operand for its opcode. `offs` is the line's offset into `src`.
fn parse_instruction(line: &str, offs: usize, src: &str) -> Result<Instruction> {
    // Both delimiters must be present somewhere for the line to count as the
    // operand form; otherwise the whole line is the mnemonic.
    let (mnemonic, operand) = match (line.find('('), line.contains(')')) {
        (Some(open), true) => {
            let rest = &line[open + 1..];
            let text = &rest[..rest.find(')').unwrap_or(rest.len())];
            (&line[..open], Some((text, offs + open + 1)))
        }
        _ => (line, None),
    };

    let span = offs..offs + mnemonic.len();
    let opcode = Opcode::from_str(mnemonic)
        .map_err(|()| error::parse_unknown_mnemonic(span.clone(), src, mnemonic))?;

    match opcode {
        Opcode::Input | Opcode::Output => match operand {
            Some(_) => Err(error::parse_stray_operand(span, src, opcode)),
            None if opcode == Opcode::Input => Ok(Instruction::Input),
            None => Ok(Instruction::Output),
        },
        Opcode::Add | Opcode::Sub | Opcode::CopyTo | Opcode::CopyFrom => {
            let (text, at) =
                operand.ok_or_else(|| error::parse_missing_operand(span.clone(), src, opcode))?;
            let cell = text
                .parse()
                .map_err(|_| error::parse_bad_index(at..at + text.len(), src, opcode))?;
            Ok(match opcode {
                Opcode::Add => Instruction::Add { cell },
                Opcode::Sub => Instruction::Sub { cell },
                Opcode::CopyTo => Instruction::CopyTo { cell },
                _ => Instruction::CopyFrom { cell },
            })
        }
        Opcode::Jump | Opcode::JumpIfZero | Opcode::JumpIfNeg => {
            let (text, _) =
                operand.ok_or_else(|| error::parse_missing_operand(span, src, opcode))?;
            let dest = text.to_owned();
            Ok(match opcode {
                Opcode::Jump => Instruction::Jump { dest },
                Opcode::JumpIfZero => Instruction::JumpIfZero { dest },
                _ => Instruction::JumpIfNeg { dest },
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(src: &str) -> Result<Program> {
        ProgramParser::new(src).parse()
    }

    #[test]
    fn parse_unlabeled_program() {
        let program = parse("INPUT\nADD(0)\nOUTPUT").unwrap();
        assert_eq!(program.entry(), Some(IMPLICIT_ENTRY));
        assert_eq!(
            program.subroutine(IMPLICIT_ENTRY).unwrap(),
            &[
                Instruction::Input,
                Instruction::Add { cell: 0 },
                Instruction::Output
            ]
        );
    }

    #[test]
    fn parse_labels_in_source_order() {
        let program = parse("Wash:\nINPUT\nCOPYTO(0)\nDry:\nCOPYFROM(0)\nOUTPUT").unwrap();
        assert_eq!(program.entry(), Some("Wash"));
        assert_eq!(program.names().collect::<Vec<_>>(), ["Wash", "Dry"]);
        assert_eq!(
            program.subroutine("Wash").unwrap(),
            &[Instruction::Input, Instruction::CopyTo { cell: 0 }]
        );
        assert_eq!(
            program.subroutine("Dry").unwrap(),
            &[Instruction::CopyFrom { cell: 0 }, Instruction::Output]
        );
    }

    #[test]
    fn parse_unknown_mnemonic() {
        assert!(parse("FOO").is_err());
        assert!(parse("INPUT\nSCRAMBLE(0)").is_err());
    }

    #[test]
    fn parse_leading_instructions_stay_the_entry() {
        let program = parse("INPUT\nLoop:\nOUTPUT").unwrap();
        assert_eq!(program.entry(), Some(IMPLICIT_ENTRY));
        assert_eq!(program.names().collect::<Vec<_>>(), [IMPLICIT_ENTRY, "Loop"]);
    }

    #[test]
    fn parse_indented_block() {
        let program = parse(
            r#"
            Loop:
            INPUT
            OUTPUT

            JUMP(Loop)
        "#,
        )
        .unwrap();
        assert_eq!(program.entry(), Some("Loop"));
        assert_eq!(
            program.subroutine("Loop").unwrap(),
            &[
                Instruction::Input,
                Instruction::Output,
                Instruction::Jump { dest: "Loop".into() }
            ]
        );
    }

    #[test]
    fn parse_empty_source() {
        let program = parse("").unwrap();
        assert!(program.is_empty());
        assert_eq!(program.entry(), None);

        let program = parse("\n   \n\n").unwrap();
        assert!(program.is_empty());
    }

    #[test]
    fn parse_label_discards_trailing_text() {
        let program = parse("Sort: INPUT\nOUTPUT").unwrap();
        assert_eq!(program.entry(), Some("Sort"));
        assert_eq!(program.subroutine("Sort").unwrap(), &[Instruction::Output]);
    }

    #[test]
    fn parse_redeclared_label_keeps_appending() {
        let program = parse("A:\nINPUT\nA:\nOUTPUT").unwrap();
        assert_eq!(program.len(), 1);
        assert_eq!(
            program.subroutine("A").unwrap(),
            &[Instruction::Input, Instruction::Output]
        );
    }

    #[test]
    fn parse_empty_label_rejected() {
        assert!(parse(":").is_err());
        assert!(parse("  :\nINPUT").is_err());
    }

    #[test]
    fn parse_operand_typing() {
        // Memory instructions want a non-negative index
        assert!(parse("ADD(x)").is_err());
        assert!(parse("ADD(-1)").is_err());
        assert!(parse("ADD").is_err());
        // Space before the parenthesis makes the mnemonic unrecognizable
        assert!(parse("ADD (0)").is_err());
        // Jumps want an operand, INPUT/OUTPUT reject one
        assert!(parse("JUMP").is_err());
        assert!(parse("INPUT(1)").is_err());
        assert!(parse("OUTPUT(1)").is_err());
    }

    #[test]
    fn parse_numeric_jump_target_is_a_name() {
        let program = parse("3:\nJUMP(3)").unwrap();
        assert_eq!(
            program.subroutine("3").unwrap(),
            &[Instruction::Jump { dest: "3".into() }]
        );
    }

    #[test]
    fn dedent_mixed_blank_lines() {
        // Blank lines shorter than the common indent do not break dedenting
        let src = "    INPUT\n\n    OUTPUT";
        assert_eq!(dedent(src), "INPUT\n\nOUTPUT");
    }
}
