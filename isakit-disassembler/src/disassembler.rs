//! Main disassembler logic

use crate::decoder::decode_at;
use crate::error::Result;
use crate::formatter::format;
use isakit_spec::bits::to_hex_string;
use isakit_spec::{Address, InstructionSet, Program, Word};

/// Disassemble `words` laid out from `start` into a listing.
///
/// Words that do not decode are listed with an `; ERROR:` comment.
pub fn disassemble(isa: &InstructionSet, words: &[Word], start: Address) -> Result<String> {
    let config = isa.config();
    let mut output = String::new();

    output.push_str("; isakit disassembly\n");
    output.push_str(&format!("; Start: 0x{:08X}\n", start));
    output.push_str(&format!(
        "; Code size: {} bytes ({} instructions)\n",
        words.len() as u64 * config.instruction_bytes(),
        words.len()
    ));
    output.push('\n');

    let mut addr = start;
    for &word in words {
        // Address label
        output.push_str(&format!("0x{:08X}:  ", addr));

        // Hex encoding
        output.push_str(&to_hex_string(word as i64, config.instruction_width, false));
        output.push_str("  ");

        // Decode and format
        match decode_at(isa, word, addr).and_then(|instr| format(&instr)) {
            Ok(text) => output.push_str(&text),
            Err(e) => {
                tracing::debug!(word, addr, error = %e, "undecodable word");
                output.push_str(&format!("; ERROR: {}", e));
            }
        }

        output.push('\n');
        addr = addr.wrapping_add(config.instruction_bytes());
    }

    Ok(output)
}

/// Decode every word into an executable program starting at `start`.
pub fn decode_program(isa: &InstructionSet, words: &[Word], start: Address) -> Result<Program> {
    let step = isa.config().instruction_bytes();
    let instructions = words
        .iter()
        .enumerate()
        .map(|(i, &word)| decode_at(isa, word, start.wrapping_add(i as u64 * step)))
        .collect::<Result<Vec<_>>>()?;
    Ok(Program::new(start, step, instructions))
}

#[cfg(test)]
mod tests {
    use super::*;
    use isakit_spec::isa3220;

    #[test]
    fn test_disassemble_simple() {
        let isa = isa3220().unwrap();
        let asm = disassemble(&isa, &[0x0120, 0x4FFE], 0x40000).unwrap();

        assert!(asm.contains("0x00040000:  0x0120  add R1, R2"));
        assert!(asm.contains("0x00040002:  0x4FFE  beqz 4094"));
        assert!(asm.contains("2 instructions"));
    }

    #[test]
    fn test_disassemble_bad_word() {
        let isa = isa3220().unwrap();
        let asm = disassemble(&isa, &[0x7301], 0).unwrap();
        assert!(asm.contains("; ERROR: No operation matches word 0x7301"));
    }

    #[test]
    fn test_decode_program() {
        let isa = isa3220().unwrap();
        let program = decode_program(&isa, &[0x0120, 0x4FFE], 0x40000).unwrap();
        assert_eq!(program.len(), 2);
        assert_eq!(program.fetch(0x40002).unwrap().name(), "beqz");
        assert_eq!(program.words().unwrap(), vec![0x0120, 0x4FFE]);
        assert!(decode_program(&isa, &[0x7301], 0).is_err());
    }
}
