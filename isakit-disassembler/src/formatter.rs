//! Instruction formatting to assembly text

use crate::error::Result;
use isakit_spec::Instruction;

/// Canonical assembly text for `instr`
pub fn format(instr: &Instruction) -> Result<String> {
    Ok(instr.render()?)
}

/// Encoding as a fixed-width binary digit string
pub fn format_binary(instr: &Instruction) -> Result<String> {
    Ok(instr.to_binary()?)
}

/// Encoding as fixed-width `0x` hex
pub fn format_hex(instr: &Instruction) -> Result<String> {
    Ok(instr.to_hex()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::decode;
    use isakit_spec::isa3220;

    #[test]
    fn test_format_uses_first_register_form() {
        let isa = isa3220().unwrap();
        let instr = isa.parse("add $1, r2", 0).unwrap().remove(0);
        assert_eq!(format(&instr).unwrap(), "add R1, R2");
    }

    #[test]
    fn test_format_decoded_immediates() {
        let isa = isa3220().unwrap();
        assert_eq!(format(&decode(&isa, 0xC1BE).unwrap()).unwrap(), "mib0 R1, 190");
        assert_eq!(format(&decode(&isa, 0x7E00).unwrap()).unwrap(), "jump R14");
    }

    #[test]
    fn test_format_binary_and_hex() {
        let isa = isa3220().unwrap();
        let instr = decode(&isa, 0x4FFE).unwrap();
        assert_eq!(format_binary(&instr).unwrap(), "0100111111111110");
        assert_eq!(format_hex(&instr).unwrap(), "0x4FFE");
    }

    #[test]
    fn test_mnemonic_has_no_binary() {
        let isa = isa3220().unwrap();
        let instr = isa.parse_one("mimm R1, 5", 0).unwrap();
        assert!(format_binary(&instr).is_err());
        assert_eq!(format(&instr).unwrap(), "mimm R1, 5");
    }
}
