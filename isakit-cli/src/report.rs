//! Console output of the `run`, `asm` and `disasm` commands

use isakit_runtime::StepRecord;
use isakit_spec::bits::to_hex_string;
use isakit_spec::{Address, DataImage, Value};

const RULE: &str = "######################################################################";

pub fn banner(pc: Address) -> String {
    format!(
        "{RULE}\n# Starting simulation from PC = {}\n{RULE}",
        to_hex_string(pc as Value, 32, false)
    )
}

/// `PC=<pc> [<binary>] <text>\tChanged: (<changes>)`
pub fn step_line(record: &StepRecord, data_width: u32) -> String {
    format!(
        "PC={} [{}] {}\tChanged: ({})",
        to_hex_string(record.pc as Value, 32, false),
        record.binary,
        record.text,
        record.change_summary(data_width)
    )
}

pub const TERMINATING: &str = "# Terminating instruction detected.";

/// Step count, final `pc` and a dump of every register
pub fn summary(steps: u64, pc: Address, registers: &[Value], data_width: u32) -> String {
    let mut out = format!(
        "# Simulated {steps} instructions in total\nFinal PC = {}\nFinal Register File State:",
        to_hex_string(pc as Value, 32, false)
    );
    for (index, &value) in registers.iter().enumerate() {
        out.push_str(&format!(
            "\n# R[{index}] = {} ({value})",
            to_hex_string(value, data_width, false)
        ));
    }
    out
}

/// One `; Data` comment line per initialised word
pub fn data_listing(data: &DataImage) -> String {
    data.entries()
        .map(|(addr, word)| {
            format!(
                "; Data 0x{addr:08X}: {}",
                to_hex_string(word as Value, 32, false)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use isakit_runtime::RegisterChange;

    #[test]
    fn test_banner() {
        let text = banner(0x40000);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].len(), 70);
        assert_eq!(lines[1], "# Starting simulation from PC = 0x00040000");
    }

    #[test]
    fn test_step_line() {
        let record = StepRecord {
            pc: 0x40000,
            next_pc: 0x40002,
            text: "mib0 R1, 5".to_string(),
            word: 0xC105,
            binary: "1100000100000101".to_string(),
            before: vec![0, 0],
            after: vec![0, 5],
            changes: vec![RegisterChange {
                register: 1,
                old: 0,
                new: 5,
            }],
            halted: false,
        };
        assert_eq!(
            step_line(&record, 32),
            "PC=0x00040000 [1100000100000101] mib0 R1, 5\tChanged: (R1: 0x00000000 => 0x00000005)"
        );
    }

    #[test]
    fn test_summary() {
        let text = summary(3, 0x40008, &[0, -1], 32);
        assert_eq!(
            text,
            "# Simulated 3 instructions in total\n\
             Final PC = 0x00040008\n\
             Final Register File State:\n\
             # R[0] = 0x00000000 (0)\n\
             # R[1] = 0xFFFFFFFF (-1)"
        );
    }

    #[test]
    fn test_data_listing() {
        let mut data = DataImage::new();
        data.begin(0x100);
        data.push(0xCAFEBABE);
        data.push(1);
        assert_eq!(
            data_listing(&data),
            "; Data 0x00000100: 0xCAFEBABE\n; Data 0x00000104: 0x00000001"
        );
        assert_eq!(data_listing(&DataImage::new()), "");
    }
}
