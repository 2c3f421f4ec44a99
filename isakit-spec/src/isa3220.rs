//! # Reference ISA: isa3220
//!
//! A small 16-bit-instruction, 32-bit-data machine used by the console
//! driver and the integration tests. R0 is hard-wired to zero, R14 (`jump`)
//! holds branch conditions and return addresses, R15 (`stack`) is the base
//! of stack-relative loads and stores.
//!
//! Branch offsets are relative to the address after the branch, so the
//! terminating word `0x4FFE` (`beqz -2`) branches to itself.

use crate::bits::{insert_bits, mask, shift_left, shift_right_arithmetic, shift_right_logical, sign_extend};
use crate::builder::{GroupDef, IsaBuilder, OpDef};
use crate::config::ByteOrder;
use crate::context::ExecContext;
use crate::error::Result;
use crate::expand::ExpansionContext;
use crate::isa::InstructionSet;
use crate::{Address, Value};

pub const JUMP: &str = "jump";
pub const STACK: &str = "stack";
pub const ZERO: &str = "zero";

pub const TERMINATING_WORD: u64 = 0x4FFE;

/// Register values used as shift amounts; negatives shift everything out.
fn amount(value: Value) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

/// Absolute target of a relative immediate written at the mnemonic's address
fn target(ctx: &ExpansionContext<'_>) -> Result<Address> {
    Ok(ctx
        .pc()
        .wrapping_add(ctx.instruction_bytes())
        .wrapping_add_signed(ctx.var("imm")?))
}

/// Offset from the next inserted instruction to `target`
fn relative_to_next(ctx: &ExpansionContext<'_>, target: Address) -> Value {
    target.wrapping_sub(ctx.next_pc().wrapping_add(ctx.instruction_bytes())) as Value
}

/// Take the branch when `taken` holds for the jump register.
fn branch_if(ctx: &mut ExecContext<'_>, taken: fn(Value) -> bool) -> Result<Option<Value>> {
    if taken(ctx.reg_named(JUMP)?) {
        let offset = ctx.signed("imm")?;
        let target = ctx.next_pc().wrapping_add_signed(offset);
        ctx.set_pc(target);
    }
    Ok(None)
}

/// Replace byte `n` of the destination register with the immediate.
fn move_byte(ctx: &mut ExecContext<'_>, n: u32) -> Result<Option<Value>> {
    let current = ctx.reg("dest")? as u64 & mask(ctx.data_width());
    let byte = ctx.unsigned("imm")? as u64;
    Ok(Some(insert_bits(current, 8 * n + 7, 8 * n, byte) as Value))
}

/// Branch with a condition negated or normalised into the jump register first
fn conditional(name: &'static str, prepare: &'static str, branch: &'static str) -> OpDef {
    OpDef::mnemonic(name, move |ctx| {
        let target = target(ctx)?;
        let jump = ctx.register(JUMP)?;
        let src = if prepare == "mov" { ctx.register(ZERO)? } else { jump };
        ctx.insert(prepare, &[("dest", jump), ("src", src)])?;
        let imm = relative_to_next(ctx, target);
        ctx.insert(branch, &[("imm", imm)])
    })
}

fn arith() -> GroupDef {
    GroupDef::new("arith")
        .syntax(":op :dest, :src")
        .layout(":opcode:dest:src:ext")
        .with("opcode", 0)
        .member(OpDef::operation("add").with("ext", 0).action(|ctx| {
            Ok(Some(ctx.reg("dest")?.wrapping_add(ctx.reg("src")?)))
        }))
        .member(OpDef::operation("sub").with("ext", 1).action(|ctx| {
            Ok(Some(ctx.reg("dest")?.wrapping_sub(ctx.reg("src")?)))
        }))
        .member(OpDef::operation("mul").with("ext", 2).action(|ctx| {
            Ok(Some(ctx.reg("dest")?.wrapping_mul(ctx.reg("src")?)))
        }))
        .member(
            OpDef::operation("neg")
                .with("ext", 3)
                .action(|ctx| Ok(Some(ctx.reg("src")?.wrapping_neg()))),
        )
        .member(OpDef::operation("shl").with("ext", 4).action(|ctx| {
            let shift = amount(ctx.reg("src")?);
            Ok(Some(shift_left(ctx.reg("dest")?, shift, ctx.data_width())))
        }))
        .member(OpDef::operation("shrl").with("ext", 5).action(|ctx| {
            let shift = amount(ctx.reg("src")?);
            Ok(Some(shift_right_logical(ctx.reg("dest")?, shift, ctx.data_width())))
        }))
        .member(OpDef::operation("shra").with("ext", 6).action(|ctx| {
            let shift = amount(ctx.reg("src")?);
            Ok(Some(shift_right_arithmetic(ctx.reg("dest")?, shift, ctx.data_width())))
        }))
        .member(
            OpDef::operation("not")
                .with("ext", 7)
                .action(|ctx| Ok(Some(!ctx.reg("src")?))),
        )
        .member(
            OpDef::operation("and")
                .with("ext", 8)
                .action(|ctx| Ok(Some(ctx.reg("dest")? & ctx.reg("src")?))),
        )
        .member(
            OpDef::operation("or")
                .with("ext", 9)
                .action(|ctx| Ok(Some(ctx.reg("dest")? | ctx.reg("src")?))),
        )
        .member(
            OpDef::operation("cmpz")
                .with("ext", 10)
                .action(|ctx| Ok(Some(Value::from(ctx.reg("src")? == 0)))),
        )
        .member(
            OpDef::operation("mov")
                .with("ext", 11)
                .action(|ctx| Ok(Some(ctx.reg("src")?))),
        )
        .member(
            OpDef::operation("xor")
                .with("ext", 12)
                .action(|ctx| Ok(Some(ctx.reg("dest")? ^ ctx.reg("src")?))),
        )
        .member(
            OpDef::operation("sxb0")
                .with("ext", 13)
                .action(|ctx| Ok(Some(sign_extend(ctx.reg("src")?, 7)))),
        )
        .member(
            OpDef::operation("sxb1")
                .with("ext", 14)
                .action(|ctx| Ok(Some(sign_extend(ctx.reg("src")?, 15)))),
        )
        .member(
            OpDef::operation("sxb2")
                .with("ext", 15)
                .action(|ctx| Ok(Some(sign_extend(ctx.reg("src")?, 23)))),
        )
}

/// Arithmetic with a 4-bit immediate. Shift counts are unsigned, every
/// other immediate is two's complement.
fn arith_with_immediate() -> GroupDef {
    GroupDef::new("arith_with_immediate")
        .syntax(":op :dest, :imm")
        .layout(":opcode:dest:imm:ext")
        .with("opcode", 1)
        .member(OpDef::operation("addi").with("ext", 0).action(|ctx| {
            Ok(Some(ctx.reg("dest")?.wrapping_add(ctx.signed("imm")?)))
        }))
        .member(OpDef::operation("subi").with("ext", 1).action(|ctx| {
            Ok(Some(ctx.reg("dest")?.wrapping_sub(ctx.signed("imm")?)))
        }))
        .member(OpDef::operation("muli").with("ext", 2).action(|ctx| {
            Ok(Some(ctx.reg("dest")?.wrapping_mul(ctx.signed("imm")?)))
        }))
        .member(
            OpDef::operation("negi")
                .with("ext", 3)
                .action(|ctx| Ok(Some(ctx.signed("imm")?.wrapping_neg()))),
        )
        .member(OpDef::operation("shli").with("ext", 4).action(|ctx| {
            let shift = amount(ctx.unsigned("imm")?);
            Ok(Some(shift_left(ctx.reg("dest")?, shift, ctx.data_width())))
        }))
        .member(OpDef::operation("shrli").with("ext", 5).action(|ctx| {
            let shift = amount(ctx.unsigned("imm")?);
            Ok(Some(shift_right_logical(ctx.reg("dest")?, shift, ctx.data_width())))
        }))
        .member(OpDef::operation("shrai").with("ext", 6).action(|ctx| {
            let shift = amount(ctx.unsigned("imm")?);
            Ok(Some(shift_right_arithmetic(ctx.reg("dest")?, shift, ctx.data_width())))
        }))
        .member(
            OpDef::operation("noti")
                .with("ext", 7)
                .action(|ctx| Ok(Some(!ctx.signed("imm")?))),
        )
        .member(
            OpDef::operation("andi")
                .with("ext", 8)
                .action(|ctx| Ok(Some(ctx.reg("dest")? & ctx.signed("imm")?))),
        )
        .member(
            OpDef::operation("ori")
                .with("ext", 9)
                .action(|ctx| Ok(Some(ctx.reg("dest")? | ctx.signed("imm")?))),
        )
        .member(
            OpDef::operation("xori")
                .with("ext", 12)
                .action(|ctx| Ok(Some(ctx.reg("dest")? ^ ctx.signed("imm")?))),
        )
}

fn conditional_branch() -> GroupDef {
    GroupDef::new("conditional_branch")
        .syntax(":op :imm")
        .layout(":opcode:imm")
        .member(
            OpDef::operation("beqz")
                .with("opcode", 4)
                .action(|ctx| branch_if(ctx, |jump| jump == 0)),
        )
        .member(
            OpDef::operation("bgez")
                .with("opcode", 5)
                .action(|ctx| branch_if(ctx, |jump| jump >= 0)),
        )
        .member(
            OpDef::operation("bgtz")
                .with("opcode", 6)
                .action(|ctx| branch_if(ctx, |jump| jump > 0)),
        )
        .member(conditional("blez", "neg", "bgez"))
        .member(conditional("bltz", "neg", "bgtz"))
        .member(conditional("bnez", "cmpz", "beqz"))
        .member(conditional("br", "mov", "beqz"))
}

fn load() -> GroupDef {
    GroupDef::new("load")
        .syntax(":op :dest, :src")
        .layout(":opcode:dest:src00:zz")
        .with("opcode", 8)
        .member(OpDef::operation("ld.b").with("zz", 0).action(|ctx| {
            let addr = ctx.reg("src")?;
            Ok(Some(ctx.load(addr, 1)?))
        }))
        .member(OpDef::operation("ld.w").with("zz", 1).action(|ctx| {
            let addr = ctx.reg("src")?;
            Ok(Some(ctx.load(addr, 2)?))
        }))
        .member(OpDef::operation("ld.d").with("zz", 2).action(|ctx| {
            let addr = ctx.reg("src")?;
            Ok(Some(ctx.load(addr, 4)?))
        }))
}

fn store() -> GroupDef {
    GroupDef::new("store")
        .syntax(":op :src, :addrsrc")
        .layout(":opcode:src:addrsrc00:zz")
        .with("opcode", 9)
        .member(OpDef::operation("st.b").with("zz", 0).action(|ctx| {
            let (addr, value) = (ctx.reg("addrsrc")?, ctx.reg("src")?);
            ctx.store(addr, 1, value)?;
            Ok(None)
        }))
        .member(OpDef::operation("st.w").with("zz", 1).action(|ctx| {
            let (addr, value) = (ctx.reg("addrsrc")?, ctx.reg("src")?);
            ctx.store(addr, 2, value)?;
            Ok(None)
        }))
        .member(OpDef::operation("st.d").with("zz", 2).action(|ctx| {
            let (addr, value) = (ctx.reg("addrsrc")?, ctx.reg("src")?);
            ctx.store(addr, 4, value)?;
            Ok(None)
        }))
}

/// `addr = stack + offset`, shared by the stack-relative groups
fn stack_address(ctx: &mut ExecContext<'_>) -> Result<Option<Value>> {
    let addr = ctx.reg_named(STACK)?.wrapping_add(ctx.signed("offset")?);
    ctx.set("addr", addr);
    Ok(None)
}

fn load_stack() -> GroupDef {
    GroupDef::new("load_stack")
        .syntax(":op :dest, :offset")
        .layout(":opcode:dest:offset:zz")
        .with("opcode", 10)
        .before(stack_address)
        .member(OpDef::operation("lds.b").with("zz", 0).action(|ctx| {
            let addr = ctx.var("addr")?;
            Ok(Some(sign_extend(ctx.load(addr, 1)?, 7)))
        }))
        .member(OpDef::operation("lds.w").with("zz", 1).action(|ctx| {
            let addr = ctx.var("addr")?;
            Ok(Some(sign_extend(ctx.load(addr, 2)?, 15)))
        }))
        .member(OpDef::operation("lds.d").with("zz", 2).action(|ctx| {
            let addr = ctx.var("addr")?;
            Ok(Some(ctx.load(addr, 4)?))
        }))
}

fn store_stack() -> GroupDef {
    GroupDef::new("store_stack")
        .syntax(":op :src, :offset")
        .layout(":opcode:src:offset:zz")
        .with("opcode", 11)
        .before(stack_address)
        .member(OpDef::operation("sts.b").with("zz", 0).action(|ctx| {
            let (addr, value) = (ctx.var("addr")?, ctx.reg("src")?);
            ctx.store(addr, 1, value)?;
            Ok(None)
        }))
        .member(OpDef::operation("sts.w").with("zz", 1).action(|ctx| {
            let (addr, value) = (ctx.var("addr")?, ctx.reg("src")?);
            ctx.store(addr, 2, value)?;
            Ok(None)
        }))
        .member(OpDef::operation("sts.d").with("zz", 2).action(|ctx| {
            let (addr, value) = (ctx.var("addr")?, ctx.reg("src")?);
            ctx.store(addr, 4, value)?;
            Ok(None)
        }))
}

fn move_immediate_to_byte() -> GroupDef {
    GroupDef::new("move_immediate_to_byte")
        .syntax(":op :dest, :imm")
        .layout(":opcode:dest:imm")
        .member(OpDef::operation("mib0").with("opcode", 12).action(|ctx| move_byte(ctx, 0)))
        .member(OpDef::operation("mib1").with("opcode", 13).action(|ctx| move_byte(ctx, 1)))
        .member(OpDef::operation("mib2").with("opcode", 14).action(|ctx| move_byte(ctx, 2)))
        .member(OpDef::operation("mib3").with("opcode", 15).action(|ctx| move_byte(ctx, 3)))
        .member(OpDef::mnemonic("mimm", |ctx| {
            let dest = ctx.var("dest")?;
            let imm = ctx.var("imm")?;
            for (n, name) in ["mib0", "mib1", "mib2", "mib3"].into_iter().enumerate() {
                let byte = (imm >> (8 * n)) & 0xFF;
                ctx.insert(name, &[("dest", dest), ("imm", byte)])?;
            }
            Ok(())
        }))
}

/// Build the reference instruction set.
pub fn isa3220() -> Result<InstructionSet> {
    IsaBuilder::new()
        .instruction_width(16)
        .data_width(32)
        .byte_order(ByteOrder::LittleEndian)
        .instruction_start(0x40000)
        .field_width("opcode", 4)
        .field_width("reg", 4)
        .field_width("ext", 4)
        .field_width("zz", 2)
        .terminating_instruction(TERMINATING_WORD)
        .ground_register(0, ZERO)
        .reserve_register(14, JUMP)
        .reserve_register(15, STACK)
        .register_args(&["dest", "src", "addrsrc"])
        .destination("dest")
        .register_formats(&["R:val", "$:val", "r:val"])
        .group(arith())
        .group(arith_with_immediate())
        .group(conditional_branch())
        // The primitive comes first so inserts of "jump" resolve to it.
        .def(
            OpDef::operation("jump")
                .aliases(&["call", "return"])
                .syntax(":op :addrsrc")
                .layout(":opcode:addrsrc00000000")
                .with("opcode", 7)
                .action(|ctx| {
                    let link = ctx.next_pc() as Value;
                    let target = ctx.reg("addrsrc")?;
                    let target = ctx.address(target);
                    ctx.set_pc(target);
                    ctx.set_reg_named(JUMP, link)?;
                    Ok(None)
                }),
        )
        .def(
            OpDef::mnemonic("jump", |ctx| {
                let target = target(ctx)?;
                let jump = ctx.register(JUMP)?;
                ctx.insert("mimm", &[("dest", jump), ("imm", target as Value)])?;
                ctx.insert("jump", &[("addrsrc", jump)])
            })
            .aliases(&["call", "return"])
            .syntax(":op :imm"),
        )
        .group(load())
        .group(store())
        .group(load_stack())
        .group(store_stack())
        .group(move_immediate_to_byte())
        .build()
}
