use tracing::{debug, trace};

use crate::asm;
use crate::ast::{ArithOp, Command, Segment};
use crate::config::{DEFAULT_ENTRY_POINT, STACK_ORIGIN};
use crate::emitter::Instruction;
use crate::error::{Result, TranslateError};
use crate::labels::{qualify, LabelAllocator};
use crate::segment::{self, Location, MAX_CONSTANT};

// Scratch registers. ADDR holds a pop destination between the address
// computation and the store. FRAME and RET are only live inside `return`.
const ADDR: &str = "@R13";
const FRAME: &str = "@R13";
const RET: &str = "@R14";

/// Words saved by a call: return address, LCL, ARG, THIS, THAT.
const FRAME_SIZE: u16 = 5;

/// Context for labels generated before the first unit.
const BOOTSTRAP_CONTEXT: &str = "Bootstrap";

/// D -> top of stack, SP++; destroys A
fn push_d() -> Vec<Instruction> {
    asm!["@SP", "AM=M+1", "A=A-1", "M=D"]
}

/// top of stack -> D, SP--; leaves A at the popped slot
fn pop_d() -> Vec<Instruction> {
    asm!["@SP", "AM=M-1", "D=M"]
}

fn push_location(location: &Location) -> Vec<Instruction> {
    let load = match location {
        Location::Constant(value) => asm![format!("@{}", value), "D=A"],
        Location::Indirect { base, index } => asm![
            format!("@{}", base),
            "D=M",
            format!("@{}", index),
            "A=D+A", // A = SEG+arg
            "D=M"    // D = value to push
        ],
        Location::Direct(cell) => asm![format!("@{}", cell), "D=M"],
    };
    [load, push_d()].concat()
}

fn pop_location(location: &Location) -> Result<Vec<Instruction>> {
    let code = match location {
        Location::Constant(_) => return Err(TranslateError::IllegalPop),
        // The address must be computed before the pop clobbers D.
        Location::Indirect { base, index } => [
            asm![
                format!("@{}", base),
                "D=M",
                format!("@{}", index),
                "D=D+A",
                ADDR,
                "M=D" // Store target addr in R13
            ],
            pop_d(),
            asm![ADDR, "A=M", "M=D"],
        ]
        .concat(),
        Location::Direct(cell) => [pop_d(), asm![format!("@{}", cell), "M=D"]].concat(),
    };
    Ok(code)
}

fn un_op(op: &str) -> Vec<Instruction> {
    asm!["@SP", "A=M-1", format!("M={}M", op)]
}

// i.e. no conditions or jumps, just pop and run
fn bin_op(comp: &str) -> Vec<Instruction> {
    asm![
        "@SP",
        "AM=M-1",             // SP--, looking at top of stack now
        "D=M",                // Right arg in D
        "A=A-1",              // Looking at second arg of stack, will overwrite
        format!("M={}", comp) // Op and overwrite second element
    ]
}

fn compare(end: &str, jump: &str) -> Vec<Instruction> {
    asm![
        "@SP",
        "AM=M-1",
        "D=M",
        "A=A-1",
        "D=M-D",
        "M=-1", // Assume true
        format!("@{}", end),
        format!("D;{}", jump),
        "@SP",
        "A=M-1",
        "M=0",
        format!("({})", end)
    ]
}

/// Code generator for one whole program. Units are fed in sequence; the
/// label counters span all of them.
pub struct Translator {
    unit: String,
    function: String,
    labels: LabelAllocator,
    entry_point: String,
}

impl Default for Translator {
    fn default() -> Self {
        Self::new(DEFAULT_ENTRY_POINT)
    }
}

impl Translator {
    pub fn new(entry_point: &str) -> Self {
        Translator {
            unit: String::new(),
            function: BOOTSTRAP_CONTEXT.to_string(),
            labels: LabelAllocator::new(),
            entry_point: entry_point.to_string(),
        }
    }

    /// Starts a new translation unit; re-keys `static` and resets the
    /// function scope to the unit itself.
    pub fn begin_unit(&mut self, name: &str) {
        self.unit = name.to_string();
        self.function = name.to_string();
    }

    #[cfg(test)]
    fn current_function(&self) -> &str {
        &self.function
    }

    /// `SP = 256; call <entry> 0`
    pub fn bootstrap(&mut self) -> Result<Vec<Instruction>> {
        let init = asm![
            "// bootstrap",
            format!("@{}", STACK_ORIGIN),
            "D=A",
            "@SP",
            "M=D"
        ];
        let entry = self.entry_point.clone();
        Ok([init, self.call(&entry, 0)?].concat())
    }

    fn push(&self, segment: Segment, arg: u16) -> Result<Vec<Instruction>> {
        let location = segment::resolve(&self.unit, segment, arg)?;
        Ok(push_location(&location))
    }

    fn pop(&self, segment: Segment, arg: u16) -> Result<Vec<Instruction>> {
        let location = segment::resolve_writable(&self.unit, segment, arg)?;
        pop_location(&location)
    }

    fn arithmetic(&mut self, op: ArithOp) -> Vec<Instruction> {
        match op {
            ArithOp::Add => bin_op("D+M"),
            ArithOp::Sub => bin_op("M-D"),
            ArithOp::And => bin_op("D&M"),
            ArithOp::Or => bin_op("D|M"),
            ArithOp::Neg => un_op("-"),
            ArithOp::Not => un_op("!"),
            ArithOp::Eq => compare(&self.labels.comparison(op), "JEQ"),
            ArithOp::Gt => compare(&self.labels.comparison(op), "JGT"),
            ArithOp::Lt => compare(&self.labels.comparison(op), "JLT"),
        }
    }

    fn label(&self, label: &str) -> Vec<Instruction> {
        asm![format!("({})", qualify(&self.function, label))]
    }

    fn goto(&self, label: &str) -> Vec<Instruction> {
        asm![
            format!("@{}", qualify(&self.function, label)),
            "0;JMP" // Unconditional jump
        ]
    }

    fn if_goto(&self, label: &str) -> Vec<Instruction> {
        [
            pop_d(),
            asm![
                format!("@{}", qualify(&self.function, label)),
                "D;JNE" // False is 0, anything else jumps
            ],
        ]
        .concat()
    }

    fn function(&mut self, name: &str, n_vars: u16) -> Vec<Instruction> {
        debug!(function = name, n_vars, "entering function");
        self.function = name.to_string();
        let mut code = asm![format!("({})", name)];
        for _ in 0..n_vars {
            code.extend(asm!["@SP", "AM=M+1", "A=A-1", "M=0"]);
        }
        code
    }

    fn call(&mut self, name: &str, n_args: u16) -> Result<Vec<Instruction>> {
        // ARG is repositioned with a single `@` literal
        let back = u32::from(n_args) + u32::from(FRAME_SIZE);
        if back > u32::from(MAX_CONSTANT) {
            return Err(TranslateError::IndexOutOfRange {
                segment: Segment::Argument,
                index: n_args,
            });
        }
        let ret = self.labels.return_point(&self.function);
        let mut code = asm![format!("@{}", ret), "D=A"];
        code.extend(push_d());
        for saved in ["@LCL", "@ARG", "@THIS", "@THAT"] {
            code.extend(asm![saved, "D=M"]);
            code.extend(push_d());
        }
        code.extend(asm![
            "@SP",
            "D=M",
            format!("@{}", back),
            "D=D-A",
            "@ARG",
            "M=D", // ARG = SP - n_args - 5
            "@SP",
            "D=M",
            "@LCL",
            "M=D", // LCL = SP
            format!("@{}", name),
            "0;JMP",
            format!("({})", ret)
        ]);
        Ok(code)
    }

    fn restore(register: &str) -> Vec<Instruction> {
        asm![FRAME, "AM=M-1", "D=M", register, "M=D"]
    }

    fn ret(&self) -> Vec<Instruction> {
        [
            asm![
                "@LCL",
                "D=M-1",
                FRAME,
                "M=D", // FRAME = address of saved THAT
                "@4",
                "A=D-A",
                "D=M",
                RET,
                "M=D" // Read before *ARG is overwritten; they alias when n_args is 0
            ],
            pop_d(),
            asm![
                "@ARG",
                "A=M",
                "M=D", // Return value replaces the first argument
                "@ARG",
                "D=M+1",
                "@SP",
                "M=D",
                FRAME,
                "A=M",
                "D=M",
                "@THAT",
                "M=D"
            ],
            Self::restore("@THIS"),
            Self::restore("@ARG"),
            Self::restore("@LCL"),
            asm![RET, "A=M", "0;JMP"],
        ]
        .concat()
    }

    /// Translates a single command, prefixed with its source as a comment.
    pub fn translate_command(&mut self, command: &Command) -> Result<Vec<Instruction>> {
        trace!(%command, "translating");
        let translated = match command {
            Command::Arithmetic(op) => Ok(self.arithmetic(*op)),
            Command::Push(seg, arg) => self.push(*seg, *arg),
            Command::Pop(seg, arg) => self.pop(*seg, *arg),
            Command::Label(sym) => Ok(self.label(sym)),
            Command::Goto(sym) => Ok(self.goto(sym)),
            Command::IfGoto(sym) => Ok(self.if_goto(sym)),
            Command::Function(name, n_vars) => Ok(self.function(name, *n_vars)),
            Command::Call(name, n_args) => self.call(name, *n_args),
            Command::Return => Ok(self.ret()),
        };
        let mut code = vec![Instruction::comment(command.to_string())];
        code.extend(translated.map_err(|e| e.in_command(command))?);
        Ok(code)
    }

    #[cfg(test)]
    fn translate(&mut self, commands: &[Command]) -> Result<Vec<Instruction>> {
        let mut instructions = vec![];

        for command in commands {
            instructions.extend(self.translate_command(command)?);
        }

        Ok(instructions)
    }
}
