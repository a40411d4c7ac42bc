//! A small Hack CPU used to run translated programs.
//!
//! Only canonical `comp` mnemonics are accepted so that non-standard forms
//! emitted by the translator fail loudly here too.

#![allow(dead_code)]

use std::collections::HashMap;

use vm_translator::{parse_unit, translate_to_string, TranslatorConfig, Unit};

const MAX_STEPS: usize = 5_000_000;

#[derive(Debug, Clone)]
enum Op {
    At(u16),
    Compute {
        dest: String,
        comp: String,
        jump: String,
    },
}

pub struct Machine {
    rom: Vec<Op>,
    symbols: HashMap<String, u16>,
    pub ram: Vec<i16>,
    pub a: i16,
    pub d: i16,
    pub pc: usize,
}

fn predefined() -> HashMap<String, u16> {
    let mut symbols: HashMap<String, u16> = (0..16).map(|i| (format!("R{}", i), i)).collect();
    for (name, addr) in [
        ("SP", 0),
        ("LCL", 1),
        ("ARG", 2),
        ("THIS", 3),
        ("THAT", 4),
        ("SCREEN", 16384),
        ("KBD", 24576),
    ] {
        symbols.insert(name.to_string(), addr);
    }
    symbols
}

impl Machine {
    pub fn assemble(source: &str) -> Self {
        let lines: Vec<&str> = source
            .lines()
            .map(|l| l.split_once("//").map(|(s, _)| s).unwrap_or(l).trim())
            .filter(|l| !l.is_empty())
            .collect();

        let mut symbols = predefined();
        let mut address = 0u16;
        for line in &lines {
            if let Some(label) = line.strip_prefix('(').and_then(|l| l.strip_suffix(')')) {
                assert!(
                    symbols.insert(label.to_string(), address).is_none(),
                    "label {} defined twice",
                    label
                );
            } else {
                address += 1;
            }
        }

        let mut next_variable = 16u16;
        let mut rom = vec![];
        for line in &lines {
            if line.starts_with('(') {
                continue;
            }
            if let Some(sym) = line.strip_prefix('@') {
                let value = match sym.parse::<u16>() {
                    Ok(value) => value,
                    Err(_) => *symbols.entry(sym.to_string()).or_insert_with(|| {
                        next_variable += 1;
                        next_variable - 1
                    }),
                };
                rom.push(Op::At(value));
                continue;
            }
            let (rest, jump) = line.split_once(';').unwrap_or((line, ""));
            let (dest, comp) = rest.split_once('=').unwrap_or(("", rest));
            rom.push(Op::Compute {
                dest: dest.to_string(),
                comp: comp.to_string(),
                jump: jump.to_string(),
            });
        }

        Machine {
            rom,
            symbols,
            ram: vec![0; 1 << 16],
            a: 0,
            d: 0,
            pc: 0,
        }
    }

    pub fn address_of(&self, symbol: &str) -> u16 {
        *self
            .symbols
            .get(symbol)
            .unwrap_or_else(|| panic!("unknown symbol {}", symbol))
    }

    pub fn at(&self, addr: u16) -> i16 {
        self.ram[addr as usize]
    }

    fn compute(&self, comp: &str) -> i16 {
        let a = self.a;
        let d = self.d;
        let m = self.ram[a as u16 as usize];
        match comp {
            "0" => 0,
            "1" => 1,
            "-1" => -1,
            "D" => d,
            "A" => a,
            "M" => m,
            "!D" => !d,
            "!A" => !a,
            "!M" => !m,
            "-D" => d.wrapping_neg(),
            "-A" => a.wrapping_neg(),
            "-M" => m.wrapping_neg(),
            "D+1" => d.wrapping_add(1),
            "A+1" => a.wrapping_add(1),
            "M+1" => m.wrapping_add(1),
            "D-1" => d.wrapping_sub(1),
            "A-1" => a.wrapping_sub(1),
            "M-1" => m.wrapping_sub(1),
            "D+A" => d.wrapping_add(a),
            "D+M" => d.wrapping_add(m),
            "D-A" => d.wrapping_sub(a),
            "D-M" => d.wrapping_sub(m),
            "A-D" => a.wrapping_sub(d),
            "M-D" => m.wrapping_sub(d),
            "D&A" => d & a,
            "D&M" => d & m,
            "D|A" => d | a,
            "D|M" => d | m,
            other => panic!("non-canonical comp `{}`", other),
        }
    }

    /// Runs until the program spins on a jump to itself.
    pub fn run(&mut self) {
        for _ in 0..MAX_STEPS {
            let op = self
                .rom
                .get(self.pc)
                .unwrap_or_else(|| panic!("pc {} ran off the program", self.pc))
                .clone();
            match op {
                Op::At(value) => {
                    self.a = value as i16;
                    self.pc += 1;
                }
                Op::Compute { dest, comp, jump } => {
                    let out = self.compute(&comp);
                    let target = self.a as u16 as usize;
                    if dest.contains('M') {
                        self.ram[target] = out;
                    }
                    if dest.contains('D') {
                        self.d = out;
                    }
                    if dest.contains('A') {
                        self.a = out;
                    }
                    let taken = match jump.as_str() {
                        "" => false,
                        "JGT" => out > 0,
                        "JEQ" => out == 0,
                        "JGE" => out >= 0,
                        "JLT" => out < 0,
                        "JNE" => out != 0,
                        "JLE" => out <= 0,
                        "JMP" => true,
                        other => panic!("bad jump `{}`", other),
                    };
                    if taken {
                        if target + 1 == self.pc && jump == "JMP" {
                            return;
                        }
                        self.pc = target;
                    } else {
                        self.pc += 1;
                    }
                }
            }
        }
        panic!("program did not halt within {} steps", MAX_STEPS);
    }

    pub fn sp(&self) -> i16 {
        self.ram[0]
    }

    pub fn top(&self) -> i16 {
        self.ram[(self.sp() - 1) as usize]
    }
}

/// Translates `(unit name, source)` pairs with the bootstrap and runs them.
pub fn run_program(units: &[(&str, &str)]) -> Machine {
    let units: Vec<Unit> = units
        .iter()
        .map(|(name, source)| parse_unit(name, source).unwrap())
        .collect();
    let asm = translate_to_string(&units, &TranslatorConfig::default()).unwrap();
    let mut machine = Machine::assemble(&asm);
    machine.run();
    machine
}

/// Runs one unit without bootstrap, the stack starting at 256.
pub fn run_bare(source: &str) -> Machine {
    let config = TranslatorConfig {
        bootstrap: false,
        ..TranslatorConfig::default()
    };
    let unit = parse_unit("Main", source).unwrap();
    let asm = translate_to_string(&[unit], &config).unwrap();
    let mut machine = Machine::assemble(&asm);
    machine.ram[0] = 256;
    machine.run();
    machine
}

/// VM code pushing any 16-bit value.
pub fn push_value(value: i16) -> String {
    match value {
        v if v >= 0 => format!("push constant {}\n", v),
        i16::MIN => "push constant 32767\nneg\npush constant 1\nsub\n".to_string(),
        v => format!("push constant {}\nneg\n", -v),
    }
}

pub const HALT: &str = "label HALT\ngoto HALT\n";
