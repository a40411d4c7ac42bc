//! Hack instructions and the sink they are written to.

use std::collections::HashSet;
use std::fmt;
use std::io::Write;

use crate::error::{Result, TranslateError};

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Instruction {
    /// `@value`
    Address(String),
    /// `dest=comp;jump`
    Compute {
        dest: Option<String>,
        comp: String,
        jump: Option<String>,
    },
    /// `(name)`; resolved by the assembler, occupies no ROM word.
    Label(String),
    /// Annotation only, never seen by the assembler.
    Comment(String),
}

impl Instruction {
    pub fn comment(text: impl Into<String>) -> Self {
        Instruction::Comment(text.into())
    }

    pub fn is_comment(&self) -> bool {
        matches!(self, Instruction::Comment(_))
    }
}

impl From<&str> for Instruction {
    fn from(line: &str) -> Self {
        if let Some(text) = line.strip_prefix("//") {
            return Instruction::Comment(text.trim().to_string());
        }
        if let Some(value) = line.strip_prefix('@') {
            return Instruction::Address(value.to_string());
        }
        if let Some(name) = line.strip_prefix('(').and_then(|l| l.strip_suffix(')')) {
            return Instruction::Label(name.to_string());
        }
        let (rest, jump) = match line.split_once(';') {
            Some((rest, jump)) => (rest, Some(jump.to_string())),
            None => (line, None),
        };
        let (dest, comp) = match rest.split_once('=') {
            Some((dest, comp)) => (Some(dest.to_string()), comp),
            None => (None, rest),
        };
        Instruction::Compute {
            dest,
            comp: comp.to_string(),
            jump,
        }
    }
}

impl From<String> for Instruction {
    fn from(line: String) -> Self {
        Instruction::from(line.as_str())
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::Address(value) => write!(f, "@{}", value),
            Instruction::Compute { dest, comp, jump } => {
                if let Some(dest) = dest {
                    write!(f, "{}=", dest)?;
                }
                f.write_str(comp)?;
                if let Some(jump) = jump {
                    write!(f, ";{}", jump)?;
                }
                Ok(())
            }
            Instruction::Label(name) => write!(f, "({})", name),
            Instruction::Comment(text) => write!(f, "// {}", text),
        }
    }
}

/// Builds a `Vec<Instruction>` from assembly lines.
#[macro_export]
macro_rules! asm {
    ($($x:expr),* $(,)?) => (vec![$($crate::emitter::Instruction::from($x)),*]);
}

/// Writes instructions line by line and guards label uniqueness.
pub struct Emitter<W: Write> {
    out: W,
    comments: bool,
    declared: HashSet<String>,
    written: usize,
}

impl<W: Write> Emitter<W> {
    pub fn new(out: W, comments: bool) -> Self {
        Emitter {
            out,
            comments,
            declared: HashSet::new(),
            written: 0,
        }
    }

    pub fn emit(&mut self, instruction: &Instruction) -> Result<()> {
        match instruction {
            Instruction::Comment(_) if !self.comments => Ok(()),
            Instruction::Comment(_) => Ok(writeln!(self.out, "{}", instruction)?),
            Instruction::Label(name) => {
                if !self.declared.insert(name.clone()) {
                    return Err(TranslateError::DuplicateLabel(name.clone()));
                }
                Ok(writeln!(self.out, "{}", instruction)?)
            }
            _ => {
                self.written += 1;
                Ok(writeln!(self.out, "    {}", instruction)?)
            }
        }
    }

    pub fn emit_all<'a>(&mut self, instructions: impl IntoIterator<Item = &'a Instruction>) -> Result<()> {
        for instruction in instructions {
            self.emit(instruction)?;
        }
        Ok(())
    }

    /// Number of ROM words written so far.
    pub fn written(&self) -> usize {
        self.written
    }

    pub fn finish(mut self) -> Result<W> {
        self.out.flush()?;
        Ok(self.out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_lines() {
        assert_eq!(Instruction::from("@SP"), Instruction::Address("SP".into()));
        assert_eq!(Instruction::from("(LOOP)"), Instruction::Label("LOOP".into()));
        assert_eq!(
            Instruction::from("AM=M-1"),
            Instruction::Compute {
                dest: Some("AM".into()),
                comp: "M-1".into(),
                jump: None
            }
        );
        assert_eq!(
            Instruction::from("D;JNE"),
            Instruction::Compute {
                dest: None,
                comp: "D".into(),
                jump: Some("JNE".into())
            }
        );
        assert!(Instruction::from("// push constant 1").is_comment());
    }

    #[test]
    fn display_matches_source() {
        for line in ["@256", "D=A", "0;JMP", "(Main.main)", "AM=M+1", "D;JGT"] {
            assert_eq!(Instruction::from(line).to_string(), line);
        }
    }

    #[test]
    fn comments_can_be_dropped() {
        let mut emitter = Emitter::new(Vec::new(), false);
        emitter.emit_all(&asm!["// push", "@SP", "(X)"]).unwrap();
        assert_eq!(emitter.written(), 1);
        let out = String::from_utf8(emitter.finish().unwrap()).unwrap();
        assert_eq!(out, "    @SP\n(X)\n");
    }

    #[test]
    fn duplicate_label_is_fatal() {
        let mut emitter = Emitter::new(Vec::new(), true);
        emitter.emit(&Instruction::Label("Main$END".into())).unwrap();
        assert!(matches!(
            emitter.emit(&Instruction::Label("Main$END".into())),
            Err(TranslateError::DuplicateLabel(label)) if label == "Main$END"
        ));
    }
}
