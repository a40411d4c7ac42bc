use nom::{
    branch::alt,
    bytes::complete::{is_a, tag},
    character::{
        complete::{digit1, space1},
        is_digit,
    },
    combinator::{map, map_res, value, verify},
    sequence::tuple,
    IResult,
};

use crate::ast::{ArithOp, Command::*, Segment::*, *};
use crate::error::{Result, TranslateError};

fn integer(input: &str) -> IResult<&str, u16> {
    map_res(digit1, |c: &str| c.parse())(input)
}

fn segment(input: &str) -> IResult<&str, Segment> {
    alt((
        value(Constant, tag("constant")),
        value(Local, tag("local")),
        value(Static, tag("static")),
        value(Argument, tag("argument")),
        value(This, tag("this")),
        value(That, tag("that")),
        value(Pointer, tag("pointer")),
        value(Temp, tag("temp")),
    ))(input)
}

fn push(input: &str) -> IResult<&str, Command> {
    map(
        tuple((tag("push"), space1, segment, space1, integer)),
        |(_, _, segment, _, arg)| Push(segment, arg),
    )(input)
}

#[test]
fn test_push() {
    assert_eq!(push("push  pointer  32"), Ok(("", Push(Pointer, 32))));
}

fn pop(input: &str) -> IResult<&str, Command> {
    verify(
        map(
            tuple((tag("pop"), space1, segment, space1, integer)),
            |(_, _, segment, _, arg)| Pop(segment, arg),
        ),
        |p| !matches!(p, Pop(Constant, _)),
    )(input)
}

#[test]
fn test_pop_constant() {
    assert!(pop("pop constant 3").is_err());
    assert_eq!(pop("pop that 3"), Ok(("", Pop(That, 3))));
}

fn prim(input: &str) -> IResult<&str, Command> {
    map(
        alt((
            value(ArithOp::Add, tag("add")),
            value(ArithOp::Sub, tag("sub")),
            value(ArithOp::Neg, tag("neg")),
            value(ArithOp::Eq, tag("eq")),
            value(ArithOp::Gt, tag("gt")),
            value(ArithOp::Lt, tag("lt")),
            value(ArithOp::And, tag("and")),
            value(ArithOp::Or, tag("or")),
            value(ArithOp::Not, tag("not")),
        )),
        Arithmetic,
    )(input)
}

#[test]
fn test_prim() {
    assert_eq!(prim("neg"), Ok(("", Arithmetic(ArithOp::Neg))));
}

fn symbol(input: &str) -> IResult<&str, String> {
    map(
        verify(
            is_a("abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ_.$:0123456789"),
            |c: &str| !is_digit(c.as_bytes()[0]),
        ),
        |sym: &str| sym.to_string(),
    )(input)
}

fn branching(input: &str) -> IResult<&str, Command> {
    map(
        tuple((
            alt((
                tag("label"),
                tag("goto"),
                tag("if-goto"),
            )),
            space1,
            symbol
        )),
        |(op, _, sym)| match op {
            "label" => Label(sym),
            "goto" => Goto(sym),
            _ => IfGoto(sym),
        }
    )(input)
}

#[test]
fn test_branching() {
    assert_eq!(branching("if-goto LOOP_START"), Ok(("", IfGoto("LOOP_START".into()))));
    assert!(branching("goto 1abc").is_err());
}

fn function(input: &str) -> IResult<&str, Command> {
    map(
        tuple((
            alt((tag("function"), tag("call"))),
            space1,
            symbol,
            space1,
            integer,
        )),
        |(op, _, name, _, n)| match op {
            "function" => Function(name, n),
            _ => Call(name, n),
        },
    )(input)
}

#[test]
fn test_function() {
    assert_eq!(function("function Main.fib 2"), Ok(("", Function("Main.fib".into(), 2))));
    assert_eq!(function("call Math.multiply 2"), Ok(("", Call("Math.multiply".into(), 2))));
}

fn ret(input: &str) -> IResult<&str, Command> {
    value(Return, tag("return"))(input)
}

/// Parses one VM source unit. `unit` only labels errors.
pub fn parse(unit: &str, input: &str) -> Result<Vec<Command>> {
    let mut commands = vec![];

    for (n, line) in input.lines().enumerate() {
        let line = line.split_once("//").map(|(s, _)| s).unwrap_or(line).trim();
        if line.is_empty() {
            continue;
        }

        let res = alt((push, pop, prim, branching, function, ret))(line);

        match res {
            Ok(("", command)) => commands.push(command),
            _ => {
                return Err(TranslateError::Parse {
                    unit: unit.to_string(),
                    line: n + 1,
                    text: line.to_string(),
                })
            }
        }
    }

    Ok(commands)
}

#[test]
fn test_parse() {
    let source = "// SimpleFunction\nfunction SimpleFunction.test 2\n\tpush local 0   // comment\n\n  not\nreturn\n";
    assert_eq!(
        parse("SimpleFunction", source).unwrap(),
        vec![
            Function("SimpleFunction.test".into(), 2),
            Push(Local, 0),
            Arithmetic(ArithOp::Not),
            Return,
        ]
    );
}

#[test]
fn test_parse_errors() {
    let err = parse("Bad", "push constant 1\nmul\n").unwrap_err();
    assert!(matches!(err, TranslateError::Parse { line: 2, ref text, .. } if text == "mul"));
    assert!(parse("Bad", "push heap 1").is_err());
    assert!(parse("Bad", "push constant 1 2").is_err());
    assert!(parse("Bad", "push constant 70000").is_err());
    assert!(parse("Bad", "returnx").is_err());
}
