//! Nom-based line parser.
//!
//! This module provides zero-copy parsing of wire lines using the nom
//! parser combinator library. The owned [`Message`](super::Message) is
//! built from the borrowed [`ParsedMessage`] produced here.

use nom::{
    bytes::complete::{take_till, take_while1},
    character::complete::{char, space0},
    combinator::verify,
    error::{context, VerboseError, VerboseErrorKind},
    sequence::preceded,
    IResult,
};

use crate::error::MessageParseError;

type ParseResult<I, O> = IResult<I, O, VerboseError<I>>;

/// Parse the tag block (the part after `@` and before the first space).
fn parse_tags(input: &str) -> ParseResult<&str, &str> {
    context(
        "parsing tag block",
        preceded(char('@'), take_till(|c| c == ' ')),
    )(input)
}

/// Parse the message prefix (the part after `:` and before the first space).
fn parse_prefix(input: &str) -> ParseResult<&str, &str> {
    context(
        "parsing message prefix",
        preceded(char(':'), take_while1(|c| c != ' ')),
    )(input)
}

/// Parse the command token: a run of non-space characters that does not
/// start a trailing parameter.
fn parse_command(input: &str) -> ParseResult<&str, &str> {
    context(
        "parsing required command",
        verify(take_while1(|c| c != ' '), |s: &str| !s.starts_with(':')),
    )(input)
}

/// Split what follows the command into middle parameters and the trailing
/// parameter.
fn parse_params(input: &str) -> (Vec<&str>, Option<&str>) {
    let mut middles = Vec::new();
    let mut trailing = None;
    let mut rest = input;

    loop {
        let after_space = rest.trim_start_matches(' ');
        if after_space.len() == rest.len() || after_space.is_empty() {
            break;
        }
        rest = after_space;

        if let Some(after_colon) = rest.strip_prefix(':') {
            // Everything after the colon, spaces and colons included.
            trailing = Some(after_colon);
            break;
        }

        let end = rest.find(' ').unwrap_or(rest.len());
        middles.push(&rest[..end]);
        rest = &rest[end..];
    }

    (middles, trailing)
}

/// Parse a complete line into its components.
///
/// Line format:
/// ```text
/// [@tags] [:prefix] <command> [middle...] [:trailing]
/// ```
///
/// The input must already be stripped of its CR/LF terminator.
pub fn parse_message(input: &str) -> ParseResult<&str, ParsedMessage<'_>> {
    let (input, tags) = if input.starts_with('@') {
        let (rest, tags) = parse_tags(input)?;
        (rest, Some(tags))
    } else {
        (input, None)
    };
    let (input, _) = space0(input)?;

    let (input, prefix) = if input.starts_with(':') {
        let (rest, prefix) = parse_prefix(input)?;
        (rest, Some(prefix))
    } else {
        (input, None)
    };
    let (input, _) = space0(input)?;

    let (input, command) = parse_command(input)?;
    let (middles, trailing) = parse_params(input);

    Ok((
        "",
        ParsedMessage {
            tags,
            prefix,
            command,
            middles,
            trailing,
        },
    ))
}

/// A parsed line with borrowed string slices.
///
/// This is the intermediate representation produced by the nom parser.
/// It holds references into the original input string.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedMessage<'a> {
    /// Raw tag block (without the leading `@`), if present.
    pub tags: Option<&'a str>,
    /// Raw prefix (without the leading `:`), if present.
    pub prefix: Option<&'a str>,
    /// The command name or numeric reply code.
    pub command: &'a str,
    /// Space-separated parameters before the trailing one.
    pub middles: Vec<&'a str>,
    /// The colon-prefixed final parameter, if present.
    pub trailing: Option<&'a str>,
}

impl<'a> ParsedMessage<'a> {
    /// Parse a line into a `ParsedMessage`.
    ///
    /// Failures carry the byte position and the innermost parsing context.
    pub fn parse(input: &'a str) -> Result<Self, MessageParseError> {
        match parse_message(input) {
            Ok((_remaining, msg)) => Ok(msg),
            Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => {
                let mut context = None;
                let mut position = input.len();

                for (error_input, error_kind) in &e.errors {
                    if let VerboseErrorKind::Context(ctx) = error_kind {
                        if context.is_none() {
                            context = Some(*ctx);
                            position = input.len() - error_input.len();
                        }
                    }
                }

                Err(MessageParseError::MalformedLine {
                    position,
                    context: context.unwrap_or("parsing line"),
                })
            }
            Err(nom::Err::Incomplete(_)) => Err(MessageParseError::MalformedLine {
                position: input.len(),
                context: "incomplete input",
            }),
        }
    }
}
