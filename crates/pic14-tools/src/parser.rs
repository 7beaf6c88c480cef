//! Line-level syntax for assembler source and register-name files.

use pic14_core::{Catalog, PointerMode};

use crate::errors::AsmErrorKind;
use crate::symbols::SymbolTable;

/// Parses a numeric literal.
///
/// Accepted forms: `0x1F`, `H'1F'`, `B'0101'`, `D'10'`, `O'17'` and plain
/// decimal. Prefix letters are case-insensitive.
#[must_use]
pub fn parse_number(text: &str) -> Option<i64> {
    let text = text.trim();
    if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        return i64::from_str_radix(hex, 16).ok();
    }
    let bytes = text.as_bytes();
    if bytes.len() >= 3 && bytes[1] == b'\'' && bytes[bytes.len() - 1] == b'\'' {
        let radix = match bytes[0].to_ascii_uppercase() {
            b'H' => 16,
            b'B' => 2,
            b'D' => 10,
            b'O' => 8,
            _ => return None,
        };
        return i64::from_str_radix(&text[2..text.len() - 1], radix).ok();
    }
    if !text.is_empty() && text.bytes().all(|byte| byte.is_ascii_digit()) {
        return text.parse().ok();
    }
    None
}

/// Strips a `;` comment.
#[must_use]
pub fn strip_comment(line: &str) -> &str {
    line.split_once(';').map_or(line, |(code, _)| code)
}

/// Whether `text` can name a symbol.
#[must_use]
pub fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    chars
        .next()
        .is_some_and(|first| first.is_ascii_alphabetic() || first == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Sign {
    Plus,
    Minus,
}

impl Sign {
    const fn flip(self) -> Self {
        match self {
            Self::Plus => Self::Minus,
            Self::Minus => Self::Plus,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Term {
    Number(i64),
    Symbol(String),
    Here,
}

/// Sum of numbers, symbols and `$` joined by `+` and `-`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expr {
    terms: Vec<(Sign, Term)>,
}

impl Expr {
    /// Parses an expression.
    ///
    /// # Errors
    ///
    /// [`AsmErrorKind::BadNumber`] or [`AsmErrorKind::BadOperand`] for
    /// malformed terms.
    pub fn parse(text: &str) -> Result<Self, AsmErrorKind> {
        let text = text.trim();
        let mut terms = Vec::new();
        let mut sign = Sign::Plus;
        let mut current = String::new();
        let mut in_quote = false;
        for c in text.chars() {
            match c {
                '+' | '-' if !in_quote => {
                    let token = current.trim();
                    if token.is_empty() {
                        if c == '-' {
                            sign = sign.flip();
                        }
                    } else {
                        terms.push((sign, Self::term(token)?));
                        sign = if c == '-' { Sign::Minus } else { Sign::Plus };
                        current.clear();
                    }
                }
                '\'' => {
                    in_quote = !in_quote;
                    current.push(c);
                }
                _ => current.push(c),
            }
        }
        let token = current.trim();
        if token.is_empty() {
            return Err(AsmErrorKind::BadOperand(text.to_owned()));
        }
        terms.push((sign, Self::term(token)?));
        Ok(Self { terms })
    }

    fn term(token: &str) -> Result<Term, AsmErrorKind> {
        if token == "$" {
            Ok(Term::Here)
        } else if let Some(value) = parse_number(token) {
            Ok(Term::Number(value))
        } else if is_identifier(token) {
            Ok(Term::Symbol(token.to_ascii_uppercase()))
        } else if token.starts_with(|c: char| c.is_ascii_digit()) || is_radix_literal(token) {
            Err(AsmErrorKind::BadNumber(token.to_owned()))
        } else {
            Err(AsmErrorKind::BadOperand(token.to_owned()))
        }
    }

    /// Evaluates against `symbols`, with `$` standing for `here`.
    ///
    /// # Errors
    ///
    /// [`AsmErrorKind::UnknownSymbol`] for names not in the table.
    pub fn evaluate(&self, symbols: &SymbolTable, here: u32) -> Result<i64, AsmErrorKind> {
        self.terms.iter().try_fold(0_i64, |total, (sign, term)| {
            let value = match term {
                Term::Number(value) => *value,
                Term::Here => i64::from(here),
                Term::Symbol(name) => symbols
                    .get(name)
                    .ok_or_else(|| AsmErrorKind::UnknownSymbol(name.clone()))?,
            };
            Ok(match sign {
                Sign::Plus => total.wrapping_add(value),
                Sign::Minus => total.wrapping_sub(value),
            })
        })
    }
}

fn is_radix_literal(token: &str) -> bool {
    token.len() >= 3 && token.as_bytes()[1] == b'\''
}

/// One instruction operand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    /// `FSR0` or `FSR1` by itself.
    Fsr(u8),
    /// Plain expression: register, bit, literal, destination or label.
    Expr(Expr),
    /// Pre/post increment or decrement through `FSRn`.
    Indirect {
        /// Pointer number.
        fsr: u8,
        /// Update applied to the pointer.
        mode: PointerMode,
    },
    /// `k[FSRn]`.
    Indexed {
        /// Signed offset.
        offset: Expr,
        /// Pointer number.
        fsr: u8,
    },
}

impl Operand {
    /// Parses a single comma-separated operand.
    ///
    /// # Errors
    ///
    /// Propagates expression errors.
    pub fn parse(text: &str) -> Result<Self, AsmErrorKind> {
        let text = text.trim();
        if let Some(fsr) = fsr_number(text) {
            return Ok(Self::Fsr(fsr));
        }
        let upper = text.to_ascii_uppercase();
        if let Some((offset, rest)) = upper.split_once('[') {
            let fsr = rest
                .strip_suffix(']')
                .and_then(fsr_number)
                .ok_or_else(|| AsmErrorKind::BadOperand(text.to_owned()))?;
            let offset = if offset.trim().is_empty() {
                Expr::parse("0")?
            } else {
                Expr::parse(&text[..offset.len()])?
            };
            return Ok(Self::Indexed { offset, fsr });
        }
        let prefixed = |prefix: &str, mode| {
            upper
                .strip_prefix(prefix)
                .and_then(fsr_number)
                .map(|fsr| Self::Indirect { fsr, mode })
        };
        let suffixed = |suffix: &str, mode| {
            upper
                .strip_suffix(suffix)
                .and_then(fsr_number)
                .map(|fsr| Self::Indirect { fsr, mode })
        };
        if let Some(operand) = prefixed("++", PointerMode::PreIncrement)
            .or_else(|| prefixed("--", PointerMode::PreDecrement))
            .or_else(|| suffixed("++", PointerMode::PostIncrement))
            .or_else(|| suffixed("--", PointerMode::PostDecrement))
        {
            return Ok(operand);
        }
        Expr::parse(text).map(Self::Expr)
    }
}

/// Parses `FSR0`/`FSR1`.
#[must_use]
pub fn fsr_number(text: &str) -> Option<u8> {
    match text.trim().to_ascii_uppercase().as_str() {
        "FSR0" => Some(0),
        "FSR1" => Some(1),
        _ => None,
    }
}

/// Directive or instruction body of a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    /// Set the current address.
    Org(Expr),
    /// Define the line's label as a constant.
    Equ(Expr),
    /// Raw program words.
    Dw(Vec<Expr>),
    /// Stop assembling.
    End,
    /// An instruction mnemonic and its operands.
    Instruction {
        /// Uppercase mnemonic as written.
        mnemonic: String,
        /// Parsed operands.
        operands: Vec<Operand>,
    },
}

/// A parsed source line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    /// 1-based line number.
    pub number: usize,
    /// Label or constant name, uppercased.
    pub label: Option<String>,
    /// Directive or instruction.
    pub statement: Option<Statement>,
}

fn is_directive(word: &str) -> bool {
    matches!(
        word.trim_start_matches('.').to_ascii_uppercase().as_str(),
        "ORG" | "EQU" | "END" | "DW"
    )
}

/// Splits one source line into label, directive and operands.
///
/// A label is either `name:` anywhere before the mnemonic or an identifier
/// starting in column 0 that is not itself a mnemonic or directive.
///
/// # Errors
///
/// Operand syntax errors.
pub fn parse_line(number: usize, raw: &str, catalog: &Catalog) -> Result<Line, AsmErrorKind> {
    let code = strip_comment(raw).trim_end();
    let mut rest = code.trim_start();
    let mut label = None;

    let first_end = rest.find(char::is_whitespace).unwrap_or(rest.len());
    let first = &rest[..first_end];
    if let Some(name) = first.strip_suffix(':') {
        if !is_identifier(name) {
            return Err(AsmErrorKind::BadOperand(first.to_owned()));
        }
        label = Some(name.to_ascii_uppercase());
        rest = rest[first_end..].trim_start();
    } else if !first.is_empty()
        && !code.starts_with(char::is_whitespace)
        && catalog.lookup(first).is_none()
        && !is_directive(first)
    {
        if !is_identifier(first) {
            return Err(AsmErrorKind::BadOperand(first.to_owned()));
        }
        label = Some(first.to_ascii_uppercase());
        rest = rest[first_end..].trim_start();
    }

    if rest.is_empty() {
        return Ok(Line {
            number,
            label,
            statement: None,
        });
    }

    let (word, operands) = rest
        .split_once(char::is_whitespace)
        .map_or((rest, ""), |(word, operands)| (word, operands.trim()));
    let keyword = word.trim_start_matches('.').to_ascii_uppercase();
    let operand_texts: Vec<&str> = if operands.is_empty() {
        Vec::new()
    } else {
        operands.split(',').collect()
    };

    let single = |name: &str| -> Result<Expr, AsmErrorKind> {
        match operand_texts.as_slice() {
            [one] => Expr::parse(one),
            other => Err(AsmErrorKind::OperandCount {
                mnemonic: name.to_owned(),
                expected: 1,
                found: other.len(),
            }),
        }
    };

    let statement = match keyword.as_str() {
        "ORG" => Statement::Org(single("ORG")?),
        "EQU" => Statement::Equ(single("EQU")?),
        "END" => Statement::End,
        "DW" => Statement::Dw(
            operand_texts
                .iter()
                .map(|text| Expr::parse(text))
                .collect::<Result<_, _>>()?,
        ),
        _ => Statement::Instruction {
            mnemonic: keyword,
            operands: operand_texts
                .iter()
                .map(|text| Operand::parse(text))
                .collect::<Result<_, _>>()?,
        },
    };

    Ok(Line {
        number,
        label,
        statement: Some(statement),
    })
}
