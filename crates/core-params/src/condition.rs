//! # Condition Language
//!
//! A readable authoring format for parameter sets. A [`Condition`] is parsed
//! from text, then compiled into the flat node encoding stored by the
//! registry (node 0 is the root, children always follow their parent).
//!
//! ## Syntax Examples
//!
//! ```text
//! arg[0] == 5
//! arg[0] >= 10 AND timestamp < 1700000000
//! caller == 0x00000000000000000000000000000000000000aa OR block > 100
//! IF arg[1] THEN arg[0] < 100 ELSE arg[0] < 10
//! NOT (ORACLE 0x1111111111111111111111111111111111111111)
//! ```
//!
//! A bare operand (`arg[1]`) is true when non-zero. `IF ... ELSE` takes the
//! whole remaining expression as its else branch unless parenthesized.
//!
//! ## Limits
//!
//! - Maximum source length: [`MAX_CONDITION_LENGTH`] characters
//! - Maximum nesting: [`MAX_EVAL_DEPTH`](crate::MAX_EVAL_DEPTH), so every
//!   compiled condition is evaluable under the default limits

use crate::builder::ParamBuilder;
use crate::error::{ParamError, Result};
use crate::oracle::OracleRef;
use crate::param::{Op, Param, BLOCK_HEIGHT_PARAM_ID, LITERAL_PARAM_ID};
use crate::word::Word;
use crate::MAX_EVAL_DEPTH;
use core_identity::Entity;
use std::fmt;

/// Maximum length of a condition string (DoS prevention)
pub const MAX_CONDITION_LENGTH: usize = 1024;

/// Parser recursion bound; parentheses and NOT both count
const MAX_PARSE_DEPTH: usize = 2 * MAX_EVAL_DEPTH;

/// Left operand of a comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    /// Caller-supplied argument at this index
    Arg(u8),
    /// Current block height
    BlockHeight,
    /// Current timestamp
    Timestamp,
    /// Immediate invoker
    Caller,
}

impl Source {
    /// Reject constants the node cannot hold without losing bits
    fn check_width(self, value: Word) -> Result<()> {
        let fits = match self {
            Self::Caller => Word::from_address(value.low_address()) == value,
            _ => value.fits_value(),
        };
        if fits {
            Ok(())
        } else {
            Err(ParamError::InvalidCondition(format!(
                "constant {} is too wide for {}",
                value, self
            )))
        }
    }

    fn param(self, op: Op, value: Word) -> Result<Param> {
        self.check_width(value)?;
        match self {
            Self::Arg(index) if (BLOCK_HEIGHT_PARAM_ID..=LITERAL_PARAM_ID).contains(&index) => {
                Err(ParamError::InvalidCondition(format!(
                    "argument index {} is reserved",
                    index
                )))
            }
            Self::Arg(index) => Ok(Param::arg(index, op, value)),
            Self::BlockHeight => Ok(Param::block_height(op, value)),
            Self::Timestamp => Ok(Param::timestamp(op, value)),
            Self::Caller => Ok(Param::caller(op, Entity::new(value.low_address()))),
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Arg(index) => write!(f, "arg[{}]", index),
            Self::BlockHeight => write!(f, "block"),
            Self::Timestamp => write!(f, "timestamp"),
            Self::Caller => write!(f, "caller"),
        }
    }
}

/// A condition tree prior to compilation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    /// Logical AND (right side skipped when left is false)
    And(Box<Condition>, Box<Condition>),
    /// Logical OR (right side skipped when left is true)
    Or(Box<Condition>, Box<Condition>),
    /// Logical XOR (both sides evaluated)
    Xor(Box<Condition>, Box<Condition>),
    /// Logical NOT
    Not(Box<Condition>),
    /// Evaluate `condition`, then exactly one branch
    IfElse {
        /// Branch selector
        condition: Box<Condition>,
        /// Taken when the selector is true
        then: Box<Condition>,
        /// Taken when the selector is false
        otherwise: Box<Condition>,
    },
    /// Compare a source with a constant
    Compare {
        /// Left operand
        source: Source,
        /// Comparison operator
        op: Op,
        /// Constant right operand
        value: Word,
    },
    /// A source is non-zero
    Truthy(Source),
    /// Ask an oracle
    Oracle(OracleRef),
    /// Always true
    True,
    /// Always false
    False,
}

impl Condition {
    /// Parse a condition from a string
    ///
    /// # Examples
    ///
    /// ```
    /// use core_params::Condition;
    ///
    /// let cond = Condition::parse("arg[0] == 5 AND NOT (caller == 0x01)").unwrap();
    /// assert!(Condition::parse("arg[0] = 5").is_err());
    /// ```
    ///
    /// # Errors
    ///
    /// * `ParamError::InvalidCondition` - syntax error
    /// * `ParamError::ConditionTooLong` - input exceeds `MAX_CONDITION_LENGTH`
    /// * `ParamError::ConditionTooDeep` - parser recursion exceeds twice `MAX_EVAL_DEPTH`
    pub fn parse(input: &str) -> Result<Self> {
        if input.len() > MAX_CONDITION_LENGTH {
            return Err(ParamError::ConditionTooLong {
                max: MAX_CONDITION_LENGTH,
                length: input.len(),
            });
        }

        let tokens = tokenize(input)?;
        let mut parser = Parser::new(&tokens);
        let condition = parser.parse_or()?;
        if let Some(token) = parser.current() {
            return Err(ParamError::InvalidCondition(format!(
                "Unexpected trailing token {:?}",
                token
            )));
        }
        Ok(condition)
    }

    /// Logic nesting depth (a leaf has depth 0)
    #[must_use]
    pub fn depth(&self) -> usize {
        match self {
            Self::And(l, r) | Self::Or(l, r) | Self::Xor(l, r) => 1 + l.depth().max(r.depth()),
            Self::Not(inner) => 1 + inner.depth(),
            Self::IfElse {
                condition,
                then,
                otherwise,
            } => 1 + condition.depth().max(then.depth()).max(otherwise.depth()),
            _ => 0,
        }
    }

    /// Compile into raw parameter words
    ///
    /// ```
    /// use core_params::{Condition, Op, Param};
    ///
    /// let raw = Condition::parse("arg[0] == 5").unwrap().compile().unwrap();
    /// assert_eq!(raw, vec![Param::arg(0, Op::Eq, 5u64).encode()]);
    /// ```
    ///
    /// # Errors
    ///
    /// * `ParamError::ConditionTooDeep` - deeper than `MAX_EVAL_DEPTH`
    /// * `ParamError::InvalidCondition` - an argument index collides with a reserved id
    /// * `ParamError::TooManyParams` - too many nodes
    pub fn compile(&self) -> Result<Vec<Word>> {
        if self.depth() > MAX_EVAL_DEPTH {
            return Err(ParamError::ConditionTooDeep {
                max: MAX_EVAL_DEPTH,
            });
        }
        let mut nodes = Vec::new();
        self.emit(&mut nodes)?;
        ParamBuilder::new().nodes(nodes).build()
    }

    fn emit(&self, nodes: &mut Vec<Param>) -> Result<u32> {
        let index = u32::try_from(nodes.len()).map_err(|_| ParamError::TooManyParams {
            max: crate::MAX_PARAMS_PER_SET,
            attempted: nodes.len(),
        })?;
        // Reserve the slot so children land after their parent
        nodes.push(Param::literal(Op::None, Word::ZERO));

        let param = match self {
            Self::True => Param::new(LITERAL_PARAM_ID, Op::Ret, Word::ONE),
            Self::False => Param::new(LITERAL_PARAM_ID, Op::Ret, Word::ZERO),
            Self::Compare { source, op, value } => source.param(*op, *value)?,
            Self::Truthy(source) => source.param(Op::Ret, Word::ZERO)?,
            Self::Oracle(oracle) => Param::oracle(*oracle.as_bytes()),
            Self::Not(inner) => Param::not(inner.emit(nodes)?),
            Self::And(l, r) => {
                let left = l.emit(nodes)?;
                Param::and(left, r.emit(nodes)?)
            }
            Self::Or(l, r) => {
                let left = l.emit(nodes)?;
                Param::or(left, r.emit(nodes)?)
            }
            Self::Xor(l, r) => {
                let left = l.emit(nodes)?;
                Param::xor(left, r.emit(nodes)?)
            }
            Self::IfElse {
                condition,
                then,
                otherwise,
            } => {
                let c = condition.emit(nodes)?;
                let t = then.emit(nodes)?;
                Param::if_else(c, t, otherwise.emit(nodes)?)
            }
        };
        nodes[index as usize] = param;
        Ok(index)
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::And(l, r) => write!(f, "({} AND {})", l, r),
            Self::Or(l, r) => write!(f, "({} OR {})", l, r),
            Self::Xor(l, r) => write!(f, "({} XOR {})", l, r),
            Self::Not(inner) => write!(f, "NOT ({})", inner),
            Self::IfElse {
                condition,
                then,
                otherwise,
            } => write!(f, "(IF {} THEN {} ELSE {})", condition, then, otherwise),
            Self::Compare { source, op, value } => write!(f, "{} {} {}", source, op, value),
            Self::Truthy(source) => write!(f, "{}", source),
            Self::Oracle(oracle) => write!(f, "ORACLE {}", oracle),
            Self::True => write!(f, "TRUE"),
            Self::False => write!(f, "FALSE"),
        }
    }
}

// ===== TOKENIZER =====

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    And,
    Or,
    Xor,
    Not,
    If,
    Then,
    Else,
    True,
    False,
    Oracle,
    LeftParen,
    RightParen,
    LeftBracket,
    RightBracket,
    Compare(Op),
    Identifier(String),
    Number(String),
}

fn tokenize(input: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(&ch) = chars.peek() {
        match ch {
            ' ' | '\t' | '\n' | '\r' => {
                chars.next();
            }
            '(' => {
                tokens.push(Token::LeftParen);
                chars.next();
            }
            ')' => {
                tokens.push(Token::RightParen);
                chars.next();
            }
            '[' => {
                tokens.push(Token::LeftBracket);
                chars.next();
            }
            ']' => {
                tokens.push(Token::RightBracket);
                chars.next();
            }
            '=' => {
                chars.next();
                if chars.peek() == Some(&'=') {
                    chars.next();
                    tokens.push(Token::Compare(Op::Eq));
                } else {
                    return Err(ParamError::InvalidCondition(
                        "Single '=' not allowed, use '=='".into(),
                    ));
                }
            }
            '!' => {
                chars.next();
                if chars.peek() == Some(&'=') {
                    chars.next();
                    tokens.push(Token::Compare(Op::Neq));
                } else {
                    return Err(ParamError::InvalidCondition(
                        "Single '!' not allowed, use '!=' or 'NOT'".into(),
                    ));
                }
            }
            '<' | '>' => {
                chars.next();
                let inclusive = chars.peek() == Some(&'=');
                if inclusive {
                    chars.next();
                }
                let op = match (ch, inclusive) {
                    ('<', false) => Op::Lt,
                    ('<', true) => Op::Lte,
                    (_, false) => Op::Gt,
                    (_, true) => Op::Gte,
                };
                tokens.push(Token::Compare(op));
            }
            c if c.is_ascii_digit() => {
                let mut literal = String::new();
                while let Some(&ch) = chars.peek() {
                    if ch.is_ascii_alphanumeric() || ch == '_' {
                        if ch != '_' {
                            literal.push(ch);
                        }
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token::Number(literal));
            }
            c if c.is_alphabetic() || c == '_' => {
                let mut ident = String::new();
                while let Some(&ch) = chars.peek() {
                    if ch.is_alphanumeric() || ch == '_' {
                        ident.push(ch);
                        chars.next();
                    } else {
                        break;
                    }
                }
                let token = match ident.as_str() {
                    "AND" => Token::And,
                    "OR" => Token::Or,
                    "XOR" => Token::Xor,
                    "NOT" => Token::Not,
                    "IF" => Token::If,
                    "THEN" => Token::Then,
                    "ELSE" => Token::Else,
                    "TRUE" => Token::True,
                    "FALSE" => Token::False,
                    "ORACLE" => Token::Oracle,
                    _ => Token::Identifier(ident),
                };
                tokens.push(token);
            }
            _ => {
                return Err(ParamError::InvalidCondition(format!(
                    "Unexpected character: '{}'",
                    ch
                )))
            }
        }
    }

    Ok(tokens)
}

// ===== PARSER =====

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [Token]) -> Self {
        Self {
            tokens,
            pos: 0,
            depth: 0,
        }
    }

    fn current(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<&Token> {
        let token = self.tokens.get(self.pos);
        self.pos += 1;
        token
    }

    fn expect(&mut self, expected: Token) -> Result<()> {
        match self.advance() {
            Some(token) if token == &expected => Ok(()),
            Some(token) => Err(ParamError::InvalidCondition(format!(
                "Expected {:?}, got {:?}",
                expected, token
            ))),
            None => Err(ParamError::InvalidCondition(format!(
                "Expected {:?}, got EOF",
                expected
            ))),
        }
    }

    fn enter(&mut self) -> Result<()> {
        self.depth += 1;
        if self.depth > MAX_PARSE_DEPTH {
            return Err(ParamError::ConditionTooDeep {
                max: MAX_PARSE_DEPTH,
            });
        }
        Ok(())
    }

    // expr ::= or_expr
    fn parse_expr(&mut self) -> Result<Condition> {
        self.enter()?;
        let expr = self.parse_or();
        self.depth -= 1;
        expr
    }

    // or_expr ::= xor_expr (OR xor_expr)*
    fn parse_or(&mut self) -> Result<Condition> {
        let mut left = self.parse_xor()?;
        while matches!(self.current(), Some(Token::Or)) {
            self.advance();
            let right = self.parse_xor()?;
            left = Condition::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    // xor_expr ::= and_expr (XOR and_expr)*
    fn parse_xor(&mut self) -> Result<Condition> {
        let mut left = self.parse_and()?;
        while matches!(self.current(), Some(Token::Xor)) {
            self.advance();
            let right = self.parse_and()?;
            left = Condition::Xor(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    // and_expr ::= not_expr (AND not_expr)*
    fn parse_and(&mut self) -> Result<Condition> {
        let mut left = self.parse_not()?;
        while matches!(self.current(), Some(Token::And)) {
            self.advance();
            let right = self.parse_not()?;
            left = Condition::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    // not_expr ::= NOT not_expr | primary
    fn parse_not(&mut self) -> Result<Condition> {
        if matches!(self.current(), Some(Token::Not)) {
            self.advance();
            self.enter()?;
            let expr = self.parse_not();
            self.depth -= 1;
            Ok(Condition::Not(Box::new(expr?)))
        } else {
            self.parse_primary()
        }
    }

    // primary ::= TRUE | FALSE | (expr) | IF expr THEN expr ELSE expr
    //           | ORACLE number | source [op number]
    fn parse_primary(&mut self) -> Result<Condition> {
        match self.current() {
            Some(Token::True) => {
                self.advance();
                Ok(Condition::True)
            }
            Some(Token::False) => {
                self.advance();
                Ok(Condition::False)
            }
            Some(Token::LeftParen) => {
                self.advance();
                let expr = self.parse_expr()?;
                self.expect(Token::RightParen)?;
                Ok(expr)
            }
            Some(Token::If) => {
                self.advance();
                let condition = self.parse_expr()?;
                self.expect(Token::Then)?;
                let then = self.parse_expr()?;
                self.expect(Token::Else)?;
                let otherwise = self.parse_expr()?;
                Ok(Condition::IfElse {
                    condition: Box::new(condition),
                    then: Box::new(then),
                    otherwise: Box::new(otherwise),
                })
            }
            Some(Token::Oracle) => {
                self.advance();
                let value = self.parse_number()?;
                if value.as_bytes()[..12].iter().any(|b| *b != 0) {
                    return Err(ParamError::InvalidCondition(
                        "Oracle address must fit in 20 bytes".into(),
                    ));
                }
                Ok(Condition::Oracle(OracleRef::from_word(value)))
            }
            Some(Token::Identifier(_)) => {
                let source = self.parse_source()?;
                match self.current() {
                    Some(Token::Compare(op)) => {
                        let op = *op;
                        self.advance();
                        let value = self.parse_number()?;
                        source.check_width(value)?;
                        Ok(Condition::Compare { source, op, value })
                    }
                    _ => Ok(Condition::Truthy(source)),
                }
            }
            _ => Err(ParamError::InvalidCondition("Expected expression".into())),
        }
    }

    // source ::= arg[number] | block | timestamp | caller
    fn parse_source(&mut self) -> Result<Source> {
        let name = match self.advance() {
            Some(Token::Identifier(name)) => name.clone(),
            _ => return Err(ParamError::InvalidCondition("Expected operand".into())),
        };
        match name.as_str() {
            "arg" => {
                self.expect(Token::LeftBracket)?;
                let index = match self.advance() {
                    Some(Token::Number(digits)) => digits.parse::<u8>().map_err(|_| {
                        ParamError::InvalidCondition(format!("Invalid argument index: {}", digits))
                    })?,
                    _ => {
                        return Err(ParamError::InvalidCondition(
                            "Expected argument index".into(),
                        ))
                    }
                };
                self.expect(Token::RightBracket)?;
                Ok(Source::Arg(index))
            }
            "block" => Ok(Source::BlockHeight),
            "timestamp" => Ok(Source::Timestamp),
            "caller" => Ok(Source::Caller),
            other => Err(ParamError::InvalidCondition(format!(
                "Unknown operand: {}",
                other
            ))),
        }
    }

    fn parse_number(&mut self) -> Result<Word> {
        match self.advance() {
            Some(Token::Number(literal)) => literal.parse(),
            _ => Err(ParamError::InvalidCondition(
                "Expected number after operator".into(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::param::Operand;

    #[test]
    fn test_precedence() {
        // AND binds tighter than XOR, XOR tighter than OR
        let cond = Condition::parse("TRUE OR FALSE XOR TRUE AND FALSE").unwrap();
        let expected = Condition::Or(
            Box::new(Condition::True),
            Box::new(Condition::Xor(
                Box::new(Condition::False),
                Box::new(Condition::And(
                    Box::new(Condition::True),
                    Box::new(Condition::False),
                )),
            )),
        );
        assert_eq!(cond, expected);
    }

    #[test]
    fn test_compile_layout() {
        let raw = Condition::parse("arg[0] == 5 AND timestamp < 100")
            .unwrap()
            .compile()
            .unwrap();
        assert_eq!(raw.len(), 3);
        assert_eq!(Param::decode(raw[0]), Param::and(1, 2));
        assert_eq!(Param::decode(raw[1]), Param::arg(0, Op::Eq, 5u64));
        assert_eq!(Param::decode(raw[2]), Param::timestamp(Op::Lt, 100u64));
    }

    #[test]
    fn test_compile_if_else() {
        let raw = Condition::parse("IF arg[1] THEN TRUE ELSE FALSE")
            .unwrap()
            .compile()
            .unwrap();
        assert_eq!(Param::decode(raw[0]), Param::if_else(1, 2, 3));
        assert_eq!(Param::decode(raw[1]).op, Op::Ret);
        assert_eq!(Param::decode(raw[1]).source(), Operand::Argument(1));
    }

    #[test]
    fn test_caller_and_oracle() {
        let cond = Condition::parse(
            "caller == 0xaa OR ORACLE 0x1111111111111111111111111111111111111111",
        )
        .unwrap();
        let raw = cond.compile().unwrap();
        let caller = Param::decode(raw[1]);
        assert_eq!(caller.source(), Operand::Caller);
        assert_eq!(caller.value, Word::from(0xaau64));
        let oracle = Param::decode(raw[2]);
        assert_eq!(oracle.source(), Operand::Oracle);
        assert_eq!(oracle.value.low_address(), [0x11; 20]);
    }

    #[test]
    fn test_caller_constant_too_wide() {
        let wide = format!("caller == 0x1{}aa", "0".repeat(39));
        assert!(matches!(
            Condition::parse(&wide),
            Err(ParamError::InvalidCondition(_))
        ));
        // Exactly 160 bits still fits
        let full = format!("caller == 0x{}", "f".repeat(40));
        assert!(Condition::parse(&full).unwrap().compile().is_ok());

        let mut bytes = [0u8; 32];
        bytes[11] = 1;
        let built = Condition::Compare {
            source: Source::Caller,
            op: Op::Eq,
            value: Word::from_be_bytes(bytes),
        };
        assert!(built.compile().is_err());
    }

    #[test]
    fn test_constant_wider_than_value_field() {
        let wide = format!("block > 0x1{}", "0".repeat(60));
        assert!(Condition::parse(&wide).is_err());
        let full = format!("block > 0x{}", "f".repeat(60));
        assert!(Condition::parse(&full).is_ok());
    }

    #[test]
    fn test_oracle_address_too_wide() {
        let wide = format!("ORACLE 0x{}", "1".repeat(42));
        assert!(Condition::parse(&wide).is_err());
    }

    #[test]
    fn test_reserved_argument_index() {
        let cond = Condition::parse("arg[200] == 1").unwrap();
        assert!(matches!(
            cond.compile(),
            Err(ParamError::InvalidCondition(_))
        ));
        assert!(Condition::parse("arg[256] == 1").is_err());
    }

    #[test]
    fn test_display_reparses() {
        let source = "IF arg[1] THEN arg[0] < 100 ELSE (caller != 0x1 XOR NOT block >= 7)";
        let cond = Condition::parse(source).unwrap();
        let reparsed = Condition::parse(&cond.to_string()).unwrap();
        assert_eq!(cond, reparsed);
    }

    #[test]
    fn test_syntax_errors() {
        for bad in [
            "",
            "arg[0] = 1",
            "arg[0] ==",
            "arg 0 == 1",
            "(TRUE",
            "TRUE)",
            "IF TRUE THEN TRUE",
            "unknown == 1",
            "arg[0] == 1 2",
            "@",
        ] {
            assert!(Condition::parse(bad).is_err(), "{bad:?} should not parse");
        }
    }

    #[test]
    fn test_nesting_limit() {
        let nested = |n: usize| format!("{}TRUE{}", "(".repeat(n), ")".repeat(n));
        assert_eq!(Condition::parse(&nested(MAX_PARSE_DEPTH)), Ok(Condition::True));
        assert_eq!(
            Condition::parse(&nested(MAX_PARSE_DEPTH + 1)),
            Err(ParamError::ConditionTooDeep {
                max: MAX_PARSE_DEPTH
            })
        );
    }

    #[test]
    fn test_double_negation() {
        let cond = Condition::parse("NOT NOT TRUE").unwrap();
        assert_eq!(cond.depth(), 2);
    }

    #[test]
    fn test_long_chain_too_deep_to_compile() {
        let chain = vec!["TRUE"; MAX_EVAL_DEPTH + 2].join(" AND ");
        let cond = Condition::parse(&chain).unwrap();
        assert_eq!(
            cond.compile(),
            Err(ParamError::ConditionTooDeep { max: MAX_EVAL_DEPTH })
        );
    }
}
