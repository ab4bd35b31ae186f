//! Parameter node codec
//!
//! Each node of a parameter set is carried as one 256-bit [`Word`]:
//!
//! ```text
//!  255      248 247      240 239                                  0
//! +-----------+-----------+--------------------------------------+
//! |    id     |    op     |                value                 |
//! +-----------+-----------+--------------------------------------+
//! ```
//!
//! The `id` selects where the left operand comes from (a reserved source or
//! an index into the caller-supplied arguments). Decoding keeps only the low
//! 240 bits of the value; anything above is lost.

use crate::error::{ParamError, Result};
use crate::word::Word;
use core_identity::Entity;
use std::fmt;
use std::str::FromStr;

/// Node reads the current block height
pub const BLOCK_HEIGHT_PARAM_ID: u8 = 200;
/// Node reads the current timestamp
pub const TIMESTAMP_PARAM_ID: u8 = 201;
/// Node reads the identity of the immediate invoker
pub const CALLER_PARAM_ID: u8 = 202;
/// Node queries the oracle whose address is in the value field
pub const ORACLE_PARAM_ID: u8 = 203;
/// Node combines child nodes with a logic operator
pub const LOGIC_OP_PARAM_ID: u8 = 204;
/// Node compares its own value field (a constant)
pub const LITERAL_PARAM_ID: u8 = 205;

/// Comparison and logic operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    /// No operation (always false)
    None,
    /// Equal (==)
    Eq,
    /// Not equal (!=)
    Neq,
    /// Greater than (>)
    Gt,
    /// Less than (<)
    Lt,
    /// Greater than or equal (>=)
    Gte,
    /// Less than or equal (<=)
    Lte,
    /// Return the operand as a boolean (non-zero is true)
    Ret,
    /// Logical NOT of one child
    Not,
    /// Short-circuit AND of two children
    And,
    /// Short-circuit OR of two children
    Or,
    /// XOR of two children (both always evaluated)
    Xor,
    /// Evaluate a condition, then exactly one of two branches
    IfElse,
    /// Any other operator byte
    Unknown(u8),
}

impl Op {
    /// Decode an operator byte
    #[must_use]
    pub const fn from_byte(byte: u8) -> Self {
        match byte {
            0 => Self::None,
            1 => Self::Eq,
            2 => Self::Neq,
            3 => Self::Gt,
            4 => Self::Lt,
            5 => Self::Gte,
            6 => Self::Lte,
            7 => Self::Ret,
            8 => Self::Not,
            9 => Self::And,
            10 => Self::Or,
            11 => Self::Xor,
            12 => Self::IfElse,
            other => Self::Unknown(other),
        }
    }

    /// Encode to an operator byte
    #[must_use]
    pub const fn to_byte(self) -> u8 {
        match self {
            Self::None => 0,
            Self::Eq => 1,
            Self::Neq => 2,
            Self::Gt => 3,
            Self::Lt => 4,
            Self::Gte => 5,
            Self::Lte => 6,
            Self::Ret => 7,
            Self::Not => 8,
            Self::And => 9,
            Self::Or => 10,
            Self::Xor => 11,
            Self::IfElse => 12,
            Self::Unknown(byte) => byte,
        }
    }

    /// Whether this operator combines child nodes
    #[must_use]
    pub const fn is_logic(self) -> bool {
        matches!(
            self,
            Self::Not | Self::And | Self::Or | Self::Xor | Self::IfElse
        )
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Eq => write!(f, "=="),
            Self::Neq => write!(f, "!="),
            Self::Gt => write!(f, ">"),
            Self::Lt => write!(f, "<"),
            Self::Gte => write!(f, ">="),
            Self::Lte => write!(f, "<="),
            Self::Ret => write!(f, "ret"),
            Self::Not => write!(f, "not"),
            Self::And => write!(f, "and"),
            Self::Or => write!(f, "or"),
            Self::Xor => write!(f, "xor"),
            Self::IfElse => write!(f, "if_else"),
            Self::Unknown(byte) => write!(f, "op({})", byte),
        }
    }
}

impl FromStr for Op {
    type Err = ParamError;

    fn from_str(s: &str) -> Result<Self> {
        let op = match s.to_ascii_lowercase().as_str() {
            "none" => Self::None,
            "eq" | "==" => Self::Eq,
            "neq" | "!=" => Self::Neq,
            "gt" | ">" => Self::Gt,
            "lt" | "<" => Self::Lt,
            "gte" | ">=" => Self::Gte,
            "lte" | "<=" => Self::Lte,
            "ret" => Self::Ret,
            "not" => Self::Not,
            "and" => Self::And,
            "or" => Self::Or,
            "xor" => Self::Xor,
            "if_else" | "ifelse" => Self::IfElse,
            other => match other.parse::<u8>() {
                Ok(byte) => Self::from_byte(byte),
                Err(_) => return Err(ParamError::UnknownOp(s.to_string())),
            },
        };
        Ok(op)
    }
}

/// Where a node's left operand comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operand {
    /// Current block height
    BlockHeight,
    /// Current timestamp
    Timestamp,
    /// Immediate invoker of the check
    Caller,
    /// Oracle answer as 1/0
    Oracle,
    /// Logic combination of child nodes
    Logic,
    /// The node's own value
    Literal,
    /// Caller-supplied argument at this index
    Argument(u8),
}

impl Operand {
    /// Classify a node id
    #[must_use]
    pub const fn from_id(id: u8) -> Self {
        match id {
            BLOCK_HEIGHT_PARAM_ID => Self::BlockHeight,
            TIMESTAMP_PARAM_ID => Self::Timestamp,
            CALLER_PARAM_ID => Self::Caller,
            ORACLE_PARAM_ID => Self::Oracle,
            LOGIC_OP_PARAM_ID => Self::Logic,
            LITERAL_PARAM_ID => Self::Literal,
            index => Self::Argument(index),
        }
    }
}

/// One decoded node of a parameter set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Param {
    /// Operand source selector
    pub id: u8,
    /// Operator
    pub op: Op,
    /// Payload, at most 240 bits wide
    pub value: Word,
}

impl Param {
    /// Create a node, truncating `value` to the value field width
    #[must_use]
    pub fn new(id: u8, op: Op, value: impl Into<Word>) -> Self {
        Self {
            id,
            op,
            value: value.into().truncate_to_value(),
        }
    }

    /// Compare caller argument `index` against `value`
    #[must_use]
    pub fn arg(index: u8, op: Op, value: impl Into<Word>) -> Self {
        Self::new(index, op, value)
    }

    /// Compare the current block height against `value`
    #[must_use]
    pub fn block_height(op: Op, value: impl Into<Word>) -> Self {
        Self::new(BLOCK_HEIGHT_PARAM_ID, op, value)
    }

    /// Compare the current timestamp against `value`
    #[must_use]
    pub fn timestamp(op: Op, value: impl Into<Word>) -> Self {
        Self::new(TIMESTAMP_PARAM_ID, op, value)
    }

    /// Compare the immediate invoker against `entity`
    #[must_use]
    pub fn caller(op: Op, entity: Entity) -> Self {
        Self::new(CALLER_PARAM_ID, op, entity)
    }

    /// A constant operand compared against itself (pair with [`Op::Ret`])
    #[must_use]
    pub fn literal(op: Op, value: impl Into<Word>) -> Self {
        Self::new(LITERAL_PARAM_ID, op, value)
    }

    /// Ask the oracle at `address`
    #[must_use]
    pub fn oracle(address: [u8; 20]) -> Self {
        Self::new(ORACLE_PARAM_ID, Op::Eq, Word::from_address(address))
    }

    /// A logic node with explicit child slots
    #[must_use]
    pub fn logic(op: Op, children: [u32; 3]) -> Self {
        Self::new(LOGIC_OP_PARAM_ID, op, Word::from_u32_slots(children))
    }

    /// `NOT child`
    #[must_use]
    pub fn not(child: u32) -> Self {
        Self::logic(Op::Not, [child, 0, 0])
    }

    /// `left AND right`
    #[must_use]
    pub fn and(left: u32, right: u32) -> Self {
        Self::logic(Op::And, [left, right, 0])
    }

    /// `left OR right`
    #[must_use]
    pub fn or(left: u32, right: u32) -> Self {
        Self::logic(Op::Or, [left, right, 0])
    }

    /// `left XOR right`
    #[must_use]
    pub fn xor(left: u32, right: u32) -> Self {
        Self::logic(Op::Xor, [left, right, 0])
    }

    /// `IF condition THEN success ELSE failure`
    #[must_use]
    pub fn if_else(condition: u32, success: u32, failure: u32) -> Self {
        Self::logic(Op::IfElse, [condition, success, failure])
    }

    /// Decode a raw word
    #[must_use]
    pub fn decode(word: Word) -> Self {
        let bytes = word.as_bytes();
        Self {
            id: bytes[0],
            op: Op::from_byte(bytes[1]),
            value: word.truncate_to_value(),
        }
    }

    /// Encode into a raw word
    #[must_use]
    pub fn encode(&self) -> Word {
        let mut bytes = self.value.truncate_to_value().to_be_bytes();
        bytes[0] = self.id;
        bytes[1] = self.op.to_byte();
        Word::from_be_bytes(bytes)
    }

    /// Operand source of this node
    #[must_use]
    pub const fn source(&self) -> Operand {
        Operand::from_id(self.id)
    }

    /// Child node indices packed in the value field
    #[must_use]
    pub fn children(&self) -> [u32; 3] {
        [
            self.value.u32_slot(0),
            self.value.u32_slot(1),
            self.value.u32_slot(2),
        ]
    }

    /// Child slots this node actually evaluates
    ///
    /// Empty for non-logic nodes and unknown logic operators.
    #[must_use]
    pub fn used_children(&self) -> &'static [usize] {
        if self.id != LOGIC_OP_PARAM_ID {
            return &[];
        }
        match self.op {
            Op::Not => &[0],
            Op::And | Op::Or | Op::Xor => &[0, 1],
            Op::IfElse => &[0, 1, 2],
            _ => &[],
        }
    }
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.source() {
            Operand::Logic => {
                let [a, b, c] = self.children();
                match self.op {
                    Op::Not => write!(f, "not(#{})", a),
                    Op::IfElse => write!(f, "if_else(#{}, #{}, #{})", a, b, c),
                    op => write!(f, "{}(#{}, #{})", op, a, b),
                }
            }
            Operand::Oracle => write!(f, "oracle({})", self.value),
            Operand::BlockHeight => write!(f, "block {} {}", self.op, self.value),
            Operand::Timestamp => write!(f, "timestamp {} {}", self.op, self.value),
            Operand::Caller => write!(f, "caller {} {}", self.op, self.value),
            Operand::Literal => write!(f, "literal {} {}", self.op, self.value),
            Operand::Argument(index) => write!(f, "arg[{}] {} {}", index, self.op, self.value),
        }
    }
}
