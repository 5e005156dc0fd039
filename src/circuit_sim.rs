use std::fmt::{self, Debug, Display};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{InvalidSignal, UnknownKind};

pub type Tick = u64;
pub type Ticks = u64;

/// Tri-state value carried by a pin.
///
/// Serialized as `0`, `1` or `null`. Gates read [`Signal::Undefined`] as a
/// zero through their own truth tables; it is never short-circuited.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Option<u8>", into = "Option<u8>")]
pub enum Signal {
    #[default]
    Low,
    High,
    Undefined,
}

impl Signal {
    pub fn from_bool(val: bool) -> Self {
        if val {
            Signal::High
        } else {
            Signal::Low
        }
    }

    pub fn is_high(self) -> bool {
        self == Signal::High
    }

    /// The value as a bit, with `Undefined` read as 0.
    pub fn bit(self) -> u8 {
        self.is_high() as u8
    }
}

impl From<bool> for Signal {
    fn from(val: bool) -> Self {
        Signal::from_bool(val)
    }
}

impl TryFrom<Option<u8>> for Signal {
    type Error = InvalidSignal;

    fn try_from(val: Option<u8>) -> Result<Self, Self::Error> {
        match val {
            Some(0) => Ok(Signal::Low),
            Some(1) => Ok(Signal::High),
            Some(level) => Err(InvalidSignal(level)),
            None => Ok(Signal::Undefined),
        }
    }
}

impl From<Signal> for Option<u8> {
    fn from(val: Signal) -> Self {
        match val {
            Signal::Low => Some(0),
            Signal::High => Some(1),
            Signal::Undefined => None,
        }
    }
}

impl Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signal::Low => f.write_str("0"),
            Signal::High => f.write_str("1"),
            Signal::Undefined => f.write_str("x"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PinDirection {
    Input,
    Output,
}

/// A 2D point. Only carried as opaque routing data on wires.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn offset(self, by: Point) -> Self {
        Self::new(self.x + by.x, self.y + by.y)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamKind {
    Numerical,
    Digital,
    Bool,
    String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl ParamValue {
    /// Truthiness used when a param drives a signal: non-zero numbers,
    /// `true` and non-empty text.
    pub fn is_truthy(&self) -> bool {
        match self {
            ParamValue::Bool(b) => *b,
            ParamValue::Number(n) => *n != 0.0 && !n.is_nan(),
            ParamValue::Text(s) => !s.is_empty(),
        }
    }

    /// Numeric reading of the value. Text that does not parse yields `None`.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            ParamValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            ParamValue::Number(n) => Some(*n),
            ParamValue::Text(s) => s.trim().parse().ok(),
        }
    }
}

impl From<bool> for ParamValue {
    fn from(val: bool) -> Self {
        ParamValue::Bool(val)
    }
}

impl From<f64> for ParamValue {
    fn from(val: f64) -> Self {
        ParamValue::Number(val)
    }
}

impl From<u64> for ParamValue {
    fn from(val: u64) -> Self {
        ParamValue::Number(val as f64)
    }
}

impl From<&str> for ParamValue {
    fn from(val: &str) -> Self {
        ParamValue::Text(val.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(val: String) -> Self {
        ParamValue::Text(val)
    }
}

/// A named, typed node parameter.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    pub kind: ParamKind,
    pub value: ParamValue,
}

impl Param {
    pub fn new(name: &str, kind: ParamKind, value: impl Into<ParamValue>) -> Self {
        Self {
            name: name.to_string(),
            kind,
            value: value.into(),
        }
    }
}

// Param keys on the node data map.
pub const CONST_VALUE: &str = "Value";
pub const CLOCK_PERIOD: &str = "period";
pub const CLOCK_OFFSET: &str = "offset";
pub const NOTE_TEXT: &str = "note";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NodeKind {
    Not,
    And,
    Or,
    Xor,
    Nand,
    Nor,
    Xnor,
    Const,
    Clock,
    Split,
    SignalDisplay,
    Note,
}

/// Pin names of a node kind, in declared order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PinLayout {
    pub inputs: &'static [&'static str],
    pub outputs: &'static [&'static str],
}

impl NodeKind {
    pub const ALL: [NodeKind; 12] = [
        NodeKind::Not,
        NodeKind::And,
        NodeKind::Or,
        NodeKind::Xor,
        NodeKind::Nand,
        NodeKind::Nor,
        NodeKind::Xnor,
        NodeKind::Const,
        NodeKind::Clock,
        NodeKind::Split,
        NodeKind::SignalDisplay,
        NodeKind::Note,
    ];

    pub fn layout(self) -> PinLayout {
        const NONE: &[&str] = &[];
        const IN: &[&str] = &["In"];
        const OUT: &[&str] = &["Out"];
        const AB: &[&str] = &["A", "B"];
        let (inputs, outputs) = match self {
            NodeKind::Not | NodeKind::SignalDisplay => (IN, OUT),
            NodeKind::And
            | NodeKind::Or
            | NodeKind::Xor
            | NodeKind::Nand
            | NodeKind::Nor
            | NodeKind::Xnor => (AB, OUT),
            NodeKind::Const | NodeKind::Clock => (NONE, OUT),
            NodeKind::Split => (IN, AB),
            NodeKind::Note => (NONE, NONE),
        };
        PinLayout { inputs, outputs }
    }

    /// Params a freshly added node of this kind starts with.
    pub fn default_params(self) -> Vec<(&'static str, Param)> {
        match self {
            NodeKind::Const => vec![(
                CONST_VALUE,
                Param::new("Value", ParamKind::Digital, 0.0),
            )],
            NodeKind::Clock => vec![
                (
                    CLOCK_PERIOD,
                    Param::new("Period", ParamKind::Numerical, 10.0),
                ),
                (
                    CLOCK_OFFSET,
                    Param::new("Offset", ParamKind::Numerical, 0.0),
                ),
            ],
            NodeKind::Note => vec![(
                NOTE_TEXT,
                Param::new("Note", ParamKind::String, "nothing to note!"),
            )],
            _ => Vec::new(),
        }
    }

    /// Kinds evaluated once per tick before propagation.
    pub fn is_source(self) -> bool {
        matches!(self, NodeKind::Const | NodeKind::Clock)
    }

    pub fn name(self) -> &'static str {
        match self {
            NodeKind::Not => "not",
            NodeKind::And => "and",
            NodeKind::Or => "or",
            NodeKind::Xor => "xor",
            NodeKind::Nand => "nand",
            NodeKind::Nor => "nor",
            NodeKind::Xnor => "xnor",
            NodeKind::Const => "const",
            NodeKind::Clock => "clock",
            NodeKind::Split => "split",
            NodeKind::SignalDisplay => "signalDisplay",
            NodeKind::Note => "note",
        }
    }

    pub fn default_title(self) -> &'static str {
        match self {
            NodeKind::Not => "NOT",
            NodeKind::And => "AND",
            NodeKind::Or => "OR",
            NodeKind::Xor => "XOR",
            NodeKind::Nand => "NAND",
            NodeKind::Nor => "NOR",
            NodeKind::Xnor => "XNOR",
            NodeKind::Const => "Signal",
            NodeKind::Clock => "Clock",
            NodeKind::Split => "Split Signal",
            NodeKind::SignalDisplay => "LED",
            NodeKind::Note => "Note",
        }
    }
}

impl Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for NodeKind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NodeKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| UnknownKind(s.to_string()))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn signal_json_shape() {
        let json = serde_json::to_string(&[Signal::Low, Signal::High, Signal::Undefined]).unwrap();
        assert_eq!(json, "[0,1,null]");
        let back: Vec<Signal> = serde_json::from_str("[0,1,null]").unwrap();
        assert_eq!(back, vec![Signal::Low, Signal::High, Signal::Undefined]);
        let err = serde_json::from_str::<Vec<Signal>>("[0,7]").unwrap_err();
        assert!(err.to_string().contains("invalid signal level 7"), "{err}");
        assert!(serde_json::from_str::<Signal>("300").is_err());
    }

    #[test]
    fn kind_names_round_trip_through_serde_and_from_str() {
        for kind in NodeKind::ALL {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.name()));
            assert_eq!(kind.name().parse::<NodeKind>(), Ok(kind));
        }
        assert_eq!(
            "flipflop".parse::<NodeKind>(),
            Err(UnknownKind("flipflop".to_string()))
        );
    }

    #[test]
    fn layouts_match_the_kind_table() {
        let counts: Vec<(usize, usize)> = NodeKind::ALL
            .iter()
            .map(|k| (k.layout().inputs.len(), k.layout().outputs.len()))
            .collect();
        assert_eq!(
            counts,
            vec![
                (1, 1),
                (2, 1),
                (2, 1),
                (2, 1),
                (2, 1),
                (2, 1),
                (2, 1),
                (0, 1),
                (0, 1),
                (1, 2),
                (1, 1),
                (0, 0),
            ]
        );
    }

    #[test]
    fn param_value_coercions() {
        assert!(ParamValue::Number(1.0).is_truthy());
        assert!(!ParamValue::Number(0.0).is_truthy());
        assert!(!ParamValue::Number(f64::NAN).is_truthy());
        assert!(ParamValue::Bool(true).is_truthy());
        assert!(!ParamValue::Text(String::new()).is_truthy());
        assert_eq!(ParamValue::Text(" 4 ".into()).as_number(), Some(4.0));
        assert_eq!(ParamValue::Text("four".into()).as_number(), None);
        assert_eq!(ParamValue::Bool(true).as_number(), Some(1.0));
    }

    #[test]
    fn untagged_param_values_deserialize() {
        let vals: Vec<ParamValue> = serde_json::from_str(r#"[true, 3, "hi"]"#).unwrap();
        assert_eq!(
            vals,
            vec![
                ParamValue::Bool(true),
                ParamValue::Number(3.0),
                ParamValue::Text("hi".into())
            ]
        );
    }
}
