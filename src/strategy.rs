// =============================================================================
// Strategy Conditions
// =============================================================================
//
// Boolean conditions over indicator values.  A condition compares two
// operands (a constant or a named indicator series) with one of
// `>`, `>=`, `=`, `<=`, `<`; a strategy node ANDs a list of conditions.
//
// Evaluation happens at one index over an `IndicatorFrame`: a set of named
// series aligned with the same candle series.
// =============================================================================

use std::collections::HashMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::indicators::IndicatorOutput;

/// Relative tolerance used by `=`.
const EQ_TOLERANCE: f64 = 1e-9;

// =============================================================================
// Errors
// =============================================================================

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConditionError {
    #[error("unknown comparison operator '{0}'")]
    InvalidOperator(String),
    #[error("indicator '{0}' is not in the frame")]
    UnknownIndicator(String),
    #[error("index {index} out of range for frame of length {len}")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("series '{name}' has {actual} values, frame expects {expected}")]
    Misaligned {
        name: String,
        expected: usize,
        actual: usize,
    },
}

// =============================================================================
// Condition tree
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Comparison {
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = "=")]
    Eq,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = "<")]
    Lt,
}

impl Comparison {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::Eq => "=",
            Self::Le => "<=",
            Self::Lt => "<",
        }
    }

    pub fn apply(self, left: f64, right: f64) -> bool {
        match self {
            Self::Gt => left > right,
            Self::Ge => left >= right,
            Self::Eq => {
                let scale = left.abs().max(right.abs()).max(1.0);
                (left - right).abs() <= EQ_TOLERANCE * scale
            }
            Self::Le => left <= right,
            Self::Lt => left < right,
        }
    }
}

impl FromStr for Comparison {
    type Err = ConditionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            ">" => Ok(Self::Gt),
            ">=" => Ok(Self::Ge),
            "=" => Ok(Self::Eq),
            "<=" => Ok(Self::Le),
            "<" => Ok(Self::Lt),
            other => Err(ConditionError::InvalidOperator(other.to_string())),
        }
    }
}

impl std::fmt::Display for Comparison {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Leaf of a condition: a literal or a reference into the frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "class", content = "value", rename_all = "lowercase")]
pub enum Operand {
    Constant(f64),
    Indicator(String),
}

impl Operand {
    pub fn indicator(name: impl Into<String>) -> Self {
        Self::Indicator(name.into())
    }

    fn resolve(&self, frame: &IndicatorFrame, index: usize) -> Result<f64, ConditionError> {
        match self {
            Self::Constant(v) => Ok(*v),
            Self::Indicator(name) => frame.value(name, index),
        }
    }
}

impl std::fmt::Display for Operand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Constant(v) => write!(f, "{v}"),
            Self::Indicator(name) => f.write_str(name),
        }
    }
}

/// A comparison, or a node whose conditions must all hold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Condition {
    Compare {
        operator: Comparison,
        left: Operand,
        right: Operand,
    },
    All { conditions: Vec<Condition> },
}

impl Condition {
    pub fn compare(left: Operand, operator: Comparison, right: Operand) -> Self {
        Self::Compare {
            operator,
            left,
            right,
        }
    }

    pub fn all(conditions: Vec<Condition>) -> Self {
        Self::All { conditions }
    }

    /// Evaluate at `index`.  An empty `All` node holds vacuously.
    ///
    /// # Errors
    /// A missing indicator or an out-of-range index.
    pub fn evaluate(&self, frame: &IndicatorFrame, index: usize) -> Result<bool, ConditionError> {
        if index >= frame.len() {
            return Err(ConditionError::IndexOutOfRange {
                index,
                len: frame.len(),
            });
        }
        match self {
            Self::Compare {
                operator,
                left,
                right,
            } => Ok(operator.apply(left.resolve(frame, index)?, right.resolve(frame, index)?)),
            Self::All { conditions } => {
                for c in conditions {
                    if !c.evaluate(frame, index)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
        }
    }

    /// Evaluate at the most recent index.
    ///
    /// # Errors
    /// See [`evaluate`](Self::evaluate); an empty frame is out of range.
    pub fn evaluate_latest(&self, frame: &IndicatorFrame) -> Result<bool, ConditionError> {
        self.evaluate(frame, frame.len().saturating_sub(1))
    }

    /// Every indicator name referenced anywhere in the tree.
    pub fn indicator_names(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect_names(&mut names);
        names
    }

    fn collect_names<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Self::Compare { left, right, .. } => {
                for operand in [left, right] {
                    if let Operand::Indicator(name) = operand {
                        out.push(name);
                    }
                }
            }
            Self::All { conditions } => conditions.iter().for_each(|c| c.collect_names(out)),
        }
    }
}

impl std::fmt::Display for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Compare {
                operator,
                left,
                right,
            } => write!(f, "{left} {operator} {right}"),
            Self::All { conditions } => {
                f.write_str("(")?;
                for (i, c) in conditions.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" AND ")?;
                    }
                    write!(f, "{c}")?;
                }
                f.write_str(")")
            }
        }
    }
}

/// A condition with a display name, as stored in configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedCondition {
    pub name: String,
    pub condition: Condition,
}

// =============================================================================
// Indicator frame
// =============================================================================

/// Named indicator series sharing one length.
#[derive(Debug, Clone, Default)]
pub struct IndicatorFrame {
    len: usize,
    series: HashMap<String, Vec<f64>>,
}

impl IndicatorFrame {
    pub fn new(len: usize) -> Self {
        Self {
            len,
            series: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Insert (or replace) one series.
    ///
    /// # Errors
    /// `Misaligned` when `values` does not match the frame length.
    pub fn insert(&mut self, name: impl Into<String>, values: Vec<f64>) -> Result<(), ConditionError> {
        let name = name.into();
        if values.len() != self.len {
            return Err(ConditionError::Misaligned {
                name,
                expected: self.len,
                actual: values.len(),
            });
        }
        self.series.insert(name, values);
        Ok(())
    }

    /// Insert every line of an indicator output.  The first line is stored
    /// as `name`; every line is also stored as `name.line` when the output
    /// has more than one.
    ///
    /// # Errors
    /// `Misaligned` for the first line of the wrong length.
    pub fn insert_output(&mut self, name: &str, output: &IndicatorOutput) -> Result<(), ConditionError> {
        if let Some(primary) = output.primary() {
            self.insert(name, primary.to_vec())?;
        }
        if output.lines.len() > 1 {
            for (line, values) in &output.lines {
                self.insert(format!("{name}.{line}"), values.clone())?;
            }
        }
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.series.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&[f64]> {
        self.series.get(name).map(Vec::as_slice)
    }

    /// # Errors
    /// `UnknownIndicator` or `IndexOutOfRange`.
    pub fn value(&self, name: &str, index: usize) -> Result<f64, ConditionError> {
        let series = self
            .series
            .get(name)
            .ok_or_else(|| ConditionError::UnknownIndicator(name.to_string()))?;
        series
            .get(index)
            .copied()
            .ok_or(ConditionError::IndexOutOfRange {
                index,
                len: self.len,
            })
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.series.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    fn frame() -> IndicatorFrame {
        let mut f = IndicatorFrame::new(4);
        f.insert("RSI", vec![0.0, 25.0, 55.0, 75.0]).unwrap();
        f.insert("EMA", vec![10.0, 11.0, 12.0, 13.0]).unwrap();
        f.insert("SMA", vec![10.0, 11.5, 11.5, 12.0]).unwrap();
        f
    }

    #[test]
    fn operator_parsing() {
        assert_eq!(">=".parse::<Comparison>(), Ok(Comparison::Ge));
        assert_eq!(" < ".parse::<Comparison>(), Ok(Comparison::Lt));
        assert_eq!(
            "!=".parse::<Comparison>(),
            Err(ConditionError::InvalidOperator("!=".into()))
        );
    }

    #[test]
    fn every_operator() {
        assert!(Comparison::Gt.apply(2.0, 1.0));
        assert!(!Comparison::Gt.apply(1.0, 1.0));
        assert!(Comparison::Ge.apply(1.0, 1.0));
        assert!(Comparison::Eq.apply(0.1 + 0.2, 0.3));
        assert!(!Comparison::Eq.apply(1.0, 1.001));
        assert!(Comparison::Le.apply(1.0, 1.0));
        assert!(Comparison::Lt.apply(0.5, 1.0));
    }

    #[test]
    fn indicator_versus_constant() {
        let f = frame();
        let overbought = Condition::compare(Operand::indicator("RSI"), Comparison::Gt, Operand::Constant(70.0));
        assert!(!overbought.evaluate(&f, 2).unwrap());
        assert!(overbought.evaluate(&f, 3).unwrap());
        assert!(overbought.evaluate_latest(&f).unwrap());
    }

    #[test]
    fn indicator_versus_indicator() {
        let f = frame();
        let crossed = Condition::compare(Operand::indicator("EMA"), Comparison::Gt, Operand::indicator("SMA"));
        assert!(!crossed.evaluate(&f, 1).unwrap());
        assert!(crossed.evaluate(&f, 2).unwrap());
    }

    #[test]
    fn all_node_short_circuits_on_false() {
        let f = frame();
        let cond = Condition::all(vec![
            Condition::compare(Operand::indicator("RSI"), Comparison::Lt, Operand::Constant(30.0)),
            Condition::compare(Operand::indicator("MISSING"), Comparison::Gt, Operand::Constant(0.0)),
        ]);
        // First leg is false at index 3, so the unknown name is never reached.
        assert!(!cond.evaluate(&f, 3).unwrap());
        assert_eq!(
            cond.evaluate(&f, 1),
            Err(ConditionError::UnknownIndicator("MISSING".into()))
        );
        assert!(Condition::all(vec![]).evaluate(&f, 0).unwrap());
    }

    #[test]
    fn out_of_range_and_misaligned() {
        let f = frame();
        let cond = Condition::compare(Operand::Constant(1.0), Comparison::Eq, Operand::Constant(1.0));
        assert_eq!(
            cond.evaluate(&f, 4),
            Err(ConditionError::IndexOutOfRange { index: 4, len: 4 })
        );
        assert!(cond.evaluate_latest(&IndicatorFrame::new(0)).is_err());

        let mut g = IndicatorFrame::new(3);
        assert!(matches!(
            g.insert("X", vec![1.0]),
            Err(ConditionError::Misaligned { actual: 1, .. })
        ));
    }

    #[test]
    fn deserialises_from_config_json() {
        let json = r#"{
            "type": "all",
            "conditions": [
                { "type": "compare", "operator": "<=",
                  "left": { "class": "indicator", "value": "RSI" },
                  "right": { "class": "constant", "value": 30 } },
                { "type": "compare", "operator": ">",
                  "left": { "class": "indicator", "value": "MACD.histogram" },
                  "right": { "class": "constant", "value": 0 } }
            ]
        }"#;
        let cond: Condition = serde_json::from_str(json).unwrap();
        assert_eq!(cond.indicator_names(), vec!["RSI", "MACD.histogram"]);
        assert_eq!(cond.to_string(), "(RSI <= 30 AND MACD.histogram > 0)");
    }

    #[test]
    fn frame_from_multi_line_output() {
        let output = IndicatorOutput {
            lines: vec![
                ("up".to_string(), vec![0.0, 100.0]),
                ("down".to_string(), vec![0.0, 50.0]),
            ],
        };
        let mut f = IndicatorFrame::new(2);
        f.insert_output("Aroon", &output).unwrap();
        assert_eq!(f.names(), vec!["Aroon", "Aroon.down", "Aroon.up"]);
        assert_eq!(f.value("Aroon", 1), Ok(100.0));
        assert_eq!(f.value("Aroon.down", 1), Ok(50.0));
    }
}
