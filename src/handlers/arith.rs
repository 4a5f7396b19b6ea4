//! 算术表达式求值（evalexpr）
//!
//! 进入 evalexpr 前做两步归一化：`×` `÷` `**` 换成 `*` `/` `^`；整数字面量补成浮点，
//! 使 `7 / 2` 得 3.5 而不是整数除法的 3。
//! 除零在浮点下得到 inf/NaN，统一报 NotFinite。

use std::sync::OnceLock;

use evalexpr::eval;
use regex::{Captures, Regex};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum EvalError {
    #[error("empty expression")]
    Empty,
    #[error("invalid expression: {0}")]
    Invalid(String),
    #[error("result is not a number: {0}")]
    NotNumeric(String),
    #[error("result is not a finite number (division by zero or overflow)")]
    NotFinite,
}

fn number_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d+\.\d*|\.\d+|\d+").expect("static number regex is valid"))
}

fn normalize(expression: &str) -> String {
    let replaced = expression
        .replace('×', "*")
        .replace('÷', "/")
        .replace("**", "^");
    number_regex()
        .replace_all(&replaced, |caps: &Captures| {
            let n = &caps[0];
            if n.contains('.') {
                n.to_string()
            } else {
                format!("{}.0", n)
            }
        })
        .into_owned()
}

pub fn evaluate(expression: &str) -> Result<f64, EvalError> {
    let expression = expression.trim();
    if expression.is_empty() {
        return Err(EvalError::Empty);
    }
    let result = eval(&normalize(expression)).map_err(|e| EvalError::Invalid(e.to_string()))?;
    let value = if let Ok(f) = result.as_float() {
        f
    } else if let Ok(i) = result.as_int() {
        i as f64
    } else {
        return Err(EvalError::NotNumeric(result.to_string()));
    };
    if !value.is_finite() {
        return Err(EvalError::NotFinite);
    }
    Ok(value)
}

/// 整数结果不带小数点，其余保留最短表示
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

const OPERATORS: &[char] = &['+', '-', '*', '/', '%', '^', '×', '÷'];

/// 从自然语言中抽取可求值的表达式
///
/// 优先取 ```text 代码块（语言模型翻译结果的格式）；否则取最长的、只含数字/运算符/括号的片段，
/// 且必须至少包含一个运算符并能求值。
pub fn extract_expression(text: &str) -> Option<String> {
    if let Some(start) = text.find("```text") {
        let rest = &text[start + 7..];
        let body = rest.find("```").map(|end| &rest[..end]).unwrap_or(rest);
        let body = body.trim();
        if !body.is_empty() {
            return Some(body.to_string());
        }
    }

    let is_expr_char = |c: char| {
        c.is_ascii_digit() || c == '.' || c == '(' || c == ')' || c == ' ' || OPERATORS.contains(&c)
    };

    let mut candidates: Vec<String> = Vec::new();
    let mut current = String::new();
    for c in text.chars() {
        if is_expr_char(c) {
            current.push(c);
        } else if !current.is_empty() {
            candidates.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        candidates.push(current);
    }

    candidates
        .into_iter()
        .map(|c| c.trim().trim_end_matches('.').trim().to_string())
        .filter(|c| c.chars().any(|ch| ch.is_ascii_digit()))
        .filter(|c| c.chars().skip(1).any(|ch| OPERATORS.contains(&ch)))
        .filter(|c| evaluate(c).is_ok())
        .max_by_key(|c| c.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precedence_and_parentheses() {
        assert_eq!(evaluate("2 + 3 * 4").unwrap(), 14.0);
        assert_eq!(evaluate("(2 + 3) * 4").unwrap(), 20.0);
        assert_eq!(evaluate("10 - 4 - 3").unwrap(), 3.0);
        assert_eq!(evaluate("17 % 5").unwrap(), 2.0);
    }

    #[test]
    fn test_division_is_not_truncated() {
        assert_eq!(evaluate("7 / 2").unwrap(), 3.5);
        assert_eq!(evaluate("200 * 15 / 100").unwrap(), 30.0);
        assert_eq!(evaluate("160 * 1.5 + 20").unwrap(), 260.0);
    }

    #[test]
    fn test_power_and_symbols() {
        assert_eq!(evaluate("2^10").unwrap(), 1024.0);
        assert_eq!(evaluate("2**3").unwrap(), 8.0);
        assert_eq!(evaluate("6 × 7").unwrap(), 42.0);
        assert_eq!(evaluate("84 ÷ 2").unwrap(), 42.0);
        assert_eq!(evaluate("-(3 - 5)").unwrap(), 2.0);
    }

    #[test]
    fn test_errors() {
        assert_eq!(evaluate("  ").unwrap_err(), EvalError::Empty);
        assert_eq!(evaluate("1 / 0").unwrap_err(), EvalError::NotFinite);
        assert!(matches!(evaluate("1 + "), Err(EvalError::Invalid(_))));
        assert!(matches!(evaluate("(1 + 2"), Err(EvalError::Invalid(_))));
    }

    #[test]
    fn test_normalize_numbers() {
        assert_eq!(normalize("12 / 5"), "12.0 / 5.0");
        assert_eq!(normalize("1.5 × 2"), "1.5 * 2.0");
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(42.0), "42");
        assert_eq!(format_number(-3.0), "-3");
        assert_eq!(format_number(2.5), "2.5");
    }

    #[test]
    fn test_extract_expression_from_text() {
        assert_eq!(
            extract_expression("What is 12 * (3 + 4)?").as_deref(),
            Some("12 * (3 + 4)")
        );
        assert_eq!(
            extract_expression("Compute 1500 / 12.").as_deref(),
            Some("1500 / 12")
        );
        assert_eq!(
            extract_expression("```text\n37593 * 67\n```\n...numexpr").as_deref(),
            Some("37593 * 67")
        );
        assert_eq!(extract_expression("How much is fifteen percent of 200"), None);
        assert_eq!(extract_expression("Employee 42 started in 2020"), None);
    }
}
